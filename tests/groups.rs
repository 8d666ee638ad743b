//! Group-tree scenarios: arrays of growing rank nested one group deeper per
//! step, verified independently after a single close/reopen cycle. Deep
//! nesting must not disturb sibling data anywhere above it.

use silo::{Array, DataType, Element, Silo, SiloMut};
use tempfile::TempDir;

fn ones<T: Element>(one: T, rank: usize, dim: usize) -> Array {
    let shape = vec![dim; rank];
    let count = dim.pow(rank as u32);
    let values = vec![one; count];
    Array::from_slice(&values, &shape).unwrap()
}

#[test]
fn iterative_groups_one_type_per_level() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("groups.silo");

    // One array per supported numeric type, rank growing with each level,
    // each node one group deeper than the last.
    let mut writer = SiloMut::create(&path).unwrap();
    let mut group = writer.root();
    let cases: Vec<(&str, Array)> = vec![
        ("array_i8", ones(1i8, 1, 3)),
        ("array_u8", ones(1u8, 2, 3)),
        ("array_i16", ones(1i16, 3, 3)),
        ("array_u16", ones(1u16, 4, 3)),
        ("array_i32", ones(1i32, 5, 3)),
        ("array_u32", ones(1u32, 6, 3)),
        ("array_i64", ones(1i64, 7, 3)),
        ("array_f32", ones(1.0f32, 8, 3)),
        ("array_f64", ones(1.0f64, 9, 3)),
    ];
    for (level, (name, array)) in cases.iter().enumerate() {
        writer
            .create_array(group, name, &array.view(), "Large array")
            .unwrap();
        group = writer
            .create_group(group, &format!("group{}", level + 1))
            .unwrap();
    }
    writer.close().unwrap();

    let reader = Silo::open(&path).unwrap();
    let mut group = reader.root();
    for (level, (name, expected)) in cases.iter().enumerate() {
        let node = reader.node(group, name).unwrap();
        assert_eq!(reader.shape(node), expected.shape());
        assert!(reader.dtype(node).equivalent(&expected.dtype()));

        let restored = reader.read_array(node).unwrap();
        assert_eq!(&restored, expected);

        group = reader.group(group, &format!("group{}", level + 1)).unwrap();
    }
}

#[test]
fn large_rank_arrays_to_the_ceiling() {
    const MIN_RANK: usize = 1;
    const MAX_RANK: usize = 32;

    let dir = TempDir::new().unwrap();
    let path = dir.path().join("large_rank.silo");

    let mut writer = SiloMut::create(&path).unwrap();
    let mut group = writer.root();
    for rank in MIN_RANK..=MAX_RANK {
        let array = ones(1i32, rank, 1);
        writer
            .create_array(group, "array", &array.view(), &format!("Rank: {rank}"))
            .unwrap();
        group = writer.create_group(group, &format!("group{rank}")).unwrap();
    }
    writer.close().unwrap();

    // Every node must be independently intact after one reopen.
    let reader = Silo::open(&path).unwrap();
    let mut group = reader.root();
    for rank in MIN_RANK..=MAX_RANK {
        let expected = ones(1i32, rank, 1);
        let node = reader.node(group, "array").unwrap();
        assert_eq!(reader.shape(node), expected.shape());
        assert_eq!(reader.title(node), format!("Rank: {rank}"));

        let restored = reader.read_array(node).unwrap();
        assert_eq!(restored.rank(), rank);
        assert!(restored.dtype().equivalent(&DataType::I32));
        assert_eq!(&restored, &expected);

        group = reader.group(group, &format!("group{rank}")).unwrap();
    }
}

#[test]
fn deep_paths_resolve_from_the_root() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("paths.silo");

    let mut writer = SiloMut::create(&path).unwrap();
    let root = writer.root();
    let g1 = writer.create_group(root, "group1").unwrap();
    let g2 = writer.create_group(g1, "group2").unwrap();
    let array = Array::from_slice(&[1i32, 2, 3], &[3]).unwrap();
    let node = writer
        .create_array(g2, "somearray", &array.view(), "")
        .unwrap();
    assert_eq!(writer.path(node), "/group1/group2/somearray");
    writer.close().unwrap();

    let reader = Silo::open(&path).unwrap();
    let node = reader.node_at("/group1/group2/somearray").unwrap();
    assert_eq!(reader.path(node), "/group1/group2/somearray");
    assert_eq!(reader.read_array(node).unwrap(), array);
}
