//! Flat-image codec.
//!
//! [`gather`] walks an [`ArrayView`]'s strided layout and produces the
//! canonical row-major byte image that gets persisted; [`decode`] turns a
//! stored image back into an owned [`Array`]. The walk copies element bytes
//! with plain slice copies, so sources that are misaligned for their element
//! type are read exactly, never through a typed pointer.
//!
//! Serialization is all-or-nothing per array: the full image is materialized
//! before anything reaches a container file.

use bytes::Bytes;
use smallvec::SmallVec;

use crate::{
    array::{error::ArrayError, Array, ArrayView},
    dtype::{ByteOrder, DataType},
};

/// Gather a view into its canonical contiguous image.
///
/// The result preserves the view's dtype, shape and byte-order tag; only the
/// physical layout is normalized.
///
/// # Errors
/// - [`ArrayError::UnsupportedType`] for complex element types. This is the
///   write-time rejection point; nothing is produced.
pub fn gather(view: &ArrayView<'_>) -> Result<Array, ArrayError> {
    let dtype = view.dtype();
    if !dtype.is_supported() {
        return Err(ArrayError::UnsupportedType { dtype });
    }

    let size = dtype.element_size();
    let count = view.num_elements();
    let buffer = view.buffer();

    let data = if count == 0 {
        Bytes::new()
    } else if view.is_contiguous() {
        let start = view.offset();
        Bytes::copy_from_slice(&buffer[start..start + count * size])
    } else {
        let mut out = Vec::with_capacity(count * size);
        walk(view, |start| out.extend_from_slice(&buffer[start..start + size]));
        Bytes::from(out)
    };

    Array::try_new(data, dtype, view.shape().into(), view.byte_order())
}

/// Reconstruct an owned contiguous array from a stored flat image.
///
/// The logical content is identical to the gathered source; the physical
/// layout is always contiguous and natively allocated. Unsupported types are
/// rejected at [`gather`] time, never here.
pub fn decode(
    data: Bytes,
    dtype: DataType,
    shape: &[usize],
    byte_order: ByteOrder,
) -> Result<Array, ArrayError> {
    Array::try_new(data, dtype, shape.into(), byte_order)
}

/// Visit the base byte offset of every element in row-major logical order.
///
/// Bounds were established by the view's construction-time extent check.
fn walk(view: &ArrayView<'_>, mut visit: impl FnMut(usize)) {
    let shape = view.shape();
    let strides = view.strides();
    let rank = shape.len();

    let mut index: SmallVec<[usize; 8]> = SmallVec::from_elem(0, rank);
    let mut pos = view.offset() as isize;
    'walk: loop {
        visit(pos as usize);
        let mut axis = rank;
        loop {
            if axis == 0 {
                break 'walk;
            }
            axis -= 1;
            index[axis] += 1;
            pos += strides[axis];
            if index[axis] < shape[axis] {
                continue 'walk;
            }
            index[axis] = 0;
            pos -= shape[axis] as isize * strides[axis];
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dtype::NATIVE_LONG;

    #[test]
    fn contiguous_gather_copies_the_span() {
        let values = [10i32, 20, 30, 40];
        let view = ArrayView::from_slice(&values, &[2, 2]).unwrap();
        let arr = gather(&view).unwrap();
        assert_eq!(arr.shape(), &[2, 2]);
        assert_eq!(arr.to_vec::<i32>().unwrap(), values);
    }

    #[test]
    fn stride_two_slice_gathers_every_other_element() {
        let values = [0i32, 1, 2, 3, 4];
        let view = ArrayView::from_slice(&values, &[5]).unwrap();
        let sliced = view.step(2).unwrap();
        assert!(!sliced.is_contiguous());

        let arr = gather(&sliced).unwrap();
        assert!(arr.is_contiguous());
        assert_eq!(arr.to_vec::<i32>().unwrap(), vec![0, 2, 4]);
    }

    #[test]
    fn offset_row_gathers_from_the_middle() {
        let values: Vec<i64> = (0..100).collect();
        let view = ArrayView::from_slice(&values, &[10, 10]).unwrap();
        let row = view.index(2).unwrap();
        assert!(row.offset() > 0);

        let arr = gather(&row).unwrap();
        assert_eq!(arr.to_vec::<i64>().unwrap(), (20..30).collect::<Vec<_>>());
    }

    #[test]
    fn packed_record_field_gathers_bit_exact() {
        // Ten packed records of (i8, f32, i16): the f32 field sits at byte
        // offset 1 with a 7-byte stride, misaligned for 4-byte access.
        const RECORD: usize = 7;
        let mut buf = vec![0u8; 10 * RECORD];
        for rec in 0..10 {
            let base = rec * RECORD;
            buf[base] = rec as u8;
            buf[base + 1..base + 5].copy_from_slice(&(rec as f32 * 1.5).to_ne_bytes());
            buf[base + 5..base + 7].copy_from_slice(&(rec as i16).to_ne_bytes());
        }

        let field = ArrayView::new(
            &buf,
            DataType::F32,
            &[10],
            &[RECORD as isize],
            1,
            ByteOrder::native(),
        )
        .unwrap();
        assert!(!field.is_contiguous());

        let arr = gather(&field).unwrap();
        let expected: Vec<f32> = (0..10).map(|r| r as f32 * 1.5).collect();
        assert_eq!(arr.to_vec::<f32>().unwrap(), expected);
    }

    #[test]
    fn negative_stride_reverses_elements() {
        let values = [1u16, 2, 3, 4];
        // Base offset at the last element, stepping backwards.
        let view = ArrayView::new(
            values_as_bytes(&values),
            DataType::U16,
            &[4],
            &[-2],
            6,
            ByteOrder::native(),
        )
        .unwrap();
        let arr = gather(&view).unwrap();
        assert_eq!(arr.to_vec::<u16>().unwrap(), vec![4, 3, 2, 1]);
    }

    #[test]
    fn rank_zero_gathers_one_element() {
        let view = ArrayView::from_slice(&[33i32], &[]).unwrap();
        let arr = gather(&view).unwrap();
        assert_eq!(arr.shape(), &[] as &[usize]);
        assert_eq!(arr.to_vec::<i32>().unwrap(), vec![33]);
        assert!(arr.dtype().equivalent(&NATIVE_LONG));
    }

    #[test]
    fn empty_axis_gathers_no_bytes() {
        let view = ArrayView::from_slice(&[] as &[f64], &[0]).unwrap();
        let arr = gather(&view).unwrap();
        assert_eq!(arr.num_elements(), 0);
        assert!(arr.data().is_empty());
    }

    #[test]
    fn complex_types_are_rejected_at_gather_time() {
        let buf = [0u8; 16];
        let view =
            ArrayView::contiguous(&buf, DataType::Complex32, &[2], ByteOrder::native()).unwrap();
        let err = gather(&view).unwrap_err();
        assert!(matches!(
            err,
            ArrayError::UnsupportedType {
                dtype: DataType::Complex32
            }
        ));
    }

    #[test]
    fn gather_preserves_a_non_native_tag() {
        let arr = Array::from_slice(&[1i32, 2, 3], &[3]).unwrap().byte_swap();
        let gathered = gather(&arr.view()).unwrap();
        assert_eq!(gathered.byte_order(), ByteOrder::native().swapped());
        assert_eq!(gathered.to_vec::<i32>().unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn decode_validates_payload_length() {
        let err = decode(
            Bytes::from(vec![0u8; 6]),
            DataType::I32,
            &[2],
            ByteOrder::native(),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ArrayError::WrongByteLen {
                expected: 8,
                actual: 6
            }
        ));
    }

    fn values_as_bytes<T>(values: &[T]) -> &[u8] {
        // Safety: plain scalars viewed as their own bytes.
        unsafe {
            std::slice::from_raw_parts(values.as_ptr() as *const u8, std::mem::size_of_val(values))
        }
    }
}
