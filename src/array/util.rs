use smallvec::SmallVec;

use crate::array::error::ArrayError;

pub fn num_elements(shape: &[usize]) -> Result<usize, ArrayError> {
    shape
        .iter()
        .try_fold(1usize, |acc, &d| acc.checked_mul(d))
        .ok_or(ArrayError::ShapeOverflow)
}

/// Byte strides of the canonical row-major layout for `shape`.
pub fn canonical_strides(shape: &[usize], element_size: usize) -> SmallVec<[isize; 4]> {
    let mut strides: SmallVec<[isize; 4]> = SmallVec::with_capacity(shape.len());
    let mut step = element_size as isize;
    for &dim in shape.iter().rev() {
        strides.push(step);
        step *= dim.max(1) as isize;
    }
    strides.reverse();
    strides
}
