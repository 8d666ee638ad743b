//! Typed arrays backed by byte buffers.
//!
//! Two representations cover the write and read sides of the container:
//!
//! - [`ArrayView`] is a borrowed descriptor over caller-owned bytes. It
//!   carries the full physical layout explicitly — shape, byte strides, base
//!   byte offset, byte order — so strided slices, sub-record fields and
//!   misaligned views are all expressible without copying. Every layout
//!   condition is validated once, at construction; the codec trusts the
//!   descriptor afterwards.
//! - [`Array`] is an owned, contiguous, canonical row-major array. Reading a
//!   node always produces this form regardless of how the source was laid
//!   out.
//!
//! Element access never dereferences typed pointers into stored bytes unless
//! the buffer is natively ordered and aligned; the fallback decodes
//! element-by-element through [`Element::read_bytes`], which is exact for any
//! alignment and either byte order.

use bytes::Bytes;
use smallvec::SmallVec;

use crate::{
    array::{datatype::Element, error::ArrayError},
    consts::MAX_RANK,
    dtype::{ByteOrder, DataType},
};

pub mod codec;
pub mod datatype;
pub mod error;
pub mod util;

/// A borrowed, validated view of array data in an arbitrary physical layout.
#[derive(Debug, Clone)]
pub struct ArrayView<'a> {
    buffer: &'a [u8],
    dtype: DataType,
    shape: SmallVec<[usize; 4]>,
    /// Byte strides, one per dimension. May be negative.
    strides: SmallVec<[isize; 4]>,
    /// Base byte offset of the first element within `buffer`.
    offset: usize,
    byte_order: ByteOrder,
    count: usize,
}

impl<'a> ArrayView<'a> {
    /// Create a view with an explicit layout.
    ///
    /// # Errors
    /// Returns [`ArrayError`] if:
    /// - the rank exceeds [`MAX_RANK`]
    /// - `strides` doesn't have one entry per dimension
    /// - the element count implied by `shape` overflows
    /// - a `Char` dtype has width 0
    /// - any element of the strided extent falls outside `buffer`
    pub fn new(
        buffer: &'a [u8],
        dtype: DataType,
        shape: &[usize],
        strides: &[isize],
        offset: usize,
        byte_order: ByteOrder,
    ) -> Result<ArrayView<'a>, ArrayError> {
        if shape.len() != strides.len() {
            return Err(ArrayError::StrideCountMismatch {
                expected: shape.len(),
                actual: strides.len(),
            });
        }
        let count = Self::validate(buffer, dtype, shape, strides, offset)?;
        Ok(ArrayView {
            buffer,
            dtype,
            shape: shape.into(),
            strides: strides.into(),
            offset,
            byte_order,
            count,
        })
    }

    /// Create a contiguous row-major view starting at byte 0 of `buffer`.
    pub fn contiguous(
        buffer: &'a [u8],
        dtype: DataType,
        shape: &[usize],
        byte_order: ByteOrder,
    ) -> Result<ArrayView<'a>, ArrayError> {
        let strides = util::canonical_strides(shape, dtype.element_size());
        Self::new(buffer, dtype, shape, &strides, 0, byte_order)
    }

    /// Create a **zero-copy** native-order view over a typed slice.
    ///
    /// # Errors
    /// Returns [`ArrayError`] if `data.len()` doesn't match the element count
    /// implied by `shape`, or the shape itself is invalid.
    pub fn from_slice<T: Element>(
        data: &'a [T],
        shape: &[usize],
    ) -> Result<ArrayView<'a>, ArrayError> {
        let count = util::num_elements(shape)?;
        if data.len() != count {
            return Err(ArrayError::WrongElementCount {
                expected: count,
                actual: data.len(),
            });
        }
        // Safety: `T: Element` is a plain scalar; the span covers exactly the
        // slice's own bytes.
        let bytes =
            unsafe { std::slice::from_raw_parts(data.as_ptr() as *const u8, count * T::SIZE) };
        Self::contiguous(bytes, T::DTYPE, shape, ByteOrder::native())
    }

    /// Create a **zero-copy** view over an `ndarray`'s backing buffer.
    ///
    /// Only standard-layout (contiguous, row-major) arrays are accepted;
    /// non-standard views (e.g. a transpose) are rejected.
    pub fn from_ndarray<T, S>(
        array: &'a ndarray::ArrayBase<S, ndarray::IxDyn>,
    ) -> Result<ArrayView<'a>, ArrayError>
    where
        T: Element,
        S: ndarray::Data<Elem = T>,
    {
        if !array.is_standard_layout() {
            return Err(ArrayError::NonContiguousNdarray);
        }
        let elems = array
            .as_slice_memory_order()
            .ok_or(ArrayError::NonContiguousNdarray)?;
        Self::from_slice(elems, array.shape())
    }

    /// Slice axis 0 by `step`, keeping every `step`-th element.
    ///
    /// The result reports non-contiguous layout for `step > 1` (on axes of
    /// length > 1) while borrowing the same buffer.
    pub fn step(&self, step: usize) -> Result<ArrayView<'a>, ArrayError> {
        if step == 0 {
            return Err(ArrayError::InvalidStep);
        }
        if self.shape.is_empty() {
            return Err(ArrayError::IndexOutOfBounds { index: 0, len: 0 });
        }
        let mut shape = self.shape.clone();
        let mut strides = self.strides.clone();
        shape[0] = shape[0].div_ceil(step);
        strides[0] *= step as isize;
        Self::new(
            self.buffer,
            self.dtype,
            &shape,
            &strides,
            self.offset,
            self.byte_order,
        )
    }

    /// Subscript axis 0, producing a view of one rank less whose base byte
    /// offset points into the middle of the buffer.
    pub fn index(&self, index: usize) -> Result<ArrayView<'a>, ArrayError> {
        let Some(&len) = self.shape.first() else {
            return Err(ArrayError::IndexOutOfBounds { index, len: 0 });
        };
        if index >= len {
            return Err(ArrayError::IndexOutOfBounds { index, len });
        }
        let offset = self.offset as isize + index as isize * self.strides[0];
        let offset = usize::try_from(offset).map_err(|_| ArrayError::ExtentOutOfBounds {
            min: offset,
            max: offset,
            len: self.buffer.len(),
        })?;
        Self::new(
            self.buffer,
            self.dtype,
            &self.shape[1..],
            &self.strides[1..],
            offset,
            self.byte_order,
        )
    }

    /// Gather this view into an owned, contiguous [`Array`].
    pub fn to_array(&self) -> Result<Array, ArrayError> {
        codec::gather(self)
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn rank(&self) -> usize {
        self.shape.len()
    }

    /// Byte strides, one per dimension.
    pub fn strides(&self) -> &[isize] {
        &self.strides
    }

    /// Base byte offset of the first element.
    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn dtype(&self) -> DataType {
        self.dtype
    }

    pub fn byte_order(&self) -> ByteOrder {
        self.byte_order
    }

    pub fn num_elements(&self) -> usize {
        self.count
    }

    pub(crate) fn buffer(&self) -> &'a [u8] {
        self.buffer
    }

    /// True iff the strides match the canonical row-major layout.
    pub fn is_contiguous(&self) -> bool {
        self.strides == util::canonical_strides(&self.shape, self.dtype.element_size())
    }

    /// True iff the first element sits on the natural alignment boundary of
    /// the element type.
    pub fn is_aligned(&self) -> bool {
        let align = self.dtype.element_size().max(1);
        (self.buffer.as_ptr() as usize + self.offset) % align == 0
    }

    fn validate(
        buffer: &[u8],
        dtype: DataType,
        shape: &[usize],
        strides: &[isize],
        offset: usize,
    ) -> Result<usize, ArrayError> {
        if let DataType::Char { width: 0 } = dtype {
            return Err(ArrayError::InvalidCharWidth);
        }
        if shape.len() > MAX_RANK {
            return Err(ArrayError::RankOverflow {
                rank: shape.len(),
                max: MAX_RANK,
            });
        }
        let count = util::num_elements(shape)?;
        if count == 0 {
            return Ok(0);
        }

        // Lowest and highest base offset reachable by any element.
        let base = isize::try_from(offset).map_err(|_| ArrayError::ShapeOverflow)?;
        let mut min = base;
        let mut max = base;
        for (&dim, &stride) in shape.iter().zip(strides) {
            let span = isize::try_from(dim - 1)
                .ok()
                .and_then(|steps| steps.checked_mul(stride))
                .ok_or(ArrayError::ShapeOverflow)?;
            if span > 0 {
                max = max.checked_add(span).ok_or(ArrayError::ShapeOverflow)?;
            } else {
                min = min.checked_add(span).ok_or(ArrayError::ShapeOverflow)?;
            }
        }
        let end = max
            .checked_add(dtype.element_size() as isize)
            .ok_or(ArrayError::ShapeOverflow)?;
        if min < 0 || end as usize > buffer.len() {
            return Err(ArrayError::ExtentOutOfBounds {
                min,
                max: end,
                len: buffer.len(),
            });
        }
        Ok(count)
    }
}

/// An owned array in canonical row-major layout.
///
/// The payload is always exactly `num_elements() * element_size` bytes, in
/// the order given by [`Array::byte_order`] — which is the source's order at
/// capture time, never silently normalized.
#[derive(Debug, Clone)]
pub struct Array {
    data: Bytes,
    dtype: DataType,
    shape: SmallVec<[usize; 4]>,
    byte_order: ByteOrder,
}

impl Array {
    /// Create a validated array over an owned byte buffer.
    ///
    /// # Errors
    /// Returns [`ArrayError`] if the rank exceeds [`MAX_RANK`], the shape
    /// overflows, a `Char` width is 0, or `data.len()` doesn't match
    /// `product(shape) * element_size`.
    pub fn try_new(
        data: Bytes,
        dtype: DataType,
        shape: SmallVec<[usize; 4]>,
        byte_order: ByteOrder,
    ) -> Result<Array, ArrayError> {
        if let DataType::Char { width: 0 } = dtype {
            return Err(ArrayError::InvalidCharWidth);
        }
        if shape.len() > MAX_RANK {
            return Err(ArrayError::RankOverflow {
                rank: shape.len(),
                max: MAX_RANK,
            });
        }
        let count = util::num_elements(&shape)?;
        let expected = count
            .checked_mul(dtype.element_size())
            .ok_or(ArrayError::ShapeOverflow)?;
        if data.len() != expected {
            return Err(ArrayError::WrongByteLen {
                expected,
                actual: data.len(),
            });
        }
        Ok(Array {
            data,
            dtype,
            shape,
            byte_order,
        })
    }

    /// Copy a typed slice into an owned native-order array.
    pub fn from_slice<T: Element>(values: &[T], shape: &[usize]) -> Result<Array, ArrayError> {
        let count = util::num_elements(shape)?;
        if values.len() != count {
            return Err(ArrayError::WrongElementCount {
                expected: count,
                actual: values.len(),
            });
        }
        let mut buf = vec![0u8; count * T::SIZE];
        for (chunk, value) in buf.chunks_exact_mut(T::SIZE).zip(values) {
            value.write_bytes(ByteOrder::native(), chunk);
        }
        Array::try_new(buf.into(), T::DTYPE, shape.into(), ByteOrder::native())
    }

    /// A rank-0 (scalar) array holding one value.
    pub fn scalar<T: Element>(value: T) -> Array {
        let mut buf = vec![0u8; T::SIZE];
        value.write_bytes(ByteOrder::native(), &mut buf);
        Array {
            data: buf.into(),
            dtype: T::DTYPE,
            shape: SmallVec::new(),
            byte_order: ByteOrder::native(),
        }
    }

    /// Build a fixed-width character array from string elements.
    ///
    /// The width is the longest element's byte length (at least 1); shorter
    /// elements are padded with NUL bytes.
    pub fn from_strings(values: &[&str], shape: &[usize]) -> Result<Array, ArrayError> {
        let count = util::num_elements(shape)?;
        if values.len() != count {
            return Err(ArrayError::WrongElementCount {
                expected: count,
                actual: values.len(),
            });
        }
        let width = values.iter().map(|s| s.len()).max().unwrap_or(1).max(1);
        let width_tag = u32::try_from(width).map_err(|_| ArrayError::ShapeOverflow)?;
        let mut buf = vec![0u8; count * width];
        for (chunk, value) in buf.chunks_exact_mut(width).zip(values) {
            chunk[..value.len()].copy_from_slice(value.as_bytes());
        }
        Array::try_new(
            buf.into(),
            DataType::Char { width: width_tag },
            shape.into(),
            ByteOrder::native(),
        )
    }

    /// Borrow this array as a contiguous [`ArrayView`] (the write-side entry
    /// point).
    pub fn view(&self) -> ArrayView<'_> {
        ArrayView {
            buffer: &self.data,
            dtype: self.dtype,
            shape: self.shape.clone(),
            strides: util::canonical_strides(&self.shape, self.dtype.element_size()),
            offset: 0,
            byte_order: self.byte_order,
            count: self.num_elements(),
        }
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn rank(&self) -> usize {
        self.shape.len()
    }

    pub fn dtype(&self) -> DataType {
        self.dtype
    }

    pub fn byte_order(&self) -> ByteOrder {
        self.byte_order
    }

    pub fn num_elements(&self) -> usize {
        self.data.len() / self.dtype.element_size().max(1)
    }

    /// Raw payload bytes, in [`Array::byte_order`] order.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Owned arrays are always canonical row-major.
    pub const fn is_contiguous(&self) -> bool {
        true
    }

    /// Decode every element into a native-order `Vec`.
    ///
    /// Works for any stored byte order and any buffer alignment.
    pub fn to_vec<T: Element>(&self) -> Result<Vec<T>, ArrayError> {
        self.check_elem::<T>()?;
        Ok(self
            .data
            .chunks_exact(T::SIZE)
            .map(|chunk| T::read_bytes(chunk, self.byte_order))
            .collect())
    }

    /// View the array as an `ndarray`.
    ///
    /// Zero-copy when the payload is natively ordered and aligned for `T`;
    /// otherwise the elements are decoded into an owned copy.
    pub fn as_ndarray<T: Element>(
        &self,
    ) -> Result<ndarray::CowArray<'_, T, ndarray::IxDyn>, ArrayError> {
        self.check_elem::<T>()?;
        let shape = ndarray::IxDyn(&self.shape);
        let aligned = (self.data.as_ptr() as usize) % std::mem::align_of::<T>() == 0;
        if self.byte_order.is_native() && aligned {
            // Safety: the dtype check pins the byte length to
            // `count * size_of::<T>()`, the pointer is aligned, and every bit
            // pattern is a valid `T`.
            let elems: &[T] = unsafe {
                std::slice::from_raw_parts(self.data.as_ptr() as *const T, self.num_elements())
            };
            match ndarray::ArrayView::from_shape(shape, elems) {
                Ok(view) => Ok(view.into()),
                Err(e) => panic!("invalid ndarray shape for validated array: {e}"),
            }
        } else {
            let values = self.to_vec::<T>()?;
            match ndarray::Array::from_shape_vec(shape, values) {
                Ok(owned) => Ok(owned.into()),
                Err(e) => panic!("invalid ndarray shape for validated array: {e}"),
            }
        }
    }

    /// Iterate the fixed-width string elements of a `Char` array.
    pub fn char_elements(&self) -> Result<std::slice::ChunksExact<'_, u8>, ArrayError> {
        match self.dtype {
            DataType::Char { width } => Ok(self.data.chunks_exact(width as usize)),
            other => Err(ArrayError::NotChar(other)),
        }
    }

    /// Reverse the bytes of every element and toggle the byte-order tag.
    ///
    /// Logical values are preserved. Identity for types with no byte order
    /// (character data, single-byte integers).
    pub fn byte_swap(&self) -> Array {
        if !self.dtype.has_byte_order() {
            return self.clone();
        }
        let size = self.dtype.element_size();
        let mut buf = self.data.to_vec();
        for chunk in buf.chunks_exact_mut(size) {
            chunk.reverse();
        }
        Array {
            data: buf.into(),
            dtype: self.dtype,
            shape: self.shape.clone(),
            byte_order: self.byte_order.swapped(),
        }
    }

    fn check_elem<T: Element>(&self) -> Result<(), ArrayError> {
        if T::DTYPE != self.dtype {
            return Err(ArrayError::TypeMismatch {
                requested: T::DTYPE,
                stored: self.dtype,
            });
        }
        Ok(())
    }
}

impl PartialEq for Array {
    /// Structural equality: dtype (under the generic-int aliasing rule),
    /// shape, byte order where it carries meaning, and raw payload bytes.
    fn eq(&self, other: &Self) -> bool {
        self.dtype.equivalent(&other.dtype)
            && self.shape == other.shape
            && (!self.dtype.has_byte_order() || self.byte_order == other.byte_order)
            && self.data == other.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_slice_is_contiguous_and_aligned() {
        let values = [1i32, 2, 3, 4, 5, 6];
        let view = ArrayView::from_slice(&values, &[2, 3]).unwrap();
        assert_eq!(view.shape(), &[2, 3]);
        assert_eq!(view.strides(), &[12, 4]);
        assert_eq!(view.offset(), 0);
        assert_eq!(view.num_elements(), 6);
        assert!(view.is_contiguous());
        assert!(view.is_aligned());
    }

    #[test]
    fn from_slice_rejects_wrong_element_count() {
        let err = ArrayView::from_slice(&[1i32, 2], &[3]).unwrap_err();
        assert!(matches!(
            err,
            ArrayError::WrongElementCount {
                expected: 3,
                actual: 2
            }
        ));
    }

    #[test]
    fn rank_zero_view_holds_one_element() {
        let view = ArrayView::from_slice(&[33i32], &[]).unwrap();
        assert_eq!(view.rank(), 0);
        assert_eq!(view.num_elements(), 1);
        assert!(view.is_contiguous());
    }

    #[test]
    fn rank_above_ceiling_is_rejected() {
        let shape = vec![1usize; MAX_RANK + 1];
        let err = ArrayView::from_slice(&[1u8], &shape).unwrap_err();
        assert!(matches!(err, ArrayError::RankOverflow { rank: 33, .. }));
    }

    #[test]
    fn step_slice_reports_non_contiguous() {
        let values = [0i16, 1, 2, 3, 4];
        let view = ArrayView::from_slice(&values, &[5]).unwrap();
        let sliced = view.step(2).unwrap();
        assert_eq!(sliced.shape(), &[3]);
        assert_eq!(sliced.strides(), &[4]);
        assert!(!sliced.is_contiguous());
    }

    #[test]
    fn index_produces_offset_view() {
        let values: Vec<u32> = (0..100).collect();
        let view = ArrayView::from_slice(&values, &[10, 10]).unwrap();
        let row = view.index(2).unwrap();
        assert_eq!(row.shape(), &[10]);
        assert_eq!(row.offset(), 2 * 10 * 4);
        assert!(row.offset() > 0);
        assert!(row.is_contiguous());
    }

    #[test]
    fn index_out_of_bounds() {
        let view = ArrayView::from_slice(&[1u8, 2, 3], &[3]).unwrap();
        let err = view.index(3).unwrap_err();
        assert!(matches!(
            err,
            ArrayError::IndexOutOfBounds { index: 3, len: 3 }
        ));
    }

    #[test]
    fn extent_outside_buffer_is_rejected() {
        let buf = [0u8; 16];
        // Last element would start at byte 14 and run past the end.
        let err = ArrayView::new(&buf, DataType::I32, &[4], &[4], 2, ByteOrder::native())
            .unwrap_err();
        assert!(matches!(err, ArrayError::ExtentOutOfBounds { .. }));
    }

    #[test]
    fn misaligned_view_is_accepted_and_reported() {
        // A u32 backing guarantees 4-byte base alignment, so offset 1 is
        // misaligned for 4-byte elements.
        let backing = [0u32; 4];
        // Safety: reinterpreting plain integers as their own bytes.
        let bytes = unsafe {
            std::slice::from_raw_parts(backing.as_ptr() as *const u8, std::mem::size_of_val(&backing))
        };
        let view =
            ArrayView::new(bytes, DataType::F32, &[3], &[4], 1, ByteOrder::native()).unwrap();
        assert!(!view.is_aligned());
        assert_eq!(view.num_elements(), 3);
    }

    #[test]
    fn try_new_validates_byte_len() {
        let err = Array::try_new(
            Bytes::from(vec![0u8; 3]),
            DataType::I16,
            smallvec::smallvec![2],
            ByteOrder::native(),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ArrayError::WrongByteLen {
                expected: 4,
                actual: 3
            }
        ));
    }

    #[test]
    fn try_new_rejects_shape_overflow() {
        let err = Array::try_new(
            Bytes::new(),
            DataType::U8,
            smallvec::smallvec![usize::MAX, 2],
            ByteOrder::native(),
        )
        .unwrap_err();
        assert!(matches!(err, ArrayError::ShapeOverflow));
    }

    #[test]
    fn scalar_roundtrips_through_to_vec() {
        let arr = Array::scalar(33i32);
        assert_eq!(arr.rank(), 0);
        assert_eq!(arr.shape(), &[] as &[usize]);
        assert_eq!(arr.to_vec::<i32>().unwrap(), vec![33]);
    }

    #[test]
    fn to_vec_rejects_wrong_element_type() {
        let arr = Array::from_slice(&[1i32, 2], &[2]).unwrap();
        let err = arr.to_vec::<f32>().unwrap_err();
        assert!(matches!(
            err,
            ArrayError::TypeMismatch {
                requested: DataType::F32,
                stored: DataType::I32
            }
        ));
    }

    #[test]
    fn byte_swap_preserves_logical_values() {
        let arr = Array::from_slice(&[1i64, -2, 3], &[3]).unwrap();
        let swapped = arr.byte_swap();
        assert_eq!(swapped.byte_order(), ByteOrder::native().swapped());
        assert_ne!(swapped.data(), arr.data());
        assert_eq!(swapped.to_vec::<i64>().unwrap(), vec![1, -2, 3]);
        assert_eq!(swapped.byte_swap(), arr);
    }

    #[test]
    fn byte_swap_is_identity_for_char_data() {
        let arr = Array::from_strings(&["ab", "cd"], &[2]).unwrap();
        let swapped = arr.byte_swap();
        assert_eq!(swapped.data(), arr.data());
        assert_eq!(swapped.byte_order(), arr.byte_order());
    }

    #[test]
    fn as_ndarray_borrows_native_order() {
        let arr = Array::from_slice(&[1i32, 2, 3, 4], &[2, 2]).unwrap();
        let nd = arr.as_ndarray::<i32>().unwrap();
        assert_eq!(nd[[0, 1]], 2);
        assert_eq!(nd[[1, 0]], 3);
    }

    #[test]
    fn as_ndarray_decodes_swapped_order() {
        let arr = Array::from_slice(&[1i32, 2, 3, 4], &[4]).unwrap().byte_swap();
        let nd = arr.as_ndarray::<i32>().unwrap();
        let got: Vec<i32> = nd.iter().copied().collect();
        assert_eq!(got, vec![1, 2, 3, 4]);
    }

    #[test]
    fn from_strings_pads_to_widest() {
        let arr = Array::from_strings(&["a", "abc"], &[2]).unwrap();
        assert_eq!(arr.dtype(), DataType::Char { width: 3 });
        let elems: Vec<&[u8]> = arr.char_elements().unwrap().collect();
        assert_eq!(elems, vec![b"a\0\0".as_slice(), b"abc".as_slice()]);
    }

    #[test]
    fn char_elements_rejects_numeric_arrays() {
        let arr = Array::from_slice(&[1u16, 2], &[2]).unwrap();
        assert!(matches!(
            arr.char_elements().unwrap_err(),
            ArrayError::NotChar(DataType::U16)
        ));
    }

    #[test]
    fn from_ndarray_accepts_standard_layout_only() {
        let nd = ndarray::Array::from_shape_vec((2, 3), vec![1i32, 2, 3, 4, 5, 6])
            .unwrap()
            .into_dyn();
        let view = ArrayView::from_ndarray(&nd).unwrap();
        assert_eq!(view.shape(), &[2, 3]);

        let transposed = nd.view().reversed_axes();
        let err = ArrayView::from_ndarray(&transposed).unwrap_err();
        assert!(matches!(err, ArrayError::NonContiguousNdarray));
    }

    #[test]
    fn equality_respects_byte_order_for_numeric_types() {
        let arr = Array::from_slice(&[1i32, 256], &[2]).unwrap();
        assert_eq!(arr, arr.clone());
        assert_ne!(arr, arr.byte_swap());
    }
}
