//! Scalar element types.
//!
//! [`Element`] ties a native Rust scalar to its [`DataType`] tag and defines
//! how single elements move between native values and stored bytes in either
//! byte order. Decoding goes through fixed-size byte arrays, never pointer
//! reinterpretation, so it is safe on buffers with no particular alignment.

use crate::dtype::{ByteOrder, DataType};

pub trait Element: Copy + PartialEq + std::fmt::Debug + 'static {
    /// The logical datatype tag for this scalar.
    const DTYPE: DataType;

    /// Bytes per element.
    const SIZE: usize;

    /// Decode one element from exactly [`Self::SIZE`] bytes.
    fn read_bytes(bytes: &[u8], order: ByteOrder) -> Self;

    /// Encode one element into exactly [`Self::SIZE`] bytes.
    fn write_bytes(self, order: ByteOrder, out: &mut [u8]);
}

macro_rules! impl_element_scalar {
    ($ty:ty, $dtype:ident) => {
        impl Element for $ty {
            const DTYPE: DataType = DataType::$dtype;
            const SIZE: usize = std::mem::size_of::<$ty>();

            fn read_bytes(bytes: &[u8], order: ByteOrder) -> Self {
                let bytes: [u8; std::mem::size_of::<$ty>()] = bytes
                    .try_into()
                    .expect("element slice must be exactly SIZE bytes");
                match order {
                    ByteOrder::Little => <$ty>::from_le_bytes(bytes),
                    ByteOrder::Big => <$ty>::from_be_bytes(bytes),
                }
            }

            fn write_bytes(self, order: ByteOrder, out: &mut [u8]) {
                let bytes = match order {
                    ByteOrder::Little => self.to_le_bytes(),
                    ByteOrder::Big => self.to_be_bytes(),
                };
                out.copy_from_slice(&bytes);
            }
        }
    };
}

impl_element_scalar!(i8, I8);
impl_element_scalar!(i16, I16);
impl_element_scalar!(i32, I32);
impl_element_scalar!(i64, I64);
impl_element_scalar!(u8, U8);
impl_element_scalar!(u16, U16);
impl_element_scalar!(u32, U32);
impl_element_scalar!(u64, U64);
impl_element_scalar!(f32, F32);
impl_element_scalar!(f64, F64);
