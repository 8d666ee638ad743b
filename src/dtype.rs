//! Element datatypes and byte order.
//!
//! [`DataType`] is the closed set of element types the container understands.
//! Legacy single-character typecodes resolve through [`DataType::from_typecode`],
//! a total pure function; nothing else in the crate inspects typecodes.

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum DataType {
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    F32,
    F64,
    /// Fixed-width byte strings; `width` bytes per element.
    Char { width: u32 },
    /// Complex with 32-bit components. Recognized but rejected at write time.
    Complex32,
    /// Complex with 64-bit components. Recognized but rejected at write time.
    Complex64,
}

/// The tag a platform "long int" resolves to.
///
/// The `'i'`/`'l'` typecodes are indistinguishable on read-back; see
/// [`DataType::equivalent`].
#[cfg(target_pointer_width = "64")]
pub const NATIVE_LONG: DataType = DataType::I64;
#[cfg(not(target_pointer_width = "64"))]
pub const NATIVE_LONG: DataType = DataType::I32;

impl DataType {
    /// Resolve a legacy single-character typecode.
    pub const fn from_typecode(code: char) -> Option<DataType> {
        match code {
            '1' => Some(DataType::I8),
            'b' => Some(DataType::U8),
            's' => Some(DataType::I16),
            'w' => Some(DataType::U16),
            'i' => Some(DataType::I32),
            'u' => Some(DataType::U32),
            'l' => Some(NATIVE_LONG),
            'f' => Some(DataType::F32),
            'd' => Some(DataType::F64),
            'F' => Some(DataType::Complex32),
            'D' => Some(DataType::Complex64),
            'c' => Some(DataType::Char { width: 1 }),
            _ => None,
        }
    }

    /// Bytes per element.
    pub const fn element_size(&self) -> usize {
        match self {
            DataType::I8 | DataType::U8 => 1,
            DataType::I16 | DataType::U16 => 2,
            DataType::I32 | DataType::U32 | DataType::F32 => 4,
            DataType::I64 | DataType::U64 | DataType::F64 => 8,
            DataType::Char { width } => *width as usize,
            DataType::Complex32 => 8,
            DataType::Complex64 => 16,
        }
    }

    /// Whether arrays of this type may be persisted.
    pub const fn is_supported(&self) -> bool {
        !matches!(self, DataType::Complex32 | DataType::Complex64)
    }

    /// Whether the stored byte-order tag carries meaning for this type.
    ///
    /// Character data and single-byte integers are exempt.
    pub const fn has_byte_order(&self) -> bool {
        !matches!(self, DataType::Char { .. } | DataType::I8 | DataType::U8)
    }

    fn is_generic_int(&self) -> bool {
        matches!(self, DataType::I32) || *self == NATIVE_LONG
    }

    /// Type equality under the generic-int aliasing rule: a value written as
    /// the generic signed integer may read back tagged `I32` or [`NATIVE_LONG`],
    /// and both are acceptable.
    pub fn equivalent(&self, other: &DataType) -> bool {
        self == other || (self.is_generic_int() && other.is_generic_int())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum ByteOrder {
    Little,
    Big,
}

impl ByteOrder {
    #[cfg(target_endian = "little")]
    pub const fn native() -> ByteOrder {
        ByteOrder::Little
    }
    #[cfg(target_endian = "big")]
    pub const fn native() -> ByteOrder {
        ByteOrder::Big
    }

    pub const fn is_native(&self) -> bool {
        matches!(self, ByteOrder::Little) == matches!(Self::native(), ByteOrder::Little)
    }

    /// The opposite order.
    pub const fn swapped(&self) -> ByteOrder {
        match self {
            ByteOrder::Little => ByteOrder::Big,
            ByteOrder::Big => ByteOrder::Little,
        }
    }
}
