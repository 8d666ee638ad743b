pub const MAGIC_NUMBER: &[u8; 4] = b"SILO";
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// On-disk format revision. Bumped on incompatible layout changes.
pub const FORMAT_VERSION: u32 = 1;

/// Fixed file header: magic + format version + index offset + index length.
pub const FILE_HEADER_LEN: u64 = MAGIC_NUMBER.len() as u64
    + std::mem::size_of::<u32>() as u64
    + 2 * std::mem::size_of::<u64>() as u64;

/// Maximum number of array dimensions accepted anywhere in the crate.
pub const MAX_RANK: usize = 32;

/// Conventional file extension for container files.
pub const FILE_EXTENSION: &str = "silo";
