use thiserror::Error;

use crate::array::error::ArrayError;

/// Errors returned by container file operations.
///
/// [`ArrayError`] wraps every descriptor/codec failure, which is how
/// `UnsupportedType` propagates out of a failed node creation.
#[derive(Debug, Error)]
pub enum SiloError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Array(#[from] ArrayError),

    #[error("name {name:?} already exists under {parent:?}")]
    NameCollision { parent: String, name: String },

    #[error("no such group or node: {path:?}")]
    NotFound { path: String },

    #[error("not a container file (bad magic number)")]
    InvalidMagic,

    #[error("unsupported container format version {found}")]
    UnsupportedVersion { found: u32 },

    #[error("container was never finalized (missing index)")]
    Unfinalized,

    #[error("container index is truncated or damaged")]
    Truncated,

    #[error(transparent)]
    Encode(#[from] bincode::error::EncodeError),

    #[error(transparent)]
    Decode(#[from] bincode::error::DecodeError),
}

/// Result alias used throughout the container subsystem.
pub type SiloResult<T> = Result<T, SiloError>;
