//! Hierarchical container files for N-dimensional arrays.
//!
//! A container is a single file holding a tree of named groups, each with
//! zero or more array nodes. A node stores one array's canonical flat byte
//! image plus its metadata (shape, element type, byte order, title,
//! attributes); metadata is readable without materializing the payload.
//!
//! The write side accepts arrays in any physical layout — contiguous or
//! strided, base-offset into a shared buffer, misaligned, native or swapped
//! byte order — described by an [`ArrayView`]. The read side always produces
//! an owned, contiguous [`Array`] with identical logical content.
//!
//! ```no_run
//! use silo::{Array, Silo, SiloMut};
//!
//! # fn main() -> Result<(), silo::SiloError> {
//! let source = Array::from_slice(&[1i32, 2, 3, 4, 5, 6], &[2, 3])?;
//!
//! let mut writer = SiloMut::create("data.silo")?;
//! let root = writer.root();
//! writer.create_array(root, "somearray", &source.view(), "Some array")?;
//! writer.close()?;
//!
//! let reader = Silo::open("data.silo")?;
//! let node = reader.node_at("/somearray")?;
//! assert_eq!(reader.shape(node), &[2, 3]);
//! assert_eq!(reader.read_array(node)?, source);
//! # Ok(())
//! # }
//! ```

pub mod array;
pub mod attrs;
pub mod consts;
pub mod dtype;
pub mod error;
pub mod header;
pub mod silo;
pub mod tree;

pub use array::{codec, datatype::Element, error::ArrayError, Array, ArrayView};
pub use attrs::{Attribute, AttributeValue};
pub use dtype::{ByteOrder, DataType, NATIVE_LONG};
pub use error::{SiloError, SiloResult};
pub use silo::{Silo, SiloMut};
pub use tree::{GroupId, NodeId};
