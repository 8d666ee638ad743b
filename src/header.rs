//! On-disk layout.
//!
//! ```text
//! 0                                                                EOF
//! +--------+---------+----------------------------+----------------+
//! | MAGIC  | header  | payload blobs (append-only)| bincode index  |
//! +--------+---------+----------------------------+----------------+
//!          ^ format version + index offset/length  ^ written on close
//! ```
//!
//! The fixed header slot directly after the magic number holds the location
//! of the index. A writer zeroes the slot at creation and patches it on
//! close; a zero offset therefore marks a container that was never
//! finalized.
//!
//! The index is the serialized group/node tree. Node records carry the full
//! metadata surface (shape, dtype, byte order, title, attributes) plus the
//! payload location, so metadata queries never touch payload bytes.

use compact_str::CompactString;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::{
    attrs::Attribute,
    consts::{FILE_HEADER_LEN, FORMAT_VERSION, MAGIC_NUMBER},
    dtype::{ByteOrder, DataType},
    error::{SiloError, SiloResult},
    tree::{GroupId, NodeEntry, PayloadHandle, Tree},
};

/// The fixed-size slot at the start of every container file.
#[derive(Debug, Clone, Copy)]
pub(crate) struct FileHeader {
    pub format_version: u32,
    /// Absolute offset of the index; 0 while the container is unfinalized.
    pub index_offset: u64,
    pub index_len: u64,
}

impl FileHeader {
    pub fn unfinalized() -> FileHeader {
        FileHeader {
            format_version: FORMAT_VERSION,
            index_offset: 0,
            index_len: 0,
        }
    }

    pub fn to_bytes(self) -> [u8; FILE_HEADER_LEN as usize] {
        let mut out = [0u8; FILE_HEADER_LEN as usize];
        out[..4].copy_from_slice(MAGIC_NUMBER);
        out[4..8].copy_from_slice(&self.format_version.to_le_bytes());
        out[8..16].copy_from_slice(&self.index_offset.to_le_bytes());
        out[16..24].copy_from_slice(&self.index_len.to_le_bytes());
        out
    }

    pub fn parse(bytes: &[u8]) -> SiloResult<FileHeader> {
        if bytes.len() < FILE_HEADER_LEN as usize {
            return Err(SiloError::Truncated);
        }
        if &bytes[..4] != MAGIC_NUMBER {
            return Err(SiloError::InvalidMagic);
        }
        let format_version = u32::from_le_bytes(bytes[4..8].try_into().expect("4-byte slice"));
        if format_version != FORMAT_VERSION {
            return Err(SiloError::UnsupportedVersion {
                found: format_version,
            });
        }
        Ok(FileHeader {
            format_version,
            index_offset: u64::from_le_bytes(bytes[8..16].try_into().expect("8-byte slice")),
            index_len: u64::from_le_bytes(bytes[16..24].try_into().expect("8-byte slice")),
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct GroupRecord {
    pub name: CompactString,
    /// Parent group id; `None` only for the root record.
    pub parent: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct NodeRecord {
    pub name: CompactString,
    pub parent: u32,
    pub title: String,
    pub dtype: DataType,
    pub shape: SmallVec<[usize; 4]>,
    pub byte_order: ByteOrder,
    pub attrs: Vec<Attribute>,
    pub payload_offset: u64,
    pub payload_len: u64,
}

/// The serialized tree written at the end of the file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct FileIndex {
    pub groups: Vec<GroupRecord>,
    pub nodes: Vec<NodeRecord>,
}

impl FileIndex {
    pub fn from_tree(tree: &Tree) -> FileIndex {
        FileIndex {
            groups: tree
                .groups()
                .iter()
                .map(|g| GroupRecord {
                    name: g.name.clone(),
                    parent: g.parent.map(|p| p.0),
                })
                .collect(),
            nodes: tree
                .nodes()
                .iter()
                .map(|n| NodeRecord {
                    name: n.name.clone(),
                    parent: n.parent.0,
                    title: n.title.clone(),
                    dtype: n.dtype,
                    shape: n.shape.clone(),
                    byte_order: n.byte_order,
                    attrs: n.attrs.clone(),
                    payload_offset: n.payload.offset,
                    payload_len: n.payload.size,
                })
                .collect(),
        }
    }

    /// Rebuild the in-memory tree.
    ///
    /// Records were appended in creation order, so every parent id precedes
    /// its children; anything else means a damaged index.
    pub fn into_tree(self) -> SiloResult<Tree> {
        let mut tree = Tree::new();
        for (position, record) in self.groups.iter().enumerate() {
            match record.parent {
                None => {
                    if position != 0 {
                        return Err(SiloError::Truncated);
                    }
                }
                Some(parent) => {
                    if parent as usize >= position {
                        return Err(SiloError::Truncated);
                    }
                    tree.add_group(GroupId(parent), &record.name)?;
                }
            }
        }
        for record in self.nodes {
            if record.parent as usize >= self.groups.len() {
                return Err(SiloError::Truncated);
            }
            tree.add_node(NodeEntry {
                name: record.name,
                parent: GroupId(record.parent),
                title: record.title,
                dtype: record.dtype,
                shape: record.shape,
                byte_order: record.byte_order,
                attrs: record.attrs,
                payload: PayloadHandle {
                    offset: record.payload_offset,
                    size: record.payload_len,
                },
            });
        }
        Ok(tree)
    }

    pub fn encode(&self) -> SiloResult<Vec<u8>> {
        Ok(bincode::serde::encode_to_vec(
            self,
            bincode::config::standard(),
        )?)
    }

    pub fn decode(bytes: &[u8]) -> SiloResult<FileIndex> {
        let (index, read) =
            bincode::serde::decode_from_slice::<FileIndex, _>(bytes, bincode::config::standard())?;
        if read != bytes.len() {
            return Err(SiloError::Truncated);
        }
        Ok(index)
    }
}
