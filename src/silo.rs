//! Container file handles.
//!
//! [`SiloMut`] creates a container and writes nodes; [`Silo`] opens a
//! finalized container read-only. The two are separate types because the
//! contract never mixes modes on one file: a writer appends payloads behind
//! the fixed header, keeps the tree in memory, and [`SiloMut::close`] writes
//! the index and patches the header slot. A file whose writer never reached
//! `close` has no finalized nodes and cannot be opened.
//!
//! Node metadata (shape, dtype, byte order, title, attributes) is answered
//! from the in-memory tree; only [`read_array`](Silo::read_array) touches
//! payload bytes.

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use bytes::Bytes;
use tracing::{debug, trace};

use crate::{
    array::{codec, Array, ArrayView},
    attrs::{Attribute, AttributeValue},
    consts::{FILE_HEADER_LEN, FORMAT_VERSION},
    dtype::{ByteOrder, DataType},
    error::{SiloError, SiloResult},
    header::{FileHeader, FileIndex},
    tree::{GroupId, NodeEntry, NodeId, PayloadHandle, Tree},
};

/// A container open for writing.
pub struct SiloMut {
    file: File,
    path: PathBuf,
    tree: Tree,
    cursor: u64,
}

impl SiloMut {
    /// Create (or truncate) a container file at `path`.
    pub fn create<P: AsRef<Path>>(path: P) -> SiloResult<SiloMut> {
        let path = path.as_ref();
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?;
        file.write_all(&FileHeader::unfinalized().to_bytes())?;
        debug!(path = %path.display(), "created container");
        Ok(SiloMut {
            file,
            path: path.to_owned(),
            tree: Tree::new(),
            cursor: FILE_HEADER_LEN,
        })
    }

    pub fn root(&self) -> GroupId {
        self.tree.root()
    }

    /// Create a child group.
    ///
    /// # Errors
    /// [`SiloError::NameCollision`] if `name` already exists under `parent`.
    pub fn create_group(&mut self, parent: GroupId, name: &str) -> SiloResult<GroupId> {
        let id = self.tree.add_group(parent, name)?;
        trace!(path = %self.tree.group_path(id), "created group");
        Ok(id)
    }

    /// Gather `array` into its canonical flat image and store it as a node.
    ///
    /// The write is all-or-nothing: on any failure (name collision,
    /// unsupported element type) no node is recorded.
    pub fn create_array(
        &mut self,
        parent: GroupId,
        name: &str,
        array: &ArrayView<'_>,
        title: &str,
    ) -> SiloResult<NodeId> {
        self.tree.ensure_vacant(parent, name)?;
        let flat = codec::gather(array)?;
        let payload = self.append(flat.data())?;
        let shape = flat.shape().into();
        let id = self.tree.add_node(NodeEntry {
            name: name.into(),
            parent,
            title: title.to_owned(),
            dtype: flat.dtype(),
            shape,
            byte_order: flat.byte_order(),
            attrs: Vec::new(),
            payload,
        });
        trace!(
            path = %self.tree.node_path(id),
            elements = flat.num_elements(),
            "created array node"
        );
        Ok(id)
    }

    /// Set (or overwrite) a named attribute on a node.
    pub fn set_attribute(&mut self, node: NodeId, name: &str, value: impl Into<AttributeValue>) {
        let attrs = &mut self.tree.node_mut(node).attrs;
        let value = value.into();
        if let Some(existing) = attrs.iter_mut().find(|a| a.name == name) {
            existing.value = value;
        } else {
            attrs.push(Attribute {
                name: name.to_owned(),
                value,
            });
        }
    }

    pub fn group(&self, parent: GroupId, name: &str) -> SiloResult<GroupId> {
        lookup_group(&self.tree, parent, name)
    }

    pub fn node(&self, parent: GroupId, name: &str) -> SiloResult<NodeId> {
        lookup_node(&self.tree, parent, name)
    }

    pub fn shape(&self, node: NodeId) -> &[usize] {
        &self.tree.node(node).shape
    }

    pub fn dtype(&self, node: NodeId) -> DataType {
        self.tree.node(node).dtype
    }

    pub fn byte_order(&self, node: NodeId) -> ByteOrder {
        self.tree.node(node).byte_order
    }

    pub fn title(&self, node: NodeId) -> &str {
        &self.tree.node(node).title
    }

    pub fn attributes(&self, node: NodeId) -> &[Attribute] {
        &self.tree.node(node).attrs
    }

    pub fn path(&self, node: NodeId) -> String {
        self.tree.node_path(node)
    }

    /// Read a node back through the still-open write handle.
    pub fn read_array(&self, node: NodeId) -> SiloResult<Array> {
        read_node(&self.file, &self.tree, node)
    }

    /// Write the index, patch the header slot and flush everything to disk.
    ///
    /// A container is unreadable until this succeeds.
    pub fn close(mut self) -> SiloResult<()> {
        let index = FileIndex::from_tree(&self.tree).encode()?;
        self.file.seek(SeekFrom::Start(self.cursor))?;
        self.file.write_all(&index)?;

        let header = FileHeader {
            format_version: FORMAT_VERSION,
            index_offset: self.cursor,
            index_len: index.len() as u64,
        };
        self.file.seek(SeekFrom::Start(0))?;
        self.file.write_all(&header.to_bytes())?;
        self.file.sync_all()?;
        debug!(
            path = %self.path.display(),
            nodes = self.tree.nodes().len(),
            "finalized container"
        );
        Ok(())
    }

    fn append(&mut self, bytes: &[u8]) -> SiloResult<PayloadHandle> {
        self.file.seek(SeekFrom::Start(self.cursor))?;
        self.file.write_all(bytes)?;
        let handle = PayloadHandle {
            offset: self.cursor,
            size: bytes.len() as u64,
        };
        self.cursor += bytes.len() as u64;
        Ok(handle)
    }
}

/// A finalized container open read-only.
pub struct Silo {
    file: File,
    tree: Tree,
}

impl Silo {
    /// Open a finalized container file.
    ///
    /// # Errors
    /// - [`SiloError::InvalidMagic`] / [`SiloError::UnsupportedVersion`] for
    ///   foreign or newer files
    /// - [`SiloError::Unfinalized`] if the writer never reached `close`
    /// - [`SiloError::Truncated`] if the index can't be read back whole
    pub fn open<P: AsRef<Path>>(path: P) -> SiloResult<Silo> {
        let path = path.as_ref();
        let file = OpenOptions::new().read(true).open(path)?;

        let mut header_bytes = [0u8; FILE_HEADER_LEN as usize];
        read_exact_at(&file, &mut header_bytes, 0)?;
        let header = FileHeader::parse(&header_bytes)?;
        if header.index_offset == 0 {
            return Err(SiloError::Unfinalized);
        }

        let mut index_bytes = vec![0u8; header.index_len as usize];
        read_exact_at(&file, &mut index_bytes, header.index_offset)?;
        let tree = FileIndex::decode(&index_bytes)?.into_tree()?;
        debug!(
            path = %path.display(),
            groups = tree.groups().len(),
            nodes = tree.nodes().len(),
            "opened container read-only"
        );
        Ok(Silo { file, tree })
    }

    pub fn root(&self) -> GroupId {
        self.tree.root()
    }

    pub fn group(&self, parent: GroupId, name: &str) -> SiloResult<GroupId> {
        lookup_group(&self.tree, parent, name)
    }

    pub fn node(&self, parent: GroupId, name: &str) -> SiloResult<NodeId> {
        lookup_node(&self.tree, parent, name)
    }

    /// Resolve an absolute `/group/.../node` path.
    pub fn node_at(&self, path: &str) -> SiloResult<NodeId> {
        self.tree.resolve_node(path)
    }

    pub fn shape(&self, node: NodeId) -> &[usize] {
        &self.tree.node(node).shape
    }

    pub fn dtype(&self, node: NodeId) -> DataType {
        self.tree.node(node).dtype
    }

    pub fn byte_order(&self, node: NodeId) -> ByteOrder {
        self.tree.node(node).byte_order
    }

    pub fn title(&self, node: NodeId) -> &str {
        &self.tree.node(node).title
    }

    pub fn attributes(&self, node: NodeId) -> &[Attribute] {
        &self.tree.node(node).attrs
    }

    pub fn path(&self, node: NodeId) -> String {
        self.tree.node_path(node)
    }

    /// Read a node's payload and decode it into an owned contiguous array.
    pub fn read_array(&self, node: NodeId) -> SiloResult<Array> {
        read_node(&self.file, &self.tree, node)
    }
}

fn lookup_group(tree: &Tree, parent: GroupId, name: &str) -> SiloResult<GroupId> {
    tree.child_group(parent, name).ok_or_else(|| SiloError::NotFound {
        path: join_path(tree, parent, name),
    })
}

fn lookup_node(tree: &Tree, parent: GroupId, name: &str) -> SiloResult<NodeId> {
    tree.child_node(parent, name).ok_or_else(|| SiloError::NotFound {
        path: join_path(tree, parent, name),
    })
}

fn join_path(tree: &Tree, parent: GroupId, name: &str) -> String {
    let parent = tree.group_path(parent);
    if parent == "/" {
        format!("/{name}")
    } else {
        format!("{parent}/{name}")
    }
}

fn read_node(file: &File, tree: &Tree, node: NodeId) -> SiloResult<Array> {
    let entry = tree.node(node);
    let mut payload = vec![0u8; entry.payload.size as usize];
    read_exact_at(file, &mut payload, entry.payload.offset)?;
    let array = codec::decode(
        Bytes::from(payload),
        entry.dtype,
        &entry.shape,
        entry.byte_order,
    )?;
    trace!(path = %tree.node_path(node), bytes = entry.payload.size, "read array node");
    Ok(array)
}

/// Positioned full read; a short read means the file lost bytes it indexed.
fn read_exact_at(mut file: &File, buf: &mut [u8], offset: u64) -> SiloResult<()> {
    file.seek(SeekFrom::Start(offset))?;
    file.read_exact(buf).map_err(|e| {
        if e.kind() == std::io::ErrorKind::UnexpectedEof {
            SiloError::Truncated
        } else {
            SiloError::Io(e)
        }
    })
}
