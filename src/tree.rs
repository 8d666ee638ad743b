//! In-memory group/node tree.
//!
//! Groups and nodes live in flat id-indexed tables; parents are plain ids,
//! so the tree has no ownership cycles (a child never owns its parent).
//! Group and node names share one namespace under each parent.

use compact_str::CompactString;
use smallvec::SmallVec;

use crate::{
    attrs::Attribute,
    dtype::{ByteOrder, DataType},
    error::SiloError,
};

/// Identifier of a group in the container tree. The root group is id 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GroupId(pub(crate) u32);

/// Identifier of an array node in the container tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub(crate) u32);

/// Location of a node's payload inside the container file.
#[derive(Debug, Clone, Copy)]
pub(crate) struct PayloadHandle {
    pub offset: u64,
    pub size: u64,
}

pub(crate) struct GroupEntry {
    pub name: CompactString,
    pub parent: Option<GroupId>,
    pub groups: Vec<GroupId>,
    pub nodes: Vec<NodeId>,
}

pub(crate) struct NodeEntry {
    pub name: CompactString,
    pub parent: GroupId,
    pub title: String,
    pub dtype: DataType,
    pub shape: SmallVec<[usize; 4]>,
    pub byte_order: ByteOrder,
    pub attrs: Vec<Attribute>,
    pub payload: PayloadHandle,
}

pub(crate) struct Tree {
    groups: Vec<GroupEntry>,
    nodes: Vec<NodeEntry>,
}

impl Tree {
    pub fn new() -> Tree {
        Tree {
            groups: vec![GroupEntry {
                name: CompactString::const_new(""),
                parent: None,
                groups: Vec::new(),
                nodes: Vec::new(),
            }],
            nodes: Vec::new(),
        }
    }

    pub fn root(&self) -> GroupId {
        GroupId(0)
    }

    pub fn group(&self, id: GroupId) -> &GroupEntry {
        &self.groups[id.0 as usize]
    }

    pub fn node(&self, id: NodeId) -> &NodeEntry {
        &self.nodes[id.0 as usize]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut NodeEntry {
        &mut self.nodes[id.0 as usize]
    }

    pub fn groups(&self) -> &[GroupEntry] {
        &self.groups
    }

    pub fn nodes(&self) -> &[NodeEntry] {
        &self.nodes
    }

    /// Fails with [`SiloError::NameCollision`] if `name` already names a
    /// child group or node of `parent`.
    pub fn ensure_vacant(&self, parent: GroupId, name: &str) -> Result<(), SiloError> {
        let taken = self.child_group(parent, name).is_some()
            || self.child_node(parent, name).is_some();
        if taken {
            return Err(SiloError::NameCollision {
                parent: self.group_path(parent),
                name: name.to_owned(),
            });
        }
        Ok(())
    }

    pub fn add_group(&mut self, parent: GroupId, name: &str) -> Result<GroupId, SiloError> {
        self.ensure_vacant(parent, name)?;
        let id = GroupId(self.groups.len() as u32);
        self.groups.push(GroupEntry {
            name: name.into(),
            parent: Some(parent),
            groups: Vec::new(),
            nodes: Vec::new(),
        });
        self.groups[parent.0 as usize].groups.push(id);
        Ok(id)
    }

    pub fn add_node(&mut self, entry: NodeEntry) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        let parent = entry.parent;
        self.nodes.push(entry);
        self.groups[parent.0 as usize].nodes.push(id);
        id
    }

    pub fn child_group(&self, parent: GroupId, name: &str) -> Option<GroupId> {
        self.group(parent)
            .groups
            .iter()
            .copied()
            .find(|&id| self.group(id).name == name)
    }

    pub fn child_node(&self, parent: GroupId, name: &str) -> Option<NodeId> {
        self.group(parent)
            .nodes
            .iter()
            .copied()
            .find(|&id| self.node(id).name == name)
    }

    /// Absolute path of a group (`"/"` for the root).
    pub fn group_path(&self, id: GroupId) -> String {
        let mut segments: Vec<&str> = Vec::new();
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            let entry = self.group(current);
            if entry.parent.is_some() {
                segments.push(&entry.name);
            }
            cursor = entry.parent;
        }
        if segments.is_empty() {
            return "/".to_owned();
        }
        segments.reverse();
        format!("/{}", segments.join("/"))
    }

    /// Absolute path of a node.
    pub fn node_path(&self, id: NodeId) -> String {
        let entry = self.node(id);
        let parent = self.group_path(entry.parent);
        if parent == "/" {
            format!("/{}", entry.name)
        } else {
            format!("{}/{}", parent, entry.name)
        }
    }

    /// Resolve an absolute `/group/.../node` path to a node id.
    pub fn resolve_node(&self, path: &str) -> Result<NodeId, SiloError> {
        let not_found = || SiloError::NotFound {
            path: path.to_owned(),
        };
        let mut segments = path.split('/').filter(|s| !s.is_empty()).peekable();
        let mut group = self.root();
        while let Some(segment) = segments.next() {
            if segments.peek().is_none() {
                return self.child_node(group, segment).ok_or_else(not_found);
            }
            group = self.child_group(group, segment).ok_or_else(not_found)?;
        }
        Err(not_found())
    }
}
