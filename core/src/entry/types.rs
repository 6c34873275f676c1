//! entry/types.rs
//! Entry records stored in the arena, their handles and errors.

use std::fmt;
use thiserror::Error;

use crate::entry::field::Field;

/// Generation-checked handle to an entry in an [`EntryTree`](crate::entry::EntryTree).
///
/// A handle becomes stale once its entry is removed; the slot may be reused,
/// but the bumped generation keeps old handles from resolving to the newcomer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntryId {
    pub(crate) slot: u32,
    pub(crate) generation: u32,
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}v{}", self.slot, self.generation)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryType {
    Node,
    Account,
}

impl fmt::Display for EntryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            EntryType::Node => "node",
            EntryType::Account => "account",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeData {
    pub(crate) children: Vec<EntryId>,
    pub(crate) expanded_by_default: bool,
}

impl Default for NodeData {
    fn default() -> Self {
        Self { children: Vec::new(), expanded_by_default: true }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccountData {
    pub(crate) fields: Vec<Field>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryKind {
    Node(NodeData),
    Account(AccountData),
}

/// One node or account in the hierarchy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub(crate) label: String,
    pub(crate) parent: Option<EntryId>,
    /// Position among the parent's children; `None` while detached.
    pub(crate) index: Option<usize>,
    pub(crate) extended_data: Vec<u8>,
    pub(crate) kind: EntryKind,
}

impl Entry {
    pub(crate) fn new(label: String, entry_type: EntryType) -> Self {
        let kind = match entry_type {
            EntryType::Node => EntryKind::Node(NodeData::default()),
            EntryType::Account => EntryKind::Account(AccountData::default()),
        };
        Self { label, parent: None, index: None, extended_data: Vec::new(), kind }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn parent(&self) -> Option<EntryId> {
        self.parent
    }

    pub fn index(&self) -> Option<usize> {
        self.index
    }

    pub fn extended_data(&self) -> &[u8] {
        &self.extended_data
    }

    pub fn entry_type(&self) -> EntryType {
        match self.kind {
            EntryKind::Node(_) => EntryType::Node,
            EntryKind::Account(_) => EntryType::Account,
        }
    }

    pub fn kind(&self) -> &EntryKind {
        &self.kind
    }

    pub fn is_node(&self) -> bool {
        matches!(self.kind, EntryKind::Node(_))
    }

    pub fn is_account(&self) -> bool {
        matches!(self.kind, EntryKind::Account(_))
    }

    /// Children in index order; empty for accounts.
    pub fn children(&self) -> &[EntryId] {
        match &self.kind {
            EntryKind::Node(n) => &n.children,
            EntryKind::Account(_) => &[],
        }
    }

    /// Fields in order; empty for nodes.
    pub fn fields(&self) -> &[Field] {
        match &self.kind {
            EntryKind::Account(a) => &a.fields,
            EntryKind::Node(_) => &[],
        }
    }

    /// `None` for accounts.
    pub fn expanded_by_default(&self) -> Option<bool> {
        match &self.kind {
            EntryKind::Node(n) => Some(n.expanded_by_default),
            EntryKind::Account(_) => None,
        }
    }
}

/// Misuse of entry handles or operations on the wrong variant.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EntryError {
    #[error("entry {0} does not exist (removed or from another tree)")]
    Stale(EntryId),

    #[error("entry {0} is not a node")]
    NotANode(EntryId),

    #[error("entry {0} is not an account")]
    NotAnAccount(EntryId),

    #[error("cannot make entry {child} a child of {parent}: it would become its own ancestor")]
    CyclicParent { child: EntryId, parent: EntryId },

    #[error("index {index} out of range (len {len})")]
    IndexOutOfRange { index: usize, len: usize },
}

/// Subtree counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct EntryStatistics {
    pub node_count: usize,
    pub account_count: usize,
    pub field_count: usize,
}
