//! entry/tree.rs
//! Arena holding every entry of a document.
//!
//! Design notes:
//! - Entries live in generation-tagged slots; a node owns its children through
//!   the ordered `children` list, and each child points back with `parent` + `index`.
//! - Detached entries (no parent) are still owned by the arena until `remove`.
//! - All structural edits keep `children[i].index == Some(i)` for every node.

use std::collections::{HashMap, HashSet};

use crate::entry::field::Field;
use crate::entry::types::{
    AccountData, Entry, EntryError, EntryId, EntryKind, EntryStatistics, EntryType, NodeData,
};

#[derive(Debug, Clone)]
struct Slot {
    generation: u32,
    entry: Option<Entry>,
}

#[derive(Debug, Clone, Default)]
pub struct EntryTree {
    slots: Vec<Slot>,
    free: Vec<u32>,
    live: usize,
}

impl EntryTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live entries, attached or not.
    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    pub fn contains(&self, id: EntryId) -> bool {
        self.get(id).is_some()
    }

    pub fn get(&self, id: EntryId) -> Option<&Entry> {
        self.slots
            .get(id.slot as usize)
            .filter(|s| s.generation == id.generation)
            .and_then(|s| s.entry.as_ref())
    }

    fn get_mut(&mut self, id: EntryId) -> Option<&mut Entry> {
        self.slots
            .get_mut(id.slot as usize)
            .filter(|s| s.generation == id.generation)
            .and_then(|s| s.entry.as_mut())
    }

    pub fn entry(&self, id: EntryId) -> Result<&Entry, EntryError> {
        self.get(id).ok_or(EntryError::Stale(id))
    }

    fn entry_mut(&mut self, id: EntryId) -> Result<&mut Entry, EntryError> {
        self.get_mut(id).ok_or(EntryError::Stale(id))
    }

    fn node(&self, id: EntryId) -> Result<&NodeData, EntryError> {
        match &self.entry(id)?.kind {
            EntryKind::Node(n) => Ok(n),
            EntryKind::Account(_) => Err(EntryError::NotANode(id)),
        }
    }

    fn node_mut(&mut self, id: EntryId) -> Result<&mut NodeData, EntryError> {
        match &mut self.entry_mut(id)?.kind {
            EntryKind::Node(n) => Ok(n),
            EntryKind::Account(_) => Err(EntryError::NotANode(id)),
        }
    }

    fn account(&self, id: EntryId) -> Result<&AccountData, EntryError> {
        match &self.entry(id)?.kind {
            EntryKind::Account(a) => Ok(a),
            EntryKind::Node(_) => Err(EntryError::NotAnAccount(id)),
        }
    }

    fn account_mut(&mut self, id: EntryId) -> Result<&mut AccountData, EntryError> {
        match &mut self.entry_mut(id)?.kind {
            EntryKind::Account(a) => Ok(a),
            EntryKind::Node(_) => Err(EntryError::NotAnAccount(id)),
        }
    }

    fn alloc(&mut self, entry: Entry) -> EntryId {
        self.live += 1;
        if let Some(slot) = self.free.pop() {
            let s = &mut self.slots[slot as usize];
            s.entry = Some(entry);
            return EntryId { slot, generation: s.generation };
        }
        let slot = self.slots.len() as u32;
        self.slots.push(Slot { generation: 0, entry: Some(entry) });
        EntryId { slot, generation: 0 }
    }

    fn release(&mut self, id: EntryId) -> Option<Entry> {
        let s = self.slots.get_mut(id.slot as usize)?;
        if s.generation != id.generation {
            return None;
        }
        let entry = s.entry.take()?;
        s.generation = s.generation.wrapping_add(1);
        self.free.push(id.slot);
        self.live -= 1;
        Some(entry)
    }

    // ---------------------------------------------------------------------
    // Creation
    // ---------------------------------------------------------------------

    /// New detached entry.
    pub fn create(&mut self, entry_type: EntryType, label: impl Into<String>) -> EntryId {
        self.alloc(Entry::new(label.into(), entry_type))
    }

    pub fn create_node(&mut self, label: impl Into<String>) -> EntryId {
        self.create(EntryType::Node, label)
    }

    pub fn create_account(&mut self, label: impl Into<String>) -> EntryId {
        self.create(EntryType::Account, label)
    }

    /// New entry appended to `parent`; the label is made unique among its siblings.
    pub fn create_child(&mut self, parent: EntryId, entry_type: EntryType, label: impl Into<String>) -> Result<EntryId, EntryError> {
        self.node(parent)?;
        let id = self.create(entry_type, label);
        self.set_parent(id, Some(parent), None)?;
        Ok(id)
    }

    // ---------------------------------------------------------------------
    // Common properties
    // ---------------------------------------------------------------------

    pub fn entry_type(&self, id: EntryId) -> Result<EntryType, EntryError> {
        Ok(self.entry(id)?.entry_type())
    }

    pub fn label(&self, id: EntryId) -> Result<&str, EntryError> {
        Ok(&self.entry(id)?.label)
    }

    /// Assign a label, then disambiguate it against the siblings.
    pub fn set_label(&mut self, id: EntryId, label: impl Into<String>) -> Result<(), EntryError> {
        self.entry_mut(id)?.label = label.into();
        self.make_label_unique(id)
    }

    pub fn parent(&self, id: EntryId) -> Result<Option<EntryId>, EntryError> {
        Ok(self.entry(id)?.parent)
    }

    pub fn index(&self, id: EntryId) -> Result<Option<usize>, EntryError> {
        Ok(self.entry(id)?.index)
    }

    pub fn extended_data(&self, id: EntryId) -> Result<&[u8], EntryError> {
        Ok(&self.entry(id)?.extended_data)
    }

    pub fn set_extended_data(&mut self, id: EntryId, data: impl Into<Vec<u8>>) -> Result<(), EntryError> {
        self.entry_mut(id)?.extended_data = data.into();
        Ok(())
    }

    /// Labels from the outermost ancestor down to `id`.
    pub fn path(&self, id: EntryId) -> Result<Vec<String>, EntryError> {
        let mut labels = Vec::new();
        let mut cur = Some(id);
        while let Some(c) = cur {
            let e = self.entry(c)?;
            labels.push(e.label.clone());
            cur = e.parent;
        }
        labels.reverse();
        Ok(labels)
    }

    /// Whether `node` is a (direct or indirect) ancestor of `id`.
    pub fn is_indirect_child_of(&self, id: EntryId, node: EntryId) -> Result<bool, EntryError> {
        let mut cur = self.entry(id)?.parent;
        while let Some(p) = cur {
            if p == node {
                return Ok(true);
            }
            cur = self.entry(p)?.parent;
        }
        Ok(false)
    }

    // ---------------------------------------------------------------------
    // Hierarchy
    // ---------------------------------------------------------------------

    /// Rewrite `index` of every child of `node` from position `from` on.
    fn reindex(&mut self, node: EntryId, from: usize) -> Result<(), EntryError> {
        let len = self.node(node)?.children.len();
        for i in from..len {
            let child = self.node(node)?.children[i];
            self.entry_mut(child)?.index = Some(i);
        }
        Ok(())
    }

    /// Move `id` under `parent` at `index` (append when `None` or past the end),
    /// or detach it when `parent` is `None`.
    ///
    /// Within the same parent the index refers to the list with `id` already removed.
    /// Nothing happens when `id` already sits under `parent` and `index` is `None` or unchanged.
    pub fn set_parent(&mut self, id: EntryId, parent: Option<EntryId>, index: Option<usize>) -> Result<(), EntryError> {
        let (cur_parent, cur_index) = {
            let e = self.entry(id)?;
            (e.parent, e.index)
        };
        if let Some(p) = parent {
            self.node(p)?;
        }
        if cur_parent == parent && (index.is_none() || index == cur_index) {
            return Ok(());
        }
        if let Some(p) = parent {
            if p == id || self.is_indirect_child_of(p, id)? {
                return Err(EntryError::CyclicParent { child: id, parent: p });
            }
        }

        // detach
        if let Some(old) = cur_parent {
            let n = self.node_mut(old)?;
            let pos = match cur_index {
                Some(i) if n.children.get(i) == Some(&id) => i,
                _ => n.children.iter().position(|c| *c == id).ok_or(EntryError::Stale(id))?,
            };
            n.children.remove(pos);
            self.reindex(old, pos)?;
        }

        // attach
        match parent {
            Some(p) => {
                let n = self.node_mut(p)?;
                let at = match index {
                    Some(i) if i < n.children.len() => i,
                    _ => n.children.len(),
                };
                n.children.insert(at, id);
                self.entry_mut(id)?.parent = Some(p);
                self.reindex(p, at)?;
            }
            None => {
                let e = self.entry_mut(id)?;
                e.parent = None;
                e.index = None;
            }
        }

        self.make_label_unique(id)
    }

    /// Append `"<label> <n>"` (n = 2, 3, ...) until no sibling shares the label.
    pub fn make_label_unique(&mut self, id: EntryId) -> Result<(), EntryError> {
        let e = self.entry(id)?;
        let Some(parent) = e.parent else {
            return Ok(());
        };
        let base = e.label.clone();

        let taken: HashSet<&str> = self
            .node(parent)?
            .children
            .iter()
            .filter(|c| **c != id)
            .filter_map(|c| self.get(*c))
            .map(|s| s.label.as_str())
            .collect();

        let mut candidate = base.clone();
        let mut n: u64 = 1;
        while taken.contains(candidate.as_str()) {
            n += 1;
            candidate = if base.is_empty() { n.to_string() } else { format!("{base} {n}") };
        }
        drop(taken);

        self.entry_mut(id)?.label = candidate;
        Ok(())
    }

    pub fn children(&self, node: EntryId) -> Result<&[EntryId], EntryError> {
        Ok(&self.node(node)?.children)
    }

    pub fn child_count(&self, node: EntryId) -> Result<usize, EntryError> {
        Ok(self.node(node)?.children.len())
    }

    pub fn child(&self, node: EntryId, index: usize) -> Result<Option<EntryId>, EntryError> {
        Ok(self.node(node)?.children.get(index).copied())
    }

    pub fn expanded_by_default(&self, node: EntryId) -> Result<bool, EntryError> {
        Ok(self.node(node)?.expanded_by_default)
    }

    pub fn set_expanded_by_default(&mut self, node: EntryId, expanded: bool) -> Result<(), EntryError> {
        self.node_mut(node)?.expanded_by_default = expanded;
        Ok(())
    }

    /// Put `new_child` in slot `at` of `node`. The previous occupant stays alive, detached.
    /// Returns the previous occupant.
    pub fn replace_child(&mut self, node: EntryId, at: usize, new_child: EntryId) -> Result<EntryId, EntryError> {
        let len = self.node(node)?.children.len();
        let old = self.child(node, at)?.ok_or(EntryError::IndexOutOfRange { index: at, len })?;
        self.entry(new_child)?;
        if old == new_child {
            return Ok(old);
        }
        if new_child == node || self.is_indirect_child_of(node, new_child)? {
            return Err(EntryError::CyclicParent { child: new_child, parent: node });
        }

        // pull the newcomer out first; the old child's slot may shift if they were siblings
        self.set_parent(new_child, None, None)?;
        let pos = self.entry(old)?.index.unwrap_or(at);

        self.node_mut(node)?.children[pos] = new_child;
        {
            let e = self.entry_mut(old)?;
            e.parent = None;
            e.index = None;
        }
        {
            let e = self.entry_mut(new_child)?;
            e.parent = Some(node);
            e.index = Some(pos);
        }
        self.make_label_unique(new_child)?;
        Ok(old)
    }

    /// Destroy children `begin..end` of `node` (with their subtrees) and re-index the rest.
    pub fn delete_children(&mut self, node: EntryId, begin: usize, end: usize) -> Result<(), EntryError> {
        let len = self.node(node)?.children.len();
        if begin > end || end > len {
            return Err(EntryError::IndexOutOfRange { index: end.max(begin), len });
        }
        let removed: Vec<EntryId> = self.node_mut(node)?.children.drain(begin..end).collect();
        for child in removed {
            self.destroy_subtree(child);
        }
        self.reindex(node, begin)
    }

    /// Detach `id` and destroy it together with its subtree.
    pub fn remove(&mut self, id: EntryId) -> Result<(), EntryError> {
        self.set_parent(id, None, None)?;
        self.destroy_subtree(id);
        Ok(())
    }

    pub(crate) fn destroy_subtree(&mut self, id: EntryId) {
        let mut stack = vec![id];
        while let Some(cur) = stack.pop() {
            if let Some(e) = self.release(cur) {
                if let EntryKind::Node(n) = e.kind {
                    stack.extend(n.children);
                }
            }
        }
    }

    /// `id` followed by all its descendants, depth first, children in index order.
    pub fn descendants(&self, id: EntryId) -> Result<Vec<EntryId>, EntryError> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(cur) = stack.pop() {
            let e = self.entry(cur)?;
            out.push(cur);
            stack.extend(e.children().iter().rev());
        }
        Ok(out)
    }

    pub fn statistics(&self, id: EntryId) -> Result<EntryStatistics, EntryError> {
        let mut stats = EntryStatistics::default();
        for cur in self.descendants(id)? {
            match &self.entry(cur)?.kind {
                EntryKind::Node(_) => stats.node_count += 1,
                EntryKind::Account(a) => {
                    stats.account_count += 1;
                    stats.field_count += a.fields.len();
                }
            }
        }
        Ok(stats)
    }

    // ---------------------------------------------------------------------
    // Fields
    // ---------------------------------------------------------------------

    pub fn fields(&self, account: EntryId) -> Result<&[Field], EntryError> {
        Ok(&self.account(account)?.fields)
    }

    pub fn field(&self, account: EntryId, index: usize) -> Result<&Field, EntryError> {
        let fields = &self.account(account)?.fields;
        fields.get(index).ok_or(EntryError::IndexOutOfRange { index, len: fields.len() })
    }

    pub fn field_mut(&mut self, account: EntryId, index: usize) -> Result<&mut Field, EntryError> {
        let fields = &mut self.account_mut(account)?.fields;
        let len = fields.len();
        fields.get_mut(index).ok_or(EntryError::IndexOutOfRange { index, len })
    }

    /// Append a field, tying it to `account`. Returns its position.
    pub fn push_field(&mut self, account: EntryId, mut field: Field) -> Result<usize, EntryError> {
        field.set_tied_account(Some(account));
        let fields = &mut self.account_mut(account)?.fields;
        fields.push(field);
        Ok(fields.len() - 1)
    }

    pub fn insert_field(&mut self, account: EntryId, index: usize, mut field: Field) -> Result<(), EntryError> {
        field.set_tied_account(Some(account));
        let fields = &mut self.account_mut(account)?.fields;
        if index > fields.len() {
            return Err(EntryError::IndexOutOfRange { index, len: fields.len() });
        }
        fields.insert(index, field);
        Ok(())
    }

    /// Take a field out; the returned value is no longer tied to any account.
    pub fn remove_field(&mut self, account: EntryId, index: usize) -> Result<Field, EntryError> {
        let fields = &mut self.account_mut(account)?.fields;
        if index >= fields.len() {
            return Err(EntryError::IndexOutOfRange { index, len: fields.len() });
        }
        let mut field = fields.remove(index);
        field.set_tied_account(None);
        Ok(field)
    }

    pub fn set_fields(&mut self, account: EntryId, fields: Vec<Field>) -> Result<(), EntryError> {
        let slot = &mut self.account_mut(account)?.fields;
        *slot = fields;
        for f in slot.iter_mut() {
            f.set_tied_account(Some(account));
        }
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Copying
    // ---------------------------------------------------------------------

    /// Deep copy of `id` and its subtree; the copy is parentless.
    pub fn clone_entry(&mut self, id: EntryId) -> Result<EntryId, EntryError> {
        let copies = self.collect_subtree(id)?;
        Ok(self.materialize(copies))
    }

    /// Deep copy of an entry living in another arena; the copy is parentless.
    pub fn import(&mut self, other: &EntryTree, id: EntryId) -> Result<EntryId, EntryError> {
        let copies = other.collect_subtree(id)?;
        Ok(self.materialize(copies))
    }

    fn collect_subtree(&self, id: EntryId) -> Result<Vec<(EntryId, Entry)>, EntryError> {
        self.descendants(id)?
            .into_iter()
            .map(|cur| self.entry(cur).map(|e| (cur, e.clone())))
            .collect()
    }

    /// Insert pre-order copies and rewire ids; the first entry becomes a detached root.
    fn materialize(&mut self, copies: Vec<(EntryId, Entry)>) -> EntryId {
        let mut mapping: HashMap<EntryId, EntryId> = HashMap::with_capacity(copies.len());
        let mut created = Vec::with_capacity(copies.len());
        for (old, entry) in copies {
            let new = self.alloc(entry);
            mapping.insert(old, new);
            created.push(new);
        }

        for (i, new) in created.iter().enumerate() {
            if let Some(e) = self.get_mut(*new) {
                if i == 0 {
                    e.parent = None;
                    e.index = None;
                } else {
                    e.parent = e.parent.and_then(|p| mapping.get(&p).copied());
                }
                match &mut e.kind {
                    EntryKind::Node(n) => {
                        for c in n.children.iter_mut() {
                            if let Some(m) = mapping.get(c) {
                                *c = *m;
                            }
                        }
                    }
                    EntryKind::Account(a) => {
                        for f in a.fields.iter_mut() {
                            f.set_tied_account(Some(*new));
                        }
                    }
                }
            }
        }
        created[0]
    }
}
