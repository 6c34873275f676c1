//! entry/path.rs
//! Label-path addressing.
//!
//! A path is consumed one label per level starting at a node. Resolution stops
//! at the first child whose label matches; it never continues through an account.

use crate::entry::tree::EntryTree;
use crate::entry::types::{EntryError, EntryId, EntryType};

enum Resolution<'p> {
    Found(EntryId),
    /// Everything but the last label resolved to `parent`.
    MissingLast { parent: EntryId, label: &'p str },
    NotFound,
}

impl EntryTree {
    fn resolve<'p, S: AsRef<str>>(&self, start: EntryId, path: &'p [S], include_self: bool) -> Result<Resolution<'p>, EntryError> {
        self.children(start)?;
        let Some((first, _)) = path.split_first() else {
            return Ok(Resolution::NotFound);
        };

        let mut rest = path;
        if include_self {
            if first.as_ref() != self.label(start)? {
                return Ok(Resolution::NotFound);
            }
            rest = &rest[1..];
        }
        if rest.is_empty() {
            return Ok(Resolution::Found(start));
        }

        let mut cur = start;
        while let Some((head, tail)) = rest.split_first() {
            let head = head.as_ref();
            let found = self
                .children(cur)?
                .iter()
                .copied()
                .find(|c| self.get(*c).is_some_and(|e| e.label() == head));

            match found {
                Some(child) if tail.is_empty() => return Ok(Resolution::Found(child)),
                Some(child) if self.entry(child)?.is_node() => {
                    cur = child;
                    rest = tail;
                }
                Some(_) => return Ok(Resolution::NotFound),
                None if tail.is_empty() => return Ok(Resolution::MissingLast { parent: cur, label: head }),
                None => return Ok(Resolution::NotFound),
            }
        }
        Ok(Resolution::NotFound)
    }

    /// Look up `path` below the node `start`; with `include_self` the first label must name `start`.
    pub fn find_by_path<S: AsRef<str>>(&self, start: EntryId, path: &[S], include_self: bool) -> Result<Option<EntryId>, EntryError> {
        Ok(match self.resolve(start, path, include_self)? {
            Resolution::Found(id) => Some(id),
            _ => None,
        })
    }

    /// Like [`find_by_path`](Self::find_by_path), but when only the final label is
    /// missing and `create` is given, a new entry of that type is appended and returned.
    /// Intermediate levels are never created.
    pub fn entry_by_path<S: AsRef<str>>(
        &mut self,
        start: EntryId,
        path: &[S],
        include_self: bool,
        create: Option<EntryType>,
    ) -> Result<Option<EntryId>, EntryError> {
        let (parent, label) = match self.resolve(start, path, include_self)? {
            Resolution::Found(id) => return Ok(Some(id)),
            Resolution::NotFound => return Ok(None),
            Resolution::MissingLast { parent, label } => (parent, label.to_owned()),
        };
        match create {
            Some(entry_type) => Ok(Some(self.create_child(parent, entry_type, label)?)),
            None => Ok(None),
        }
    }
}
