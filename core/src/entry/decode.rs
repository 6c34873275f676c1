//! entry/decode.rs
//! Entry record parsing.
//!
//! Design notes:
//! - The first byte decides the variant: high bit clear is a node, set is an account.
//! - Children are attached through `set_parent`, so duplicate labels in a file
//!   come out disambiguated exactly as if they had been added one by one.
//! - Nesting is bounded; a partially parsed subtree is released before the error is returned.

use crate::constants::record;
use crate::entry::field::Field;
use crate::entry::tree::EntryTree;
use crate::entry::types::EntryId;
use crate::headers::FormatError;
use crate::utils::ByteReader;

impl EntryTree {
    /// Parse one entry (with its subtree) into the arena. The result is detached.
    pub fn parse(&mut self, r: &mut ByteReader<'_>, max_depth: usize) -> Result<EntryId, FormatError> {
        self.parse_at(r, 0, max_depth)
    }

    fn parse_at(&mut self, r: &mut ByteReader<'_>, depth: usize, max_depth: usize) -> Result<EntryId, FormatError> {
        if depth > max_depth {
            return Err(FormatError::NestingTooDeep { max: max_depth });
        }
        let version = r.peek_u8("entry version")?;
        if version & record::ACCOUNT_MARKER == 0 {
            self.parse_node(r, depth, max_depth)
        } else {
            self.parse_account(r)
        }
    }

    fn parse_node(&mut self, r: &mut ByteReader<'_>, depth: usize, max_depth: usize) -> Result<EntryId, FormatError> {
        let version = r.read_u8("entry version")?;
        if version != record::NODE_V0 && version != record::NODE_V1 {
            return Err(FormatError::UnsupportedEntryVersion { version });
        }
        let label = r.read_string("entry label")?;

        let mut expanded = true;
        let mut extended_data = Vec::new();
        if version == record::NODE_V1 {
            let mut len = r.read_u16_be("entry extended data size")? as usize;
            if len >= 1 {
                expanded = r.read_u8("entry flags")? & record::NODE_EXPANDED != 0;
                len -= 1;
            }
            extended_data = r.read_bytes(len, "entry extended data")?.to_vec();
        }
        let child_count = r.read_u32_be("child count")?;

        let id = self.create_node(label);
        let attrs = self
            .set_expanded_by_default(id, expanded)
            .and_then(|_| self.set_extended_data(id, extended_data));
        if let Err(e) = attrs {
            self.destroy_subtree(id);
            return Err(FormatError::Invalid(e.to_string()));
        }

        for _ in 0..child_count {
            let child = match self.parse_at(r, depth + 1, max_depth) {
                Ok(child) => child,
                Err(e) => {
                    self.destroy_subtree(id);
                    return Err(e);
                }
            };
            if let Err(e) = self.set_parent(child, Some(id), None) {
                self.destroy_subtree(child);
                self.destroy_subtree(id);
                return Err(FormatError::Invalid(e.to_string()));
            }
        }
        Ok(id)
    }

    fn parse_account(&mut self, r: &mut ByteReader<'_>) -> Result<EntryId, FormatError> {
        let raw = r.read_u8("entry version")?;
        let version = raw ^ record::ACCOUNT_MARKER;
        if version != 0x00 && version != record::ACCOUNT_HAS_EXT {
            return Err(FormatError::UnsupportedEntryVersion { version: raw });
        }
        let label = r.read_string("entry label")?;
        let extended_data = if version == record::ACCOUNT_HAS_EXT {
            let len = r.read_u16_be("entry extended data size")? as usize;
            r.read_bytes(len, "entry extended data")?.to_vec()
        } else {
            Vec::new()
        };
        let field_count = r.read_u32_be("field count")?;

        let id = self.create_account(label);
        let mut fields = Vec::new();
        for _ in 0..field_count {
            match Field::parse(r, Some(id)) {
                Ok(f) => fields.push(f),
                Err(e) => {
                    self.destroy_subtree(id);
                    return Err(e);
                }
            }
        }

        let attrs = self
            .set_extended_data(id, extended_data)
            .and_then(|_| self.set_fields(id, fields));
        if let Err(e) = attrs {
            self.destroy_subtree(id);
            return Err(FormatError::Invalid(e.to_string()));
        }
        Ok(id)
    }
}
