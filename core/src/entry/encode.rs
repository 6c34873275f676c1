//! entry/encode.rs
//! Entry record serialization (inverse of `decode.rs`).

use crate::constants::record;
use crate::entry::tree::EntryTree;
use crate::entry::types::{EntryId, EntryKind};
use crate::headers::FormatError;
use crate::types::Result;
use crate::utils::{put_length_prefixed, put_u16_be, put_u16_prefixed, put_u32_be, put_u8};

fn put_count(out: &mut Vec<u8>, n: usize, context: &'static str) -> std::result::Result<(), FormatError> {
    let n32 = u32::try_from(n)
        .map_err(|_| FormatError::LengthOverflow { context, len: n, max: u32::MAX as usize })?;
    put_u32_be(out, n32);
    Ok(())
}

impl EntryTree {
    /// Append the record of `id` and its whole subtree to `out`.
    pub fn make(&self, id: EntryId, out: &mut Vec<u8>) -> Result<()> {
        let e = self.entry(id)?;
        match &e.kind {
            EntryKind::Node(n) => {
                let v1 = !n.expanded_by_default || !e.extended_data.is_empty();
                put_u8(out, if v1 { record::NODE_V1 } else { record::NODE_V0 });
                put_length_prefixed(out, e.label.as_bytes(), "entry label")?;
                if v1 {
                    // one flags byte precedes the extended data inside the length
                    let max = u16::MAX as usize - 1;
                    if e.extended_data.len() > max {
                        return Err(FormatError::LengthOverflow {
                            context: "entry extended data",
                            len: e.extended_data.len(),
                            max,
                        }
                        .into());
                    }
                    put_u16_be(out, (1 + e.extended_data.len()) as u16);
                    put_u8(out, if n.expanded_by_default { record::NODE_EXPANDED } else { 0x00 });
                    out.extend_from_slice(&e.extended_data);
                }
                put_count(out, n.children.len(), "child count")?;
                for child in &n.children {
                    self.make(*child, out)?;
                }
            }
            EntryKind::Account(a) => {
                let has_ext = !e.extended_data.is_empty();
                put_u8(out, record::ACCOUNT_MARKER | if has_ext { record::ACCOUNT_HAS_EXT } else { 0x00 });
                put_length_prefixed(out, e.label.as_bytes(), "entry label")?;
                if has_ext {
                    put_u16_prefixed(out, &e.extended_data, u16::MAX as usize, "entry extended data")?;
                }
                put_count(out, a.fields.len(), "field count")?;
                for field in &a.fields {
                    field.make(out)?;
                }
            }
        }
        Ok(())
    }

    /// Serialized bytes of `id` and its subtree.
    pub fn to_bytes(&self, id: EntryId) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        self.make(id, &mut out)?;
        Ok(out)
    }
}
