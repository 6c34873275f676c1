//! file/export.rs
//! Plain-text rendering of an entry tree and the human-readable file summary.

use std::fmt::Write as _;

use crate::entry::{EntryId, EntryKind, EntryStatistics, EntryTree};
use crate::options::SaveOptions;
use crate::types::Result;

const INDENT: &str = "    ";
const NAME_WIDTH: usize = 15;
const PREVIEW_LEN: usize = 16;

/// Render the subtree under `root`: one `" - <label>"` line per entry, four spaces
/// per level, and account fields as `"    <name padded to 15><value>"`.
pub fn render_text(tree: &EntryTree, root: EntryId) -> Result<String> {
    let mut out = String::new();
    render_entry(tree, root, 0, &mut out)?;
    Ok(out)
}

fn render_entry(tree: &EntryTree, id: EntryId, level: usize, out: &mut String) -> Result<()> {
    let entry = tree.entry(id)?;
    let indent = INDENT.repeat(level);
    // writing into a String cannot fail
    let _ = writeln!(out, "{indent} - {}", entry.label());

    match entry.kind() {
        EntryKind::Node(node) => {
            for &child in &node.children {
                render_entry(tree, child, level + 1, out)?;
            }
        }
        EntryKind::Account(account) => {
            for field in &account.fields {
                let _ = writeln!(
                    out,
                    "{indent}{INDENT}{:<width$}{}",
                    field.name(),
                    field.value(),
                    width = NAME_WIDTH
                );
            }
        }
    }
    Ok(())
}

/// Inputs for [`render_summary`], gathered by `PasswordFile::summary`.
pub(crate) struct SummaryInput<'a> {
    pub path: &'a str,
    pub version: u32,
    pub version_after_save: u32,
    pub features: SaveOptions,
    pub features_after_save: SaveOptions,
    pub extended_header: &'a [u8],
    pub encrypted_extended_header: &'a [u8],
    pub statistics: EntryStatistics,
}

pub(crate) fn render_summary(s: &SummaryInput<'_>) -> String {
    let mut out = String::new();
    if !s.path.is_empty() {
        let _ = writeln!(out, "Path:                 {}", s.path);
    }
    let _ = writeln!(out, "Version:              {}", s.version);
    if s.version != s.version_after_save {
        let _ = writeln!(out, "                      (on disk, after saving: {})", s.version_after_save);
    }
    let _ = writeln!(out, "Features:             {}", s.features);
    if s.features != s.features_after_save {
        let _ = writeln!(out, "                      (on disk, after saving: {})", s.features_after_save);
    }
    if !s.extended_header.is_empty() {
        let _ = writeln!(out, "Extended header:      {}", preview(s.extended_header));
    }
    if !s.encrypted_extended_header.is_empty() {
        let _ = writeln!(out, "Encrypted ext header: {} bytes", s.encrypted_extended_header.len());
    }
    let _ = writeln!(out, "Number of categories: {}", s.statistics.node_count);
    let _ = writeln!(out, "Number of accounts:   {}", s.statistics.account_count);
    let _ = writeln!(out, "Number of fields:     {}", s.statistics.field_count);
    out
}

/// `<len> bytes (<hex of the first 16 bytes>[...])`
fn preview(bytes: &[u8]) -> String {
    let n = bytes.len().min(PREVIEW_LEN);
    let ellipsis = if bytes.len() > PREVIEW_LEN { "..." } else { "" };
    format!("{} bytes ({}{})", bytes.len(), hex::encode(&bytes[..n]), ellipsis)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::{EntryType, Field};

    #[test]
    fn export_layout() {
        let mut tree = EntryTree::new();
        let root = tree.create_node("accounts");
        let bank = tree.create_child(root, EntryType::Account, "bank").unwrap();
        tree.push_field(bank, Field::new("pin", "1234")).unwrap();

        let text = render_text(&tree, root).unwrap();
        assert_eq!(text, " - accounts\n     - bank\n        pin            1234\n");
    }

    #[test]
    fn preview_truncates_long_headers() {
        assert_eq!(preview(&[0xab, 0xcd]), "2 bytes (abcd)");
        let long = vec![0u8; 20];
        assert!(preview(&long).ends_with("...)"));
    }
}
