//! entry/field.rs
//! Name/value pairs stored in accounts.
//!
//! Record layout:
//! - version byte (0x00, or 0x01 when extended data follows)
//! - name, value: length-prefixed strings
//! - type byte (0 normal, 1 password)
//! - v1 only: u16 BE length + extended data

use num_enum::TryFromPrimitive;

use crate::constants::record;
use crate::entry::types::EntryId;
use crate::headers::FormatError;
use crate::utils::{put_length_prefixed, put_u16_prefixed, put_u8, ByteReader};

#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, TryFromPrimitive)]
pub enum FieldType {
    Normal   = 0x00,
    Password = 0x01,
}

impl Default for FieldType {
    fn default() -> Self {
        FieldType::Normal
    }
}

impl FieldType {
    pub fn verify(raw: u8) -> Result<Self, FormatError> {
        FieldType::try_from_primitive(raw).map_err(|_| FormatError::UnsupportedFieldType { raw })
    }
}

#[derive(Debug, Clone, Default)]
pub struct Field {
    name: String,
    value: String,
    field_type: FieldType,
    /// Owning account; maintained by the tree, never persisted.
    tied_account: Option<EntryId>,
    extended_data: Vec<u8>,
}

/// Equality covers persisted content only.
impl PartialEq for Field {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.value == other.value
            && self.field_type == other.field_type
            && self.extended_data == other.extended_data
    }
}

impl Eq for Field {}

impl Field {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self { name: name.into(), value: value.into(), ..Default::default() }
    }

    pub fn with_type(name: impl Into<String>, value: impl Into<String>, field_type: FieldType) -> Self {
        Self { field_type, ..Self::new(name, value) }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn set_value(&mut self, value: impl Into<String>) {
        self.value = value.into();
    }

    pub fn field_type(&self) -> FieldType {
        self.field_type
    }

    pub fn set_field_type(&mut self, field_type: FieldType) {
        self.field_type = field_type;
    }

    pub fn tied_account(&self) -> Option<EntryId> {
        self.tied_account
    }

    pub(crate) fn set_tied_account(&mut self, account: Option<EntryId>) {
        self.tied_account = account;
    }

    pub fn extended_data(&self) -> &[u8] {
        &self.extended_data
    }

    pub fn set_extended_data(&mut self, data: impl Into<Vec<u8>>) {
        self.extended_data = data.into();
    }

    /// Both name and value are empty.
    pub fn is_empty(&self) -> bool {
        self.name.is_empty() && self.value.is_empty()
    }

    pub fn parse(r: &mut ByteReader<'_>, tied_account: Option<EntryId>) -> Result<Self, FormatError> {
        let version = r.read_u8("field version")?;
        if version != record::FIELD_V0 && version != record::FIELD_V1 {
            return Err(FormatError::UnsupportedFieldVersion { version });
        }
        let name = r.read_string("field name")?;
        let value = r.read_string("field value")?;
        let field_type = FieldType::verify(r.read_u8("field type")?)?;
        let extended_data = if version == record::FIELD_V1 {
            let len = r.read_u16_be("field extended data size")? as usize;
            r.read_bytes(len, "field extended data")?.to_vec()
        } else {
            Vec::new()
        };
        Ok(Self { name, value, field_type, tied_account, extended_data })
    }

    pub fn make(&self, out: &mut Vec<u8>) -> Result<(), FormatError> {
        let has_ext = !self.extended_data.is_empty();
        put_u8(out, if has_ext { record::FIELD_V1 } else { record::FIELD_V0 });
        put_length_prefixed(out, self.name.as_bytes(), "field name")?;
        put_length_prefixed(out, self.value.as_bytes(), "field value")?;
        put_u8(out, self.field_type as u8);
        if has_ext {
            put_u16_prefixed(out, &self.extended_data, u16::MAX as usize, "field extended data")?;
        }
        Ok(())
    }
}
