use serde::Deserialize;
use serde_json::Value;

use crate::bail;
use crate::error::{ErrorKind, ListenerResult};

/// Operation performed by a [`ChangeRecord`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
    Other(String),
}

impl From<String> for ChangeKind {
    fn from(kind: String) -> Self {
        match kind.as_str() {
            "insert" => ChangeKind::Insert,
            "update" => ChangeKind::Update,
            "delete" => ChangeKind::Delete,
            _ => ChangeKind::Other(kind),
        }
    }
}

/// A named column of a [`ChangeRecord`].
///
/// The value is kept as sent by wal2json. Only the columns projected into an event are narrowed
/// to a [`crate::conversions::ColumnValue`], so booleans or arrays elsewhere in a row are fine.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    /// Postgres type name, present when the output plugin includes types.
    pub type_name: Option<String>,
    pub value: Value,
}

/// One row mutation.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeRecord {
    pub kind: ChangeKind,
    pub schema: String,
    pub table: String,
    /// Columns in the order the server sent them.
    pub columns: Vec<Column>,
    /// Replica identity of the previous row version, sent for updates and deletes.
    pub old_keys: Vec<Column>,
}

impl ChangeRecord {
    pub fn is_insert(&self) -> bool {
        self.kind == ChangeKind::Insert
    }
}

/// Decoded content of one complete payload.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ChangeSet {
    pub records: Vec<ChangeRecord>,
}

impl ChangeSet {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Converts a parsed wal2json document into a [`ChangeSet`].
    ///
    /// Fails with [`ErrorKind::InvalidData`] when the document does not have the wal2json shape
    /// or when a record has a different number of column names and values.
    pub fn from_json(document: Value) -> ListenerResult<ChangeSet> {
        let raw: RawChangeSet = serde_json::from_value(document)?;

        let records = raw
            .change
            .into_iter()
            .map(RawChange::into_record)
            .collect::<ListenerResult<Vec<_>>>()?;

        Ok(ChangeSet { records })
    }
}

#[derive(Debug, Deserialize)]
struct RawChangeSet {
    #[serde(default)]
    change: Vec<RawChange>,
}

#[derive(Debug, Deserialize)]
struct RawChange {
    #[serde(default)]
    kind: String,
    #[serde(default)]
    schema: String,
    #[serde(default)]
    table: String,
    #[serde(default, rename = "columnnames")]
    column_names: Vec<String>,
    #[serde(default, rename = "columntypes")]
    column_types: Vec<String>,
    #[serde(default, rename = "columnvalues")]
    column_values: Vec<Value>,
    #[serde(default, rename = "oldkeys")]
    old_keys: Option<RawOldKeys>,
}

#[derive(Debug, Deserialize)]
struct RawOldKeys {
    #[serde(default, rename = "keynames")]
    key_names: Vec<String>,
    #[serde(default, rename = "keytypes")]
    key_types: Vec<String>,
    #[serde(default, rename = "keyvalues")]
    key_values: Vec<Value>,
}

impl RawChange {
    fn into_record(self) -> ListenerResult<ChangeRecord> {
        let columns = zip_columns(self.column_names, self.column_types, self.column_values)?;
        let old_keys = match self.old_keys {
            Some(keys) => zip_columns(keys.key_names, keys.key_types, keys.key_values)?,
            None => Vec::new(),
        };

        Ok(ChangeRecord {
            kind: ChangeKind::from(self.kind),
            schema: self.schema,
            table: self.table,
            columns,
            old_keys,
        })
    }
}

fn zip_columns(
    names: Vec<String>,
    types: Vec<String>,
    values: Vec<Value>,
) -> ListenerResult<Vec<Column>> {
    if names.len() != values.len() {
        bail!(
            ErrorKind::InvalidData,
            "Column names and values have different lengths",
            format!("{} names, {} values", names.len(), values.len())
        );
    }

    let mut types = types.into_iter();
    let columns = names
        .into_iter()
        .zip(values)
        .map(|(name, value)| Column {
            name,
            type_name: types.next(),
            value,
        })
        .collect::<Vec<_>>();

    Ok(columns)
}
