//! Column enumerations and the SQL derived from them.
//!
//! Every record table is described by a field-less enum whose variants are the
//! table's columns in storage order. The enum drives table creation, row
//! selection and the single `UPDATE ... WHERE id=:id` statement each table is
//! saved through.

use rusqlite::types::Value;
use strum::IntoEnumIterator;

/// Storage class of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Integer,
    Real,
    Text,
    /// No declared type. Values are stored exactly as bound.
    Dynamic,
}

impl ColumnKind {
    pub fn sql_type(self) -> &'static str {
        match self {
            ColumnKind::Integer => "INTEGER",
            ColumnKind::Real => "REAL",
            ColumnKind::Text => "TEXT",
            ColumnKind::Dynamic => "",
        }
    }

    /// Placeholder bound for a column the record leaves unset.
    pub fn null(self) -> Value {
        Value::Null
    }
}

/// A column of some record table.
pub trait RecordColumns: Copy + IntoEnumIterator + std::fmt::Debug + 'static {
    /// Zero based position of the column in the table.
    fn index(self) -> usize;
    fn column_name(self) -> &'static str;
    fn kind(self) -> ColumnKind;
}

/// Columns of a table holding object records.
///
/// The first eight columns of every such table are shared and hold the
/// identity, naming and version data carried by all object records.
pub trait ObjectRecordColumns: RecordColumns {
    const ID: Self;
    const HANDLE: Self;
    const NAME: Self;
    const DISPLAY_NAME: Self;
    const DESCRIPTION: Self;
    const TIMESTAMP_CREATE: Self;
    const TIMESTAMP_LAST: Self;
    const UUID_LAST: Self;

    /// Schema of the table, built once per process.
    fn schema() -> &'static TableSchema;
}

/// Name of the column holding the version marker.
pub const VERSION_MARKER_COLUMN: &str = "uuidLast";

/// Everything generated from a column enumeration for one table.
#[derive(Debug, Clone)]
pub struct TableSchema {
    table: &'static str,
    columns: Vec<(&'static str, ColumnKind)>,
    update_by_id: String,
    select: String,
    nulls: Vec<Value>,
}

impl TableSchema {
    /// Walk the columns of `C` and generate the statements for `table`.
    ///
    /// # Panics
    ///
    /// Panics when the column indices are not exactly `0..N` in declaration
    /// order, or when the first column is not `id`.
    pub fn build<C: RecordColumns>(table: &'static str) -> Self {
        let mut columns = Vec::new();
        for (expected, column) in C::iter().enumerate() {
            // require 0 based columns, don't skip any
            assert_eq!(
                column.index(),
                expected,
                "{table}: column {column:?} is declared at position {expected}"
            );
            columns.push((column.column_name(), column.kind()));
        }
        assert_eq!(
            columns.first().map(|(name, _)| *name),
            Some("id"),
            "{table}: the first column must be the id"
        );

        let assignments = columns
            .iter()
            .map(|(name, _)| format!("{name}=:{name}"))
            .collect::<Vec<_>>()
            .join(", ");
        let names = columns
            .iter()
            .map(|(name, _)| *name)
            .collect::<Vec<_>>()
            .join(", ");
        let nulls = columns.iter().map(|(_, kind)| kind.null()).collect();

        Self {
            table,
            update_by_id: format!("UPDATE {table} SET {assignments} WHERE id=:id"),
            select: format!("SELECT {names} FROM {table}"),
            columns,
            nulls,
        }
    }

    pub fn table(&self) -> &'static str {
        self.table
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn column_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.columns.iter().map(|(name, _)| *name)
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|(column, _)| *column == name)
    }

    /// `UPDATE <table> SET c0=:c0, c1=:c1, ... WHERE id=:id`
    pub fn update_by_id_sql(&self) -> &str {
        &self.update_by_id
    }

    /// `SELECT c0, c1, ... FROM <table>`
    pub fn select_sql(&self) -> &str {
        &self.select
    }

    /// One null placeholder per column, in column order.
    pub fn nulls(&self) -> &[Value] {
        &self.nulls
    }

    pub fn create_table_sql(&self) -> String {
        let definitions = self
            .columns
            .iter()
            .map(|(name, kind)| match (*name, kind) {
                ("id", _) => String::from("id INTEGER PRIMARY KEY"),
                (name, ColumnKind::Dynamic) => name.to_string(),
                (name, kind) => format!("{name} {}", kind.sql_type()),
            })
            .collect::<Vec<_>>()
            .join(", ");
        format!("CREATE TABLE IF NOT EXISTS {} ({definitions})", self.table)
    }

    pub fn create_index_sql(&self, column: &str) -> String {
        format!(
            "CREATE INDEX IF NOT EXISTS {table}_{column}_index ON {table} ({column})",
            table = self.table
        )
    }
}

/// Declare the column enumeration of an object record table.
///
/// The eight shared object columns are prepended, so the listed variants
/// start at index 8.
macro_rules! object_record_columns {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident in $table:literal {
            $($variant:ident => $column:literal : $kind:ident),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::EnumIter)]
        $vis enum $name {
            Id,
            Handle,
            Name,
            DisplayName,
            Description,
            TimestampCreate,
            TimestampLast,
            UuidLast,
            $($variant,)*
        }

        impl $crate::record::columns::RecordColumns for $name {
            fn index(self) -> usize {
                self as usize
            }

            fn column_name(self) -> &'static str {
                match self {
                    Self::Id => "id",
                    Self::Handle => "handle",
                    Self::Name => "name",
                    Self::DisplayName => "displayName",
                    Self::Description => "description",
                    Self::TimestampCreate => "timestampCreate",
                    Self::TimestampLast => "timestampLast",
                    Self::UuidLast => $crate::record::columns::VERSION_MARKER_COLUMN,
                    $(Self::$variant => $column,)*
                }
            }

            fn kind(self) -> $crate::record::columns::ColumnKind {
                use $crate::record::columns::ColumnKind;
                match self {
                    Self::Id => ColumnKind::Integer,
                    Self::Handle
                    | Self::Name
                    | Self::DisplayName
                    | Self::Description
                    | Self::TimestampCreate
                    | Self::TimestampLast
                    | Self::UuidLast => ColumnKind::Text,
                    $(Self::$variant => ColumnKind::$kind,)*
                }
            }
        }

        impl $crate::record::columns::ObjectRecordColumns for $name {
            const ID: Self = Self::Id;
            const HANDLE: Self = Self::Handle;
            const NAME: Self = Self::Name;
            const DISPLAY_NAME: Self = Self::DisplayName;
            const DESCRIPTION: Self = Self::Description;
            const TIMESTAMP_CREATE: Self = Self::TimestampCreate;
            const TIMESTAMP_LAST: Self = Self::TimestampLast;
            const UUID_LAST: Self = Self::UuidLast;

            fn schema() -> &'static $crate::record::columns::TableSchema {
                static SCHEMA: std::sync::OnceLock<$crate::record::columns::TableSchema> =
                    std::sync::OnceLock::new();
                SCHEMA.get_or_init(|| $crate::record::columns::TableSchema::build::<Self>($table))
            }
        }
    };
}

pub(crate) use object_record_columns;

#[cfg(test)]
mod tests {
    use super::*;

    object_record_columns! {
        enum SampleColumns in "SampleRecords" {
            Weight => "weight": Real,
            Payload => "payload": Dynamic,
        }
    }

    #[derive(Debug, Clone, Copy, strum::EnumIter)]
    enum GappedColumns {
        Id,
        Skipped,
    }

    impl RecordColumns for GappedColumns {
        fn index(self) -> usize {
            match self {
                GappedColumns::Id => 0,
                GappedColumns::Skipped => 2,
            }
        }

        fn column_name(self) -> &'static str {
            match self {
                GappedColumns::Id => "id",
                GappedColumns::Skipped => "skipped",
            }
        }

        fn kind(self) -> ColumnKind {
            ColumnKind::Integer
        }
    }

    #[test]
    fn test_update_by_id_lists_every_column() {
        let schema = SampleColumns::schema();
        assert_eq!(
            schema.update_by_id_sql(),
            "UPDATE SampleRecords SET id=:id, handle=:handle, name=:name, \
             displayName=:displayName, description=:description, \
             timestampCreate=:timestampCreate, timestampLast=:timestampLast, \
             uuidLast=:uuidLast, weight=:weight, payload=:payload WHERE id=:id"
        );
        assert_eq!(schema.nulls().len(), 10);
        assert!(schema.nulls().iter().all(|value| *value == Value::Null));
    }

    #[test]
    fn test_schema_is_cached() {
        assert!(std::ptr::eq(SampleColumns::schema(), SampleColumns::schema()));
    }

    #[test]
    fn test_create_table_sql() {
        let sql = SampleColumns::schema().create_table_sql();
        assert!(sql.starts_with("CREATE TABLE IF NOT EXISTS SampleRecords (id INTEGER PRIMARY KEY, handle TEXT"));
        assert!(sql.ends_with("weight REAL, payload)"));
    }

    #[test]
    fn test_column_lookup() {
        let schema = SampleColumns::schema();
        assert_eq!(schema.column_index("uuidLast"), Some(7));
        assert_eq!(schema.column_index("payload"), Some(SampleColumns::Payload.index()));
        assert_eq!(schema.column_index("missing"), None);
    }

    #[test]
    #[should_panic(expected = "is declared at position 1")]
    fn test_gap_in_columns_panics() {
        TableSchema::build::<GappedColumns>("GappedRecords");
    }
}
