//! Owned row snapshots and named-parameter bindings.

use std::path::PathBuf;
use std::str::FromStr;

use rusqlite::types::Value;
use rusqlite::{Connection, ToSql};
use uuid::Uuid;

use super::columns::{RecordColumns, TableSchema};
use crate::errors::{ProjectError, ProjectResult};
use crate::utils::datetime::{RecordDateTime, RecordDateTimeExt};

/// Every column of one stored row, in column order.
#[derive(Debug, Clone, PartialEq)]
pub struct RowValues {
    table: &'static str,
    values: Vec<Value>,
}

impl RowValues {
    pub fn new(table: &'static str, values: Vec<Value>) -> Self {
        Self { table, values }
    }

    /// Snapshot a row produced by the schema's select statement.
    pub fn from_row(schema: &TableSchema, row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        let values = (0..schema.column_count())
            .map(|index| row.get::<_, Value>(index))
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(Self::new(schema.table(), values))
    }

    pub fn table(&self) -> &'static str {
        self.table
    }

    pub fn value_at(&self, index: usize) -> &Value {
        self.values.get(index).unwrap_or(&Value::Null)
    }

    pub fn value<C: RecordColumns>(&self, column: C) -> &Value {
        self.value_at(column.index())
    }

    pub fn is_present<C: RecordColumns>(&self, column: C) -> bool {
        !matches!(self.value(column), Value::Null)
    }

    fn invalid<C: RecordColumns>(&self, column: C, expected: &str) -> ProjectError {
        ProjectError::deserialization(
            self.table,
            format!(
                "column {} should hold {expected}, found {:?}",
                column.column_name(),
                self.value(column)
            ),
        )
    }

    fn required<C: RecordColumns, T>(&self, column: C, value: Option<T>) -> ProjectResult<T> {
        value.ok_or_else(|| {
            ProjectError::deserialization(
                self.table,
                format!("column {} is null", column.column_name()),
            )
        })
    }

    pub fn get_opt_i64<C: RecordColumns>(&self, column: C) -> ProjectResult<Option<i64>> {
        match self.value(column) {
            Value::Null => Ok(None),
            Value::Integer(value) => Ok(Some(*value)),
            _ => Err(self.invalid(column, "an integer")),
        }
    }

    pub fn get_i64<C: RecordColumns>(&self, column: C) -> ProjectResult<i64> {
        let value = self.get_opt_i64(column)?;
        self.required(column, value)
    }

    pub fn get_opt_i32<C: RecordColumns>(&self, column: C) -> ProjectResult<Option<i32>> {
        self.get_opt_i64(column)?
            .map(|value| i32::try_from(value).map_err(|_| self.invalid(column, "a 32 bit integer")))
            .transpose()
    }

    pub fn get_i32<C: RecordColumns>(&self, column: C) -> ProjectResult<i32> {
        let value = self.get_opt_i32(column)?;
        self.required(column, value)
    }

    pub fn get_u32<C: RecordColumns>(&self, column: C) -> ProjectResult<u32> {
        let value = self.get_i64(column)?;
        u32::try_from(value).map_err(|_| self.invalid(column, "an unsigned 32 bit integer"))
    }

    pub fn get_opt_f64<C: RecordColumns>(&self, column: C) -> ProjectResult<Option<f64>> {
        match self.value(column) {
            Value::Null => Ok(None),
            Value::Real(value) => Ok(Some(*value)),
            Value::Integer(value) => Ok(Some(*value as f64)),
            Value::Text(text) => text
                .parse::<f64>()
                .ok()
                .filter(|value| !value.is_finite())
                .map(Some)
                .ok_or_else(|| self.invalid(column, "a number")),
            _ => Err(self.invalid(column, "a number")),
        }
    }

    pub fn get_f64<C: RecordColumns>(&self, column: C) -> ProjectResult<f64> {
        let value = self.get_opt_f64(column)?;
        self.required(column, value)
    }

    /// Booleans are read from integers or from the text `true`/`false`.
    pub fn get_bool<C: RecordColumns>(&self, column: C) -> ProjectResult<bool> {
        match self.value(column) {
            Value::Integer(value) => Ok(*value != 0),
            Value::Text(text) if text == "true" => Ok(true),
            Value::Text(text) if text == "false" => Ok(false),
            _ => Err(self.invalid(column, "a boolean")),
        }
    }

    pub fn get_opt_text<C: RecordColumns>(&self, column: C) -> ProjectResult<Option<String>> {
        match self.value(column) {
            Value::Null => Ok(None),
            Value::Text(text) => Ok(Some(text.clone())),
            _ => Err(self.invalid(column, "text")),
        }
    }

    pub fn get_text<C: RecordColumns>(&self, column: C) -> ProjectResult<String> {
        let value = self.get_opt_text(column)?;
        self.required(column, value)
    }

    /// Text column parsed through `FromStr`, used for enumerations stored by name.
    pub fn get_parsed<C: RecordColumns, T: FromStr>(&self, column: C) -> ProjectResult<T> {
        let text = self.get_text(column)?;
        text.parse()
            .map_err(|_| self.invalid(column, std::any::type_name::<T>()))
    }

    pub fn get_uuid<C: RecordColumns>(&self, column: C) -> ProjectResult<Uuid> {
        let text = self.get_text(column)?;
        Uuid::parse_str(&text).map_err(|_| self.invalid(column, "a uuid"))
    }

    pub fn get_datetime<C: RecordColumns>(&self, column: C) -> ProjectResult<RecordDateTime> {
        let text = self.get_text(column)?;
        RecordDateTime::from_storage(&text).map_err(|_| self.invalid(column, "an RFC 3339 timestamp"))
    }

    pub fn get_opt_path<C: RecordColumns>(&self, column: C) -> ProjectResult<Option<PathBuf>> {
        Ok(self.get_opt_text(column)?.map(PathBuf::from))
    }

    pub fn get_path<C: RecordColumns>(&self, column: C) -> ProjectResult<PathBuf> {
        Ok(PathBuf::from(self.get_text(column)?))
    }
}

/// A double as stored. SQLite reads a NaN back as null, so non-finite values
/// are written as text (`NaN`, `inf`, `-inf`).
pub fn real_value(value: f64) -> Value {
    if value.is_finite() {
        Value::Real(value)
    } else {
        Value::Text(value.to_string())
    }
}

/// Values for the `UPDATE ... WHERE id=:id` statement of one table.
///
/// Starts out as the table's null placeholders, so any column a record does
/// not bind is written as null.
#[derive(Debug, Clone)]
pub struct Bindings<'s> {
    schema: &'s TableSchema,
    values: Vec<Value>,
    invalid_path: Option<PathBuf>,
}

impl<'s> Bindings<'s> {
    pub fn new(schema: &'s TableSchema) -> Self {
        Self {
            schema,
            values: schema.nulls().to_vec(),
            invalid_path: None,
        }
    }

    pub fn bind<C: RecordColumns>(&mut self, column: C, value: impl Into<Value>) {
        if let Some(slot) = self.values.get_mut(column.index()) {
            *slot = value.into();
        }
    }

    pub fn bind_uuid<C: RecordColumns>(&mut self, column: C, value: Uuid) {
        self.bind(column, value.to_string());
    }

    pub fn bind_datetime<C: RecordColumns>(&mut self, column: C, value: &RecordDateTime) {
        self.bind(column, value.to_storage());
    }

    pub fn bind_f64<C: RecordColumns>(&mut self, column: C, value: Option<f64>) {
        self.bind(column, value.map(real_value));
    }

    /// Paths are stored as text. A path that is not valid UTF-8 fails the
    /// update instead of being rewritten.
    pub fn bind_path<C: RecordColumns>(&mut self, column: C, value: Option<&std::path::Path>) {
        let text = match value {
            Some(path) => match path.to_str() {
                Some(text) => Some(text.to_string()),
                None => {
                    self.invalid_path.get_or_insert_with(|| path.to_path_buf());
                    None
                }
            },
            None => None,
        };
        self.bind(column, text);
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Run the table's update statement with these values.
    pub fn execute_update(&self, connection: &Connection) -> ProjectResult<usize> {
        if let Some(path) = &self.invalid_path {
            return Err(ProjectError::NonUtf8Path(path.clone()));
        }
        let names = self
            .schema
            .column_names()
            .map(|name| format!(":{name}"))
            .collect::<Vec<_>>();
        let params = names
            .iter()
            .zip(&self.values)
            .map(|(name, value)| (name.as_str(), value as &dyn ToSql))
            .collect::<Vec<_>>();
        let mut statement = connection.prepare_cached(self.schema.update_by_id_sql())?;
        Ok(statement.execute(params.as_slice())?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::columns::object_record_columns;
    use crate::record::columns::ObjectRecordColumns;

    object_record_columns! {
        enum FlagColumns in "FlagRecords" {
            Flag => "flag": Dynamic,
            Count => "count": Integer,
        }
    }

    fn row(flag: Value, count: Value) -> RowValues {
        let mut values = vec![Value::Null; 8];
        values.push(flag);
        values.push(count);
        RowValues::new("FlagRecords", values)
    }

    #[test]
    fn test_bool_from_text_and_integer() {
        assert!(row(Value::Text("true".into()), Value::Null).get_bool(FlagColumns::Flag).unwrap());
        assert!(!row(Value::Integer(0), Value::Null).get_bool(FlagColumns::Flag).unwrap());
        assert!(row(Value::Text("yes".into()), Value::Null).get_bool(FlagColumns::Flag).is_err());
    }

    #[test]
    fn test_null_is_absent_not_zero() {
        let values = row(Value::Null, Value::Null);
        assert!(!values.is_present(FlagColumns::Count));
        assert_eq!(values.get_opt_i64(FlagColumns::Count).unwrap(), None);
        assert!(values.get_i64(FlagColumns::Count).is_err());
    }

    #[test]
    fn test_non_finite_doubles_are_stored_as_text() {
        assert_eq!(real_value(1.5), Value::Real(1.5));
        assert_eq!(real_value(f64::INFINITY), Value::Text("inf".into()));

        for value in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let stored = row(Value::Null, real_value(value));
            let read = stored.get_f64(FlagColumns::Count).unwrap();
            assert!(read.is_nan() == value.is_nan() && (value.is_nan() || read == value));
        }
        assert!(row(Value::Null, Value::Text("1.5".into())).get_f64(FlagColumns::Count).is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_non_utf8_path_fails_the_update() {
        use std::os::unix::ffi::OsStrExt;

        let path = std::path::Path::new(std::ffi::OsStr::from_bytes(b"/proj/\xffrun"));
        let connection = Connection::open_in_memory().unwrap();
        let mut bindings = Bindings::new(FlagColumns::schema());
        bindings.bind_path(FlagColumns::Flag, Some(path));

        assert_eq!(bindings.values()[FlagColumns::Flag.index()], Value::Null);
        assert!(matches!(
            bindings.execute_update(&connection),
            Err(ProjectError::NonUtf8Path(stored)) if stored == path
        ));
    }

    #[test]
    fn test_bindings_start_null() {
        let mut bindings = Bindings::new(FlagColumns::schema());
        bindings.bind(FlagColumns::Count, 3i64);
        assert_eq!(bindings.values()[FlagColumns::Count.index()], Value::Integer(3));
        assert_eq!(bindings.values()[FlagColumns::Flag.index()], Value::Null);
    }
}
