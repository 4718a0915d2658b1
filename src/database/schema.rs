//! Table creation and schema versioning.

use log::{debug, info};
use rusqlite::{OptionalExtension, named_params};

use super::ProjectDatabase;
use crate::errors::{ProjectError, ProjectResult};
use crate::record::columns::{ObjectRecordColumns, TableSchema};
use crate::record::join::JoinRecord;
use crate::records::{
    AlgorithmRecordColumns, AnalysisRecordColumns, AttributeRecordColumns,
    DataPointMeasureJoinRecord, DataPointRecordColumns, FileReferenceRecordColumns,
    MeasureRecordColumns, ProblemRecordColumns, VariableRecordColumns,
};

/// Version of the table layout this build writes.
pub const SCHEMA_VERSION: u32 = 1;

const META_TABLE: &str = "ProjectDatabaseMeta";
const VERSION_KEY: &str = "schemaVersion";

/// Every object record table with the columns that reference other rows.
fn object_tables() -> [(&'static TableSchema, &'static [&'static str]); 8] {
    [
        (ProblemRecordColumns::schema(), &[]),
        (VariableRecordColumns::schema(), &["problemRecordId"]),
        (MeasureRecordColumns::schema(), &["variableRecordId"]),
        (AnalysisRecordColumns::schema(), &["problemRecordId"]),
        (AlgorithmRecordColumns::schema(), &["analysisRecordId"]),
        (
            DataPointRecordColumns::schema(),
            &["analysisRecordId", "problemRecordId"],
        ),
        (FileReferenceRecordColumns::schema(), &["parentRecordId"]),
        (
            AttributeRecordColumns::schema(),
            &[
                "fileReferenceRecordId",
                "parentAttributeRecordId",
                "algorithmRecordId",
                "variableRecordId",
                "dataPointRecordId",
            ],
        ),
    ]
}

/// Tables holding rows owned by a row of `table`, each with the condition
/// that selects the rows owned by `:id`.
pub(crate) fn owned_rows(table: &str) -> Vec<(&'static TableSchema, String)> {
    let attributes = AttributeRecordColumns::schema();
    let files = FileReferenceRecordColumns::schema();
    let by = |column: &str| format!("{column}=:id");
    let files_of = |owner: &str| format!("parentDatabaseTableName='{owner}' AND parentRecordId=:id");

    match table {
        "ProblemRecords" => vec![(VariableRecordColumns::schema(), by("problemRecordId"))],
        "VariableRecords" => vec![
            (MeasureRecordColumns::schema(), by("variableRecordId")),
            (attributes, by("variableRecordId")),
        ],
        "AnalysisRecords" => vec![
            (AlgorithmRecordColumns::schema(), by("analysisRecordId")),
            (files, files_of(table)),
            (DataPointRecordColumns::schema(), by("analysisRecordId")),
        ],
        "AlgorithmRecords" => vec![(attributes, by("algorithmRecordId"))],
        "DataPointRecords" => vec![
            (attributes, by("dataPointRecordId")),
            (files, files_of(table)),
        ],
        "FileReferenceRecords" => vec![(attributes, by("fileReferenceRecordId"))],
        "AttributeRecords" => vec![(attributes, by("parentAttributeRecordId"))],
        _ => Vec::new(),
    }
}

/// Join tables with a column referencing rows of `table`.
pub(crate) fn linking_columns(table: &str) -> Vec<(&'static TableSchema, &'static str)> {
    let join = DataPointMeasureJoinRecord::join_schema();
    match table {
        "DataPointRecords" => vec![(join, "leftId")],
        "MeasureRecords" => vec![(join, "rightId")],
        _ => Vec::new(),
    }
}

fn stored_version(db: &ProjectDatabase) -> ProjectResult<Option<u32>> {
    let sql = format!("SELECT value FROM {META_TABLE} WHERE key=:key");
    let value: Option<String> = db
        .connection()
        .query_row(&sql, named_params! { ":key": VERSION_KEY }, |row| row.get(0))
        .optional()?;
    value
        .map(|value| {
            value.parse::<u32>().map_err(|e| {
                ProjectError::deserialization(META_TABLE, format!("bad schema version '{value}': {e}"))
            })
        })
        .transpose()
}

fn write_version(db: &ProjectDatabase) -> ProjectResult<()> {
    let sql = format!("INSERT OR REPLACE INTO {META_TABLE} (key, value) VALUES (:key, :value)");
    db.connection().execute(
        &sql,
        named_params! { ":key": VERSION_KEY, ":value": SCHEMA_VERSION.to_string() },
    )?;
    Ok(())
}

/// The schema version stored in the open database.
pub fn schema_version(db: &ProjectDatabase) -> ProjectResult<Option<u32>> {
    stored_version(db)
}

/// Create any missing tables and indices and stamp the schema version.
///
/// Fails with [`ProjectError::SchemaVersionMismatch`] when the database was
/// written by a newer layout.
pub fn initialize(db: &ProjectDatabase) -> ProjectResult<()> {
    let connection = db.connection();
    connection.execute_batch(&format!(
        "CREATE TABLE IF NOT EXISTS {META_TABLE} (key TEXT PRIMARY KEY, value TEXT)"
    ))?;

    match stored_version(db)? {
        Some(found) if found > SCHEMA_VERSION => {
            return Err(ProjectError::SchemaVersionMismatch {
                expected: SCHEMA_VERSION,
                found,
            });
        }
        Some(found) => debug!(target: db.log_target(), "Schema version {found}"),
        None => info!(
            target: db.log_target(),
            "Initializing schema version {SCHEMA_VERSION}"
        ),
    }

    for (schema, references) in object_tables() {
        connection.execute_batch(&schema.create_table_sql())?;
        connection.execute_batch(&schema.create_index_sql("handle"))?;
        for column in references {
            connection.execute_batch(&schema.create_index_sql(column))?;
        }
    }

    let join = DataPointMeasureJoinRecord::join_schema();
    connection.execute_batch(&join.create_table_sql())?;
    for column in ["handle", "leftId", "rightId"] {
        connection.execute_batch(&join.create_index_sql(column))?;
    }
    connection.execute_batch(&format!(
        "CREATE UNIQUE INDEX IF NOT EXISTS {table}_pair_index ON {table} (leftId, rightId)",
        table = join.table()
    ))?;

    write_version(db)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_table_is_created() -> ProjectResult<()> {
        let db = ProjectDatabase::open_in_memory()?;
        for (schema, _) in object_tables() {
            assert_eq!(db.count_rows(schema)?, 0);
        }
        assert_eq!(db.count_rows(DataPointMeasureJoinRecord::join_schema())?, 0);
        assert_eq!(schema_version(&db)?, Some(SCHEMA_VERSION));
        Ok(())
    }

    #[test]
    fn test_ownership_conditions_name_real_columns() -> ProjectResult<()> {
        let db = ProjectDatabase::open_in_memory()?;
        for (owner, _) in object_tables() {
            for (schema, clause) in owned_rows(owner.table()) {
                db.connection()
                    .prepare(&format!("SELECT id FROM {} WHERE {clause}", schema.table()))?;
            }
            for (join, column) in linking_columns(owner.table()) {
                assert!(join.column_index(column).is_some());
            }
        }
        assert_eq!(owned_rows("ProblemRecords").len(), 1);
        assert!(owned_rows("MeasureRecords").is_empty());
        Ok(())
    }

    #[test]
    fn test_initialize_twice_is_harmless() -> ProjectResult<()> {
        let db = ProjectDatabase::open_in_memory()?;
        db.transaction(initialize)?;
        assert_eq!(schema_version(&db)?, Some(SCHEMA_VERSION));
        Ok(())
    }
}
