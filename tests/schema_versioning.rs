// Opening databases: schema creation, versioning and configuration.

mod common;

use std::time::Duration;

use assert_matches::assert_matches;
use common::{create_test_db, db_path, open_second_session, sample_analysis};
use project_store::database::schema::{SCHEMA_VERSION, schema_version};
use project_store::prelude::*;
use project_store::record::ObjectRecordColumns;

#[test_log::test]
fn test_reopen_keeps_records() -> ProjectResult<()> {
    let (db, dir) = create_test_db("reopen")?;
    let analysis = sample_analysis();
    let id = AnalysisRecord::new(&analysis, &db)?.id();
    drop(db);

    let db = ProjectDatabase::open_path(db_path(&dir, "reopen"))?;
    assert_eq!(schema_version(&db)?, Some(SCHEMA_VERSION));
    let record = AnalysisRecord::get_analysis_record(id, &db)?.expect("analysis row");
    assert_eq!(record.analysis(&db)?, analysis);
    Ok(())
}

#[test_log::test]
fn test_newer_schema_is_refused() -> ProjectResult<()> {
    let (db, dir) = create_test_db("newer_schema")?;
    db.connection()
        .execute_batch("UPDATE ProjectDatabaseMeta SET value='99' WHERE key='schemaVersion'")?;
    drop(db);

    let result = ProjectDatabase::open_path(db_path(&dir, "newer_schema"));
    assert_matches!(
        result,
        Err(ProjectError::SchemaVersionMismatch { expected: SCHEMA_VERSION, found: 99 })
    );
    Ok(())
}

#[test_log::test]
fn test_missing_file_without_create() -> ProjectResult<()> {
    let dir = tempfile::tempdir()?;
    let config = ProjectConfig::builder()
        .path(db_path(&dir, "absent"))
        .create_if_missing(false)
        .build();

    assert_matches!(ProjectDatabase::open(config), Err(ProjectError::Sqlite(_)));
    assert!(!db_path(&dir, "absent").exists());
    Ok(())
}

#[test_log::test]
fn test_find_id_by_handle() -> ProjectResult<()> {
    let db = ProjectDatabase::open_in_memory()?;
    let analysis = sample_analysis();
    let record = AnalysisRecord::new(&analysis, &db)?;

    let found = db.find_id_by_handle(AnalysisRecordColumns::schema(), analysis.identity.uuid)?;
    assert_eq!(found, Some(record.id()));
    assert_eq!(
        db.find_id_by_handle(AnalysisRecordColumns::schema(), uuid::Uuid::new_v4())?,
        None
    );
    Ok(())
}

#[test_log::test]
fn test_nested_transactions_commit_once() -> ProjectResult<()> {
    let db = ProjectDatabase::open_in_memory()?;
    let analysis = sample_analysis();

    let result: ProjectResult<()> = db.transaction(|db| {
        assert!(db.in_transaction());
        AnalysisRecord::new(&analysis, db)?;
        Err(ProjectError::Other("abort".into()))
    });
    assert!(result.is_err());
    assert!(!db.in_transaction());
    assert_eq!(db.count_rows(AnalysisRecordColumns::schema())?, 0);
    assert_eq!(db.count_rows(ProblemRecordColumns::schema())?, 0);

    db.transaction(|db| AnalysisRecord::new(&analysis, db).map(|_| ()))?;
    assert_eq!(db.count_rows(AnalysisRecordColumns::schema())?, 1);
    Ok(())
}

#[test_log::test]
fn test_failed_commit_is_rolled_back() -> ProjectResult<()> {
    let (db, dir) = create_test_db("failed_commit")?;
    let reader = open_second_session(&dir, "failed_commit", ConcurrencyPolicy::Overwrite)?;
    db.connection().busy_timeout(Duration::ZERO)?;

    // A read transaction in another session keeps the writer from committing
    reader.connection().execute_batch("BEGIN")?;
    reader.count_rows(ProblemRecordColumns::schema())?;

    let analysis = sample_analysis();
    let result = db.transaction(|db| AnalysisRecord::new(&analysis, db).map(|_| ()));
    assert_matches!(result, Err(ProjectError::Sqlite(_)));
    assert!(db.connection().is_autocommit());
    assert!(!db.in_transaction());

    reader.connection().execute_batch("COMMIT")?;
    assert_eq!(db.count_rows(AnalysisRecordColumns::schema())?, 0);
    db.transaction(|db| AnalysisRecord::new(&analysis, db).map(|_| ()))?;
    assert_eq!(db.count_rows(AnalysisRecordColumns::schema())?, 1);
    Ok(())
}
