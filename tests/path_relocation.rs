// Moving a project directory and clearing data point results.

mod common;

use std::path::{Path, PathBuf};

use common::{create_test_db, sample_analysis};
use project_store::prelude::*;
use project_store::record::ObjectRecordColumns;

#[test_log::test]
fn test_update_path_data_is_idempotent() -> ProjectResult<()> {
    let (db, _dir) = create_test_db("relocate")?;
    let analysis = AnalysisRecord::new(&sample_analysis(), &db)?;
    let run2 = analysis.data_point_records(&db)?.remove(1);
    // Shares a textual prefix with the base but is not under it
    let notes = FileReferenceRecord::new(
        &FileReference::new("/proj/ab/notes.csv", FileReferenceType::CSV),
        &run2,
        &db,
    )?;

    let (from, to) = (Path::new("/proj/a"), Path::new("/proj/b"));

    // seed + output file, two directories, two measure scripts
    assert_eq!(db.update_path_data(from, to)?, 6);
    assert_eq!(db.update_path_data(from, to)?, 0);

    let run1 = analysis.data_point_records(&db)?.remove(0);
    assert_eq!(run1.directory(), Some(Path::new("/proj/b/run1")));
    let output = run1.output_file_reference_records(&db)?.remove(0);
    assert_eq!(output.path(), Path::new("/proj/b/run1/out.csv"));
    assert_eq!(analysis.seed_record(&db)?.path(), Path::new("/proj/b/seed.osm"));

    let scripts: Vec<Option<PathBuf>> = MeasureRecord::get_measure_records(&db)?
        .iter()
        .map(|measure| measure.script_path().map(Path::to_path_buf))
        .collect();
    assert_eq!(
        scripts,
        vec![
            None,
            Some(PathBuf::from("/proj/b/measures/r20.rb")),
            Some(PathBuf::from("/proj/b/measures/r30.rb")),
        ]
    );

    let notes = FileReferenceRecord::get_file_reference_record(notes.id(), &db)?.expect("file row");
    assert_eq!(notes.path(), Path::new("/proj/ab/notes.csv"));
    Ok(())
}

#[test_log::test]
fn test_relocation_bumps_version_marker() -> ProjectResult<()> {
    let (db, _dir) = create_test_db("relocate_marker")?;
    let analysis = AnalysisRecord::new(&sample_analysis(), &db)?;
    let before = analysis.seed_record(&db)?;

    db.update_path_data(Path::new("/proj/a"), Path::new("/proj/c"))?;

    let after = analysis.seed_record(&db)?;
    assert_ne!(after.uuid_last(), before.uuid_last());
    assert!(after.timestamp_last() >= before.timestamp_last());
    assert_eq!(after.handle(), before.handle());
    Ok(())
}

#[test_log::test]
fn test_clear_results() -> ProjectResult<()> {
    let (db, _dir) = create_test_db("clear_results")?;
    let analysis = AnalysisRecord::new(&sample_analysis(), &db)?;
    let mut run1 = analysis.data_point_records(&db)?.remove(0);
    assert!(run1.is_complete());

    run1.clear_results(&db)?;
    assert!(run1.is_dirty());
    run1.save(&db)?;

    let reloaded = DataPointRecord::get_data_point_record(run1.id(), &db)?.expect("data point row");
    assert!(!reloaded.is_complete());
    assert_eq!(reloaded.directory(), None);
    assert!(reloaded.output_attribute_records(&db)?.is_empty());
    assert!(reloaded.output_file_reference_records(&db)?.is_empty());
    // Selections are inputs, not results
    assert_eq!(reloaded.selected_measure_records(&db)?.len(), 1);
    Ok(())
}

#[test_log::test]
fn test_data_point_queries() -> ProjectResult<()> {
    let (db, _dir) = create_test_db("data_point_queries")?;
    let mut analysis = AnalysisRecord::new(&sample_analysis(), &db)?;

    assert_eq!(analysis.complete_data_point_records(&db)?.len(), 1);
    assert_eq!(analysis.successful_data_point_records(&db)?.len(), 1);
    assert_eq!(analysis.failed_data_point_records(&db)?.len(), 0);
    assert_eq!(analysis.incomplete_data_point_records(&db)?.len(), 1);

    let mut run2 = analysis.incomplete_data_point_records(&db)?.remove(0);
    run2.mark_failed();
    run2.save(&db)?;

    assert_eq!(analysis.complete_data_point_records(&db)?.len(), 2);
    assert_eq!(analysis.failed_data_point_records(&db)?.len(), 1);
    assert!(analysis.incomplete_data_point_records(&db)?.is_empty());

    analysis.set_results_are_invalid(true);
    analysis.save(&db)?;
    analysis.clear_results(&db)?;
    analysis.save(&db)?;

    assert_eq!(analysis.incomplete_data_point_records(&db)?.len(), 2);
    let algorithm = analysis.algorithm_record(&db)?.expect("algorithm");
    assert!(!algorithm.is_complete());
    let reloaded = AnalysisRecord::get_analysis_record(analysis.id(), &db)?.expect("analysis row");
    assert!(!reloaded.results_are_invalid());
    Ok(())
}

#[cfg(unix)]
#[test_log::test]
fn test_non_utf8_path_is_refused() -> ProjectResult<()> {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;

    let (db, _dir) = create_test_db("non_utf8_path")?;
    let analysis = AnalysisRecord::new(&sample_analysis(), &db)?;
    let run2 = analysis.data_point_records(&db)?.remove(1);
    let path = Path::new(OsStr::from_bytes(b"/proj/a/run2/\xffout.csv"));

    let result = FileReferenceRecord::new(&FileReference::new(path, FileReferenceType::CSV), &run2, &db);

    assert!(matches!(result, Err(ProjectError::NonUtf8Path(ref stored)) if stored == path));
    assert_eq!(db.count_rows(FileReferenceRecordColumns::schema())?, 2);
    assert!(run2.output_file_reference_records(&db)?.is_empty());
    Ok(())
}
