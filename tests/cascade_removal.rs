// Cascading removal and join record integrity.

mod common;

use common::{create_test_db, sample_analysis};
use project_store::prelude::*;
use project_store::record::ObjectRecordColumns;
use project_store::record::join::{get_join_records_for_left_id, unlink, unlink_left};

#[test_log::test]
fn test_remove_analysis_keeps_problem() -> ProjectResult<()> {
    let (db, _dir) = create_test_db("remove_analysis")?;
    let analysis = AnalysisRecord::new(&sample_analysis(), &db)?;

    let removed = analysis.remove(&db)?;

    // algorithm + option, seed, run1 + attribute + file + link, run2 + link, analysis
    assert_eq!(removed.len(), 10);
    let last = removed.last().expect("analysis itself");
    assert_eq!(last.table, "AnalysisRecords");
    assert_eq!(last.id, analysis.id());

    assert!(AnalysisRecord::get_analysis_record(analysis.id(), &db)?.is_none());
    assert_eq!(db.count_rows(AlgorithmRecordColumns::schema())?, 0);
    assert_eq!(db.count_rows(DataPointRecordColumns::schema())?, 0);
    assert_eq!(db.count_rows(FileReferenceRecordColumns::schema())?, 0);
    assert_eq!(db.count_rows(DataPointMeasureJoinRecord::join_schema())?, 0);

    // The problem is a resource and survives with everything it owns
    assert_eq!(db.count_rows(ProblemRecordColumns::schema())?, 1);
    assert_eq!(db.count_rows(VariableRecordColumns::schema())?, 3);
    assert_eq!(db.count_rows(MeasureRecordColumns::schema())?, 3);
    assert_eq!(db.count_rows(AttributeRecordColumns::schema())?, 1);
    Ok(())
}

#[test_log::test]
fn test_children_are_removed_before_parent() -> ProjectResult<()> {
    let (db, _dir) = create_test_db("remove_order")?;
    let analysis = AnalysisRecord::new(&sample_analysis(), &db)?;
    let run = analysis.data_point_records(&db)?.remove(0);

    let removed = run.remove(&db)?;
    let tables: Vec<&str> = removed.iter().map(|record| record.table).collect();
    assert_eq!(
        tables,
        vec![
            "AttributeRecords",
            "FileReferenceRecords",
            "DataPointMeasureJoinRecords",
            "DataPointRecords",
        ]
    );
    assert_eq!(analysis.data_point_records(&db)?.len(), 1);
    Ok(())
}

#[test_log::test]
fn test_remove_problem_removes_variables_and_measures() -> ProjectResult<()> {
    let (db, _dir) = create_test_db("remove_problem")?;
    let analysis = AnalysisRecord::new(&sample_analysis(), &db)?;
    analysis.remove(&db)?;

    let problem = ProblemRecord::get_problem_records(&db)?.remove(0);
    let removed = problem.remove(&db)?;

    // 3 measures, 1 continuous attribute, 3 variables, the problem
    assert_eq!(removed.len(), 8);
    assert_eq!(db.count_rows(VariableRecordColumns::schema())?, 0);
    assert_eq!(db.count_rows(MeasureRecordColumns::schema())?, 0);
    assert_eq!(db.count_rows(AttributeRecordColumns::schema())?, 0);
    Ok(())
}

/// Three discrete variables with three measures each, and five data points
/// each selecting one measure per variable.
fn grid_analysis() -> Analysis {
    let variables: Vec<DiscreteVariable> = (0..3)
        .map(|v| {
            DiscreteVariable::new(
                format!("variable {v}"),
                (0..3).map(|m| Measure::new(format!("measure {v}.{m}"))).collect(),
            )
        })
        .collect();

    let mut problem = Problem::new("grid");
    for variable in &variables {
        problem = problem.with_variable(variable.clone());
    }

    let mut analysis = Analysis::new(
        "grid study",
        problem,
        FileReference::new("/proj/grid/seed.osm", FileReferenceType::OSM),
    );
    for point in 0..5 {
        let mut data_point = DataPoint::new(format!("point {point}"));
        for variable in &variables {
            data_point = data_point.with_measure(&variable.measures[point % 3]);
        }
        analysis = analysis.with_data_point(data_point);
    }
    analysis
}

#[test_log::test]
fn test_join_integrity() -> ProjectResult<()> {
    let (db, _dir) = create_test_db("join_integrity")?;
    let analysis = AnalysisRecord::new(&grid_analysis(), &db)?;
    let joins = DataPointMeasureJoinRecord::join_schema();

    assert_eq!(db.count_rows(MeasureRecordColumns::schema())?, 9);
    assert_eq!(db.count_rows(joins)?, 15);

    let points = analysis.data_point_records(&db)?;
    assert_eq!(points.len(), 5);
    for point in &points {
        let selected = point.selected_measure_records(&db)?;
        assert_eq!(selected.len(), 3);
        for measure in &selected {
            let users = measure.data_point_records(&db)?;
            assert!(users.iter().any(|user| user.id() == point.id()));
        }
    }

    // Removing a data point drops only its own links
    points[0].remove(&db)?;
    assert_eq!(db.count_rows(joins)?, 12);

    // Unlinking by the left id drops every link of that data point
    assert_eq!(unlink_left::<DataPointMeasureJoinRecord>(points[1].id(), &db)?, 3);
    assert_eq!(db.count_rows(joins)?, 9);
    assert!(points[1].selected_measure_records(&db)?.is_empty());

    // Removing a measure drops every link pointing at it
    let measure = points[2].selected_measure_records(&db)?.remove(0);
    let users = measure.data_point_records(&db)?.len();
    measure.remove(&db)?;
    assert_eq!(db.count_rows(joins)?, 9 - users);
    assert_eq!(points[2].selected_measure_records(&db)?.len(), 2);
    Ok(())
}

#[test_log::test]
fn test_link_is_idempotent_and_unlinkable() -> ProjectResult<()> {
    let (db, _dir) = create_test_db("link")?;
    let analysis = AnalysisRecord::new(&grid_analysis(), &db)?;
    let point = analysis.data_point_records(&db)?.remove(0);
    let measure = point.selected_measure_records(&db)?.remove(0);

    let existing = get_join_records_for_left_id::<DataPointMeasureJoinRecord>(point.id(), &db)?;
    let linked = DataPointMeasureJoinRecord::link(&point, &measure, &db)?;
    assert_eq!(linked, existing[0]);
    assert_eq!(linked.data_point_record(&db)?.id(), point.id());
    assert_eq!(linked.measure_record(&db)?.handle(), measure.handle());
    assert_eq!(linked.right_handle(), measure.handle());

    assert!(unlink::<DataPointMeasureJoinRecord>(point.id(), measure.id(), &db)?);
    assert!(!unlink::<DataPointMeasureJoinRecord>(point.id(), measure.id(), &db)?);
    assert_eq!(point.selected_measure_records(&db)?.len(), 2);
    Ok(())
}

#[test_log::test]
fn test_failed_cascade_rolls_back() -> ProjectResult<()> {
    let (db, _dir) = create_test_db("rollback")?;
    let analysis = AnalysisRecord::new(&sample_analysis(), &db)?;

    // An error after the cascade undoes the whole removal
    let result: ProjectResult<()> = db.transaction(|db| {
        analysis.remove(db)?;
        Err(ProjectError::Other("abort".into()))
    });
    assert!(result.is_err());

    assert!(AnalysisRecord::get_analysis_record(analysis.id(), &db)?.is_some());
    assert_eq!(db.count_rows(DataPointRecordColumns::schema())?, 2);
    assert_eq!(db.count_rows(DataPointMeasureJoinRecord::join_schema())?, 2);
    Ok(())
}
