// Discriminator dispatch for the variable family and attribute storage.

mod common;

use assert_matches::assert_matches;
use common::{create_test_db, sample_analysis};
use project_store::prelude::*;
use project_store::record::ObjectRecordColumns;
use rusqlite::named_params;

#[test_log::test]
fn test_variable_dispatch() -> ProjectResult<()> {
    let (db, _dir) = create_test_db("dispatch")?;
    AnalysisRecord::new(&sample_analysis(), &db)?;

    let variables = VariableRecord::get_variable_records(&db)?;
    assert_eq!(variables.len(), 3);
    assert_matches!(
        &variables[0],
        VariableRecord::Input(InputVariableRecord::Discrete(record)) if record.name() == "insulation"
    );
    assert_matches!(
        &variables[1],
        VariableRecord::Input(InputVariableRecord::Continuous(record)) if record.minimum() == Some(18.0)
    );
    assert_matches!(
        &variables[2],
        VariableRecord::Output(OutputVariableRecord::Attribute(record))
            if record.attribute_name() == "site_eui"
    );
    assert_eq!(variables[2].function_coefficient(), Some(1.0));

    let any: AnyObjectRecord = variables[1].clone().into();
    assert_eq!(any.kind(), ObjectRecordKind::Variable);
    assert_eq!(any.database_table_name(), "VariableRecords");
    Ok(())
}

#[test_log::test]
fn test_problem_variable_order() -> ProjectResult<()> {
    let (db, _dir) = create_test_db("variable_order")?;
    let analysis = AnalysisRecord::new(&sample_analysis(), &db)?;
    let problem = analysis.problem_record(&db)?;

    let inputs = problem.input_variable_records(&db)?;
    let indices: Vec<i32> = inputs
        .iter()
        .map(|record| record.variable_fields().variable_vector_index)
        .collect();
    assert_eq!(indices, vec![0, 1]);
    assert_eq!(problem.response_records(&db)?.len(), 1);

    let InputVariableRecord::Discrete(discrete) = &inputs[0] else {
        panic!("first input is the discrete variable");
    };
    let names: Vec<String> = discrete
        .measure_records(&db)?
        .iter()
        .map(|measure| measure.name().to_string())
        .collect();
    assert_eq!(names, vec!["baseline", "r20", "r30"]);
    Ok(())
}

#[test_log::test]
fn test_unknown_discriminator_is_skipped() -> ProjectResult<()> {
    let (db, _dir) = create_test_db("unknown_discriminator")?;
    let analysis = AnalysisRecord::new(&sample_analysis(), &db)?;
    let problem = analysis.problem_record(&db)?;
    let continuous_id = problem.input_variable_records(&db)?[1].id();

    db.connection().execute(
        "UPDATE VariableRecords SET inputVariableRecordType=7 WHERE id=:id",
        named_params! { ":id": continuous_id },
    )?;

    assert!(VariableRecord::get_variable_record(continuous_id, &db)?.is_none());
    assert_eq!(VariableRecord::get_variable_records(&db)?.len(), 2);
    assert_eq!(problem.input_variable_records(&db)?.len(), 1);
    Ok(())
}

#[test_log::test]
fn test_remove_reaches_rows_that_fail_to_load() -> ProjectResult<()> {
    let (db, _dir) = create_test_db("remove_unloadable")?;
    let analysis = AnalysisRecord::new(&sample_analysis(), &db)?;
    analysis.remove(&db)?;
    let problem = ProblemRecord::get_problem_records(&db)?.remove(0);
    let continuous_id = problem.input_variable_records(&db)?[1].id();

    db.connection().execute(
        "UPDATE VariableRecords SET inputVariableRecordType=7 WHERE id=:id",
        named_params! { ":id": continuous_id },
    )?;
    assert_eq!(problem.input_variable_records(&db)?.len(), 1);

    let removed = problem.remove(&db)?;

    // 3 measures, discrete, output, then the unloadable variable and its attribute
    assert_eq!(removed.len(), 8);
    assert!(
        removed
            .iter()
            .any(|record| record.table == "VariableRecords" && record.id == continuous_id)
    );
    assert_eq!(db.count_rows(VariableRecordColumns::schema())?, 0);
    assert_eq!(db.count_rows(AttributeRecordColumns::schema())?, 0);
    assert_eq!(db.count_rows(MeasureRecordColumns::schema())?, 0);
    assert_eq!(db.count_rows(ProblemRecordColumns::schema())?, 0);
    Ok(())
}

#[test_log::test]
fn test_unloadable_data_point_loses_its_links() -> ProjectResult<()> {
    let (db, _dir) = create_test_db("remove_unloadable_data_point")?;
    let analysis = AnalysisRecord::new(&sample_analysis(), &db)?;
    let run1 = analysis.data_point_records(&db)?.remove(0);

    db.connection().execute(
        "UPDATE DataPointRecords SET complete='maybe' WHERE id=:id",
        named_params! { ":id": run1.id() },
    )?;
    assert_eq!(analysis.data_point_records(&db)?.len(), 1);

    analysis.remove(&db)?;

    assert_eq!(db.count_rows(DataPointRecordColumns::schema())?, 0);
    assert_eq!(db.count_rows(DataPointMeasureJoinRecord::join_schema())?, 0);
    assert_eq!(db.count_rows(FileReferenceRecordColumns::schema())?, 0);
    // Only the continuous variable's attribute belongs to the problem
    assert_eq!(db.count_rows(AttributeRecordColumns::schema())?, 1);
    Ok(())
}

#[test_log::test]
fn test_row_of_other_concrete_type_is_rejected() -> ProjectResult<()> {
    let (db, _dir) = create_test_db("wrong_concrete_type")?;
    let analysis = AnalysisRecord::new(&sample_analysis(), &db)?;
    let problem = analysis.problem_record(&db)?;
    let discrete = problem.input_variable_records(&db)?.remove(0);

    let row = discrete.read_row(&db)?.expect("stored row");
    assert!(ContinuousVariableRecord::from_row(&row).is_err());
    assert!(DiscreteVariableRecord::from_row(&row).is_ok());
    Ok(())
}

#[test_log::test]
fn test_attribute_vector_keeps_order() -> ProjectResult<()> {
    let (db, _dir) = create_test_db("attribute_vector")?;
    let elements = vec![
        Attribute::new("first", AttributeValue::Double(1.5)),
        Attribute::new("second", AttributeValue::String("two".into())),
        Attribute::new("third", AttributeValue::Boolean(true)),
    ];
    let vector = Attribute::new("weights", AttributeValue::AttributeVector(elements));
    let mut analysis = sample_analysis();
    analysis.algorithm = Some(Algorithm::new("sampler").with_option(vector.clone()));

    let stored = AnalysisRecord::new(&analysis, &db)?;
    let algorithm = stored.algorithm_record(&db)?.expect("algorithm");

    let options = algorithm.option_records(&db)?;
    assert_eq!(options.len(), 1);
    assert_eq!(options[0].value_type(), AttributeValueType::AttributeVector);

    let element_records = options[0].element_records(&db)?;
    let positions: Vec<Option<i32>> = element_records
        .iter()
        .map(AttributeRecord::attribute_vector_index)
        .collect();
    assert_eq!(positions, vec![Some(0), Some(1), Some(2)]);
    assert_eq!(options[0].attribute(&db)?, vector);

    // Elements are not listed as top level attributes
    let top_level: Vec<String> = AttributeRecord::get_attribute_records(&db)?
        .iter()
        .map(|record| record.name().to_string())
        .collect();
    assert!(!top_level.iter().any(|name| name == "second"));

    // Removing the vector removes its elements
    let removed = options[0].remove(&db)?;
    assert_eq!(removed.len(), 4);
    Ok(())
}

#[test_log::test]
fn test_non_finite_doubles_round_trip() -> ProjectResult<()> {
    let (db, _dir) = create_test_db("non_finite")?;
    let mut analysis = sample_analysis();
    analysis.algorithm = Some(
        Algorithm::new("sampler")
            .with_option(Attribute::new("nan", AttributeValue::Double(f64::NAN)))
            .with_option(Attribute::new("inf", AttributeValue::Double(f64::INFINITY)))
            .with_option(Attribute::new(
                "floor",
                AttributeValue::Quantity {
                    value: f64::NEG_INFINITY,
                    system: UnitSystem::SI,
                },
            )),
    );

    let stored = AnalysisRecord::new(&analysis, &db)?;
    let algorithm = stored.algorithm_record(&db)?.expect("algorithm");
    let options = algorithm.option_records(&db)?;
    assert_eq!(options.len(), 3);

    assert_matches!(options[0].stored_value(), StoredAttributeValue::Double(value) if value.is_nan());
    assert_eq!(options[1].stored_value(), &StoredAttributeValue::Double(f64::INFINITY));
    assert_eq!(
        options[2].stored_value(),
        &StoredAttributeValue::Quantity {
            value: f64::NEG_INFINITY,
            system: UnitSystem::SI
        }
    );

    for option in &options {
        assert!(!option.is_dirty());
        let row = option.read_row(&db)?.expect("stored row");
        assert!(option.compare_values(&row));
    }
    Ok(())
}

#[test_log::test]
fn test_attribute_with_two_parents_is_skipped() -> ProjectResult<()> {
    let (db, _dir) = create_test_db("two_parents")?;
    let analysis = AnalysisRecord::new(&sample_analysis(), &db)?;
    let algorithm = analysis.algorithm_record(&db)?.expect("algorithm");
    let option = algorithm.option_records(&db)?.remove(0);

    db.connection().execute(
        "UPDATE AttributeRecords SET dataPointRecordId=1 WHERE id=:id",
        named_params! { ":id": option.id() },
    )?;

    assert!(AttributeRecord::get_attribute_record(option.id(), &db)?.is_none());
    assert!(algorithm.option_records(&db)?.is_empty());
    Ok(())
}

#[test_log::test]
fn test_scalar_attribute_edits() -> ProjectResult<()> {
    let (db, _dir) = create_test_db("attribute_edits")?;
    let analysis = AnalysisRecord::new(&sample_analysis(), &db)?;
    let run = analysis.data_point_records(&db)?.remove(0);
    let mut output = run.output_attribute_records(&db)?.remove(0);
    assert_eq!(output.units(), Some("kBtu/ft^2"));

    assert!(output.set_value(StoredAttributeValue::Quantity {
        value: 98.25,
        system: UnitSystem::IP,
    }));
    assert!(!output.set_value(StoredAttributeValue::AttributeVector));
    output.set_source("simulation");
    output.save(&db)?;

    let reloaded = AttributeRecord::get_attribute_record(output.id(), &db)?.expect("attribute row");
    assert_eq!(
        reloaded.stored_value(),
        &StoredAttributeValue::Quantity {
            value: 98.25,
            system: UnitSystem::IP
        }
    );
    assert_eq!(reloaded.source(), "simulation");
    assert_matches!(reloaded.parent_slot(), AttributeParent::DataPoint(id) if id == run.id());
    Ok(())
}
