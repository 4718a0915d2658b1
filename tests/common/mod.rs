// Common test utilities and helpers
#![allow(dead_code)]

use std::path::PathBuf;

use project_store::prelude::*;
use tempfile::TempDir;

/// Create a database file in a fresh temporary directory.
///
/// The directory is deleted when the returned `TempDir` is dropped, so keep
/// it alive for the duration of the test.
pub fn create_test_db(name: &str) -> ProjectResult<(ProjectDatabase, TempDir)> {
    create_test_db_with(name, ConcurrencyPolicy::Overwrite)
}

pub fn create_test_db_with(
    name: &str,
    policy: ConcurrencyPolicy,
) -> ProjectResult<(ProjectDatabase, TempDir)> {
    let dir = tempfile::tempdir()?;
    let config = ProjectConfig::builder()
        .path(db_path(&dir, name))
        .concurrency_policy(policy)
        .build();
    Ok((ProjectDatabase::open(config)?, dir))
}

/// Open another session on the database created by [`create_test_db`].
pub fn open_second_session(
    dir: &TempDir,
    name: &str,
    policy: ConcurrencyPolicy,
) -> ProjectResult<ProjectDatabase> {
    ProjectDatabase::open(
        ProjectConfig::builder()
            .path(db_path(dir, name))
            .concurrency_policy(policy)
            .build(),
    )
}

pub fn db_path(dir: &TempDir, name: &str) -> PathBuf {
    dir.path().join(format!("{name}.osp"))
}

/// Measures of the "insulation" variable of [`sample_analysis`].
pub struct SampleMeasures {
    pub baseline: Measure,
    pub r20: Measure,
    pub r30: Measure,
}

pub fn sample_measures() -> SampleMeasures {
    SampleMeasures {
        baseline: Measure::new("baseline"),
        r20: Measure::new("r20").with_script("/proj/a/measures/r20.rb"),
        r30: Measure::new("r30").with_script("/proj/a/measures/r30.rb"),
    }
}

/// A small but complete analysis.
///
/// Rows stored by `AnalysisRecord::new`:
/// - 1 problem with 3 variables (discrete, continuous, output attribute)
/// - 3 measures on the discrete variable
/// - 1 analysis, 1 algorithm, 1 seed file
/// - 2 data points, the first with one output attribute and one output file
/// - 3 attributes (continuous variable, algorithm option, data point output)
/// - 2 data point to measure links
pub fn sample_analysis() -> Analysis {
    let measures = sample_measures();

    let problem = Problem::new("envelope")
        .with_variable(DiscreteVariable::new(
            "insulation",
            vec![measures.baseline.clone(), measures.r20.clone(), measures.r30.clone()],
        ))
        .with_variable(
            ContinuousVariable::new("setpoint")
                .with_bounds(18.0, 24.0)
                .with_attribute(Attribute::new(
                    "distribution",
                    AttributeValue::String("uniform".into()),
                )),
        )
        .with_response(OutputAttributeVariable::new("eui", "site_eui"), Some(1.0));

    let algorithm = Algorithm::new("doe")
        .with_option(Attribute::new("samples", AttributeValue::Integer(4)));

    let mut run1 = DataPoint::new("run1")
        .with_directory("/proj/a/run1")
        .with_measure(&measures.r20)
        .with_output_attribute(
            Attribute::new("site_eui", AttributeValue::Double(101.5)).with_units("kBtu/ft^2"),
        )
        .with_output_file(FileReference::new("/proj/a/run1/out.csv", FileReferenceType::CSV));
    run1.complete = true;

    let run2 = DataPoint::new("run2")
        .with_directory("/proj/a/run2")
        .with_measure(&measures.r30);

    Analysis::new(
        "study",
        problem,
        FileReference::new("/proj/a/seed.osm", FileReferenceType::OSM).with_checksum("abc123"),
    )
    .with_algorithm(algorithm)
    .with_data_point(run1)
    .with_data_point(run2)
}
