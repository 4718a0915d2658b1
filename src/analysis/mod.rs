//! Domain objects stored by the records.
//!
//! These are plain values. A record is built from one of them, and can
//! rebuild an equal one from storage.

pub mod attribute;
pub mod file_reference;
pub mod variable;

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use attribute::{Attribute, AttributeValue, AttributeValueType, UnitSystem};
pub use file_reference::{FileReference, FileReferenceType};
pub use variable::{
    ContinuousVariable, DiscreteVariable, InputVariable, Measure, OutputAttributeVariable,
    OutputVariable, Variable,
};

/// Identity and naming shared by every domain object.
///
/// `uuid` never changes. `version_uuid` is replaced on every edit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectIdentity {
    pub uuid: Uuid,
    pub version_uuid: Uuid,
    pub name: String,
    pub display_name: String,
    pub description: String,
}

impl ObjectIdentity {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            uuid: Uuid::new_v4(),
            version_uuid: Uuid::new_v4(),
            display_name: name.clone(),
            name,
            description: String::new(),
        }
    }

    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = display_name.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

/// An output variable of a problem, with its weight in the objective
/// function when it has one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub variable: OutputVariable,
    pub coefficient: Option<f64>,
}

/// The variables an analysis explores and the responses it reports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Problem {
    pub identity: ObjectIdentity,
    pub variables: Vec<InputVariable>,
    pub responses: Vec<Response>,
}

impl Problem {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            identity: ObjectIdentity::new(name),
            variables: Vec::new(),
            responses: Vec::new(),
        }
    }

    pub fn with_variable(mut self, variable: impl Into<InputVariable>) -> Self {
        self.variables.push(variable.into());
        self
    }

    pub fn with_response(mut self, variable: impl Into<OutputVariable>, coefficient: Option<f64>) -> Self {
        self.responses.push(Response {
            variable: variable.into(),
            coefficient,
        });
        self
    }
}

/// Search strategy state of an analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Algorithm {
    pub identity: ObjectIdentity,
    pub iter: i32,
    pub complete: bool,
    pub failed: bool,
    pub options: Vec<Attribute>,
}

impl Algorithm {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            identity: ObjectIdentity::new(name),
            iter: 0,
            complete: false,
            failed: false,
            options: Vec::new(),
        }
    }

    pub fn with_option(mut self, option: Attribute) -> Self {
        self.options.push(option);
        self
    }
}

/// One evaluated (or to be evaluated) point of an analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataPoint {
    pub identity: ObjectIdentity,
    pub complete: bool,
    pub failed: bool,
    pub directory: Option<PathBuf>,
    /// Handles of the measures this point applies, one per discrete variable.
    pub selected_measures: Vec<Uuid>,
    pub output_attributes: Vec<Attribute>,
    pub output_files: Vec<FileReference>,
}

impl DataPoint {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            identity: ObjectIdentity::new(name),
            complete: false,
            failed: false,
            directory: None,
            selected_measures: Vec::new(),
            output_attributes: Vec::new(),
            output_files: Vec::new(),
        }
    }

    pub fn with_directory(mut self, directory: impl Into<PathBuf>) -> Self {
        self.directory = Some(directory.into());
        self
    }

    pub fn with_measure(mut self, measure: &Measure) -> Self {
        self.selected_measures.push(measure.identity.uuid);
        self
    }

    pub fn with_output_attribute(mut self, attribute: Attribute) -> Self {
        self.output_attributes.push(attribute);
        self
    }

    pub fn with_output_file(mut self, file: FileReference) -> Self {
        self.output_files.push(file);
        self
    }
}

/// A problem, the algorithm exploring it, the seed model and the data points
/// produced so far.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Analysis {
    pub identity: ObjectIdentity,
    pub problem: Problem,
    pub algorithm: Option<Algorithm>,
    pub seed: FileReference,
    pub data_points: Vec<DataPoint>,
    pub results_are_invalid: bool,
    pub data_points_are_invalid: bool,
}

impl Analysis {
    pub fn new(name: impl Into<String>, problem: Problem, seed: FileReference) -> Self {
        Self {
            identity: ObjectIdentity::new(name),
            problem,
            algorithm: None,
            seed,
            data_points: Vec::new(),
            results_are_invalid: false,
            data_points_are_invalid: false,
        }
    }

    pub fn with_algorithm(mut self, algorithm: Algorithm) -> Self {
        self.algorithm = Some(algorithm);
        self
    }

    pub fn with_data_point(mut self, data_point: DataPoint) -> Self {
        self.data_points.push(data_point);
        self
    }
}
