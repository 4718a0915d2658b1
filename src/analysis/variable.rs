//! Problem variables and the measures a discrete variable chooses between.

use std::path::PathBuf;

use derive_more::From;
use serde::{Deserialize, Serialize};

use super::{Attribute, ObjectIdentity};

/// One option of a discrete variable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Measure {
    pub identity: ObjectIdentity,
    pub is_selected: bool,
    /// Script applying the measure, absent for the "do nothing" option.
    pub script_path: Option<PathBuf>,
}

impl Measure {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            identity: ObjectIdentity::new(name),
            is_selected: true,
            script_path: None,
        }
    }

    pub fn with_script(mut self, script_path: impl Into<PathBuf>) -> Self {
        self.script_path = Some(script_path.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscreteVariable {
    pub identity: ObjectIdentity,
    pub measures: Vec<Measure>,
}

impl DiscreteVariable {
    pub fn new(name: impl Into<String>, measures: Vec<Measure>) -> Self {
        Self {
            identity: ObjectIdentity::new(name),
            measures,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContinuousVariable {
    pub identity: ObjectIdentity,
    pub minimum: Option<f64>,
    pub maximum: Option<f64>,
    pub increment: Option<f64>,
    pub n_steps: Option<i32>,
    /// Uncertainty description parameters.
    pub attributes: Vec<Attribute>,
}

impl ContinuousVariable {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            identity: ObjectIdentity::new(name),
            minimum: None,
            maximum: None,
            increment: None,
            n_steps: None,
            attributes: Vec::new(),
        }
    }

    pub fn with_bounds(mut self, minimum: f64, maximum: f64) -> Self {
        self.minimum = Some(minimum);
        self.maximum = Some(maximum);
        self
    }

    pub fn with_attribute(mut self, attribute: Attribute) -> Self {
        self.attributes.push(attribute);
        self
    }
}

/// Reports the value of a named attribute of a simulation result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputAttributeVariable {
    pub identity: ObjectIdentity,
    pub attribute_name: String,
}

impl OutputAttributeVariable {
    pub fn new(name: impl Into<String>, attribute_name: impl Into<String>) -> Self {
        Self {
            identity: ObjectIdentity::new(name),
            attribute_name: attribute_name.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, From)]
pub enum InputVariable {
    Discrete(DiscreteVariable),
    Continuous(ContinuousVariable),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, From)]
pub enum OutputVariable {
    Attribute(OutputAttributeVariable),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, From)]
pub enum Variable {
    Input(InputVariable),
    Output(OutputVariable),
}

impl InputVariable {
    pub fn identity(&self) -> &ObjectIdentity {
        match self {
            InputVariable::Discrete(variable) => &variable.identity,
            InputVariable::Continuous(variable) => &variable.identity,
        }
    }
}

impl OutputVariable {
    pub fn identity(&self) -> &ObjectIdentity {
        match self {
            OutputVariable::Attribute(variable) => &variable.identity,
        }
    }
}

impl Variable {
    pub fn identity(&self) -> &ObjectIdentity {
        match self {
            Variable::Input(variable) => variable.identity(),
            Variable::Output(variable) => variable.identity(),
        }
    }
}
