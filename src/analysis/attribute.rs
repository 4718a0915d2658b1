//! Named, typed values attached to analysis objects.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, FromRepr, IntoStaticStr};

use super::ObjectIdentity;

/// Unit system a quantity or unit is expressed in.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    IntoStaticStr,
    EnumIter,
)]
pub enum UnitSystem {
    SI,
    IP,
    BTU,
    CGS,
    Celsius,
    Fahrenheit,
    Mixed,
}

/// Stored discriminator of an [`AttributeValue`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, FromRepr, EnumIter)]
#[repr(i64)]
pub enum AttributeValueType {
    Boolean = 0,
    Integer = 1,
    Unsigned = 2,
    Double = 3,
    Quantity = 4,
    Unit = 5,
    String = 6,
    AttributeVector = 7,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AttributeValue {
    Boolean(bool),
    Integer(i32),
    Unsigned(u32),
    Double(f64),
    Quantity { value: f64, system: UnitSystem },
    Unit { system: UnitSystem },
    String(String),
    /// Ordered list of child attributes.
    AttributeVector(Vec<Attribute>),
}

impl AttributeValue {
    pub fn value_type(&self) -> AttributeValueType {
        match self {
            AttributeValue::Boolean(_) => AttributeValueType::Boolean,
            AttributeValue::Integer(_) => AttributeValueType::Integer,
            AttributeValue::Unsigned(_) => AttributeValueType::Unsigned,
            AttributeValue::Double(_) => AttributeValueType::Double,
            AttributeValue::Quantity { .. } => AttributeValueType::Quantity,
            AttributeValue::Unit { .. } => AttributeValueType::Unit,
            AttributeValue::String(_) => AttributeValueType::String,
            AttributeValue::AttributeVector(_) => AttributeValueType::AttributeVector,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attribute {
    pub identity: ObjectIdentity,
    pub value: AttributeValue,
    pub units: Option<String>,
    /// Where the value came from, e.g. the tool that reported it.
    pub source: String,
}

impl Attribute {
    pub fn new(name: impl Into<String>, value: AttributeValue) -> Self {
        Self {
            identity: ObjectIdentity::new(name),
            value,
            units: None,
            source: String::new(),
        }
    }

    pub fn with_units(mut self, units: impl Into<String>) -> Self {
        self.units = Some(units.into());
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.identity.name
    }

    pub fn value_type(&self) -> AttributeValueType {
        self.value.value_type()
    }
}
