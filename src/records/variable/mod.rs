//! The variable record family.
//!
//! All variables share the `VariableRecords` table. Which concrete record a
//! row holds is decided one level at a time:
//!
//! ```text
//! VariableRecord                      variableRecordType
//! ├── InputVariableRecord (0)         inputVariableRecordType
//! │   ├── DiscreteVariableRecord (0)
//! │   └── ContinuousVariableRecord (1)
//! └── OutputVariableRecord (1)        outputVariableRecordType
//!     └── OutputAttributeVariableRecord (0)
//! ```
//!
//! Columns that do not apply to a row's concrete type are null.

mod continuous;
mod discrete;
mod output_attribute;

pub use continuous::{ContinuousVariableRecord, ContinuousVariableRecordFields};
pub use discrete::{DiscreteVariableRecord, DiscreteVariableRecordFields};
pub use output_attribute::{OutputAttributeVariableRecord, OutputAttributeVariableRecordFields};

use derive_more::From;
use log::error;
use rusqlite::named_params;
use strum::{Display, FromRepr};

use crate::analysis::{InputVariable, OutputVariable, Variable};
use crate::database::ProjectDatabase;
use crate::errors::{ProjectError, ProjectResult};
use crate::record::columns::{ObjectRecordColumns, object_record_columns};
use crate::record::{Bindings, RowValues, delegate_object_record};
use crate::records::ProblemRecord;

object_record_columns! {
    /// Columns of the `VariableRecords` table.
    pub enum VariableRecordColumns in "VariableRecords" {
        ProblemRecordId => "problemRecordId": Integer,
        VariableRecordType => "variableRecordType": Integer,
        InputVariableRecordType => "inputVariableRecordType": Integer,
        OutputVariableRecordType => "outputVariableRecordType": Integer,
        VariableVectorIndex => "variableVectorIndex": Integer,
        FunctionCoefficient => "functionCoefficient": Real,
        Minimum => "minimum": Real,
        Maximum => "maximum": Real,
        Increment => "increment": Real,
        NSteps => "nSteps": Integer,
        AttributeName => "attributeName": Text,
    }
}

type Columns = VariableRecordColumns;

fn table() -> &'static str {
    Columns::schema().table()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, FromRepr)]
#[repr(i64)]
pub enum VariableRecordType {
    InputVariableRecord = 0,
    OutputVariableRecord = 1,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, FromRepr)]
#[repr(i64)]
pub enum InputVariableRecordType {
    DiscreteVariableRecord = 0,
    ContinuousVariableRecord = 1,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, FromRepr)]
#[repr(i64)]
pub enum OutputVariableRecordType {
    OutputAttributeVariableRecord = 0,
}

/// Full discriminator path of a concrete variable record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum VariableKind {
    Input(InputVariableRecordType),
    Output(OutputVariableRecordType),
}

impl VariableKind {
    fn bind_values(self, bindings: &mut Bindings<'_>) {
        match self {
            VariableKind::Input(input) => {
                bindings.bind(
                    Columns::VariableRecordType,
                    VariableRecordType::InputVariableRecord as i64,
                );
                bindings.bind(Columns::InputVariableRecordType, input as i64);
            }
            VariableKind::Output(output) => {
                bindings.bind(
                    Columns::VariableRecordType,
                    VariableRecordType::OutputVariableRecord as i64,
                );
                bindings.bind(Columns::OutputVariableRecordType, output as i64);
            }
        }
    }

    /// Refuse a row whose discriminators name a different concrete type.
    fn check_row(self, row: &RowValues) -> ProjectResult<()> {
        let stored = match row.get_i64(Columns::VariableRecordType)? {
            0 => VariableKind::Input(
                InputVariableRecordType::from_repr(row.get_i64(Columns::InputVariableRecordType)?)
                    .ok_or_else(|| ProjectError::deserialization(table(), "unknown input variable type"))?,
            ),
            1 => VariableKind::Output(
                OutputVariableRecordType::from_repr(row.get_i64(Columns::OutputVariableRecordType)?)
                    .ok_or_else(|| ProjectError::deserialization(table(), "unknown output variable type"))?,
            ),
            other => {
                return Err(ProjectError::deserialization(
                    table(),
                    format!("unknown variable record type {other}"),
                ));
            }
        };
        if stored == self {
            Ok(())
        } else {
            Err(ProjectError::deserialization(
                table(),
                format!("row holds a {stored:?} variable, expected {self:?}"),
            ))
        }
    }
}

/// Columns every variable record carries.
#[derive(Debug, Clone, PartialEq)]
pub struct VariableFields {
    pub problem_record_id: i64,
    pub variable_vector_index: i32,
    pub function_coefficient: Option<f64>,
}

impl VariableFields {
    fn from_row(row: &RowValues) -> ProjectResult<Self> {
        Ok(Self {
            problem_record_id: row.get_i64(Columns::ProblemRecordId)?,
            variable_vector_index: row.get_i32(Columns::VariableVectorIndex)?,
            function_coefficient: row.get_opt_f64(Columns::FunctionCoefficient)?,
        })
    }

    fn bind_values(&self, bindings: &mut Bindings<'_>) {
        bindings.bind(Columns::ProblemRecordId, self.problem_record_id);
        bindings.bind(Columns::VariableVectorIndex, self.variable_vector_index);
        bindings.bind_f64(Columns::FunctionCoefficient, self.function_coefficient);
    }
}

#[derive(Debug, Clone, PartialEq, From)]
pub enum InputVariableRecord {
    Discrete(DiscreteVariableRecord),
    Continuous(ContinuousVariableRecord),
}

#[derive(Debug, Clone, PartialEq, From)]
pub enum OutputVariableRecord {
    Attribute(OutputAttributeVariableRecord),
}

#[derive(Debug, Clone, PartialEq, From)]
pub enum VariableRecord {
    Input(InputVariableRecord),
    Output(OutputVariableRecord),
}

delegate_object_record!(InputVariableRecord { Discrete, Continuous });
delegate_object_record!(OutputVariableRecord { Attribute });
delegate_object_record!(VariableRecord { Input, Output });

impl From<DiscreteVariableRecord> for VariableRecord {
    fn from(record: DiscreteVariableRecord) -> Self {
        VariableRecord::Input(record.into())
    }
}

impl From<ContinuousVariableRecord> for VariableRecord {
    fn from(record: ContinuousVariableRecord) -> Self {
        VariableRecord::Input(record.into())
    }
}

impl From<OutputAttributeVariableRecord> for VariableRecord {
    fn from(record: OutputAttributeVariableRecord) -> Self {
        VariableRecord::Output(record.into())
    }
}

fn log_unknown(db: &ProjectDatabase, level: &str, discriminant: ProjectResult<i64>) {
    match discriminant {
        Ok(value) => error!(
            target: db.log_target(),
            "Unknown {level} {value}, unable to construct a variable record"
        ),
        Err(e) => error!(
            target: db.log_target(),
            "Unable to read {level}, because '{e}'"
        ),
    }
}

impl InputVariableRecord {
    /// Dispatch on `inputVariableRecordType`.
    pub fn factory_from_query(row: &RowValues, db: &ProjectDatabase) -> Option<Self> {
        let discriminant = row.get_i64(Columns::InputVariableRecordType);
        match discriminant.as_ref().ok().copied().and_then(InputVariableRecordType::from_repr) {
            Some(InputVariableRecordType::DiscreteVariableRecord) => {
                DiscreteVariableRecord::factory_from_query(row, db).map(Into::into)
            }
            Some(InputVariableRecordType::ContinuousVariableRecord) => {
                ContinuousVariableRecord::factory_from_query(row, db).map(Into::into)
            }
            None => {
                log_unknown(db, "InputVariableRecordType", discriminant);
                None
            }
        }
    }

    /// Store `variable` as input `index` of `problem`.
    pub fn factory_from_variable(
        variable: &InputVariable,
        problem: &ProblemRecord,
        index: i32,
        db: &ProjectDatabase,
    ) -> ProjectResult<Self> {
        match variable {
            InputVariable::Discrete(discrete) => {
                DiscreteVariableRecord::new(discrete, problem, index, db).map(Into::into)
            }
            InputVariable::Continuous(continuous) => {
                ContinuousVariableRecord::new(continuous, problem, index, db).map(Into::into)
            }
        }
    }

    pub fn get_input_variable_records(db: &ProjectDatabase) -> ProjectResult<Vec<Self>> {
        db.load_records(
            Columns::schema(),
            Some("variableRecordType=:type ORDER BY id"),
            named_params! { ":type": VariableRecordType::InputVariableRecord as i64 },
            Self::factory_from_query,
        )
    }

    pub fn variable_fields(&self) -> &VariableFields {
        match self {
            InputVariableRecord::Discrete(record) => record.variable_fields(),
            InputVariableRecord::Continuous(record) => record.variable_fields(),
        }
    }

    pub fn input_variable(&self, db: &ProjectDatabase) -> ProjectResult<InputVariable> {
        match self {
            InputVariableRecord::Discrete(record) => record.discrete_variable(db).map(Into::into),
            InputVariableRecord::Continuous(record) => record.continuous_variable(db).map(Into::into),
        }
    }
}

impl OutputVariableRecord {
    /// Dispatch on `outputVariableRecordType`.
    pub fn factory_from_query(row: &RowValues, db: &ProjectDatabase) -> Option<Self> {
        let discriminant = row.get_i64(Columns::OutputVariableRecordType);
        match discriminant.as_ref().ok().copied().and_then(OutputVariableRecordType::from_repr) {
            Some(OutputVariableRecordType::OutputAttributeVariableRecord) => {
                OutputAttributeVariableRecord::factory_from_query(row, db).map(Into::into)
            }
            None => {
                log_unknown(db, "OutputVariableRecordType", discriminant);
                None
            }
        }
    }

    /// Store `variable` as response `index` of `problem`.
    pub fn factory_from_variable(
        variable: &OutputVariable,
        problem: &ProblemRecord,
        index: i32,
        coefficient: Option<f64>,
        db: &ProjectDatabase,
    ) -> ProjectResult<Self> {
        match variable {
            OutputVariable::Attribute(attribute) => {
                OutputAttributeVariableRecord::new(attribute, problem, index, coefficient, db)
                    .map(Into::into)
            }
        }
    }

    pub fn get_output_variable_records(db: &ProjectDatabase) -> ProjectResult<Vec<Self>> {
        db.load_records(
            Columns::schema(),
            Some("variableRecordType=:type ORDER BY id"),
            named_params! { ":type": VariableRecordType::OutputVariableRecord as i64 },
            Self::factory_from_query,
        )
    }

    pub fn variable_fields(&self) -> &VariableFields {
        match self {
            OutputVariableRecord::Attribute(record) => record.variable_fields(),
        }
    }

    pub fn output_variable(&self) -> OutputVariable {
        match self {
            OutputVariableRecord::Attribute(record) => record.output_attribute_variable().into(),
        }
    }
}

impl VariableRecord {
    /// Build the concrete record a row holds, or `None` (logged) when the
    /// row's discriminators are unknown or the row is invalid for its type.
    pub fn factory_from_query(row: &RowValues, db: &ProjectDatabase) -> Option<Self> {
        let discriminant = row.get_i64(Columns::VariableRecordType);
        match discriminant.as_ref().ok().copied().and_then(VariableRecordType::from_repr) {
            Some(VariableRecordType::InputVariableRecord) => {
                InputVariableRecord::factory_from_query(row, db).map(Into::into)
            }
            Some(VariableRecordType::OutputVariableRecord) => {
                OutputVariableRecord::factory_from_query(row, db).map(Into::into)
            }
            None => {
                log_unknown(db, "VariableRecordType", discriminant);
                None
            }
        }
    }

    /// Store `variable` under `problem` as the record type matching its
    /// domain type.
    pub fn factory_from_variable(
        variable: &Variable,
        problem: &ProblemRecord,
        index: i32,
        coefficient: Option<f64>,
        db: &ProjectDatabase,
    ) -> ProjectResult<Self> {
        match variable {
            Variable::Input(input) => {
                InputVariableRecord::factory_from_variable(input, problem, index, db).map(Into::into)
            }
            Variable::Output(output) => {
                OutputVariableRecord::factory_from_variable(output, problem, index, coefficient, db)
                    .map(Into::into)
            }
        }
    }

    pub fn get_variable_record(id: i64, db: &ProjectDatabase) -> ProjectResult<Option<Self>> {
        db.load_record(Columns::schema(), id, Self::factory_from_query)
    }

    pub fn get_variable_records(db: &ProjectDatabase) -> ProjectResult<Vec<Self>> {
        db.load_records(Columns::schema(), None, named_params! {}, Self::factory_from_query)
    }

    /// Variables of the problem `problem_record_id` of one kind, in order.
    pub(crate) fn get_variable_records_for_problem(
        problem_record_id: i64,
        variable_type: VariableRecordType,
        db: &ProjectDatabase,
    ) -> ProjectResult<Vec<Self>> {
        db.load_records(
            Columns::schema(),
            Some("problemRecordId=:id AND variableRecordType=:type ORDER BY variableVectorIndex"),
            named_params! { ":id": problem_record_id, ":type": variable_type as i64 },
            Self::factory_from_query,
        )
    }

    pub fn variable_fields(&self) -> &VariableFields {
        match self {
            VariableRecord::Input(record) => record.variable_fields(),
            VariableRecord::Output(record) => record.variable_fields(),
        }
    }

    pub fn problem_record_id(&self) -> i64 {
        self.variable_fields().problem_record_id
    }

    pub fn variable_vector_index(&self) -> i32 {
        self.variable_fields().variable_vector_index
    }

    pub fn function_coefficient(&self) -> Option<f64> {
        self.variable_fields().function_coefficient
    }

    pub fn variable(&self, db: &ProjectDatabase) -> ProjectResult<Variable> {
        match self {
            VariableRecord::Input(record) => record.input_variable(db).map(Into::into),
            VariableRecord::Output(record) => Ok(record.output_variable().into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::RecordColumns;
    use rusqlite::types::Value;

    fn row_with(set: &[(VariableRecordColumns, Value)]) -> RowValues {
        let mut values = vec![Value::Null; Columns::schema().column_count()];
        for (column, value) in set {
            values[column.index()] = value.clone();
        }
        RowValues::new("VariableRecords", values)
    }

    #[test]
    fn test_kind_binds_only_its_own_discriminators() {
        let mut bindings = Bindings::new(Columns::schema());
        VariableKind::Output(OutputVariableRecordType::OutputAttributeVariableRecord)
            .bind_values(&mut bindings);
        assert_eq!(bindings.values()[Columns::VariableRecordType.index()], Value::Integer(1));
        assert_eq!(bindings.values()[Columns::OutputVariableRecordType.index()], Value::Integer(0));
        assert_eq!(bindings.values()[Columns::InputVariableRecordType.index()], Value::Null);
    }

    #[test]
    fn test_check_row_rejects_other_concrete_type() {
        let row = row_with(&[
            (Columns::VariableRecordType, Value::Integer(0)),
            (Columns::InputVariableRecordType, Value::Integer(1)),
        ]);
        let continuous = VariableKind::Input(InputVariableRecordType::ContinuousVariableRecord);
        let discrete = VariableKind::Input(InputVariableRecordType::DiscreteVariableRecord);
        assert!(continuous.check_row(&row).is_ok());
        assert!(discrete.check_row(&row).is_err());
    }

    #[test]
    fn test_check_row_rejects_unknown_discriminator() {
        let row = row_with(&[(Columns::VariableRecordType, Value::Integer(7))]);
        let kind = VariableKind::Output(OutputVariableRecordType::OutputAttributeVariableRecord);
        assert!(kind.check_row(&row).is_err());
    }
}
