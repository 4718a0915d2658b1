//! Problem records.

use log::debug;
use rusqlite::named_params;
use uuid::Uuid;

use crate::analysis::{Problem, Response, Variable};
use crate::database::ProjectDatabase;
use crate::errors::{ProjectError, ProjectResult};
use crate::record::columns::{ObjectRecordColumns, object_record_columns};
use crate::record::{
    AnyObjectRecord, Bindings, ObjectCore, ObjectRecord, RecordFields, RowValues, Staged,
    StagedRecord, insert_new, log_factory_failure, parts_from_row, vector_index,
};
use crate::records::{
    InputVariableRecord, OutputVariableRecord, VariableRecord, VariableRecordType,
};

object_record_columns! {
    /// Columns of the `ProblemRecords` table.
    pub enum ProblemRecordColumns in "ProblemRecords" {}
}

type Columns = ProblemRecordColumns;

/// Problems carry only the base object columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ProblemRecordFields;

impl RecordFields for ProblemRecordFields {
    type Columns = ProblemRecordColumns;

    fn from_row(_row: &RowValues) -> ProjectResult<Self> {
        Ok(Self)
    }

    fn bind_values(&self, _bindings: &mut Bindings<'_>) {}
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProblemRecord {
    core: ObjectCore,
    fields: Staged<ProblemRecordFields>,
}

impl StagedRecord for ProblemRecord {
    type Fields = ProblemRecordFields;

    fn core(&self) -> &ObjectCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ObjectCore {
        &mut self.core
    }

    fn fields(&self) -> &Staged<ProblemRecordFields> {
        &self.fields
    }

    fn fields_mut(&mut self) -> &mut Staged<ProblemRecordFields> {
        &mut self.fields
    }
}

impl ProblemRecord {
    /// Store `problem` with its input variables and responses, each list in
    /// order.
    pub fn new(problem: &Problem, db: &ProjectDatabase) -> ProjectResult<Self> {
        db.transaction(|db| {
            let mut record = Self {
                core: ObjectCore::new(&problem.identity),
                fields: Staged::new(ProblemRecordFields),
            };
            insert_new(&mut record, db)?;

            for (index, variable) in problem.variables.iter().enumerate() {
                InputVariableRecord::factory_from_variable(variable, &record, vector_index(index)?, db)?;
            }
            for (index, response) in problem.responses.iter().enumerate() {
                OutputVariableRecord::factory_from_variable(
                    &response.variable,
                    &record,
                    vector_index(index)?,
                    response.coefficient,
                    db,
                )?;
            }
            debug!(
                target: db.log_target(),
                "Stored problem {} with {} variables and {} responses",
                problem.identity.name,
                problem.variables.len(),
                problem.responses.len()
            );
            Ok(record)
        })
    }

    pub fn from_row(row: &RowValues) -> ProjectResult<Self> {
        let (core, fields) = parts_from_row(row)?;
        Ok(Self { core, fields })
    }

    pub fn factory_from_query(row: &RowValues, db: &ProjectDatabase) -> Option<Self> {
        log_factory_failure(db, Columns::schema().table(), Self::from_row(row))
    }

    pub fn get_problem_record(id: i64, db: &ProjectDatabase) -> ProjectResult<Option<Self>> {
        db.load_record(Columns::schema(), id, Self::factory_from_query)
    }

    pub fn get_problem_records(db: &ProjectDatabase) -> ProjectResult<Vec<Self>> {
        db.load_records(Columns::schema(), None, named_params! {}, Self::factory_from_query)
    }

    pub fn find_by_handle(handle: Uuid, db: &ProjectDatabase) -> ProjectResult<Option<Self>> {
        match db.find_id_by_handle(Columns::schema(), handle)? {
            Some(id) => Self::get_problem_record(id, db),
            None => Ok(None),
        }
    }

    /// Input variables, ordered by position.
    pub fn input_variable_records(&self, db: &ProjectDatabase) -> ProjectResult<Vec<InputVariableRecord>> {
        Ok(VariableRecord::get_variable_records_for_problem(
            self.core.id(),
            VariableRecordType::InputVariableRecord,
            db,
        )?
        .into_iter()
        .filter_map(|record| match record {
            VariableRecord::Input(input) => Some(input),
            VariableRecord::Output(_) => None,
        })
        .collect())
    }

    /// Responses, ordered by position.
    pub fn response_records(&self, db: &ProjectDatabase) -> ProjectResult<Vec<OutputVariableRecord>> {
        Ok(VariableRecord::get_variable_records_for_problem(
            self.core.id(),
            VariableRecordType::OutputVariableRecord,
            db,
        )?
        .into_iter()
        .filter_map(|record| match record {
            VariableRecord::Output(output) => Some(output),
            VariableRecord::Input(_) => None,
        })
        .collect())
    }

    /// Rebuild the problem with its variables and responses.
    pub fn problem(&self, db: &ProjectDatabase) -> ProjectResult<Problem> {
        let variables = self
            .input_variable_records(db)?
            .iter()
            .map(|record| record.input_variable(db))
            .collect::<ProjectResult<Vec<_>>>()?;
        let responses = self
            .response_records(db)?
            .iter()
            .map(|record| Response {
                variable: record.output_variable(),
                coefficient: record.variable_fields().function_coefficient,
            })
            .collect();
        Ok(Problem {
            identity: self.core.identity(),
            variables,
            responses,
        })
    }

    /// The stored variable with handle `handle`, rebuilt.
    pub fn variable(&self, handle: Uuid, db: &ProjectDatabase) -> ProjectResult<Variable> {
        let inputs = self.input_variable_records(db)?.into_iter().map(VariableRecord::from);
        let outputs = self.response_records(db)?.into_iter().map(VariableRecord::from);
        let record = inputs
            .chain(outputs)
            .find(|record| record.object_core().handle() == handle)
            .ok_or_else(|| ProjectError::Other(format!("problem {} has no variable {handle}", self.core.id())))?;
        record.variable(db)
    }
}

impl ObjectRecord for ProblemRecord {
    fn object_core(&self) -> &ObjectCore {
        &self.core
    }

    fn object_core_mut(&mut self) -> &mut ObjectCore {
        &mut self.core
    }

    fn parent(&self, _db: &ProjectDatabase) -> ProjectResult<Option<AnyObjectRecord>> {
        Ok(None)
    }

    fn children(&self, db: &ProjectDatabase) -> ProjectResult<Vec<AnyObjectRecord>> {
        let inputs = self.input_variable_records(db)?.into_iter().map(VariableRecord::from);
        let outputs = self.response_records(db)?.into_iter().map(VariableRecord::from);
        Ok(inputs.chain(outputs).map(AnyObjectRecord::from).collect())
    }
}
