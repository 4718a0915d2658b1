use super::{OutputVariableRecordType, VariableFields, VariableKind, VariableRecordColumns};
use crate::analysis::OutputAttributeVariable;
use crate::database::ProjectDatabase;
use crate::errors::ProjectResult;
use crate::record::columns::ObjectRecordColumns;
use crate::record::{
    AnyObjectRecord, Bindings, ObjectCore, ObjectRecord, Record, RecordFields, RowValues, Staged,
    StagedRecord, insert_new, log_factory_failure, parts_from_row, required,
};
use crate::records::{ProblemRecord, ProblemRecordColumns};

type Columns = VariableRecordColumns;

const KIND: VariableKind =
    VariableKind::Output(OutputVariableRecordType::OutputAttributeVariableRecord);

#[derive(Debug, Clone, PartialEq)]
pub struct OutputAttributeVariableRecordFields {
    pub variable: VariableFields,
    pub attribute_name: String,
}

impl RecordFields for OutputAttributeVariableRecordFields {
    type Columns = VariableRecordColumns;

    fn from_row(row: &RowValues) -> ProjectResult<Self> {
        KIND.check_row(row)?;
        Ok(Self {
            variable: VariableFields::from_row(row)?,
            attribute_name: row.get_text(Columns::AttributeName)?,
        })
    }

    fn bind_values(&self, bindings: &mut Bindings<'_>) {
        KIND.bind_values(bindings);
        self.variable.bind_values(bindings);
        bindings.bind(Columns::AttributeName, self.attribute_name.clone());
    }
}

/// A response reading a named result attribute.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputAttributeVariableRecord {
    core: ObjectCore,
    fields: Staged<OutputAttributeVariableRecordFields>,
}

impl StagedRecord for OutputAttributeVariableRecord {
    type Fields = OutputAttributeVariableRecordFields;

    fn core(&self) -> &ObjectCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ObjectCore {
        &mut self.core
    }

    fn fields(&self) -> &Staged<OutputAttributeVariableRecordFields> {
        &self.fields
    }

    fn fields_mut(&mut self) -> &mut Staged<OutputAttributeVariableRecordFields> {
        &mut self.fields
    }
}

impl OutputAttributeVariableRecord {
    pub fn new(
        variable: &OutputAttributeVariable,
        problem: &ProblemRecord,
        index: i32,
        coefficient: Option<f64>,
        db: &ProjectDatabase,
    ) -> ProjectResult<Self> {
        let mut record = Self {
            core: ObjectCore::new(&variable.identity),
            fields: Staged::new(OutputAttributeVariableRecordFields {
                variable: VariableFields {
                    problem_record_id: problem.id(),
                    variable_vector_index: index,
                    function_coefficient: coefficient,
                },
                attribute_name: variable.attribute_name.clone(),
            }),
        };
        db.transaction(|db| insert_new(&mut record, db))?;
        Ok(record)
    }

    pub fn from_row(row: &RowValues) -> ProjectResult<Self> {
        let (core, fields) = parts_from_row(row)?;
        Ok(Self { core, fields })
    }

    pub fn factory_from_query(row: &RowValues, db: &ProjectDatabase) -> Option<Self> {
        log_factory_failure(db, Columns::schema().table(), Self::from_row(row))
    }

    pub fn variable_fields(&self) -> &VariableFields {
        &self.fields.current().variable
    }

    pub fn attribute_name(&self) -> &str {
        &self.fields.current().attribute_name
    }

    pub fn set_attribute_name(&mut self, attribute_name: &str) {
        self.fields.current_mut().attribute_name = attribute_name.to_string();
        self.core.on_change();
    }

    pub fn problem_record(&self, db: &ProjectDatabase) -> ProjectResult<ProblemRecord> {
        let id = self.variable_fields().problem_record_id;
        required(
            ProblemRecordColumns::schema().table(),
            id,
            ProblemRecord::get_problem_record(id, db)?,
        )
    }

    pub fn output_attribute_variable(&self) -> OutputAttributeVariable {
        OutputAttributeVariable {
            identity: self.core.identity(),
            attribute_name: self.attribute_name().to_string(),
        }
    }
}

impl ObjectRecord for OutputAttributeVariableRecord {
    fn object_core(&self) -> &ObjectCore {
        &self.core
    }

    fn object_core_mut(&mut self) -> &mut ObjectCore {
        &mut self.core
    }

    fn parent(&self, db: &ProjectDatabase) -> ProjectResult<Option<AnyObjectRecord>> {
        Ok(Some(self.problem_record(db)?.into()))
    }

    fn children(&self, _db: &ProjectDatabase) -> ProjectResult<Vec<AnyObjectRecord>> {
        Ok(Vec::new())
    }
}
