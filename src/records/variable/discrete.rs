use log::debug;

use super::{InputVariableRecordType, VariableFields, VariableKind, VariableRecordColumns};
use crate::analysis::DiscreteVariable;
use crate::database::ProjectDatabase;
use crate::errors::ProjectResult;
use crate::record::columns::ObjectRecordColumns;
use crate::record::{
    AnyObjectRecord, Bindings, ObjectCore, ObjectRecord, Record, RecordFields, RowValues, Staged,
    StagedRecord, insert_new, log_factory_failure, parts_from_row, required, vector_index,
};
use crate::records::{AttributeParent, AttributeRecord, MeasureRecord, ProblemRecord, ProblemRecordColumns};

const KIND: VariableKind = VariableKind::Input(InputVariableRecordType::DiscreteVariableRecord);

#[derive(Debug, Clone, PartialEq)]
pub struct DiscreteVariableRecordFields {
    pub variable: VariableFields,
}

impl RecordFields for DiscreteVariableRecordFields {
    type Columns = VariableRecordColumns;

    fn from_row(row: &RowValues) -> ProjectResult<Self> {
        KIND.check_row(row)?;
        Ok(Self {
            variable: VariableFields::from_row(row)?,
        })
    }

    fn bind_values(&self, bindings: &mut Bindings<'_>) {
        KIND.bind_values(bindings);
        self.variable.bind_values(bindings);
    }
}

/// An input variable that picks one of a list of measures.
#[derive(Debug, Clone, PartialEq)]
pub struct DiscreteVariableRecord {
    core: ObjectCore,
    fields: Staged<DiscreteVariableRecordFields>,
}

impl StagedRecord for DiscreteVariableRecord {
    type Fields = DiscreteVariableRecordFields;

    fn core(&self) -> &ObjectCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ObjectCore {
        &mut self.core
    }

    fn fields(&self) -> &Staged<DiscreteVariableRecordFields> {
        &self.fields
    }

    fn fields_mut(&mut self) -> &mut Staged<DiscreteVariableRecordFields> {
        &mut self.fields
    }
}

impl DiscreteVariableRecord {
    /// Store `variable` as input `index` of `problem`, then its measures in
    /// list order.
    pub fn new(
        variable: &DiscreteVariable,
        problem: &ProblemRecord,
        index: i32,
        db: &ProjectDatabase,
    ) -> ProjectResult<Self> {
        db.transaction(|db| {
            let mut record = Self {
                core: ObjectCore::new(&variable.identity),
                fields: Staged::new(DiscreteVariableRecordFields {
                    variable: VariableFields {
                        problem_record_id: problem.id(),
                        variable_vector_index: index,
                        function_coefficient: None,
                    },
                }),
            };
            insert_new(&mut record, db)?;
            for (position, measure) in variable.measures.iter().enumerate() {
                MeasureRecord::new(measure, &record, vector_index(position)?, db)?;
            }
            debug!(
                target: db.log_target(),
                "Stored discrete variable {} with {} measures",
                record.name(),
                variable.measures.len()
            );
            Ok(record)
        })
    }

    pub fn from_row(row: &RowValues) -> ProjectResult<Self> {
        let (core, fields) = parts_from_row(row)?;
        Ok(Self { core, fields })
    }

    pub fn factory_from_query(row: &RowValues, db: &ProjectDatabase) -> Option<Self> {
        log_factory_failure(db, VariableRecordColumns::schema().table(), Self::from_row(row))
    }

    pub fn variable_fields(&self) -> &VariableFields {
        &self.fields.current().variable
    }

    /// Measures of this variable, in order.
    pub fn measure_records(&self, db: &ProjectDatabase) -> ProjectResult<Vec<MeasureRecord>> {
        MeasureRecord::get_measure_records_for_variable(self.id(), db)
    }

    pub fn attribute_records(&self, db: &ProjectDatabase) -> ProjectResult<Vec<AttributeRecord>> {
        AttributeRecord::get_attribute_records_for(AttributeParent::Variable(self.id()), db)
    }

    pub fn problem_record(&self, db: &ProjectDatabase) -> ProjectResult<ProblemRecord> {
        let id = self.variable_fields().problem_record_id;
        required(
            ProblemRecordColumns::schema().table(),
            id,
            ProblemRecord::get_problem_record(id, db)?,
        )
    }

    pub fn discrete_variable(&self, db: &ProjectDatabase) -> ProjectResult<DiscreteVariable> {
        Ok(DiscreteVariable {
            identity: self.core.identity(),
            measures: self
                .measure_records(db)?
                .iter()
                .map(MeasureRecord::measure)
                .collect(),
        })
    }
}

impl ObjectRecord for DiscreteVariableRecord {
    fn object_core(&self) -> &ObjectCore {
        &self.core
    }

    fn object_core_mut(&mut self) -> &mut ObjectCore {
        &mut self.core
    }

    fn parent(&self, db: &ProjectDatabase) -> ProjectResult<Option<AnyObjectRecord>> {
        Ok(Some(self.problem_record(db)?.into()))
    }

    fn children(&self, db: &ProjectDatabase) -> ProjectResult<Vec<AnyObjectRecord>> {
        let mut children: Vec<AnyObjectRecord> = self
            .measure_records(db)?
            .into_iter()
            .map(AnyObjectRecord::from)
            .collect();
        children.extend(self.attribute_records(db)?.into_iter().map(AnyObjectRecord::from));
        Ok(children)
    }
}
