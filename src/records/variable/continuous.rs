use super::{InputVariableRecordType, VariableFields, VariableKind, VariableRecordColumns};
use crate::analysis::ContinuousVariable;
use crate::database::ProjectDatabase;
use crate::errors::ProjectResult;
use crate::record::columns::ObjectRecordColumns;
use crate::record::{
    AnyObjectRecord, Bindings, ObjectCore, ObjectRecord, Record, RecordFields, RowValues, Staged,
    StagedRecord, insert_new, log_factory_failure, parts_from_row, required,
};
use crate::records::{AttributeParent, AttributeRecord, ProblemRecord, ProblemRecordColumns};

type Columns = VariableRecordColumns;

const KIND: VariableKind = VariableKind::Input(InputVariableRecordType::ContinuousVariableRecord);

#[derive(Debug, Clone, PartialEq)]
pub struct ContinuousVariableRecordFields {
    pub variable: VariableFields,
    pub minimum: Option<f64>,
    pub maximum: Option<f64>,
    pub increment: Option<f64>,
    pub n_steps: Option<i32>,
}

impl RecordFields for ContinuousVariableRecordFields {
    type Columns = VariableRecordColumns;

    fn from_row(row: &RowValues) -> ProjectResult<Self> {
        KIND.check_row(row)?;
        Ok(Self {
            variable: VariableFields::from_row(row)?,
            minimum: row.get_opt_f64(Columns::Minimum)?,
            maximum: row.get_opt_f64(Columns::Maximum)?,
            increment: row.get_opt_f64(Columns::Increment)?,
            n_steps: row.get_opt_i32(Columns::NSteps)?,
        })
    }

    fn bind_values(&self, bindings: &mut Bindings<'_>) {
        KIND.bind_values(bindings);
        self.variable.bind_values(bindings);
        bindings.bind_f64(Columns::Minimum, self.minimum);
        bindings.bind_f64(Columns::Maximum, self.maximum);
        bindings.bind_f64(Columns::Increment, self.increment);
        bindings.bind(Columns::NSteps, self.n_steps);
    }
}

/// An input variable ranging over real values, with optional uncertainty
/// attributes.
#[derive(Debug, Clone, PartialEq)]
pub struct ContinuousVariableRecord {
    core: ObjectCore,
    fields: Staged<ContinuousVariableRecordFields>,
}

impl StagedRecord for ContinuousVariableRecord {
    type Fields = ContinuousVariableRecordFields;

    fn core(&self) -> &ObjectCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ObjectCore {
        &mut self.core
    }

    fn fields(&self) -> &Staged<ContinuousVariableRecordFields> {
        &self.fields
    }

    fn fields_mut(&mut self) -> &mut Staged<ContinuousVariableRecordFields> {
        &mut self.fields
    }
}

impl ContinuousVariableRecord {
    pub fn new(
        variable: &ContinuousVariable,
        problem: &ProblemRecord,
        index: i32,
        db: &ProjectDatabase,
    ) -> ProjectResult<Self> {
        db.transaction(|db| {
            let mut record = Self {
                core: ObjectCore::new(&variable.identity),
                fields: Staged::new(ContinuousVariableRecordFields {
                    variable: VariableFields {
                        problem_record_id: problem.id(),
                        variable_vector_index: index,
                        function_coefficient: None,
                    },
                    minimum: variable.minimum,
                    maximum: variable.maximum,
                    increment: variable.increment,
                    n_steps: variable.n_steps,
                }),
            };
            insert_new(&mut record, db)?;
            AttributeRecord::new_all(&variable.attributes, AttributeParent::Variable(record.id()), db)?;
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

    pub fn variable_fields(&self) -> &VariableFields {
        &self.fields.current().variable
    }

    pub fn minimum(&self) -> Option<f64> {
        self.fields.current().minimum
    }

    pub fn maximum(&self) -> Option<f64> {
        self.fields.current().maximum
    }

    pub fn increment(&self) -> Option<f64> {
        self.fields.current().increment
    }

    pub fn n_steps(&self) -> Option<i32> {
        self.fields.current().n_steps
    }

    pub fn set_bounds(&mut self, minimum: Option<f64>, maximum: Option<f64>) {
        let fields = self.fields.current_mut();
        fields.minimum = minimum;
        fields.maximum = maximum;
        self.core.on_change();
    }

    pub fn set_increment(&mut self, increment: Option<f64>) {
        self.fields.current_mut().increment = increment;
        self.core.on_change();
    }

    pub fn set_n_steps(&mut self, n_steps: Option<i32>) {
        self.fields.current_mut().n_steps = n_steps;
        self.core.on_change();
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

    pub fn continuous_variable(&self, db: &ProjectDatabase) -> ProjectResult<ContinuousVariable> {
        let fields = self.fields.current();
        Ok(ContinuousVariable {
            identity: self.core.identity(),
            minimum: fields.minimum,
            maximum: fields.maximum,
            increment: fields.increment,
            n_steps: fields.n_steps,
            attributes: AttributeRecord::attributes_for(AttributeParent::Variable(self.id()), db)?,
        })
    }
}

impl ObjectRecord for ContinuousVariableRecord {
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
        Ok(self
            .attribute_records(db)?
            .into_iter()
            .map(AnyObjectRecord::from)
            .collect())
    }
}
