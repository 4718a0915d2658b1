//! Algorithm records: the search strategy of an analysis and its options.

use rusqlite::named_params;

use crate::analysis::Algorithm;
use crate::database::ProjectDatabase;
use crate::errors::ProjectResult;
use crate::record::columns::{ObjectRecordColumns, object_record_columns};
use crate::record::{
    AnyObjectRecord, Bindings, ObjectCore, ObjectRecord, Record, RecordFields, RowValues, Staged,
    StagedRecord, insert_new, log_factory_failure, parts_from_row, required,
};
use crate::records::{AnalysisRecord, AnalysisRecordColumns, AttributeParent, AttributeRecord};

object_record_columns! {
    /// Columns of the `AlgorithmRecords` table.
    pub enum AlgorithmRecordColumns in "AlgorithmRecords" {
        AnalysisRecordId => "analysisRecordId": Integer,
        Iter => "iter": Integer,
        Complete => "complete": Integer,
        Failed => "failed": Integer,
    }
}

type Columns = AlgorithmRecordColumns;

#[derive(Debug, Clone, PartialEq)]
pub struct AlgorithmRecordFields {
    pub analysis_record_id: i64,
    pub iter: i32,
    pub complete: bool,
    pub failed: bool,
}

impl RecordFields for AlgorithmRecordFields {
    type Columns = AlgorithmRecordColumns;

    fn from_row(row: &RowValues) -> ProjectResult<Self> {
        Ok(Self {
            analysis_record_id: row.get_i64(Columns::AnalysisRecordId)?,
            iter: row.get_i32(Columns::Iter)?,
            complete: row.get_bool(Columns::Complete)?,
            failed: row.get_bool(Columns::Failed)?,
        })
    }

    fn bind_values(&self, bindings: &mut Bindings<'_>) {
        bindings.bind(Columns::AnalysisRecordId, self.analysis_record_id);
        bindings.bind(Columns::Iter, self.iter);
        bindings.bind(Columns::Complete, self.complete);
        bindings.bind(Columns::Failed, self.failed);
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AlgorithmRecord {
    core: ObjectCore,
    fields: Staged<AlgorithmRecordFields>,
}

impl StagedRecord for AlgorithmRecord {
    type Fields = AlgorithmRecordFields;

    fn core(&self) -> &ObjectCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ObjectCore {
        &mut self.core
    }

    fn fields(&self) -> &Staged<AlgorithmRecordFields> {
        &self.fields
    }

    fn fields_mut(&mut self) -> &mut Staged<AlgorithmRecordFields> {
        &mut self.fields
    }
}

impl AlgorithmRecord {
    /// Store `algorithm` under `analysis`, with its options.
    pub fn new(algorithm: &Algorithm, analysis: &AnalysisRecord, db: &ProjectDatabase) -> ProjectResult<Self> {
        db.transaction(|db| {
            let mut record = Self {
                core: ObjectCore::new(&algorithm.identity),
                fields: Staged::new(AlgorithmRecordFields {
                    analysis_record_id: analysis.id(),
                    iter: algorithm.iter,
                    complete: algorithm.complete,
                    failed: algorithm.failed,
                }),
            };
            insert_new(&mut record, db)?;
            AttributeRecord::new_all(&algorithm.options, AttributeParent::from(&record), db)?;
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

    pub fn get_algorithm_record(id: i64, db: &ProjectDatabase) -> ProjectResult<Option<Self>> {
        db.load_record(Columns::schema(), id, Self::factory_from_query)
    }

    pub fn get_algorithm_records(db: &ProjectDatabase) -> ProjectResult<Vec<Self>> {
        db.load_records(Columns::schema(), None, named_params! {}, Self::factory_from_query)
    }

    /// The algorithm of the analysis `analysis_record_id`, if it has one.
    pub fn get_algorithm_record_for_analysis(
        analysis_record_id: i64,
        db: &ProjectDatabase,
    ) -> ProjectResult<Option<Self>> {
        let records = db.load_records(
            Columns::schema(),
            Some("analysisRecordId=:id ORDER BY id"),
            named_params! { ":id": analysis_record_id },
            Self::factory_from_query,
        )?;
        Ok(records.into_iter().next())
    }

    pub fn analysis_record_id(&self) -> i64 {
        self.fields.current().analysis_record_id
    }

    pub fn iter(&self) -> i32 {
        self.fields.current().iter
    }

    pub fn is_complete(&self) -> bool {
        self.fields.current().complete
    }

    pub fn failed(&self) -> bool {
        self.fields.current().failed
    }

    pub fn set_iter(&mut self, iter: i32) {
        self.fields.current_mut().iter = iter;
        self.core.on_change();
    }

    pub fn mark_complete(&mut self) {
        self.fields.current_mut().complete = true;
        self.core.on_change();
    }

    pub fn mark_failed(&mut self) {
        self.fields.current_mut().failed = true;
        self.core.on_change();
    }

    /// Clear the completion and failure flags and rewind to iteration zero.
    pub fn reset(&mut self) {
        let fields = self.fields.current_mut();
        fields.iter = 0;
        fields.complete = false;
        fields.failed = false;
        self.core.on_change();
    }

    pub fn option_records(&self, db: &ProjectDatabase) -> ProjectResult<Vec<AttributeRecord>> {
        AttributeRecord::get_attribute_records_for(AttributeParent::from(self), db)
    }

    pub fn analysis_record(&self, db: &ProjectDatabase) -> ProjectResult<AnalysisRecord> {
        let id = self.analysis_record_id();
        required(
            AnalysisRecordColumns::schema().table(),
            id,
            AnalysisRecord::get_analysis_record(id, db)?,
        )
    }

    pub fn algorithm(&self, db: &ProjectDatabase) -> ProjectResult<Algorithm> {
        let fields = self.fields.current();
        Ok(Algorithm {
            identity: self.core.identity(),
            iter: fields.iter,
            complete: fields.complete,
            failed: fields.failed,
            options: AttributeRecord::attributes_for(AttributeParent::from(self), db)?,
        })
    }
}

impl ObjectRecord for AlgorithmRecord {
    fn object_core(&self) -> &ObjectCore {
        &self.core
    }

    fn object_core_mut(&mut self) -> &mut ObjectCore {
        &mut self.core
    }

    fn parent(&self, db: &ProjectDatabase) -> ProjectResult<Option<AnyObjectRecord>> {
        Ok(Some(self.analysis_record(db)?.into()))
    }

    fn children(&self, db: &ProjectDatabase) -> ProjectResult<Vec<AnyObjectRecord>> {
        Ok(self
            .option_records(db)?
            .into_iter()
            .map(AnyObjectRecord::from)
            .collect())
    }
}
