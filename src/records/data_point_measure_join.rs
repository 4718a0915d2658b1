//! Links between data points (left) and the measures they apply (right).

use std::sync::OnceLock;

use uuid::Uuid;

use crate::database::ProjectDatabase;
use crate::errors::ProjectResult;
use crate::record::columns::{ObjectRecordColumns, TableSchema};
use crate::record::join::{self, JoinCore, JoinRecord, JoinRecordColumns};
use crate::record::{Bindings, Record, RowValues};
use crate::records::{DataPointRecord, DataPointRecordColumns, MeasureRecord, MeasureRecordColumns};

const TABLE: &str = "DataPointMeasureJoinRecords";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DataPointMeasureJoinRecord {
    core: JoinCore,
}

impl DataPointMeasureJoinRecord {
    /// Link `data_point` to `measure`, or return the existing link.
    pub fn link(
        data_point: &DataPointRecord,
        measure: &MeasureRecord,
        db: &ProjectDatabase,
    ) -> ProjectResult<Self> {
        join::link(data_point, measure, db)
    }

    pub fn data_point_record(&self, db: &ProjectDatabase) -> ProjectResult<DataPointRecord> {
        self.left_object(db)
    }

    pub fn measure_record(&self, db: &ProjectDatabase) -> ProjectResult<MeasureRecord> {
        self.right_object(db)
    }
}

impl Record for DataPointMeasureJoinRecord {
    fn schema(&self) -> &'static TableSchema {
        Self::join_schema()
    }

    fn id(&self) -> i64 {
        self.core.id
    }

    fn handle(&self) -> Uuid {
        self.core.handle
    }

    fn bind_values(&self, bindings: &mut Bindings<'_>) {
        self.core.bind_values(bindings);
    }

    fn set_last_values(&mut self, row: &RowValues) -> ProjectResult<()> {
        self.core = JoinCore::from_row(row)?;
        Ok(())
    }

    fn compare_values(&self, row: &RowValues) -> bool {
        self.core.compare_values(row)
    }

    // Join rows are written once and never edited.
    fn save_last_values(&mut self) {}

    fn revert_to_last_values(&mut self) {}

    fn is_dirty(&self) -> bool {
        false
    }
}

impl JoinRecord for DataPointMeasureJoinRecord {
    type Left = DataPointRecord;
    type Right = MeasureRecord;

    fn join_schema() -> &'static TableSchema {
        static SCHEMA: OnceLock<TableSchema> = OnceLock::new();
        SCHEMA.get_or_init(|| TableSchema::build::<JoinRecordColumns>(TABLE))
    }

    fn from_core(core: JoinCore) -> Self {
        Self { core }
    }

    fn join_core(&self) -> &JoinCore {
        &self.core
    }

    fn left_table() -> &'static str {
        DataPointRecordColumns::schema().table()
    }

    fn right_table() -> &'static str {
        MeasureRecordColumns::schema().table()
    }

    fn load_left(id: i64, db: &ProjectDatabase) -> ProjectResult<Option<DataPointRecord>> {
        DataPointRecord::get_data_point_record(id, db)
    }

    fn load_right(id: i64, db: &ProjectDatabase) -> ProjectResult<Option<MeasureRecord>> {
        MeasureRecord::get_measure_record(id, db)
    }
}
