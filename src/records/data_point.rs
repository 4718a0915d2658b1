//! Data point records.
//!
//! A data point fixes one measure per discrete variable of its problem. The
//! chosen measures are linked through `DataPointMeasureJoinRecords`, with the
//! data point on the left.

use std::path::{Path, PathBuf};

use log::{debug, warn};
use rusqlite::named_params;

use crate::analysis::DataPoint;
use crate::database::ProjectDatabase;
use crate::errors::ProjectResult;
use crate::record::columns::{ObjectRecordColumns, object_record_columns};
use crate::record::join::{JoinRecord, get_join_records_for_left_id};
use crate::record::{
    AnyJoinRecord, AnyObjectRecord, Bindings, ObjectCore, ObjectRecord, Record, RecordFields,
    RowValues, Staged, StagedRecord, insert_new, log_factory_failure, parts_from_row,
    relocate_records, required,
};
use crate::records::{
    AnalysisRecord, AnalysisRecordColumns, AttributeParent, AttributeRecord,
    DataPointMeasureJoinRecord, FileReferenceRecord, MeasureRecord, ProblemRecord,
    ProblemRecordColumns,
};
use crate::utils::path::relocate_path;

object_record_columns! {
    /// Columns of the `DataPointRecords` table.
    pub enum DataPointRecordColumns in "DataPointRecords" {
        AnalysisRecordId => "analysisRecordId": Integer,
        ProblemRecordId => "problemRecordId": Integer,
        Complete => "complete": Integer,
        Failed => "failed": Integer,
        Directory => "directory": Text,
    }
}

type Columns = DataPointRecordColumns;

#[derive(Debug, Clone, PartialEq)]
pub struct DataPointRecordFields {
    pub analysis_record_id: i64,
    pub problem_record_id: i64,
    pub complete: bool,
    pub failed: bool,
    pub directory: Option<PathBuf>,
}

impl RecordFields for DataPointRecordFields {
    type Columns = DataPointRecordColumns;

    fn from_row(row: &RowValues) -> ProjectResult<Self> {
        Ok(Self {
            analysis_record_id: row.get_i64(Columns::AnalysisRecordId)?,
            problem_record_id: row.get_i64(Columns::ProblemRecordId)?,
            complete: row.get_bool(Columns::Complete)?,
            failed: row.get_bool(Columns::Failed)?,
            directory: row.get_opt_path(Columns::Directory)?,
        })
    }

    fn bind_values(&self, bindings: &mut Bindings<'_>) {
        bindings.bind(Columns::AnalysisRecordId, self.analysis_record_id);
        bindings.bind(Columns::ProblemRecordId, self.problem_record_id);
        bindings.bind(Columns::Complete, self.complete);
        bindings.bind(Columns::Failed, self.failed);
        bindings.bind_path(Columns::Directory, self.directory.as_deref());
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DataPointRecord {
    core: ObjectCore,
    fields: Staged<DataPointRecordFields>,
}

impl StagedRecord for DataPointRecord {
    type Fields = DataPointRecordFields;

    fn core(&self) -> &ObjectCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ObjectCore {
        &mut self.core
    }

    fn fields(&self) -> &Staged<DataPointRecordFields> {
        &self.fields
    }

    fn fields_mut(&mut self) -> &mut Staged<DataPointRecordFields> {
        &mut self.fields
    }
}

impl DataPointRecord {
    /// Store `data_point` under `analysis`, with its outputs, and link the
    /// measures it selects.
    ///
    /// Selected measures are looked up by handle. A handle with no stored
    /// measure is logged and skipped.
    pub fn new(
        data_point: &DataPoint,
        analysis: &AnalysisRecord,
        problem: &ProblemRecord,
        db: &ProjectDatabase,
    ) -> ProjectResult<Self> {
        db.transaction(|db| {
            let mut record = Self {
                core: ObjectCore::new(&data_point.identity),
                fields: Staged::new(DataPointRecordFields {
                    analysis_record_id: analysis.id(),
                    problem_record_id: problem.id(),
                    complete: data_point.complete,
                    failed: data_point.failed,
                    directory: data_point.directory.clone(),
                }),
            };
            insert_new(&mut record, db)?;

            AttributeRecord::new_all(&data_point.output_attributes, AttributeParent::from(&record), db)?;
            for file in &data_point.output_files {
                FileReferenceRecord::new(file, &record, db)?;
            }

            for handle in &data_point.selected_measures {
                match MeasureRecord::find_by_handle(*handle, db)? {
                    Some(measure) => {
                        DataPointMeasureJoinRecord::link(&record, &measure, db)?;
                    }
                    None => warn!(
                        target: db.log_target(),
                        "Data point {} selects unknown measure {handle}",
                        data_point.identity.name
                    ),
                }
            }
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

    pub fn get_data_point_record(id: i64, db: &ProjectDatabase) -> ProjectResult<Option<Self>> {
        db.load_record(Columns::schema(), id, Self::factory_from_query)
    }

    pub fn get_data_point_records(db: &ProjectDatabase) -> ProjectResult<Vec<Self>> {
        db.load_records(Columns::schema(), None, named_params! {}, Self::factory_from_query)
    }

    /// Relocate every data point directory. Returns how many records changed.
    pub fn update_all_path_data(
        db: &ProjectDatabase,
        original_base: &Path,
        new_base: &Path,
    ) -> ProjectResult<usize> {
        relocate_records(Self::get_data_point_records(db)?, db, original_base, new_base)
    }

    pub fn analysis_record_id(&self) -> i64 {
        self.fields.current().analysis_record_id
    }

    pub fn problem_record_id(&self) -> i64 {
        self.fields.current().problem_record_id
    }

    pub fn is_complete(&self) -> bool {
        self.fields.current().complete
    }

    pub fn failed(&self) -> bool {
        self.fields.current().failed
    }

    pub fn directory(&self) -> Option<&Path> {
        self.fields.current().directory.as_deref()
    }

    pub fn mark_complete(&mut self) {
        self.fields.current_mut().complete = true;
        self.core.on_change();
    }

    pub fn mark_failed(&mut self) {
        let fields = self.fields.current_mut();
        fields.complete = true;
        fields.failed = true;
        self.core.on_change();
    }

    pub fn set_directory(&mut self, directory: Option<PathBuf>) {
        self.fields.current_mut().directory = directory;
        self.core.on_change();
    }

    pub fn analysis_record(&self, db: &ProjectDatabase) -> ProjectResult<AnalysisRecord> {
        let id = self.analysis_record_id();
        required(
            AnalysisRecordColumns::schema().table(),
            id,
            AnalysisRecord::get_analysis_record(id, db)?,
        )
    }

    pub fn problem_record(&self, db: &ProjectDatabase) -> ProjectResult<ProblemRecord> {
        let id = self.problem_record_id();
        required(
            ProblemRecordColumns::schema().table(),
            id,
            ProblemRecord::get_problem_record(id, db)?,
        )
    }

    pub fn data_point_measure_join_records(
        &self,
        db: &ProjectDatabase,
    ) -> ProjectResult<Vec<DataPointMeasureJoinRecord>> {
        get_join_records_for_left_id(self.id(), db)
    }

    /// Measures this data point applies, in link order.
    pub fn selected_measure_records(&self, db: &ProjectDatabase) -> ProjectResult<Vec<MeasureRecord>> {
        self.data_point_measure_join_records(db)?
            .iter()
            .map(|join| join.right_object(db))
            .collect()
    }

    pub fn output_attribute_records(&self, db: &ProjectDatabase) -> ProjectResult<Vec<AttributeRecord>> {
        AttributeRecord::get_attribute_records_for(AttributeParent::from(self), db)
    }

    pub fn output_file_reference_records(
        &self,
        db: &ProjectDatabase,
    ) -> ProjectResult<Vec<FileReferenceRecord>> {
        FileReferenceRecord::get_file_reference_records_for(self.database_table_name(), self.id(), db)
    }

    /// Remove the output attributes and files and reset the run state.
    ///
    /// The removals are stored at once. The reset only touches the working
    /// copy, so the caller saves the record afterwards.
    pub fn clear_results(&mut self, db: &ProjectDatabase) -> ProjectResult<()> {
        let removed = db.transaction(|db| {
            let mut removed = Vec::new();
            for attribute in self.output_attribute_records(db)? {
                removed.extend(attribute.remove(db)?);
            }
            for file in self.output_file_reference_records(db)? {
                removed.extend(file.remove(db)?);
            }
            Ok(removed)
        })?;
        debug!(
            target: db.log_target(),
            "Cleared results of data point {} ({} rows removed)",
            self.id(),
            removed.len()
        );

        let fields = self.fields.current_mut();
        fields.complete = false;
        fields.failed = false;
        fields.directory = None;
        self.core.on_change();
        Ok(())
    }

    /// Rebuild the data point with its selections and outputs.
    pub fn data_point(&self, db: &ProjectDatabase) -> ProjectResult<DataPoint> {
        let fields = self.fields.current();
        Ok(DataPoint {
            identity: self.core.identity(),
            complete: fields.complete,
            failed: fields.failed,
            directory: fields.directory.clone(),
            selected_measures: self
                .data_point_measure_join_records(db)?
                .iter()
                .map(|join| join.right_handle())
                .collect(),
            output_attributes: AttributeRecord::attributes_for(AttributeParent::from(self), db)?,
            output_files: self
                .output_file_reference_records(db)?
                .iter()
                .map(|record| record.file_reference(db))
                .collect::<ProjectResult<Vec<_>>>()?,
        })
    }
}

impl ObjectRecord for DataPointRecord {
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
        let mut children: Vec<AnyObjectRecord> = self
            .output_attribute_records(db)?
            .into_iter()
            .map(AnyObjectRecord::from)
            .collect();
        children.extend(
            self.output_file_reference_records(db)?
                .into_iter()
                .map(AnyObjectRecord::from),
        );
        Ok(children)
    }

    fn resources(&self, db: &ProjectDatabase) -> ProjectResult<Vec<AnyObjectRecord>> {
        Ok(vec![self.problem_record(db)?.into()])
    }

    fn join_records(&self, db: &ProjectDatabase) -> ProjectResult<Vec<AnyJoinRecord>> {
        Ok(self
            .data_point_measure_join_records(db)?
            .into_iter()
            .map(AnyJoinRecord::from)
            .collect())
    }

    fn update_path_data(&mut self, original_base: &Path, new_base: &Path) -> bool {
        let relocated = self
            .directory()
            .and_then(|directory| relocate_path(directory, original_base, new_base));
        match relocated {
            Some(directory) => {
                self.set_directory(Some(directory));
                true
            }
            None => false,
        }
    }
}
