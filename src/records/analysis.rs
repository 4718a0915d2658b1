//! Analysis records.
//!
//! An analysis owns its algorithm, its seed file and its data points. The
//! problem is only referenced, so several analyses can share one and removing
//! an analysis leaves the problem in place.

use log::{debug, info};
use rusqlite::named_params;

use crate::analysis::Analysis;
use crate::database::ProjectDatabase;
use crate::errors::ProjectResult;
use crate::record::columns::{ObjectRecordColumns, object_record_columns};
use crate::record::{
    AnyObjectRecord, Bindings, ObjectCore, ObjectRecord, Record, RecordFields, RowValues, Staged,
    StagedRecord, insert_new, log_factory_failure, parts_from_row, required,
};
use crate::records::{
    AlgorithmRecord, DataPointRecord, DataPointRecordColumns, FileReferenceRecord,
    FileReferenceRecordColumns, ProblemRecord, ProblemRecordColumns,
};

object_record_columns! {
    /// Columns of the `AnalysisRecords` table.
    pub enum AnalysisRecordColumns in "AnalysisRecords" {
        ProblemRecordId => "problemRecordId": Integer,
        ResultsAreInvalid => "resultsAreInvalid": Integer,
        DataPointsAreInvalid => "dataPointsAreInvalid": Integer,
    }
}

type Columns = AnalysisRecordColumns;

#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisRecordFields {
    pub problem_record_id: i64,
    pub results_are_invalid: bool,
    pub data_points_are_invalid: bool,
}

impl RecordFields for AnalysisRecordFields {
    type Columns = AnalysisRecordColumns;

    fn from_row(row: &RowValues) -> ProjectResult<Self> {
        Ok(Self {
            problem_record_id: row.get_i64(Columns::ProblemRecordId)?,
            results_are_invalid: row.get_bool(Columns::ResultsAreInvalid)?,
            data_points_are_invalid: row.get_bool(Columns::DataPointsAreInvalid)?,
        })
    }

    fn bind_values(&self, bindings: &mut Bindings<'_>) {
        bindings.bind(Columns::ProblemRecordId, self.problem_record_id);
        bindings.bind(Columns::ResultsAreInvalid, self.results_are_invalid);
        bindings.bind(Columns::DataPointsAreInvalid, self.data_points_are_invalid);
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisRecord {
    core: ObjectCore,
    fields: Staged<AnalysisRecordFields>,
}

impl StagedRecord for AnalysisRecord {
    type Fields = AnalysisRecordFields;

    fn core(&self) -> &ObjectCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ObjectCore {
        &mut self.core
    }

    fn fields(&self) -> &Staged<AnalysisRecordFields> {
        &self.fields
    }

    fn fields_mut(&mut self) -> &mut Staged<AnalysisRecordFields> {
        &mut self.fields
    }
}

impl AnalysisRecord {
    /// Store `analysis` and everything it owns.
    ///
    /// A problem already stored under the same handle is reused instead of
    /// being stored a second time.
    pub fn new(analysis: &Analysis, db: &ProjectDatabase) -> ProjectResult<Self> {
        db.transaction(|db| {
            let problem = match ProblemRecord::find_by_handle(analysis.problem.identity.uuid, db)? {
                Some(existing) => {
                    debug!(
                        target: db.log_target(),
                        "Reusing problem record {} for analysis {}",
                        existing.id(),
                        analysis.identity.name
                    );
                    existing
                }
                None => ProblemRecord::new(&analysis.problem, db)?,
            };

            let mut record = Self {
                core: ObjectCore::new(&analysis.identity),
                fields: Staged::new(AnalysisRecordFields {
                    problem_record_id: problem.id(),
                    results_are_invalid: analysis.results_are_invalid,
                    data_points_are_invalid: analysis.data_points_are_invalid,
                }),
            };
            insert_new(&mut record, db)?;

            if let Some(algorithm) = &analysis.algorithm {
                AlgorithmRecord::new(algorithm, &record, db)?;
            }
            FileReferenceRecord::new(&analysis.seed, &record, db)?;
            for data_point in &analysis.data_points {
                DataPointRecord::new(data_point, &record, &problem, db)?;
            }

            info!(
                target: db.log_target(),
                "Stored analysis {} with {} data points",
                analysis.identity.name,
                analysis.data_points.len()
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

    pub fn get_analysis_record(id: i64, db: &ProjectDatabase) -> ProjectResult<Option<Self>> {
        db.load_record(Columns::schema(), id, Self::factory_from_query)
    }

    pub fn get_analysis_records(db: &ProjectDatabase) -> ProjectResult<Vec<Self>> {
        db.load_records(Columns::schema(), None, named_params! {}, Self::factory_from_query)
    }

    pub fn problem_record_id(&self) -> i64 {
        self.fields.current().problem_record_id
    }

    pub fn results_are_invalid(&self) -> bool {
        self.fields.current().results_are_invalid
    }

    pub fn data_points_are_invalid(&self) -> bool {
        self.fields.current().data_points_are_invalid
    }

    pub fn set_results_are_invalid(&mut self, value: bool) {
        self.fields.current_mut().results_are_invalid = value;
        self.core.on_change();
    }

    pub fn set_data_points_are_invalid(&mut self, value: bool) {
        self.fields.current_mut().data_points_are_invalid = value;
        self.core.on_change();
    }

    pub fn problem_record(&self, db: &ProjectDatabase) -> ProjectResult<ProblemRecord> {
        let id = self.problem_record_id();
        required(
            ProblemRecordColumns::schema().table(),
            id,
            ProblemRecord::get_problem_record(id, db)?,
        )
    }

    pub fn algorithm_record(&self, db: &ProjectDatabase) -> ProjectResult<Option<AlgorithmRecord>> {
        AlgorithmRecord::get_algorithm_record_for_analysis(self.id(), db)
    }

    pub fn seed_record(&self, db: &ProjectDatabase) -> ProjectResult<FileReferenceRecord> {
        let seeds = FileReferenceRecord::get_file_reference_records_for(
            self.database_table_name(),
            self.id(),
            db,
        )?;
        required(
            FileReferenceRecordColumns::schema().table(),
            self.id(),
            seeds.into_iter().next(),
        )
    }

    fn data_point_records_where(
        &self,
        condition: &str,
        db: &ProjectDatabase,
    ) -> ProjectResult<Vec<DataPointRecord>> {
        let clause = format!("analysisRecordId=:id{condition} ORDER BY id");
        db.load_records(
            DataPointRecordColumns::schema(),
            Some(&clause),
            named_params! { ":id": self.id() },
            DataPointRecord::factory_from_query,
        )
    }

    pub fn data_point_records(&self, db: &ProjectDatabase) -> ProjectResult<Vec<DataPointRecord>> {
        self.data_point_records_where("", db)
    }

    /// Data points that finished running, successfully or not.
    pub fn complete_data_point_records(&self, db: &ProjectDatabase) -> ProjectResult<Vec<DataPointRecord>> {
        self.data_point_records_where(" AND complete=1", db)
    }

    pub fn failed_data_point_records(&self, db: &ProjectDatabase) -> ProjectResult<Vec<DataPointRecord>> {
        self.data_point_records_where(" AND complete=1 AND failed=1", db)
    }

    pub fn successful_data_point_records(&self, db: &ProjectDatabase) -> ProjectResult<Vec<DataPointRecord>> {
        self.data_point_records_where(" AND complete=1 AND failed=0", db)
    }

    pub fn incomplete_data_point_records(&self, db: &ProjectDatabase) -> ProjectResult<Vec<DataPointRecord>> {
        self.data_point_records_where(" AND complete=0", db)
    }

    /// Clear the results of every data point and reset the algorithm.
    ///
    /// Data points and the algorithm are saved here. This record only has
    /// its flags changed and is left for the caller to save.
    pub fn clear_results(&mut self, db: &ProjectDatabase) -> ProjectResult<()> {
        db.transaction(|db| {
            for mut data_point in self.data_point_records(db)? {
                data_point.clear_results(db)?;
                db.save_record(&mut data_point)?;
            }
            if let Some(mut algorithm) = self.algorithm_record(db)? {
                algorithm.reset();
                db.save_record(&mut algorithm)?;
            }
            Ok(())
        })?;
        self.set_results_are_invalid(false);
        Ok(())
    }

    /// Rebuild the analysis with its problem, algorithm, seed and data points.
    pub fn analysis(&self, db: &ProjectDatabase) -> ProjectResult<Analysis> {
        let fields = self.fields.current();
        let algorithm = match self.algorithm_record(db)? {
            Some(record) => Some(record.algorithm(db)?),
            None => None,
        };
        Ok(Analysis {
            identity: self.core.identity(),
            problem: self.problem_record(db)?.problem(db)?,
            algorithm,
            seed: self.seed_record(db)?.file_reference(db)?,
            data_points: self
                .data_point_records(db)?
                .iter()
                .map(|record| record.data_point(db))
                .collect::<ProjectResult<Vec<_>>>()?,
            results_are_invalid: fields.results_are_invalid,
            data_points_are_invalid: fields.data_points_are_invalid,
        })
    }
}

impl ObjectRecord for AnalysisRecord {
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
        let mut children = Vec::new();
        if let Some(algorithm) = self.algorithm_record(db)? {
            children.push(AnyObjectRecord::from(algorithm));
        }
        children.extend(
            FileReferenceRecord::get_file_reference_records_for(self.database_table_name(), self.id(), db)?
                .into_iter()
                .map(AnyObjectRecord::from),
        );
        children.extend(
            self.data_point_records(db)?
                .into_iter()
                .map(AnyObjectRecord::from),
        );
        Ok(children)
    }

    fn resources(&self, db: &ProjectDatabase) -> ProjectResult<Vec<AnyObjectRecord>> {
        Ok(vec![self.problem_record(db)?.into()])
    }
}
