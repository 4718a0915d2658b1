//! Measure records: the options of a discrete variable.

use std::path::{Path, PathBuf};

use rusqlite::named_params;
use uuid::Uuid;

use crate::analysis::Measure;
use crate::database::ProjectDatabase;
use crate::errors::ProjectResult;
use crate::record::columns::{ObjectRecordColumns, object_record_columns};
use crate::record::join::{JoinRecord, get_join_records_for_right_id};
use crate::record::{
    AnyJoinRecord, AnyObjectRecord, Bindings, ObjectCore, ObjectRecord, Record, RecordFields,
    RowValues, Staged, StagedRecord, insert_new, log_factory_failure, parts_from_row,
    relocate_records, required,
};
use crate::records::{
    DataPointMeasureJoinRecord, DataPointRecord, DiscreteVariableRecord, VariableRecord,
    VariableRecordColumns,
};
use crate::utils::path::relocate_path;

object_record_columns! {
    /// Columns of the `MeasureRecords` table.
    pub enum MeasureRecordColumns in "MeasureRecords" {
        VariableRecordId => "variableRecordId": Integer,
        MeasureVectorIndex => "measureVectorIndex": Integer,
        IsSelected => "isSelected": Integer,
        ScriptPath => "scriptPath": Text,
    }
}

type Columns = MeasureRecordColumns;

#[derive(Debug, Clone, PartialEq)]
pub struct MeasureRecordFields {
    pub variable_record_id: i64,
    pub measure_vector_index: i32,
    pub is_selected: bool,
    pub script_path: Option<PathBuf>,
}

impl RecordFields for MeasureRecordFields {
    type Columns = MeasureRecordColumns;

    fn from_row(row: &RowValues) -> ProjectResult<Self> {
        Ok(Self {
            variable_record_id: row.get_i64(Columns::VariableRecordId)?,
            measure_vector_index: row.get_i32(Columns::MeasureVectorIndex)?,
            is_selected: row.get_bool(Columns::IsSelected)?,
            script_path: row.get_opt_path(Columns::ScriptPath)?,
        })
    }

    fn bind_values(&self, bindings: &mut Bindings<'_>) {
        bindings.bind(Columns::VariableRecordId, self.variable_record_id);
        bindings.bind(Columns::MeasureVectorIndex, self.measure_vector_index);
        bindings.bind(Columns::IsSelected, self.is_selected);
        bindings.bind_path(Columns::ScriptPath, self.script_path.as_deref());
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MeasureRecord {
    core: ObjectCore,
    fields: Staged<MeasureRecordFields>,
}

impl StagedRecord for MeasureRecord {
    type Fields = MeasureRecordFields;

    fn core(&self) -> &ObjectCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ObjectCore {
        &mut self.core
    }

    fn fields(&self) -> &Staged<MeasureRecordFields> {
        &self.fields
    }

    fn fields_mut(&mut self) -> &mut Staged<MeasureRecordFields> {
        &mut self.fields
    }
}

impl MeasureRecord {
    /// Store `measure` as option `index` of `variable`.
    pub fn new(
        measure: &Measure,
        variable: &DiscreteVariableRecord,
        index: i32,
        db: &ProjectDatabase,
    ) -> ProjectResult<Self> {
        let mut record = Self {
            core: ObjectCore::new(&measure.identity),
            fields: Staged::new(MeasureRecordFields {
                variable_record_id: variable.id(),
                measure_vector_index: index,
                is_selected: measure.is_selected,
                script_path: measure.script_path.clone(),
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

    pub fn get_measure_record(id: i64, db: &ProjectDatabase) -> ProjectResult<Option<Self>> {
        db.load_record(Columns::schema(), id, Self::factory_from_query)
    }

    pub fn get_measure_records(db: &ProjectDatabase) -> ProjectResult<Vec<Self>> {
        db.load_records(Columns::schema(), None, named_params! {}, Self::factory_from_query)
    }

    /// The measure whose domain object has handle `handle`.
    pub fn find_by_handle(handle: Uuid, db: &ProjectDatabase) -> ProjectResult<Option<Self>> {
        match db.find_id_by_handle(Columns::schema(), handle)? {
            Some(id) => Self::get_measure_record(id, db),
            None => Ok(None),
        }
    }

    /// Options of the variable `variable_record_id`, in order.
    pub fn get_measure_records_for_variable(
        variable_record_id: i64,
        db: &ProjectDatabase,
    ) -> ProjectResult<Vec<Self>> {
        db.load_records(
            Columns::schema(),
            Some("variableRecordId=:id ORDER BY measureVectorIndex"),
            named_params! { ":id": variable_record_id },
            Self::factory_from_query,
        )
    }

    /// Relocate every measure script path. Returns how many records changed.
    pub fn update_all_path_data(
        db: &ProjectDatabase,
        original_base: &Path,
        new_base: &Path,
    ) -> ProjectResult<usize> {
        relocate_records(Self::get_measure_records(db)?, db, original_base, new_base)
    }

    pub fn variable_record_id(&self) -> i64 {
        self.fields.current().variable_record_id
    }

    pub fn measure_vector_index(&self) -> i32 {
        self.fields.current().measure_vector_index
    }

    pub fn is_selected(&self) -> bool {
        self.fields.current().is_selected
    }

    pub fn script_path(&self) -> Option<&Path> {
        self.fields.current().script_path.as_deref()
    }

    pub fn set_selected(&mut self, is_selected: bool) {
        self.fields.current_mut().is_selected = is_selected;
        self.core.on_change();
    }

    pub fn set_script_path(&mut self, script_path: Option<PathBuf>) {
        self.fields.current_mut().script_path = script_path;
        self.core.on_change();
    }

    pub fn variable_record(&self, db: &ProjectDatabase) -> ProjectResult<VariableRecord> {
        let id = self.variable_record_id();
        required(
            VariableRecordColumns::schema().table(),
            id,
            VariableRecord::get_variable_record(id, db)?,
        )
    }

    /// Joins linking data points to this measure.
    pub fn data_point_measure_join_records(
        &self,
        db: &ProjectDatabase,
    ) -> ProjectResult<Vec<DataPointMeasureJoinRecord>> {
        get_join_records_for_right_id(self.id(), db)
    }

    /// Data points that apply this measure.
    pub fn data_point_records(&self, db: &ProjectDatabase) -> ProjectResult<Vec<DataPointRecord>> {
        self.data_point_measure_join_records(db)?
            .iter()
            .map(|join| join.left_object(db))
            .collect()
    }

    pub fn measure(&self) -> Measure {
        let fields = self.fields.current();
        Measure {
            identity: self.core.identity(),
            is_selected: fields.is_selected,
            script_path: fields.script_path.clone(),
        }
    }
}

impl ObjectRecord for MeasureRecord {
    fn object_core(&self) -> &ObjectCore {
        &self.core
    }

    fn object_core_mut(&mut self) -> &mut ObjectCore {
        &mut self.core
    }

    fn parent(&self, db: &ProjectDatabase) -> ProjectResult<Option<AnyObjectRecord>> {
        Ok(Some(self.variable_record(db)?.into()))
    }

    fn children(&self, _db: &ProjectDatabase) -> ProjectResult<Vec<AnyObjectRecord>> {
        Ok(Vec::new())
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
            .script_path()
            .and_then(|path| relocate_path(path, original_base, new_base));
        match relocated {
            Some(path) => {
                self.set_script_path(Some(path));
                true
            }
            None => false,
        }
    }
}
