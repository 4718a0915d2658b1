//! File reference records.
//!
//! A file reference can belong to any object record. The owner is stored as
//! a table name plus row id rather than a dedicated column per owner type.

use std::path::{Path, PathBuf};

use log::warn;
use rusqlite::named_params;

use crate::analysis::{FileReference, FileReferenceType};
use crate::database::ProjectDatabase;
use crate::errors::ProjectResult;
use crate::record::columns::{ObjectRecordColumns, object_record_columns};
use crate::record::{
    AnyObjectRecord, Bindings, ObjectCore, ObjectRecord, Record, RecordFields, RowValues, Staged,
    StagedRecord, insert_new, log_factory_failure, parts_from_row, relocate_records,
};
use crate::records::{
    AnalysisRecord, AnalysisRecordColumns, AttributeParent, AttributeRecord, DataPointRecord,
    DataPointRecordColumns,
};
use crate::utils::path::relocate_path;

object_record_columns! {
    /// Columns of the `FileReferenceRecords` table.
    pub enum FileReferenceRecordColumns in "FileReferenceRecords" {
        ParentDatabaseTableName => "parentDatabaseTableName": Text,
        ParentRecordId => "parentRecordId": Integer,
        FileReferenceType => "fileReferenceType": Text,
        Path => "path": Text,
        ChecksumCreate => "checksumCreate": Text,
        ChecksumLast => "checksumLast": Text,
    }
}

type Columns = FileReferenceRecordColumns;

#[derive(Debug, Clone, PartialEq)]
pub struct FileReferenceRecordFields {
    pub parent_table: String,
    pub parent_id: i64,
    pub file_type: FileReferenceType,
    pub path: PathBuf,
    pub checksum_create: String,
    pub checksum_last: String,
}

impl RecordFields for FileReferenceRecordFields {
    type Columns = FileReferenceRecordColumns;

    fn from_row(row: &RowValues) -> ProjectResult<Self> {
        Ok(Self {
            parent_table: row.get_text(Columns::ParentDatabaseTableName)?,
            parent_id: row.get_i64(Columns::ParentRecordId)?,
            file_type: row.get_parsed(Columns::FileReferenceType)?,
            path: row.get_path(Columns::Path)?,
            checksum_create: row.get_text(Columns::ChecksumCreate)?,
            checksum_last: row.get_text(Columns::ChecksumLast)?,
        })
    }

    fn bind_values(&self, bindings: &mut Bindings<'_>) {
        bindings.bind(Columns::ParentDatabaseTableName, self.parent_table.clone());
        bindings.bind(Columns::ParentRecordId, self.parent_id);
        bindings.bind(Columns::FileReferenceType, self.file_type.to_string());
        bindings.bind_path(Columns::Path, Some(self.path.as_path()));
        bindings.bind(Columns::ChecksumCreate, self.checksum_create.clone());
        bindings.bind(Columns::ChecksumLast, self.checksum_last.clone());
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FileReferenceRecord {
    core: ObjectCore,
    fields: Staged<FileReferenceRecordFields>,
}

impl StagedRecord for FileReferenceRecord {
    type Fields = FileReferenceRecordFields;

    fn core(&self) -> &ObjectCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ObjectCore {
        &mut self.core
    }

    fn fields(&self) -> &Staged<FileReferenceRecordFields> {
        &self.fields
    }

    fn fields_mut(&mut self) -> &mut Staged<FileReferenceRecordFields> {
        &mut self.fields
    }
}

impl FileReferenceRecord {
    /// Store `file` as owned by `parent`, along with its attributes.
    pub fn new<P: ObjectRecord>(file: &FileReference, parent: &P, db: &ProjectDatabase) -> ProjectResult<Self> {
        db.transaction(|db| {
            let mut record = Self {
                core: ObjectCore::new(&file.identity),
                fields: Staged::new(FileReferenceRecordFields {
                    parent_table: parent.database_table_name().to_string(),
                    parent_id: parent.id(),
                    file_type: file.file_type,
                    path: file.path.clone(),
                    checksum_create: file.checksum_create.clone(),
                    checksum_last: file.checksum_last.clone(),
                }),
            };
            insert_new(&mut record, db)?;
            AttributeRecord::new_all(&file.attributes, AttributeParent::from(&record), db)?;
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

    pub fn get_file_reference_record(id: i64, db: &ProjectDatabase) -> ProjectResult<Option<Self>> {
        db.load_record(Columns::schema(), id, Self::factory_from_query)
    }

    pub fn get_file_reference_records(db: &ProjectDatabase) -> ProjectResult<Vec<Self>> {
        db.load_records(Columns::schema(), None, named_params! {}, Self::factory_from_query)
    }

    /// File references owned by the row `parent_id` of `parent_table`.
    pub fn get_file_reference_records_for(
        parent_table: &str,
        parent_id: i64,
        db: &ProjectDatabase,
    ) -> ProjectResult<Vec<Self>> {
        db.load_records(
            Columns::schema(),
            Some("parentDatabaseTableName=:table AND parentRecordId=:id ORDER BY id"),
            named_params! { ":table": parent_table, ":id": parent_id },
            Self::factory_from_query,
        )
    }

    /// Relocate every stored file path. Returns how many records changed.
    pub fn update_all_path_data(
        db: &ProjectDatabase,
        original_base: &Path,
        new_base: &Path,
    ) -> ProjectResult<usize> {
        relocate_records(Self::get_file_reference_records(db)?, db, original_base, new_base)
    }

    pub fn path(&self) -> &Path {
        &self.fields.current().path
    }

    pub fn file_type(&self) -> FileReferenceType {
        self.fields.current().file_type
    }

    pub fn checksum_create(&self) -> &str {
        &self.fields.current().checksum_create
    }

    pub fn checksum_last(&self) -> &str {
        &self.fields.current().checksum_last
    }

    pub fn parent_database_table_name(&self) -> &str {
        &self.fields.current().parent_table
    }

    pub fn parent_record_id(&self) -> i64 {
        self.fields.current().parent_id
    }

    pub fn set_path(&mut self, path: impl Into<PathBuf>) {
        self.fields.current_mut().path = path.into();
        self.core.on_change();
    }

    pub fn set_checksum_last(&mut self, checksum: &str) {
        self.fields.current_mut().checksum_last = checksum.to_string();
        self.core.on_change();
    }

    pub fn attribute_records(&self, db: &ProjectDatabase) -> ProjectResult<Vec<AttributeRecord>> {
        AttributeRecord::get_attribute_records_for(AttributeParent::from(self), db)
    }

    pub fn file_reference(&self, db: &ProjectDatabase) -> ProjectResult<FileReference> {
        let fields = self.fields.current();
        Ok(FileReference {
            identity: self.core.identity(),
            path: fields.path.clone(),
            file_type: fields.file_type,
            checksum_create: fields.checksum_create.clone(),
            checksum_last: fields.checksum_last.clone(),
            attributes: AttributeRecord::attributes_for(AttributeParent::from(self), db)?,
        })
    }
}

impl ObjectRecord for FileReferenceRecord {
    fn object_core(&self) -> &ObjectCore {
        &self.core
    }

    fn object_core_mut(&mut self) -> &mut ObjectCore {
        &mut self.core
    }

    fn parent(&self, db: &ProjectDatabase) -> ProjectResult<Option<AnyObjectRecord>> {
        let fields = self.fields.current();
        let table = fields.parent_table.as_str();
        if table == AnalysisRecordColumns::schema().table() {
            Ok(AnalysisRecord::get_analysis_record(fields.parent_id, db)?.map(Into::into))
        } else if table == DataPointRecordColumns::schema().table() {
            Ok(DataPointRecord::get_data_point_record(fields.parent_id, db)?.map(Into::into))
        } else {
            warn!(
                target: db.log_target(),
                "File reference {} has an owner of unknown type {table}",
                self.id()
            );
            Ok(None)
        }
    }

    fn children(&self, db: &ProjectDatabase) -> ProjectResult<Vec<AnyObjectRecord>> {
        Ok(self
            .attribute_records(db)?
            .into_iter()
            .map(AnyObjectRecord::from)
            .collect())
    }

    fn update_path_data(&mut self, original_base: &Path, new_base: &Path) -> bool {
        match relocate_path(self.path(), original_base, new_base) {
            Some(path) => {
                self.set_path(path);
                true
            }
            None => false,
        }
    }
}
