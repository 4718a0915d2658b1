//! The record abstraction.
//!
//! A record is the in-memory image of one table row. It keeps a working copy
//! of its fields next to the values last committed to storage, so edits can
//! be saved or reverted as a unit.
//!
//! - [`Record`]: identity, row (de)serialization, save, revert and compare.
//! - [`ObjectRecord`]: records that take part in the parent / children /
//!   resources / joins graph, and can remove themselves with everything they
//!   own.
//! - [`join::JoinRecord`]: six column link rows between two object records.

pub mod any;
pub mod columns;
pub mod staged;
pub mod join;
pub mod row;

use std::path::Path;

use log::{debug, error};
use rusqlite::types::Value;
use uuid::Uuid;

use crate::database::ProjectDatabase;
use crate::errors::{ProjectError, ProjectResult};
use crate::utils::datetime::RecordDateTime;

pub use any::{AnyJoinRecord, AnyObjectRecord, ObjectRecordKind};
pub use columns::{ColumnKind, ObjectRecordColumns, RecordColumns, TableSchema};
pub use staged::{ObjectCore, Staged};
pub use join::{JoinCore, JoinRecord, JoinRecordColumns};
pub use row::{Bindings, RowValues};

/// Identifies a row deleted by [`ObjectRecord::remove`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RemovedRecord {
    pub table: &'static str,
    pub id: i64,
    pub handle: Uuid,
}

/// One row of one table, with staged edits.
pub trait Record {
    fn schema(&self) -> &'static TableSchema;

    /// Surrogate key. Positive once the row exists.
    fn id(&self) -> i64;

    /// Stable identity shared with the domain object this record stores.
    fn handle(&self) -> Uuid;

    /// Bind every column of the working copy.
    fn bind_values(&self, bindings: &mut Bindings<'_>);

    /// Replace the committed copy with the values in `row`.
    fn set_last_values(&mut self, row: &RowValues) -> ProjectResult<()>;

    /// Whether the working copy equals `row`, ignoring `id` and `handle`.
    fn compare_values(&self, row: &RowValues) -> bool;

    /// Make the working copy the committed copy.
    fn save_last_values(&mut self);

    /// Throw the working copy away.
    fn revert_to_last_values(&mut self);

    fn is_dirty(&self) -> bool;

    /// Committed version marker, for records that carry one.
    fn last_version_marker(&self) -> Option<Uuid> {
        None
    }

    fn database_table_name(&self) -> &'static str {
        self.schema().table()
    }

    /// Write the working copy through the table's update statement.
    fn save_row(&self, db: &ProjectDatabase) -> ProjectResult<()> {
        let mut bindings = Bindings::new(self.schema());
        self.bind_values(&mut bindings);
        let updated = bindings.execute_update(db.connection())?;
        debug!(
            target: db.log_target(),
            "Saved {} row {} ({updated} updated)",
            self.database_table_name(),
            self.id()
        );
        Ok(())
    }

    fn read_row(&self, db: &ProjectDatabase) -> ProjectResult<Option<RowValues>> {
        db.select_row(self.schema(), self.id())
    }

    /// Whether another writer changed the stored row since this record last
    /// committed. A row that no longer exists counts as stale.
    fn is_stale(&self, db: &ProjectDatabase) -> ProjectResult<bool> {
        let Some(marker) = self.last_version_marker() else {
            return Ok(false);
        };
        let Some(index) = self.schema().column_index(columns::VERSION_MARKER_COLUMN) else {
            return Ok(false);
        };
        match self.read_row(db)? {
            Some(row) => Ok(*row.value_at(index) != Value::Text(marker.to_string())),
            None => Ok(true),
        }
    }

    /// Delete this record's row and nothing else.
    fn remove_row(&self, db: &ProjectDatabase) -> ProjectResult<RemovedRecord> {
        db.delete_row(self.schema(), self.id())?;
        Ok(RemovedRecord {
            table: self.database_table_name(),
            id: self.id(),
            handle: self.handle(),
        })
    }

    /// Persist the working copy. See [`ProjectDatabase::save_record`].
    fn save(&mut self, db: &ProjectDatabase) -> ProjectResult<()>
    where
        Self: Sized,
    {
        db.save_record(self)
    }

    /// Discard unsaved edits.
    fn revert(&mut self) {
        self.revert_to_last_values();
    }
}

/// Type specific columns of an object record.
pub trait RecordFields: Clone + PartialEq + Sized {
    type Columns: ObjectRecordColumns;

    fn from_row(row: &RowValues) -> ProjectResult<Self>;

    fn bind_values(&self, bindings: &mut Bindings<'_>);
}

/// An object record assembled from an [`ObjectCore`] and staged type specific
/// fields. Implementing this provides [`Record`].
pub trait StagedRecord {
    type Fields: RecordFields;

    fn core(&self) -> &ObjectCore;

    fn core_mut(&mut self) -> &mut ObjectCore;

    fn fields(&self) -> &Staged<Self::Fields>;

    fn fields_mut(&mut self) -> &mut Staged<Self::Fields>;
}

type ColumnsOf<R> = <<R as StagedRecord>::Fields as RecordFields>::Columns;

impl<R: StagedRecord> Record for R {
    fn schema(&self) -> &'static TableSchema {
        <ColumnsOf<R> as ObjectRecordColumns>::schema()
    }

    fn id(&self) -> i64 {
        self.core().id()
    }

    fn handle(&self) -> Uuid {
        self.core().handle()
    }

    fn bind_values(&self, bindings: &mut Bindings<'_>) {
        self.core().bind_values::<ColumnsOf<R>>(bindings);
        self.fields().current().bind_values(bindings);
    }

    fn set_last_values(&mut self, row: &RowValues) -> ProjectResult<()> {
        self.core_mut().set_last_values::<ColumnsOf<R>>(row)?;
        let last = R::Fields::from_row(row)?;
        self.fields_mut().set_last(last);
        Ok(())
    }

    fn compare_values(&self, row: &RowValues) -> bool {
        self.core().compare_values::<ColumnsOf<R>>(row)
            && R::Fields::from_row(row).is_ok_and(|fields| &fields == self.fields().current())
    }

    fn save_last_values(&mut self) {
        self.core_mut().save_last_values();
        self.fields_mut().save();
    }

    fn revert_to_last_values(&mut self) {
        self.core_mut().revert_to_last_values();
        self.fields_mut().revert();
    }

    fn is_dirty(&self) -> bool {
        self.core().is_dirty() || self.fields().is_dirty()
    }

    fn last_version_marker(&self) -> Option<Uuid> {
        Some(self.core().committed_uuid_last())
    }
}

/// A record that takes part in the ownership graph.
///
/// Children are owned and removed with their parent. Resources are only
/// referenced and survive removal. Join records are link rows that must not
/// outlive either end.
pub trait ObjectRecord: Record {
    fn object_core(&self) -> &ObjectCore;

    fn object_core_mut(&mut self) -> &mut ObjectCore;

    fn name(&self) -> &str {
        self.object_core().name()
    }

    fn display_name(&self) -> &str {
        self.object_core().display_name()
    }

    fn description(&self) -> &str {
        self.object_core().description()
    }

    fn timestamp_create(&self) -> RecordDateTime {
        self.object_core().timestamp_create()
    }

    fn timestamp_last(&self) -> RecordDateTime {
        self.object_core().timestamp_last()
    }

    fn uuid_last(&self) -> Uuid {
        self.object_core().uuid_last()
    }

    fn set_name(&mut self, name: &str) {
        self.object_core_mut().set_name(name);
    }

    fn set_display_name(&mut self, display_name: &str) {
        self.object_core_mut().set_display_name(display_name);
    }

    fn set_description(&mut self, description: &str) {
        self.object_core_mut().set_description(description);
    }

    fn parent(&self, db: &ProjectDatabase) -> ProjectResult<Option<AnyObjectRecord>>;

    fn children(&self, db: &ProjectDatabase) -> ProjectResult<Vec<AnyObjectRecord>>;

    fn resources(&self, _db: &ProjectDatabase) -> ProjectResult<Vec<AnyObjectRecord>> {
        Ok(Vec::new())
    }

    fn join_records(&self, _db: &ProjectDatabase) -> ProjectResult<Vec<AnyJoinRecord>> {
        Ok(Vec::new())
    }

    /// Rebase stored paths from `original_base` onto `new_base` in the
    /// working copy. Returns whether anything changed.
    fn update_path_data(&mut self, _original_base: &Path, _new_base: &Path) -> bool {
        false
    }

    /// Remove this record, its children recursively, and every join record
    /// that references it. Resources are left in place.
    fn remove(&self, db: &ProjectDatabase) -> ProjectResult<Vec<RemovedRecord>> {
        db.transaction(|db| {
            let mut removed = Vec::new();

            // 1. Children, depth first
            for child in self.children(db)? {
                removed.extend(child.remove(db)?);
            }
            // Owned rows that failed to load as children
            removed.extend(db.remove_owned_rows(self.database_table_name(), self.id())?);

            // 2. Join rows pointing at this record
            for join in self.join_records(db)? {
                removed.push(join.remove_row(db)?);
            }
            removed.extend(db.remove_links(self.database_table_name(), self.id())?);

            // 3. The record itself
            removed.push(self.remove_row(db)?);

            debug!(
                target: db.log_target(),
                "Removed {} row {} and {} dependent rows",
                self.database_table_name(),
                self.id(),
                removed.len() - 1
            );
            Ok(removed)
        })
    }
}

/// Insert a row for a freshly built record, write its values and checkpoint
/// it as committed.
pub(crate) fn insert_new<R: StagedRecord>(record: &mut R, db: &ProjectDatabase) -> ProjectResult<()> {
    let id = db.insert_row(record.schema(), record.handle())?;
    record.core_mut().assign_id(id);
    record.save_row(db)?;
    record.save_last_values();
    Ok(())
}

/// Core and staged fields of an object record read from `row`.
pub(crate) fn parts_from_row<F: RecordFields>(row: &RowValues) -> ProjectResult<(ObjectCore, Staged<F>)> {
    Ok((
        ObjectCore::from_row::<F::Columns>(row)?,
        Staged::new(F::from_row(row)?),
    ))
}

/// Turn a construct-from-row failure into a logged absence.
pub(crate) fn log_factory_failure<R>(
    db: &ProjectDatabase,
    table: &'static str,
    result: ProjectResult<R>,
) -> Option<R> {
    match result {
        Ok(record) => Some(record),
        Err(e) => {
            error!(
                target: db.log_target(),
                "Unable to construct {table} record from query, because '{e}'"
            );
            None
        }
    }
}

/// A relation that has to exist for the store to be consistent.
pub(crate) fn required<R>(table: &'static str, id: i64, record: Option<R>) -> ProjectResult<R> {
    record.ok_or(ProjectError::MissingRelation { table, id })
}

/// Position in an ordered child list, as stored.
pub(crate) fn vector_index(index: usize) -> ProjectResult<i32> {
    i32::try_from(index).map_err(|_| ProjectError::Other(format!("vector index {index} is out of range")))
}

/// Relocate and save every record of a list whose paths changed.
pub(crate) fn relocate_records<R: ObjectRecord>(
    records: Vec<R>,
    db: &ProjectDatabase,
    original_base: &Path,
    new_base: &Path,
) -> ProjectResult<usize> {
    let mut updated = 0;
    for mut record in records {
        if record.update_path_data(original_base, new_base) {
            db.save_record(&mut record)?;
            updated += 1;
        }
    }
    Ok(updated)
}

/// Implement [`Record`] for an enum of records by delegating to the variant.
macro_rules! delegate_record {
    ($name:ident { $($variant:ident),+ $(,)? }) => {
        impl $crate::record::Record for $name {
            fn schema(&self) -> &'static $crate::record::columns::TableSchema {
                match self {
                    $(Self::$variant(record) => $crate::record::Record::schema(record),)+
                }
            }

            fn id(&self) -> i64 {
                match self {
                    $(Self::$variant(record) => $crate::record::Record::id(record),)+
                }
            }

            fn handle(&self) -> uuid::Uuid {
                match self {
                    $(Self::$variant(record) => $crate::record::Record::handle(record),)+
                }
            }

            fn bind_values(&self, bindings: &mut $crate::record::row::Bindings<'_>) {
                match self {
                    $(Self::$variant(record) => $crate::record::Record::bind_values(record, bindings),)+
                }
            }

            fn set_last_values(
                &mut self,
                row: &$crate::record::row::RowValues,
            ) -> $crate::errors::ProjectResult<()> {
                match self {
                    $(Self::$variant(record) => $crate::record::Record::set_last_values(record, row),)+
                }
            }

            fn compare_values(&self, row: &$crate::record::row::RowValues) -> bool {
                match self {
                    $(Self::$variant(record) => $crate::record::Record::compare_values(record, row),)+
                }
            }

            fn save_last_values(&mut self) {
                match self {
                    $(Self::$variant(record) => $crate::record::Record::save_last_values(record),)+
                }
            }

            fn revert_to_last_values(&mut self) {
                match self {
                    $(Self::$variant(record) => $crate::record::Record::revert_to_last_values(record),)+
                }
            }

            fn is_dirty(&self) -> bool {
                match self {
                    $(Self::$variant(record) => $crate::record::Record::is_dirty(record),)+
                }
            }

            fn last_version_marker(&self) -> Option<uuid::Uuid> {
                match self {
                    $(Self::$variant(record) => $crate::record::Record::last_version_marker(record),)+
                }
            }
        }
    };
}

/// Implement [`ObjectRecord`] for an enum of object records by delegating to
/// the variant.
macro_rules! delegate_object_record {
    ($name:ident { $($variant:ident),+ $(,)? }) => {
        $crate::record::delegate_record!($name { $($variant),+ });

        impl $crate::record::ObjectRecord for $name {
            fn object_core(&self) -> &$crate::record::staged::ObjectCore {
                match self {
                    $(Self::$variant(record) => $crate::record::ObjectRecord::object_core(record),)+
                }
            }

            fn object_core_mut(&mut self) -> &mut $crate::record::staged::ObjectCore {
                match self {
                    $(Self::$variant(record) => $crate::record::ObjectRecord::object_core_mut(record),)+
                }
            }

            fn parent(
                &self,
                db: &$crate::database::ProjectDatabase,
            ) -> $crate::errors::ProjectResult<Option<$crate::record::AnyObjectRecord>> {
                match self {
                    $(Self::$variant(record) => $crate::record::ObjectRecord::parent(record, db),)+
                }
            }

            fn children(
                &self,
                db: &$crate::database::ProjectDatabase,
            ) -> $crate::errors::ProjectResult<Vec<$crate::record::AnyObjectRecord>> {
                match self {
                    $(Self::$variant(record) => $crate::record::ObjectRecord::children(record, db),)+
                }
            }

            fn resources(
                &self,
                db: &$crate::database::ProjectDatabase,
            ) -> $crate::errors::ProjectResult<Vec<$crate::record::AnyObjectRecord>> {
                match self {
                    $(Self::$variant(record) => $crate::record::ObjectRecord::resources(record, db),)+
                }
            }

            fn join_records(
                &self,
                db: &$crate::database::ProjectDatabase,
            ) -> $crate::errors::ProjectResult<Vec<$crate::record::AnyJoinRecord>> {
                match self {
                    $(Self::$variant(record) => $crate::record::ObjectRecord::join_records(record, db),)+
                }
            }

            fn update_path_data(
                &mut self,
                original_base: &std::path::Path,
                new_base: &std::path::Path,
            ) -> bool {
                match self {
                    $(Self::$variant(record) => {
                        $crate::record::ObjectRecord::update_path_data(record, original_base, new_base)
                    })+
                }
            }
        }
    };
}

pub(crate) use delegate_object_record;
pub(crate) use delegate_record;
