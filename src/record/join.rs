//! Many-to-many link records.
//!
//! Every join table has the same six columns: its own `id` and `handle`, and
//! the id and handle of the record on each side. The functions here work for
//! any [`JoinRecord`] type.

use log::debug;
use rusqlite::named_params;
use strum::EnumIter;
use uuid::Uuid;

use super::columns::{ColumnKind, RecordColumns, TableSchema};
use super::row::{Bindings, RowValues};
use super::{ObjectRecord, Record};
use crate::database::ProjectDatabase;
use crate::errors::{ProjectError, ProjectResult};

/// Columns of every join table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter)]
pub enum JoinRecordColumns {
    Id,
    Handle,
    LeftId,
    LeftHandle,
    RightId,
    RightHandle,
}

impl RecordColumns for JoinRecordColumns {
    fn index(self) -> usize {
        self as usize
    }

    fn column_name(self) -> &'static str {
        match self {
            JoinRecordColumns::Id => "id",
            JoinRecordColumns::Handle => "handle",
            JoinRecordColumns::LeftId => "leftId",
            JoinRecordColumns::LeftHandle => "leftHandle",
            JoinRecordColumns::RightId => "rightId",
            JoinRecordColumns::RightHandle => "rightHandle",
        }
    }

    fn kind(self) -> ColumnKind {
        match self {
            JoinRecordColumns::Id | JoinRecordColumns::LeftId | JoinRecordColumns::RightId => {
                ColumnKind::Integer
            }
            JoinRecordColumns::Handle
            | JoinRecordColumns::LeftHandle
            | JoinRecordColumns::RightHandle => ColumnKind::Text,
        }
    }
}

/// The stored state of a join record. Join records are never edited, only
/// created and removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct JoinCore {
    pub id: i64,
    pub handle: Uuid,
    pub left_id: i64,
    pub left_handle: Uuid,
    pub right_id: i64,
    pub right_handle: Uuid,
}

impl JoinCore {
    pub fn from_row(row: &RowValues) -> ProjectResult<Self> {
        Ok(Self {
            id: row.get_i64(JoinRecordColumns::Id)?,
            handle: row.get_uuid(JoinRecordColumns::Handle)?,
            left_id: row.get_i64(JoinRecordColumns::LeftId)?,
            left_handle: row.get_uuid(JoinRecordColumns::LeftHandle)?,
            right_id: row.get_i64(JoinRecordColumns::RightId)?,
            right_handle: row.get_uuid(JoinRecordColumns::RightHandle)?,
        })
    }

    pub fn bind_values(&self, bindings: &mut Bindings<'_>) {
        bindings.bind(JoinRecordColumns::Id, self.id);
        bindings.bind_uuid(JoinRecordColumns::Handle, self.handle);
        bindings.bind(JoinRecordColumns::LeftId, self.left_id);
        bindings.bind_uuid(JoinRecordColumns::LeftHandle, self.left_handle);
        bindings.bind(JoinRecordColumns::RightId, self.right_id);
        bindings.bind_uuid(JoinRecordColumns::RightHandle, self.right_handle);
    }

    /// Whether `row` links the same two records.
    pub fn compare_values(&self, row: &RowValues) -> bool {
        JoinCore::from_row(row).is_ok_and(|stored| {
            stored.left_id == self.left_id
                && stored.left_handle == self.left_handle
                && stored.right_id == self.right_id
                && stored.right_handle == self.right_handle
        })
    }
}

/// A link row between a `Left` and a `Right` object record.
pub trait JoinRecord: Record + Sized {
    type Left: ObjectRecord;
    type Right: ObjectRecord;

    /// Schema of this join's table.
    fn join_schema() -> &'static TableSchema;

    fn from_core(core: JoinCore) -> Self;

    fn join_core(&self) -> &JoinCore;

    fn left_table() -> &'static str;

    fn right_table() -> &'static str;

    fn load_left(id: i64, db: &ProjectDatabase) -> ProjectResult<Option<Self::Left>>;

    fn load_right(id: i64, db: &ProjectDatabase) -> ProjectResult<Option<Self::Right>>;

    fn left_id(&self) -> i64 {
        self.join_core().left_id
    }

    fn left_handle(&self) -> Uuid {
        self.join_core().left_handle
    }

    fn right_id(&self) -> i64 {
        self.join_core().right_id
    }

    fn right_handle(&self) -> Uuid {
        self.join_core().right_handle
    }

    /// The left record. It must exist while the join does.
    fn left_object(&self, db: &ProjectDatabase) -> ProjectResult<Self::Left> {
        Self::load_left(self.left_id(), db)?.ok_or(ProjectError::MissingRelation {
            table: Self::left_table(),
            id: self.left_id(),
        })
    }

    /// The right record. It must exist while the join does.
    fn right_object(&self, db: &ProjectDatabase) -> ProjectResult<Self::Right> {
        Self::load_right(self.right_id(), db)?.ok_or(ProjectError::MissingRelation {
            table: Self::right_table(),
            id: self.right_id(),
        })
    }
}

fn from_rows<J: JoinRecord>(rows: Vec<RowValues>) -> ProjectResult<Vec<J>> {
    rows.iter()
        .map(|row| JoinCore::from_row(row).map(J::from_core))
        .collect()
}

/// Link `left` and `right`. Linking an already linked pair returns the
/// existing join record.
pub fn link<J: JoinRecord>(
    left: &J::Left,
    right: &J::Right,
    db: &ProjectDatabase,
) -> ProjectResult<J> {
    db.transaction(|db| {
        if let Some(existing) = get_join_record::<J>(left.id(), right.id(), db)? {
            return Ok(existing);
        }

        let handle = Uuid::new_v4();
        let id = db.insert_row(J::join_schema(), handle)?;
        let join = J::from_core(JoinCore {
            id,
            handle,
            left_id: left.id(),
            left_handle: left.handle(),
            right_id: right.id(),
            right_handle: right.handle(),
        });
        join.save_row(db)?;
        debug!(
            target: db.log_target(),
            "Linked {} {} to {} {}",
            left.database_table_name(),
            left.id(),
            right.database_table_name(),
            right.id()
        );
        Ok(join)
    })
}

/// The join record linking `left_id` to `right_id`, if any.
pub fn get_join_record<J: JoinRecord>(
    left_id: i64,
    right_id: i64,
    db: &ProjectDatabase,
) -> ProjectResult<Option<J>> {
    let rows = db.select_rows(
        J::join_schema(),
        Some("leftId=:leftId AND rightId=:rightId"),
        named_params! { ":leftId": left_id, ":rightId": right_id },
    )?;
    Ok(from_rows::<J>(rows)?.into_iter().next())
}

pub fn get_join_records_for_left_id<J: JoinRecord>(
    left_id: i64,
    db: &ProjectDatabase,
) -> ProjectResult<Vec<J>> {
    let rows = db.select_rows(
        J::join_schema(),
        Some("leftId=:leftId ORDER BY id"),
        named_params! { ":leftId": left_id },
    )?;
    from_rows(rows)
}

pub fn get_join_records_for_right_id<J: JoinRecord>(
    right_id: i64,
    db: &ProjectDatabase,
) -> ProjectResult<Vec<J>> {
    let rows = db.select_rows(
        J::join_schema(),
        Some("rightId=:rightId ORDER BY id"),
        named_params! { ":rightId": right_id },
    )?;
    from_rows(rows)
}

/// Remove the link between `left_id` and `right_id`. Returns whether one existed.
pub fn unlink<J: JoinRecord>(left_id: i64, right_id: i64, db: &ProjectDatabase) -> ProjectResult<bool> {
    let removed = db.delete_rows(
        J::join_schema(),
        "leftId=:leftId AND rightId=:rightId",
        named_params! { ":leftId": left_id, ":rightId": right_id },
    )?;
    Ok(removed > 0)
}

/// Remove every link from `left_id`. Returns how many were removed.
pub fn unlink_left<J: JoinRecord>(left_id: i64, db: &ProjectDatabase) -> ProjectResult<usize> {
    db.delete_rows(
        J::join_schema(),
        "leftId=:leftId",
        named_params! { ":leftId": left_id },
    )
}

/// Remove every link to `right_id`. Returns how many were removed.
pub fn unlink_right<J: JoinRecord>(right_id: i64, db: &ProjectDatabase) -> ProjectResult<usize> {
    db.delete_rows(
        J::join_schema(),
        "rightId=:rightId",
        named_params! { ":rightId": right_id },
    )
}
