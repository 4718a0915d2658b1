//! Staged field storage and the state shared by every object record.

use uuid::Uuid;

use super::columns::ObjectRecordColumns;
use super::row::{Bindings, RowValues};
use crate::analysis::ObjectIdentity;
use crate::errors::ProjectResult;
use crate::utils::datetime::{RecordDateTime, RecordDateTimeExt};

/// A value with a working copy and a last committed copy.
///
/// Edits go to the working copy. [`Staged::save`] makes the working copy the
/// new committed copy after a successful store write, and [`Staged::revert`]
/// throws the working copy away.
#[derive(Debug, Clone, PartialEq)]
pub struct Staged<T> {
    current: T,
    last: T,
}

impl<T: Clone + PartialEq> Staged<T> {
    pub fn new(value: T) -> Self {
        Self {
            last: value.clone(),
            current: value,
        }
    }

    pub fn current(&self) -> &T {
        &self.current
    }

    pub fn current_mut(&mut self) -> &mut T {
        &mut self.current
    }

    pub fn last(&self) -> &T {
        &self.last
    }

    /// Replace the committed copy, leaving the working copy alone.
    pub fn set_last(&mut self, last: T) {
        self.last = last;
    }

    pub fn save(&mut self) {
        self.last = self.current.clone();
    }

    pub fn revert(&mut self) {
        self.current = self.last.clone();
    }

    pub fn is_dirty(&self) -> bool {
        self.current != self.last
    }
}

/// Mutable columns shared by every object record.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectFields {
    pub name: String,
    pub display_name: String,
    pub description: String,
    pub timestamp_last: RecordDateTime,
    pub uuid_last: Uuid,
}

impl ObjectFields {
    fn from_row<C: ObjectRecordColumns>(row: &RowValues) -> ProjectResult<Self> {
        Ok(Self {
            name: row.get_text(C::NAME)?,
            display_name: row.get_text(C::DISPLAY_NAME)?,
            description: row.get_text(C::DESCRIPTION)?,
            timestamp_last: row.get_datetime(C::TIMESTAMP_LAST)?,
            uuid_last: row.get_uuid(C::UUID_LAST)?,
        })
    }

    fn bind_values<C: ObjectRecordColumns>(&self, bindings: &mut Bindings<'_>) {
        bindings.bind(C::NAME, self.name.clone());
        bindings.bind(C::DISPLAY_NAME, self.display_name.clone());
        bindings.bind(C::DESCRIPTION, self.description.clone());
        bindings.bind_datetime(C::TIMESTAMP_LAST, &self.timestamp_last);
        bindings.bind_uuid(C::UUID_LAST, self.uuid_last);
    }
}

/// Identity, naming and versioning of an object record.
///
/// `id` is zero until the record's row has been inserted.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectCore {
    id: i64,
    handle: Uuid,
    timestamp_create: RecordDateTime,
    fields: Staged<ObjectFields>,
}

impl ObjectCore {
    /// Core of a record about to be created for a domain object.
    pub fn new(identity: &ObjectIdentity) -> Self {
        let now = RecordDateTime::record_now();
        Self {
            id: 0,
            handle: identity.uuid,
            timestamp_create: now,
            fields: Staged::new(ObjectFields {
                name: identity.name.clone(),
                display_name: identity.display_name.clone(),
                description: identity.description.clone(),
                timestamp_last: now,
                uuid_last: identity.version_uuid,
            }),
        }
    }

    pub fn from_row<C: ObjectRecordColumns>(row: &RowValues) -> ProjectResult<Self> {
        Ok(Self {
            id: row.get_i64(C::ID)?,
            handle: row.get_uuid(C::HANDLE)?,
            timestamp_create: row.get_datetime(C::TIMESTAMP_CREATE)?,
            fields: Staged::new(ObjectFields::from_row::<C>(row)?),
        })
    }

    pub fn id(&self) -> i64 {
        self.id
    }

    pub(crate) fn assign_id(&mut self, id: i64) {
        self.id = id;
    }

    pub fn handle(&self) -> Uuid {
        self.handle
    }

    pub fn name(&self) -> &str {
        &self.fields.current().name
    }

    pub fn display_name(&self) -> &str {
        &self.fields.current().display_name
    }

    pub fn description(&self) -> &str {
        &self.fields.current().description
    }

    pub fn timestamp_create(&self) -> RecordDateTime {
        self.timestamp_create
    }

    pub fn timestamp_last(&self) -> RecordDateTime {
        self.fields.current().timestamp_last
    }

    /// Version marker of the working copy.
    pub fn uuid_last(&self) -> Uuid {
        self.fields.current().uuid_last
    }

    /// Version marker as of the last commit.
    pub fn committed_uuid_last(&self) -> Uuid {
        self.fields.last().uuid_last
    }

    pub fn set_name(&mut self, name: &str) {
        self.fields.current_mut().name = name.to_string();
        self.on_change();
    }

    pub fn set_display_name(&mut self, display_name: &str) {
        self.fields.current_mut().display_name = display_name.to_string();
        self.on_change();
    }

    pub fn set_description(&mut self, description: &str) {
        self.fields.current_mut().description = description.to_string();
        self.on_change();
    }

    /// Stamp a new version marker and modification time on the working copy.
    pub fn on_change(&mut self) {
        let fields = self.fields.current_mut();
        fields.uuid_last = Uuid::new_v4();
        fields.timestamp_last = RecordDateTime::record_now();
    }

    /// Domain identity of the working copy.
    pub fn identity(&self) -> ObjectIdentity {
        let fields = self.fields.current();
        ObjectIdentity {
            uuid: self.handle,
            version_uuid: fields.uuid_last,
            name: fields.name.clone(),
            display_name: fields.display_name.clone(),
            description: fields.description.clone(),
        }
    }

    pub fn bind_values<C: ObjectRecordColumns>(&self, bindings: &mut Bindings<'_>) {
        bindings.bind(C::ID, self.id);
        bindings.bind_uuid(C::HANDLE, self.handle);
        bindings.bind_datetime(C::TIMESTAMP_CREATE, &self.timestamp_create);
        self.fields.current().bind_values::<C>(bindings);
    }

    pub fn set_last_values<C: ObjectRecordColumns>(&mut self, row: &RowValues) -> ProjectResult<()> {
        self.fields.set_last(ObjectFields::from_row::<C>(row)?);
        Ok(())
    }

    /// Whether the working copy matches `row`. Identity columns are not compared.
    pub fn compare_values<C: ObjectRecordColumns>(&self, row: &RowValues) -> bool {
        ObjectFields::from_row::<C>(row).is_ok_and(|fields| &fields == self.fields.current())
    }

    pub fn save_last_values(&mut self) {
        self.fields.save();
    }

    pub fn revert_to_last_values(&mut self) {
        self.fields.revert();
    }

    pub fn is_dirty(&self) -> bool {
        self.fields.is_dirty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_staged_save_and_revert() {
        let mut staged = Staged::new(1);
        *staged.current_mut() = 2;
        assert!(staged.is_dirty());
        staged.revert();
        assert_eq!(*staged.current(), 1);

        *staged.current_mut() = 3;
        staged.save();
        assert!(!staged.is_dirty());
        assert_eq!(*staged.last(), 3);
    }

    #[test]
    fn test_on_change_moves_version_marker() {
        let identity = ObjectIdentity::new("sample");
        let mut core = ObjectCore::new(&identity);
        assert_eq!(core.uuid_last(), identity.version_uuid);

        core.set_name("renamed");
        assert_ne!(core.uuid_last(), identity.version_uuid);
        assert_eq!(core.committed_uuid_last(), identity.version_uuid);
        assert!(core.is_dirty());

        core.revert_to_last_values();
        assert_eq!(core.name(), "sample");
        assert_eq!(core.uuid_last(), identity.version_uuid);
        assert!(!core.is_dirty());
    }
}
