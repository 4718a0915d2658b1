//! Attribute records.
//!
//! An attribute row hangs off exactly one parent: a file reference, an
//! algorithm, a variable, a data point, or another attribute when it is an
//! element of an attribute vector. Vector elements are ordered by
//! `attributeVectorIndex`.

use log::debug;
use rusqlite::named_params;
use rusqlite::types::Value;

use crate::analysis::{Attribute, AttributeValue, AttributeValueType, UnitSystem};
use crate::database::ProjectDatabase;
use crate::errors::{ProjectError, ProjectResult};
use crate::record::columns::{ObjectRecordColumns, RecordColumns, object_record_columns};
use crate::record::row::real_value;
use crate::record::{
    AnyObjectRecord, Bindings, ObjectCore, ObjectRecord, Record, RecordFields, RowValues, Staged,
    StagedRecord, insert_new, log_factory_failure, parts_from_row, required, vector_index,
};
use crate::records::{
    AlgorithmRecord, AlgorithmRecordColumns, DataPointRecord, DataPointRecordColumns,
    FileReferenceRecord, FileReferenceRecordColumns, VariableRecord, VariableRecordColumns,
};

object_record_columns! {
    /// Columns of the `AttributeRecords` table.
    pub enum AttributeRecordColumns in "AttributeRecords" {
        FileReferenceRecordId => "fileReferenceRecordId": Integer,
        ParentAttributeRecordId => "parentAttributeRecordId": Integer,
        AttributeValueType => "attributeValueType": Integer,
        AttributeValue => "attributeValue": Dynamic,
        AttributeUnits => "attributeUnits": Text,
        AttributeUnitSystem => "attributeUnitSystem": Text,
        AttributeVectorIndex => "attributeVectorIndex": Integer,
        AlgorithmRecordId => "algorithmRecordId": Integer,
        VariableRecordId => "variableRecordId": Integer,
        Source => "source": Text,
        DataPointRecordId => "dataPointRecordId": Integer,
    }
}

type Columns = AttributeRecordColumns;

fn table() -> &'static str {
    Columns::schema().table()
}

/// The one record an attribute belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttributeParent {
    FileReference(i64),
    /// Element `index` of an attribute vector.
    Attribute { id: i64, index: i32 },
    Algorithm(i64),
    Variable(i64),
    DataPoint(i64),
}

impl AttributeParent {
    pub fn element_of(vector: &AttributeRecord, index: i32) -> Self {
        AttributeParent::Attribute {
            id: vector.id(),
            index,
        }
    }

    fn from_row(row: &RowValues) -> ProjectResult<Self> {
        let element = match row.get_opt_i64(Columns::ParentAttributeRecordId)? {
            Some(id) => Some(AttributeParent::Attribute {
                id,
                index: row.get_i32(Columns::AttributeVectorIndex)?,
            }),
            None => None,
        };
        let slots = [
            row.get_opt_i64(Columns::FileReferenceRecordId)?
                .map(AttributeParent::FileReference),
            element,
            row.get_opt_i64(Columns::AlgorithmRecordId)?
                .map(AttributeParent::Algorithm),
            row.get_opt_i64(Columns::VariableRecordId)?
                .map(AttributeParent::Variable),
            row.get_opt_i64(Columns::DataPointRecordId)?
                .map(AttributeParent::DataPoint),
        ];

        let mut populated = slots.into_iter().flatten();
        match (populated.next(), populated.next()) {
            (Some(parent), None) => Ok(parent),
            (None, _) => Err(ProjectError::deserialization(table(), "no parent is set")),
            (Some(_), Some(_)) => Err(ProjectError::deserialization(
                table(),
                "more than one parent is set",
            )),
        }
    }

    fn bind_values(&self, bindings: &mut Bindings<'_>) {
        match *self {
            AttributeParent::FileReference(id) => bindings.bind(Columns::FileReferenceRecordId, id),
            AttributeParent::Attribute { id, index } => {
                bindings.bind(Columns::ParentAttributeRecordId, id);
                bindings.bind(Columns::AttributeVectorIndex, index);
            }
            AttributeParent::Algorithm(id) => bindings.bind(Columns::AlgorithmRecordId, id),
            AttributeParent::Variable(id) => bindings.bind(Columns::VariableRecordId, id),
            AttributeParent::DataPoint(id) => bindings.bind(Columns::DataPointRecordId, id),
        }
    }

    fn column(&self) -> AttributeRecordColumns {
        match self {
            AttributeParent::FileReference(_) => Columns::FileReferenceRecordId,
            AttributeParent::Attribute { .. } => Columns::ParentAttributeRecordId,
            AttributeParent::Algorithm(_) => Columns::AlgorithmRecordId,
            AttributeParent::Variable(_) => Columns::VariableRecordId,
            AttributeParent::DataPoint(_) => Columns::DataPointRecordId,
        }
    }
}

impl From<&FileReferenceRecord> for AttributeParent {
    fn from(record: &FileReferenceRecord) -> Self {
        AttributeParent::FileReference(record.id())
    }
}

impl From<&AlgorithmRecord> for AttributeParent {
    fn from(record: &AlgorithmRecord) -> Self {
        AttributeParent::Algorithm(record.id())
    }
}

impl From<&VariableRecord> for AttributeParent {
    fn from(record: &VariableRecord) -> Self {
        AttributeParent::Variable(record.id())
    }
}

impl From<&DataPointRecord> for AttributeParent {
    fn from(record: &DataPointRecord) -> Self {
        AttributeParent::DataPoint(record.id())
    }
}

/// The value as it sits in the row. Vector elements live in their own rows.
#[derive(Debug, Clone)]
pub enum StoredAttributeValue {
    Boolean(bool),
    Integer(i32),
    Unsigned(u32),
    Double(f64),
    Quantity { value: f64, system: UnitSystem },
    Unit { system: UnitSystem },
    String(String),
    AttributeVector,
}

/// NaN equals NaN, so a stored NaN compares clean against its row.
impl PartialEq for StoredAttributeValue {
    fn eq(&self, other: &Self) -> bool {
        fn same(a: f64, b: f64) -> bool {
            a == b || (a.is_nan() && b.is_nan())
        }

        use StoredAttributeValue::*;
        match (self, other) {
            (Boolean(a), Boolean(b)) => a == b,
            (Integer(a), Integer(b)) => a == b,
            (Unsigned(a), Unsigned(b)) => a == b,
            (Double(a), Double(b)) => same(*a, *b),
            (
                Quantity { value: a, system: a_system },
                Quantity { value: b, system: b_system },
            ) => same(*a, *b) && a_system == b_system,
            (Unit { system: a }, Unit { system: b }) => a == b,
            (String(a), String(b)) => a == b,
            (AttributeVector, AttributeVector) => true,
            _ => false,
        }
    }
}

impl StoredAttributeValue {
    pub fn value_type(&self) -> AttributeValueType {
        match self {
            StoredAttributeValue::Boolean(_) => AttributeValueType::Boolean,
            StoredAttributeValue::Integer(_) => AttributeValueType::Integer,
            StoredAttributeValue::Unsigned(_) => AttributeValueType::Unsigned,
            StoredAttributeValue::Double(_) => AttributeValueType::Double,
            StoredAttributeValue::Quantity { .. } => AttributeValueType::Quantity,
            StoredAttributeValue::Unit { .. } => AttributeValueType::Unit,
            StoredAttributeValue::String(_) => AttributeValueType::String,
            StoredAttributeValue::AttributeVector => AttributeValueType::AttributeVector,
        }
    }

    fn from_row(row: &RowValues) -> ProjectResult<Self> {
        let discriminant = row.get_i64(Columns::AttributeValueType)?;
        let value_type = AttributeValueType::from_repr(discriminant).ok_or_else(|| {
            ProjectError::deserialization(table(), format!("unknown attribute value type {discriminant}"))
        })?;

        let value = match value_type {
            AttributeValueType::Boolean => {
                StoredAttributeValue::Boolean(row.get_bool(Columns::AttributeValue)?)
            }
            AttributeValueType::Integer => {
                StoredAttributeValue::Integer(row.get_i32(Columns::AttributeValue)?)
            }
            AttributeValueType::Unsigned => {
                StoredAttributeValue::Unsigned(row.get_u32(Columns::AttributeValue)?)
            }
            AttributeValueType::Double => {
                StoredAttributeValue::Double(row.get_f64(Columns::AttributeValue)?)
            }
            AttributeValueType::Quantity => StoredAttributeValue::Quantity {
                value: row.get_f64(Columns::AttributeValue)?,
                system: row.get_parsed(Columns::AttributeUnitSystem)?,
            },
            AttributeValueType::Unit => StoredAttributeValue::Unit {
                system: row.get_parsed(Columns::AttributeUnitSystem)?,
            },
            AttributeValueType::String => {
                StoredAttributeValue::String(row.get_text(Columns::AttributeValue)?)
            }
            AttributeValueType::AttributeVector => StoredAttributeValue::AttributeVector,
        };
        Ok(value)
    }

    fn bind_values(&self, bindings: &mut Bindings<'_>) {
        bindings.bind(Columns::AttributeValueType, self.value_type() as i64);
        let (value, system) = match self {
            StoredAttributeValue::Boolean(value) => (Value::Text(value.to_string()), None),
            StoredAttributeValue::Integer(value) => (Value::from(*value), None),
            StoredAttributeValue::Unsigned(value) => (Value::from(*value), None),
            StoredAttributeValue::Double(value) => (real_value(*value), None),
            StoredAttributeValue::Quantity { value, system } => (real_value(*value), Some(*system)),
            StoredAttributeValue::Unit { system } => (Value::Null, Some(*system)),
            StoredAttributeValue::String(value) => (Value::Text(value.clone()), None),
            StoredAttributeValue::AttributeVector => (Value::Null, None),
        };
        bindings.bind(Columns::AttributeValue, value);
        bindings.bind(
            Columns::AttributeUnitSystem,
            system.map(|system| system.to_string()),
        );
    }
}

impl From<&AttributeValue> for StoredAttributeValue {
    fn from(value: &AttributeValue) -> Self {
        match value {
            AttributeValue::Boolean(value) => StoredAttributeValue::Boolean(*value),
            AttributeValue::Integer(value) => StoredAttributeValue::Integer(*value),
            AttributeValue::Unsigned(value) => StoredAttributeValue::Unsigned(*value),
            AttributeValue::Double(value) => StoredAttributeValue::Double(*value),
            AttributeValue::Quantity { value, system } => StoredAttributeValue::Quantity {
                value: *value,
                system: *system,
            },
            AttributeValue::Unit { system } => StoredAttributeValue::Unit { system: *system },
            AttributeValue::String(value) => StoredAttributeValue::String(value.clone()),
            AttributeValue::AttributeVector(_) => StoredAttributeValue::AttributeVector,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AttributeRecordFields {
    pub parent: AttributeParent,
    pub value: StoredAttributeValue,
    pub units: Option<String>,
    pub source: String,
}

impl RecordFields for AttributeRecordFields {
    type Columns = AttributeRecordColumns;

    fn from_row(row: &RowValues) -> ProjectResult<Self> {
        Ok(Self {
            parent: AttributeParent::from_row(row)?,
            value: StoredAttributeValue::from_row(row)?,
            units: row.get_opt_text(Columns::AttributeUnits)?,
            source: row.get_opt_text(Columns::Source)?.unwrap_or_default(),
        })
    }

    fn bind_values(&self, bindings: &mut Bindings<'_>) {
        self.parent.bind_values(bindings);
        self.value.bind_values(bindings);
        bindings.bind(Columns::AttributeUnits, self.units.clone());
        bindings.bind(Columns::Source, self.source.clone());
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AttributeRecord {
    core: ObjectCore,
    fields: Staged<AttributeRecordFields>,
}

impl StagedRecord for AttributeRecord {
    type Fields = AttributeRecordFields;

    fn core(&self) -> &ObjectCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ObjectCore {
        &mut self.core
    }

    fn fields(&self) -> &Staged<AttributeRecordFields> {
        &self.fields
    }

    fn fields_mut(&mut self) -> &mut Staged<AttributeRecordFields> {
        &mut self.fields
    }
}

impl AttributeRecord {
    /// Store `attribute` under `parent`. Vector elements are stored as child
    /// rows in list order.
    pub fn new(attribute: &Attribute, parent: AttributeParent, db: &ProjectDatabase) -> ProjectResult<Self> {
        db.transaction(|db| {
            let mut record = Self {
                core: ObjectCore::new(&attribute.identity),
                fields: Staged::new(AttributeRecordFields {
                    parent,
                    value: StoredAttributeValue::from(&attribute.value),
                    units: attribute.units.clone(),
                    source: attribute.source.clone(),
                }),
            };
            insert_new(&mut record, db)?;

            if let AttributeValue::AttributeVector(elements) = &attribute.value {
                for (index, element) in elements.iter().enumerate() {
                    let parent = AttributeParent::element_of(&record, vector_index(index)?);
                    Self::new(element, parent, db)?;
                }
                debug!(
                    target: db.log_target(),
                    "Stored attribute vector {} with {} elements",
                    attribute.name(),
                    elements.len()
                );
            }
            Ok(record)
        })
    }

    /// Store each attribute of `attributes` under `parent`.
    pub(crate) fn new_all(
        attributes: &[Attribute],
        parent: AttributeParent,
        db: &ProjectDatabase,
    ) -> ProjectResult<Vec<Self>> {
        attributes
            .iter()
            .map(|attribute| Self::new(attribute, parent, db))
            .collect()
    }

    pub fn from_row(row: &RowValues) -> ProjectResult<Self> {
        let (core, fields) = parts_from_row(row)?;
        Ok(Self { core, fields })
    }

    pub fn factory_from_query(row: &RowValues, db: &ProjectDatabase) -> Option<Self> {
        log_factory_failure(db, table(), Self::from_row(row))
    }

    pub fn get_attribute_record(id: i64, db: &ProjectDatabase) -> ProjectResult<Option<Self>> {
        db.load_record(Columns::schema(), id, Self::factory_from_query)
    }

    /// Attributes that are not elements of a vector.
    pub fn get_attribute_records(db: &ProjectDatabase) -> ProjectResult<Vec<Self>> {
        db.load_records(
            Columns::schema(),
            Some("parentAttributeRecordId IS NULL ORDER BY id"),
            named_params! {},
            Self::factory_from_query,
        )
    }

    /// Attributes stored directly under `parent`, in insertion order or, for
    /// vector elements, in list order.
    pub fn get_attribute_records_for(
        parent: AttributeParent,
        db: &ProjectDatabase,
    ) -> ProjectResult<Vec<Self>> {
        let (id, order) = match parent {
            AttributeParent::Attribute { id, .. } => (id, "attributeVectorIndex"),
            AttributeParent::FileReference(id)
            | AttributeParent::Algorithm(id)
            | AttributeParent::Variable(id)
            | AttributeParent::DataPoint(id) => (id, "id"),
        };
        let clause = format!("{}=:id ORDER BY {order}", parent.column().column_name());
        db.load_records(
            Columns::schema(),
            Some(&clause),
            named_params! { ":id": id },
            Self::factory_from_query,
        )
    }

    /// Elements of this attribute vector, ordered by position.
    pub fn element_records(&self, db: &ProjectDatabase) -> ProjectResult<Vec<Self>> {
        Self::get_attribute_records_for(AttributeParent::element_of(self, 0), db)
    }

    pub fn parent_slot(&self) -> AttributeParent {
        self.fields.current().parent
    }

    pub fn value_type(&self) -> AttributeValueType {
        self.fields.current().value.value_type()
    }

    pub fn stored_value(&self) -> &StoredAttributeValue {
        &self.fields.current().value
    }

    pub fn units(&self) -> Option<&str> {
        self.fields.current().units.as_deref()
    }

    pub fn source(&self) -> &str {
        &self.fields.current().source
    }

    /// Position within the parent vector, for vector elements.
    pub fn attribute_vector_index(&self) -> Option<i32> {
        match self.fields.current().parent {
            AttributeParent::Attribute { index, .. } => Some(index),
            _ => None,
        }
    }

    pub fn set_units(&mut self, units: Option<&str>) {
        self.fields.current_mut().units = units.map(str::to_string);
        self.core.on_change();
    }

    pub fn set_source(&mut self, source: &str) {
        self.fields.current_mut().source = source.to_string();
        self.core.on_change();
    }

    /// Replace a scalar value. Vector values are changed through their
    /// element records, so switching to or from a vector is refused.
    pub fn set_value(&mut self, value: StoredAttributeValue) -> bool {
        let current = &self.fields.current().value;
        if matches!(current, StoredAttributeValue::AttributeVector)
            || matches!(value, StoredAttributeValue::AttributeVector)
        {
            return false;
        }
        self.fields.current_mut().value = value;
        self.core.on_change();
        true
    }

    /// Rebuild the attribute, reading vector elements from storage.
    pub fn attribute(&self, db: &ProjectDatabase) -> ProjectResult<Attribute> {
        let fields = self.fields.current();
        let value = match &fields.value {
            StoredAttributeValue::Boolean(value) => AttributeValue::Boolean(*value),
            StoredAttributeValue::Integer(value) => AttributeValue::Integer(*value),
            StoredAttributeValue::Unsigned(value) => AttributeValue::Unsigned(*value),
            StoredAttributeValue::Double(value) => AttributeValue::Double(*value),
            StoredAttributeValue::Quantity { value, system } => AttributeValue::Quantity {
                value: *value,
                system: *system,
            },
            StoredAttributeValue::Unit { system } => AttributeValue::Unit { system: *system },
            StoredAttributeValue::String(value) => AttributeValue::String(value.clone()),
            StoredAttributeValue::AttributeVector => AttributeValue::AttributeVector(
                self.element_records(db)?
                    .iter()
                    .map(|element| element.attribute(db))
                    .collect::<ProjectResult<Vec<_>>>()?,
            ),
        };
        Ok(Attribute {
            identity: self.core.identity(),
            value,
            units: fields.units.clone(),
            source: fields.source.clone(),
        })
    }

    /// Rebuild every attribute stored directly under `parent`.
    pub(crate) fn attributes_for(
        parent: AttributeParent,
        db: &ProjectDatabase,
    ) -> ProjectResult<Vec<Attribute>> {
        Self::get_attribute_records_for(parent, db)?
            .iter()
            .map(|record| record.attribute(db))
            .collect()
    }
}

impl ObjectRecord for AttributeRecord {
    fn object_core(&self) -> &ObjectCore {
        &self.core
    }

    fn object_core_mut(&mut self) -> &mut ObjectCore {
        &mut self.core
    }

    fn parent(&self, db: &ProjectDatabase) -> ProjectResult<Option<AnyObjectRecord>> {
        let parent: AnyObjectRecord = match self.fields.current().parent {
            AttributeParent::FileReference(id) => required(
                FileReferenceRecordColumns::schema().table(),
                id,
                FileReferenceRecord::get_file_reference_record(id, db)?,
            )?
            .into(),
            AttributeParent::Attribute { id, .. } => {
                required(table(), id, Self::get_attribute_record(id, db)?)?.into()
            }
            AttributeParent::Algorithm(id) => required(
                AlgorithmRecordColumns::schema().table(),
                id,
                AlgorithmRecord::get_algorithm_record(id, db)?,
            )?
            .into(),
            AttributeParent::Variable(id) => required(
                VariableRecordColumns::schema().table(),
                id,
                VariableRecord::get_variable_record(id, db)?,
            )?
            .into(),
            AttributeParent::DataPoint(id) => required(
                DataPointRecordColumns::schema().table(),
                id,
                DataPointRecord::get_data_point_record(id, db)?,
            )?
            .into(),
        };
        Ok(Some(parent))
    }

    fn children(&self, db: &ProjectDatabase) -> ProjectResult<Vec<AnyObjectRecord>> {
        Ok(self
            .element_records(db)?
            .into_iter()
            .map(AnyObjectRecord::from)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row_with(set: &[(AttributeRecordColumns, Value)]) -> RowValues {
        let mut values = vec![Value::Null; Columns::schema().column_count()];
        for (column, value) in set {
            values[column.index()] = value.clone();
        }
        RowValues::new("AttributeRecords", values)
    }

    #[test]
    fn test_single_parent_slot() {
        let row = row_with(&[(Columns::AlgorithmRecordId, Value::Integer(4))]);
        assert_eq!(AttributeParent::from_row(&row).unwrap(), AttributeParent::Algorithm(4));
    }

    #[test]
    fn test_vector_element_parent_carries_index() {
        let row = row_with(&[
            (Columns::ParentAttributeRecordId, Value::Integer(9)),
            (Columns::AttributeVectorIndex, Value::Integer(2)),
        ]);
        assert_eq!(
            AttributeParent::from_row(&row).unwrap(),
            AttributeParent::Attribute { id: 9, index: 2 }
        );
    }

    #[test]
    fn test_two_parent_slots_are_rejected() {
        let row = row_with(&[
            (Columns::AlgorithmRecordId, Value::Integer(4)),
            (Columns::DataPointRecordId, Value::Integer(5)),
        ]);
        assert!(AttributeParent::from_row(&row).is_err());
    }

    #[test]
    fn test_missing_parent_is_rejected() {
        assert!(AttributeParent::from_row(&row_with(&[])).is_err());
    }

    #[test]
    fn test_boolean_is_stored_as_text() {
        let mut bindings = Bindings::new(Columns::schema());
        StoredAttributeValue::Boolean(true).bind_values(&mut bindings);
        assert_eq!(
            bindings.values()[Columns::AttributeValue.index()],
            Value::Text("true".into())
        );
        assert_eq!(
            bindings.values()[Columns::AttributeValueType.index()],
            Value::Integer(AttributeValueType::Boolean as i64)
        );
    }

    #[test]
    fn test_unit_value_is_null_with_system() {
        let mut bindings = Bindings::new(Columns::schema());
        StoredAttributeValue::Unit {
            system: UnitSystem::IP,
        }
        .bind_values(&mut bindings);
        assert_eq!(bindings.values()[Columns::AttributeValue.index()], Value::Null);
        assert_eq!(
            bindings.values()[Columns::AttributeUnitSystem.index()],
            Value::Text("IP".into())
        );
    }

    #[test]
    fn test_unknown_value_type_is_rejected() {
        let row = row_with(&[(Columns::AttributeValueType, Value::Integer(42))]);
        assert!(StoredAttributeValue::from_row(&row).is_err());
    }
}
