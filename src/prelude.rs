//! Prelude module for convenient imports.
//!
//! ```rust
//! use project_store::prelude::*;
//! ```
//!
//! Brings in the session ([`ProjectDatabase`], [`ProjectConfig`]), the record
//! traits, every record kind and the domain objects they store.

pub use crate::analysis::{
    Algorithm, Analysis, Attribute, AttributeValue, AttributeValueType, ContinuousVariable,
    DataPoint, DiscreteVariable, FileReference, FileReferenceType, InputVariable, Measure,
    ObjectIdentity, OutputAttributeVariable, OutputVariable, Problem, Response, UnitSystem,
    Variable,
};
pub use crate::config::{ConcurrencyPolicy, ProjectConfig};
pub use crate::database::ProjectDatabase;
pub use crate::errors::{ProjectError, ProjectResult};
pub use crate::record::join::JoinRecord;
pub use crate::record::{
    AnyJoinRecord, AnyObjectRecord, ObjectRecord, ObjectRecordKind, Record, RemovedRecord,
};
pub use crate::records::*;
pub use crate::utils::{RecordDateTime, RecordDateTimeExt, relocate_path};
