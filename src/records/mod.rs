//! The concrete record kinds stored in a project database.

mod algorithm;
mod analysis;
mod attribute;
mod data_point;
mod data_point_measure_join;
mod file_reference;
mod measure;
mod problem;
mod variable;

pub use algorithm::{AlgorithmRecord, AlgorithmRecordColumns, AlgorithmRecordFields};
pub use analysis::{AnalysisRecord, AnalysisRecordColumns, AnalysisRecordFields};
pub use attribute::{
    AttributeParent, AttributeRecord, AttributeRecordColumns, AttributeRecordFields,
    StoredAttributeValue,
};
pub use data_point::{DataPointRecord, DataPointRecordColumns, DataPointRecordFields};
pub use data_point_measure_join::DataPointMeasureJoinRecord;
pub use file_reference::{FileReferenceRecord, FileReferenceRecordColumns, FileReferenceRecordFields};
pub use measure::{MeasureRecord, MeasureRecordColumns, MeasureRecordFields};
pub use problem::{ProblemRecord, ProblemRecordColumns, ProblemRecordFields};
pub use variable::{
    ContinuousVariableRecord, ContinuousVariableRecordFields, DiscreteVariableRecord,
    DiscreteVariableRecordFields, InputVariableRecord, InputVariableRecordType,
    OutputAttributeVariableRecord, OutputAttributeVariableRecordFields, OutputVariableRecord,
    OutputVariableRecordType, VariableFields, VariableRecord, VariableRecordColumns,
    VariableRecordType,
};
