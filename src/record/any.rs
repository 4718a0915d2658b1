//! Closed sums over every stored record kind.
//!
//! Relations between records of different kinds (parents, children,
//! resources, joins) are handed around as these enums.

use derive_more::From;
use strum::{Display, EnumDiscriminants};

use super::{delegate_object_record, delegate_record};
use crate::records::{
    AlgorithmRecord, AnalysisRecord, AttributeRecord, ContinuousVariableRecord,
    DataPointMeasureJoinRecord, DataPointRecord, DiscreteVariableRecord, FileReferenceRecord,
    InputVariableRecord, MeasureRecord, OutputAttributeVariableRecord, OutputVariableRecord,
    ProblemRecord, VariableRecord,
};

#[derive(Debug, Clone, PartialEq, From, EnumDiscriminants)]
#[strum_discriminants(name(ObjectRecordKind), derive(Hash, Display))]
pub enum AnyObjectRecord {
    Problem(ProblemRecord),
    Variable(VariableRecord),
    Measure(MeasureRecord),
    Analysis(AnalysisRecord),
    Algorithm(AlgorithmRecord),
    DataPoint(DataPointRecord),
    FileReference(FileReferenceRecord),
    Attribute(AttributeRecord),
}

delegate_object_record!(AnyObjectRecord {
    Problem,
    Variable,
    Measure,
    Analysis,
    Algorithm,
    DataPoint,
    FileReference,
    Attribute,
});

impl AnyObjectRecord {
    pub fn kind(&self) -> ObjectRecordKind {
        self.into()
    }
}

macro_rules! variable_into_any {
    ($($record:ty),+) => {
        $(impl From<$record> for AnyObjectRecord {
            fn from(record: $record) -> Self {
                AnyObjectRecord::Variable(VariableRecord::from(record))
            }
        })+
    };
}

variable_into_any!(
    InputVariableRecord,
    OutputVariableRecord,
    DiscreteVariableRecord,
    ContinuousVariableRecord,
    OutputAttributeVariableRecord
);

#[derive(Debug, Clone, PartialEq, From)]
pub enum AnyJoinRecord {
    DataPointMeasure(DataPointMeasureJoinRecord),
}

delegate_record!(AnyJoinRecord { DataPointMeasure });
