use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

use super::{Attribute, ObjectIdentity};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter)]
pub enum FileReferenceType {
    OSM,
    IDF,
    SQL,
    EPW,
    XML,
    CSV,
    JSON,
    Unknown,
}

/// A file on disk that belongs to an analysis or one of its data points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileReference {
    pub identity: ObjectIdentity,
    pub path: PathBuf,
    pub file_type: FileReferenceType,
    pub checksum_create: String,
    pub checksum_last: String,
    pub attributes: Vec<Attribute>,
}

impl FileReference {
    pub fn new(path: impl Into<PathBuf>, file_type: FileReferenceType) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self {
            identity: ObjectIdentity::new(name),
            path,
            file_type,
            checksum_create: String::new(),
            checksum_last: String::new(),
            attributes: Vec::new(),
        }
    }

    pub fn with_checksum(mut self, checksum: impl Into<String>) -> Self {
        let checksum = checksum.into();
        self.checksum_create = checksum.clone();
        self.checksum_last = checksum;
        self
    }

    pub fn with_attribute(mut self, attribute: Attribute) -> Self {
        self.attributes.push(attribute);
        self
    }
}
