use thiserror::Error;

pub type ProjectResult<T> = Result<T, ProjectError>;

#[derive(Error, Debug)]
pub enum ProjectError {
    #[error("SQLite Error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Unable to construct {table} record from row: {reason}")]
    Deserialization { table: &'static str, reason: String },

    #[error("Stale Record: {table} row {id} was modified in storage since it was last read")]
    StaleRecord { table: &'static str, id: i64 },

    #[error("Missing Relation: {table} row {id} is referenced but does not exist")]
    MissingRelation { table: &'static str, id: i64 },

    #[error("Schema Version Mismatch: expected {expected}, found {found}")]
    SchemaVersionMismatch { expected: u32, found: u32 },

    #[error("Invalid Path: {} is not valid UTF-8", .0.display())]
    NonUtf8Path(std::path::PathBuf),

    #[error("IO Error: {0}")]
    IoError(String),

    #[error("{0}")]
    Other(String),
}

impl ProjectError {
    pub fn deserialization(table: &'static str, reason: impl Into<String>) -> Self {
        Self::Deserialization {
            table,
            reason: reason.into(),
        }
    }
}

impl From<std::io::Error> for ProjectError {
    fn from(error: std::io::Error) -> Self {
        Self::IoError(error.to_string())
    }
}
