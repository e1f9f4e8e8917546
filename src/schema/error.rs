use thiserror::Error;

/// Configuration errors detected while compiling the schema set.
///
/// These describe a defective build, not bad runtime data, so callers are
/// expected to abort initialisation when they see one.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    #[error("Duplicate schema id: {0}")]
    DuplicateId(String),

    #[error("Schema {schema} references missing schema {target}")]
    DanglingRef { schema: String, target: String },

    #[error("Schema {0} has no $id")]
    MissingId(String),

    #[error("Unknown schema: {0}")]
    UnknownSchema(String),

    #[error("Schema {schema} names unknown default provider {provider}")]
    UnknownDefaultProvider { schema: String, provider: String },

    #[error("Invalid schema {schema}: {message}")]
    InvalidSchema { schema: String, message: String },
}
