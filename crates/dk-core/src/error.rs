//! Error types for dk-core

use crate::migration_id::MigrationId;
use crate::script::Direction;
use thiserror::Error;

/// Core error type for Deckard
#[derive(Error, Debug)]
pub enum CoreError {
    /// E001: Configuration file not found
    #[error("[E001] Config file not found: {path}")]
    ConfigNotFound { path: String },

    /// E002: Failed to parse configuration file
    #[error("[E002] Failed to parse config: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    /// E003: Invalid configuration value
    #[error("[E003] Invalid config: {message}")]
    ConfigInvalid { message: String },

    /// E004: Named target is not defined in the config file
    #[error("[E004] Unknown target '{name}'. Available targets: {available}")]
    UnknownTarget { name: String, available: String },

    /// E005: Migrations directory cannot be listed
    #[error("[E005] Cannot read migrations directory '{path}': {source}")]
    MigrationsDirUnreadable {
        path: String,
        source: std::io::Error,
    },

    /// E006: Label supplied to `create` is not usable in a file name
    #[error("[E006] Invalid migration label '{label}': {reason}")]
    InvalidLabel { label: String, reason: String },

    /// E007: Scaffolding would overwrite an existing file
    #[error("[E007] Migration file already exists: {path}")]
    MigrationExists { path: String },

    /// E008: IO error with file path context
    #[error("[E008] IO error on '{path}': {source}")]
    IoWithPath {
        path: String,
        source: std::io::Error,
    },
}

/// Result type alias for CoreError
pub type CoreResult<T> = Result<T, CoreError>;

/// A problem with a single file found while scanning the migrations directory.
///
/// Issues never stop the scan. Only [`DiscoveryIssue::DuplicateIdentifier`]
/// prevents planning, because there is no safe way to pick one of the files.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DiscoveryIssue {
    /// S001: File ends in `.up.sql`/`.down.sql` but the stem is not `<id>__<label>`
    #[error("[S001] Malformed migration file name '{file}': {reason}")]
    MalformedName { file: String, reason: String },

    /// S002: File could not be read
    #[error("[S002] Failed to read migration '{file}': {message}")]
    Unreadable { file: String, message: String },

    /// S003: Two files of the same direction share an identifier
    #[error("[S003] Duplicate {direction} migration identifier {id}: {files}")]
    DuplicateIdentifier {
        id: MigrationId,
        direction: Direction,
        files: String,
    },

    /// S004: Up and down halves disagree on the label
    #[error("[S004] Migration {id} has up label '{up_label}' but down label '{down_label}'")]
    LabelMismatch {
        id: MigrationId,
        up_label: String,
        down_label: String,
    },
}

impl DiscoveryIssue {
    /// Whether this issue must stop the run before planning.
    pub fn is_fatal(&self) -> bool {
        matches!(self, DiscoveryIssue::DuplicateIdentifier { .. })
    }
}
