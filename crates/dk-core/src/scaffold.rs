//! Creation of empty migration file pairs.

use crate::error::{CoreError, CoreResult};
use crate::migration_id::MigrationId;
use crate::script::{Direction, NAME_SEPARATOR};
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

/// Files written by [`create_migration`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScaffoldedMigration {
    /// Identifier shared by both files
    pub id: MigrationId,

    /// Label shared by both files
    pub label: String,

    /// Path of the new `.up.sql` file
    pub up_path: PathBuf,

    /// Path of the new `.down.sql` file
    pub down_path: PathBuf,
}

/// Check that `label` can be embedded in a migration file name and parsed back.
pub fn validate_label(label: &str) -> CoreResult<()> {
    let reason = if label.is_empty() {
        Some("label cannot be empty")
    } else if label.contains(NAME_SEPARATOR) {
        Some("label cannot contain '__'")
    } else if label.contains(['/', '\\']) {
        Some("label cannot contain path separators")
    } else if label.chars().any(char::is_whitespace) {
        Some("label cannot contain whitespace")
    } else if label.ends_with(".up") || label.ends_with(".down") || label.ends_with(".sql") {
        Some("label cannot end in a migration suffix")
    } else {
        None
    };

    match reason {
        Some(reason) => Err(CoreError::InvalidLabel {
            label: label.to_string(),
            reason: reason.to_string(),
        }),
        None => Ok(()),
    }
}

/// Create empty `<id>__<label>.up.sql` and `.down.sql` files in `dir`.
///
/// The directory is created if missing. Existing files are never
/// overwritten; if the down file cannot be created the up file is removed
/// again so no half pair is left behind.
pub fn create_migration(dir: &Path, label: &str, id: MigrationId) -> CoreResult<ScaffoldedMigration> {
    validate_label(label)?;

    std::fs::create_dir_all(dir).map_err(|e| CoreError::IoWithPath {
        path: dir.display().to_string(),
        source: e,
    })?;

    let stem = format!("{}{}{}", id, NAME_SEPARATOR, label);
    let up_path = dir.join(format!("{}{}", stem, Direction::Up.suffix()));
    let down_path = dir.join(format!("{}{}", stem, Direction::Down.suffix()));

    create_new_file(&up_path)?;
    if let Err(e) = create_new_file(&down_path) {
        if let Err(cleanup) = std::fs::remove_file(&up_path) {
            log::warn!("Failed to remove {}: {}", up_path.display(), cleanup);
        }
        return Err(e);
    }

    log::debug!("Created migration pair {}", stem);

    Ok(ScaffoldedMigration {
        id,
        label: label.to_string(),
        up_path,
        down_path,
    })
}

fn create_new_file(path: &Path) -> CoreResult<()> {
    OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .map(|_| ())
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::AlreadyExists {
                CoreError::MigrationExists {
                    path: path.display().to_string(),
                }
            } else {
                CoreError::IoWithPath {
                    path: path.display().to_string(),
                    source: e,
                }
            }
        })
}

#[cfg(test)]
#[path = "scaffold_test.rs"]
mod tests;
