//! Migration script discovery.
//!
//! Scans one directory (non-recursively) for `<identifier>__<label>.up.sql`
//! and `<identifier>__<label>.down.sql` files. Scripts are keyed and ordered
//! by their parsed identifier; directory listing order is never used.

use crate::error::{CoreError, CoreResult, DiscoveryIssue};
use crate::migration_id::MigrationId;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::{Path, PathBuf};

/// Separates the identifier from the label in a migration file name.
pub const NAME_SEPARATOR: &str = "__";

/// File name suffix of forward scripts.
pub const UP_SUFFIX: &str = ".up.sql";

/// File name suffix of reverse scripts.
pub const DOWN_SUFFIX: &str = ".down.sql";

/// Which half of a migration pair a script is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Forward (additive) change
    Up,
    /// Reverse (usually destructive) change
    Down,
}

impl Direction {
    /// File name suffix for scripts of this direction
    pub fn suffix(self) -> &'static str {
        match self {
            Direction::Up => UP_SUFFIX,
            Direction::Down => DOWN_SUFFIX,
        }
    }

    /// Split a file name into its direction and stem, if it is a migration candidate
    fn classify(file_name: &str) -> Option<(Self, &str)> {
        if let Some(stem) = file_name.strip_suffix(UP_SUFFIX) {
            Some((Direction::Up, stem))
        } else {
            file_name
                .strip_suffix(DOWN_SUFFIX)
                .map(|stem| (Direction::Down, stem))
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Up => write!(f, "up"),
            Direction::Down => write!(f, "down"),
        }
    }
}

/// One half of a migration pair, loaded from disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationScript {
    /// Sort and ledger key
    pub id: MigrationId,

    /// Descriptive slug from the file name
    pub label: String,

    /// Up or down
    pub direction: Direction,

    /// File the script was read from
    pub path: PathBuf,

    /// Raw SQL text, sent to the driver as-is
    pub body: String,
}

impl MigrationScript {
    /// `<identifier>__<label>`, the name used in logs and plan listings
    pub fn name(&self) -> String {
        format!("{}{}{}", self.id, NAME_SEPARATOR, self.label)
    }

    /// File name this script would have on disk
    pub fn file_name(&self) -> String {
        format!("{}{}", self.name(), self.direction.suffix())
    }
}

/// Up and down scripts, each ordered by identifier ascending
#[derive(Debug, Clone, Default)]
pub struct ScriptSet {
    up: BTreeMap<MigrationId, MigrationScript>,
    down: BTreeMap<MigrationId, MigrationScript>,
}

impl ScriptSet {
    /// Create an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a script, returning the script it replaced (if any)
    pub fn insert(&mut self, script: MigrationScript) -> Option<MigrationScript> {
        self.map_mut(script.direction).insert(script.id, script)
    }

    /// All scripts of one direction, ascending by identifier
    pub fn scripts(&self, direction: Direction) -> &BTreeMap<MigrationId, MigrationScript> {
        match direction {
            Direction::Up => &self.up,
            Direction::Down => &self.down,
        }
    }

    fn map_mut(&mut self, direction: Direction) -> &mut BTreeMap<MigrationId, MigrationScript> {
        match direction {
            Direction::Up => &mut self.up,
            Direction::Down => &mut self.down,
        }
    }

    /// Look up one script
    pub fn get(&self, direction: Direction, id: MigrationId) -> Option<&MigrationScript> {
        self.scripts(direction).get(&id)
    }

    /// Every identifier that has at least one script, ascending
    pub fn identifiers(&self) -> BTreeSet<MigrationId> {
        self.up.keys().chain(self.down.keys()).copied().collect()
    }

    /// Label for an identifier, preferring the up script's
    pub fn label(&self, id: MigrationId) -> Option<&str> {
        self.up
            .get(&id)
            .or_else(|| self.down.get(&id))
            .map(|s| s.label.as_str())
    }

    /// Total number of scripts across both directions
    pub fn len(&self) -> usize {
        self.up.len() + self.down.len()
    }

    /// Returns true if no scripts were found
    pub fn is_empty(&self) -> bool {
        self.up.is_empty() && self.down.is_empty()
    }
}

/// Result of scanning a migrations directory
#[derive(Debug, Clone, Default)]
pub struct Discovery {
    /// Scripts that parsed and loaded cleanly
    pub scripts: ScriptSet,

    /// Per-file problems, in file name order
    pub issues: Vec<DiscoveryIssue>,
}

impl Discovery {
    /// Issues that must block planning
    pub fn fatal_issues(&self) -> Vec<&DiscoveryIssue> {
        self.issues.iter().filter(|i| i.is_fatal()).collect()
    }

    /// Returns true if any issue blocks planning
    pub fn has_fatal_issues(&self) -> bool {
        self.issues.iter().any(DiscoveryIssue::is_fatal)
    }
}

/// Parse a file name stem of the form `<identifier>__<label>`.
///
/// The identifier is the text before the first separator; the label is
/// everything after it and may itself contain the separator.
pub fn parse_stem(stem: &str) -> Result<(MigrationId, &str), String> {
    let (id_text, label) = stem
        .split_once(NAME_SEPARATOR)
        .ok_or_else(|| format!("expected '<identifier>{}<label>'", NAME_SEPARATOR))?;

    let id = MigrationId::parse(id_text)
        .ok_or_else(|| format!("identifier '{}' is not a decimal timestamp", id_text))?;

    if label.is_empty() {
        return Err("label is empty".to_string());
    }

    Ok((id, label))
}

/// Scan `dir` for migration scripts.
///
/// Only an unreadable directory is an error. Per-file problems are returned
/// in [`Discovery::issues`] and the offending files are skipped.
pub fn discover(dir: &Path) -> CoreResult<Discovery> {
    let entries = std::fs::read_dir(dir).map_err(|e| CoreError::MigrationsDirUnreadable {
        path: dir.display().to_string(),
        source: e,
    })?;

    let mut files: Vec<PathBuf> = Vec::new();
    for entry in entries {
        match entry {
            Ok(entry) => {
                let path = entry.path();
                if path.is_file() {
                    files.push(path);
                }
            }
            Err(e) => log::warn!("Skipping unreadable entry in {}: {}", dir.display(), e),
        }
    }
    files.sort();

    let mut issues = Vec::new();
    let mut candidates: BTreeMap<(MigrationId, Direction), Vec<MigrationScript>> =
        BTreeMap::new();

    for path in files {
        let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
            log::debug!("Ignoring non UTF-8 file name: {}", path.display());
            continue;
        };
        let Some((direction, stem)) = Direction::classify(file_name) else {
            log::debug!("Ignoring non-migration file: {}", file_name);
            continue;
        };

        let (id, label) = match parse_stem(stem) {
            Ok(parsed) => parsed,
            Err(reason) => {
                issues.push(DiscoveryIssue::MalformedName {
                    file: file_name.to_string(),
                    reason,
                });
                continue;
            }
        };

        let body = match std::fs::read_to_string(&path) {
            Ok(body) => body,
            Err(e) => {
                issues.push(DiscoveryIssue::Unreadable {
                    file: file_name.to_string(),
                    message: e.to_string(),
                });
                continue;
            }
        };

        let script = MigrationScript {
            id,
            label: label.to_string(),
            direction,
            path: path.clone(),
            body,
        };
        candidates
            .entry((id, direction))
            .or_default()
            .push(script);
    }

    let mut scripts = ScriptSet::new();
    for ((id, direction), mut group) in candidates {
        if group.len() > 1 {
            let files: Vec<String> = group.iter().map(MigrationScript::file_name).collect();
            issues.push(DiscoveryIssue::DuplicateIdentifier {
                id,
                direction,
                files: files.join(", "),
            });
            continue;
        }
        if let Some(script) = group.pop() {
            scripts.insert(script);
        }
    }

    for (id, up) in scripts.scripts(Direction::Up) {
        if let Some(down) = scripts.get(Direction::Down, *id) {
            if down.label != up.label {
                issues.push(DiscoveryIssue::LabelMismatch {
                    id: *id,
                    up_label: up.label.clone(),
                    down_label: down.label.clone(),
                });
            }
        }
    }

    for issue in &issues {
        if !issue.is_fatal() {
            log::warn!("{}", issue);
        }
    }
    log::debug!(
        "Discovered {} up and {} down scripts in {}",
        scripts.scripts(Direction::Up).len(),
        scripts.scripts(Direction::Down).len(),
        dir.display()
    );

    Ok(Discovery { scripts, issues })
}

#[cfg(test)]
#[path = "script_test.rs"]
mod tests;
