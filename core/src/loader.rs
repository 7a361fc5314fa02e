//! Encounter definition loading
//!
//! Two file formats are accepted:
//! - TOML: one or more `[[encounter]]` tables
//! - JSON: a single encounter object in the community camelCase layout
//!
//! Loading never fails because of one bad encounter. Definitions that do not
//! validate are kept apart with their reason so a UI can list them.

use std::fs;
use std::path::Path;

use cadence_types::{DefinitionFile, EncounterDefinition};
use hashbrown::HashSet;
use tracing::{debug, warn};

use crate::effects::ResourceProvider;
use crate::encounter::Encounter;
use crate::error::LoadError;

/// Result of turning definitions into encounters
#[derive(Debug, Default)]
pub struct LoadedEncounters {
    /// Initialized and ready to hand to an [`crate::EncounterManager`]
    pub valid: Vec<Encounter>,
    /// Failed validation. `description` holds the reason.
    pub invalid: Vec<Encounter>,
}

pub fn parse_definitions_toml(content: &str) -> Result<Vec<EncounterDefinition>, toml::de::Error> {
    let file: DefinitionFile = toml::from_str(content)?;
    Ok(file.encounters)
}

pub fn parse_definitions_json(content: &str) -> Result<Vec<EncounterDefinition>, serde_json::Error> {
    let encounter: EncounterDefinition = serde_json::from_str(content)?;
    Ok(vec![encounter])
}

/// Load definitions from a file, picking the format by extension
pub fn load_file(path: &Path) -> Result<Vec<EncounterDefinition>, LoadError> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);

    let is_toml = match extension.as_deref() {
        Some("toml") => true,
        Some("json") => false,
        _ => {
            return Err(LoadError::UnsupportedFormat {
                path: path.to_path_buf(),
            });
        }
    };

    let content = fs::read_to_string(path).map_err(|source| LoadError::ReadFile {
        path: path.to_path_buf(),
        source,
    })?;

    let definitions = if is_toml {
        parse_definitions_toml(&content).map_err(|source| LoadError::ParseToml {
            path: path.to_path_buf(),
            source,
        })?
    } else {
        parse_definitions_json(&content).map_err(|source| LoadError::ParseJson {
            path: path.to_path_buf(),
            source,
        })?
    };
    debug!(path = %path.display(), count = definitions.len(), "Loaded definitions");
    Ok(definitions)
}

/// Load every `.toml`/`.json` file under `dir` (recursive).
///
/// Unreadable files are logged and skipped.
pub fn load_dir(dir: &Path) -> Result<Vec<EncounterDefinition>, LoadError> {
    let mut definitions = Vec::new();
    if !dir.exists() {
        return Ok(definitions);
    }
    load_dir_recursive(dir, &mut definitions)?;
    Ok(definitions)
}

fn load_dir_recursive(dir: &Path, definitions: &mut Vec<EncounterDefinition>) -> Result<(), LoadError> {
    let entries = fs::read_dir(dir).map_err(|source| LoadError::ReadFile {
        path: dir.to_path_buf(),
        source,
    })?;

    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            load_dir_recursive(&path, definitions)?;
        } else if path
            .extension()
            .is_some_and(|ext| ext == "toml" || ext == "json")
        {
            match load_file(&path) {
                Ok(file_definitions) => definitions.extend(file_definitions),
                Err(e) => warn!(error = %e, "Skipping definition file"),
            }
        }
    }
    Ok(())
}

/// Initialize every definition and split by validity.
///
/// Duplicate ids keep the first definition.
pub fn build_encounters(
    definitions: &[EncounterDefinition],
    resources: &mut dyn ResourceProvider,
) -> LoadedEncounters {
    let mut loaded = LoadedEncounters::default();
    let mut seen = HashSet::new();

    for def in definitions {
        if !seen.insert(def.id.as_str()) {
            warn!(encounter = %def.id, "Duplicate encounter id, keeping the first");
            continue;
        }

        let mut encounter = Encounter::from_definition(def);
        match encounter.initialize(resources) {
            Ok(()) => loaded.valid.push(encounter),
            Err(err) => {
                encounter.description = err.to_string();
                loaded.invalid.push(encounter);
            }
        }
    }

    debug!(
        valid = loaded.valid.len(),
        invalid = loaded.invalid.len(),
        "Built encounters"
    );
    loaded
}
