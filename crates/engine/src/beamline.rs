// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Beamline model lookup.
//!
//! Each beamline model lives in `<beamlines_dir>/<name>/beamline.toml`:
//!
//! ```toml
//! details = ["IR2HBL-details.mac"]
//! aux_data = ["aperture"]
//!
//! [source_properties]
//! proton = "source-proton.txt"
//! ion_6_12_6 = "source-carbon.txt"
//!
//! [range_shifters]
//! RS3 = "rs3.mac"
//! ```
//!
//! Radiation types are matched on their sanitized lowercase form.

use crate::error::JobError;
use mc_core::sanitize_name;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Name of the per-model descriptor file
pub const MODEL_FILE: &str = "beamline.toml";

#[derive(Debug, Clone, Default, Deserialize)]
struct ModelFile {
    #[serde(default)]
    details: Vec<PathBuf>,
    #[serde(default)]
    aux_data: Vec<PathBuf>,
    #[serde(default)]
    source_properties: BTreeMap<String, PathBuf>,
    #[serde(default)]
    range_shifters: BTreeMap<String, PathBuf>,
    #[serde(default)]
    range_modulators: BTreeMap<String, PathBuf>,
}

/// Commissioned model of one beamline, with absolute file paths
#[derive(Debug, Clone, PartialEq)]
pub struct BeamlineModel {
    pub name: String,
    pub dir: PathBuf,
    /// Detail macros copied once per workspace
    pub details: Vec<PathBuf>,
    /// Auxiliary data files or directories
    pub aux_data: Vec<PathBuf>,
    pub source_properties: BTreeMap<String, PathBuf>,
    pub range_shifters: BTreeMap<String, PathBuf>,
    pub range_modulators: BTreeMap<String, PathBuf>,
}

/// Key under which a radiation type's data is stored
pub fn radiation_key(radiation_type: &str) -> String {
    sanitize_name(radiation_type.trim()).to_lowercase()
}

impl BeamlineModel {
    pub fn supports(&self, radiation_type: &str) -> bool {
        self.source_properties
            .contains_key(&radiation_key(radiation_type))
    }

    pub fn source_properties_for(&self, radiation_type: &str) -> Option<&Path> {
        self.source_properties
            .get(&radiation_key(radiation_type))
            .map(PathBuf::as_path)
    }

    pub fn range_shifter(&self, id: &str) -> Option<&Path> {
        self.range_shifters.get(id).map(PathBuf::as_path)
    }

    pub fn range_modulator(&self, id: &str) -> Option<&Path> {
        self.range_modulators.get(id).map(PathBuf::as_path)
    }
}

/// Source of beamline models
pub trait BeamlineCatalog: Send + Sync {
    /// Look up a model by name; `Ok(None)` when no such beamline exists
    fn lookup(&self, name: &str) -> Result<Option<BeamlineModel>, JobError>;
}

/// Catalog backed by a directory of beamline models
#[derive(Debug, Clone)]
pub struct DirectoryCatalog {
    root: PathBuf,
}

impl DirectoryCatalog {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl BeamlineCatalog for DirectoryCatalog {
    fn lookup(&self, name: &str) -> Result<Option<BeamlineModel>, JobError> {
        let dir = self.root.join(name);
        let path = dir.join(MODEL_FILE);
        let text = match std::fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(JobError::io(&path, e)),
        };
        let file: ModelFile = toml::from_str(&text).map_err(|e| {
            JobError::Configuration(format!("invalid beamline model {}: {}", path.display(), e))
        })?;

        let abs = |p: PathBuf| if p.is_absolute() { p } else { dir.join(p) };
        let abs_map = |m: BTreeMap<String, PathBuf>| {
            m.into_iter()
                .map(|(k, v)| (k, abs(v)))
                .collect::<BTreeMap<_, _>>()
        };
        Ok(Some(BeamlineModel {
            name: name.to_string(),
            details: file.details.into_iter().map(abs).collect(),
            aux_data: file.aux_data.into_iter().map(abs).collect(),
            source_properties: file
                .source_properties
                .into_iter()
                .map(|(k, v)| (radiation_key(&k), abs(v)))
                .collect(),
            range_shifters: abs_map(file.range_shifters),
            range_modulators: abs_map(file.range_modulators),
            dir,
        }))
    }
}

#[cfg(test)]
#[path = "beamline_tests.rs"]
mod tests;
