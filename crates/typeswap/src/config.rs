// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Project file loading.
//!
//! A project file lists the structure tables row by row, the data streams
//! whose rates annotate each member, extra primitive types and the free-text
//! include block. YAML and JSON are accepted, chosen by file extension.
//!
//! ```yaml
//! project: Demo
//! system: demo
//! data_streams: [Stream1, Stream2]
//! structures:
//!   - name: Sensor
//!     rows:
//!       - { name: id, type: uint16, rates: { Stream2: 10 } }
//!       - { name: samples, type: float, array_size: "2, 3" }
//!       - { name: flags, type: uint8, bit_length: 3 }
//! ```

use crate::error::Result;
use crate::model::{FieldRow, Project, StructureDescriptor};
use crate::types::{PrimitiveType, TypeTable};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Root of a project file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Project name, shown in the banner.
    #[serde(default = "default_project_name")]
    pub project: String,

    /// System label; names the output files `<system>_types`.
    #[serde(default)]
    pub system: Option<String>,

    /// Data stream names, in the order their rates are printed.
    #[serde(default)]
    pub data_streams: Vec<String>,

    /// Lines copied verbatim after the include guard.
    #[serde(default)]
    pub includes: Vec<String>,

    /// Table groups the project covers; listed in the banner.
    #[serde(default)]
    pub groups: Vec<String>,

    /// Tera template replacing the default banner.
    #[serde(default)]
    pub banner_template: Option<String>,

    /// Extra primitive types, overriding built-ins of the same name.
    #[serde(default)]
    pub data_types: Vec<PrimitiveType>,

    #[serde(default)]
    pub structures: Vec<StructureConfig>,
}

fn default_project_name() -> String {
    "typeswap".to_string()
}

/// One structure table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructureConfig {
    pub name: String,

    #[serde(default)]
    pub description: String,

    /// Non-empty value adds the protocol header members.
    #[serde(default)]
    pub message_id: Option<String>,

    #[serde(default)]
    pub system: Option<String>,

    #[serde(default)]
    pub rows: Vec<RowConfig>,
}

/// One structure table row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RowConfig {
    pub name: String,

    #[serde(rename = "type")]
    pub data_type: String,

    #[serde(default)]
    pub array_size: Option<ArraySize>,

    #[serde(default)]
    pub bit_length: Option<u32>,

    #[serde(default)]
    pub description: String,

    /// Rate per data stream; numbers and strings are both accepted.
    #[serde(default)]
    pub rates: HashMap<String, serde_yaml::Value>,

    /// Byte offset inside the structure, when already known.
    #[serde(default)]
    pub offset: Option<usize>,
}

/// Array extents, either in table form (`"2, 3"`) or as a list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ArraySize {
    Text(String),
    List(Vec<usize>),
}

impl ArraySize {
    pub fn extents(&self) -> std::result::Result<Vec<usize>, ConfigError> {
        match self {
            Self::List(dims) => Ok(dims.clone()),
            Self::Text(text) => text
                .split(',')
                .map(str::trim)
                .filter(|dim| !dim.is_empty())
                .map(|dim| {
                    dim.parse::<usize>().map_err(|_| {
                        ConfigError::Invalid(format!("bad array dimension '{dim}' in '{text}'"))
                    })
                })
                .collect(),
        }
    }
}

impl ProjectConfig {
    /// Load from a `.json` file, or YAML for any other extension.
    pub fn from_file<P: AsRef<Path>>(path: P) -> std::result::Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

        tracing::info!("Loading project from: {:?}", path);
        if is_json {
            Self::from_json_str(&content)
        } else {
            Self::from_yaml_str(&content)
        }
    }

    pub fn from_yaml_str(content: &str) -> std::result::Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_str(content: &str) -> std::result::Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject what the tables cannot express. Everything else is taken as
    /// well-formed.
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        for structure in &self.structures {
            if structure.name.trim().is_empty() {
                return Err(ConfigError::Invalid("structure without a name".into()));
            }
            for row in &structure.rows {
                if row.name.trim().is_empty() || row.data_type.trim().is_empty() {
                    return Err(ConfigError::Invalid(format!(
                        "row in '{}' needs both a name and a type",
                        structure.name
                    )));
                }
                if row.bit_length == Some(0) {
                    return Err(ConfigError::Invalid(format!(
                        "'{}.{}' has a zero bit length",
                        structure.name, row.name
                    )));
                }
                if let Some(size) = &row.array_size {
                    size.extents()?;
                }
            }
        }
        Ok(())
    }

    /// Type table: built-ins plus the configured data types.
    pub fn type_table(&self) -> TypeTable {
        let mut types = TypeTable::builtin();
        for def in &self.data_types {
            types.insert(def.clone());
        }
        types
    }

    /// Build the [`Project`]: rows typed, structures ordered, offsets
    /// resolved.
    pub fn into_project(self) -> Result<Project> {
        let types = self.type_table();
        let mut builder = Project::builder(self.project)
            .data_streams(self.data_streams)
            .includes(self.includes)
            .groups(self.groups)
            .types(types);
        if let Some(system) = self.system {
            builder = builder.system(system);
        }

        for structure in self.structures {
            let mut rows = Vec::with_capacity(structure.rows.len());
            for row in structure.rows {
                rows.push(row.into_field_row(&structure.name)?);
            }

            let mut descriptor = StructureDescriptor::new(&structure.name)
                .with_description(structure.description)
                .with_rows(rows);
            if let Some(id) = structure.message_id {
                descriptor = descriptor.with_message_id(id);
            }
            if let Some(system) = structure.system {
                descriptor = descriptor.with_system(system);
            }
            builder = builder.structure(descriptor);
        }

        builder.build()
    }
}

impl RowConfig {
    fn into_field_row(self, structure: &str) -> std::result::Result<FieldRow, ConfigError> {
        let mut row = FieldRow::new(structure, &self.name, &self.data_type)
            .with_description(self.description);
        if let Some(size) = &self.array_size {
            row = row.with_array(&size.extents()?);
        }
        if let Some(bits) = self.bit_length {
            row = row.with_bits(bits);
        }
        if let Some(offset) = self.offset {
            row = row.with_offset(offset);
        }
        for (stream, value) in &self.rates {
            if let Some(rate) = rate_text(value) {
                row = row.with_rate(stream, &rate);
            }
        }
        Ok(row)
    }
}

fn rate_text(value: &serde_yaml::Value) -> Option<String> {
    match value {
        serde_yaml::Value::String(s) if !s.is_empty() => Some(s.clone()),
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
