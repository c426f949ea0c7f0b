// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Error taxonomy and non-fatal diagnostics.
//!
//! Only two conditions stop generation: no structures at all, and an output
//! file that cannot be created. Everything else the tables can get wrong is
//! absorbed into best-effort output and reported as a [`Diagnostic`].

use crate::config::ConfigError;
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Generation errors.
#[derive(Debug, Error)]
pub enum GenError {
    #[error("No structure data supplied")]
    InputAbsent,

    #[error("Error opening output file '{}': {source}", path.display())]
    OutputUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Structure '{0}' references itself through its members")]
    CyclicReference(String),

    #[error("Banner template error: {0}")]
    Template(#[from] tera::Error),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

pub type Result<T> = std::result::Result<T, GenError>;

/// A table anomaly that was absorbed instead of raised.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub structure: String,
    pub field: String,
    pub kind: DiagnosticKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// Scalar type whose size matches no swap bucket; left unswapped.
    UnrecognizedTypeSize { data_type: String, size: usize },
    /// Type name known neither as a primitive nor as a structure; sized as 0.
    UnknownType { data_type: String },
    /// Structure without any declared member; left out of both artifacts.
    EmptyStructure,
}

impl Diagnostic {
    pub fn new(structure: &str, field: &str, kind: DiagnosticKind) -> Self {
        Self {
            structure: structure.to_string(),
            field: field.to_string(),
            kind,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            DiagnosticKind::UnrecognizedTypeSize { data_type, size } => write!(
                f,
                "{}.{}: {} has no swap for {} bytes, left as-is",
                self.structure, self.field, data_type, size
            ),
            DiagnosticKind::UnknownType { data_type } => write!(
                f,
                "{}.{}: unknown data type '{}'",
                self.structure, self.field, data_type
            ),
            DiagnosticKind::EmptyStructure => {
                write!(f, "{}: no members, structure skipped", self.structure)
            }
        }
    }
}
