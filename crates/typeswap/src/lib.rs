// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! typeswap - packed structure declarations and endian swap generator
//!
//! Turns a table-style description of fixed-layout binary records into two C
//! artifacts:
//!
//! - a types header with one `typedef struct` per record, every member
//!   annotated with its byte offset, size, stream rates and description
//! - a swap source with `byte_swap_<T>` / `bit_swap_<T>` functions converting
//!   a record between native and foreign byte (and bit-field) order
//!
//! # Pipeline
//!
//! ```text
//! ProjectConfig --> Project (grouped, dependency ordered, offsets resolved)
//!                      |
//!                      +--> LayoutEngine / BitFieldPacker --> render::header
//!                      +--> SwapPlanner / BitSwapPlanner  --> render::source
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use typeswap::{Generator, GeneratorOptions, ProjectConfig};
//!
//! let config = ProjectConfig::from_file("telemetry.yaml")?;
//! let generator = Generator::new(config.into_project()?, GeneratorOptions::default())?;
//! let report = generator.write_to("generated/")?;
//! report.summary();
//! ```

pub mod config;
pub mod error;
pub mod generator;
pub mod layout;
pub mod model;
pub mod render;
pub mod swap;
pub mod types;

pub use config::{ConfigError, ProjectConfig};
pub use error::{Diagnostic, DiagnosticKind, GenError, Result};
pub use generator::{Artifacts, GenerationReport, Generator, GeneratorOptions};
pub use layout::{BitFieldPacker, BitPackGroup, FieldLayout, LayoutEngine, StructLayout};
pub use model::{FieldRow, Project, StructureDescriptor};
pub use render::Provenance;
pub use swap::{
    BitSwapOp, BitSwapPlan, BitSwapPlanner, Direction, Plans, SwapEntry, SwapPlan, SwapPlanner,
    SwapStrategy,
};
pub use types::{BaseCategory, PrimitiveType, TypeCatalog, TypeTable};
