// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Emission driver: lays out and plans every structure once, renders both
//! artifacts and writes them.

use crate::error::{Diagnostic, GenError, Result};
use crate::layout::{LayoutEngine, StructLayout};
use crate::model::Project;
use crate::render::banner::{render_banner, render_template};
use crate::render::header::render_header;
use crate::render::source::render_source;
use crate::render::Provenance;
use crate::swap::Plans;
use std::fs;
use std::path::{Path, PathBuf};

/// Knobs of one generation run.
#[derive(Debug, Clone)]
pub struct GeneratorOptions {
    pub output_dir: PathBuf,
    /// Replaces the discovered `<system>_types` base name.
    pub base_name: Option<String>,
    /// Banner values; stamped from the project when absent.
    pub provenance: Option<Provenance>,
    /// Tera template replacing the default banner.
    pub banner_template: Option<String>,
}

impl Default for GeneratorOptions {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            base_name: None,
            provenance: None,
            banner_template: None,
        }
    }
}

/// Rendered text of both artifacts.
#[derive(Debug, Clone)]
pub struct Artifacts {
    pub base_name: String,
    pub header: String,
    pub source: String,
}

impl Artifacts {
    pub fn header_file_name(&self) -> String {
        format!("{}.h", self.base_name)
    }

    pub fn source_file_name(&self) -> String {
        format!("{}.c", self.base_name)
    }
}

/// Outcome of [`Generator::write_to`].
#[derive(Debug, Default)]
pub struct GenerationReport {
    pub base_name: String,
    pub structures: usize,
    pub bit_swap_functions: usize,
    pub files_written: Vec<PathBuf>,
    /// Artifacts that could not be written; the others are unaffected.
    pub failures: Vec<GenError>,
    pub diagnostics: Vec<Diagnostic>,
}

impl GenerationReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// Print a human-readable report to stdout.
    pub fn summary(&self) {
        println!("\n{}", "=".repeat(60));
        println!("  Type Swap Generation Report");
        println!("{}", "=".repeat(60));
        println!();
        println!("  [OK] Structures:      {}", self.structures);
        println!("  [OK] Bit swaps:       {}", self.bit_swap_functions);
        for path in &self.files_written {
            println!("  [OK] Wrote:           {}", path.display());
        }
        for failure in &self.failures {
            println!("  [FAIL] {failure}");
        }
        if !self.diagnostics.is_empty() {
            println!();
            println!("  Diagnostics ({}):", self.diagnostics.len());
            for diagnostic in &self.diagnostics {
                println!("    - {diagnostic}");
            }
        }
        println!();
        println!("{}", "=".repeat(60));
    }
}

/// Generation state for one project.
pub struct Generator {
    project: Project,
    options: GeneratorOptions,
    layouts: Vec<StructLayout>,
    plans: Plans,
}

impl Generator {
    /// Lay out and plan every structure. Fails when there is nothing to
    /// generate.
    pub fn new(project: Project, options: GeneratorOptions) -> Result<Self> {
        if project.structures().is_empty() {
            return Err(GenError::InputAbsent);
        }

        tracing::info!(
            project = %project.name,
            structures = project.structures().len(),
            "computing layouts"
        );
        let layouts = LayoutEngine::new(&project).layout_all();
        let plans = Plans::build(&project, &layouts);

        Ok(Self {
            project,
            options,
            layouts,
            plans,
        })
    }

    pub fn project(&self) -> &Project {
        &self.project
    }

    pub fn layouts(&self) -> &[StructLayout] {
        &self.layouts
    }

    pub fn plans(&self) -> &Plans {
        &self.plans
    }

    pub fn base_name(&self) -> String {
        self.options
            .base_name
            .clone()
            .unwrap_or_else(|| self.project.base_name())
    }

    /// Offset-resolution and planning anomalies, in that order.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.project
            .diagnostics()
            .iter()
            .chain(&self.plans.diagnostics)
            .cloned()
            .collect()
    }

    fn provenance(&self) -> Provenance {
        let mut provenance = self
            .options
            .provenance
            .clone()
            .unwrap_or_else(|| Provenance::new(&self.project.name));
        if provenance.groups.is_empty() {
            provenance.groups = self.project.groups.clone();
        }
        if provenance.tables.is_empty() {
            let tables = self
                .project
                .structures()
                .iter()
                .map(|s| s.name.clone())
                .collect();
            provenance.with_tables(tables)
        } else {
            provenance
        }
    }

    fn banner(&self) -> Result<String> {
        let provenance = self.provenance();
        match &self.options.banner_template {
            Some(template) => Ok(render_template(template, &provenance)?),
            None => Ok(render_banner(&provenance)),
        }
    }

    /// Render both artifacts in memory.
    pub fn render(&self) -> Result<Artifacts> {
        let base_name = self.base_name();
        let banner = self.banner()?;

        let header = render_header(&self.project, &self.layouts, &banner, &base_name);
        let source = render_source(&self.project, &self.plans, &banner, &base_name);
        tracing::debug!(
            header_bytes = header.len(),
            source_bytes = source.len(),
            "rendered artifacts"
        );

        Ok(Artifacts {
            base_name,
            header,
            source,
        })
    }

    /// Write both artifacts into the configured output directory.
    pub fn write(&self) -> Result<GenerationReport> {
        self.write_to(&self.options.output_dir)
    }

    /// Write `<base>.h` and `<base>.c` into `dir`. A file that cannot be
    /// written is recorded in the report without stopping the other.
    pub fn write_to(&self, dir: impl AsRef<Path>) -> Result<GenerationReport> {
        let dir = dir.as_ref();
        let artifacts = self.render()?;

        if let Err(e) = fs::create_dir_all(dir) {
            tracing::warn!(dir = %dir.display(), error = %e, "could not create output directory");
        }

        let mut report = GenerationReport {
            base_name: artifacts.base_name.clone(),
            structures: self.layouts.len(),
            bit_swap_functions: self.plans.bit_swaps.iter().flatten().count(),
            diagnostics: self.diagnostics(),
            ..Default::default()
        };

        for (file_name, text) in [
            (artifacts.header_file_name(), &artifacts.header),
            (artifacts.source_file_name(), &artifacts.source),
        ] {
            let path = dir.join(file_name);
            match fs::write(&path, text) {
                Ok(()) => {
                    tracing::info!(path = %path.display(), "[OK] wrote artifact");
                    report.files_written.push(path);
                }
                Err(source) => {
                    let error = GenError::OutputUnavailable { path, source };
                    tracing::error!("{error}");
                    report.failures.push(error);
                }
            }
        }

        Ok(report)
    }
}
