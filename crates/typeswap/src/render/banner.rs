// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Provenance banner at the top of both artifacts.

use serde::Serialize;
use tera::{Context, Tera};

const NAME_SEPARATOR: &str = ",\n             ";

/// Who generated the artifacts, from what, and when.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Provenance {
    pub created: String,
    pub user: String,
    pub project: String,
    pub script: String,
    /// Source table names; printed sorted.
    pub tables: Vec<String>,
    /// Table groups the run was made for; printed sorted.
    pub groups: Vec<String>,
}

impl Provenance {
    /// Stamped with the current local time.
    pub fn new(project: impl Into<String>) -> Self {
        Self {
            created: chrono::Local::now()
                .format("%a %b %d %H:%M:%S %Y")
                .to_string(),
            user: String::new(),
            project: project.into(),
            script: env!("CARGO_PKG_NAME").to_string(),
            tables: Vec::new(),
            groups: Vec::new(),
        }
    }

    pub fn with_created(mut self, created: impl Into<String>) -> Self {
        self.created = created.into();
        self
    }

    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = user.into();
        self
    }

    pub fn with_script(mut self, script: impl Into<String>) -> Self {
        self.script = script.into();
        self
    }

    pub fn with_tables(mut self, tables: Vec<String>) -> Self {
        self.tables = tables;
        self
    }

    pub fn with_groups(mut self, groups: Vec<String>) -> Self {
        self.groups = groups;
        self
    }
}

fn sorted(names: &[String]) -> Vec<&str> {
    let mut names: Vec<&str> = names.iter().map(String::as_str).collect();
    names.sort_unstable();
    names
}

/// Default banner: a C comment followed by a blank line.
pub fn render_banner(provenance: &Provenance) -> String {
    let mut out = format!(
        "/* Created : {}\n   User    : {}\n   Project : {}\n   Script  : {}\n",
        provenance.created, provenance.user, provenance.project, provenance.script
    );
    if !provenance.tables.is_empty() {
        out.push_str(&format!(
            "   Table(s): {}\n",
            sorted(&provenance.tables).join(NAME_SEPARATOR)
        ));
    }
    if !provenance.groups.is_empty() {
        out.push_str(&format!(
            "   Group(s): {}\n",
            sorted(&provenance.groups).join(NAME_SEPARATOR)
        ));
    }
    out.push_str("*/\n\n");
    out
}

/// Render a user-supplied tera template. The context exposes `created`,
/// `user`, `project`, `script` and the sorted `tables` and `groups`.
pub fn render_template(template: &str, provenance: &Provenance) -> Result<String, tera::Error> {
    let mut ctx = Context::from_serialize(provenance)?;
    ctx.insert("tables", &sorted(&provenance.tables));
    ctx.insert("groups", &sorted(&provenance.groups));
    Tera::one_off(template, &ctx, false)
}
