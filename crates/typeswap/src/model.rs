// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Typed table rows, structure descriptors and the project they form.
//!
//! Rows are ingested once into [`FieldRow`] values; every later pass works on
//! these instead of looking columns up by name. A [`Project`] owns the
//! structures in dependency order (embedded types before their containers)
//! together with the resolved byte offsets and the type catalog.

use crate::error::{Diagnostic, DiagnosticKind, GenError, Result};
use crate::layout::{resolve_offsets, ResolvedOffsets};
use crate::types::{TypeCatalog, TypeTable};
use serde::Serialize;
use std::collections::{HashMap, HashSet};

/// Size of the synthesized primary protocol header, in bytes.
pub const PRIMARY_HEADER_SIZE: usize = 6;
/// Size of the synthesized secondary protocol header, in bytes.
pub const SECONDARY_HEADER_SIZE: usize = 6;
/// Bytes added in front of a structure that carries a message ID.
pub const HEADER_SIZE: usize = PRIMARY_HEADER_SIZE + SECONDARY_HEADER_SIZE;

/// One structure table row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldRow {
    pub structure: String,
    pub variable: String,
    pub data_type: String,
    /// Array extents, outermost first; empty for scalars.
    pub array_size: Vec<usize>,
    pub bit_length: Option<u32>,
    pub description: String,
    /// Rate per data stream name; streams without a rate are absent.
    pub rates: HashMap<String, String>,
    /// Pre-resolved byte offset of the (first element of the) variable,
    /// excluding any synthesized header.
    pub offset: Option<usize>,
}

impl FieldRow {
    pub fn new(structure: &str, variable: &str, data_type: &str) -> Self {
        Self {
            structure: structure.to_string(),
            variable: variable.to_string(),
            data_type: data_type.to_string(),
            array_size: Vec::new(),
            bit_length: None,
            description: String::new(),
            rates: HashMap::new(),
            offset: None,
        }
    }

    #[must_use]
    pub fn with_array(mut self, extents: &[usize]) -> Self {
        self.array_size = extents.to_vec();
        self
    }

    #[must_use]
    pub fn with_bits(mut self, bits: u32) -> Self {
        self.bit_length = Some(bits);
        self
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    #[must_use]
    pub fn with_rate(mut self, stream: &str, rate: &str) -> Self {
        self.rates.insert(stream.to_string(), rate.to_string());
        self
    }

    #[must_use]
    pub fn with_offset(mut self, offset: usize) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Rows named like `arr[2]` instantiate one element of an array that is
    /// declared by its own row.
    pub fn is_array_member(&self) -> bool {
        self.variable.ends_with(']')
    }

    pub fn is_array(&self) -> bool {
        !self.array_size.is_empty()
    }

    /// Bit length of a scalar bit-field. Arrays never pack.
    pub fn bit_field(&self) -> Option<u32> {
        if self.is_array() {
            None
        } else {
            self.bit_length
        }
    }

    /// Number of elements (1 for scalars).
    pub fn element_count(&self) -> usize {
        self.array_size.iter().product()
    }
}

/// A structure and its rows, in table order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StructureDescriptor {
    pub name: String,
    pub description: String,
    /// Transport message identifier; non-empty adds the protocol header.
    pub message_id: Option<String>,
    /// `System` data field, used to name the output files.
    pub system: Option<String>,
    pub rows: Vec<FieldRow>,
}

impl StructureDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            message_id: None,
            system: None,
            rows: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    #[must_use]
    pub fn with_message_id(mut self, id: impl Into<String>) -> Self {
        self.message_id = Some(id.into());
        self
    }

    #[must_use]
    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    #[must_use]
    pub fn with_rows(mut self, rows: Vec<FieldRow>) -> Self {
        self.rows = rows;
        self
    }

    pub fn has_header(&self) -> bool {
        self.message_id.as_deref().is_some_and(|id| !id.is_empty())
    }

    pub fn header_size(&self) -> usize {
        if self.has_header() {
            HEADER_SIZE
        } else {
            0
        }
    }

    /// Declaration rows: array members skipped, first row per name wins.
    pub fn declared_fields(&self) -> impl Iterator<Item = &FieldRow> {
        let mut seen = HashSet::new();
        self.rows
            .iter()
            .filter(move |row| !row.is_array_member() && seen.insert(row.variable.as_str()))
    }
}

/// Group flat rows by structure name, keeping first-seen order.
pub fn group_rows(rows: impl IntoIterator<Item = FieldRow>) -> Vec<StructureDescriptor> {
    let mut slots: HashMap<String, usize> = HashMap::new();
    let mut out: Vec<StructureDescriptor> = Vec::new();

    for row in rows {
        let slot = *slots.entry(row.structure.clone()).or_insert_with(|| {
            out.push(StructureDescriptor::new(row.structure.clone()));
            out.len() - 1
        });
        out[slot].rows.push(row);
    }
    out
}

/// Reorder structures so that every embedded type precedes its containers.
///
/// Independent structures keep their relative input order.
pub fn dependency_order(
    structures: Vec<StructureDescriptor>,
) -> Result<Vec<StructureDescriptor>> {
    #[derive(Clone, Copy, PartialEq)]
    enum Mark {
        Unvisited,
        Visiting,
        Done,
    }

    fn visit(
        node: usize,
        deps: &[Vec<usize>],
        marks: &mut [Mark],
        order: &mut Vec<usize>,
        names: &[&str],
    ) -> Result<()> {
        match marks[node] {
            Mark::Done => return Ok(()),
            Mark::Visiting => return Err(GenError::CyclicReference(names[node].to_string())),
            Mark::Unvisited => {}
        }
        marks[node] = Mark::Visiting;
        for &dep in &deps[node] {
            visit(dep, deps, marks, order, names)?;
        }
        marks[node] = Mark::Done;
        order.push(node);
        Ok(())
    }

    let names: Vec<&str> = structures.iter().map(|s| s.name.as_str()).collect();
    let slots: HashMap<&str, usize> = names.iter().enumerate().map(|(i, n)| (*n, i)).collect();
    let deps: Vec<Vec<usize>> = structures
        .iter()
        .map(|s| {
            s.declared_fields()
                .filter_map(|f| slots.get(f.data_type.as_str()).copied())
                .collect()
        })
        .collect();

    let mut marks = vec![Mark::Unvisited; structures.len()];
    let mut order = Vec::with_capacity(structures.len());
    for node in 0..structures.len() {
        visit(node, &deps, &mut marks, &mut order, &names)?;
    }

    let mut taken: Vec<Option<StructureDescriptor>> = structures.into_iter().map(Some).collect();
    Ok(order
        .into_iter()
        .filter_map(|node| taken[node].take())
        .collect())
}

/// All structures of one generation run, ready for layout and planning.
#[derive(Debug, Clone)]
pub struct Project {
    pub name: String,
    /// Project-level `System` value; wins over the structures' own.
    pub system: Option<String>,
    /// Data stream names, in column order.
    pub data_streams: Vec<String>,
    /// Free text copied verbatim after the include guard.
    pub includes: Vec<String>,
    /// Table groups the run covers, listed in the banner.
    pub groups: Vec<String>,
    structures: Vec<StructureDescriptor>,
    offsets: Vec<ResolvedOffsets>,
    types: TypeTable,
    diagnostics: Vec<Diagnostic>,
}

impl Project {
    pub fn builder(name: impl Into<String>) -> ProjectBuilder {
        ProjectBuilder {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Structures in dependency order.
    pub fn structures(&self) -> &[StructureDescriptor] {
        &self.structures
    }

    pub fn structure(&self, index: usize) -> &StructureDescriptor {
        &self.structures[index]
    }

    pub fn structure_index(&self, name: &str) -> Option<usize> {
        self.structures.iter().position(|s| s.name == name)
    }

    pub fn types(&self) -> &TypeTable {
        &self.types
    }

    /// Resolved offset of `variable` inside structure `index`, header excluded.
    pub fn variable_offset(&self, index: usize, variable: &str) -> Option<usize> {
        self.offsets[index].offset(variable)
    }

    /// Structure size without the synthesized header.
    pub fn base_size(&self, index: usize) -> usize {
        self.offsets[index].size
    }

    /// Anomalies found while resolving offsets.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Structures no other structure embeds.
    pub fn root_structures(&self) -> impl Iterator<Item = &StructureDescriptor> {
        let embedded: HashSet<&str> = self
            .structures
            .iter()
            .flat_map(|s| s.declared_fields().map(|f| f.data_type.as_str()))
            .collect();
        self.structures
            .iter()
            .filter(move |s| !embedded.contains(s.name.as_str()))
    }

    /// Value of the `System` field: the project's own, else the first root
    /// structure's, else empty.
    pub fn system_name(&self) -> String {
        self.system
            .clone()
            .filter(|s| !s.is_empty())
            .or_else(|| self.root_structures().next().and_then(|s| s.system.clone()))
            .unwrap_or_default()
    }

    /// Base name shared by both output files.
    pub fn base_name(&self) -> String {
        format!("{}_types", self.system_name())
    }
}

/// Builder for [`Project`].
#[derive(Debug, Default)]
pub struct ProjectBuilder {
    name: String,
    system: Option<String>,
    data_streams: Vec<String>,
    includes: Vec<String>,
    groups: Vec<String>,
    types: Option<TypeTable>,
    structures: Vec<StructureDescriptor>,
    rows: Vec<FieldRow>,
}

impl ProjectBuilder {
    pub fn system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    pub fn data_streams(mut self, streams: Vec<String>) -> Self {
        self.data_streams = streams;
        self
    }

    pub fn includes(mut self, lines: Vec<String>) -> Self {
        self.includes = lines;
        self
    }

    pub fn groups(mut self, groups: Vec<String>) -> Self {
        self.groups = groups;
        self
    }

    /// Replace the built-in primitive table.
    pub fn types(mut self, types: TypeTable) -> Self {
        self.types = Some(types);
        self
    }

    pub fn structure(mut self, structure: StructureDescriptor) -> Self {
        self.structures.push(structure);
        self
    }

    /// Flat rows; each is appended to the structure it names, creating the
    /// structure if it was not declared.
    pub fn rows(mut self, rows: impl IntoIterator<Item = FieldRow>) -> Self {
        self.rows.extend(rows);
        self
    }

    /// Group, order and resolve. Structures without a declared member are
    /// dropped and reported.
    pub fn build(self) -> Result<Project> {
        let mut structures = self.structures;
        for grouped in group_rows(self.rows) {
            match structures.iter_mut().find(|s| s.name == grouped.name) {
                Some(existing) => existing.rows.extend(grouped.rows),
                None => structures.push(grouped),
            }
        }

        let mut diagnostics = Vec::new();
        structures.retain(|s| {
            let keep = s.declared_fields().next().is_some();
            if !keep {
                tracing::warn!(structure = %s.name, "structure has no members, skipped");
                diagnostics.push(Diagnostic::new(&s.name, "", DiagnosticKind::EmptyStructure));
            }
            keep
        });

        let structures = dependency_order(structures)?;
        let mut types = self.types.unwrap_or_else(TypeTable::builtin);
        let mut offsets = Vec::with_capacity(structures.len());

        for structure in &structures {
            let resolved = resolve_offsets(structure, &types, &mut diagnostics);
            types.define_structure(&structure.name, resolved.size + structure.header_size());
            tracing::debug!(
                structure = %structure.name,
                size = resolved.size,
                "resolved structure offsets"
            );
            offsets.push(resolved);
        }

        debug_assert!(structures.iter().all(|s| types.size_of(&s.name).is_some()));

        Ok(Project {
            name: self.name,
            system: self.system,
            data_streams: self.data_streams,
            includes: self.includes,
            groups: self.groups,
            structures,
            offsets,
            types,
            diagnostics,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(structures: &[StructureDescriptor]) -> Vec<&str> {
        structures.iter().map(|s| s.name.as_str()).collect()
    }

    #[test]
    fn test_declared_fields_skip_members_and_duplicates() {
        let s = StructureDescriptor::new("Frame").with_rows(vec![
            FieldRow::new("Frame", "samples", "uint16").with_array(&[2]),
            FieldRow::new("Frame", "samples[0]", "uint16"),
            FieldRow::new("Frame", "samples[1]", "uint16"),
            FieldRow::new("Frame", "count", "uint8"),
            FieldRow::new("Frame", "count", "uint32"),
        ]);

        let declared: Vec<_> = s
            .declared_fields()
            .map(|f| (f.variable.as_str(), f.data_type.as_str()))
            .collect();
        assert_eq!(declared, vec![("samples", "uint16"), ("count", "uint8")]);
    }

    #[test]
    fn test_group_rows_first_seen_order() {
        let grouped = group_rows(vec![
            FieldRow::new("B", "x", "uint8"),
            FieldRow::new("A", "y", "uint8"),
            FieldRow::new("B", "z", "uint8"),
        ]);
        assert_eq!(names(&grouped), vec!["B", "A"]);
        assert_eq!(grouped[0].rows.len(), 2);
    }

    #[test]
    fn test_dependency_order_places_embedded_first() {
        let outer = StructureDescriptor::new("Outer").with_rows(vec![
            FieldRow::new("Outer", "inner", "Inner"),
            FieldRow::new("Outer", "leaf", "Leaf").with_array(&[2]),
        ]);
        let unrelated = StructureDescriptor::new("Other");
        let inner = StructureDescriptor::new("Inner")
            .with_rows(vec![FieldRow::new("Inner", "leaf", "Leaf")]);
        let leaf = StructureDescriptor::new("Leaf");

        let ordered = dependency_order(vec![outer, unrelated, inner, leaf]).unwrap();
        assert_eq!(names(&ordered), vec!["Leaf", "Inner", "Outer", "Other"]);
    }

    #[test]
    fn test_dependency_cycle_rejected() {
        let a = StructureDescriptor::new("A").with_rows(vec![FieldRow::new("A", "b", "B")]);
        let b = StructureDescriptor::new("B").with_rows(vec![FieldRow::new("B", "a", "A")]);
        assert!(matches!(
            dependency_order(vec![a, b]),
            Err(GenError::CyclicReference(_))
        ));
    }

    #[test]
    fn test_header_requires_non_empty_message_id() {
        assert!(!StructureDescriptor::new("A").with_message_id("").has_header());
        assert_eq!(
            StructureDescriptor::new("A")
                .with_message_id("0x1800")
                .header_size(),
            HEADER_SIZE
        );
    }

    #[test]
    fn test_base_name_falls_back_to_root_structure() {
        let project = Project::builder("demo")
            .structure(
                StructureDescriptor::new("Child")
                    .with_system("wrong")
                    .with_rows(vec![FieldRow::new("Child", "v", "uint8")]),
            )
            .structure(
                StructureDescriptor::new("Root")
                    .with_system("ACS")
                    .with_rows(vec![FieldRow::new("Root", "child", "Child")]),
            )
            .build()
            .unwrap();
        assert_eq!(project.base_name(), "ACS_types");

        let project = Project::builder("demo")
            .system("GNC")
            .structure(StructureDescriptor::new("Root").with_system("ACS"))
            .build()
            .unwrap();
        assert_eq!(project.base_name(), "GNC_types");

        let project = Project::builder("demo")
            .structure(StructureDescriptor::new("Root"))
            .build()
            .unwrap();
        assert_eq!(project.base_name(), "_types");
    }

    #[test]
    fn test_builder_merges_flat_rows() {
        let project = Project::builder("demo")
            .structure(StructureDescriptor::new("Sensor").with_description("probe"))
            .rows(vec![
                FieldRow::new("Sensor", "id", "uint16"),
                FieldRow::new("Extra", "v", "uint8"),
            ])
            .build()
            .unwrap();
        assert_eq!(project.structures().len(), 2);
        assert_eq!(project.structure(0).description, "probe");
        assert_eq!(project.structure(0).rows.len(), 1);
        assert_eq!(project.types().size_of("Sensor"), Some(2));
    }

    #[test]
    fn test_structures_without_members_are_skipped() {
        let project = Project::builder("demo")
            .structure(StructureDescriptor::new("Empty"))
            .rows(vec![
                FieldRow::new("OnlyMembers", "v[0]", "uint8"),
                FieldRow::new("Kept", "v", "uint8"),
            ])
            .build()
            .unwrap();

        assert_eq!(names(project.structures()), vec!["Kept"]);
        let skipped: Vec<_> = project
            .diagnostics()
            .iter()
            .filter(|d| d.kind == DiagnosticKind::EmptyStructure)
            .map(|d| d.structure.as_str())
            .collect();
        assert_eq!(skipped, vec!["Empty", "OnlyMembers"]);
    }
}
