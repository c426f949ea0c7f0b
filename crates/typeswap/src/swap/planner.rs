// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Byte-swap planning.

use crate::error::{Diagnostic, DiagnosticKind};
use crate::layout::StructLayout;
use crate::model::Project;
use crate::swap::SwapStrategy;
use crate::types::{BaseCategory, TypeCatalog};
use serde::Serialize;
use std::collections::HashSet;

/// How one declared member is converted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SwapEntry {
    pub name: String,
    pub strategy: SwapStrategy,
    pub extents: Vec<usize>,
    /// Byte offset of the member, header included.
    pub offset: usize,
    pub element_size: usize,
}

impl SwapEntry {
    pub fn is_array(&self) -> bool {
        !self.extents.is_empty()
    }

    pub fn element_count(&self) -> usize {
        self.extents.iter().product()
    }
}

/// Body of one `byte_swap_<T>` function.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SwapPlan {
    pub structure: usize,
    pub name: String,
    pub entries: Vec<SwapEntry>,
    /// Ends with a call to the structure's bit-swap function.
    pub calls_bit_swap: bool,
}

/// Chooses a [`SwapStrategy`] for every unique member of a structure.
pub struct SwapPlanner<'a> {
    project: &'a Project,
    handled: HashSet<String>,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> SwapPlanner<'a> {
    pub fn new(project: &'a Project) -> Self {
        Self {
            project,
            handled: HashSet::new(),
            diagnostics: Vec::new(),
        }
    }

    pub fn plan(&mut self, index: usize, layout: &StructLayout) -> SwapPlan {
        let structure = self.project.structure(index);
        let types = self.project.types();
        self.handled.clear();

        let mut plan = SwapPlan {
            structure: index,
            name: structure.name.clone(),
            entries: Vec::new(),
            calls_bit_swap: false,
        };

        for row in &structure.rows {
            if row.is_array_member() || !self.handled.insert(row.variable.clone()) {
                continue;
            }
            let Some(field) = layout.field(&row.variable) else {
                continue;
            };

            let strategy = if row.bit_field().is_some() {
                plan.calls_bit_swap = true;
                Some(SwapStrategy::BitField)
            } else {
                match types.category(&row.data_type) {
                    Some(BaseCategory::Structure) => self
                        .project
                        .structure_index(&row.data_type)
                        .map(|target| SwapStrategy::Nested { target }),
                    Some(category) => {
                        let strategy = SwapStrategy::select(category, field.element_size);
                        if strategy.is_none() {
                            tracing::warn!(
                                structure = %structure.name,
                                field = %row.variable,
                                data_type = %row.data_type,
                                size = field.element_size,
                                "no swap for this size, member left unswapped"
                            );
                            self.diagnostics.push(Diagnostic::new(
                                &structure.name,
                                &row.variable,
                                DiagnosticKind::UnrecognizedTypeSize {
                                    data_type: row.data_type.clone(),
                                    size: field.element_size,
                                },
                            ));
                        }
                        strategy
                    }
                    // Unknown types are reported while resolving offsets.
                    None => None,
                }
            };

            if let Some(strategy) = strategy {
                debug_assert!(
                    !matches!(strategy, SwapStrategy::Nested { target } if target >= index),
                    "embedded structure planned after its container"
                );
                plan.entries.push(SwapEntry {
                    name: row.variable.clone(),
                    strategy,
                    extents: field.extents.clone(),
                    offset: field.offset,
                    element_size: field.element_size,
                });
            }
        }

        tracing::debug!(
            structure = %plan.name,
            entries = plan.entries.len(),
            bit_swap = plan.calls_bit_swap,
            "planned byte swap"
        );
        plan
    }

    pub fn take_diagnostics(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.diagnostics)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::LayoutEngine;
    use crate::model::FieldRow;
    use crate::types::{PrimitiveType, TypeTable};

    fn plan_last(project: &Project) -> (SwapPlan, Vec<Diagnostic>) {
        let index = project.structures().len() - 1;
        let layout = LayoutEngine::new(project).layout(index);
        let mut planner = SwapPlanner::new(project);
        let plan = planner.plan(index, &layout);
        (plan, planner.take_diagnostics())
    }

    fn entry<'p>(plan: &'p SwapPlan, name: &str) -> &'p SwapEntry {
        plan.entries.iter().find(|e| e.name == name).unwrap()
    }

    fn strategies(plan: &SwapPlan) -> Vec<(&str, SwapStrategy)> {
        plan.entries
            .iter()
            .map(|e| (e.name.as_str(), e.strategy))
            .collect()
    }

    #[test]
    fn test_sensor_strategies() {
        let project = Project::builder("demo")
            .rows(vec![
                FieldRow::new("Sensor", "id", "uint16"),
                FieldRow::new("Sensor", "temp", "float"),
                FieldRow::new("Sensor", "flags", "uint8").with_bits(3),
                FieldRow::new("Sensor", "mode", "uint8").with_bits(2),
            ])
            .build()
            .unwrap();
        let (plan, diagnostics) = plan_last(&project);

        assert!(diagnostics.is_empty());
        assert!(plan.calls_bit_swap);
        assert_eq!(
            strategies(&plan),
            vec![
                ("id", SwapStrategy::Word16),
                ("temp", SwapStrategy::Float32),
                ("flags", SwapStrategy::BitField),
                ("mode", SwapStrategy::BitField),
            ]
        );
    }

    #[test]
    fn test_repeated_rows_planned_once() {
        let project = Project::builder("demo")
            .rows(vec![
                FieldRow::new("Pair", "a", "uint32"),
                FieldRow::new("Pair", "b", "uint8"),
                FieldRow::new("Pair", "a", "uint32"),
                FieldRow::new("Pair", "b", "uint8"),
                FieldRow::new("Pair", "c", "uint16").with_array(&[2]),
                FieldRow::new("Pair", "c[0]", "uint16"),
                FieldRow::new("Pair", "c[1]", "uint16"),
            ])
            .build()
            .unwrap();
        let (plan, _) = plan_last(&project);

        assert_eq!(
            strategies(&plan),
            vec![
                ("a", SwapStrategy::Word32),
                ("b", SwapStrategy::SingleByte),
                ("c", SwapStrategy::Word16),
            ]
        );
        assert!(!plan.calls_bit_swap);
        assert_eq!(entry(&plan, "c").element_count(), 2);
    }

    #[test]
    fn test_nested_refers_by_index() {
        let project = Project::builder("demo")
            .rows(vec![
                FieldRow::new("Outer", "inner", "Inner").with_array(&[3]),
                FieldRow::new("Inner", "v", "double"),
            ])
            .build()
            .unwrap();
        let (plan, _) = plan_last(&project);

        assert_eq!(plan.name, "Outer");
        assert_eq!(project.structure_index("Inner"), Some(0));
        let inner = entry(&plan, "inner");
        assert_eq!(inner.strategy, SwapStrategy::Nested { target: 0 });
        assert_eq!(inner.element_count(), 3);
        assert_eq!(inner.element_size, 8);
    }

    #[test]
    fn test_unrecognized_size_is_absorbed() {
        let mut types = TypeTable::builtin();
        types.insert(PrimitiveType::new(
            "uint24",
            "unsigned int",
            3,
            BaseCategory::UnsignedInteger,
        ));
        let project = Project::builder("demo")
            .types(types)
            .rows(vec![
                FieldRow::new("Odd", "x", "uint24"),
                FieldRow::new("Odd", "y", "uint16"),
            ])
            .build()
            .unwrap();
        let (plan, diagnostics) = plan_last(&project);

        assert_eq!(strategies(&plan), vec![("y", SwapStrategy::Word16)]);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(
            diagnostics[0].kind,
            DiagnosticKind::UnrecognizedTypeSize {
                data_type: "uint24".into(),
                size: 3
            }
        );
    }
}
