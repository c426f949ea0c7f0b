// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Bit-swap planning for structures with bit-fields.

use crate::layout::{BitFieldPacker, PackStep, StructLayout};
use crate::model::Project;
use crate::types::TypeCatalog;
use serde::Serialize;
use std::collections::HashSet;

/// One statement of a `bit_swap_<T>` function.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum BitSwapOp {
    /// Reflect a pack group of the input before extraction (foreign to local).
    ReflectInput { offset: usize, size: usize },
    /// Reflect a pack group of the output after assembly (local to foreign).
    ReflectOutput { offset: usize, size: usize },
    /// Mirror the bits of a multi-bit field.
    Mirror {
        field: String,
        bits: u32,
        group_offset: usize,
        group_size: usize,
        shift: u32,
    },
    /// Single-bit field: copied, nothing to mirror.
    Copy { field: String },
    /// Recurse into an embedded structure that has bit-fields.
    Nested {
        field: String,
        target: usize,
        extents: Vec<usize>,
        offset: usize,
        element_size: usize,
    },
}

/// Body of one `bit_swap_<T>` function.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BitSwapPlan {
    pub structure: usize,
    pub name: String,
    pub ops: Vec<BitSwapOp>,
}

/// Plans bit-swap functions. Structures must be planned in dependency order
/// so that an embedded type's bit-field fact is known before its container.
pub struct BitSwapPlanner<'a> {
    project: &'a Project,
    has_bit_fields: Vec<Option<bool>>,
}

impl<'a> BitSwapPlanner<'a> {
    pub fn new(project: &'a Project) -> Self {
        Self {
            project,
            has_bit_fields: vec![None; project.structures().len()],
        }
    }

    /// `None` when the structure has no bit-field of its own.
    pub fn plan(&mut self, index: usize, layout: &StructLayout) -> Option<BitSwapPlan> {
        self.has_bit_fields[index] = Some(layout.has_bit_fields());
        if !layout.has_bit_fields() {
            return None;
        }

        let structure = self.project.structure(index);
        let types = self.project.types();
        let mut packer = BitFieldPacker::new();
        let mut handled: HashSet<&str> = HashSet::new();
        let mut open_group: Option<(usize, usize)> = None;
        let mut ops = Vec::new();

        for row in &structure.rows {
            if row.is_array_member() || !handled.insert(row.variable.as_str()) {
                continue;
            }
            let Some(field) = layout.field(&row.variable) else {
                continue;
            };

            match row.bit_field() {
                Some(bits) => {
                    let Some(group) = field.group.and_then(|g| layout.groups.get(g)) else {
                        continue;
                    };
                    if packer.pack(&row.data_type, bits, field.element_size) == PackStep::Opened {
                        if let Some((offset, size)) = open_group.replace((group.offset, group.byte_size)) {
                            ops.push(BitSwapOp::ReflectOutput { offset, size });
                        }
                        ops.push(BitSwapOp::ReflectInput {
                            offset: group.offset,
                            size: group.byte_size,
                        });
                    }

                    if bits > 1 {
                        ops.push(BitSwapOp::Mirror {
                            field: row.variable.clone(),
                            bits,
                            group_offset: group.offset,
                            group_size: group.byte_size,
                            shift: field.shift,
                        });
                    } else {
                        ops.push(BitSwapOp::Copy {
                            field: row.variable.clone(),
                        });
                    }
                }
                None => {
                    packer.reset();
                    if !types.is_structure(&row.data_type) {
                        continue;
                    }
                    let Some(target) = self.project.structure_index(&row.data_type) else {
                        continue;
                    };
                    if self.has_bit_fields.get(target).copied().flatten() == Some(true) {
                        ops.push(BitSwapOp::Nested {
                            field: row.variable.clone(),
                            target,
                            extents: field.extents.clone(),
                            offset: field.offset,
                            element_size: field.element_size,
                        });
                    }
                }
            }
        }

        if let Some((offset, size)) = open_group {
            ops.push(BitSwapOp::ReflectOutput { offset, size });
        }

        tracing::debug!(structure = %structure.name, ops = ops.len(), "planned bit swap");
        Some(BitSwapPlan {
            structure: index,
            name: structure.name.clone(),
            ops,
        })
    }
}
