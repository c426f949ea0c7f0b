// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Byte offsets of declared variables.
//!
//! Rows may carry an offset already resolved by the table store; the rest
//! are placed back to back with no padding, bit-fields of one pack group
//! sharing the group's offset.

use crate::error::{Diagnostic, DiagnosticKind};
use crate::layout::packer::{BitFieldPacker, PackStep};
use crate::model::StructureDescriptor;
use crate::types::TypeCatalog;
use std::collections::HashMap;

/// Offsets of one structure's declared variables, header excluded.
#[derive(Debug, Clone, Default)]
pub struct ResolvedOffsets {
    offsets: HashMap<String, usize>,
    /// Structure size without any synthesized header.
    pub size: usize,
}

impl ResolvedOffsets {
    pub fn offset(&self, variable: &str) -> Option<usize> {
        self.offsets.get(variable).copied()
    }
}

/// Resolve the offsets of `structure`. Embedded structures must already be
/// known to `types`.
pub fn resolve_offsets(
    structure: &StructureDescriptor,
    types: &impl TypeCatalog,
    diagnostics: &mut Vec<Diagnostic>,
) -> ResolvedOffsets {
    let mut packer = BitFieldPacker::new();
    let mut resolved = ResolvedOffsets::default();
    let mut cursor = 0usize;
    let mut group_offset = 0usize;

    for field in structure.declared_fields() {
        let element_size = types.size_of(&field.data_type).unwrap_or_else(|| {
            tracing::warn!(
                structure = %structure.name,
                field = %field.variable,
                data_type = %field.data_type,
                "unknown data type"
            );
            diagnostics.push(Diagnostic::new(
                &structure.name,
                &field.variable,
                DiagnosticKind::UnknownType {
                    data_type: field.data_type.clone(),
                },
            ));
            0
        });

        let offset = match field.bit_field() {
            Some(bits) => {
                if packer.pack(&field.data_type, bits, element_size) == PackStep::Opened {
                    group_offset = field.offset.unwrap_or(cursor);
                }
                group_offset
            }
            None => {
                packer.reset();
                field.offset.unwrap_or(cursor)
            }
        };

        let span = match field.bit_field() {
            Some(_) => element_size,
            None => element_size * field.element_count(),
        };
        cursor = cursor.max(offset + span);
        resolved.offsets.insert(field.variable.clone(), offset);
    }

    resolved.size = cursor;
    resolved
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::FieldRow;
    use crate::types::TypeTable;

    fn resolve(rows: Vec<FieldRow>) -> (ResolvedOffsets, Vec<Diagnostic>) {
        let structure = StructureDescriptor::new("S").with_rows(rows);
        let mut diagnostics = Vec::new();
        let resolved = resolve_offsets(&structure, &TypeTable::builtin(), &mut diagnostics);
        (resolved, diagnostics)
    }

    #[test]
    fn test_packed_offsets() {
        let (resolved, diagnostics) = resolve(vec![
            FieldRow::new("S", "id", "uint16"),
            FieldRow::new("S", "temp", "float"),
            FieldRow::new("S", "flags", "uint8").with_bits(3),
            FieldRow::new("S", "mode", "uint8").with_bits(2),
        ]);
        assert!(diagnostics.is_empty());
        assert_eq!(resolved.offset("id"), Some(0));
        assert_eq!(resolved.offset("temp"), Some(2));
        assert_eq!(resolved.offset("flags"), Some(6));
        assert_eq!(resolved.offset("mode"), Some(6));
        assert_eq!(resolved.size, 7);
    }

    #[test]
    fn test_array_spans_all_elements() {
        let (resolved, _) = resolve(vec![
            FieldRow::new("S", "grid", "uint16").with_array(&[2, 3]),
            FieldRow::new("S", "grid[0][0]", "uint16"),
            FieldRow::new("S", "tail", "uint8"),
        ]);
        assert_eq!(resolved.offset("tail"), Some(12));
        assert_eq!(resolved.size, 13);
    }

    #[test]
    fn test_group_split_advances_offset() {
        let (resolved, _) = resolve(vec![
            FieldRow::new("S", "a", "uint8").with_bits(3),
            FieldRow::new("S", "b", "uint8").with_bits(4),
            FieldRow::new("S", "c", "uint8").with_bits(2),
        ]);
        assert_eq!(resolved.offset("b"), Some(0));
        assert_eq!(resolved.offset("c"), Some(1));
        assert_eq!(resolved.size, 2);
    }

    #[test]
    fn test_explicit_offsets_win() {
        let (resolved, _) = resolve(vec![
            FieldRow::new("S", "a", "uint32").with_offset(4),
            FieldRow::new("S", "b", "uint8"),
        ]);
        assert_eq!(resolved.offset("a"), Some(4));
        assert_eq!(resolved.offset("b"), Some(8));
        assert_eq!(resolved.size, 9);
    }

    #[test]
    fn test_unknown_type_reported() {
        let (resolved, diagnostics) = resolve(vec![FieldRow::new("S", "x", "mystery")]);
        assert_eq!(resolved.size, 0);
        assert_eq!(diagnostics.len(), 1);
    }
}
