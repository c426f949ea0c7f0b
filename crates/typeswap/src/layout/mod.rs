// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Structure layout: column width, offsets, sizes and bit-field groups.
//!
//! The layout is a plain value computed from the project; rendering it into
//! text is left to [`crate::render::header`].

mod offsets;
mod packer;

pub use offsets::{resolve_offsets, ResolvedOffsets};
pub use packer::{BitFieldPacker, BitPackGroup, PackStep};

use crate::model::{Project, PRIMARY_HEADER_SIZE, SECONDARY_HEADER_SIZE};
use crate::types::TypeCatalog;
use serde::Serialize;

/// Synthetic protocol header member.
#[derive(Debug, Clone, Copy)]
pub struct HeaderField {
    pub name: &'static str,
    pub offset: usize,
    pub size: usize,
    /// Reference to the header type, printed in the member comment.
    pub tag: &'static str,
}

impl HeaderField {
    pub fn declaration(&self) -> String {
        format!("   char {}[{}];", self.name, self.size)
    }
}

/// Primary and secondary header members, in declaration order.
pub const HEADER_FIELDS: [HeaderField; 2] = [
    HeaderField {
        name: "CFS_PRI_HEADER",
        offset: 0,
        size: PRIMARY_HEADER_SIZE,
        tag: "#CCSDS_PriHdr_t",
    },
    HeaderField {
        name: "CFS_SEC_HEADER",
        offset: PRIMARY_HEADER_SIZE,
        size: SECONDARY_HEADER_SIZE,
        tag: "#CCSDS_CmdSecHdr_t",
    },
];

/// One declared member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldLayout {
    pub name: String,
    pub data_type: String,
    pub extents: Vec<usize>,
    pub bit_length: Option<u32>,
    /// Byte offset, header included.
    pub offset: usize,
    pub element_size: usize,
    /// element_size x product(extents).
    pub size: usize,
    /// Index into [`StructLayout::groups`] for bit-fields.
    pub group: Option<usize>,
    /// First bit of a bit-field inside its group.
    pub shift: u32,
    pub description: String,
    /// `(stream, rate)` for every stream with a rate, in stream order.
    pub rates: Vec<(String, String)>,
}

impl FieldLayout {
    pub fn is_array(&self) -> bool {
        !self.extents.is_empty()
    }

    pub fn element_count(&self) -> usize {
        self.extents.iter().product()
    }

    /// Member declaration as printed, e.g. `   uint8 flags:3;`.
    pub fn declaration(&self) -> String {
        let mut decl = format!("   {} {}", self.data_type, self.name);
        if self.is_array() {
            let dims: Vec<String> = self.extents.iter().map(ToString::to_string).collect();
            decl.push_str(&format!("[{}]", dims.join("][")));
        }
        if let Some(bits) = self.bit_length {
            decl.push_str(&format!(":{bits}"));
        }
        decl.push(';');
        decl
    }
}

/// Computed layout of one structure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StructLayout {
    pub name: String,
    pub description: String,
    /// Whether the protocol header members are synthesized.
    pub header: bool,
    /// Column at which member comments start.
    pub width: usize,
    /// Total size in bytes, header included.
    pub total_size: usize,
    pub fields: Vec<FieldLayout>,
    pub groups: Vec<BitPackGroup>,
}

impl StructLayout {
    pub fn has_bit_fields(&self) -> bool {
        !self.groups.is_empty()
    }

    pub fn field(&self, name: &str) -> Option<&FieldLayout> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn closing_line(&self) -> String {
        format!("}} {};", self.name)
    }
}

/// Computes [`StructLayout`]s for a project.
pub struct LayoutEngine<'a> {
    project: &'a Project,
}

impl<'a> LayoutEngine<'a> {
    pub fn new(project: &'a Project) -> Self {
        Self { project }
    }

    /// Layouts of every structure, in dependency order.
    pub fn layout_all(&self) -> Vec<StructLayout> {
        (0..self.project.structures().len())
            .map(|index| self.layout(index))
            .collect()
    }

    pub fn layout(&self, index: usize) -> StructLayout {
        let structure = self.project.structure(index);
        let types = self.project.types();
        let header_size = structure.header_size();

        let mut packer = BitFieldPacker::new();
        let mut groups: Vec<BitPackGroup> = Vec::new();
        let mut fields = Vec::new();

        for row in structure.declared_fields() {
            let element_size = types.size_of(&row.data_type).unwrap_or(0);
            let offset = self
                .project
                .variable_offset(index, &row.variable)
                .unwrap_or(0)
                + header_size;

            let (group, shift) = match row.bit_field() {
                Some(bits) => match packer.pack(&row.data_type, bits, element_size) {
                    PackStep::Opened => {
                        groups.push(BitPackGroup {
                            data_type: row.data_type.clone(),
                            filled_bits: bits,
                            capacity: 8 * element_size as u32,
                            byte_size: element_size,
                            offset,
                        });
                        (Some(groups.len() - 1), 0)
                    }
                    PackStep::Merged { shift } => {
                        if let Some(active) = groups.last_mut() {
                            active.filled_bits += bits;
                        }
                        (groups.len().checked_sub(1), shift)
                    }
                },
                None => {
                    packer.reset();
                    (None, 0)
                }
            };

            let rates = self
                .project
                .data_streams
                .iter()
                .filter_map(|stream| {
                    row.rates
                        .get(stream)
                        .filter(|rate| !rate.is_empty())
                        .map(|rate| (stream.clone(), rate.clone()))
                })
                .collect();

            fields.push(FieldLayout {
                name: row.variable.clone(),
                data_type: row.data_type.clone(),
                extents: row.array_size.clone(),
                bit_length: row.bit_field(),
                offset,
                element_size,
                size: element_size * row.element_count(),
                group,
                shift,
                description: row.description.clone(),
                rates,
            });
        }

        let mut layout = StructLayout {
            name: structure.name.clone(),
            description: structure.description.clone(),
            header: structure.has_header(),
            width: 0,
            total_size: self.project.base_size(index) + header_size,
            fields,
            groups,
        };
        layout.width = column_width(&layout);

        tracing::debug!(
            structure = %layout.name,
            total_size = layout.total_size,
            groups = layout.groups.len(),
            width = layout.width,
            "computed layout"
        );
        layout
    }
}

/// Longest printed line (declarations, header members, closing brace) plus
/// the separating space.
fn column_width(layout: &StructLayout) -> usize {
    let header = layout
        .header
        .then(|| HEADER_FIELDS.iter().map(|h| h.declaration().len()).max())
        .flatten()
        .unwrap_or(0);

    layout
        .fields
        .iter()
        .map(|f| f.declaration().len())
        .chain([layout.closing_line().len(), header])
        .max()
        .unwrap_or(0)
        + 1
}
