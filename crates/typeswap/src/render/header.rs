// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Types header: padded structure declarations and swap prototypes.

use crate::layout::{FieldLayout, StructLayout, HEADER_FIELDS};
use crate::model::Project;
use crate::render::{include_guard, swap_signature};

/// Render the complete types header.
pub fn render_header(
    project: &Project,
    layouts: &[StructLayout],
    banner: &str,
    base_name: &str,
) -> String {
    let guard = include_guard(base_name);
    let mut out = String::from(banner);

    out.push_str(&format!("#ifndef {guard}\n#define {guard}\n\n"));

    if !project.includes.is_empty() {
        for line in &project.includes {
            out.push_str(line);
            out.push('\n');
        }
        out.push('\n');
    }

    for (canonical, underlying) in project.types().aliases() {
        out.push_str(&format!("#define {canonical} {underlying}\n"));
    }
    out.push('\n');

    for layout in layouts {
        out.push_str(&render_structure(layout));
        out.push('\n');
    }

    out.push_str("/* Byte and bit swap function prototypes */\n");
    for layout in layouts {
        out.push_str(&format!("void {};\n", swap_signature("byte", &layout.name)));
        out.push_str(&format!("void {};\n", swap_signature("bit", &layout.name)));
    }

    out.push_str(&format!("\n#endif /* #ifndef {guard} */\n"));
    out
}

/// One structure: comment block, typedef, members and the closing line.
pub fn render_structure(layout: &StructLayout) -> String {
    let width = layout.width;
    let mut out = format!(
        "/* Structure: {} ({} bytes total)",
        layout.name, layout.total_size
    );
    if !layout.description.is_empty() {
        out.push_str(&format!("\n   Description: {}", layout.description));
    }
    out.push_str(" */\ntypedef struct\n{\n");

    if layout.header {
        for field in &HEADER_FIELDS {
            out.push_str(&member_line(
                width,
                &field.declaration(),
                field.offset,
                &format!("({} bytes)  {}", field.size, field.tag),
            ));
        }
    }

    for field in &layout.fields {
        out.push_str(&member_line(
            width,
            &field.declaration(),
            field.offset,
            &field_comment(field),
        ));
    }

    out.push_str(&format!(
        "{:<width$} /* Total size of {} bytes */\n",
        layout.closing_line(),
        layout.total_size
    ));
    out
}

fn member_line(width: usize, declaration: &str, offset: usize, comment: &str) -> String {
    format!("{declaration:<width$} /* [{offset:>5}] {comment} */\n")
}

/// Size, rate tags and description, trimmed.
fn field_comment(field: &FieldLayout) -> String {
    let rates: String = field
        .rates
        .iter()
        .map(|(stream, rate)| format!("{{{stream} @{rate} Hz}}"))
        .collect();
    format!("{}{}  {}", size_text(field), rates, field.description)
        .trim()
        .to_string()
}

fn size_text(field: &FieldLayout) -> String {
    if field.bit_length.is_some() {
        String::new()
    } else if field.is_array() {
        let dims: Vec<String> = field.extents.iter().map(ToString::to_string).collect();
        format!(
            "({}x{}={} bytes)",
            dims.join("x"),
            field.element_size,
            field.size
        )
    } else {
        format!("({} bytes)", field.element_size)
    }
}
