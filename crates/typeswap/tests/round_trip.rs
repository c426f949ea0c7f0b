// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

use typeswap::swap::image::{byte_swap, extract_field, insert_field};
use typeswap::{Direction, FieldRow, LayoutEngine, Plans, Project, StructLayout};

fn planned(rows: Vec<FieldRow>) -> (Project, Vec<StructLayout>, Plans) {
    let project = Project::builder("demo").rows(rows).build().unwrap();
    let layouts = LayoutEngine::new(&project).layout_all();
    let plans = Plans::build(&project, &layouts);
    (project, layouts, plans)
}

fn patterned(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i as u8).wrapping_mul(37).wrapping_add(11)).collect()
}

#[test]
fn test_plain_structure_round_trip() {
    let (_, layouts, plans) = planned(vec![
        FieldRow::new("Plain", "a", "uint16"),
        FieldRow::new("Plain", "b", "int32").with_array(&[2]),
        FieldRow::new("Plain", "c", "double"),
        FieldRow::new("Plain", "d", "char").with_array(&[3]),
        FieldRow::new("Plain", "e", "uint64"),
        FieldRow::new("Plain", "p", "address"),
    ]);
    let original = patterned(layouts[0].total_size);
    let mut image = original.clone();

    byte_swap(&plans, 0, &mut image, Direction::LocalToForeign);
    assert_ne!(image, original);
    byte_swap(&plans, 0, &mut image, Direction::ForeignToLocal);
    assert_eq!(image, original);
}

#[test]
fn test_words_become_big_endian() {
    let (_, layouts, plans) = planned(vec![
        FieldRow::new("W", "a", "uint16"),
        FieldRow::new("W", "b", "uint32"),
        FieldRow::new("W", "c", "float"),
        FieldRow::new("W", "tag", "uint8"),
    ]);
    let mut image = Vec::with_capacity(layouts[0].total_size);
    image.extend_from_slice(&0x1234u16.to_le_bytes());
    image.extend_from_slice(&0xDEADBEEFu32.to_le_bytes());
    image.extend_from_slice(&1.5f32.to_le_bytes());
    image.push(0x7F);

    byte_swap(&plans, 0, &mut image, Direction::LocalToForeign);

    let mut expected = Vec::new();
    expected.extend_from_slice(&0x1234u16.to_be_bytes());
    expected.extend_from_slice(&0xDEADBEEFu32.to_be_bytes());
    expected.extend_from_slice(&1.5f32.to_be_bytes());
    expected.push(0x7F);
    assert_eq!(image, expected);
}

#[test]
fn test_bit_fields_round_trip() {
    let (_, layouts, plans) = planned(vec![
        FieldRow::new("Bits", "id", "uint16"),
        FieldRow::new("Bits", "a", "uint8").with_bits(3),
        FieldRow::new("Bits", "b", "uint8").with_bits(4),
        FieldRow::new("Bits", "c", "uint8").with_bits(2),
        FieldRow::new("Bits", "on", "uint16").with_bits(1),
        FieldRow::new("Bits", "level", "uint16").with_bits(11),
    ]);
    let layout = &layouts[0];
    let values = [("a", 0b101u64), ("b", 0b0011), ("c", 0b10), ("on", 1), ("level", 0x5A3)];

    let mut image = vec![0u8; layout.total_size];
    image[0..2].copy_from_slice(&0xBEEFu16.to_le_bytes());
    for (name, value) in values {
        let field = layout.field(name).unwrap();
        let group = &layout.groups[field.group.unwrap()];
        let unit = &mut image[group.offset..group.offset + group.byte_size];
        insert_field(unit, field.shift, field.bit_length.unwrap(), value);
    }
    let original = image.clone();

    byte_swap(&plans, 0, &mut image, Direction::LocalToForeign);
    assert_ne!(image, original);
    byte_swap(&plans, 0, &mut image, Direction::ForeignToLocal);
    assert_eq!(image, original);

    for (name, value) in values {
        let field = layout.field(name).unwrap();
        let group = &layout.groups[field.group.unwrap()];
        let unit = &image[group.offset..group.offset + group.byte_size];
        assert_eq!(
            extract_field(unit, field.shift, field.bit_length.unwrap()),
            Some(value),
            "{name}"
        );
    }
}

#[test]
fn test_foreign_bit_order_is_msb_first() {
    let (_, layouts, plans) = planned(vec![
        FieldRow::new("Sensor", "flags", "uint8").with_bits(3),
        FieldRow::new("Sensor", "mode", "uint8").with_bits(2),
    ]);
    let layout = &layouts[0];
    let mut image = vec![0u8; layout.total_size];
    insert_field(&mut image, 0, 3, 0b011);
    insert_field(&mut image, 3, 2, 0b10);

    byte_swap(&plans, 0, &mut image, Direction::LocalToForeign);
    // flags then mode from the most significant bit down
    assert_eq!(image, vec![0b0111_0000]);

    byte_swap(&plans, 0, &mut image, Direction::ForeignToLocal);
    assert_eq!(extract_field(&image, 0, 3), Some(0b011));
    assert_eq!(extract_field(&image, 3, 2), Some(0b10));
}

#[test]
fn test_nested_structures_round_trip() {
    let (project, layouts, plans) = planned(vec![
        FieldRow::new("Outer", "seq", "uint32"),
        FieldRow::new("Outer", "inner", "Inner").with_array(&[3]),
        FieldRow::new("Outer", "mode", "uint8").with_bits(5),
        FieldRow::new("Inner", "v", "double"),
        FieldRow::new("Inner", "state", "uint16").with_bits(9),
    ]);
    let outer = project.structure_index("Outer").unwrap();
    let original = patterned(layouts[outer].total_size);
    let mut image = original.clone();

    assert_eq!(layouts[outer].total_size, 4 + 3 * 10 + 1);
    byte_swap(&plans, outer, &mut image, Direction::LocalToForeign);
    assert_ne!(image, original);
    byte_swap(&plans, outer, &mut image, Direction::ForeignToLocal);
    assert_eq!(image, original);
}

#[test]
fn test_header_bytes_untouched() {
    let project = Project::builder("demo")
        .structure(
            typeswap::StructureDescriptor::new("Cmd")
                .with_message_id("0x1880")
                .with_rows(vec![FieldRow::new("Cmd", "code", "uint16")]),
        )
        .build()
        .unwrap();
    let layouts = LayoutEngine::new(&project).layout_all();
    let plans = Plans::build(&project, &layouts);

    let mut image = patterned(layouts[0].total_size);
    let header: Vec<u8> = image[..12].to_vec();
    byte_swap(&plans, 0, &mut image, Direction::LocalToForeign);

    assert_eq!(&image[..12], header.as_slice());
    assert_eq!(image[12], patterned(14)[13]);
}

#[test]
fn test_embedded_bit_fields_are_swapped_by_both_functions() {
    let (project, _, plans) = planned(vec![
        FieldRow::new("Outer", "inner", "Inner"),
        FieldRow::new("Outer", "mode", "uint8").with_bits(5),
        FieldRow::new("Inner", "a", "uint8").with_bits(3),
        FieldRow::new("Inner", "b", "uint8").with_bits(2),
    ]);
    let inner = project.structure_index("Inner").unwrap();
    let outer = project.structure_index("Outer").unwrap();

    let mut unit = [0u8];
    insert_field(&mut unit, 0, 3, 0b011);
    insert_field(&mut unit, 3, 2, 0b10);

    let mut alone = unit.to_vec();
    byte_swap(&plans, inner, &mut alone, Direction::LocalToForeign);
    assert_eq!(alone, vec![0b0111_0000]);

    // byte_swap_Inner runs bit_swap_Inner, then bit_swap_Outer runs it again
    let original = vec![unit[0], 0];
    let mut embedded = original.clone();
    byte_swap(&plans, outer, &mut embedded, Direction::LocalToForeign);
    assert_eq!(embedded[0], 0b0001_0110);

    byte_swap(&plans, outer, &mut embedded, Direction::ForeignToLocal);
    assert_eq!(embedded, original);
}
