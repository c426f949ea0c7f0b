// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! In-place execution of swap plans on a byte image.
//!
//! Mirrors what the generated C does when called with `inPtr == outPtr` on a
//! little-endian host that allocates bit-fields LSB first: multi-byte words
//! are reversed, pack groups are read as little-endian storage units.
//! Out-of-range spans are skipped.

use crate::swap::bits::{mirror_bits, reflect_bits, MAX_REFLECT_BYTES};
use crate::swap::{BitSwapOp, Direction, Plans, SwapStrategy};

/// Run `byte_swap_<T>` for structure `index` over `image`.
pub fn byte_swap(plans: &Plans, index: usize, image: &mut [u8], direction: Direction) {
    let Some(plan) = plans.swaps.get(index) else {
        return;
    };

    for entry in &plan.entries {
        match entry.strategy {
            SwapStrategy::Nested { target } => {
                for element in 0..entry.element_count() {
                    let start = entry.offset + element * entry.element_size;
                    if let Some(slice) = image.get_mut(start..) {
                        byte_swap(plans, target, slice, direction);
                    }
                }
            }
            strategy => {
                let Some(width) = strategy.swap_width() else {
                    continue;
                };
                for element in 0..entry.element_count() {
                    let start = entry.offset + element * entry.element_size;
                    if let Some(word) = image.get_mut(start..start + width) {
                        word.reverse();
                    }
                }
            }
        }
    }

    if plan.calls_bit_swap {
        bit_swap(plans, index, image, direction);
    }
}

/// Run `bit_swap_<T>` for structure `index` over `image`.
pub fn bit_swap(plans: &Plans, index: usize, image: &mut [u8], direction: Direction) {
    let Some(plan) = plans.bit_swap(index) else {
        return;
    };

    for op in &plan.ops {
        match op {
            BitSwapOp::ReflectInput { offset, size } => {
                if direction == Direction::ForeignToLocal {
                    reflect_span(image, *offset, *size);
                }
            }
            BitSwapOp::ReflectOutput { offset, size } => {
                if direction == Direction::LocalToForeign {
                    reflect_span(image, *offset, *size);
                }
            }
            BitSwapOp::Mirror {
                bits,
                group_offset,
                group_size,
                shift,
                ..
            } => {
                if let Some(unit) = image.get_mut(*group_offset..*group_offset + *group_size) {
                    mirror_field(unit, *shift, *bits);
                }
            }
            BitSwapOp::Copy { .. } => {}
            BitSwapOp::Nested {
                target,
                extents,
                offset,
                element_size,
                ..
            } => {
                let count: usize = extents.iter().product();
                for element in 0..count {
                    let start = offset + element * element_size;
                    if let Some(slice) = image.get_mut(start..) {
                        bit_swap(plans, *target, slice, direction);
                    }
                }
            }
        }
    }
}

fn reflect_span(image: &mut [u8], offset: usize, size: usize) {
    if let Some(span) = image.get_mut(offset..offset + size) {
        reflect_bits(span);
    }
}

/// Read a little-endian storage unit of up to 8 bytes.
pub fn read_unit(bytes: &[u8]) -> u64 {
    bytes
        .iter()
        .take(MAX_REFLECT_BYTES)
        .rev()
        .fold(0, |acc, &b| (acc << 8) | u64::from(b))
}

/// Write `value` back as a little-endian storage unit.
pub fn write_unit(bytes: &mut [u8], value: u64) {
    for (i, byte) in bytes.iter_mut().take(MAX_REFLECT_BYTES).enumerate() {
        *byte = (value >> (8 * i)) as u8;
    }
}

/// Value of the `bits`-wide field at `shift` in a storage unit.
pub fn extract_field(unit: &[u8], shift: u32, bits: u32) -> Option<u64> {
    if bits == 0 || shift + bits > 64 {
        return None;
    }
    Some((read_unit(unit) >> shift) & field_mask(bits))
}

/// Store `value` into the `bits`-wide field at `shift`.
pub fn insert_field(unit: &mut [u8], shift: u32, bits: u32, value: u64) {
    if bits == 0 || shift + bits > 64 {
        return;
    }
    let mask = field_mask(bits) << shift;
    let word = (read_unit(unit) & !mask) | ((value << shift) & mask);
    write_unit(unit, word);
}

fn mirror_field(unit: &mut [u8], shift: u32, bits: u32) {
    if let Some(value) = extract_field(unit, shift, bits) {
        insert_field(unit, shift, bits, mirror_bits(value, bits));
    }
}

fn field_mask(bits: u32) -> u64 {
    if bits >= 64 {
        u64::MAX
    } else {
        (1u64 << bits) - 1
    }
}
