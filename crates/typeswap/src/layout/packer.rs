// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Bit-field packing decisions.

use serde::Serialize;

/// Contiguous storage unit shared by one or more adjacent bit-fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BitPackGroup {
    pub data_type: String,
    pub filled_bits: u32,
    /// 8 x sizeof(data_type).
    pub capacity: u32,
    pub byte_size: usize,
    /// Byte offset of the storage unit, header included.
    pub offset: usize,
}

/// Outcome of packing one bit-field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackStep {
    /// A new group was opened; the field sits at bit 0.
    Opened,
    /// The field joined the active group starting at bit `shift`.
    Merged { shift: u32 },
}

#[derive(Debug, Clone)]
struct ActiveGroup {
    data_type: String,
    filled: u32,
    capacity: u32,
}

/// Field-by-field packing state for one pass over one structure.
///
/// A bit-field merges into the active group when it has the same type and
/// still fits; otherwise it opens a new group. A field wider than its own
/// type also just opens a group. Any other field ends the active group.
#[derive(Debug, Clone, Default)]
pub struct BitFieldPacker {
    active: Option<ActiveGroup>,
}

impl BitFieldPacker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pack(&mut self, data_type: &str, bits: u32, byte_size: usize) -> PackStep {
        if let Some(active) = self.active.as_mut() {
            if active.data_type == data_type && active.filled + bits <= active.capacity {
                let shift = active.filled;
                active.filled += bits;
                return PackStep::Merged { shift };
            }
        }

        self.active = Some(ActiveGroup {
            data_type: data_type.to_string(),
            filled: bits,
            capacity: 8 * byte_size as u32,
        });
        PackStep::Opened
    }

    /// A non bit-field member closes the active group.
    pub fn reset(&mut self) {
        self.active = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overflow_opens_new_group() {
        let mut packer = BitFieldPacker::new();
        assert_eq!(packer.pack("uint8", 3, 1), PackStep::Opened);
        assert_eq!(packer.pack("uint8", 4, 1), PackStep::Merged { shift: 3 });
        assert_eq!(packer.pack("uint8", 2, 1), PackStep::Opened);
        assert_eq!(packer.pack("uint8", 6, 1), PackStep::Merged { shift: 2 });
    }

    #[test]
    fn test_exact_fill_merges() {
        let mut packer = BitFieldPacker::new();
        packer.pack("uint8", 3, 1);
        assert_eq!(packer.pack("uint8", 5, 1), PackStep::Merged { shift: 3 });
        assert_eq!(packer.pack("uint8", 1, 1), PackStep::Opened);
    }

    #[test]
    fn test_type_change_opens_new_group() {
        let mut packer = BitFieldPacker::new();
        packer.pack("uint8", 1, 1);
        assert_eq!(packer.pack("uint16", 1, 2), PackStep::Opened);
        assert_eq!(packer.pack("uint16", 15, 2), PackStep::Merged { shift: 1 });
    }

    #[test]
    fn test_reset_ends_group() {
        let mut packer = BitFieldPacker::new();
        packer.pack("uint8", 1, 1);
        packer.reset();
        assert_eq!(packer.pack("uint8", 1, 1), PackStep::Opened);
    }

    #[test]
    fn test_oversized_field_still_opens_group() {
        let mut packer = BitFieldPacker::new();
        assert_eq!(packer.pack("uint8", 12, 1), PackStep::Opened);
        assert_eq!(packer.pack("uint8", 1, 1), PackStep::Opened);
    }
}
