// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Byte-swap and bit-swap planning.
//!
//! Planners turn a structure and its layout into an ordered list of swap
//! operations. Calls into embedded structures refer to them by their index in
//! the project's dependency order; names are only attached when rendering.

mod bit_planner;
pub mod bits;
pub mod image;
mod planner;

pub use bit_planner::{BitSwapOp, BitSwapPlan, BitSwapPlanner};
pub use planner::{SwapEntry, SwapPlan, SwapPlanner};

use crate::error::Diagnostic;
use crate::layout::StructLayout;
use crate::model::Project;
use crate::types::BaseCategory;
use serde::Serialize;

/// Conversion direction, passed to the generated functions as `direction`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Direction {
    /// Native to foreign byte order (`direction = 0`).
    LocalToForeign,
    /// Foreign to local byte order (`direction = 1`).
    ForeignToLocal,
}

impl Direction {
    pub fn flag(self) -> i32 {
        match self {
            Self::LocalToForeign => 0,
            Self::ForeignToLocal => 1,
        }
    }
}

/// Endianness transform of one member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SwapStrategy {
    /// One-byte character or integer: copied as-is.
    SingleByte,
    Word16,
    Word32,
    Word64,
    Float32,
    Double64,
    Pointer32,
    Pointer64,
    /// Handled by the structure's bit-swap function.
    BitField,
    /// Embedded structure, swapped by its own function.
    Nested { target: usize },
}

impl SwapStrategy {
    /// Strategy for a scalar of the given category and size. `None` when the
    /// size has no swap bucket, and for structures.
    pub fn select(category: BaseCategory, size: usize) -> Option<Self> {
        match (category, size) {
            (c, 1) if c.is_integral() => Some(Self::SingleByte),
            (c, 2) if c.is_integral() => Some(Self::Word16),
            (c, 4) if c.is_integral() => Some(Self::Word32),
            (c, 8) if c.is_integral() => Some(Self::Word64),
            (BaseCategory::FloatingPoint, 4) => Some(Self::Float32),
            (BaseCategory::FloatingPoint, 8) => Some(Self::Double64),
            (BaseCategory::Pointer, 4) => Some(Self::Pointer32),
            (BaseCategory::Pointer, 8) => Some(Self::Pointer64),
            _ => None,
        }
    }

    /// Width of the byte reversal applied per element, if any.
    pub fn swap_width(self) -> Option<usize> {
        match self {
            Self::Word16 => Some(2),
            Self::Word32 | Self::Float32 | Self::Pointer32 => Some(4),
            Self::Word64 | Self::Double64 | Self::Pointer64 => Some(8),
            Self::SingleByte | Self::BitField | Self::Nested { .. } => None,
        }
    }
}

/// Both plans of every structure, indexed like [`Project::structures`].
#[derive(Debug, Clone, Default)]
pub struct Plans {
    pub swaps: Vec<SwapPlan>,
    pub bit_swaps: Vec<Option<BitSwapPlan>>,
    pub diagnostics: Vec<Diagnostic>,
}

impl Plans {
    /// Plan every structure in dependency order.
    pub fn build(project: &Project, layouts: &[StructLayout]) -> Self {
        let mut swap_planner = SwapPlanner::new(project);
        let mut bit_planner = BitSwapPlanner::new(project);
        let mut plans = Plans::default();

        for (index, layout) in layouts.iter().enumerate() {
            plans.swaps.push(swap_planner.plan(index, layout));
            plans.bit_swaps.push(bit_planner.plan(index, layout));
        }
        plans.diagnostics = swap_planner.take_diagnostics();

        tracing::info!(
            structures = plans.swaps.len(),
            bit_swaps = plans.bit_swaps.iter().flatten().count(),
            "planned swap functions"
        );
        plans
    }

    pub fn bit_swap(&self, index: usize) -> Option<&BitSwapPlan> {
        self.bit_swaps.get(index).and_then(Option::as_ref)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_by_category_and_size() {
        use BaseCategory::*;
        assert_eq!(SwapStrategy::select(Character, 1), Some(SwapStrategy::SingleByte));
        assert_eq!(SwapStrategy::select(SignedInteger, 2), Some(SwapStrategy::Word16));
        assert_eq!(SwapStrategy::select(UnsignedInteger, 8), Some(SwapStrategy::Word64));
        assert_eq!(SwapStrategy::select(FloatingPoint, 4), Some(SwapStrategy::Float32));
        assert_eq!(SwapStrategy::select(FloatingPoint, 8), Some(SwapStrategy::Double64));
        assert_eq!(SwapStrategy::select(Pointer, 8), Some(SwapStrategy::Pointer64));
        assert_eq!(SwapStrategy::select(Pointer, 4), Some(SwapStrategy::Pointer32));
        assert_eq!(SwapStrategy::select(UnsignedInteger, 3), None);
        assert_eq!(SwapStrategy::select(FloatingPoint, 2), None);
        assert_eq!(SwapStrategy::select(Structure, 4), None);
    }

    #[test]
    fn test_direction_flags() {
        assert_eq!(Direction::LocalToForeign.flag(), 0);
        assert_eq!(Direction::ForeignToLocal.flag(), 1);
    }
}
