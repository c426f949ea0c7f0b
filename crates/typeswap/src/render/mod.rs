// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Text formatters for the generated artifacts.
//!
//! Formatting is kept apart from layout and planning: every function here
//! takes computed values and returns a `String`. The output is a file-format
//! contract, identical input gives byte-identical text.

pub mod banner;
pub mod header;
pub mod source;

pub use banner::Provenance;

/// Include guard for the types header, e.g. `_DEMO_TYPES_H_`.
pub fn include_guard(base_name: &str) -> String {
    format!("_{}_H_", base_name.to_uppercase())
}

/// Parameter list shared by every swap function and prototype.
pub(crate) fn swap_signature(kind: &str, name: &str) -> String {
    format!("{kind}_swap_{name}({name} *inPtr, {name} *outPtr, int direction)")
}
