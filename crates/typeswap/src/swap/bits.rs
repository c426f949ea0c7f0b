// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Bit-level primitives shared by the generated helpers and the plan executor.

/// Largest span `reflect_bits` handles; longer spans are left untouched.
pub const MAX_REFLECT_BYTES: usize = 8;

/// Reverse the bit order of an n-byte span (n <= 8).
///
/// Output bit `k` takes input bit `8n - 1 - k`, counting bits LSB first from
/// byte 0: bytes swap end for end and each byte's bits reverse.
pub fn reflect_bits(data: &mut [u8]) {
    if data.len() > MAX_REFLECT_BYTES {
        return;
    }
    data.reverse();
    for byte in data.iter_mut() {
        *byte = byte.reverse_bits();
    }
}

/// Mirror the low `width` bits of `value`; higher bits are dropped.
pub fn mirror_bits(value: u64, width: u32) -> u64 {
    match width {
        0 => 0,
        w if w >= 64 => value.reverse_bits(),
        w => value.reverse_bits() >> (64 - w),
    }
}
