// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! OS-backed random source

use super::{EntropyError, RandomError, RandomSource};

/// Process exit code used when the entropy source cannot be read
pub const EXIT_ENTROPY_UNAVAILABLE: i32 = 70;

/// Stateless CSPRNG-backed source.
///
/// Every draw reads fresh bytes from `getrandom`; there is no seed and no
/// generator state, so any number of reconciles may draw concurrently.
#[derive(Debug, Clone, Copy, Default)]
pub struct SecureRandom;

impl SecureRandom {
    pub fn new() -> Self {
        Self
    }

    /// Accepted and ignored: draws never depend on caller-supplied seeds.
    pub fn seed(&self, _seed: u64) {}

    /// Read one raw `u64` from the platform entropy source
    pub fn try_draw_u64(&self) -> Result<u64, EntropyError> {
        let mut buf = [0u8; 8];
        getrandom::getrandom(&mut buf)?;
        Ok(u64::from_be_bytes(buf))
    }

    /// Read one raw `u64`, terminating the process if entropy is unavailable.
    /// There is no fallback source and no retry.
    pub fn draw_u64(&self) -> u64 {
        match self.try_draw_u64() {
            Ok(value) => value,
            Err(e) => entropy_unavailable(&e),
        }
    }
}

fn entropy_unavailable(err: &EntropyError) -> ! {
    tracing::error!(error = %err, "cannot read secure entropy, terminating");
    eprintln!("fatal: {}", err);
    std::process::exit(EXIT_ENTROPY_UNAVAILABLE)
}

impl RandomSource for SecureRandom {
    fn draw_bounded(&self, bound: u64) -> Result<u64, RandomError> {
        if bound == 0 {
            return Err(RandomError::EmptyRange);
        }

        // 2^64 mod bound: raw values below this would over-weight the low residues
        let threshold = bound.wrapping_neg() % bound;
        loop {
            let value = self.draw_u64();
            if value >= threshold {
                return Ok(value % bound);
            }
        }
    }
}

#[cfg(test)]
#[path = "secure_tests.rs"]
mod tests;
