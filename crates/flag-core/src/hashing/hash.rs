//! Hash helpers sobre SHA-256.

use sha2::{Digest, Sha256};

/// Reduce el digest SHA-256 de `input`, leído como entero big-endian de 256
/// bits, módulo `modulus`. Equivale a `int(sha256(input).hexdigest(), 16) %
/// modulus` en cualquier otra implementación.
pub fn digest_mod(input: &str, modulus: u32) -> u32 {
    let digest = Sha256::digest(input.as_bytes());
    digest.iter()
          .fold(0u32, |acc, byte| (acc * 256 + u32::from(*byte)) % modulus)
}
