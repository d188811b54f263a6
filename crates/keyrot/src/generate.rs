//! Random key value generation.

use rand::RngCore;
use zeroize::Zeroize;

use crate::error::Result;

/// Produces fresh, uniformly random key values.
pub trait Generator {
    /// Return a lowercase hexadecimal string encoding `bits` random bits,
    /// rounded up to whole bytes.
    fn generate(&self, bits: usize) -> Result<String>;
}

/// Generator backed by the operating system's secure random source.
#[derive(Debug, Default, Clone, Copy)]
pub struct OsRngGenerator;

impl Generator for OsRngGenerator {
    fn generate(&self, bits: usize) -> Result<String> {
        generate(bits)
    }
}

/// Number of bytes needed to hold `bits` bits.
pub fn byte_len(bits: usize) -> usize {
    bits.div_ceil(8)
}

/// Generate a hexadecimal key value with `bits` bits of entropy from OsRng.
pub fn generate(bits: usize) -> Result<String> {
    let mut bytes = vec![0u8; byte_len(bits)];
    rand::rngs::OsRng.try_fill_bytes(&mut bytes)?;

    let value = hex::encode(&bytes);
    bytes.zeroize();

    Ok(value)
}
