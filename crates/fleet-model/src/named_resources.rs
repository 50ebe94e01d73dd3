//! Well-known resource shorthands that components may reference by name.
use crate::{
    Resource,
    error::{ModelError, ModelResult},
};

/// `(name, cpu, gpu, mem_mb)`
const TABLE: &[(&str, u32, u32, u64)] = &[
    ("SMALL", 1, 0, 1_024),
    ("MEDIUM", 4, 0, 8_192),
    ("LARGE", 16, 0, 65_536),
    ("GPU_SMALL", 8, 1, 32_768),
    ("GPU_LARGE", 64, 8, 491_520),
];

/// Resolve a named resource (case-insensitive).
///
/// An unknown name is an error, never a silent default.
pub fn get(name: &str) -> ModelResult<Resource> {
    let wanted = name.trim().to_ascii_uppercase();
    TABLE
        .iter()
        .find(|(n, ..)| *n == wanted)
        .map(|&(_, cpu, gpu, mem_mb)| Resource::new(cpu, gpu, mem_mb))
        .ok_or_else(|| ModelError::UnknownResource(name.to_string()))
}

/// All registered names.
pub fn names() -> impl Iterator<Item = &'static str> {
    TABLE.iter().map(|(n, ..)| *n)
}
