use std::fs;
use std::path::Path;

use abi_core::module::Module;
use anyhow::{Context, Result};
use sha2::{Digest, Sha256};

pub mod commands;

/// Infer a library name from a dump path.
///
/// `libfoo.so.lsdump` becomes `libfoo.so`. If the path has no file stem,
/// fallback to `unnamed-library`.
pub fn infer_lib_name(dump: &Path) -> String {
    dump.file_stem().and_then(|os_str| os_str.to_str()).unwrap_or("unnamed-library").to_string()
}

/// Lowercase hex SHA-256 of a byte buffer.
pub fn sha256_hex(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

/// A dump parsed from disk, fingerprinted from the bytes that were parsed.
#[derive(Debug)]
pub struct LoadedDump {
    pub module: Module,
    pub sha256: String,
}

/// Read a dump once, hash it and parse it.
pub fn load_dump(path: &Path) -> Result<LoadedDump> {
    let bytes = fs::read(path).with_context(|| format!("Failed to read dump {}", path.display()))?;
    let module = abi_core::dump::load(&bytes)
        .with_context(|| format!("Failed to load dump {}", path.display()))?;
    Ok(LoadedDump { module, sha256: sha256_hex(&bytes) })
}
