//! Format detection and blob loading, including the temp-file dance for
//! parsers that only accept paths.

use anyhow::{Context, Result};
use std::fs;
use std::io::Write;
use std::path::Path;
use tempfile::Builder;

use super::{mcnp, openmc, Format, ParsedGeometry};
use crate::config;

/// Load a geometry from an in-memory blob. `path_hint` is used only for
/// format detection (extension first, then content sniff).
pub fn load_buffer(path_hint: &str, content: &[u8]) -> Result<ParsedGeometry> {
    match Format::detect(path_hint, content) {
        Format::Mcnp => {
            let text = String::from_utf8_lossy(content);
            mcnp::parse(&text).with_context(|| format!("failed to parse MCNP geometry: {path_hint}"))
        }
        Format::OpenMc => load_openmc_via_tempfile(path_hint, content),
    }
}

/// Load a geometry directly from a working-tree path.
pub fn load_path(path: &Path) -> Result<ParsedGeometry> {
    let content = fs::read(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let path_str = path.to_string_lossy();
    match Format::detect(&path_str, &content) {
        Format::Mcnp => {
            let text = String::from_utf8_lossy(&content);
            mcnp::parse(&text).with_context(|| format!("failed to parse MCNP geometry: {}", path.display()))
        }
        Format::OpenMc => openmc::parse_path(path),
    }
}

/// The OpenMC reference parser only accepts a path, so a blob (e.g. read
/// from a git blob) is spilled to a scratch file, parsed, and the scratch
/// file is always removed afterwards, even if parsing failed (`NamedTempFile`
/// unlinks itself on drop regardless of which branch returns).
fn load_openmc_via_tempfile(path_hint: &str, content: &[u8]) -> Result<ParsedGeometry> {
    let dir = config::temp_dir();
    let suffix = Path::new(path_hint)
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();

    let mut tmp = Builder::new()
        .prefix("csgit-")
        .suffix(&suffix)
        .tempfile_in(&dir)
        .with_context(|| format!("failed to create temp file in {}", dir.display()))?;

    tmp.write_all(content)
        .with_context(|| format!("failed to write temp file {}", tmp.path().display()))?;
    tmp.flush()
        .with_context(|| format!("failed to flush temp file {}", tmp.path().display()))?;

    openmc::parse_path(tmp.path())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_mcnp_buffer_directly() {
        let text = "1 3 1.0 -1 u=0\n\n1 so 5\n";
        let sys = load_buffer("model.inp", text.as_bytes()).unwrap();
        assert_eq!(sys.cells.len(), 1);
    }

    #[test]
    fn loads_openmc_buffer_via_tempfile() {
        let xml = br#"<geometry><surface id="1" type="sphere" coeffs="0 0 0 5"/><cell id="1" material="1" density="1.0" region="-1"/></geometry>"#;
        let sys = load_buffer("model.xml", xml).unwrap();
        assert_eq!(sys.cells.len(), 1);
    }
}
