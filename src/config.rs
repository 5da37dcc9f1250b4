//! Ambient constants and environment probing shared across commands.

use std::env;
use std::path::PathBuf;

/// FNV-1a 64-bit offset basis, per the fingerprint hash family.
pub const FNV_OFFSET_BASIS: u64 = 14695981039346656037;
/// FNV-1a 64-bit prime.
pub const FNV_PRIME: u64 = 1099511628211;

/// Absolute tolerance floor for density equality.
pub const DENSITY_ABS_TOL: f64 = 1e-6;
/// Relative tolerance factor for density equality.
pub const DENSITY_REL_TOL: f64 = 1e-6;

/// Grid resolution used when scoring candidate slice positions.
pub const AUTO_SLICE_GRID: usize = 32;
/// Number of candidate positions sampled per axis during auto selection.
pub const AUTO_SLICE_SAMPLES: usize = 20;

/// Whether stdout is a terminal, gating colorized output.
pub fn color_enabled() -> bool {
    atty::is(atty::Stream::Stdout)
}

/// Resolve a directory for scratch files, following `TMPDIR`/`TEMP`/`TMP`
/// and falling back to `/tmp` (or `.` if even that is unusable).
pub fn temp_dir() -> PathBuf {
    for var in ["TMPDIR", "TEMP", "TMP"] {
        if let Ok(val) = env::var(var) {
            if !val.is_empty() {
                return PathBuf::from(val);
            }
        }
    }
    let fallback = PathBuf::from("/tmp");
    if fallback.is_dir() {
        fallback
    } else {
        PathBuf::from(".")
    }
}

/// Two densities are equal iff `|a - b| <= max(DENSITY_ABS_TOL, DENSITY_REL_TOL * |a|)`.
pub fn density_eq(a: f64, b: f64) -> bool {
    (a - b).abs() <= (DENSITY_ABS_TOL).max(DENSITY_REL_TOL * a.abs())
}

/// Discretise a double to a 1e-6 grid so hashing is robust to parse noise.
pub fn discretise(v: f64) -> i64 {
    (v * 1e6).round() as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn density_within_tolerance() {
        assert!(density_eq(1.0, 1.0 + 5e-7));
        assert!(!density_eq(1.0, 1.1));
    }

    #[test]
    fn discretise_rounds_to_grid() {
        assert_eq!(discretise(1.0000001), 1_000_000);
        assert_eq!(discretise(1.0000009), 1_000_001);
    }

    #[test]
    fn discretise_grid_matches_density_tolerance() {
        let a = 1.0;
        let b = 1.0 + 5e-7;
        assert_relative_eq!(a, b, max_relative = DENSITY_REL_TOL, epsilon = DENSITY_ABS_TOL);
        assert_eq!(discretise(a), discretise(a)); // idempotent regardless of tolerance
    }
}
