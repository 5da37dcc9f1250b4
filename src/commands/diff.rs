//! `diff [rev1 [rev2]] [--visual|-v ...] [-- <file>]`: textual semantic
//! diff by default, or a rasterised visual diff.

use anyhow::{bail, Context, Result};
use std::fs;
use std::path::Path;

use crate::commands::{geometry_files_at, load_at_rev, MAX_CONSOLE_DETAIL_LINES};
use crate::diff::{diff, print_summary};
use crate::fingerprint;
use crate::geometry::{loader, ParsedGeometry};
use crate::store::RevisionStore;
use crate::visual::{self, Axis, VisualOpts};

/// Revision pair to compare: `(rev1, rev2)` where `rev2 == None` means
/// "the working tree". Follows git's own convention: no revs given =>
/// HEAD vs worktree, one rev => that rev vs worktree, two revs => rev1
/// vs rev2.
pub struct RevPair {
    pub rev1: String,
    pub rev2: Option<String>,
}

impl RevPair {
    pub fn from_args(rev1: Option<String>, rev2: Option<String>) -> RevPair {
        match (rev1, rev2) {
            (None, None) => RevPair { rev1: "HEAD".to_string(), rev2: None },
            (Some(r1), None) => RevPair { rev1: r1, rev2: None },
            (Some(r1), Some(r2)) => RevPair { rev1: r1, rev2: Some(r2) },
            (None, Some(r2)) => RevPair { rev1: "HEAD".to_string(), rev2: Some(r2) },
        }
    }
}

fn load_side(store: &dyn RevisionStore, rev: &str, path: &str) -> Result<Option<ParsedGeometry>> {
    load_at_rev(store, rev, path)
}

fn load_worktree(path: &str) -> Result<Option<ParsedGeometry>> {
    if !Path::new(path).exists() {
        return Ok(None);
    }
    let bytes = fs::read(path)?;
    Ok(Some(loader::load_buffer(path, &bytes)?))
}

fn load_new_side(store: &dyn RevisionStore, rev2: &Option<String>, path: &str) -> Result<Option<ParsedGeometry>> {
    match rev2 {
        Some(rev) => load_side(store, rev, path),
        None => load_worktree(path),
    }
}

/// Textual diff for one or all geometry files between the two revisions.
pub fn run_text(store: &dyn RevisionStore, revs: RevPair, path: Option<&str>) -> Result<()> {
    let files = match path {
        Some(p) => vec![p.to_string()],
        None => geometry_files_at(store, &revs.rev1)?,
    };

    for file in &files {
        let old = load_side(store, &revs.rev1, file)?;
        let new = load_new_side(store, &revs.rev2, file)?;

        match (old, new) {
            (None, None) => continue,
            (None, Some(new)) => {
                println!("{file}: new file ({} cells, {} surfaces)", new.cells.len(), new.surfaces.len());
            }
            (Some(_), None) => {
                println!("{file}: deleted");
            }
            (Some(old), Some(new)) => {
                let old_fp = fingerprint::build(&old);
                let new_fp = fingerprint::build(&new);
                let result = diff(&old_fp, &new_fp);
                if result.is_empty() {
                    continue;
                }
                println!("{file}:");
                print_summary(&result, MAX_CONSOLE_DETAIL_LINES);
            }
        }
    }
    Ok(())
}

#[derive(Debug, Clone, Default)]
pub struct VisualArgs {
    pub axis: Option<Axis>,
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub z: Option<f64>,
    pub all: bool,
    pub no_contours: bool,
    pub width: Option<usize>,
    pub prefix: Option<String>,
}

fn position_override(args: &VisualArgs, axis: Axis) -> Option<f64> {
    match axis {
        Axis::X => args.x,
        Axis::Y => args.y,
        Axis::Z => args.z,
    }
}

/// Visual diff. One file only — visual diffs are not meaningful
/// aggregated across many files.
pub fn run_visual(store: &dyn RevisionStore, revs: RevPair, path: &str, args: VisualArgs) -> Result<()> {
    let old = load_side(store, &revs.rev1, path)?
        .with_context(|| format!("{path} does not exist at {}", revs.rev1))?;
    let new = load_new_side(store, &revs.rev2, path)?
        .with_context(|| format!("{path} does not exist in the comparison target"))?;

    let prefix = args.prefix.clone().unwrap_or_else(|| "csgit-diff".to_string());

    if args.all {
        if args.axis.is_some() {
            bail!("--axis is not compatible with --all");
        }
        visual::visual_diff_all(&old, &new, &prefix)?;
        println!("Wrote visual diff renderings for all three axes (prefix {prefix}).");
        return Ok(());
    }

    let mut opts: VisualOpts = match args.axis {
        Some(axis) => visual::auto_select_all(&old, &new)
            .into_iter()
            .find(|o| o.axis == axis)
            .expect("auto_select_all covers every axis"),
        None => visual::auto_select(&old, &new),
    };

    if let Some(pos) = args.axis.and_then(|axis| position_override(&args, axis)) {
        opts.slice_pos = pos;
    }
    if let Some(width) = args.width {
        opts.width = width.clamp(100, 4000);
    }
    opts.draw_contours = !args.no_contours;

    visual::render_one_axis(&old, &new, &prefix, &opts)?;
    println!(
        "Wrote {prefix}_{}_{{before,after,diff}}.bmp",
        opts.axis.label()
    );
    Ok(())
}
