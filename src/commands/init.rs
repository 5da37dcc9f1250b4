//! `init [--hook]`: ensure a repo, append geometry `.gitattributes`
//! patterns, optionally install a pre-commit hook.

use anyhow::{Context, Result};
use std::fs;
use std::io::Write;
#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;

use crate::store::RevisionStore;

const GITATTRIBUTES_BLOCK: &str = "\
*.inp diff=mcnp
*.i diff=mcnp
*.mcnp diff=mcnp
*.xml diff=openmc
";

const PRE_COMMIT_HOOK: &str = "#!/bin/sh\nexec csgit validate --pre-commit\n";

pub fn run(store: &dyn RevisionStore, install_hook: bool) -> Result<()> {
    let created = store.init()?;
    if created {
        println!("Initialized empty repository.");
    } else {
        println!("Repository already exists.");
    }

    ensure_gitattributes()?;

    if install_hook {
        install_pre_commit_hook(store)?;
    }

    Ok(())
}

fn ensure_gitattributes() -> Result<()> {
    let path = ".gitattributes";
    let existing = fs::read_to_string(path).unwrap_or_default();
    if existing.contains("diff=mcnp") {
        return Ok(());
    }
    let mut file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("failed to open {path}"))?;
    if !existing.is_empty() && !existing.ends_with('\n') {
        writeln!(file)?;
    }
    file.write_all(GITATTRIBUTES_BLOCK.as_bytes())
        .with_context(|| format!("failed to write {path}"))?;
    println!("Updated .gitattributes.");
    Ok(())
}

fn install_pre_commit_hook(store: &dyn RevisionStore) -> Result<()> {
    let hooks_dir = store.hooks_dir()?;
    fs::create_dir_all(&hooks_dir)
        .with_context(|| format!("failed to create {}", hooks_dir.display()))?;
    let hook_path = hooks_dir.join("pre-commit");
    fs::write(&hook_path, PRE_COMMIT_HOOK)
        .with_context(|| format!("failed to write {}", hook_path.display()))?;

    #[cfg(unix)]
    {
        let mut perms = fs::metadata(&hook_path)?.permissions();
        perms.set_mode(0o755);
        fs::set_permissions(&hook_path, perms)?;
    }

    println!("Installed pre-commit hook.");
    Ok(())
}
