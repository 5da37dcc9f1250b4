//! `blame [--cell N | --surface N] [-- <file>]`: per-cell and
//! per-surface attribution, optionally restricted to one id.

use anyhow::Result;

use crate::blame::blame;
use crate::store::RevisionStore;

#[derive(Debug, Clone, Copy, Default)]
pub enum Selector {
    #[default]
    All,
    Cell(i64),
    Surface(i64),
}

pub fn run(store: &dyn RevisionStore, path: &str, selector: Selector) -> Result<()> {
    let result = blame(store, path)?;

    match selector {
        Selector::All => {
            let mut cell_ids: Vec<i64> = result.cells.keys().copied().collect();
            cell_ids.sort_unstable();
            for id in cell_ids {
                let a = &result.cells[&id];
                println!("cell {id}: {} {} {}", a.short_id, a.date, a.author_name);
            }
            let mut surface_ids: Vec<i64> = result.surfaces.keys().copied().collect();
            surface_ids.sort_unstable();
            for id in surface_ids {
                let a = &result.surfaces[&id];
                println!("surface {id}: {} {} {}", a.short_id, a.date, a.author_name);
            }
        }
        Selector::Cell(id) => match result.cells.get(&id) {
            Some(a) => println!("cell {id}: {} {} {}", a.short_id, a.date, a.author_name),
            None => println!("cell {id}: not found in {path}"),
        },
        Selector::Surface(id) => match result.surfaces.get(&id) {
            Some(a) => println!("surface {id}: {} {} {}", a.short_id, a.date, a.author_name),
            None => println!("surface {id}: not found in {path}"),
        },
    }

    Ok(())
}
