//! Import command implementation

use anyhow::Result;
use colored::*;
use plinth_modules::{call_site, ModuleLoader};

/// Import modules in order and report what was loaded
pub fn import(loader: &mut ModuleLoader, names: &[String]) -> Result<()> {
    loader.import_all(names, call_site!("plinth import"))?;

    for entry in loader.ledger().iter() {
        println!("{} {} ({})", "✓".green(), entry.name.bold(), entry.file.display());
    }

    let collisions = loader.ledger().collisions().len();
    if collisions > 0 {
        println!(
            "{} {} name collision(s), run `plinth ledger` for details",
            "!".yellow().bold(),
            collisions
        );
    }

    Ok(())
}
