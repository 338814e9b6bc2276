//! Resolve command implementation

use anyhow::Result;
use colored::*;
use plinth_modules::ModuleLoader;

/// Print the file `name` resolves to, or every candidate with `all`
pub fn resolve(loader: &ModuleLoader, name: &str, all: bool) -> Result<()> {
    if !all {
        println!("{}", loader.locate(name)?.display());
        return Ok(());
    }

    let mut chosen = false;
    for location in loader.search_locations(name)? {
        let exists = location.path.is_file();
        let marker = if exists && !chosen {
            chosen = true;
            "→".green().bold()
        } else if exists {
            "·".yellow()
        } else {
            " ".normal()
        };
        println!("{} {:<10} {}", marker, location.kind.to_string(), location.path.display());
    }

    if !chosen {
        // Same error and trace as an import would give
        loader.locate(name)?;
    }
    Ok(())
}
