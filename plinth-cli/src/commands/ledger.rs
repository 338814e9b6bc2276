//! Ledger command implementation

use anyhow::Result;
use plinth_modules::{call_site, ImportLedger, ModuleLoader};

/// Import `names`, then print the ledger and the collision history
pub fn ledger(loader: &mut ModuleLoader, names: &[String], json: bool) -> Result<()> {
    loader.import_all(names, call_site!("plinth ledger"))?;

    if json {
        println!("{}", serde_json::to_string_pretty(loader.ledger())?);
    } else {
        print!("{}", render(loader.ledger()));
    }
    Ok(())
}

/// Plain-text listing, one import per line
pub fn render(ledger: &ImportLedger) -> String {
    let mut out = String::new();
    let width = ledger.iter().map(|e| e.name.len()).max().unwrap_or(0);

    for entry in ledger.iter() {
        out.push_str(&format!(
            "{:<width$}  {}  <- {}\n",
            entry.name,
            entry.file.display(),
            entry.caller,
            width = width
        ));
    }

    for collision in ledger.collisions() {
        out.push_str(&format!(
            "collision: {}\n  kept    {} <- {}\n  ignored {} <- {}\n",
            collision.name,
            collision.first_file.display(),
            collision.first_caller,
            collision.new_file.display(),
            collision.new_caller
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use plinth_modules::CallSite;
    use std::path::Path;

    #[test]
    fn test_render_entries_and_collisions() {
        let mut ledger = ImportLedger::new();
        ledger.record("log", "/core/log", CallSite::descriptor("cli"));
        ledger.record("p/fmt", "/proj/plugins/p/lib/fmt", CallSite::descriptor("cli"));
        ledger.record_collision(
            "p/fmt",
            Path::new("/proj/plugins/p/bin/lib/fmt"),
            CallSite::new("/proj/plugins/p/lib/tool", 0, "p/tool"),
        );

        let text = render(&ledger);
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines[0], "log    /core/log  <- cli");
        assert_eq!(lines[1], "p/fmt  /proj/plugins/p/lib/fmt  <- cli");
        assert_eq!(lines[2], "collision: p/fmt");
        assert_eq!(lines[3], "  kept    /proj/plugins/p/lib/fmt <- cli");
        assert_eq!(
            lines[4],
            "  ignored /proj/plugins/p/bin/lib/fmt <- p/tool (/proj/plugins/p/lib/tool)"
        );
    }

    #[test]
    fn test_render_empty() {
        assert_eq!(render(&ImportLedger::new()), "");
    }
}
