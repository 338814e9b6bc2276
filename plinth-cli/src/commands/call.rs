//! Call command implementation

use anyhow::{bail, Context, Result};
use plinth_modules::{call_site, ModuleLoader};
use serde_json::Value;

/// Import the module named in `target` (`<module>::<export>`) and call the export
pub fn call(loader: &mut ModuleLoader, target: &str, args: &[String]) -> Result<Value> {
    let Some((module, export)) = target.rsplit_once("::") else {
        bail!("expected <module>::<export>, got {:?}", target);
    };

    let args = args.iter().map(|arg| parse_arg(arg)).collect::<Vec<_>>();
    let handle = loader
        .require(module, call_site!("plinth call"))
        .with_context(|| format!("loading {}", module))?;

    Ok(handle.call(export, &args)?)
}

/// JSON if it parses, a plain string otherwise
fn parse_arg(arg: &str) -> Value {
    serde_json::from_str(arg).unwrap_or_else(|_| Value::String(arg.to_string()))
}
