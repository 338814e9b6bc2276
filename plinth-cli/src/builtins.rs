//! Module implementations compiled into the `plinth` binary

use plinth_modules::{Module, ModuleError, ModuleRegistry, NativeModule};
use serde_json::{json, Value};
use std::io::IsTerminal;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

const DEFAULT_WIDTH: u64 = 80;

/// Registry with every builtin implementation
pub fn registry() -> ModuleRegistry {
    let mut registry = ModuleRegistry::new();
    registry
        .register_fn("log", |scope| Ok(log_module(scope.module_name())))
        .register_fn("term", |scope| Ok(term_module(scope.module_name())));
    registry
}

fn message(args: &[Value]) -> String {
    args.iter()
        .map(|arg| match arg {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// `info`, `warn`, `error`, `debug`: emit the joined arguments
fn log_module(name: &str) -> Arc<dyn Module> {
    let target = name.to_string();
    let (t1, t2, t3, t4) = (target.clone(), target.clone(), target.clone(), target);
    NativeModule::new(name)
        .export("debug", move |args| {
            debug!(module = %t1, "{}", message(args));
            Ok(Value::Null)
        })
        .export("info", move |args| {
            info!(module = %t2, "{}", message(args));
            Ok(Value::Null)
        })
        .export("warn", move |args| {
            warn!(module = %t3, "{}", message(args));
            Ok(Value::Null)
        })
        .export("error", move |args| {
            error!(module = %t4, "{}", message(args));
            Ok(Value::Null)
        })
        .into_module()
}

/// `width`: columns from `COLUMNS`, 80 otherwise. `is_terminal`: stdout is a tty
fn term_module(name: &str) -> Arc<dyn Module> {
    let module = name.to_string();
    NativeModule::new(name)
        .export("width", move |_| {
            let width = match std::env::var("COLUMNS") {
                Ok(value) => value.trim().parse::<u64>().map_err(|e| ModuleError::Call {
                    module: module.clone(),
                    export: "width".to_string(),
                    message: format!("COLUMNS={:?}: {}", value, e),
                })?,
                Err(_) => DEFAULT_WIDTH,
            };
            Ok(json!(width))
        })
        .export("is_terminal", |_| Ok(json!(std::io::stdout().is_terminal())))
        .into_module()
}
