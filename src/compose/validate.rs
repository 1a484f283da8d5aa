//! Shape checks on the composed tree.

use serde_json::Value;

use super::ComposeError;

/// Keys that tell the bundler which modules a rule applies to.
const RULE_CONDITIONS: &[&str] = &["test", "include", "resource", "resourceQuery", "oneOf"];

fn shape(path: &str, reason: impl Into<String>) -> ComposeError {
    ComposeError::Shape {
        path: path.to_string(),
        reason: reason.into(),
    }
}

/// Check the parts of the tree the bridge relies on.
pub fn validate_shape(config: &Value) -> Result<(), ComposeError> {
    let entry = config
        .get("entry")
        .and_then(Value::as_object)
        .ok_or_else(|| shape("entry", "must be a mapping"))?;
    if entry.is_empty() {
        return Err(shape("entry", "must declare at least one entry"));
    }
    for (name, path) in entry {
        if !path.is_string() {
            return Err(shape(&format!("entry.{}", name), "must be a path string"));
        }
    }

    if !config.pointer("/output/path").map_or(false, Value::is_string) {
        return Err(shape("output.path", "must be a string"));
    }

    if let Some(extensions) = config.pointer("/resolve/extensions") {
        let ok = extensions
            .as_array()
            .map_or(false, |list| list.iter().all(Value::is_string));
        if !ok {
            return Err(shape("resolve.extensions", "must be a list of strings"));
        }
    }

    if let Some(rules) = config.pointer("/module/rules") {
        let rules = rules
            .as_array()
            .ok_or_else(|| shape("module.rules", "must be a list"))?;
        for (i, rule) in rules.iter().enumerate() {
            let path = format!("module.rules[{}]", i);
            let rule = rule
                .as_object()
                .ok_or_else(|| shape(&path, "must be a mapping"))?;
            if !RULE_CONDITIONS.iter().any(|key| rule.contains_key(*key)) {
                return Err(shape(
                    &path,
                    "must have one of `test`, `include`, `resource`, `resourceQuery` or `oneOf`",
                ));
            }
        }
    }

    if let Some(plugins) = config.get("plugins") {
        let plugins = plugins
            .as_array()
            .ok_or_else(|| shape("plugins", "must be a list"))?;
        for (i, plugin) in plugins.iter().enumerate() {
            if !plugin.get("plugin").map_or(false, Value::is_string) {
                return Err(shape(
                    &format!("plugins[{}]", i),
                    "must be a mapping with a string `plugin`",
                ));
            }
        }
    }

    Ok(())
}
