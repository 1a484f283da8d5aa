//! Base tree generation.
//!
//! Entries, output naming, resolution, module rules, default split chunks
//! and the plugins every build carries.

use serde_json::{json, Map, Value};
use std::path::Path;

use super::plugin::{self, descriptor};
use super::ComposeError;
use crate::config::defaults::{default_title, DEFAULT_EXTENSIONS, SOURCE_ALIAS};
use crate::config::{BaseSettings, ProjectConfig, TemplateDescriptor};
use crate::mode::Mode;

/// One entry with the template it will be emitted with.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedEntry {
    pub name: String,
    pub path: String,
    pub template: TemplateDescriptor,
}

/// Normalize the entry field and pair each entry with its template.
///
/// With more than one entry every entry must declare a template.
pub fn resolve_entries(base: &BaseSettings) -> Result<Vec<ResolvedEntry>, ComposeError> {
    let entries = base.entry.normalize();

    if entries.len() > 1 {
        let missing: Vec<String> = entries
            .iter()
            .filter(|(name, _)| !base.templates.contains_key(name))
            .map(|(name, _)| name.clone())
            .collect();
        if !missing.is_empty() {
            return Err(ComposeError::MissingTemplates { entries: missing });
        }
    }

    Ok(entries
        .into_iter()
        .map(|(name, path)| {
            let template = base.templates.get(&name).cloned().unwrap_or_default();
            ResolvedEntry {
                name,
                path,
                template,
            }
        })
        .collect())
}

/// Extensions: defaults first, then extras, without duplicates.
pub fn merge_extensions(extras: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(DEFAULT_EXTENSIONS.len() + extras.len());
    let candidates = DEFAULT_EXTENSIONS
        .iter()
        .map(|e| e.to_string())
        .chain(extras.iter().map(|e| {
            if e.starts_with('.') {
                e.clone()
            } else {
                format!(".{}", e)
            }
        }));
    for ext in candidates {
        if !out.contains(&ext) {
            out.push(ext);
        }
    }
    out
}

fn path_string(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

pub fn base_tree(project: &ProjectConfig, entries: &[ResolvedEntry], mode: Mode) -> Value {
    let base = &project.base;

    let entry: Map<String, Value> = entries
        .iter()
        .map(|e| (e.name.clone(), Value::String(e.path.clone())))
        .collect();

    let (filename, chunk_filename) = if mode.is_production() {
        ("js/[name].[contenthash:8].js", "js/[name].[contenthash:8].chunk.js")
    } else {
        ("js/[name].js", "js/[name].chunk.js")
    };

    let mut alias = Map::new();
    alias.insert(
        SOURCE_ALIAS.to_string(),
        Value::String(path_string(&project.root.join("src"))),
    );
    for (name, target) in &base.alias {
        alias.insert(name.clone(), Value::String(path_string(&project.resolve(target))));
    }

    let mut plugins: Vec<Value> = entries
        .iter()
        .map(|e| html_plugin(project, e))
        .collect();
    plugins.push(define_plugin(base));
    plugins.push(descriptor(plugin::CLEAN, json!({})));
    plugins.push(descriptor(plugin::VUE_LOADER, json!({})));

    json!({
        "context": path_string(&project.root),
        "entry": entry,
        "output": {
            "path": path_string(&project.resolve(&base.out_dir)),
            "publicPath": base.public_path,
            "filename": filename,
            "chunkFilename": chunk_filename,
            "clean": true
        },
        "resolve": {
            "extensions": merge_extensions(&base.extensions),
            "alias": alias
        },
        "module": {
            "rules": module_rules(mode)
        },
        "optimization": {
            "splitChunks": {
                "chunks": "all",
                "cacheGroups": {
                    "vendors": {
                        "name": "vendors",
                        "test": "[\\\\/]node_modules[\\\\/]",
                        "priority": -10,
                        "reuseExistingChunk": true
                    },
                    "common": {
                        "name": "common",
                        "minChunks": 2,
                        "priority": 0,
                        "reuseExistingChunk": true
                    }
                }
            }
        },
        "plugins": plugins
    })
}

fn html_plugin(project: &ProjectConfig, entry: &ResolvedEntry) -> Value {
    let template = &entry.template;
    let favicon = match &template.favicon {
        Some(path) => Value::String(path_string(&project.resolve(path))),
        None => Value::Bool(false),
    };
    let chunks = match &template.chunks {
        Some(list) => json!(list),
        None => json!("all"),
    };

    descriptor(
        plugin::HTML,
        json!({
            "template": path_string(&project.resolve(&template.template)),
            "favicon": favicon,
            "filename": format!("{}.html", entry.name),
            "title": template.title.clone().unwrap_or_else(|| default_title(&entry.name)),
            "chunks": chunks,
            "inject": true,
            "cache": false,
            "templateParameters": { "BASE_URL": project.base.public_path }
        }),
    )
}

/// Constants are passed as source text, so each value is JSON-encoded.
/// Define values are code. Strings are taken as written; anything else is
/// written out as its JSON literal.
fn define_code(value: &Value) -> String {
    match value {
        Value::String(code) => code.clone(),
        other => other.to_string(),
    }
}

fn define_plugin(base: &BaseSettings) -> Value {
    let mut definitions: Map<String, Value> = base
        .define
        .iter()
        .map(|(k, v)| (k.clone(), Value::String(define_code(v))))
        .collect();
    definitions
        .entry("BASE_URL")
        .or_insert_with(|| Value::String(Value::String(base.public_path.clone()).to_string()));
    descriptor(plugin::DEFINE, Value::Object(definitions))
}

fn style_loader(mode: Mode) -> Value {
    if mode.is_production() {
        json!({ "loader": "mini-css-extract-plugin/loader" })
    } else {
        json!({ "loader": "style-loader" })
    }
}

fn postcss_loader() -> Value {
    json!({
        "loader": "postcss-loader",
        "options": {
            "postcssOptions": {
                "plugins": [["postcss-preset-env", { "stage": 3 }]]
            }
        }
    })
}

fn css_loader(import_loaders: u8) -> Value {
    json!({ "loader": "css-loader", "options": { "importLoaders": import_loaders } })
}

fn module_rules(mode: Mode) -> Vec<Value> {
    vec![
        json!({
            "test": "\\.(m?jsx?|tsx?)$",
            "exclude": "node_modules",
            "use": [{ "loader": "babel-loader", "options": { "cacheDirectory": true } }]
        }),
        json!({
            "test": "\\.vue$",
            "use": [{ "loader": "vue-loader" }]
        }),
        json!({
            "test": "\\.css$",
            "use": [style_loader(mode), css_loader(1), postcss_loader()]
        }),
        json!({
            "test": "\\.s[ac]ss$",
            "use": [style_loader(mode), css_loader(2), postcss_loader(), { "loader": "sass-loader" }]
        }),
        json!({
            "test": "\\.less$",
            "use": [style_loader(mode), css_loader(2), postcss_loader(), { "loader": "less-loader" }]
        }),
        json!({
            "test": "\\.(png|jpe?g|gif|webp|svg)$",
            "type": "asset",
            "parser": { "dataUrlCondition": { "maxSize": 8192 } },
            "generator": { "filename": "images/[hash][ext][query]" }
        }),
        json!({
            "test": "\\.(woff2?|eot|ttf|otf)$",
            "type": "asset/resource",
            "generator": { "filename": "fonts/[hash][ext][query]" }
        }),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EntrySpec;
    use std::collections::BTreeMap;

    fn project() -> ProjectConfig {
        ProjectConfig::with_defaults("/work/app")
    }

    #[test]
    fn test_extension_dedup_keeps_default_order() {
        let exts = merge_extensions(&[".ts".to_string(), ".vue".to_string(), "mjs".to_string()]);
        assert_eq!(exts.iter().filter(|e| *e == ".ts").count(), 1);
        assert_eq!(&exts[..DEFAULT_EXTENSIONS.len()], DEFAULT_EXTENSIONS);
        assert_eq!(exts.last().map(String::as_str), Some(".mjs"));
    }

    #[test]
    fn test_single_entry_without_template_uses_default() {
        let entries = resolve_entries(&BaseSettings::default()).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, "index");
        assert_eq!(entries[0].template, TemplateDescriptor::default());
    }

    #[test]
    fn test_multi_entry_names_missing_templates() {
        let mut base = BaseSettings::default();
        base.entry = EntrySpec::Named(vec![
            ("index".to_string(), "./src/index.js".to_string()),
            ("admin".to_string(), "./src/admin.js".to_string()),
        ]);
        let mut templates = BTreeMap::new();
        templates.insert("index".to_string(), TemplateDescriptor::default());
        base.templates = templates;

        let err = resolve_entries(&base).unwrap_err();
        match err {
            ComposeError::MissingTemplates { entries } => assert_eq!(entries, vec!["admin"]),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_output_names_depend_on_mode() {
        let p = project();
        let entries = resolve_entries(&p.base).unwrap();

        let prod = base_tree(&p, &entries, Mode::Production);
        let dev = base_tree(&p, &entries, Mode::Development);
        assert_eq!(prod["output"]["filename"], "js/[name].[contenthash:8].js");
        assert_eq!(dev["output"]["filename"], "js/[name].js");
        assert_eq!(prod["output"]["path"], "/work/app/dist");
    }

    #[test]
    fn test_project_alias_wins_over_source_alias() {
        let mut p = project();
        p.base.alias = vec![
            ("@".to_string(), "./app".to_string()),
            ("lib".to_string(), "/opt/lib".to_string()),
        ];
        let entries = resolve_entries(&p.base).unwrap();
        let tree = base_tree(&p, &entries, Mode::Development);

        assert_eq!(tree["resolve"]["alias"]["@"], "/work/app/app");
        assert_eq!(tree["resolve"]["alias"]["lib"], "/opt/lib");
    }

    #[test]
    fn test_html_plugin_per_entry_and_fixed_plugins() {
        let mut p = project();
        p.base.entry = EntrySpec::Named(vec![
            ("index".to_string(), "./src/index.js".to_string()),
            ("admin".to_string(), "./src/admin.js".to_string()),
        ]);
        p.base.templates.insert(
            "index".to_string(),
            TemplateDescriptor::default(),
        );
        p.base.templates.insert(
            "admin".to_string(),
            TemplateDescriptor {
                template: "./public/admin.html".to_string(),
                favicon: Some("./public/favicon.ico".to_string()),
                title: Some("Admin".to_string()),
                chunks: Some(vec!["vendors".to_string(), "admin".to_string()]),
            },
        );
        let entries = resolve_entries(&p.base).unwrap();
        let tree = base_tree(&p, &entries, Mode::Production);
        let plugins = tree["plugins"].as_array().unwrap();

        let ids: Vec<&str> = plugins.iter().filter_map(plugin::identity).collect();
        assert_eq!(
            ids,
            vec![plugin::HTML, plugin::HTML, plugin::DEFINE, plugin::CLEAN, plugin::VUE_LOADER]
        );

        let index = &plugins[0]["options"];
        assert_eq!(index["filename"], "index.html");
        assert_eq!(index["title"], "index Page");
        assert_eq!(index["chunks"], "all");
        assert_eq!(index["favicon"], false);

        let admin = &plugins[1]["options"];
        assert_eq!(admin["template"], "/work/app/public/admin.html");
        assert_eq!(admin["chunks"], json!(["vendors", "admin"]));
        assert_eq!(admin["title"], "Admin");
    }

    #[test]
    fn test_define_values_are_code() {
        let mut p = project();
        p.base.define.insert("API".to_string(), json!("\"https://api\""));
        p.base.define.insert("process.env".to_string(), json!("{\"NODE_ENV\":\"prod\"}"));
        p.base.define.insert("DEBUG".to_string(), json!(false));
        p.base.define.insert("LIMITS".to_string(), json!({"retries": 3}));
        let entries = resolve_entries(&p.base).unwrap();
        let tree = base_tree(&p, &entries, Mode::Development);

        let define = tree["plugins"]
            .as_array()
            .unwrap()
            .iter()
            .find(|d| plugin::identity(d) == Some(plugin::DEFINE))
            .unwrap();
        // Strings pass through untouched, already-encoded text included.
        assert_eq!(define["options"]["API"], "\"https://api\"");
        assert_eq!(define["options"]["process.env"], "{\"NODE_ENV\":\"prod\"}");
        assert_eq!(define["options"]["DEBUG"], "false");
        assert_eq!(define["options"]["LIMITS"], "{\"retries\":3}");
        assert_eq!(define["options"]["BASE_URL"], "\"/\"");
    }

    #[test]
    fn test_style_loader_depends_on_mode() {
        let prod = module_rules(Mode::Production);
        let dev = module_rules(Mode::Development);
        assert_eq!(prod[2]["use"][0]["loader"], "mini-css-extract-plugin/loader");
        assert_eq!(dev[2]["use"][0]["loader"], "style-loader");
    }
}
