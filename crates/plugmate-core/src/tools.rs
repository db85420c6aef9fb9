//! Tool catalog
//!
//! Plugins may ship a `tools.json` file describing the callable tools
//! they provide. The catalog scans the install root, qualifies each
//! tool name with its plugin (`ocr` + `extract_text` ->
//! `ocr_extract_text`), and renders the result as OpenAI
//! function-calling descriptors or a plain-text summary.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;
use serde_json::{json, Value};
use tracing::warn;

use crate::error::{PlugmateError, Result};

pub const TOOLS_FILE: &str = "tools.json";

/// Per-plugin tool declaration file.
#[derive(Debug, Deserialize)]
struct ToolsFile {
    #[serde(default)]
    tools: Vec<ToolDecl>,
}

#[derive(Debug, Clone, Deserialize)]
struct ToolDecl {
    name: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    parameters: BTreeMap<String, ParamDecl>,
}

#[derive(Debug, Clone, Deserialize)]
struct ParamDecl {
    #[serde(rename = "type", default)]
    type_name: String,
    #[serde(default)]
    required: bool,
    #[serde(default)]
    default: Option<Value>,
}

/// One registered tool, qualified with its plugin name.
#[derive(Debug, Clone)]
pub struct Tool {
    pub name: String,
    pub plugin: String,
    pub description: String,
    parameters: BTreeMap<String, ParamDecl>,
}

impl Tool {
    pub fn parameter_names(&self) -> Vec<&str> {
        self.parameters.keys().map(String::as_str).collect()
    }
}

/// Tools collected from every installed plugin.
#[derive(Debug, Default)]
pub struct ToolCatalog {
    tools: Vec<Tool>,
}

impl ToolCatalog {
    /// Scan the install root for `tools.json` files. A plugin with a
    /// malformed declaration is skipped with a warning rather than
    /// failing the whole scan.
    pub fn scan(install_root: &Path) -> Result<Self> {
        let mut catalog = Self::default();
        if !install_root.is_dir() {
            return Ok(catalog);
        }

        for entry in fs::read_dir(install_root)? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            let plugin = entry.file_name().to_string_lossy().to_string();
            if plugin.starts_with('_') {
                continue;
            }

            let path = entry.path().join(TOOLS_FILE);
            if !path.is_file() {
                continue;
            }

            match Self::load_tools_file(&path) {
                Ok(decls) => {
                    for decl in decls {
                        catalog.tools.push(Tool {
                            name: format!("{}_{}", plugin, decl.name),
                            plugin: plugin.clone(),
                            description: decl.description,
                            parameters: decl.parameters,
                        });
                    }
                }
                Err(e) => {
                    warn!(plugin = %plugin, error = %e, "skipping malformed tool declaration");
                }
            }
        }

        catalog.tools.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(catalog)
    }

    fn load_tools_file(path: &Path) -> Result<Vec<ToolDecl>> {
        let content = fs::read_to_string(path)?;
        let file: ToolsFile =
            serde_json::from_str(&content).map_err(|e| PlugmateError::MalformedState {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;
        Ok(file.tools)
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name.as_str()).collect()
    }

    pub fn get(&self, name: &str) -> Option<&Tool> {
        self.tools.iter().find(|t| t.name == name)
    }

    /// Render every tool as an OpenAI function-calling descriptor.
    pub fn to_openai_format(&self) -> Vec<Value> {
        self.tools
            .iter()
            .map(|tool| {
                let mut properties = serde_json::Map::new();
                let mut required = Vec::new();

                for (param, decl) in &tool.parameters {
                    let mut prop = serde_json::Map::new();
                    prop.insert("type".to_string(), json!(json_type(&decl.type_name)));
                    prop.insert(
                        "description".to_string(),
                        json!(format!("Parameter {param}")),
                    );
                    if let Some(default) = &decl.default {
                        prop.insert("default".to_string(), default.clone());
                    }
                    properties.insert(param.clone(), Value::Object(prop));

                    if decl.required {
                        required.push(param.clone());
                    }
                }

                let description = if tool.description.is_empty() {
                    format!("Tool: {}", tool.name)
                } else {
                    tool.description.clone()
                };

                json!({
                    "type": "function",
                    "function": {
                        "name": tool.name,
                        "description": description,
                        "parameters": {
                            "type": "object",
                            "properties": properties,
                            "required": required,
                        }
                    }
                })
            })
            .collect()
    }

    /// Human-readable listing of every tool and its parameters.
    pub fn summary(&self) -> String {
        if self.tools.is_empty() {
            return "No tools are currently registered".to_string();
        }

        let mut lines = vec![format!("Total available tools: {}\n", self.tools.len())];
        for tool in &self.tools {
            let desc = if tool.description.is_empty() {
                "No description"
            } else {
                &tool.description
            };
            let params = tool.parameter_names().join(", ");
            lines.push(format!("- {}: {}\n  Parameters: ({})", tool.name, desc, params));
        }

        lines.join("\n")
    }
}

/// Map declared parameter types to JSON Schema types. Matching is
/// substring-based so `Optional[str]` still maps to `string`.
fn json_type(type_name: &str) -> &'static str {
    let lower = type_name.to_lowercase();
    for (decl, json) in [
        ("str", "string"),
        ("int", "integer"),
        ("float", "number"),
        ("bool", "boolean"),
        ("list", "array"),
        ("dict", "object"),
    ] {
        if lower.contains(decl) {
            return json;
        }
    }
    "string"
}
