//! Catalog data model: modules, tools, prompts, resources and statistics.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Separator between namespace and original tool name in a qualified name.
pub const NAMESPACE_SEPARATOR: char = ':';

/// Build the qualified `<namespace>:<original>` catalog key.
pub fn qualify(namespace: &str, original_name: &str) -> String {
    format!("{namespace}{NAMESPACE_SEPARATOR}{original_name}")
}

/// Schema used when a tool declares no `inputSchema`.
pub fn empty_input_schema() -> Value {
    serde_json::json!({ "type": "object", "properties": {} })
}

/// Load outcome of the most recent scan of a module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum LoadState {
    /// The module was read and parsed (possibly yielding zero items).
    Loaded,
    /// The module could not be read.
    Error { message: String },
}

/// One scanned source file.
///
/// Records are replaced wholesale on every re-scan, never mutated in place.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleRecord {
    pub path: PathBuf,
    pub namespace: String,
    pub load_state: LoadState,
    pub last_scanned_at: DateTime<Utc>,
    pub tool_count: usize,
    pub prompt_count: usize,
    pub resource_count: usize,
}

impl ModuleRecord {
    pub(crate) fn loaded(
        path: PathBuf,
        namespace: String,
        tool_count: usize,
        prompt_count: usize,
        resource_count: usize,
    ) -> Self {
        Self {
            path,
            namespace,
            load_state: LoadState::Loaded,
            last_scanned_at: Utc::now(),
            tool_count,
            prompt_count,
            resource_count,
        }
    }

    pub(crate) fn failed(path: PathBuf, namespace: String, message: String) -> Self {
        Self {
            path,
            namespace,
            load_state: LoadState::Error { message },
            last_scanned_at: Utc::now(),
            tool_count: 0,
            prompt_count: 0,
            resource_count: 0,
        }
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self.load_state, LoadState::Loaded)
    }

    /// The read error, present iff the module is in the error state.
    pub fn error(&self) -> Option<&str> {
        match &self.load_state {
            LoadState::Loaded => None,
            LoadState::Error { message } => Some(message),
        }
    }
}

/// A tool found in a scanned module.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoveredTool {
    /// Qualified catalog key, `<namespace>:<original_name>`.
    pub name: String,
    pub original_name: String,
    pub namespace: String,
    pub description: String,
    /// Opaque argument schema, passed through untouched.
    pub input_schema: Value,
    pub source_module: PathBuf,
}

impl DiscoveredTool {
    /// Create a tool, deriving its qualified name from `namespace` and `original_name`.
    pub fn new(
        namespace: impl Into<String>,
        original_name: impl Into<String>,
        description: impl Into<String>,
        input_schema: Value,
        source_module: impl Into<PathBuf>,
    ) -> Self {
        let namespace = namespace.into();
        let original_name = original_name.into();
        Self {
            name: qualify(&namespace, &original_name),
            original_name,
            namespace,
            description: description.into(),
            input_schema,
            source_module: source_module.into(),
        }
    }

    /// Caller-facing listing shape.
    pub fn to_mcp(&self) -> McpToolInfo {
        McpToolInfo {
            name: self.name.clone(),
            description: self.description.clone(),
            input_schema: self.input_schema.clone(),
        }
    }
}

/// The `{name, description, inputSchema}` shape handed to protocol clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct McpToolInfo {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
}

/// A declared prompt argument.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptArgumentInfo {
    pub name: String,
    pub description: String,
    pub required: bool,
}

/// A prompt found in a scanned module. Prompt names are not namespaced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoveredPrompt {
    pub name: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arguments: Option<Vec<PromptArgumentInfo>>,
    pub source_module: PathBuf,
}

/// A resource found in a scanned module.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoveredResource {
    pub uri: String,
    pub name: String,
    pub description: String,
    pub mime_type: String,
    pub source_module: PathBuf,
}

/// Registry statistics, always derived from a single catalog snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistryStats {
    pub total_modules: usize,
    pub loaded_modules: usize,
    pub error_modules: usize,
    pub total_tools: usize,
    pub total_prompts: usize,
    pub total_resources: usize,
    pub by_namespace: BTreeMap<String, usize>,
}

/// The aggregated catalog owned by the registry.
///
/// All collections are key-unique with last-write-wins semantics.
#[derive(Debug, Clone, Default)]
pub(crate) struct Catalog {
    pub modules: HashMap<PathBuf, ModuleRecord>,
    pub tools: HashMap<String, DiscoveredTool>,
    pub prompts: HashMap<String, DiscoveredPrompt>,
    pub resources: HashMap<String, DiscoveredResource>,
    pub by_namespace: HashMap<String, BTreeSet<String>>,
}

impl Catalog {
    /// Insert or replace a tool, keeping the namespace index in step.
    pub fn insert_tool(&mut self, tool: DiscoveredTool) {
        if let Some(previous) = self.tools.remove(&tool.name) {
            self.unindex(&previous);
        }
        self.by_namespace
            .entry(tool.namespace.clone())
            .or_default()
            .insert(tool.name.clone());
        self.tools.insert(tool.name.clone(), tool);
    }

    fn unindex(&mut self, tool: &DiscoveredTool) {
        if let Some(names) = self.by_namespace.get_mut(&tool.namespace) {
            names.remove(&tool.name);
            if names.is_empty() {
                self.by_namespace.remove(&tool.namespace);
            }
        }
    }

    pub fn insert_prompt(&mut self, prompt: DiscoveredPrompt) {
        self.prompts.insert(prompt.name.clone(), prompt);
    }

    pub fn insert_resource(&mut self, resource: DiscoveredResource) {
        self.resources.insert(resource.uri.clone(), resource);
    }

    pub fn stats(&self) -> RegistryStats {
        let loaded_modules = self.modules.values().filter(|m| m.is_loaded()).count();
        RegistryStats {
            total_modules: self.modules.len(),
            loaded_modules,
            error_modules: self.modules.len() - loaded_modules,
            total_tools: self.tools.len(),
            total_prompts: self.prompts.len(),
            total_resources: self.resources.len(),
            by_namespace: self
                .by_namespace
                .iter()
                .map(|(ns, names)| (ns.clone(), names.len()))
                .collect(),
        }
    }
}
