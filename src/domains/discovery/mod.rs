//! Discovery domain module.
//!
//! Builds the catalog of tools, prompts and resources by reading module
//! source files as text. Modules are never imported or executed.
//!
//! ## Architecture
//!
//! - `scanner.rs` - Walks source directories, applies include/exclude rules
//! - `namespace.rs` - Derives a module's namespace from its server name or file name
//! - `parser/` - Extracts `TOOLS`/`PROMPTS`/`RESOURCES` array declarations
//! - `registry.rs` - Runs the pipeline, owns the catalog, answers queries
//! - `watcher.rs` - Debounced hot reload on file system changes
//! - `events.rs` - Listener subscription for registry lifecycle events
//! - `types.rs` - Catalog data model
//! - `error.rs` - Discovery-specific error types

mod error;
mod events;
mod namespace;
pub mod parser;
mod registry;
mod scanner;
mod types;
mod watcher;

pub use error::DiscoveryError;
pub use events::{ListenerId, RegistryEvent};
pub use namespace::{declared_server_name, extract_namespace};
pub use parser::{ContentParser, DeclarationParser, parse_prompts, parse_resources, parse_tools};
pub use registry::ToolRegistry;
pub use scanner::{MatchRules, ModuleScanner};
pub use types::{
    DiscoveredPrompt, DiscoveredResource, DiscoveredTool, LoadState, McpToolInfo, ModuleRecord,
    NAMESPACE_SEPARATOR, PromptArgumentInfo, RegistryStats, empty_input_schema, qualify,
};
