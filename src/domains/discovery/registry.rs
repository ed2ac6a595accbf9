//! Tool Registry - owns the discovery pipeline and the aggregated catalog.
//!
//! Each discovery pass runs Scanner -> Namespace Extractor -> Parser over
//! every module, builds a fresh [`Catalog`], then swaps it in as a single
//! snapshot. Readers therefore always see one complete pass and statistics
//! can never disagree with the collections they describe.
//!
//! Passes are serialized behind an async mutex. File reads inside a pass run
//! with bounded concurrency; merging is single-threaded.

use std::collections::BTreeSet;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures::stream::{self, StreamExt};
use parking_lot::{Mutex, RwLock};
use tracing::{debug, info, instrument, warn};

use super::error::DiscoveryError;
use super::events::{EventListeners, ListenerId, RegistryEvent};
use super::namespace::extract_namespace;
use super::parser::{ContentParser, DeclarationParser};
use super::scanner::ModuleScanner;
use super::types::{
    Catalog, DiscoveredPrompt, DiscoveredResource, DiscoveredTool, McpToolInfo, ModuleRecord,
    RegistryStats,
};
use super::watcher::{self, WatchHandle};
use crate::core::config::DiscoveryConfig;

/// Handle to a tool registry. Cloning is cheap and shares the catalog.
#[derive(Clone)]
pub struct ToolRegistry {
    inner: Arc<RegistryInner>,
}

pub(super) struct RegistryInner {
    config: DiscoveryConfig,
    scanner: ModuleScanner,
    parser: Arc<dyn ContentParser>,
    catalog: RwLock<Arc<Catalog>>,
    /// Tools registered directly; re-applied after every pass.
    pinned: RwLock<Vec<DiscoveredTool>>,
    listeners: EventListeners,
    scan_lock: tokio::sync::Mutex<()>,
    watcher: Mutex<Option<WatchHandle>>,
}

impl ToolRegistry {
    /// Create a registry using the declaration-pattern parser.
    pub fn new(config: DiscoveryConfig) -> Result<Self, DiscoveryError> {
        Self::with_parser(config, Arc::new(DeclarationParser))
    }

    /// Create a registry with a custom content parser.
    pub fn with_parser(
        config: DiscoveryConfig,
        parser: Arc<dyn ContentParser>,
    ) -> Result<Self, DiscoveryError> {
        let scanner = ModuleScanner::new(&config)?;
        Ok(Self {
            inner: Arc::new(RegistryInner {
                config,
                scanner,
                parser,
                catalog: RwLock::new(Arc::new(Catalog::default())),
                pinned: RwLock::new(Vec::new()),
                listeners: EventListeners::default(),
                scan_lock: tokio::sync::Mutex::new(()),
                watcher: Mutex::new(None),
            }),
        })
    }

    pub(super) fn from_inner(inner: Arc<RegistryInner>) -> Self {
        Self { inner }
    }

    pub fn config(&self) -> &DiscoveryConfig {
        &self.inner.config
    }

    fn snapshot(&self) -> Arc<Catalog> {
        self.inner.catalog.read().clone()
    }

    // ========================================================================
    // Discovery
    // ========================================================================

    /// Run a full discovery pass and start watching if enabled.
    ///
    /// Never fails: unreadable modules are recorded in their own
    /// [`ModuleRecord`], and a watcher that cannot start is logged.
    #[instrument(skip(self))]
    pub async fn initialize(&self) -> RegistryStats {
        let stats = self.refresh().await;

        info!(
            "Discovered {} tools, {} prompts, {} resources across {} modules ({} errors)",
            stats.total_tools,
            stats.total_prompts,
            stats.total_resources,
            stats.total_modules,
            stats.error_modules
        );

        if self.inner.config.watch_enabled {
            if let Err(e) = self.watch() {
                warn!("Hot reload disabled: {}", e);
            }
        }

        stats
    }

    /// Re-run the discovery pipeline over the whole source tree.
    #[instrument(skip(self))]
    pub async fn refresh(&self) -> RegistryStats {
        let _pass = self.inner.scan_lock.lock().await;

        let scanner = self.inner.scanner.clone();
        let paths = tokio::task::spawn_blocking(move || scanner.scan())
            .await
            .unwrap_or_else(|e| {
                warn!("Module scan task failed: {}", e);
                Vec::new()
            });

        let reads: Vec<(PathBuf, io::Result<String>)> = stream::iter(paths)
            .map(|path| async move {
                // A stray non-UTF-8 byte must not cost the module its tools.
                let content = tokio::fs::read(&path)
                    .await
                    .map(|bytes| String::from_utf8_lossy(&bytes).into_owned());
                (path, content)
            })
            .buffered(self.inner.config.read_concurrency.max(1))
            .collect()
            .await;

        let mut catalog = Catalog::default();
        let mut events = Vec::new();
        for (path, content) in reads {
            load_module(
                self.inner.parser.as_ref(),
                &mut catalog,
                &mut events,
                path,
                content,
            );
        }
        // Keep `pinned` read-locked until the swap so a concurrent
        // `register_tool` lands either in this catalog or after it.
        let stats = {
            let pinned = self.inner.pinned.read();
            for tool in pinned.iter() {
                catalog.insert_tool(tool.clone());
            }
            let stats = catalog.stats();
            *self.inner.catalog.write() = Arc::new(catalog);
            stats
        };

        for event in &events {
            self.inner.listeners.emit(event);
        }
        self.inner.listeners.emit(&RegistryEvent::Updated(stats.clone()));

        debug!("Registry updated: {:?}", stats);
        stats
    }

    /// Insert a tool directly, outside of any scanned module.
    ///
    /// The tool survives later discovery passes and overrides a scanned tool
    /// with the same qualified name.
    pub fn register_tool(&self, tool: DiscoveredTool) {
        info!("Registering tool: {}", tool.name);
        {
            let mut pinned = self.inner.pinned.write();
            pinned.retain(|t| t.name != tool.name);
            pinned.push(tool.clone());
        }

        let event = RegistryEvent::ToolRegistered {
            name: tool.name.clone(),
            namespace: tool.namespace.clone(),
        };
        {
            let mut catalog = self.inner.catalog.write();
            Arc::make_mut(&mut catalog).insert_tool(tool);
        }
        self.inner.listeners.emit(&event);
    }

    // ========================================================================
    // Events
    // ========================================================================

    /// Register a listener for registry events.
    pub fn subscribe<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&RegistryEvent) + Send + Sync + 'static,
    {
        self.inner.listeners.subscribe(listener)
    }

    /// Remove a listener. Returns `false` if it was not registered.
    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        self.inner.listeners.unsubscribe(id)
    }

    // ========================================================================
    // Watching
    // ========================================================================

    /// Watch the source directories and re-discover on change.
    ///
    /// Must be called from within a tokio runtime. Calling it while already
    /// watching is a no-op.
    pub fn watch(&self) -> Result<(), DiscoveryError> {
        let mut slot = self.inner.watcher.lock();
        if slot.is_some() {
            return Ok(());
        }

        let handle = watcher::spawn(
            Arc::downgrade(&self.inner),
            self.inner.scanner.source_dirs(),
            self.inner.scanner.rules().clone(),
            self.inner.config.debounce(),
        )?;
        *slot = Some(handle);
        info!(
            "Watching {} source directories for changes",
            self.inner.scanner.source_dirs().len()
        );
        Ok(())
    }

    /// Stop watching and release the OS watch handles. Idempotent.
    pub fn stop_watching(&self) {
        if let Some(handle) = self.inner.watcher.lock().take() {
            drop(handle);
            info!("Stopped watching source directories");
        }
    }

    pub fn is_watching(&self) -> bool {
        self.inner.watcher.lock().is_some()
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// All tools, ordered by qualified name.
    pub fn get_all_tools(&self) -> Vec<DiscoveredTool> {
        let mut tools: Vec<_> = self.snapshot().tools.values().cloned().collect();
        tools.sort_by(|a, b| a.name.cmp(&b.name));
        tools
    }

    /// All prompts, ordered by name.
    pub fn get_all_prompts(&self) -> Vec<DiscoveredPrompt> {
        let mut prompts: Vec<_> = self.snapshot().prompts.values().cloned().collect();
        prompts.sort_by(|a, b| a.name.cmp(&b.name));
        prompts
    }

    /// All resources, ordered by URI.
    pub fn get_all_resources(&self) -> Vec<DiscoveredResource> {
        let mut resources: Vec<_> = self.snapshot().resources.values().cloned().collect();
        resources.sort_by(|a, b| a.uri.cmp(&b.uri));
        resources
    }

    /// All module records, ordered by path.
    pub fn get_all_modules(&self) -> Vec<ModuleRecord> {
        let mut modules: Vec<_> = self.snapshot().modules.values().cloned().collect();
        modules.sort_by(|a, b| a.path.cmp(&b.path));
        modules
    }

    pub fn get_module(&self, path: &Path) -> Option<ModuleRecord> {
        self.snapshot().modules.get(path).cloned()
    }

    pub fn get_tool(&self, qualified_name: &str) -> Option<DiscoveredTool> {
        self.snapshot().tools.get(qualified_name).cloned()
    }

    pub fn get_tools_by_namespace(&self, namespace: &str) -> Vec<DiscoveredTool> {
        let catalog = self.snapshot();
        catalog
            .by_namespace
            .get(namespace)
            .map(|names| {
                names
                    .iter()
                    .filter_map(|name| catalog.tools.get(name).cloned())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Tools in the `{name, description, inputSchema}` listing shape.
    pub fn get_tools_for_mcp(&self) -> Vec<McpToolInfo> {
        self.get_all_tools().iter().map(DiscoveredTool::to_mcp).collect()
    }

    pub fn get_namespaces(&self) -> BTreeSet<String> {
        self.snapshot().by_namespace.keys().cloned().collect()
    }

    pub fn get_stats(&self) -> RegistryStats {
        self.snapshot().stats()
    }
}

/// Read outcome -> namespace -> parse -> merge, for one module.
fn load_module(
    parser: &dyn ContentParser,
    catalog: &mut Catalog,
    events: &mut Vec<RegistryEvent>,
    path: PathBuf,
    content: io::Result<String>,
) {
    let content = match content {
        Ok(content) => content,
        Err(e) => {
            let error = DiscoveryError::module_unreadable(&path, e);
            warn!("{}", error);
            let namespace = extract_namespace(&path, "");
            events.push(RegistryEvent::ModuleError {
                path: path.clone(),
                error: error.to_string(),
            });
            catalog
                .modules
                .insert(path.clone(), ModuleRecord::failed(path, namespace, error.to_string()));
            return;
        }
    };

    let namespace = extract_namespace(&path, &content);
    let tools = parser.parse_tools(&content, &namespace, &path);
    let prompts = parser.parse_prompts(&content, &path);
    let resources = parser.parse_resources(&content, &path);

    debug!(
        "Loaded module {:?} as '{}': {} tools, {} prompts, {} resources",
        path,
        namespace,
        tools.len(),
        prompts.len(),
        resources.len()
    );

    let record = ModuleRecord::loaded(
        path.clone(),
        namespace.clone(),
        tools.len(),
        prompts.len(),
        resources.len(),
    );
    events.push(RegistryEvent::ModuleLoaded {
        path: path.clone(),
        namespace,
        tools: tools.len(),
    });

    for tool in tools {
        if let Some(previous) = catalog.tools.get(&tool.name) {
            warn!(
                "Tool '{}' from {:?} replaces the one from {:?}",
                tool.name, tool.source_module, previous.source_module
            );
        }
        events.push(RegistryEvent::ToolRegistered {
            name: tool.name.clone(),
            namespace: tool.namespace.clone(),
        });
        catalog.insert_tool(tool);
    }
    for prompt in prompts {
        catalog.insert_prompt(prompt);
    }
    for resource in resources {
        catalog.insert_resource(resource);
    }

    catalog.modules.insert(path, record);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::discovery::types::empty_input_schema;
    use std::fs;
    use tempfile::TempDir;

    const SOLANA_MODULE: &str = r#"
const server = new Server({ name: "opensvm-mcp", version: "1.0.0" }, { capabilities: { tools: {} } });

const TOOLS = [
  {
    name: 'get_transaction',
    description: 'Get transaction details',
    inputSchema: { type: 'object', properties: { signature: { type: 'string' } } },
  },
];

const PROMPTS = [
  { name: 'explain_tx', description: 'Explain a transaction' },
];
"#;

    const LP_MODULE: &str = r#"
const server = new McpServer({ name: "liquidity-mining-mcp", version: "0.2.0" });

export const TOOLS = [
  { name: 'stake', description: 'Stake LP tokens', inputSchema: { type: 'object' } },
];

export const RESOURCES = [
  { uri: 'lp://pools', name: 'Pools', description: 'All pools', mimeType: 'application/json' },
];
"#;

    fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, content).unwrap();
        path
    }

    fn registry_for(dir: &Path) -> ToolRegistry {
        ToolRegistry::new(DiscoveryConfig {
            source_dirs: vec![dir.to_path_buf()],
            ..DiscoveryConfig::default()
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_end_to_end_two_modules() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "mcp-opensvm.ts", SOLANA_MODULE);
        write(temp.path(), "mcp-liquidity.ts", LP_MODULE);

        let registry = registry_for(temp.path());
        registry.initialize().await;

        let names: Vec<_> = registry.get_all_tools().into_iter().map(|t| t.name).collect();
        assert_eq!(names, vec!["lp:stake", "solana:get_transaction"]);

        let namespaces: Vec<_> = registry.get_namespaces().into_iter().collect();
        assert_eq!(namespaces, vec!["lp", "solana"]);

        let solana = registry.get_tools_by_namespace("solana");
        assert_eq!(solana.len(), 1);
        assert_eq!(solana[0].original_name, "get_transaction");

        assert_eq!(registry.get_all_prompts().len(), 1);
        assert_eq!(registry.get_all_resources()[0].uri, "lp://pools");
    }

    #[tokio::test]
    async fn test_stats_consistent_with_catalog() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "mcp-opensvm.ts", SOLANA_MODULE);
        write(temp.path(), "mcp-liquidity.ts", LP_MODULE);
        write(temp.path(), "mcp-empty.ts", "// nothing declared here");

        let registry = registry_for(temp.path());
        let returned = registry.initialize().await;
        let stats = registry.get_stats();

        assert_eq!(returned, stats);
        assert_eq!(stats.total_modules, 3);
        assert_eq!(stats.loaded_modules, 3);
        assert_eq!(stats.error_modules, 0);
        assert_eq!(stats.total_tools, registry.get_all_tools().len());
        assert_eq!(stats.by_namespace.values().sum::<usize>(), stats.total_tools);
        assert_eq!(stats.total_prompts, 1);
        assert_eq!(stats.total_resources, 1);
    }

    #[test]
    fn test_unreadable_module_is_isolated() {
        let mut catalog = Catalog::default();
        let mut events = Vec::new();
        let good = PathBuf::from("/src/mcp-opensvm.ts");
        let bad = PathBuf::from("/src/mcp-broken.ts");

        load_module(
            &DeclarationParser,
            &mut catalog,
            &mut events,
            good,
            Ok(SOLANA_MODULE.to_string()),
        );
        load_module(
            &DeclarationParser,
            &mut catalog,
            &mut events,
            bad.clone(),
            Err(io::Error::new(io::ErrorKind::PermissionDenied, "denied")),
        );

        let stats = catalog.stats();
        assert_eq!(stats.total_modules, 2);
        assert_eq!(stats.error_modules, 1);
        assert_eq!(stats.total_tools, 1);

        let record = &catalog.modules[&bad];
        assert!(!record.is_loaded());
        assert!(record.error().is_some_and(|e| e.contains("denied")));
        assert_eq!(record.namespace, "broken");
        assert!(events.iter().any(|e| e.name() == "module:error"));
    }

    #[tokio::test]
    async fn test_non_utf8_byte_keeps_module_loaded() {
        let temp = TempDir::new().unwrap();
        let mut content = LP_MODULE.as_bytes().to_vec();
        content.extend_from_slice(b"\n// \xff stray byte\n");
        let path = temp.path().join("mcp-liquidity.ts");
        fs::write(&path, content).unwrap();

        let registry = registry_for(temp.path());
        let stats = registry.initialize().await;

        assert_eq!(stats.error_modules, 0);
        assert!(registry.get_module(&path).unwrap().is_loaded());
        assert!(registry.get_tool("lp:stake").is_some());
    }

    #[tokio::test]
    async fn test_missing_source_dir_initializes_empty() {
        let registry = ToolRegistry::new(DiscoveryConfig {
            source_dirs: vec![PathBuf::from("/no/such/dir")],
            ..DiscoveryConfig::default()
        })
        .unwrap();

        let stats = registry.initialize().await;
        assert_eq!(stats, RegistryStats::default());
        assert!(registry.get_all_tools().is_empty());
    }

    #[tokio::test]
    async fn test_get_tool_absent_is_none() {
        let temp = TempDir::new().unwrap();
        let registry = registry_for(temp.path());
        registry.initialize().await;
        assert!(registry.get_tool("nonexistent:tool").is_none());
        assert!(registry.get_tools_by_namespace("nonexistent").is_empty());
    }

    #[tokio::test]
    async fn test_rescan_drops_removed_modules() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "mcp-opensvm.ts", SOLANA_MODULE);
        let lp = write(temp.path(), "mcp-liquidity.ts", LP_MODULE);

        let registry = registry_for(temp.path());
        registry.initialize().await;
        assert_eq!(registry.get_stats().total_modules, 2);

        fs::remove_file(&lp).unwrap();
        let stats = registry.refresh().await;

        assert_eq!(stats.total_modules, 1);
        assert!(registry.get_tool("lp:stake").is_none());
        assert!(registry.get_module(&lp).is_none());
        assert!(!registry.get_namespaces().contains("lp"));
    }

    #[tokio::test]
    async fn test_duplicate_names_last_path_wins() {
        let temp = TempDir::new().unwrap();
        let a = write(temp.path(), "mcp-a.ts", r#"new Server({ name: "opensvm-a" }); const TOOLS = [{ name: "dup", description: "first" }];"#);
        let b = write(temp.path(), "mcp-b.ts", r#"new Server({ name: "opensvm-b" }); const TOOLS = [{ name: "dup", description: "second" }];"#);

        let registry = registry_for(temp.path());
        registry.initialize().await;

        let tool = registry.get_tool("solana:dup").unwrap();
        assert!(a < b);
        assert_eq!(tool.source_module, b);
        assert_eq!(tool.description, "second");
        assert_eq!(registry.get_stats().total_tools, 1);
    }

    #[tokio::test]
    async fn test_events_emitted() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "mcp-opensvm.ts", SOLANA_MODULE);
        write(temp.path(), "mcp-liquidity.ts", LP_MODULE);

        let registry = registry_for(temp.path());
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        registry.subscribe(move |e| sink.lock().push(e.name()));

        registry.initialize().await;

        let seen = seen.lock();
        assert_eq!(seen.iter().filter(|n| **n == "module:loaded").count(), 2);
        assert_eq!(seen.iter().filter(|n| **n == "tool:registered").count(), 2);
        assert_eq!(seen.iter().filter(|n| **n == "registry:updated").count(), 1);
        assert_eq!(seen.last(), Some(&"registry:updated"));
    }

    #[tokio::test]
    async fn test_registered_tool_survives_refresh() {
        let temp = TempDir::new().unwrap();
        let registry = registry_for(temp.path());

        registry.register_tool(DiscoveredTool::new(
            "test",
            "echo",
            "Echo the input",
            empty_input_schema(),
            "builtin",
        ));
        assert!(registry.get_tool("test:echo").is_some());

        registry.refresh().await;
        assert!(registry.get_tool("test:echo").is_some());
        assert_eq!(registry.get_stats().by_namespace["test"], 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_register_tool_during_refresh_is_not_lost() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "mcp-opensvm.ts", SOLANA_MODULE);
        let registry = registry_for(temp.path());

        for round in 0..50 {
            let refreshing = registry.clone();
            let pass = tokio::spawn(async move { refreshing.refresh().await });

            let name = format!("t{round}");
            registry.register_tool(DiscoveredTool::new(
                "pinned",
                name.as_str(),
                "",
                empty_input_schema(),
                "builtin",
            ));
            pass.await.unwrap();

            assert!(registry.get_tool(&format!("pinned:{name}")).is_some());
        }
        assert_eq!(registry.get_stats().by_namespace["pinned"], 50);
    }

    #[tokio::test]
    async fn test_snapshots_are_detached() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "mcp-opensvm.ts", SOLANA_MODULE);
        let registry = registry_for(temp.path());
        registry.initialize().await;

        let mut tools = registry.get_all_tools();
        tools[0].description = "mutated".to_string();
        tools.clear();

        assert_eq!(registry.get_all_tools()[0].description, "Get transaction details");
    }

    #[tokio::test]
    async fn test_tools_for_mcp_shape() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "mcp-liquidity.ts", LP_MODULE);
        let registry = registry_for(temp.path());
        registry.initialize().await;

        let listed = registry.get_tools_for_mcp();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].name, "lp:stake");
        assert_eq!(listed[0].description, "Stake LP tokens");
        assert_eq!(listed[0].input_schema["type"], "object");
    }

    #[tokio::test]
    async fn test_stop_watching_is_idempotent() {
        let temp = TempDir::new().unwrap();
        let registry = registry_for(temp.path());

        registry.stop_watching();
        registry.watch().unwrap();
        registry.watch().unwrap();
        assert!(registry.is_watching());

        registry.stop_watching();
        registry.stop_watching();
        assert!(!registry.is_watching());
    }

    #[tokio::test]
    async fn test_watch_debounces_burst_into_one_update() {
        let temp = TempDir::new().unwrap();
        let registry = ToolRegistry::new(DiscoveryConfig {
            source_dirs: vec![temp.path().to_path_buf()],
            watch_enabled: true,
            debounce_ms: 300,
            ..DiscoveryConfig::default()
        })
        .unwrap();
        registry.initialize().await;

        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        registry.subscribe(move |e| {
            if let RegistryEvent::Updated(stats) = e {
                let _ = tx.send(stats.total_tools);
            }
        });

        for i in 0..5 {
            write(temp.path(), &format!("mcp-burst{i}.ts"), LP_MODULE);
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        }

        let first = tokio::time::timeout(std::time::Duration::from_secs(10), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert!(first > 0);

        // Nothing else arrives once the burst has been absorbed.
        let extra = tokio::time::timeout(std::time::Duration::from_millis(800), rx.recv()).await;
        assert!(extra.is_err());
        assert_eq!(registry.get_stats().total_modules, 5);
        registry.stop_watching();
    }

    #[tokio::test]
    async fn test_stop_watching_during_refresh_stays_consistent() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "mcp-opensvm.ts", SOLANA_MODULE);
        let registry = ToolRegistry::new(DiscoveryConfig {
            source_dirs: vec![temp.path().to_path_buf()],
            watch_enabled: true,
            debounce_ms: 20,
            ..DiscoveryConfig::default()
        })
        .unwrap();
        registry.initialize().await;

        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        registry.subscribe(move |e| {
            let _ = tx.send(e.name());
        });

        write(temp.path(), "mcp-liquidity.ts", LP_MODULE);
        // Wait for the watcher-triggered pass to begin emitting, then stop.
        let first = tokio::time::timeout(std::time::Duration::from_secs(10), rx.recv())
            .await
            .unwrap();
        assert!(first.is_some());
        registry.stop_watching();
        assert!(!registry.is_watching());

        // Drain whatever the interrupted pass already emitted.
        while tokio::time::timeout(std::time::Duration::from_millis(300), rx.recv())
            .await
            .is_ok_and(|e| e.is_some())
        {}

        let stats = registry.get_stats();
        assert_eq!(stats.total_tools, registry.get_all_tools().len());
        assert_eq!(stats.total_modules, registry.get_all_modules().len());
        assert_eq!(stats.by_namespace.values().sum::<usize>(), stats.total_tools);

        write(temp.path(), "mcp-late.ts", LP_MODULE);
        let late = tokio::time::timeout(std::time::Duration::from_millis(500), rx.recv()).await;
        assert!(late.is_err());
        assert!(registry.get_module(&temp.path().join("mcp-late.ts")).is_none());
    }

    #[tokio::test]
    async fn test_watch_picks_up_new_module() {
        let temp = TempDir::new().unwrap();
        let registry = ToolRegistry::new(DiscoveryConfig {
            source_dirs: vec![temp.path().to_path_buf()],
            watch_enabled: true,
            debounce_ms: 50,
            ..DiscoveryConfig::default()
        })
        .unwrap();
        registry.initialize().await;
        assert!(registry.is_watching());

        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        registry.subscribe(move |e| {
            if let RegistryEvent::Updated(stats) = e {
                let _ = tx.send(stats.total_tools);
            }
        });

        write(temp.path(), "mcp-liquidity.ts", LP_MODULE);

        let found = tokio::time::timeout(std::time::Duration::from_secs(10), async {
            while let Some(total) = rx.recv().await {
                if total > 0 {
                    return true;
                }
            }
            false
        })
        .await
        .unwrap_or(false);

        assert!(found);
        assert!(registry.get_tool("lp:stake").is_some());
        registry.stop_watching();
    }
}
