//! Namespace Extractor - derives the short prefix for a module's tools.
//!
//! The declared server name wins when it contains a well-known service
//! substring; otherwise the namespace comes from the file name.

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

/// Well-known service-name substrings and their canonical namespaces.
/// Checked in order; the first hit wins.
const KNOWN_SERVICES: &[(&str, &str)] = &[
    ("liquidity-mining", "lp"),
    ("governance", "governance"),
    ("opensvm", "solana"),
];

/// Conventional module file-name prefixes.
const MODULE_PREFIXES: &[&str] = &["mcp-", "mcp_"];

/// Entry-point stems that say nothing about the module; the parent
/// directory name is used instead.
const GENERIC_STEMS: &[&str] = &["index", "server", "main", "mod"];

const FALLBACK_NAMESPACE: &str = "default";

/// `new Server({ name: "..." })`, `new McpServer({ name: '...' })`, or a
/// `serverName`/`SERVER_NAME` constant.
static SERVER_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?s)new\s+(?:Mcp)?Server\s*\(\s*\{[^}]*?\bname\s*:\s*['"`]([^'"`]+)['"`]|\b(?:serverName|SERVER_NAME)\s*[:=]\s*['"`]([^'"`]+)['"`]"#,
    )
    .expect("server name pattern is valid")
});

/// Derive the namespace for a module. Pure and deterministic.
pub fn extract_namespace(path: &Path, content: &str) -> String {
    if let Some(ns) = declared_server_name(content).and_then(|name| known_service(&name)) {
        return ns.to_string();
    }

    let stem = module_stem(path);
    if let Some(ns) = known_service(&stem) {
        return ns.to_string();
    }

    sanitize(&stem)
}

/// The explicit service name declared in the module, if any.
pub fn declared_server_name(content: &str) -> Option<String> {
    let caps = SERVER_NAME.captures(content)?;
    caps.get(1)
        .or_else(|| caps.get(2))
        .map(|m| m.as_str().trim().to_string())
        .filter(|name| !name.is_empty())
}

fn known_service(name: &str) -> Option<&'static str> {
    let name = name.to_lowercase();
    KNOWN_SERVICES
        .iter()
        .find(|(needle, _)| name.contains(needle))
        .map(|(_, ns)| *ns)
}

/// File stem with the module prefix and every extension removed.
fn module_stem(path: &Path) -> String {
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default();
    let mut stem = strip_extensions(file_name);

    if GENERIC_STEMS.contains(&stem.to_lowercase().as_str()) {
        if let Some(dir) = path
            .parent()
            .and_then(|p| p.file_name())
            .and_then(|n| n.to_str())
        {
            stem = dir;
        }
    }

    strip_prefix(stem).to_lowercase()
}

fn strip_extensions(file_name: &str) -> &str {
    // A leading dot is part of the name, not an extension.
    match file_name.get(1..).and_then(|rest| rest.find('.')) {
        Some(idx) => &file_name[..idx + 1],
        None => file_name,
    }
}

fn strip_prefix(stem: &str) -> &str {
    MODULE_PREFIXES
        .iter()
        .find_map(|prefix| {
            stem.get(..prefix.len())
                .filter(|head| head.eq_ignore_ascii_case(prefix))
                .map(|_| &stem[prefix.len()..])
        })
        .unwrap_or(stem)
}

/// Keep `[a-z0-9_-]`, map everything else to `-`.
fn sanitize(stem: &str) -> String {
    let cleaned: String = stem
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c.to_ascii_lowercase()
            } else {
                '-'
            }
        })
        .collect();

    let cleaned = cleaned.trim_matches('-');
    if cleaned.is_empty() {
        FALLBACK_NAMESPACE.to_string()
    } else {
        cleaned.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn ns(path: &str, content: &str) -> String {
        extract_namespace(&PathBuf::from(path), content)
    }

    #[test]
    fn test_server_name_lookup() {
        let lp = r#"const server = new Server({ name: "liquidity-mining-mcp", version: "1.0.0" });"#;
        assert_eq!(ns("/src/mcp-whatever.ts", lp), "lp");

        let gov = "const server = new McpServer({\n  name: 'governance-timelock-mcp',\n  version: '0.1.0'\n});";
        assert_eq!(ns("/src/mcp-whatever.ts", gov), "governance");

        let svm = r#"new Server({ name: `opensvm-mcp` }, { capabilities: {} })"#;
        assert_eq!(ns("/src/mcp-whatever.ts", svm), "solana");
    }

    #[test]
    fn test_file_name_fallback() {
        assert_eq!(ns("/repo/api/mcp-kalshi.ts", ""), "kalshi");
        assert_eq!(ns("/repo/api/mcp_Polymarket.js", ""), "polymarket");
        assert_eq!(ns("/repo/api/mcp-opensvm-extra.ts", ""), "solana");
    }

    #[test]
    fn test_unknown_server_name_falls_back_to_file_name() {
        let content = r#"new Server({ name: "weather-mcp" })"#;
        assert_eq!(ns("/repo/mcp-weather.ts", content), "weather");
    }

    #[test]
    fn test_server_name_constant() {
        let content = r#"export const SERVER_NAME = "opensvm-mcp";"#;
        assert_eq!(ns("/repo/mcp-x.ts", content), "solana");
    }

    #[test]
    fn test_generic_stem_uses_directory() {
        assert_eq!(ns("/repo/mcp-dflow/index.ts", ""), "dflow");
    }

    #[test]
    fn test_multiple_extensions_stripped() {
        assert_eq!(ns("/repo/mcp-jupiter.server.mjs", ""), "jupiter");
    }

    #[test]
    fn test_output_has_no_colon_or_whitespace() {
        let out = ns("/repo/mcp-odd name:thing.ts", "");
        assert!(!out.is_empty());
        assert!(!out.contains(':'));
        assert!(!out.chars().any(char::is_whitespace));
        assert_eq!(out, "odd-name-thing");
    }

    #[test]
    fn test_empty_stem_gets_fallback() {
        assert_eq!(ns("/repo/mcp-.ts", ""), "default");
    }

    #[test]
    fn test_deterministic() {
        let content = r#"new Server({ name: "governance-mcp" })"#;
        let a = ns("/repo/mcp-a.ts", content);
        let b = ns("/repo/mcp-a.ts", content);
        assert_eq!(a, b);
    }
}
