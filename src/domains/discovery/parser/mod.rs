//! Content Parser - extracts tool, prompt and resource declarations from
//! module text without evaluating it.
//!
//! A declaration is a conventionally named array literal (`TOOLS = [...]`,
//! `const tools: Tool[] = [...]`, `{ tools: [...] }`, and likewise for
//! prompts and resources). The first such array holding at least one usable
//! descriptor wins. Every function here returns an empty `Vec` on mismatch.

mod literal;

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Value};

use super::types::{
    DiscoveredPrompt, DiscoveredResource, DiscoveredTool, PromptArgumentInfo, empty_input_schema,
};
use literal::LiteralReader;

/// Swappable parsing strategy used by the registry.
pub trait ContentParser: Send + Sync {
    fn parse_tools(
        &self,
        content: &str,
        namespace: &str,
        source_module: &Path,
    ) -> Vec<DiscoveredTool>;

    fn parse_prompts(&self, content: &str, source_module: &Path) -> Vec<DiscoveredPrompt>;

    fn parse_resources(&self, content: &str, source_module: &Path) -> Vec<DiscoveredResource>;
}

/// Pattern-based parser over conventional array declarations.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeclarationParser;

impl ContentParser for DeclarationParser {
    fn parse_tools(
        &self,
        content: &str,
        namespace: &str,
        source_module: &Path,
    ) -> Vec<DiscoveredTool> {
        parse_tools(content, namespace, source_module)
    }

    fn parse_prompts(&self, content: &str, source_module: &Path) -> Vec<DiscoveredPrompt> {
        parse_prompts(content, source_module)
    }

    fn parse_resources(&self, content: &str, source_module: &Path) -> Vec<DiscoveredResource> {
        parse_resources(content, source_module)
    }
}

fn declaration_pattern(ident: &str) -> Regex {
    // `ident = [`, `ident: [`, or `ident: Type[] = [`, optionally prefixed
    // as in `SOLANA_TOOLS`.
    let pattern = format!(r"(?i)\b(?:\w*_)?{ident}\b\s*(?::\s*[\w.<>]+(?:\[\])*\s*=|[:=])\s*\[");
    Regex::new(&pattern).expect("declaration pattern is valid")
}

static TOOLS_DECL: LazyLock<Regex> = LazyLock::new(|| declaration_pattern("tools"));
static PROMPTS_DECL: LazyLock<Regex> = LazyLock::new(|| declaration_pattern("prompts"));
static RESOURCES_DECL: LazyLock<Regex> = LazyLock::new(|| declaration_pattern("resources"));

/// Find the first matching declaration whose descriptors convert to at least
/// one item.
fn first_declaration<T>(
    content: &str,
    pattern: &Regex,
    convert: impl Fn(&Map<String, Value>) -> Option<T>,
) -> Vec<T> {
    for m in pattern.find_iter(content) {
        // The match always ends on the opening bracket.
        let open = m.end() - 1;
        let Some(items) = LiteralReader::new(content, open).parse_array() else {
            continue;
        };

        let found: Vec<T> = items
            .iter()
            .filter_map(Value::as_object)
            .filter_map(&convert)
            .collect();
        if !found.is_empty() {
            return found;
        }
    }
    Vec::new()
}

fn str_field<'a>(obj: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a str> {
    keys.iter().find_map(|k| obj.get(*k).and_then(Value::as_str))
}

fn required_str(obj: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    str_field(obj, keys)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn optional_str(obj: &Map<String, Value>, keys: &[&str]) -> String {
    str_field(obj, keys).unwrap_or_default().to_string()
}

/// Extract the tools declaration, qualifying each name with `namespace`.
pub fn parse_tools(content: &str, namespace: &str, source_module: &Path) -> Vec<DiscoveredTool> {
    first_declaration(content, &TOOLS_DECL, |obj| {
        let original_name = required_str(obj, &["name"])?;
        let input_schema = ["inputSchema", "input_schema"]
            .iter()
            .find_map(|k| obj.get(*k).filter(|v| v.is_object()))
            .cloned()
            .unwrap_or_else(empty_input_schema);

        Some(DiscoveredTool::new(
            namespace,
            original_name,
            optional_str(obj, &["description"]),
            input_schema,
            source_module,
        ))
    })
}

/// Extract the prompts declaration. Prompt names are not namespaced.
pub fn parse_prompts(content: &str, source_module: &Path) -> Vec<DiscoveredPrompt> {
    first_declaration(content, &PROMPTS_DECL, |obj| {
        let arguments = obj.get("arguments").and_then(Value::as_array).map(|args| {
            args.iter()
                .filter_map(Value::as_object)
                .filter_map(|arg| {
                    Some(PromptArgumentInfo {
                        name: required_str(arg, &["name"])?,
                        description: optional_str(arg, &["description"]),
                        required: arg.get("required").and_then(Value::as_bool).unwrap_or(false),
                    })
                })
                .collect()
        });

        Some(DiscoveredPrompt {
            name: required_str(obj, &["name"])?,
            description: optional_str(obj, &["description"]),
            arguments,
            source_module: source_module.to_path_buf(),
        })
    })
}

/// Extract the resources declaration.
pub fn parse_resources(content: &str, source_module: &Path) -> Vec<DiscoveredResource> {
    first_declaration(content, &RESOURCES_DECL, |obj| {
        Some(DiscoveredResource {
            uri: required_str(obj, &["uri"])?,
            name: optional_str(obj, &["name"]),
            description: optional_str(obj, &["description"]),
            mime_type: optional_str(obj, &["mimeType", "mime_type"]),
            source_module: source_module.to_path_buf(),
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::path::PathBuf;

    fn module() -> PathBuf {
        PathBuf::from("/repo/api/mcp-solana.ts")
    }

    const TOOLS_MODULE: &str = r#"
import { Server } from '@modelcontextprotocol/sdk/server/index.js';

const TOOLS = [
  {
    name: 'get_transaction',
    description: 'Fetch a transaction {by signature}',
    inputSchema: {
      type: 'object',
      properties: {
        signature: { type: 'string', description: 'Base58 signature' },
      },
      required: ['signature'],
    },
  },
  {
    name: "get_account",
    description: "Fetch account info",
  },
];

server.setRequestHandler(ListToolsRequestSchema, async () => ({ tools: TOOLS }));
"#;

    #[test]
    fn test_parse_two_tools() {
        let tools = parse_tools(TOOLS_MODULE, "solana", &module());
        assert_eq!(tools.len(), 2);

        for tool in &tools {
            assert!(tool.name.starts_with("solana:"));
            assert!(!tool.original_name.is_empty());
            assert!(tool.input_schema.is_object());
            assert_eq!(tool.source_module, module());
        }

        assert_eq!(tools[0].name, "solana:get_transaction");
        assert_eq!(tools[0].description, "Fetch a transaction {by signature}");
        assert_eq!(tools[0].input_schema["required"], json!(["signature"]));
        assert_eq!(tools[1].input_schema, empty_input_schema());
    }

    #[test]
    fn test_no_declaration_yields_empty() {
        let content = "export function helper() { return 42; }";
        assert!(parse_tools(content, "x", &module()).is_empty());
        assert!(parse_prompts(content, &module()).is_empty());
        assert!(parse_resources(content, &module()).is_empty());
    }

    #[test]
    fn test_typed_declaration_and_snake_case() {
        let content = r#"
export const tools: Tool[] = [
  { name: "stake", description: "Stake LP tokens", input_schema: { type: "object" } },
];"#;
        let tools = parse_tools(content, "lp", &module());
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0].name, "lp:stake");
        assert_eq!(tools[0].input_schema, json!({ "type": "object" }));
    }

    #[test]
    fn test_prefixed_declaration_names() {
        let content = r#"
const SOLANA_TOOLS = [{ name: "get_balance" }];
const wallet_prompts = [{ name: "summarize_wallet" }];
const devtools = [{ name: "not_a_tool_list" }];
"#;
        let tools = parse_tools(content, "solana", &module());
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0].name, "solana:get_balance");
        assert_eq!(parse_prompts(content, &module())[0].name, "summarize_wallet");
    }

    #[test]
    fn test_empty_declaration_falls_through_to_next() {
        let content = r#"
const capabilities = { tools: [] };
const TOOLS = [{ name: "ping" }];
"#;
        let tools = parse_tools(content, "net", &module());
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0].original_name, "ping");
        assert_eq!(tools[0].description, "");
    }

    #[test]
    fn test_nameless_descriptors_skipped() {
        let content = r#"const TOOLS = [{ description: "no name" }, { name: "  " }, { name: "ok" }];"#;
        let tools = parse_tools(content, "ns", &module());
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0].name, "ns:ok");
    }

    #[test]
    fn test_parse_two_prompts() {
        let content = r#"
const PROMPTS = [
  {
    name: 'analyze_wallet',
    description: 'Analyze a wallet',
    arguments: [
      { name: 'address', description: 'Wallet address', required: true },
      { name: 'depth' },
    ],
  },
  { name: 'summarize_block', description: 'Summarize a block' },
];"#;
        let prompts = parse_prompts(content, &module());
        assert_eq!(prompts.len(), 2);
        assert_eq!(prompts[0].name, "analyze_wallet");
        assert_eq!(prompts[0].description, "Analyze a wallet");
        assert_eq!(prompts[1].name, "summarize_block");
        assert_eq!(prompts[1].description, "Summarize a block");
        assert!(prompts[1].arguments.is_none());

        let args = prompts[0].arguments.as_ref().unwrap();
        assert_eq!(args.len(), 2);
        assert!(args[0].required);
        assert!(!args[1].required);
        assert_eq!(args[1].description, "");
    }

    #[test]
    fn test_parse_one_resource() {
        let content = r#"
const RESOURCES = [
  {
    uri: 'solana://network/status',
    name: 'Network Status',
    description: 'Current cluster status',
    mimeType: 'application/json',
  },
];"#;
        let resources = parse_resources(content, &module());
        assert_eq!(resources.len(), 1);
        assert_eq!(resources[0].uri, "solana://network/status");
        assert_eq!(resources[0].name, "Network Status");
        assert_eq!(resources[0].description, "Current cluster status");
        assert_eq!(resources[0].mime_type, "application/json");
        assert_eq!(resources[0].source_module, module());
    }

    #[test]
    fn test_irregular_formatting() {
        let content = "const   TOOLS=[\n\n{name:'a',description:\"has } and ] inside\",},\n\t{ name : 'b' , } ,\n]\nthis is ( not valid { code";
        let tools = parse_tools(content, "x", &module());
        let names: Vec<_> = tools.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["x:a", "x:b"]);
        assert_eq!(tools[0].description, "has } and ] inside");
    }

    #[test]
    fn test_unterminated_declaration_yields_empty() {
        let content = "const TOOLS = [{ name: 'a' },";
        assert!(parse_tools(content, "x", &module()).is_empty());
    }

    #[test]
    fn test_parser_trait_delegates() {
        let parser = DeclarationParser;
        assert_eq!(parser.parse_tools(TOOLS_MODULE, "solana", &module()).len(), 2);
    }
}
