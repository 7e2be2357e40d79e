//! MCP server: JSON-RPC 2.0 over stdio.
//!
//! One request per line on stdin, one response per line on stdout. Tools map
//! onto the library operations: `scan_components` runs a project scan,
//! `validate_component` checks one usage in one file and
//! `get_compliance_report` scans and summarizes. Every call resolves
//! configuration from the path it is given, like the CLI does.

use crate::config::{self, Effective, Overrides};
use crate::error::{Error, Result};
use crate::monitor::{run_scan, validate_component, ScanContext};
use crate::report::build_report;
use crate::source::{FileSource, FsSource};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

const PROTOCOL_VERSION: &str = "2024-11-05";

const PARSE_ERROR: i32 = -32700;
const METHOD_NOT_FOUND: i32 = -32601;
const INVALID_PARAMS: i32 = -32602;
const INTERNAL_ERROR: i32 = -32603;
const TOOL_FAILED: i32 = -32000;

#[derive(Debug, Deserialize)]
struct JsonRpcRequest {
    id: Option<Value>,
    method: String,
    params: Option<Value>,
}

#[derive(Debug, Serialize)]
struct JsonRpcResponse {
    jsonrpc: &'static str,
    id: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<JsonRpcError>,
}

#[derive(Debug, Serialize)]
struct JsonRpcError {
    code: i32,
    message: String,
}

impl JsonRpcError {
    fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl From<Error> for JsonRpcError {
    fn from(e: Error) -> Self {
        JsonRpcError::new(TOOL_FAILED, format!("Tool execution failed: {}", e))
    }
}

type RpcResult = std::result::Result<Value, JsonRpcError>;

#[derive(Debug, Serialize)]
struct Tool {
    name: &'static str,
    description: &'static str,
    #[serde(rename = "inputSchema")]
    input_schema: Value,
}

fn tools() -> Vec<Tool> {
    vec![
        Tool {
            name: "scan_components",
            description: "Scan project for VA component usage and compliance",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "path": { "type": "string", "description": "Project path to scan" },
                    "includeAccessibility": {
                        "type": "boolean",
                        "description": "Include accessibility validation",
                        "default": true
                    }
                },
                "required": ["path"]
            }),
        },
        Tool {
            name: "validate_component",
            description: "Validate a specific component against VA design system",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "componentPath": { "type": "string", "description": "Path to component file" },
                    "componentName": {
                        "type": "string",
                        "description": "Name of VA component to validate"
                    }
                },
                "required": ["componentPath", "componentName"]
            }),
        },
        Tool {
            name: "get_compliance_report",
            description: "Generate comprehensive compliance report",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "path": { "type": "string", "description": "Project path to analyze" },
                    "format": {
                        "type": "string",
                        "enum": ["json"],
                        "description": "Report format",
                        "default": "json"
                    }
                },
                "required": ["path"]
            }),
        },
    ]
}

fn str_arg<'v>(args: &'v Value, key: &str) -> std::result::Result<&'v str, JsonRpcError> {
    args.get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| JsonRpcError::new(INVALID_PARAMS, format!("Missing '{}' argument", key)))
}

/// Wrap a serializable value as MCP text content.
fn text_content(value: &impl Serialize) -> RpcResult {
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| JsonRpcError::new(INTERNAL_ERROR, e.to_string()))?;
    Ok(json!({ "content": [{ "type": "text", "text": text }] }))
}

pub struct McpServer {
    source: Box<dyn FileSource>,
    verbose: bool,
}

impl Default for McpServer {
    fn default() -> Self {
        Self::new()
    }
}

impl McpServer {
    pub fn new() -> Self {
        Self::with_source(Box::new(FsSource))
    }

    pub fn with_source(source: Box<dyn FileSource>) -> Self {
        Self {
            source,
            verbose: false,
        }
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Serve stdin until it closes.
    pub fn run(&self) -> Result<()> {
        let stdin = std::io::stdin();
        let mut stdout = std::io::stdout();
        let io_err = |source| Error::Io {
            path: PathBuf::from("<stdout>"),
            source,
        };
        info!("MCP server started");
        for line in BufReader::new(stdin.lock()).lines() {
            let line = match line {
                Ok(l) => l,
                Err(e) => {
                    warn!(error = %e, "unreadable request line");
                    continue;
                }
            };
            if let Some(reply) = self.handle_line(&line) {
                writeln!(stdout, "{}", reply).map_err(io_err)?;
                stdout.flush().map_err(io_err)?;
            }
        }
        info!("MCP server stopped");
        Ok(())
    }

    /// Response line for one request line; `None` for blank lines and
    /// notifications, which get no reply.
    pub fn handle_line(&self, line: &str) -> Option<String> {
        if line.trim().is_empty() {
            return None;
        }
        let response = match serde_json::from_str::<JsonRpcRequest>(line) {
            Ok(request) => {
                if request.id.is_none() && request.method.starts_with("notifications/") {
                    debug!(method = %request.method, "notification");
                    return None;
                }
                self.handle_request(request)
            }
            Err(e) => JsonRpcResponse {
                jsonrpc: "2.0",
                id: None,
                result: None,
                error: Some(JsonRpcError::new(PARSE_ERROR, format!("Parse error: {}", e))),
            },
        };
        Some(serde_json::to_string(&response).unwrap_or_else(|_| {
            r#"{"jsonrpc":"2.0","id":null,"error":{"code":-32603,"message":"Internal error"}}"#
                .to_string()
        }))
    }

    fn handle_request(&self, request: JsonRpcRequest) -> JsonRpcResponse {
        debug!(method = %request.method, "request");
        let result = match request.method.as_str() {
            "initialize" => Ok(self.handle_initialize()),
            "tools/list" => Ok(json!({ "tools": tools() })),
            "tools/call" => self.handle_tool_call(request.params.as_ref()),
            "ping" | "shutdown" => Ok(json!({})),
            other => Err(JsonRpcError::new(
                METHOD_NOT_FOUND,
                format!("Method not found: {}", other),
            )),
        };
        let (result, error) = match result {
            Ok(v) => (Some(v), None),
            Err(e) => (None, Some(e)),
        };
        JsonRpcResponse {
            jsonrpc: "2.0",
            id: request.id,
            result,
            error,
        }
    }

    fn handle_initialize(&self) -> Value {
        json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": { "tools": {} },
            "serverInfo": {
                "name": "va-monitor",
                "version": env!("CARGO_PKG_VERSION")
            }
        })
    }

    fn handle_tool_call(&self, params: Option<&Value>) -> RpcResult {
        let params = params.ok_or_else(|| JsonRpcError::new(INVALID_PARAMS, "Missing params"))?;
        let name = str_arg(params, "name")?;
        let args = params.get("arguments").cloned().unwrap_or_else(|| json!({}));
        match name {
            "scan_components" => self.tool_scan_components(&args),
            "validate_component" => self.tool_validate_component(&args),
            "get_compliance_report" => self.tool_get_compliance_report(&args),
            other => Err(JsonRpcError::new(
                INVALID_PARAMS,
                format!("Unknown tool: {}", other),
            )),
        }
    }

    fn context(&self, overrides: Overrides) -> Result<(Effective, ScanContext)> {
        let eff = config::resolve_effective(&Overrides {
            output: Some("json".to_string()),
            verbose: Some(self.verbose),
            ..overrides
        })?;
        let ctx = ScanContext::from_effective(&eff)?;
        Ok((eff, ctx))
    }

    fn tool_scan_components(&self, args: &Value) -> RpcResult {
        let path = str_arg(args, "path")?;
        let include = args
            .get("includeAccessibility")
            .and_then(Value::as_bool)
            .unwrap_or(true);
        let (eff, ctx) = self.context(Overrides {
            project: Some(PathBuf::from(path)),
            accessibility: Some(include),
            ..Default::default()
        })?;
        let result = run_scan(self.source.as_ref(), &eff.project, &ctx)?;
        text_content(&result)
    }

    fn tool_validate_component(&self, args: &Value) -> RpcResult {
        let file = Path::new(str_arg(args, "componentPath")?);
        let name = str_arg(args, "componentName")?;
        let (_, ctx) = self.context(Overrides {
            project: Some(config::file_project(file)),
            ..Default::default()
        })?;
        let usage = validate_component(self.source.as_ref(), file, name, &ctx)?;
        text_content(&usage)
    }

    fn tool_get_compliance_report(&self, args: &Value) -> RpcResult {
        let path = str_arg(args, "path")?;
        let format = args.get("format").and_then(Value::as_str).unwrap_or("json");
        if format != "json" {
            return Err(Error::UnsupportedFormat(format.to_string()).into());
        }
        let (eff, ctx) = self.context(Overrides {
            project: Some(PathBuf::from(path)),
            ..Default::default()
        })?;
        let result = run_scan(self.source.as_ref(), &eff.project, &ctx)?;
        text_content(&build_report(&result, &eff.thresholds))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::{tempdir, TempDir};

    fn project() -> TempDir {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join(".git")).unwrap();
        fs::create_dir(dir.path().join("src")).unwrap();
        fs::write(
            dir.path().join("src/Form.vue"),
            "<template>\n  <va-button />\n  <va-link href=\"/\" text=\"Home\" />\n</template>\n",
        )
        .unwrap();
        dir
    }

    fn call(server: &McpServer, request: Value) -> Value {
        let line = server.handle_line(&request.to_string()).unwrap();
        serde_json::from_str(&line).unwrap()
    }

    fn tool(server: &McpServer, name: &str, arguments: Value) -> Value {
        call(
            server,
            json!({
                "jsonrpc": "2.0",
                "id": 7,
                "method": "tools/call",
                "params": { "name": name, "arguments": arguments }
            }),
        )
    }

    /// Parse the JSON text payload of a successful tool call.
    fn payload(response: &Value) -> Value {
        let text = response["result"]["content"][0]["text"].as_str().unwrap();
        serde_json::from_str(text).unwrap()
    }

    #[test]
    fn test_initialize_and_list_tools() {
        let server = McpServer::new();
        let init = call(&server, json!({"jsonrpc": "2.0", "id": 1, "method": "initialize"}));
        assert_eq!(init["id"], 1);
        assert_eq!(init["result"]["serverInfo"]["name"], "va-monitor");
        assert_eq!(init["result"]["protocolVersion"], PROTOCOL_VERSION);

        let list = call(&server, json!({"jsonrpc": "2.0", "id": 2, "method": "tools/list"}));
        let names: Vec<_> = list["result"]["tools"]
            .as_array()
            .unwrap()
            .iter()
            .map(|t| t["name"].as_str().unwrap())
            .collect();
        assert_eq!(
            names,
            vec!["scan_components", "validate_component", "get_compliance_report"]
        );
        assert!(list["result"]["tools"][0]["inputSchema"]["properties"]["includeAccessibility"]
            .is_object());
    }

    #[test]
    fn test_scan_components_honors_include_accessibility() {
        let dir = project();
        let server = McpServer::new();
        let path = dir.path().to_string_lossy().to_string();

        let on = payload(&tool(&server, "scan_components", json!({ "path": path })));
        assert_eq!(on["summary"]["totalComponents"], 2);
        let button_rules: Vec<_> = on["components"][0]["issues"]
            .as_array()
            .unwrap()
            .iter()
            .map(|i| i["rule"].as_str().unwrap())
            .collect();
        assert!(button_rules.contains(&"missing-accessible-name"));

        let off = payload(&tool(
            &server,
            "scan_components",
            json!({ "path": path, "includeAccessibility": false }),
        ));
        let kinds: Vec<_> = off["components"]
            .as_array()
            .unwrap()
            .iter()
            .flat_map(|c| c["issues"].as_array().unwrap())
            .map(|i| i["type"].as_str().unwrap().to_string())
            .collect();
        assert!(kinds.iter().all(|k| k != "accessibility"));
    }

    #[test]
    fn test_validate_component_tool() {
        let dir = project();
        let server = McpServer::new();
        let file = dir.path().join("src/Form.vue").to_string_lossy().to_string();

        let found = tool(
            &server,
            "validate_component",
            json!({ "componentPath": file, "componentName": "VaLink" }),
        );
        let usage = payload(&found);
        assert_eq!(usage["componentName"], "va-link");
        assert_eq!(usage["lineNumber"], 3);

        let missing = tool(
            &server,
            "validate_component",
            json!({ "componentPath": file, "componentName": "va-modal" }),
        );
        assert_eq!(missing["id"], 7);
        assert_eq!(missing["error"]["code"], TOOL_FAILED);
        assert!(missing["error"]["message"].as_str().unwrap().contains("va-modal"));
    }

    #[test]
    fn test_compliance_report_tool() {
        let dir = project();
        let server = McpServer::new();
        let path = dir.path().to_string_lossy().to_string();

        let report = payload(&tool(&server, "get_compliance_report", json!({ "path": path })));
        assert_eq!(report["overview"]["totalComponents"], 2);
        assert_eq!(report["overview"]["totalFiles"], 1);

        let html = tool(
            &server,
            "get_compliance_report",
            json!({ "path": path, "format": "html" }),
        );
        assert_eq!(html["error"]["code"], TOOL_FAILED);
    }

    #[test]
    fn test_protocol_errors() {
        let server = McpServer::new();
        let bad = serde_json::from_str::<Value>(&server.handle_line("{not json").unwrap()).unwrap();
        assert_eq!(bad["error"]["code"], PARSE_ERROR);

        let unknown = call(&server, json!({"jsonrpc": "2.0", "id": 3, "method": "resources/list"}));
        assert_eq!(unknown["error"]["code"], METHOD_NOT_FOUND);

        let no_path = tool(&server, "scan_components", json!({}));
        assert_eq!(no_path["error"]["code"], INVALID_PARAMS);

        let no_tool = tool(&server, "format_disk", json!({}));
        assert_eq!(no_tool["error"]["code"], INVALID_PARAMS);

        assert!(server
            .handle_line(r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#)
            .is_none());
        assert!(server.handle_line("   ").is_none());
    }
}
