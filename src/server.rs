//! MCP server implementation.
//!
//! Handles JSON-RPC 2.0 over stdio according to the MCP protocol specification.
//! One request is read, dispatched and answered before the next is read.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{json, Value as JsonValue};
use std::io::{BufRead, Write};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, info};

use crate::envelope::Envelope;
use crate::error::{rpc_codes, McpError, Result};
use crate::registry::{Dispatcher, Namespace};

/// MCP protocol version we support.
const PROTOCOL_VERSION: &str = "2024-11-05";

/// MIME type of every resource body.
const RESOURCE_MIME_TYPE: &str = "application/json";

/// JSON-RPC 2.0 request.
#[derive(Debug, Deserialize)]
pub struct JsonRpcRequest {
    /// Protocol version, must be "2.0"
    pub jsonrpc: String,
    /// Request id; `None` only when the member is absent (a notification).
    /// An explicit `"id": null` is `Some(Null)` and still gets a reply.
    #[serde(default, deserialize_with = "present")]
    pub id: Option<JsonValue>,
    /// Method name
    pub method: String,
    /// Method parameters
    #[serde(default)]
    pub params: Option<JsonValue>,
}

/// Keeps a present-but-null member as `Some(Null)`.
fn present<'de, D>(deserializer: D) -> std::result::Result<Option<JsonValue>, D::Error>
where
    D: Deserializer<'de>,
{
    JsonValue::deserialize(deserializer).map(Some)
}

/// JSON-RPC 2.0 response.
#[derive(Debug, Serialize)]
pub struct JsonRpcResponse {
    /// Protocol version, always "2.0"
    pub jsonrpc: String,
    /// Id of the request being answered
    pub id: JsonValue,
    /// Result on success
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<JsonValue>,
    /// Error on failure
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

/// JSON-RPC 2.0 error object.
#[derive(Debug, Serialize)]
pub struct JsonRpcError {
    /// Error code
    pub code: i32,
    /// Error message
    pub message: String,
    /// Additional detail; the failure envelope for operation errors
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<JsonValue>,
}

impl JsonRpcResponse {
    /// Create a success response.
    pub fn success(id: JsonValue, result: JsonValue) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    /// Create an error response.
    pub fn error(id: JsonValue, code: i32, message: String) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: None,
            error: Some(JsonRpcError {
                code,
                message,
                data: None,
            }),
        }
    }

    /// Create an error response from an McpError.
    pub fn from_error(id: JsonValue, err: McpError) -> Self {
        Self::error(id, err.rpc_code(), err.to_string())
    }

    /// Error response carrying a failure envelope as `data`.
    fn from_envelope(id: JsonValue, envelope: &Envelope) -> Self {
        let code = envelope
            .kind()
            .map_or(rpc_codes::INTERNAL_ERROR, |kind| kind.rpc_code());
        let message = envelope.error().unwrap_or("operation failed").to_string();
        let mut response = Self::error(id, code, message);
        if let Some(error) = response.error.as_mut() {
            error.data = Some(envelope.to_json());
        }
        response
    }
}

/// MCP server.
pub struct McpServer {
    dispatcher: Dispatcher,
    initialized: bool,
}

impl McpServer {
    /// Create a new MCP server over the given dispatcher.
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self {
            dispatcher,
            initialized: false,
        }
    }

    /// Whether the client has completed the initialize handshake.
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// The dispatcher requests are routed to.
    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Run the server, reading from stdin and writing to stdout.
    pub async fn run(&mut self) -> Result<()> {
        self.serve_async(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
            .await
    }

    /// Run the server synchronously (for non-tokio environments).
    pub fn run_sync(&mut self) -> Result<()> {
        let stdin = std::io::stdin();
        let stdout = std::io::stdout();
        self.serve(stdin.lock(), stdout.lock())
    }

    /// Serve newline-delimited requests from `reader` until EOF.
    pub fn serve<R: BufRead, W: Write>(&mut self, mut reader: R, mut writer: W) -> Result<()> {
        let mut buf = Vec::new();

        loop {
            buf.clear();
            let bytes_read = reader.read_until(b'\n', &mut buf)?;

            if bytes_read == 0 {
                // EOF - client disconnected
                break;
            }

            if let Some(response) = self.handle_bytes(&buf) {
                let response_json = serde_json::to_string(&response)?;
                writeln!(writer, "{}", response_json)?;
                writer.flush()?;
            }
        }

        info!("client disconnected");
        Ok(())
    }

    /// Async counterpart of [`McpServer::serve`].
    pub async fn serve_async<R, W>(&mut self, mut reader: R, mut writer: W) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut buf = Vec::new();

        loop {
            buf.clear();
            if reader.read_until(b'\n', &mut buf).await? == 0 {
                break;
            }

            if let Some(response) = self.handle_bytes(&buf) {
                let response_json = serde_json::to_string(&response)?;
                writer.write_all(response_json.as_bytes()).await?;
                writer.write_all(b"\n").await?;
                writer.flush().await?;
            }
        }

        info!("client disconnected");
        Ok(())
    }

    /// Handle one raw input line, which may not be valid UTF-8.
    fn handle_bytes(&mut self, bytes: &[u8]) -> Option<JsonRpcResponse> {
        match std::str::from_utf8(bytes) {
            Ok(line) => self.handle_line(line),
            Err(e) => Some(JsonRpcResponse::error(
                JsonValue::Null,
                rpc_codes::PARSE_ERROR,
                format!("Parse error: {}", e),
            )),
        }
    }

    /// Handle one raw line. Returns `None` for blank lines and notifications.
    pub fn handle_line(&mut self, line: &str) -> Option<JsonRpcResponse> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }

        let value: JsonValue = match serde_json::from_str(line) {
            Ok(value) => value,
            Err(e) => {
                return Some(JsonRpcResponse::error(
                    JsonValue::Null,
                    rpc_codes::PARSE_ERROR,
                    format!("Parse error: {}", e),
                ))
            }
        };

        let id = value.get("id").cloned();
        match serde_json::from_value::<JsonRpcRequest>(value) {
            Ok(request) => self.handle_request(request),
            Err(e) => Some(JsonRpcResponse::error(
                id.unwrap_or(JsonValue::Null),
                rpc_codes::INVALID_REQUEST,
                format!("Invalid request: {}", e),
            )),
        }
    }

    /// Handle a single JSON-RPC request. Notifications get no response.
    pub fn handle_request(&mut self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        debug!(method = %request.method, "request");

        let Some(id) = request.id.clone() else {
            self.handle_notification(&request);
            return None;
        };

        // Validate JSON-RPC version
        if request.jsonrpc != "2.0" {
            return Some(JsonRpcResponse::error(
                id,
                rpc_codes::INVALID_REQUEST,
                "Invalid JSON-RPC version".to_string(),
            ));
        }

        let params = request.params.unwrap_or(JsonValue::Null);

        // Route to appropriate handler
        let response = match request.method.as_str() {
            "initialize" => self.handle_initialize(id),
            "initialized" | "notifications/initialized" => {
                self.initialized = true;
                JsonRpcResponse::success(id, json!({}))
            }
            "ping" => JsonRpcResponse::success(id, json!({})),
            "tools/list" => self.handle_tools_list(id),
            "tools/call" => self.handle_tools_call(id, params),
            "resources/list" => self.handle_resources_list(id),
            "resources/templates/list" => self.handle_resource_templates_list(id),
            "resources/read" => self.handle_resources_read(id, params),
            "prompts/list" => self.handle_prompts_list(id),
            "prompts/get" => self.handle_prompts_get(id, params),
            _ => JsonRpcResponse::error(
                id,
                rpc_codes::METHOD_NOT_FOUND,
                format!("Unknown method: {}", request.method),
            ),
        };
        Some(response)
    }

    fn handle_notification(&mut self, request: &JsonRpcRequest) {
        match request.method.as_str() {
            "notifications/initialized" | "initialized" => {
                self.initialized = true;
                info!("client initialized");
            }
            other => debug!(method = other, "ignoring notification"),
        }
    }

    /// Handle the initialize request.
    fn handle_initialize(&mut self, id: JsonValue) -> JsonRpcResponse {
        let config = self.dispatcher.session().config();
        info!(server = %config.server_name, "initialize");

        JsonRpcResponse::success(
            id,
            json!({
                "protocolVersion": PROTOCOL_VERSION,
                "capabilities": {
                    "tools": {},
                    "resources": {},
                    "prompts": {}
                },
                "serverInfo": {
                    "name": config.server_name,
                    "version": config.server_version
                }
            }),
        )
    }

    /// Handle the tools/list request.
    fn handle_tools_list(&self, id: JsonValue) -> JsonRpcResponse {
        let tools: Vec<JsonValue> = self
            .dispatcher
            .registry()
            .tools()
            .iter()
            .map(|t| {
                json!({
                    "name": t.name(),
                    "description": t.description(),
                    "inputSchema": crate::registry::input_schema(t.params())
                })
            })
            .collect();

        JsonRpcResponse::success(id, json!({ "tools": tools }))
    }

    /// Handle the tools/call request.
    ///
    /// Operation failures are results with `isError` set, not protocol errors.
    fn handle_tools_call(&self, id: JsonValue, params: JsonValue) -> JsonRpcResponse {
        let (name, arguments) = match named_call(&params) {
            Ok(call) => call,
            Err(err) => return JsonRpcResponse::from_error(id, err),
        };

        let envelope = self.dispatcher.invoke(Namespace::Tool, &name, arguments);

        // MCP tool responses are wrapped in content array
        JsonRpcResponse::success(
            id,
            json!({
                "content": [{
                    "type": "text",
                    "text": envelope.to_wire()
                }],
                "isError": !envelope.is_success()
            }),
        )
    }

    fn handle_resources_list(&self, id: JsonValue) -> JsonRpcResponse {
        let resources: Vec<JsonValue> = self
            .dispatcher
            .registry()
            .resources()
            .filter(|(template, _)| template.is_concrete())
            .map(|(template, op)| {
                json!({
                    "uri": template.as_str(),
                    "name": template.as_str(),
                    "description": op.description(),
                    "mimeType": RESOURCE_MIME_TYPE
                })
            })
            .collect();

        JsonRpcResponse::success(id, json!({ "resources": resources }))
    }

    fn handle_resource_templates_list(&self, id: JsonValue) -> JsonRpcResponse {
        let templates: Vec<JsonValue> = self
            .dispatcher
            .registry()
            .resources()
            .filter(|(template, _)| !template.is_concrete())
            .map(|(template, op)| {
                json!({
                    "uriTemplate": template.as_str(),
                    "name": template.as_str(),
                    "description": op.description(),
                    "mimeType": RESOURCE_MIME_TYPE
                })
            })
            .collect();

        JsonRpcResponse::success(id, json!({ "resourceTemplates": templates }))
    }

    fn handle_resources_read(&self, id: JsonValue, params: JsonValue) -> JsonRpcResponse {
        let Some(uri) = params.get("uri").and_then(|v| v.as_str()) else {
            return JsonRpcResponse::error(
                id,
                rpc_codes::INVALID_PARAMS,
                "Missing 'uri' in params".to_string(),
            );
        };

        let envelope = self
            .dispatcher
            .invoke(Namespace::Resource, uri, JsonValue::Null);
        if !envelope.is_success() {
            return JsonRpcResponse::from_envelope(id, &envelope);
        }

        JsonRpcResponse::success(
            id,
            json!({
                "contents": [{
                    "uri": uri,
                    "mimeType": RESOURCE_MIME_TYPE,
                    "text": envelope.to_wire()
                }]
            }),
        )
    }

    fn handle_prompts_list(&self, id: JsonValue) -> JsonRpcResponse {
        let prompts: Vec<JsonValue> = self
            .dispatcher
            .registry()
            .prompts()
            .iter()
            .map(|p| {
                let arguments: Vec<JsonValue> = p
                    .params()
                    .iter()
                    .map(|param| {
                        json!({
                            "name": param.name,
                            "description": param.description,
                            "required": param.required
                        })
                    })
                    .collect();
                json!({
                    "name": p.name(),
                    "description": p.description(),
                    "arguments": arguments
                })
            })
            .collect();

        JsonRpcResponse::success(id, json!({ "prompts": prompts }))
    }

    fn handle_prompts_get(&self, id: JsonValue, params: JsonValue) -> JsonRpcResponse {
        let (name, arguments) = match named_call(&params) {
            Ok(call) => call,
            Err(err) => return JsonRpcResponse::from_error(id, err),
        };

        let envelope = self.dispatcher.invoke(Namespace::Prompt, &name, arguments);
        if !envelope.is_success() {
            return JsonRpcResponse::from_envelope(id, &envelope);
        }

        let text = envelope.get("text").cloned().unwrap_or(JsonValue::Null);
        JsonRpcResponse::success(
            id,
            json!({
                "description": envelope.get("description").cloned().unwrap_or(JsonValue::Null),
                "messages": [{
                    "role": "user",
                    "content": { "type": "text", "text": text }
                }]
            }),
        )
    }
}

/// Extract `name` and `arguments` from call params.
fn named_call(params: &JsonValue) -> Result<(String, JsonValue)> {
    let JsonValue::Object(obj) = params else {
        return Err(McpError::InvalidArg {
            name: "params".to_string(),
            reason: "missing params object".to_string(),
        });
    };

    let name = obj
        .get("name")
        .and_then(|v| v.as_str())
        .ok_or_else(|| McpError::MissingArg("name".to_string()))?;

    let arguments = obj.get("arguments").cloned().unwrap_or(JsonValue::Null);
    Ok((name.to_string(), arguments))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::session::Session;

    fn test_server() -> (tempfile::TempDir, McpServer) {
        let dir = tempfile::tempdir().unwrap();
        let session = Session::open(Config::new(dir.path().join("app.db"))).unwrap();
        let server = McpServer::new(Dispatcher::new(session).unwrap());
        (dir, server)
    }

    fn call(server: &mut McpServer, line: &str) -> JsonValue {
        let response = server.handle_line(line).expect("expected a response");
        serde_json::to_value(&response).unwrap()
    }

    #[test]
    fn test_json_rpc_response_success() {
        let response = JsonRpcResponse::success(JsonValue::Number(1.into()), json!({"ok": true}));
        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"result\""));
        assert!(!json.contains("\"error\""));
    }

    #[test]
    fn test_json_rpc_response_error() {
        let response = JsonRpcResponse::error(JsonValue::Number(1.into()), -32600, "Invalid".to_string());
        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"error\""));
        assert!(!json.contains("\"result\""));
        assert!(!json.contains("\"data\""));
    }

    #[test]
    fn test_initialize_advertises_capabilities() {
        let (_dir, mut server) = test_server();
        let resp = call(&mut server, r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{}}"#);
        let caps = &resp["result"]["capabilities"];
        assert!(caps.get("tools").is_some());
        assert!(caps.get("resources").is_some());
        assert!(caps.get("prompts").is_some());
        assert_eq!(resp["result"]["serverInfo"]["name"], "workbench-mcp");
    }

    #[test]
    fn test_notifications_get_no_response() {
        let (_dir, mut server) = test_server();
        assert!(!server.is_initialized());
        let response =
            server.handle_line(r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#);
        assert!(response.is_none());
        assert!(server.is_initialized());
        assert!(server.handle_line("   ").is_none());
    }

    #[test]
    fn test_null_id_is_a_request() {
        let (_dir, mut server) = test_server();
        let resp = call(&mut server, r#"{"jsonrpc":"2.0","id":null,"method":"ping"}"#);
        assert_eq!(resp["id"], JsonValue::Null);
        assert_eq!(resp["result"], json!({}));

        let request: JsonRpcRequest =
            serde_json::from_str(r#"{"jsonrpc":"2.0","method":"ping"}"#).unwrap();
        assert_eq!(request.id, None);
    }

    #[test]
    fn test_parse_and_request_errors() {
        let (_dir, mut server) = test_server();
        let resp = call(&mut server, "{not json");
        assert_eq!(resp["error"]["code"], rpc_codes::PARSE_ERROR);
        assert_eq!(resp["id"], JsonValue::Null);

        let resp = call(&mut server, r#"{"jsonrpc":"2.0","id":7}"#);
        assert_eq!(resp["error"]["code"], rpc_codes::INVALID_REQUEST);
        assert_eq!(resp["id"], 7);

        let resp = call(&mut server, r#"{"jsonrpc":"1.0","id":8,"method":"ping"}"#);
        assert_eq!(resp["error"]["code"], rpc_codes::INVALID_REQUEST);

        let resp = call(&mut server, r#"{"jsonrpc":"2.0","id":9,"method":"bogus/method"}"#);
        assert_eq!(resp["error"]["code"], rpc_codes::METHOD_NOT_FOUND);
    }

    #[test]
    fn test_tools_call_failure_is_result() {
        let (_dir, mut server) = test_server();
        let resp = call(
            &mut server,
            r#"{"jsonrpc":"2.0","id":2,"method":"tools/call","params":{"name":"nope","arguments":{}}}"#,
        );
        assert_eq!(resp["result"]["isError"], true);
        let text = resp["result"]["content"][0]["text"].as_str().unwrap();
        let envelope: JsonValue = serde_json::from_str(text).unwrap();
        assert_eq!(envelope["success"], false);
        assert_eq!(envelope["error_kind"], "not_found_error");
    }

    #[test]
    fn test_resources_read_failure_is_error_with_envelope() {
        let (_dir, mut server) = test_server();
        let resp = call(
            &mut server,
            r#"{"jsonrpc":"2.0","id":3,"method":"resources/read","params":{"uri":"nowhere://x"}}"#,
        );
        assert_eq!(resp["error"]["code"], rpc_codes::INVALID_PARAMS);
        assert_eq!(resp["error"]["data"]["error_kind"], "not_found_error");
    }

    #[test]
    fn test_resource_listings_split_by_placeholders() {
        let (_dir, mut server) = test_server();
        let resp = call(&mut server, r#"{"jsonrpc":"2.0","id":4,"method":"resources/list"}"#);
        let uris: Vec<&str> = resp["result"]["resources"]
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r["uri"].as_str().unwrap())
            .collect();
        assert!(uris.contains(&"notes://schema"));
        assert!(!uris.iter().any(|u| u.contains('{')));

        let resp = call(
            &mut server,
            r#"{"jsonrpc":"2.0","id":5,"method":"resources/templates/list"}"#,
        );
        assert_eq!(
            resp["result"]["resourceTemplates"][0]["uriTemplate"],
            "project://file/{file_path}"
        );
    }

    #[test]
    fn test_prompts_get() {
        let (_dir, mut server) = test_server();
        let resp = call(
            &mut server,
            r#"{"jsonrpc":"2.0","id":6,"method":"prompts/get","params":{"name":"code_review","arguments":{"language":"rust"}}}"#,
        );
        let message = &resp["result"]["messages"][0];
        assert_eq!(message["role"], "user");
        assert!(message["content"]["text"]
            .as_str()
            .unwrap()
            .contains("Perform comprehensive rust code review"));

        let resp = call(
            &mut server,
            r#"{"jsonrpc":"2.0","id":7,"method":"prompts/get","params":{"name":"code_review","arguments":{"lang":"rust"}}}"#,
        );
        assert_eq!(resp["error"]["data"]["error_kind"], "argument_error");
    }
}
