//! # workbench-mcp
//!
//! MCP (Model Context Protocol) server for a personal productivity workspace.
//!
//! The server exposes a small SQLite note store and the local filesystem to
//! AI agents. It implements the MCP protocol over stdin/stdout using
//! JSON-RPC 2.0.
//!
//! ## Features
//!
//! - **7 tools**: quick notes, note search, recent notes, raw SQL, and text
//!   file read/write/listing
//! - **5 resources**: database schema, workspace summary, system status,
//!   active configuration, and per-file metadata via `project://file/{file_path}`
//! - **7 prompts**: review and planning templates for notes, code and projects
//! - **Uniform results**: every operation returns an envelope carrying
//!   `success` and, on failure, `error` plus a typed `error_kind`
//!
//! ## Usage
//!
//! The server is typically run as an executable and configured in an MCP client:
//!
//! ```json
//! {
//!   "mcpServers": {
//!     "workbench": {
//!       "command": "/path/to/workbench-mcp",
//!       "args": ["--db", "/path/to/app.db"]
//!     }
//!   }
//! }
//! ```
//!
//! ## Library Usage
//!
//! For testing or embedding, you can use the library API:
//!
//! ```no_run
//! use workbench_mcp::{Config, Dispatcher, McpServer, Namespace, Session};
//!
//! let session = Session::open(Config::new("data/app.db")).expect("failed to open store");
//! let dispatcher = Dispatcher::new(session).expect("failed to register operations");
//!
//! let envelope = dispatcher.invoke(
//!     Namespace::Tool,
//!     "quick_note",
//!     serde_json::json!({"title": "groceries", "content": "milk"}),
//! );
//! assert!(envelope.is_success());
//!
//! // Run the server (reads from stdin, writes to stdout)
//! let mut server = McpServer::new(dispatcher);
//! // server.run_sync().expect("Server error");
//! ```

#![warn(missing_docs)]

pub mod config;
pub mod convert;
pub mod envelope;
pub mod error;
pub mod files;
pub mod paths;
pub mod prompts;
pub mod registry;
pub mod resources;
pub mod server;
pub mod session;
pub mod store;
pub mod tools;

pub use config::Config;
pub use envelope::Envelope;
pub use error::{ErrorKind, McpError, Result};
pub use registry::{Dispatcher, Namespace, Operation, Registry};
pub use server::{JsonRpcRequest, JsonRpcResponse, McpServer};
pub use session::Session;
