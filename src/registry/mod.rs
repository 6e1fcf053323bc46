//! Operation registry and dispatcher.
//!
//! Operations live in three independent namespaces. Tools and prompts are
//! looked up by exact name; resources are resolved by matching the address
//! against registered [`UriTemplate`]s. [`Dispatcher::invoke`] is the single
//! point where handler failures, including panics, become failure envelopes.

pub mod params;
pub mod template;

use std::collections::HashMap;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};

use serde_json::{Map, Value as JsonValue};
use tracing::{debug, warn};

use crate::envelope::Envelope;
use crate::error::{ErrorKind, McpError, Result};
use crate::session::Session;

pub use params::{bind, input_schema, Args, ParamSpec, ParamType};
pub use template::UriTemplate;

/// The namespaces operations are registered in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Namespace {
    /// Callable actions
    Tool,
    /// Addressable data views
    Resource,
    /// Parameterized text templates
    Prompt,
}

impl Namespace {
    /// Lowercase namespace name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Namespace::Tool => "tool",
            Namespace::Resource => "resource",
            Namespace::Prompt => "prompt",
        }
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Function bound to a registered operation.
pub type Handler = Box<dyn Fn(&Session, &Args) -> Result<Envelope> + Send + Sync>;

/// A registered tool, resource or prompt.
pub struct Operation {
    name: String,
    description: String,
    params: Vec<ParamSpec>,
    handler: Handler,
}

impl Operation {
    /// New operation with no declared parameters.
    ///
    /// For resources, `name` is the address template.
    pub fn new<F>(name: &str, description: &str, handler: F) -> Self
    where
        F: Fn(&Session, &Args) -> Result<Envelope> + Send + Sync + 'static,
    {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            params: Vec::new(),
            handler: Box::new(handler),
        }
    }

    /// Declare the next parameter.
    pub fn param(mut self, spec: ParamSpec) -> Self {
        self.params.push(spec);
        self
    }

    /// Name, or address template for resources.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Human-readable description.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Declared parameters, in positional order.
    pub fn params(&self) -> &[ParamSpec] {
        &self.params
    }
}

impl fmt::Debug for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Operation")
            .field("name", &self.name)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

struct ResourceEntry {
    template: UriTemplate,
    operation: Operation,
}

/// All registered operations, by namespace.
#[derive(Default)]
pub struct Registry {
    tools: Vec<Operation>,
    resources: Vec<ResourceEntry>,
    prompts: Vec<Operation>,
}

impl Registry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the built-in tools, resources and prompts.
    pub fn with_defaults() -> Result<Self> {
        let mut registry = Self::new();
        crate::tools::register(&mut registry)?;
        crate::resources::register(&mut registry)?;
        crate::prompts::register(&mut registry)?;
        Ok(registry)
    }

    /// Register `operation` in `namespace`.
    ///
    /// Fails on a verbatim duplicate name. Resource templates must parse,
    /// must declare every placeholder as a parameter and must not overlap a
    /// template already registered.
    pub fn register(&mut self, namespace: Namespace, operation: Operation) -> Result<()> {
        let duplicate = || McpError::DuplicateRegistration {
            namespace: namespace.to_string(),
            name: operation.name.clone(),
        };

        match namespace {
            Namespace::Tool | Namespace::Prompt => {
                let ops = if namespace == Namespace::Tool {
                    &mut self.tools
                } else {
                    &mut self.prompts
                };
                if ops.iter().any(|op| op.name == operation.name) {
                    return Err(duplicate());
                }
                debug!(%namespace, name = %operation.name, "registering operation");
                ops.push(operation);
            }
            Namespace::Resource => {
                let template = UriTemplate::parse(&operation.name)?;
                if self
                    .resources
                    .iter()
                    .any(|entry| entry.template.as_str() == template.as_str())
                {
                    return Err(duplicate());
                }
                if let Some(existing) = self
                    .resources
                    .iter()
                    .find(|entry| entry.template.overlaps(&template))
                {
                    return Err(McpError::TemplateConflict {
                        template: template.to_string(),
                        existing: existing.template.to_string(),
                    });
                }
                if let Some(missing) = template
                    .placeholders()
                    .find(|name| !operation.params.iter().any(|p| p.name == *name))
                {
                    return Err(McpError::InvalidTemplate {
                        template: template.to_string(),
                        reason: format!("placeholder '{}' is not a declared parameter", missing),
                    });
                }
                debug!(%namespace, name = %operation.name, "registering operation");
                self.resources.push(ResourceEntry {
                    template,
                    operation,
                });
            }
        }
        Ok(())
    }

    /// Registered tools, in registration order.
    pub fn tools(&self) -> &[Operation] {
        &self.tools
    }

    /// Registered prompts, in registration order.
    pub fn prompts(&self) -> &[Operation] {
        &self.prompts
    }

    /// Registered resources with their parsed templates.
    pub fn resources(&self) -> impl Iterator<Item = (&UriTemplate, &Operation)> {
        self.resources.iter().map(|e| (&e.template, &e.operation))
    }

    /// Exact-name lookup of a tool or prompt, or exact-template lookup of a resource.
    pub fn lookup(&self, namespace: Namespace, name: &str) -> Option<&Operation> {
        match namespace {
            Namespace::Tool => self.tools.iter().find(|op| op.name == name),
            Namespace::Prompt => self.prompts.iter().find(|op| op.name == name),
            Namespace::Resource => self
                .resources
                .iter()
                .find(|e| e.template.as_str() == name)
                .map(|e| &e.operation),
        }
    }

    /// Resolve a resource address to its operation and placeholder captures.
    pub fn resolve(&self, address: &str) -> Option<(&Operation, HashMap<String, String>)> {
        self.resources.iter().find_map(|entry| {
            entry
                .template
                .matches(address)
                .map(|captures| (&entry.operation, captures))
        })
    }
}

/// Routes requests to handlers and applies the envelope contract.
pub struct Dispatcher {
    registry: Registry,
    session: Session,
}

impl Dispatcher {
    /// Dispatcher over the built-in operations.
    pub fn new(session: Session) -> Result<Self> {
        Ok(Self::with_registry(session, Registry::with_defaults()?))
    }

    /// Dispatcher over a caller-supplied registry.
    pub fn with_registry(session: Session, registry: Registry) -> Self {
        Self { registry, session }
    }

    /// The operation registry.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// The session handed to handlers.
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Invoke the operation named `target` (an address for resources).
    ///
    /// Always returns an envelope; no failure escapes.
    pub fn invoke(&self, namespace: Namespace, target: &str, args: JsonValue) -> Envelope {
        debug!(%namespace, name = target, "invoke");

        let (operation, raw_args) = match namespace {
            Namespace::Tool | Namespace::Prompt => match self.registry.lookup(namespace, target) {
                Some(op) => (op, args),
                None => return self.unknown(namespace, target),
            },
            Namespace::Resource => match self.registry.resolve(target) {
                Some((op, captures)) => {
                    let captured: Map<String, JsonValue> = captures
                        .into_iter()
                        .map(|(k, v)| (k, JsonValue::String(v)))
                        .collect();
                    (op, JsonValue::Object(captured))
                }
                None => return self.unknown(namespace, target),
            },
        };

        let args = match bind(&operation.params, raw_args) {
            Ok(args) => args,
            Err(err) => {
                warn!(%namespace, name = target, error = %err, "argument binding failed");
                return Envelope::from_error(&err);
            }
        };

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            (operation.handler)(&self.session, &args)
        }));

        let envelope = match outcome {
            Ok(result) => Envelope::from_result(result),
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                Envelope::failure(
                    ErrorKind::ExecutionError,
                    format!("handler panicked: {}", message),
                )
            }
        };

        if let Some(error) = envelope.error() {
            warn!(%namespace, name = target, error, "operation failed");
        }
        envelope
    }

    /// Invoke and serialize the envelope to its wire form.
    pub fn invoke_wire(&self, namespace: Namespace, target: &str, args: JsonValue) -> String {
        self.invoke(namespace, target, args).to_wire()
    }

    fn unknown(&self, namespace: Namespace, target: &str) -> Envelope {
        let err = McpError::UnknownOperation {
            namespace: namespace.to_string(),
            name: target.to_string(),
        };
        warn!(error = %err, "unknown operation");
        Envelope::from_error(&err)
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
