//! Payload routing.
//!
//! Operations are registered explicitly at startup under the qualified name of
//! their request payload root, then resolved per request.

use crate::error::{Fault, FaultCode};
use crate::parser::{Payload, QualifiedName};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Identifies an operation by its request payload root element.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OperationKey {
    pub namespace: String,
    pub local_part: String,
}

impl OperationKey {
    pub fn new(namespace: impl Into<String>, local_part: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            local_part: local_part.into(),
        }
    }

    fn from_name(name: &QualifiedName) -> Self {
        Self::new(name.namespace.clone().unwrap_or_default(), name.local_name.clone())
    }
}

impl fmt::Display for OperationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{}}}{}", self.namespace, self.local_part)
    }
}

/// Handles one request payload and returns the response payload XML.
pub type OperationHandler = Arc<dyn Fn(&Payload) -> Result<String, Fault> + Send + Sync>;

/// Mapping from operation to handler, fixed once the service starts.
#[derive(Clone, Default)]
pub struct RouteTable {
    routes: HashMap<OperationKey, OperationHandler>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler, replacing any previous one for the same key.
    pub fn route<F>(&mut self, key: OperationKey, handler: F) -> &mut Self
    where
        F: Fn(&Payload) -> Result<String, Fault> + Send + Sync + 'static,
    {
        self.routes.insert(key, Arc::new(handler));
        self
    }

    pub fn resolve(&self, name: &QualifiedName) -> Option<&OperationHandler> {
        self.routes.get(&OperationKey::from_name(name))
    }

    /// Invoke the handler registered for the payload root.
    pub fn dispatch(&self, payload: &Payload) -> Result<String, Fault> {
        let handler = self.resolve(&payload.name).ok_or_else(|| {
            Fault::new(
                FaultCode::NoEndpointMapping,
                format!("No endpoint mapping found for {}", payload.name),
            )
        })?;
        handler(payload)
    }

    /// Registered operation keys, sorted.
    pub fn operations(&self) -> Vec<&OperationKey> {
        let mut keys: Vec<&OperationKey> = self.routes.keys().collect();
        keys.sort_by(|a, b| (&a.namespace, &a.local_part).cmp(&(&b.namespace, &b.local_part)));
        keys
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

impl fmt::Debug for RouteTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteTable")
            .field("operations", &self.operations())
            .finish()
    }
}
