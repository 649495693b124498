pub mod model;
pub mod rules;

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::info;

use crate::model::role::Role;
use crate::store::JsonStore;
use crate::tools::{self, ToolInvocation, ToolName};

/// What the resolver sees: the authenticated caller plus the free-text query.
pub struct ResolveRequest<'a> {
    pub user_id: &'a str,
    pub role: Role,
    pub query: &'a str,
}

/// Resolver output: exactly one operation and a best-effort argument payload.
/// Identity arguments in the payload are ignored at binding time.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolChoice {
    pub tool: ToolName,
    pub arguments: Value,
}

#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("could not map the query to any operation: {0}")]
    Unresolved(String),
    #[error("query resolution failed: {0}")]
    Transport(#[from] anyhow::Error),
}

/// Maps a free-text query to one registered operation. Implementations range
/// from a keyword parser to a hosted model call; either way the returned
/// arguments are validated against the operation schema before execution.
#[async_trait]
pub trait QueryResolver: Send + Sync {
    async fn resolve(&self, request: &ResolveRequest<'_>) -> Result<ToolChoice, ResolveError>;
}

#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    /// The query could not be mapped to an operation, or the resolver's
    /// arguments failed schema validation. Never falls back to a default
    /// operation.
    #[error("{0}")]
    Resolution(String),
    /// Persistence or resolver transport failure; surfaces as a generic
    /// server error at the HTTP boundary.
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

/// The decision layer. Resolves, binds, executes, and passes the operation's
/// result through unchanged as the final answer.
pub struct AgentService {
    store: Arc<JsonStore>,
    resolver: Arc<dyn QueryResolver>,
}

impl AgentService {
    pub fn new(store: Arc<JsonStore>, resolver: Arc<dyn QueryResolver>) -> Self {
        Self { store, resolver }
    }

    pub async fn invoke(&self, user_id: &str, role: Role, query: &str) -> Result<Value, AgentError> {
        let request = ResolveRequest { user_id, role, query };
        let choice = self.resolver.resolve(&request).await.map_err(|e| match e {
            ResolveError::Transport(err) => AgentError::Internal(err),
            unresolved => AgentError::Resolution(unresolved.to_string()),
        })?;

        let invocation = ToolInvocation::bind(choice.tool, &choice.arguments, user_id)
            .map_err(|e| {
                AgentError::Resolution(format!(
                    "arguments for '{}' failed validation: {e}",
                    choice.tool
                ))
            })?;

        info!(user_id, %role, tool = %invocation.name(), "executing resolved operation");
        let result = tools::execute(&self.store, &invocation)?;
        Ok(tools::leave::envelope(&result))
    }
}
