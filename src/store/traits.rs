use serde_json::{Map, Value};
use thiserror::Error;

use crate::model::{Reference, WhereClause};

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },
    #[error("request failed: {0}")]
    Transport(String),
    #[error("service reported errors: {}", .0.join("; "))]
    Rejected(Vec<String>),
    #[error("unexpected response: {0}")]
    Malformed(String),
}

impl From<reqwest::Error> for ServiceError {
    fn from(error: reqwest::Error) -> Self {
        match error.status() {
            Some(status) => ServiceError::Http {
                status: status.as_u16(),
                message: error.to_string(),
            },
            None => ServiceError::Transport(error.to_string()),
        }
    }
}

/// The remote work-item service: query, read and partially update items by reference
#[async_trait::async_trait]
pub trait WorkItemService: Send + Sync {
    /// Query items of a type, returning the raw result objects in service order
    async fn query(
        &self,
        item_type: &str,
        clause: &WhereClause,
        fetch: &[&str],
    ) -> Result<Vec<Value>, ServiceError>;

    /// Read the requested fields of a single item
    async fn get(&self, reference: &Reference, fetch: &[&str]) -> Result<Map<String, Value>, ServiceError>;

    /// Read the requested fields of every member of a collection, in service order
    async fn get_collection(&self, reference: &Reference, fetch: &[&str]) -> Result<Vec<Value>, ServiceError>;

    /// Write a partial set of fields onto an item, returning the updated item
    async fn update(
        &self,
        reference: &Reference,
        fields: Map<String, Value>,
    ) -> Result<Map<String, Value>, ServiceError>;
}
