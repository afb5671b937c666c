use async_trait::async_trait;
use serde_json::{Map, Value};
use std::fmt::Debug;
use thiserror::Error;

/// A raw reading as produced by an upstream source. Its shape is whatever the source returns.
pub type Reading = Map<String, Value>;

#[async_trait]
pub trait ReadingSource: Debug + Send + Sync {
    fn kind(&self) -> &'static str;

    async fn readings(&self) -> Result<Reading, SourceError>;
}

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("request error: {0}")]
    RequestError(#[from] reqwest::Error),
    #[error("expected a JSON object from '{url}', got {found}")]
    NotAnObject { url: String, found: &'static str },
}
