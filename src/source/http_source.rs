use crate::source::reading_source::{Reading, ReadingSource, SourceError};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, instrument};

/// A source that fetches its reading as a JSON object from an HTTP endpoint.
#[derive(Debug, Clone)]
pub struct HttpSource {
    client: Client,
    url: String,
}

impl HttpSource {
    pub fn new(url: String, timeout: Option<Duration>) -> Result<Self, SourceError> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(HttpSource { client: builder.build()?, url })
    }
}

#[async_trait]
impl ReadingSource for HttpSource {
    fn kind(&self) -> &'static str {
        "http"
    }

    #[instrument(fields(url = %self.url), skip(self))]
    async fn readings(&self) -> Result<Reading, SourceError> {
        debug!("📡 Fetching reading...");
        let response = self.client.get(&self.url).send().await?.error_for_status()?;

        match response.json::<Value>().await? {
            Value::Object(reading) => {
                debug!("📡 Fetching reading... OK");
                Ok(reading)
            }
            other => Err(SourceError::NotAnObject {
                url: self.url.clone(),
                found: json_kind(&other),
            }),
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
