use crate::sensor::expiry::Expiry;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct SerializedSourceDescriptor {
    #[serde(default)]
    pub(crate) name: String,
    #[serde(default)]
    pub(crate) latitude: String,
    #[serde(default)]
    pub(crate) longitude: String,
    pub(crate) updated: Option<String>,
    pub(crate) expire: Option<Expiry>,
}
