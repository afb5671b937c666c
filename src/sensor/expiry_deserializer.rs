use crate::sensor::expiry::Expiry;
use serde::de::{Error, Unexpected};
use serde::{Deserialize, Deserializer};

impl<'de> Deserialize<'de> for Expiry {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        Expiry::parse(&value).ok_or_else(|| Error::invalid_value(Unexpected::Str(&value), &"a duration like '100ms', '30s', '10m', '12h' or '1d'"))
    }
}
