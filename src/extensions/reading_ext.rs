use crate::sensor::{ExtractionError, ReadingPath};
use serde_json::{Map, Value};

pub trait PathLookup {
    /// Descends into nested objects key by key and returns the value at the end of `path`.
    fn lookup(&self, path: &ReadingPath) -> Result<&Value, ExtractionError>;
}

impl PathLookup for Map<String, Value> {
    fn lookup(&self, path: &ReadingPath) -> Result<&Value, ExtractionError> {
        let missing = |key: &str| ExtractionError::MissingKey {
            key: key.to_owned(),
            path: path.to_string(),
        };

        let Some((last, parents)) = path.segments().split_last() else {
            return Err(missing(""));
        };

        let mut current = self;
        for key in parents {
            let value = current.get(key).ok_or_else(|| missing(key))?;
            current = value.as_object().ok_or_else(|| ExtractionError::NotAnObject {
                key: key.clone(),
                path: path.to_string(),
                found: value.to_string(),
            })?;
        }

        current.get(last).ok_or_else(|| missing(last))
    }
}
