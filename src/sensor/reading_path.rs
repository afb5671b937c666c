use std::fmt::{Display, Formatter};

/// A dot-delimited path into a nested reading, e.g. `position.lat`.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct ReadingPath {
    segments: Vec<String>,
}

impl ReadingPath {
    /// Returns `None` when the path is empty or contains an empty segment.
    pub fn parse(path: &str) -> Option<ReadingPath> {
        let segments: Vec<String> = path.split('.').map(str::to_owned).collect();
        if segments.iter().any(String::is_empty) {
            return None;
        }

        Some(ReadingPath { segments })
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }
}

impl Display for ReadingPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.segments.join("."))
    }
}
