use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::corpus::Line;

/// Content identifier of a line: hex SHA-256 of its lowercased tokens joined
/// by single spaces. Labels, positions and feature values do not enter it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LineId(String);

impl LineId {
    pub fn from_tokens(tokens: &[String]) -> Self {
        let normalized = tokens
            .iter()
            .map(|token| token.to_lowercase())
            .collect::<Vec<_>>()
            .join(" ");

        let mut hasher = Sha256::new();
        hasher.update(normalized.as_bytes());
        Self(format!("{:x}", hasher.finalize()))
    }

    pub fn of_line(line: &Line) -> Self {
        Self::from_tokens(&line.tokens)
    }
}

impl fmt::Display for LineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
