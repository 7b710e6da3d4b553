use serde::{Deserialize, Serialize};

mod loader;

pub use loader::{LoadOptions, load_corpus};

pub const COMMENT_MARKER: char = '#';
pub const BOUNDARY: &str = "T";
pub const NON_BOUNDARY: &str = "F";

/// Line tag as written by the upstream email tagger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RawLabel {
    B,
    I,
    E,
    BE,
}

impl RawLabel {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "B" => Some(Self::B),
            "I" => Some(Self::I),
            "E" => Some(Self::E),
            "BE" => Some(Self::BE),
            _ => None,
        }
    }

    pub fn is_boundary(self) -> bool {
        matches!(self, Self::B | Self::BE)
    }

    /// Canonical raw label for a boundary flag.
    #[cfg(test)]
    pub fn from_boundary(boundary: bool) -> Self {
        if boundary { Self::B } else { Self::I }
    }
}

pub fn boundary_symbol(boundary: bool) -> &'static str {
    if boundary { BOUNDARY } else { NON_BOUNDARY }
}

/// Unsupervised boundary label produced by a secondary segmenter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ThematicLabel {
    Segment,
    Other,
}

impl ThematicLabel {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "S" | "T" | "B" | "BE" => Self::Segment,
            _ => Self::Other,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Segment => "S",
            Self::Other => "O",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageMetadata {
    pub message_id: String,
    pub mime_type: String,
    pub encoding: String,
    pub is_initial: bool,
    pub from_address: String,
    pub from_personal: String,
    pub to_address: String,
    pub to_personal: String,
}

impl MessageMetadata {
    /// Parses the body of a comment line; `None` unless it has exactly 8
    /// tab-separated fields.
    pub fn parse(body: &str) -> Option<Self> {
        let fields: Vec<&str> = body.split('\t').collect();
        if fields.len() != 8 {
            return None;
        }

        Some(Self {
            message_id: fields[0].to_string(),
            mime_type: fields[1].to_string(),
            encoding: fields[2].to_string(),
            is_initial: fields[3] == "true",
            from_address: fields[4].to_string(),
            from_personal: fields[5].to_string(),
            to_address: fields[6].to_string(),
            to_personal: fields[7].to_string(),
        })
    }
}

/// One tagged content line. `position` is 1-based over the non-comment
/// lines of its file.
#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    pub raw_label: RawLabel,
    pub boundary: bool,
    pub tokens: Vec<String>,
    pub position: usize,
    pub total_lines: usize,
}

impl Line {
    pub fn new(raw_label: RawLabel, tokens: Vec<String>, position: usize, total_lines: usize) -> Self {
        Self {
            raw_label,
            boundary: raw_label.is_boundary(),
            tokens,
            position,
            total_lines,
        }
    }

    pub fn text(&self) -> String {
        self.tokens.join(" ")
    }

    pub fn position_ratio(&self) -> f64 {
        self.position as f64 / self.total_lines.max(1) as f64
    }
}

#[derive(Debug, Clone)]
pub struct Document {
    pub name: String,
    pub lines: Vec<Line>,
    pub metadata: Option<MessageMetadata>,
    pub thematic_labels: Option<Vec<ThematicLabel>>,
    pub raw_line_count: usize,
}

impl Document {
    pub fn thematic_label(&self, position: usize) -> ThematicLabel {
        position
            .checked_sub(1)
            .and_then(|index| self.thematic_labels.as_ref()?.get(index).copied())
            .unwrap_or(ThematicLabel::Other)
    }

    pub fn boundary_string(&self) -> String {
        self.lines
            .iter()
            .map(|line| boundary_symbol(line.boundary))
            .collect()
    }
}

/// Documents in load order. Fold assignment depends on this order.
#[derive(Debug, Clone, Default)]
pub struct Corpus {
    pub documents: Vec<Document>,
}

impl Corpus {
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn line_count(&self) -> usize {
        self.documents.iter().map(|doc| doc.lines.len()).sum()
    }

    pub fn select(&self, indices: &[usize]) -> Vec<&Document> {
        indices
            .iter()
            .filter_map(|&index| self.documents.get(index))
            .collect()
    }
}
