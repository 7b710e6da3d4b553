use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use super::{COMMENT_MARKER, Corpus, Document, Line, MessageMetadata, RawLabel, ThematicLabel};
use crate::error::{PipelineError, PipelineResult};

#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    pub only_initial: bool,
    pub only_utf8: bool,
    pub only_text_plain: bool,
    pub skip_long_messages: bool,
    pub limit: Option<usize>,
    pub thematic_dir: Option<PathBuf>,
}

impl LoadOptions {
    fn filters_active(&self) -> bool {
        self.only_initial || self.only_utf8 || self.only_text_plain
    }
}

pub fn load_corpus(dir: &Path, options: &LoadOptions) -> PipelineResult<Corpus> {
    if !dir.is_dir() {
        return Err(PipelineError::DirectoryNotFound(dir.to_path_buf()));
    }

    let paths = discover_files(dir)?;
    let mut documents = Vec::with_capacity(paths.len());
    for path in &paths {
        let bytes = fs::read(path).map_err(|source| PipelineError::FileUnreadable {
            path: path.clone(),
            source,
        })?;
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        documents.push(parse_document(&name, &String::from_utf8_lossy(&bytes), path));
    }

    let length_cap = if options.skip_long_messages {
        max_message_length(&documents)
    } else {
        None
    };

    let read_count = documents.len();
    let mut selected = Vec::with_capacity(read_count);
    for document in documents {
        if !passes_filters(document.metadata.as_ref(), options) {
            debug!(document = %document.name, "excluded by metadata filters");
            continue;
        }
        if let Some(cap) = length_cap {
            if document.raw_line_count as f64 > cap {
                debug!(document = %document.name, lines = document.raw_line_count, cap, "excluded as probable dump");
                continue;
            }
        }
        if document.lines.is_empty() {
            let err = PipelineError::DegenerateInput(format!("{} has no content lines", document.name));
            debug!(error = %err, "skipping document");
            continue;
        }
        selected.push(document);
        if options.limit.is_some_and(|limit| selected.len() >= limit) {
            break;
        }
    }

    if let Some(thematic_dir) = &options.thematic_dir {
        for document in &mut selected {
            document.thematic_labels = load_thematic_labels(&thematic_dir.join(&document.name))?;
        }
    }

    let corpus = Corpus {
        documents: selected,
    };
    info!(
        dir = %dir.display(),
        files = read_count,
        documents = corpus.len(),
        lines = corpus.line_count(),
        "loaded corpus"
    );

    Ok(corpus)
}

/// Parses one tagged file. Malformed content lines are logged and skipped
/// but still advance the position counter.
pub fn parse_document(name: &str, content: &str, path: &Path) -> Document {
    let total_lines = content.lines().filter(|line| !is_comment(line)).count();

    let mut metadata = None;
    let mut lines = Vec::new();
    let mut position = 0;

    for (index, raw) in content.lines().enumerate() {
        if is_comment(raw) {
            if metadata.is_none() {
                metadata = MessageMetadata::parse(comment_body(raw));
            }
            continue;
        }

        position += 1;

        let mut tokens = raw.split_whitespace();
        let Some(head) = tokens.next() else {
            continue;
        };
        let rest: Vec<String> = tokens.map(ToOwned::to_owned).collect();

        if rest.is_empty() {
            let err = PipelineError::MalformedLine {
                path: path.to_path_buf(),
                line_number: index + 1,
                reason: "fewer than 2 tokens".to_string(),
            };
            debug!(error = %err, "skipping line");
            continue;
        }

        let Some(raw_label) = RawLabel::parse(head) else {
            let err = PipelineError::MalformedLine {
                path: path.to_path_buf(),
                line_number: index + 1,
                reason: format!("unknown label {head:?}"),
            };
            warn!(error = %err, "skipping line");
            continue;
        };

        lines.push(Line::new(raw_label, rest, position, total_lines));
    }

    Document {
        name: name.to_string(),
        lines,
        metadata,
        thematic_labels: None,
        raw_line_count: content.lines().count(),
    }
}

fn is_comment(line: &str) -> bool {
    line.trim_start().starts_with(COMMENT_MARKER)
}

fn comment_body(line: &str) -> &str {
    let trimmed = line.trim_start();
    let body = trimmed.strip_prefix(COMMENT_MARKER).unwrap_or(trimmed);
    body.strip_prefix(' ')
        .unwrap_or(body)
        .trim_end_matches(['\r', '\n'])
}

fn passes_filters(metadata: Option<&MessageMetadata>, options: &LoadOptions) -> bool {
    if !options.filters_active() {
        return true;
    }

    let Some(metadata) = metadata else {
        return false;
    };

    !((options.only_initial && !metadata.is_initial)
        || (options.only_utf8 && metadata.encoding != "UTF-8")
        || (options.only_text_plain && metadata.mime_type != "text/plain"))
}

fn max_message_length(documents: &[Document]) -> Option<f64> {
    if documents.is_empty() {
        return None;
    }

    let lengths: Vec<f64> = documents
        .iter()
        .map(|doc| doc.raw_line_count as f64)
        .collect();
    let mean = lengths.iter().sum::<f64>() / lengths.len() as f64;
    let variance =
        lengths.iter().map(|len| (len - mean).powi(2)).sum::<f64>() / lengths.len() as f64;

    Some((mean + variance.sqrt()).ceil())
}

fn load_thematic_labels(path: &Path) -> PipelineResult<Option<Vec<ThematicLabel>>> {
    if !path.is_file() {
        debug!(path = %path.display(), "no thematic labels");
        return Ok(None);
    }

    let raw = fs::read(path).map_err(|source| PipelineError::FileUnreadable {
        path: path.to_path_buf(),
        source,
    })?;
    let labels = String::from_utf8_lossy(&raw)
        .lines()
        .filter(|line| !is_comment(line))
        .map(|line| {
            line.split_whitespace()
                .next()
                .map(ThematicLabel::parse)
                .unwrap_or(ThematicLabel::Other)
        })
        .collect();

    Ok(Some(labels))
}

fn discover_files(dir: &Path) -> PipelineResult<Vec<PathBuf>> {
    let unreadable = |source| PipelineError::FileUnreadable {
        path: dir.to_path_buf(),
        source,
    };

    let mut files = Vec::new();
    for entry in fs::read_dir(dir).map_err(unreadable)? {
        let entry = entry.map_err(unreadable)?;
        let path = entry.path();
        if entry.file_type().map_err(unreadable)?.is_file() {
            files.push(path);
        }
    }
    files.sort();

    Ok(files)
}
