use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use rayon::prelude::*;

use super::arff::format_real;
use super::{AssembledDocument, Dataset, Instance, Schema};
use crate::corpus::{COMMENT_MARKER, boundary_symbol};
use crate::features::{Feature, FeatureValue, bool_symbol};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    /// Features followed by the `T`/`F` label.
    Labeled,
    /// Features only.
    Unlabeled,
    /// Original token text of each line.
    Origin,
}

/// Whitespace becomes `_`; a leading `#` is escaped so the row cannot be
/// read back as an engine score line.
fn verbatim(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 1);
    if value.starts_with(COMMENT_MARKER) {
        out.push('\\');
    }
    out.extend(value.chars().map(|c| if c.is_whitespace() { '_' } else { c }));
    out
}

fn render_feature(feature: &Feature) -> String {
    if let Some(tier) = feature.tier {
        return format!("{}_{}", feature.name, tier.as_str());
    }
    match &feature.value {
        FeatureValue::Bool(value) => format!("{}_{}", feature.name, bool_symbol(*value)),
        FeatureValue::Integer(value) => value.to_string(),
        FeatureValue::Real(value) => format_real(*value),
        FeatureValue::Nominal { value, .. } => verbatim(value),
        FeatureValue::Text(value) => verbatim(value),
    }
}

fn render_row(instance: &Instance, schema: &Schema, with_label: bool) -> String {
    let mut columns: Vec<String> = schema
        .attributes
        .iter()
        .map(|attribute| {
            instance
                .feature(&attribute.name)
                .map(render_feature)
                .unwrap_or_else(|| "?".to_string())
        })
        .collect();
    if with_label {
        columns.push(boundary_symbol(instance.label).to_string());
    }
    columns.join("\t")
}

/// One line per instance and a trailing blank line; empty documents render
/// to nothing.
pub fn render_block(document: &AssembledDocument, schema: &Schema, kind: BlockKind) -> String {
    if document.instances.is_empty() {
        return String::new();
    }

    let mut block = String::new();
    for instance in &document.instances {
        let row = match kind {
            BlockKind::Labeled => render_row(instance, schema, true),
            BlockKind::Unlabeled => render_row(instance, schema, false),
            BlockKind::Origin => instance.text.clone(),
        };
        block.push_str(&row);
        block.push('\n');
    }
    block.push('\n');
    block
}

/// Blocks are rendered in parallel and written by a single writer in
/// document order.
pub fn write_tagger_file(path: &Path, dataset: &Dataset, kind: BlockKind) -> Result<usize> {
    let blocks: Vec<String> = dataset
        .documents
        .par_iter()
        .map(|document| render_block(document, &dataset.schema, kind))
        .collect();

    let file = File::create(path)
        .with_context(|| format!("failed to create tagger file: {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    for block in &blocks {
        writer
            .write_all(block.as_bytes())
            .with_context(|| format!("failed to write tagger file: {}", path.display()))?;
    }
    writer
        .flush()
        .with_context(|| format!("failed to flush tagger file: {}", path.display()))?;

    Ok(dataset.instance_count())
}
