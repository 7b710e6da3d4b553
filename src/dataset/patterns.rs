use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use super::Schema;
use crate::features::{FeatureFamily, HINGE_FORMS};

/// Hinge positions combined by one template block.
const BLOCK_POSITIONS: usize = 3;

fn offset_label(offset: i64) -> String {
    if offset < 1 {
        offset.to_string()
    } else {
        format!("+{offset}")
    }
}

/// Offsets covered by a window of `window` lines: `ceil(-w/2)` onwards.
pub fn window_offsets(window: usize) -> std::ops::Range<i64> {
    let width = window as i64;
    let left = -(width / 2);
    left..left + width
}

/// Wapiti feature templates. Hinge columns are laid out position-major, so
/// a block of three positions spans nine columns; each form (token, lemma,
/// tag) of a block gets three unigrams across the positions, two bigrams
/// and one trigram. Every other column gets a unigram.
pub fn render_patterns(schema: &Schema, window: usize) -> String {
    let stride = HINGE_FORMS.len();
    let mut syntactic: Vec<usize> = Vec::new();
    let mut singles: Vec<usize> = Vec::new();
    for (column, attribute) in schema.attributes.iter().enumerate() {
        if attribute.family == FeatureFamily::Syntactic {
            syntactic.push(column);
        } else {
            singles.push(column);
        }
    }
    let mut hinge_blocks: Vec<Vec<[usize; BLOCK_POSITIONS]>> = Vec::new();
    let mut blocks = syntactic.chunks_exact(BLOCK_POSITIONS * stride);
    for block in blocks.by_ref() {
        hinge_blocks.push(
            (0..stride)
                .map(|form| [block[form], block[form + stride], block[form + 2 * stride]])
                .collect(),
        );
    }
    singles.extend_from_slice(blocks.remainder());

    let mut out = String::new();
    let mut id = 1;
    let mut emit = |out: &mut String, columns: &[usize], offset: &str| {
        let body = columns
            .iter()
            .map(|column| format!("%x[{offset},{column}]"))
            .collect::<Vec<_>>()
            .join("/");
        let _ = writeln!(out, "*{id}:{body}");
        id += 1;
    };

    for offset in window_offsets(window) {
        let label = offset_label(offset);
        let offset = label.as_str();
        for block in &hinge_blocks {
            for group in block {
                for column in group {
                    emit(&mut out, &[*column], offset);
                }
                for pair in group.windows(2) {
                    emit(&mut out, pair, offset);
                }
                emit(&mut out, group.as_slice(), offset);
            }
            out.push('\n');
        }
        for column in &singles {
            emit(&mut out, &[*column], offset);
        }
        out.push('\n');
    }
    out
}

pub fn write_patterns(path: &Path, schema: &Schema, window: usize) -> Result<()> {
    fs::write(path, render_patterns(schema, window))
        .with_context(|| format!("failed to write pattern file: {}", path.display()))
}
