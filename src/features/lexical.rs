use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use super::{Attribute, AttributeKind, BOOLEAN_DOMAIN, Feature, FeatureFamily, FeatureValue};
use crate::corpus::Line;
use crate::tfidf::{SelectedNgram, normalize_tokens, term_frequency};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum LexicalMode {
    /// TRUE/FALSE presence of the n-gram in the line
    #[default]
    Presence,
    /// tf-idf weight of the n-gram in the line
    Weight,
}

fn ngram_name(index: usize) -> String {
    format!("ngram_{}", index + 1)
}

pub(super) fn attributes(count: usize, mode: LexicalMode) -> Vec<Attribute> {
    let kind = match mode {
        LexicalMode::Presence => AttributeKind::Nominal(BOOLEAN_DOMAIN),
        LexicalMode::Weight => AttributeKind::Real,
    };
    (0..count)
        .map(|index| Attribute {
            name: ngram_name(index),
            kind,
            family: FeatureFamily::Lexical,
        })
        .collect()
}

pub(super) fn lexical_features(
    line: &Line,
    ngrams: &[SelectedNgram],
    mode: LexicalMode,
) -> Vec<Feature> {
    let words = normalize_tokens(&line.tokens);
    let text = words.join(" ");

    ngrams
        .iter()
        .enumerate()
        .map(|(index, ngram)| {
            let value = match mode {
                LexicalMode::Presence => FeatureValue::Bool(text.contains(ngram.term.as_str())),
                LexicalMode::Weight => {
                    FeatureValue::Real(term_frequency(&words, &ngram.term) * ngram.idf)
                }
            };
            Feature::new(ngram_name(index), value)
        })
        .collect()
}
