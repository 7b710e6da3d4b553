use std::collections::HashMap;
use std::collections::hash_map::Entry;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::corpus::{Document, Line, RawLabel};
use crate::error::{PipelineError, PipelineResult};
use crate::tfidf::SelectedNgram;

mod lexical;
mod statistics;
mod stylistic;
mod syntactic;
pub mod tagger;
mod thematic;
#[cfg(test)]
mod tests;

pub use lexical::LexicalMode;
pub use statistics::{NumericFeature, Statistics, Tier};
pub use syntactic::HINGE_FORMS;
pub use tagger::{LexiconTagger, PosTagger};

pub const BOOLEAN_DOMAIN: &[&str] = &["TRUE", "FALSE"];

pub fn bool_symbol(value: bool) -> &'static str {
    if value { "TRUE" } else { "FALSE" }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum FeatureFamily {
    Syntactic,
    Stylistic,
    Lexical,
    Thematic,
}

impl FeatureFamily {
    /// Column order of the exported schema.
    pub const ORDER: [FeatureFamily; 4] = [
        FeatureFamily::Syntactic,
        FeatureFamily::Stylistic,
        FeatureFamily::Lexical,
        FeatureFamily::Thematic,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Syntactic => "syntactic",
            Self::Stylistic => "stylistic",
            Self::Lexical => "lexical",
            Self::Thematic => "thematic",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FamilySet {
    pub syntactic: bool,
    pub stylistic: bool,
    pub lexical: bool,
    pub thematic: bool,
}

impl FamilySet {
    pub fn all() -> Self {
        Self {
            syntactic: true,
            stylistic: true,
            lexical: true,
            thematic: true,
        }
    }

    pub fn contains(&self, family: FeatureFamily) -> bool {
        match family {
            FeatureFamily::Syntactic => self.syntactic,
            FeatureFamily::Stylistic => self.stylistic,
            FeatureFamily::Lexical => self.lexical,
            FeatureFamily::Thematic => self.thematic,
        }
    }

    pub fn enabled(&self) -> Vec<FeatureFamily> {
        FeatureFamily::ORDER
            .into_iter()
            .filter(|family| self.contains(*family))
            .collect()
    }

    /// Families named in `selected`; all of them when `selected` is empty.
    pub fn from_selection(selected: &[FeatureFamily]) -> Self {
        if selected.is_empty() {
            return Self::all();
        }
        Self {
            syntactic: selected.contains(&FeatureFamily::Syntactic),
            stylistic: selected.contains(&FeatureFamily::Stylistic),
            lexical: selected.contains(&FeatureFamily::Lexical),
            thematic: selected.contains(&FeatureFamily::Thematic),
        }
    }

    pub fn describe(&self) -> String {
        self.enabled()
            .iter()
            .map(|family| family.as_str())
            .collect::<Vec<_>>()
            .join(",")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeKind {
    Integer,
    Real,
    Nominal(&'static [&'static str]),
    String,
}

impl AttributeKind {
    pub fn is_numeric(self) -> bool {
        matches!(self, Self::Integer | Self::Real)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    pub name: String,
    pub kind: AttributeKind,
    pub family: FeatureFamily,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FeatureValue {
    Integer(i64),
    Real(f64),
    Bool(bool),
    Nominal {
        value: &'static str,
        domain: &'static [&'static str],
    },
    Text(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    pub name: String,
    pub value: FeatureValue,
    /// Discrete tier for numeric features that have a training average.
    pub tier: Option<Tier>,
}

impl Feature {
    pub fn new(name: impl Into<String>, value: FeatureValue) -> Self {
        Self {
            name: name.into(),
            value,
            tier: None,
        }
    }

    pub fn with_tier(mut self, tier: Tier) -> Self {
        self.tier = Some(tier);
        self
    }
}

/// Ordered features of one line; names are unique.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureVector {
    features: Vec<Feature>,
    positions: HashMap<String, usize>,
}

impl FeatureVector {
    pub fn push(&mut self, feature: Feature) -> PipelineResult<()> {
        match self.positions.entry(feature.name.clone()) {
            Entry::Occupied(_) => Err(PipelineError::DuplicateFeature(feature.name)),
            Entry::Vacant(slot) => {
                slot.insert(self.features.len());
                self.features.push(feature);
                Ok(())
            }
        }
    }

    pub fn extend(&mut self, features: impl IntoIterator<Item = Feature>) -> PipelineResult<()> {
        for feature in features {
            self.push(feature)?;
        }
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Feature> {
        self.positions
            .get(name)
            .and_then(|&index| self.features.get(index))
    }

    pub fn names(&self) -> Vec<&str> {
        self.features.iter().map(|f| f.name.as_str()).collect()
    }
}

/// A line together with its neighbours and owning document.
#[derive(Debug, Clone, Copy)]
pub struct LineContext<'a> {
    pub previous: Option<&'a Line>,
    pub line: &'a Line,
    pub next: Option<&'a Line>,
    pub document: &'a Document,
}

impl<'a> LineContext<'a> {
    pub fn of_document(document: &'a Document) -> impl Iterator<Item = LineContext<'a>> + 'a {
        document
            .lines
            .iter()
            .enumerate()
            .map(move |(index, line)| LineContext {
                previous: index.checked_sub(1).and_then(|i| document.lines.get(i)),
                line,
                next: document.lines.get(index + 1),
                document,
            })
    }

    /// An `I` line surrounded by `I` lines on both sides.
    pub fn is_interior(&self) -> bool {
        let inner = |line: Option<&Line>| line.is_some_and(|l| l.raw_label == RawLabel::I);
        inner(Some(self.line)) && inner(self.previous) && inner(self.next)
    }
}

pub struct FeatureExtractor<'a> {
    statistics: &'a Statistics,
    ngrams: &'a [SelectedNgram],
    lexical_mode: LexicalMode,
    tagger: &'a dyn PosTagger,
    families: FamilySet,
}

impl<'a> FeatureExtractor<'a> {
    /// `statistics` must come from the training partition of the fold being
    /// extracted; tiers are frozen against it.
    pub fn new(
        statistics: &'a Statistics,
        ngrams: &'a [SelectedNgram],
        lexical_mode: LexicalMode,
        tagger: &'a dyn PosTagger,
        families: FamilySet,
    ) -> Self {
        Self {
            statistics,
            ngrams,
            lexical_mode,
            tagger,
            families,
        }
    }

    pub fn families(&self) -> FamilySet {
        self.families
    }

    pub fn family(&self, family: FeatureFamily, context: &LineContext<'_>) -> Vec<Feature> {
        match family {
            FeatureFamily::Syntactic => {
                syntactic::hinge_features(context.line, self.statistics, self.tagger)
            }
            FeatureFamily::Stylistic => {
                stylistic::stylistic_features(context.line, self.statistics, self.tagger)
            }
            FeatureFamily::Lexical => {
                lexical::lexical_features(context.line, self.ngrams, self.lexical_mode)
            }
            FeatureFamily::Thematic => thematic::thematic_features(context),
        }
    }

    #[cfg(test)]
    pub fn extract(&self, context: &LineContext<'_>) -> PipelineResult<FeatureVector> {
        let mut vector = FeatureVector::default();
        for family in self.families.enabled() {
            vector.extend(self.family(family, context))?;
        }
        Ok(vector)
    }

    pub fn attributes(&self, family: FeatureFamily) -> Vec<Attribute> {
        match family {
            FeatureFamily::Syntactic => syntactic::attributes(),
            FeatureFamily::Stylistic => stylistic::attributes(),
            FeatureFamily::Lexical => lexical::attributes(self.ngrams.len(), self.lexical_mode),
            FeatureFamily::Thematic => thematic::attributes(),
        }
    }

    /// Attribute declarations of every enabled family, in column order.
    pub fn schema(&self) -> Vec<Attribute> {
        self.families
            .enabled()
            .into_iter()
            .flat_map(|family| self.attributes(family))
            .collect()
    }
}
