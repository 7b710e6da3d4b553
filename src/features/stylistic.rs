use super::{
    Attribute, AttributeKind, BOOLEAN_DOMAIN, Feature, FeatureFamily, FeatureValue,
    NumericFeature, PosTagger, Statistics,
};
use crate::corpus::Line;

const PUNCTUATION: &[char] = &['.', ';', ':', '?', '!', ','];
const INTERROGATIVES: &[&str] = &["who", "when", "where", "what", "which", "how"];
const INTERROGATIVE_OPENERS: &[&str] = &[
    "who", "when", "where", "what", "which", "how", "is", "are", "am", "will", "do", "does",
    "have", "has",
];
const VERB_TAGS: &[&str] = &["VB", "VBD", "VBG", "VBN", "VBP", "VBZ"];
const PERSONAL_PRONOUNS: &[&str] = &["i", "you", "he", "she", "we", "they"];
const MODAL_WORDS: &[&str] = &[
    "may", "must", "mustn", "shall", "shan", "will", "might", "should", "would", "could",
];
const PLAN_PHRASES: &[&[&str]] = &[
    &["i", "will"],
    &["i", "am", "going", "to"],
    &["we", "will"],
    &["we", "are", "going", "to"],
    &["i", "plan", "to"],
    &["we", "plan", "to"],
];
const FIRST_PERSON: &[&str] = &["me", "us", "i", "we", "my", "mine", "myself", "ourselves"];
const SECOND_PERSON: &[&str] = &["you", "your", "yours", "yourself", "yourselves"];
const THIRD_PERSON: &[&str] = &["he", "she", "they", "his", "their", "hers", "him", "her", "them"];

const EARLY_PUNCTUATION_LIMIT: usize = 4;

enum Kind {
    Int,
    Real,
    Bool,
    Str,
}

const SCHEMA: &[(&str, Kind)] = &[
    ("position", Kind::Real),
    ("number_of_tokens", Kind::Int),
    ("number_of_chars", Kind::Int),
    ("number_of_quote_symbols", Kind::Int),
    ("average_token_length", Kind::Real),
    ("proportion_of_uppercase_chars", Kind::Real),
    ("proportion_of_alphabetic_chars", Kind::Real),
    ("proportion_of_numeric_chars", Kind::Real),
    ("has_question_mark", Kind::Bool),
    ("ends_with_question_mark", Kind::Bool),
    ("has_colon", Kind::Bool),
    ("ends_with_colon", Kind::Bool),
    ("has_semicolon", Kind::Bool),
    ("ends_with_semicolon", Kind::Bool),
    ("has_early_punctuation", Kind::Bool),
    ("has_interrogating_word", Kind::Bool),
    ("starts_with_interrogating_form", Kind::Bool),
    ("first_verb_form", Kind::Str),
    ("first_personal_pronoun", Kind::Str),
    ("contains_modal_word", Kind::Bool),
    ("contains_plan_phrase", Kind::Bool),
    ("contains_first_person_mark", Kind::Bool),
    ("contains_second_person_mark", Kind::Bool),
    ("contains_third_person_mark", Kind::Bool),
];

pub(super) fn attributes() -> Vec<Attribute> {
    SCHEMA
        .iter()
        .map(|(name, kind)| Attribute {
            name: (*name).to_string(),
            kind: match kind {
                Kind::Int => AttributeKind::Integer,
                Kind::Real => AttributeKind::Real,
                Kind::Bool => AttributeKind::Nominal(BOOLEAN_DOMAIN),
                Kind::Str => AttributeKind::String,
            },
            family: FeatureFamily::Stylistic,
        })
        .collect()
}

pub(super) fn stylistic_features(
    line: &Line,
    statistics: &Statistics,
    tagger: &dyn PosTagger,
) -> Vec<Feature> {
    let mut features = Vec::with_capacity(SCHEMA.len());

    for numeric in NumericFeature::ALL {
        let value = numeric.measure(line);
        let feature_value = if numeric.is_integer() {
            FeatureValue::Integer(value as i64)
        } else {
            FeatureValue::Real(value)
        };
        features.push(
            Feature::new(numeric.name(), feature_value).with_tier(statistics.tier(numeric, value)),
        );
    }

    let text = line.text();
    let words = cue_words(&line.tokens);
    let flag = |name: &str, value: bool| Feature::new(name, FeatureValue::Bool(value));

    features.push(flag("has_question_mark", text.contains('?')));
    features.push(flag("ends_with_question_mark", text.ends_with('?')));
    features.push(flag("has_colon", text.contains(':')));
    features.push(flag("ends_with_colon", text.ends_with(':')));
    features.push(flag("has_semicolon", text.contains(';')));
    features.push(flag("ends_with_semicolon", text.ends_with(';')));

    let first_punctuation = line.tokens.iter().position(|token| is_punctuation(token));
    features.push(flag(
        "has_early_punctuation",
        first_punctuation.is_some_and(|index| index < EARLY_PUNCTUATION_LIMIT),
    ));

    features.push(flag("has_interrogating_word", contains_any(&words, INTERROGATIVES)));
    features.push(flag(
        "starts_with_interrogating_form",
        words
            .first()
            .is_some_and(|word| INTERROGATIVE_OPENERS.contains(&word.as_str())),
    ));

    let first_verb_form = tagger
        .tag_and_lemmatize(&line.tokens)
        .into_iter()
        .map(|tagged| tagged.tag)
        .find(|tag| VERB_TAGS.contains(&tag.as_str()))
        .unwrap_or_else(|| "NO_VERB".to_string());
    features.push(Feature::new("first_verb_form", FeatureValue::Text(first_verb_form)));

    let first_personal_pronoun = words
        .iter()
        .find(|word| PERSONAL_PRONOUNS.contains(&word.as_str()))
        .map(|word| word.to_uppercase())
        .unwrap_or_else(|| "NO_PERSONAL_PRONOUN".to_string());
    features.push(Feature::new(
        "first_personal_pronoun",
        FeatureValue::Text(first_personal_pronoun),
    ));

    features.push(flag("contains_modal_word", contains_any(&words, MODAL_WORDS)));
    features.push(flag(
        "contains_plan_phrase",
        PLAN_PHRASES
            .iter()
            .any(|phrase| contains_sequence(&words, phrase)),
    ));
    features.push(flag("contains_first_person_mark", contains_any(&words, FIRST_PERSON)));
    features.push(flag("contains_second_person_mark", contains_any(&words, SECOND_PERSON)));
    features.push(flag("contains_third_person_mark", contains_any(&words, THIRD_PERSON)));

    features
}

/// Lowercased tokens with contractions cut at the apostrophe
/// ("mustn't" -> "mustn", "I'll" -> "i").
fn cue_words(tokens: &[String]) -> Vec<String> {
    tokens
        .iter()
        .map(|token| {
            let lower = token.to_lowercase();
            match lower.find(['\'', '’']) {
                Some(cut) if cut > 0 => lower[..cut].to_string(),
                _ => lower,
            }
        })
        .collect()
}

fn is_punctuation(token: &str) -> bool {
    !token.is_empty() && token.chars().all(|c| PUNCTUATION.contains(&c))
}

fn contains_any(words: &[String], cues: &[&str]) -> bool {
    words.iter().any(|word| cues.contains(&word.as_str()))
}

fn contains_sequence(words: &[String], phrase: &[&str]) -> bool {
    words
        .windows(phrase.len())
        .any(|window| window.iter().zip(phrase).all(|(word, cue)| word == cue))
}
