use anyhow::Result;
use regex::Regex;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaggedToken {
    pub token: String,
    pub lemma: String,
    pub tag: String,
}

/// Part-of-speech tagging and lemmatization of one token sequence. The output
/// has one entry per input token, in order.
pub trait PosTagger: Sync {
    fn tag_and_lemmatize(&self, tokens: &[String]) -> Vec<TaggedToken>;
}

const CLOSED_CLASS: &[(&str, &str, &str)] = &[
    ("a", "DT", "a"),
    ("an", "DT", "a"),
    ("the", "DT", "the"),
    ("this", "DT", "this"),
    ("that", "IN", "that"),
    ("these", "DT", "this"),
    ("those", "DT", "that"),
    ("and", "CC", "and"),
    ("or", "CC", "or"),
    ("but", "CC", "but"),
    ("of", "IN", "of"),
    ("in", "IN", "in"),
    ("on", "IN", "on"),
    ("at", "IN", "at"),
    ("for", "IN", "for"),
    ("with", "IN", "with"),
    ("from", "IN", "from"),
    ("by", "IN", "by"),
    ("about", "IN", "about"),
    ("if", "IN", "if"),
    ("to", "TO", "to"),
    ("i", "PRP", "i"),
    ("you", "PRP", "you"),
    ("he", "PRP", "he"),
    ("she", "PRP", "she"),
    ("it", "PRP", "it"),
    ("we", "PRP", "we"),
    ("they", "PRP", "they"),
    ("me", "PRP", "me"),
    ("him", "PRP", "him"),
    ("her", "PRP$", "her"),
    ("us", "PRP", "us"),
    ("them", "PRP", "them"),
    ("my", "PRP$", "my"),
    ("your", "PRP$", "your"),
    ("his", "PRP$", "his"),
    ("our", "PRP$", "our"),
    ("their", "PRP$", "their"),
    ("its", "PRP$", "its"),
    ("who", "WP", "who"),
    ("what", "WP", "what"),
    ("which", "WDT", "which"),
    ("when", "WRB", "when"),
    ("where", "WRB", "where"),
    ("how", "WRB", "how"),
    ("why", "WRB", "why"),
    ("can", "MD", "can"),
    ("could", "MD", "could"),
    ("may", "MD", "may"),
    ("might", "MD", "might"),
    ("must", "MD", "must"),
    ("shall", "MD", "shall"),
    ("should", "MD", "should"),
    ("will", "MD", "will"),
    ("would", "MD", "would"),
    ("not", "RB", "not"),
    ("be", "VB", "be"),
    ("am", "VBP", "be"),
    ("are", "VBP", "be"),
    ("is", "VBZ", "be"),
    ("was", "VBD", "be"),
    ("were", "VBD", "be"),
    ("been", "VBN", "be"),
    ("being", "VBG", "be"),
    ("have", "VBP", "have"),
    ("has", "VBZ", "have"),
    ("had", "VBD", "have"),
    ("do", "VBP", "do"),
    ("does", "VBZ", "do"),
    ("did", "VBD", "do"),
    ("please", "VB", "please"),
    ("thanks", "NNS", "thank"),
];

/// Deterministic dictionary and suffix based tagger. It produces Penn
/// Treebank style tags so the pipeline runs without a trained model.
#[derive(Debug, Clone)]
pub struct LexiconTagger {
    digits: Regex,
    punctuation: Regex,
}

impl LexiconTagger {
    pub fn new() -> Result<Self> {
        Ok(Self {
            digits: Regex::new(r"\d")?,
            punctuation: Regex::new(r"^[[:punct:]]+$")?,
        })
    }

    fn tag_one(&self, token: &str) -> TaggedToken {
        let lower = token.to_lowercase();

        if let Some((_, tag, lemma)) = CLOSED_CLASS.iter().find(|(word, _, _)| *word == lower) {
            return TaggedToken {
                token: token.to_string(),
                lemma: (*lemma).to_string(),
                tag: (*tag).to_string(),
            };
        }

        let (tag, lemma) = if self.punctuation.is_match(token) {
            (".", lower.clone())
        } else if lower.chars().all(|c| c.is_ascii_digit() || c == '.' || c == ',') {
            ("CD", lower.clone())
        } else if let Some(stem) = strip_suffix(&lower, "ing") {
            ("VBG", stem)
        } else if let Some(stem) = strip_suffix(&lower, "ed") {
            ("VBD", stem)
        } else if lower.len() > 3 && lower.ends_with("ly") {
            ("RB", lower.clone())
        } else if token.chars().next().is_some_and(char::is_uppercase) {
            ("NNP", lower.clone())
        } else if let Some(stem) = strip_suffix(&lower, "s").filter(|s| !s.ends_with('s')) {
            ("NNS", stem)
        } else {
            ("NN", lower.clone())
        };

        TaggedToken {
            token: token.to_string(),
            lemma: self.clear_numbers(&lemma),
            tag: tag.to_string(),
        }
    }

    /// Digits in lemmas are replaced by `#` so numbers share one form.
    pub fn clear_numbers(&self, lemma: &str) -> String {
        self.digits.replace_all(lemma, "#").into_owned()
    }
}

impl PosTagger for LexiconTagger {
    fn tag_and_lemmatize(&self, tokens: &[String]) -> Vec<TaggedToken> {
        tokens.iter().map(|token| self.tag_one(token)).collect()
    }
}

fn strip_suffix(word: &str, suffix: &str) -> Option<String> {
    word.strip_suffix(suffix)
        .filter(|stem| stem.chars().count() >= 3)
        .map(str::to_string)
}
