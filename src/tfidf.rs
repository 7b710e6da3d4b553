use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::corpus::Line;

pub const MAX_NGRAM_ORDER: usize = 3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectedNgram {
    pub term: String,
    /// Best tf-idf over the lines of the selection partition.
    pub score: f64,
    pub idf: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "mode", content = "value")]
pub enum Selection {
    /// Keep terms whose best score is strictly above the threshold.
    Threshold(f64),
    TopK(usize),
    /// Keep `ceil(fraction * distinct_terms)` terms.
    TopFraction(f64),
}

pub fn normalize_tokens(tokens: &[String]) -> Vec<String> {
    tokens.iter().map(|token| token.to_lowercase()).collect()
}

/// Unigrams plus adjacent n-grams up to `max_n`, in scan order.
pub fn line_ngrams(words: &[String], max_n: usize) -> Vec<String> {
    let mut grams = Vec::new();
    for n in 1..=max_n.clamp(1, MAX_NGRAM_ORDER) {
        grams.extend(words.windows(n).map(|window| window.join(" ")));
    }
    grams
}

/// Occurrences of `term` in the line over the line's token count.
pub fn term_frequency(words: &[String], term: &str) -> f64 {
    if words.is_empty() {
        return 0.0;
    }
    let n = term.split(' ').count();
    let count = words
        .windows(n)
        .filter(|window| window.join(" ") == term)
        .count();
    count as f64 / words.len() as f64
}

pub fn inverse_document_frequency(documents: usize, document_frequency: usize) -> f64 {
    if documents == 0 || document_frequency == 0 {
        return 0.0;
    }
    (documents as f64 / document_frequency as f64).ln()
}

pub fn tf_idf(count: usize, length: usize, documents: usize, document_frequency: usize) -> f64 {
    if length == 0 {
        return 0.0;
    }
    count as f64 / length as f64 * inverse_document_frequency(documents, document_frequency)
}

struct TermEntry {
    best: f64,
    document_frequency: usize,
}

/// Per-line pseudo-documents: n-gram counts in first-occurrence order plus
/// the line's token count.
struct LineGrams {
    counts: Vec<(String, usize)>,
    length: usize,
}

fn count_line(line: &Line, max_n: usize) -> LineGrams {
    let words = normalize_tokens(&line.tokens);
    let mut counts: Vec<(String, usize)> = Vec::new();
    let mut index = HashMap::<String, usize>::new();
    for gram in line_ngrams(&words, max_n) {
        match index.get(&gram) {
            Some(&slot) => counts[slot].1 += 1,
            None => {
                index.insert(gram.clone(), counts.len());
                counts.push((gram, 1));
            }
        }
    }
    LineGrams {
        counts,
        length: words.len(),
    }
}

#[derive(Debug, Clone, Copy)]
pub struct TfIdfSelector {
    max_n: usize,
}

impl TfIdfSelector {
    pub fn new(max_n: usize) -> Self {
        Self {
            max_n: max_n.clamp(1, MAX_NGRAM_ORDER),
        }
    }

    pub fn max_n(&self) -> usize {
        self.max_n
    }

    /// Ranks every n-gram of `lines` by its best tf-idf and applies
    /// `selection`. Ties keep first-occurrence order.
    pub fn select<'a>(
        &self,
        lines: impl IntoIterator<Item = &'a Line>,
        selection: Selection,
    ) -> Vec<SelectedNgram> {
        let pseudo_documents: Vec<LineGrams> = lines
            .into_iter()
            .map(|line| count_line(line, self.max_n))
            .collect();
        let total = pseudo_documents.len();

        let mut order: Vec<String> = Vec::new();
        let mut entries = HashMap::<String, TermEntry>::new();
        for document in &pseudo_documents {
            for (term, _) in &document.counts {
                entries
                    .entry(term.clone())
                    .and_modify(|entry| entry.document_frequency += 1)
                    .or_insert_with(|| {
                        order.push(term.clone());
                        TermEntry {
                            best: 0.0,
                            document_frequency: 1,
                        }
                    });
            }
        }

        for document in &pseudo_documents {
            for (term, count) in &document.counts {
                if let Some(entry) = entries.get_mut(term) {
                    let score = tf_idf(*count, document.length, total, entry.document_frequency);
                    entry.best = entry.best.max(score);
                }
            }
        }

        let mut ranked: Vec<SelectedNgram> = order
            .into_iter()
            .filter_map(|term| {
                let entry = entries.get(&term)?;
                Some(SelectedNgram {
                    idf: inverse_document_frequency(total, entry.document_frequency),
                    score: entry.best,
                    term,
                })
            })
            .collect();
        ranked.sort_by(|a, b| b.score.total_cmp(&a.score));

        match selection {
            Selection::Threshold(threshold) => {
                ranked.retain(|ngram| ngram.score > threshold);
            }
            Selection::TopK(k) => ranked.truncate(k),
            Selection::TopFraction(fraction) => {
                let keep = (fraction.clamp(0.0, 1.0) * ranked.len() as f64).ceil() as usize;
                ranked.truncate(keep);
            }
        }
        ranked
    }

    /// Attaches idf and best score from `lines` to an imposed vocabulary,
    /// keeping its order.
    pub fn impose<'a>(
        &self,
        terms: &[String],
        lines: impl IntoIterator<Item = &'a Line>,
    ) -> Vec<SelectedNgram> {
        let pseudo_documents: Vec<LineGrams> = lines
            .into_iter()
            .map(|line| count_line(line, MAX_NGRAM_ORDER))
            .collect();
        let total = pseudo_documents.len();

        terms
            .iter()
            .map(|term| {
                let hits: Vec<(usize, usize)> = pseudo_documents
                    .iter()
                    .filter_map(|document| {
                        document
                            .counts
                            .iter()
                            .find(|(gram, _)| gram == term)
                            .map(|(_, count)| (*count, document.length))
                    })
                    .collect();
                let best = hits
                    .iter()
                    .map(|(count, length)| tf_idf(*count, *length, total, hits.len()))
                    .fold(0.0, f64::max);
                SelectedNgram {
                    term: term.clone(),
                    score: best,
                    idf: inverse_document_frequency(total, hits.len()),
                }
            })
            .collect()
    }
}

pub fn write_ngram_file(path: &Path, ngrams: &[SelectedNgram]) -> Result<()> {
    let mut body = String::new();
    for ngram in ngrams {
        body.push_str(&ngram.term);
        body.push('\n');
    }
    fs::write(path, body)
        .with_context(|| format!("failed to write n-gram file: {}", path.display()))
}

/// One n-gram per line; blank lines are ignored and duplicates dropped.
pub fn read_ngram_file(path: &Path) -> Result<Vec<String>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read n-gram file: {}", path.display()))?;

    let mut terms: Vec<String> = Vec::new();
    for line in raw.lines() {
        let term = line.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase();
        if !term.is_empty() && !terms.contains(&term) {
            terms.push(term);
        }
    }
    Ok(terms)
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;
    use crate::corpus::RawLabel;

    fn line(text: &str) -> Line {
        let tokens = text.split_whitespace().map(str::to_string).collect();
        Line::new(RawLabel::I, tokens, 1, 1)
    }

    #[test]
    fn rare_term_outranks_ubiquitous_term() {
        let lines = vec![line("common rare"), line("common"), line("Common")];
        let selector = TfIdfSelector::new(1);

        let ranked = selector.select(&lines, Selection::TopK(10));
        assert_eq!(ranked[0].term, "rare");
        assert!((ranked[0].idf - 3.0_f64.ln()).abs() < 1e-12);
        assert_eq!(ranked[1].term, "common");
        assert_eq!(ranked[1].idf, 0.0);

        for threshold in [1e-9, 0.1, 0.5] {
            let kept = selector.select(&lines, Selection::Threshold(threshold));
            assert!(kept.iter().all(|ngram| ngram.term != "common"));
        }
    }

    #[test]
    fn tf_idf_is_monotonic_in_term_frequency() {
        let mut previous = f64::MIN;
        for count in 0..=10 {
            let score = tf_idf(count, 10, 8, 2);
            assert!(score >= previous);
            previous = score;
        }
    }

    #[test]
    fn line_ngrams_adds_bigrams_and_trigrams() {
        let words = normalize_tokens(&["See", "you", "soon"].map(String::from));
        let grams = line_ngrams(&words, 3);
        assert_eq!(
            grams,
            vec!["see", "you", "soon", "see you", "you soon", "see you soon"]
        );
        assert_eq!(line_ngrams(&words, 1).len(), 3);
    }

    #[test]
    fn top_fraction_rounds_up_and_ties_keep_scan_order() {
        let lines = vec![line("alpha beta"), line("gamma delta")];
        let kept = TfIdfSelector::new(1).select(&lines, Selection::TopFraction(0.3));
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0].term, "alpha");
        assert_eq!(kept[1].term, "beta");
    }

    #[test]
    fn term_frequency_counts_multiword_terms() {
        let words = normalize_tokens(&["thank", "you", "thank", "you"].map(String::from));
        assert_eq!(term_frequency(&words, "thank you"), 0.5);
        assert_eq!(term_frequency(&words, "you"), 0.5);
        assert_eq!(term_frequency(&[], "you"), 0.0);
    }

    #[test]
    fn imposed_vocabulary_keeps_order_and_gets_fold_idf() {
        let lines = vec![line("hello there"), line("bye now")];
        let imposed = TfIdfSelector::new(2).impose(&["bye now".to_string(), "absent".to_string()], &lines);
        assert_eq!(imposed[0].term, "bye now");
        assert!((imposed[0].idf - 2.0_f64.ln()).abs() < 1e-12);
        assert_eq!(imposed[1].idf, 0.0);
    }

    #[test]
    fn ngram_file_round_trip_normalizes_terms() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("ngrams.txt");
        std::fs::write(&path, "Thank  You\n\nthank you\nregards\n").expect("write");

        let terms = read_ngram_file(&path).expect("read");
        assert_eq!(terms, vec!["thank you", "regards"]);

        let selected: Vec<SelectedNgram> = terms
            .iter()
            .map(|term| SelectedNgram {
                term: term.clone(),
                score: 0.0,
                idf: 0.0,
            })
            .collect();
        write_ngram_file(&path, &selected).expect("write ngrams");
        assert_eq!(read_ngram_file(&path).expect("reread"), terms);
    }
}
