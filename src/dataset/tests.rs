use tempfile::tempdir;

use super::arff::render_arff;
use super::assemble::{DocumentLabels, FamilyRows, LabeledLine};
use super::patterns::{render_patterns, window_offsets};
use super::tagger_format::render_block;
use super::*;
use crate::corpus::{Document, Line, RawLabel};
use crate::error::PipelineError;
use crate::features::{
    Attribute, AttributeKind, BOOLEAN_DOMAIN, FamilySet, Feature, FeatureExtractor, FeatureFamily,
    FeatureValue, LexicalMode, LexiconTagger, Statistics, Tier,
};

fn tokens(text: &str) -> Vec<String> {
    text.split_whitespace().map(str::to_string).collect()
}

fn labeled(text: &str, boundary: bool) -> LabeledLine {
    LabeledLine {
        id: LineId::from_tokens(&tokens(text)),
        boundary,
        text: text.to_string(),
    }
}

fn doc_labels(name: &str, lines: Vec<LabeledLine>) -> DocumentLabels {
    DocumentLabels {
        name: name.to_string(),
        lines,
    }
}

fn attribute(name: &str, kind: AttributeKind, family: FeatureFamily) -> Attribute {
    Attribute {
        name: name.to_string(),
        kind,
        family,
    }
}

fn stylistic_rows(texts: &[&str]) -> FamilyRows {
    FamilyRows {
        family: FeatureFamily::Stylistic,
        attributes: vec![attribute("number_of_tokens", AttributeKind::Integer, FeatureFamily::Stylistic)],
        rows: texts
            .iter()
            .map(|text| {
                let count = tokens(text).len() as i64;
                (
                    LineId::from_tokens(&tokens(text)),
                    vec![
                        Feature::new("number_of_tokens", FeatureValue::Integer(count))
                            .with_tier(Tier::High),
                    ],
                )
            })
            .collect(),
    }
}

fn lexical_rows(texts: &[&str]) -> FamilyRows {
    FamilyRows {
        family: FeatureFamily::Lexical,
        attributes: vec![attribute(
            "ngram_1",
            AttributeKind::Nominal(BOOLEAN_DOMAIN),
            FeatureFamily::Lexical,
        )],
        rows: texts
            .iter()
            .map(|text| {
                (
                    LineId::from_tokens(&tokens(text)),
                    vec![Feature::new("ngram_1", FeatureValue::Bool(text.contains("thanks")))],
                )
            })
            .collect(),
    }
}

#[test]
fn line_id_depends_on_normalized_tokens_only() {
    let a = LineId::from_tokens(&tokens("Hello  World"));
    let b = LineId::from_tokens(&tokens("hello world"));
    let c = LineId::from_tokens(&tokens("hello worlds"));
    assert_eq!(a, b);
    assert_ne!(a, c);
    assert_eq!(a.to_string().len(), 64);

    let line = Line::new(RawLabel::B, tokens("HELLO world"), 3, 9);
    assert_eq!(LineId::of_line(&line), a);
}

#[test]
fn missing_family_row_is_a_dataset_inconsistency() {
    let labels = vec![doc_labels("d", vec![labeled("a", true), labeled("b", false)])];
    let err = assemble(labels, vec![stylistic_rows(&["a", "b"]), lexical_rows(&["a"])])
        .expect_err("b has no lexical row");

    let expected = LineId::from_tokens(&tokens("b")).to_string();
    match err {
        PipelineError::DatasetInconsistency { missing } => assert_eq!(missing, vec![expected]),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn extra_family_row_is_reported_too() {
    let labels = vec![doc_labels("d", vec![labeled("a", true)])];
    let err = assemble(labels, vec![stylistic_rows(&["a", "z"])]).expect_err("z is unlabeled");
    assert!(matches!(
        err,
        PipelineError::DatasetInconsistency { ref missing }
            if missing == &vec![LineId::from_tokens(&tokens("z")).to_string()]
    ));
}

#[test]
fn feature_name_shared_by_two_families_is_rejected() {
    let labels = vec![doc_labels("d", vec![labeled("a", true)])];
    let mut clash = stylistic_rows(&["a"]);
    clash.family = FeatureFamily::Thematic;
    let err = assemble(labels, vec![stylistic_rows(&["a"]), clash]).expect_err("duplicate name");
    assert!(matches!(err, PipelineError::DuplicateFeature(ref name) if name == "number_of_tokens"));
}

#[test]
fn repeated_lines_join_occurrence_by_occurrence() {
    let labels = vec![
        doc_labels("d1", vec![labeled("thanks", false), labeled("hi", true)]),
        doc_labels("d2", vec![labeled("thanks", true)]),
    ];
    let families = vec![
        lexical_rows(&["thanks", "hi", "thanks"]),
        stylistic_rows(&["thanks", "hi", "thanks"]),
    ];
    let dataset = assemble(labels, families).expect("assemble");

    // schema follows family order, not argument order
    assert_eq!(dataset.schema.names(), vec!["number_of_tokens", "ngram_1"]);
    assert_eq!(dataset.instance_count(), 3);
    assert_eq!(dataset.unique_instances().len(), 2);

    let labels: Vec<bool> = dataset
        .documents
        .iter()
        .flat_map(|doc| doc.instances.iter())
        .map(|instance| instance.label)
        .collect();
    assert_eq!(labels, vec![false, true, true]);
    assert_eq!(dataset.documents[1].instances[0].id, LineId::from_tokens(&tokens("thanks")));
}

#[test]
fn arff_renders_header_and_unique_rows() {
    let labels = vec![
        doc_labels("d1", vec![labeled("thanks a lot", false), labeled("it's me", true)]),
        doc_labels("d2", vec![labeled("thanks a lot", false)]),
    ];
    let mut text_rows = FamilyRows {
        family: FeatureFamily::Syntactic,
        attributes: vec![attribute("hinge_0_token", AttributeKind::String, FeatureFamily::Syntactic)],
        rows: Vec::new(),
    };
    for text in ["thanks a lot", "it's me", "thanks a lot"] {
        let first = tokens(text)[0].clone();
        text_rows.rows.push((
            LineId::from_tokens(&tokens(text)),
            vec![Feature::new("hinge_0_token", FeatureValue::Text(first))],
        ));
    }
    let dataset = assemble(
        labels,
        vec![text_rows, lexical_rows(&["thanks a lot", "it's me", "thanks a lot"])],
    )
    .expect("assemble");

    let arff = render_arff(&dataset, "train fold 0", true);
    let expected = "@relation 'train fold 0'\n\n\
                    @attribute hinge_0_token STRING\n\
                    @attribute ngram_1 {TRUE,FALSE}\n\
                    @attribute class {F,T}\n\n\
                    @data\n\
                    'thanks',TRUE,F\n\
                    'it\\'s',FALSE,T\n";
    assert_eq!(arff, expected);

    // test files share the training header so both load as one schema
    let unlabeled = render_arff(&dataset, "train fold 0", false);
    assert_eq!(
        unlabeled,
        expected.replace(",F\n", ",?\n").replace(",T\n", ",?\n")
    );
}

#[test]
fn tagger_blocks_render_tiers_and_flags() {
    let labels = vec![
        doc_labels("d1", vec![labeled("many thanks", true), labeled("see you", false)]),
        doc_labels("empty", Vec::new()),
    ];
    let dataset = assemble(
        labels,
        vec![
            stylistic_rows(&["many thanks", "see you"]),
            lexical_rows(&["many thanks", "see you"]),
        ],
    )
    .expect("assemble");

    let labeled_block = render_block(&dataset.documents[0], &dataset.schema, BlockKind::Labeled);
    assert_eq!(
        labeled_block,
        "number_of_tokens_high\tngram_1_TRUE\tT\nnumber_of_tokens_high\tngram_1_FALSE\tF\n\n"
    );
    let unlabeled = render_block(&dataset.documents[0], &dataset.schema, BlockKind::Unlabeled);
    assert!(unlabeled.lines().all(|row| row.is_empty() || row.split('\t').count() == 2));
    let origin = render_block(&dataset.documents[0], &dataset.schema, BlockKind::Origin);
    assert_eq!(origin, "many thanks\nsee you\n\n");
    assert!(render_block(&dataset.documents[1], &dataset.schema, BlockKind::Labeled).is_empty());

    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("train.tsv");
    let written = write_tagger_file(&path, &dataset, BlockKind::Labeled).expect("write");
    assert_eq!(written, 2);
    assert_eq!(std::fs::read_to_string(&path).expect("read"), labeled_block);
}

#[test]
fn leading_hash_tokens_are_escaped_in_tagger_rows() {
    let labels = vec![doc_labels("d", vec![labeled("# 1", true), labeled("ok", false)])];
    let mut hinge = FamilyRows {
        family: FeatureFamily::Syntactic,
        attributes: vec![attribute("hinge_0_token", AttributeKind::String, FeatureFamily::Syntactic)],
        rows: Vec::new(),
    };
    for text in ["# 1", "ok"] {
        hinge.rows.push((
            LineId::from_tokens(&tokens(text)),
            vec![Feature::new("hinge_0_token", FeatureValue::Text(tokens(text)[0].clone()))],
        ));
    }
    let dataset = assemble(labels, vec![hinge]).expect("assemble");

    let block = render_block(&dataset.documents[0], &dataset.schema, BlockKind::Labeled);
    assert_eq!(block, "\\#\tT\nok\tF\n\n");
    assert!(block.lines().all(|row| !row.starts_with('#')));
}

#[test]
fn window_offsets_are_centred() {
    assert_eq!(window_offsets(5).collect::<Vec<_>>(), vec![-2, -1, 0, 1, 2]);
    assert_eq!(window_offsets(4).collect::<Vec<_>>(), vec![-2, -1, 0, 1]);
    assert_eq!(window_offsets(1).collect::<Vec<_>>(), vec![0]);
}

#[test]
fn pattern_file_combines_hinge_columns() {
    let tagger = LexiconTagger::new().expect("tagger");
    let stats = Statistics::default();
    let families = FamilySet {
        syntactic: true,
        stylistic: false,
        lexical: false,
        thematic: true,
    };
    let extractor = FeatureExtractor::new(&stats, &[], LexicalMode::Presence, &tagger, families);
    let schema = Schema {
        attributes: extractor.schema(),
    };

    let patterns = render_patterns(&schema, 1);
    let rows: Vec<&str> = patterns.lines().filter(|row| !row.is_empty()).collect();
    // six hinge groups of six templates plus the thematic unigram
    assert_eq!(rows.len(), 6 * 6 + 1);
    // one form across three positions: columns are position-major
    assert_eq!(
        &rows[..6],
        &[
            "*1:%x[0,0]",
            "*2:%x[0,3]",
            "*3:%x[0,6]",
            "*4:%x[0,0]/%x[0,3]",
            "*5:%x[0,3]/%x[0,6]",
            "*6:%x[0,0]/%x[0,3]/%x[0,6]",
        ]
    );
    assert_eq!(rows[6], "*7:%x[0,1]");
    assert_eq!(rows[18], "*19:%x[0,9]");
    assert_eq!(rows[23], "*24:%x[0,9]/%x[0,12]/%x[0,15]");
    assert_eq!(rows[36], "*37:%x[0,18]");
    // a blank line closes each nine-column block
    assert!(patterns.starts_with(&format!("{}\n\n", rows[..18].join("\n"))));

    let wide = render_patterns(&schema, 3);
    assert!(wide.contains("%x[-1,18]"));
    assert!(wide.contains("%x[+1,18]"));
}

#[test]
fn thinning_drops_interior_lines_from_labels() {
    let lines = vec![
        Line::new(RawLabel::B, tokens("hello"), 1, 5),
        Line::new(RawLabel::I, tokens("one"), 2, 5),
        Line::new(RawLabel::I, tokens("two"), 3, 5),
        Line::new(RawLabel::I, tokens("three"), 4, 5),
        Line::new(RawLabel::E, tokens("bye"), 5, 5),
    ];
    let document = Document {
        name: "d".to_string(),
        lines,
        metadata: None,
        thematic_labels: None,
        raw_line_count: 5,
    };

    let thinned = document_labels(&[&document], true);
    let texts: Vec<&str> = thinned[0].lines.iter().map(|l| l.text.as_str()).collect();
    assert_eq!(texts, vec!["hello", "one", "three", "bye"]);
    assert_eq!(document_labels(&[&document], false)[0].lines.len(), 5);
}

#[test]
fn extracted_families_assemble_without_gaps() {
    let tagger = LexiconTagger::new().expect("tagger");
    let document = Document {
        name: "d".to_string(),
        lines: vec![
            Line::new(RawLabel::B, tokens("Hi Bob"), 1, 3),
            Line::new(RawLabel::I, tokens("thanks"), 2, 3),
            Line::new(RawLabel::E, tokens("thanks"), 3, 3),
        ],
        metadata: None,
        thematic_labels: None,
        raw_line_count: 3,
    };
    let docs = vec![&document];
    let stats = Statistics::from_training(&document.lines, 0.0);
    let extractor =
        FeatureExtractor::new(&stats, &[], LexicalMode::Presence, &tagger, FamilySet::all());

    let families = extractor
        .families()
        .enabled()
        .into_iter()
        .map(|family| extract_family(&extractor, family, &docs, false))
        .collect();
    let dataset = assemble(document_labels(&docs, false), families).expect("assemble");

    assert_eq!(dataset.instance_count(), 3);
    assert_eq!(dataset.schema.attributes.len(), 18 + 24 + 1);
    assert_eq!(dataset.unique_instances().len(), 2);
}
