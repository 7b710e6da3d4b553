use super::syntactic::NULL_MARKER;
use super::*;
use crate::corpus::ThematicLabel;

fn line(raw: RawLabel, text: &str, position: usize, total: usize) -> Line {
    let tokens = text.split_whitespace().map(str::to_string).collect();
    Line::new(raw, tokens, position, total)
}

fn document(lines: Vec<Line>) -> Document {
    let raw_line_count = lines.len();
    Document {
        name: "doc".to_string(),
        lines,
        metadata: None,
        thematic_labels: Some(vec![ThematicLabel::Segment, ThematicLabel::Other]),
        raw_line_count,
    }
}

fn ngram(term: &str, idf: f64) -> SelectedNgram {
    SelectedNgram {
        term: term.to_string(),
        score: idf,
        idf,
    }
}

#[test]
fn tier_checks_run_in_fixed_order() {
    assert_eq!(Tier::classify(16.0, 10.0), Tier::Highest);
    assert_eq!(Tier::classify(15.0, 10.0), Tier::High);
    assert_eq!(Tier::classify(10.0, 10.0), Tier::High);
    assert_eq!(Tier::classify(9.0, 10.0), Tier::Low);
    // below half the average still lands on low
    assert_eq!(Tier::classify(1.0, 10.0), Tier::Low);
    // low is checked before lowest, so lowest is shadowed
    assert_eq!(Tier::classify(-3.0, -2.0), Tier::Low);
    assert_eq!(Tier::classify(0.0, 0.0), Tier::High);
}

#[test]
fn statistics_average_training_lines() {
    let lines = vec![
        line(RawLabel::B, "Hello Bob", 1, 2),
        line(RawLabel::I, "> quoted reply text", 2, 2),
    ];
    let stats = Statistics::from_training(&lines, 0.0);

    assert_eq!(stats.average(NumericFeature::NumberOfTokens), 3.0);
    assert_eq!(stats.average(NumericFeature::NumberOfQuoteSymbols), 0.5);
    assert_eq!(stats.average(NumericFeature::Position), 0.75);
    assert!(stats.is_relevant("anything"));
}

#[test]
fn occurrence_threshold_filters_rare_tokens() {
    let lines = vec![
        line(RawLabel::B, "the the the rare", 1, 2),
        line(RawLabel::I, "the end", 2, 2),
    ];
    let stats = Statistics::from_training(&lines, 0.25);

    // 6 tokens * 0.25 = 1.5 occurrences required
    assert!(stats.is_relevant("The"));
    assert!(!stats.is_relevant("rare"));
    assert!(!stats.is_relevant("unseen"));
}

#[test]
fn stylistic_features_follow_schema_order() {
    let tagger = LexiconTagger::new().expect("tagger");
    let current = line(RawLabel::B, "Where are you going ?", 1, 4);
    let stats = Statistics::from_training(std::slice::from_ref(&current), 0.0);

    let features = stylistic::stylistic_features(&current, &stats, &tagger);
    let names: Vec<String> = features.iter().map(|f| f.name.clone()).collect();
    let declared: Vec<String> = stylistic::attributes().into_iter().map(|a| a.name).collect();
    assert_eq!(features.len(), 24);
    assert_eq!(names, declared);

    let value = |name: &str| {
        features
            .iter()
            .find(|f| f.name == name)
            .map(|f| f.value.clone())
            .expect("feature present")
    };
    assert_eq!(value("position"), FeatureValue::Real(0.25));
    assert_eq!(value("number_of_tokens"), FeatureValue::Integer(5));
    assert_eq!(value("number_of_chars"), FeatureValue::Integer(21));
    assert_eq!(value("ends_with_question_mark"), FeatureValue::Bool(true));
    assert_eq!(value("has_early_punctuation"), FeatureValue::Bool(false));
    assert_eq!(value("has_interrogating_word"), FeatureValue::Bool(true));
    assert_eq!(value("starts_with_interrogating_form"), FeatureValue::Bool(true));
    assert_eq!(value("first_verb_form"), FeatureValue::Text("VBP".to_string()));
    assert_eq!(value("first_personal_pronoun"), FeatureValue::Text("YOU".to_string()));
    assert_eq!(value("contains_second_person_mark"), FeatureValue::Bool(true));
    assert_eq!(value("contains_first_person_mark"), FeatureValue::Bool(false));

    // numeric features carry a tier frozen against the training average
    let tiered: Vec<&Feature> = features.iter().filter(|f| f.tier.is_some()).collect();
    assert_eq!(tiered.len(), 8);
    assert!(tiered.iter().all(|f| f.tier == Some(Tier::High)));
}

#[test]
fn cue_words_match_whole_tokens() {
    let tagger = LexiconTagger::new().expect("tagger");
    let stats = Statistics::default();

    let plan = line(RawLabel::I, "I'll call , and we will see", 1, 1);
    let features = stylistic::stylistic_features(&plan, &stats, &tagger);
    let flag = |name: &str| {
        features
            .iter()
            .find(|f| f.name == name)
            .map(|f| f.value == FeatureValue::Bool(true))
            .unwrap_or(false)
    };
    assert!(flag("contains_plan_phrase"));
    assert!(flag("contains_modal_word"));
    assert!(flag("has_early_punctuation"));
    assert!(flag("contains_first_person_mark"));

    let other = line(RawLabel::I, "showhow whomever mayor", 1, 1);
    let features = stylistic::stylistic_features(&other, &stats, &tagger);
    assert!(
        features
            .iter()
            .filter(|f| f.name == "has_interrogating_word" || f.name == "contains_modal_word")
            .all(|f| f.value == FeatureValue::Bool(false))
    );
}

#[test]
fn hinge_features_fill_null_slots() {
    let tagger = LexiconTagger::new().expect("tagger");
    let stats = Statistics::default();
    let short = line(RawLabel::B, "Thanks Bob", 1, 1);

    let features = syntactic::hinge_features(&short, &stats, &tagger);
    assert_eq!(features.len(), 18);

    let text = |name: &str| match features.iter().find(|f| f.name == name).map(|f| &f.value) {
        Some(FeatureValue::Text(value)) => value.clone(),
        other => panic!("unexpected value for {name}: {other:?}"),
    };
    assert_eq!(text("hinge_0_token"), "Thanks");
    assert_eq!(text("hinge_1_token"), "Bob");
    assert_eq!(text("hinge_2_token"), NULL_MARKER);
    assert_eq!(text("hinge_2_tag"), NULL_MARKER);
    assert_eq!(text("hinge_-3_lemma"), NULL_MARKER);
    assert_eq!(text("hinge_-2_token"), "Thanks");
    assert_eq!(text("hinge_-1_token"), "Bob");
    assert_eq!(text("hinge_-1_tag"), "NNP");
}

#[test]
fn hinge_features_skip_infrequent_tokens() {
    let tagger = LexiconTagger::new().expect("tagger");
    let training = vec![line(RawLabel::B, "see you see you see you rare", 1, 1)];
    let stats = Statistics::from_training(&training, 0.2);

    let features = syntactic::hinge_features(&training[0], &stats, &tagger);
    let first = features.iter().find(|f| f.name == "hinge_-1_token").expect("slot");
    assert_eq!(first.value, FeatureValue::Text("you".to_string()));
}

#[test]
fn lexical_presence_and_weight_modes() {
    let current = line(RawLabel::I, "Thank you very much", 1, 1);
    let ngrams = vec![ngram("thank you", 2.0), ngram("regards", 1.0)];

    let presence = lexical::lexical_features(&current, &ngrams, LexicalMode::Presence);
    assert_eq!(presence[0].name, "ngram_1");
    assert_eq!(presence[0].value, FeatureValue::Bool(true));
    assert_eq!(presence[1].value, FeatureValue::Bool(false));

    let weight = lexical::lexical_features(&current, &ngrams, LexicalMode::Weight);
    assert_eq!(weight[0].value, FeatureValue::Real(0.5));
    assert_eq!(weight[1].value, FeatureValue::Real(0.0));
    assert_eq!(
        lexical::attributes(2, LexicalMode::Weight)[1].kind,
        AttributeKind::Real
    );
}

#[test]
fn thematic_feature_reads_document_labels() {
    let doc = document(vec![
        line(RawLabel::B, "Hi", 1, 3),
        line(RawLabel::I, "there", 2, 3),
        line(RawLabel::E, "bye", 3, 3),
    ]);
    let values: Vec<FeatureValue> = LineContext::of_document(&doc)
        .flat_map(|ctx| thematic::thematic_features(&ctx))
        .map(|f| f.value)
        .collect();

    let nominal = |value: &'static str| FeatureValue::Nominal {
        value,
        domain: &["S", "O"],
    };
    assert_eq!(values, vec![nominal("S"), nominal("O"), nominal("O")]);
}

#[test]
fn feature_vector_rejects_duplicate_names() {
    let mut vector = FeatureVector::default();
    vector
        .push(Feature::new("a", FeatureValue::Bool(true)))
        .expect("first insert");
    let err = vector
        .push(Feature::new("a", FeatureValue::Bool(false)))
        .expect_err("duplicate should fail");
    assert!(matches!(err, PipelineError::DuplicateFeature(name) if name == "a"));
    assert_eq!(vector.names(), vec!["a"]);
    assert_eq!(vector.get("a").map(|f| &f.value), Some(&FeatureValue::Bool(true)));
}

#[test]
fn wide_feature_vector_keeps_order_and_lookups() {
    let width = 5000;
    let mut vector = FeatureVector::default();
    vector
        .extend((0..width).map(|i| Feature::new(format!("ngram_{i}"), FeatureValue::Integer(i))))
        .expect("distinct names");

    let names = vector.names();
    assert_eq!(names.len(), width as usize);
    assert_eq!(names[0], "ngram_0");
    assert_eq!(names[4999], "ngram_4999");
    assert_eq!(
        vector.get("ngram_2500").map(|f| &f.value),
        Some(&FeatureValue::Integer(2500))
    );
    assert!(vector.get("ngram_5000").is_none());

    let err = vector
        .push(Feature::new("ngram_17", FeatureValue::Integer(-1)))
        .expect_err("duplicate at the end");
    assert!(matches!(err, PipelineError::DuplicateFeature(ref name) if name == "ngram_17"));
    assert_eq!(vector.names().len(), width as usize);
}

#[test]
fn extractor_schema_matches_extracted_names() {
    let tagger = LexiconTagger::new().expect("tagger");
    let doc = document(vec![
        line(RawLabel::B, "Hi Bob ,", 1, 2),
        line(RawLabel::I, "see you soon", 2, 2),
    ]);
    let stats = Statistics::from_training(&doc.lines, 0.0);
    let ngrams = vec![ngram("see you", 1.0)];
    let extractor = FeatureExtractor::new(
        &stats,
        &ngrams,
        LexicalMode::Presence,
        &tagger,
        FamilySet::all(),
    );

    let schema: Vec<String> = extractor.schema().into_iter().map(|a| a.name).collect();
    assert_eq!(schema.len(), 18 + 24 + 1 + 1);
    for ctx in LineContext::of_document(&doc) {
        let vector = extractor.extract(&ctx).expect("extract");
        assert_eq!(vector.names(), schema.iter().map(String::as_str).collect::<Vec<_>>());
    }
}

#[test]
fn interior_lines_need_inner_neighbours() {
    let doc = document(vec![
        line(RawLabel::B, "a", 1, 4),
        line(RawLabel::I, "b", 2, 4),
        line(RawLabel::I, "c", 3, 4),
        line(RawLabel::I, "d", 4, 4),
    ]);
    let interior: Vec<bool> = LineContext::of_document(&doc)
        .map(|ctx| ctx.is_interior())
        .collect();
    assert_eq!(interior, vec![false, false, true, false]);
}
