use super::{Attribute, AttributeKind, Feature, FeatureFamily, FeatureValue, PosTagger, Statistics};
use crate::corpus::Line;

pub const HINGE_POSITIONS: [isize; 6] = [0, 1, 2, -3, -2, -1];
pub const HINGE_FORMS: [&str; 3] = ["token", "lemma", "tag"];
pub const NULL_MARKER: &str = "@NULL";

fn hinge_name(position: isize, form: &str) -> String {
    format!("hinge_{position}_{form}")
}

pub(super) fn attributes() -> Vec<Attribute> {
    HINGE_POSITIONS
        .iter()
        .flat_map(|position| {
            HINGE_FORMS.iter().map(move |form| Attribute {
                name: hinge_name(*position, form),
                kind: AttributeKind::String,
                family: FeatureFamily::Syntactic,
            })
        })
        .collect()
}

/// Surface form, lemma and tag at the leading and trailing hinge positions
/// of the frequency-filtered tokens. Always 18 features.
pub(super) fn hinge_features(
    line: &Line,
    statistics: &Statistics,
    tagger: &dyn PosTagger,
) -> Vec<Feature> {
    let relevant: Vec<String> = line
        .tokens
        .iter()
        .filter(|token| statistics.is_relevant(token))
        .cloned()
        .collect();
    let tagged = tagger.tag_and_lemmatize(&relevant);
    let len = tagged.len() as isize;

    let mut features = Vec::with_capacity(HINGE_POSITIONS.len() * HINGE_FORMS.len());
    for position in HINGE_POSITIONS {
        let index = if position < 0 { len + position } else { position };
        let slot = (0..len).contains(&index).then(|| &tagged[index as usize]);

        let values = match slot {
            Some(tagged) => [
                tagged.token.clone(),
                tagged.lemma.clone(),
                tagged.tag.clone(),
            ],
            None => [NULL_MARKER.to_string(), NULL_MARKER.to_string(), NULL_MARKER.to_string()],
        };

        for (form, value) in HINGE_FORMS.iter().zip(values) {
            features.push(Feature::new(hinge_name(position, form), FeatureValue::Text(value)));
        }
    }

    features
}
