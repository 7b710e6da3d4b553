use super::{Attribute, AttributeKind, Feature, FeatureFamily, FeatureValue, LineContext};

pub const THEMATIC_FEATURE: &str = "text_tiling_boundary";
const DOMAIN: &[&str] = &["S", "O"];

pub(super) fn attributes() -> Vec<Attribute> {
    vec![Attribute {
        name: THEMATIC_FEATURE.to_string(),
        kind: AttributeKind::Nominal(DOMAIN),
        family: FeatureFamily::Thematic,
    }]
}

pub(super) fn thematic_features(context: &LineContext<'_>) -> Vec<Feature> {
    let label = context.document.thematic_label(context.line.position);
    vec![Feature::new(
        THEMATIC_FEATURE,
        FeatureValue::Nominal {
            value: label.as_str(),
            domain: DOMAIN,
        },
    )]
}
