use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use super::{Dataset, Instance};
use crate::corpus::boundary_symbol;
use crate::features::{Attribute, AttributeKind, FeatureValue, bool_symbol};

fn quote(value: &str) -> String {
    format!("'{}'", value.replace('\\', "\\\\").replace('\'', "\\'"))
}

fn quote_name(name: &str) -> String {
    if name.chars().any(|c| c.is_whitespace() || matches!(c, '{' | '}' | ',' | '%' | '\'')) {
        quote(name)
    } else {
        name.to_string()
    }
}

pub(super) fn format_real(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 {
        format!("{value:.1}")
    } else {
        format!("{value}")
    }
}

fn attribute_type(kind: AttributeKind) -> String {
    match kind {
        AttributeKind::Integer => "INTEGER".to_string(),
        AttributeKind::Real => "REAL".to_string(),
        AttributeKind::Nominal(domain) => format!("{{{}}}", domain.join(",")),
        AttributeKind::String => "STRING".to_string(),
    }
}

fn cell(instance: &Instance, attribute: &Attribute) -> String {
    let Some(feature) = instance.feature(&attribute.name) else {
        return if attribute.kind.is_numeric() {
            "0.0".to_string()
        } else {
            "?".to_string()
        };
    };

    match &feature.value {
        FeatureValue::Integer(value) => value.to_string(),
        FeatureValue::Real(value) => format_real(*value),
        FeatureValue::Bool(value) => bool_symbol(*value).to_string(),
        FeatureValue::Nominal { value, .. } => (*value).to_string(),
        FeatureValue::Text(value) => quote(value),
    }
}

/// Renders the dataset as ARFF. One row per distinct line id; unlabeled
/// exports keep the class declaration and write `?` in the class cell.
pub fn render_arff(dataset: &Dataset, relation: &str, with_class: bool) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "@relation {}", quote_name(relation));
    out.push('\n');

    for attribute in &dataset.schema.attributes {
        let _ = writeln!(
            out,
            "@attribute {} {}",
            quote_name(&attribute.name),
            attribute_type(attribute.kind)
        );
    }
    let _ = writeln!(
        out,
        "@attribute class {{{},{}}}",
        boundary_symbol(false),
        boundary_symbol(true)
    );

    out.push_str("\n@data\n");
    for instance in dataset.unique_instances() {
        let mut cells: Vec<String> = dataset
            .schema
            .attributes
            .iter()
            .map(|attribute| cell(instance, attribute))
            .collect();
        cells.push(if with_class {
            boundary_symbol(instance.label).to_string()
        } else {
            "?".to_string()
        });
        out.push_str(&cells.join(","));
        out.push('\n');
    }
    out
}

pub fn write_arff(path: &Path, dataset: &Dataset, relation: &str, with_class: bool) -> Result<()> {
    fs::write(path, render_arff(dataset, relation, with_class))
        .with_context(|| format!("failed to write arff file: {}", path.display()))
}
