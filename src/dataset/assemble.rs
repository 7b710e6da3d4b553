use std::collections::{BTreeSet, HashMap, VecDeque};

use rayon::prelude::*;

use super::LineId;
use crate::corpus::Document;
use crate::error::{PipelineError, PipelineResult};
use crate::features::{
    Attribute, Feature, FeatureExtractor, FeatureFamily, FeatureVector, LineContext,
};

/// Label side of the join: one entry per kept line, in document order.
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledLine {
    pub id: LineId,
    pub boundary: bool,
    /// Original token text, kept for the origin export.
    pub text: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DocumentLabels {
    pub name: String,
    pub lines: Vec<LabeledLine>,
}

/// Output of one feature family pass.
#[derive(Debug, Clone)]
pub struct FamilyRows {
    pub family: FeatureFamily,
    pub attributes: Vec<Attribute>,
    pub rows: Vec<(LineId, Vec<Feature>)>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Schema {
    pub attributes: Vec<Attribute>,
}

impl Schema {
    pub fn names(&self) -> Vec<&str> {
        self.attributes.iter().map(|a| a.name.as_str()).collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Instance {
    pub id: LineId,
    pub label: bool,
    pub text: String,
    pub features: FeatureVector,
}

impl Instance {
    pub fn feature(&self, name: &str) -> Option<&Feature> {
        self.features.get(name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AssembledDocument {
    pub name: String,
    pub instances: Vec<Instance>,
}

#[derive(Debug, Clone)]
pub struct Dataset {
    pub schema: Schema,
    pub documents: Vec<AssembledDocument>,
}

impl Dataset {
    pub fn instance_count(&self) -> usize {
        self.documents.iter().map(|doc| doc.instances.len()).sum()
    }

    /// First occurrence of every distinct line id, in document order.
    pub fn unique_instances(&self) -> Vec<&Instance> {
        let mut seen = BTreeSet::new();
        self.documents
            .iter()
            .flat_map(|doc| doc.instances.iter())
            .filter(|instance| seen.insert(instance.id.clone()))
            .collect()
    }
}

/// Lines of `document` that enter the dataset. With `thin_interior`, `I`
/// lines whose neighbours are both `I` are dropped.
pub fn observed_contexts(document: &Document, thin_interior: bool) -> Vec<LineContext<'_>> {
    LineContext::of_document(document)
        .filter(|context| !(thin_interior && context.is_interior()))
        .collect()
}

pub fn document_labels(documents: &[&Document], thin_interior: bool) -> Vec<DocumentLabels> {
    documents
        .iter()
        .map(|document| DocumentLabels {
            name: document.name.clone(),
            lines: observed_contexts(document, thin_interior)
                .into_iter()
                .map(|context| LabeledLine {
                    id: LineId::of_line(context.line),
                    boundary: context.line.boundary,
                    text: context.line.text(),
                })
                .collect(),
        })
        .collect()
}

/// Runs one family over every document, fanning out per document.
pub fn extract_family(
    extractor: &FeatureExtractor<'_>,
    family: FeatureFamily,
    documents: &[&Document],
    thin_interior: bool,
) -> FamilyRows {
    let blocks: Vec<Vec<(LineId, Vec<Feature>)>> = documents
        .par_iter()
        .map(|document| {
            observed_contexts(document, thin_interior)
                .iter()
                .map(|context| (LineId::of_line(context.line), extractor.family(family, context)))
                .collect()
        })
        .collect();

    FamilyRows {
        family,
        attributes: extractor.attributes(family),
        rows: blocks.into_iter().flatten().collect(),
    }
}

/// Joins the label sequence with every family's rows by line id. Repeated
/// ids are matched occurrence by occurrence. Any id without a partner on
/// the other side fails the whole assembly.
pub fn assemble(labels: Vec<DocumentLabels>, families: Vec<FamilyRows>) -> PipelineResult<Dataset> {
    let mut families = families;
    families.sort_by_key(|rows| {
        FeatureFamily::ORDER
            .iter()
            .position(|family| *family == rows.family)
            .unwrap_or(usize::MAX)
    });

    let schema = Schema {
        attributes: families
            .iter()
            .flat_map(|rows| rows.attributes.iter().cloned())
            .collect(),
    };

    let mut queues: Vec<HashMap<LineId, VecDeque<Vec<Feature>>>> = families
        .into_iter()
        .map(|rows| {
            let mut queue = HashMap::<LineId, VecDeque<Vec<Feature>>>::new();
            for (id, features) in rows.rows {
                queue.entry(id).or_default().push_back(features);
            }
            queue
        })
        .collect();

    let mut missing = BTreeSet::<String>::new();
    let mut documents = Vec::with_capacity(labels.len());
    for document in labels {
        let mut instances = Vec::with_capacity(document.lines.len());
        for line in document.lines {
            let mut features = FeatureVector::default();
            let mut complete = true;
            for queue in &mut queues {
                match queue.get_mut(&line.id).and_then(VecDeque::pop_front) {
                    Some(row) => features.extend(row)?,
                    None => complete = false,
                }
            }
            if !complete {
                missing.insert(line.id.to_string());
                continue;
            }
            instances.push(Instance {
                id: line.id,
                label: line.boundary,
                text: line.text,
                features,
            });
        }
        documents.push(AssembledDocument {
            name: document.name,
            instances,
        });
    }

    for queue in &queues {
        for (id, rows) in queue {
            if !rows.is_empty() {
                missing.insert(id.to_string());
            }
        }
    }

    let expected = schema.names();
    for instance in documents.iter().flat_map(|doc| doc.instances.iter()) {
        if instance.features.names() != expected {
            missing.insert(instance.id.to_string());
        }
    }

    if !missing.is_empty() {
        return Err(PipelineError::DatasetInconsistency {
            missing: missing.into_iter().collect(),
        });
    }

    Ok(Dataset { schema, documents })
}
