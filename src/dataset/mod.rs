mod arff;
mod assemble;
mod identifier;
mod patterns;
mod tagger_format;
#[cfg(test)]
mod tests;

pub use arff::write_arff;
pub use assemble::{
    AssembledDocument, Dataset, Instance, Schema, assemble, document_labels, extract_family,
};
pub use identifier::LineId;
pub use patterns::write_patterns;
pub use tagger_format::{BlockKind, write_tagger_file};
