//! Annotation records link a disease (or gene) to one ontology term
//!
//! This module contains the [`AnnotationRecord`] that represents a single
//! line of an annotation file and [`EntityAnnotations`], the set of all
//! records of one disease.
//!
//! The underlying principle is the same as for the annotation data of the
//! HPO itself:
//! - Each disease has a unique identifier (the object accession).
//! - Each record connects the disease to exactly one term and carries
//!   additional metadata such as the evidence code.
//! - The records of one disease are grouped, with every term occurring
//!   only once.

mod entity;
mod record;

pub use entity::EntityAnnotations;
pub use record::{AnnotationRecord, GafFields};
