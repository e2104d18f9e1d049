//! Ontology term identifiers and the lookup of known terms
//!
//! The ontology itself (term names, parents, children) is not part of this
//! crate. Annotation parsing only needs to build [`TermId`]s and, optionally,
//! ask a [`TermLookup`] whether a term is known or has been replaced.

mod catalog;
mod termid;

pub use catalog::{TermCatalog, TermLookup};
pub use termid::{PrefixPool, TermId};
