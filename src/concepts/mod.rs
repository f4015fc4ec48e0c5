//! Concept table module.
//!
//! The concept table is the contract between the two stages: the extract
//! stage writes it, the index stage reads it. Each row pairs a canonical index
//! entry (`concept`) with one literal trigger (`match`) and a relevance
//! `weight`.
//!
//! # Example
//!
//! ```
//! use texindex_core::concepts::{ConceptEntry, ConceptTable};
//!
//! let mut table = ConceptTable::new();
//! table.push(ConceptEntry::new("neural network", "neural networks", 3.5));
//!
//! let mut csv = Vec::new();
//! table.to_writer(&mut csv).unwrap();
//! let loaded = ConceptTable::from_reader(csv.as_slice()).unwrap();
//! assert_eq!(loaded, table);
//! ```

mod error;
mod table;

pub use error::{TableError, ValidationWarning};
pub use table::{ConceptEntry, ConceptTable};
