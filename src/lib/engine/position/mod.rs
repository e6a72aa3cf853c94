//! Genomic coordinates, with and without known alleles.

mod genomic;
mod reference;

pub use genomic::{compare_contigs, GenomicPosition};
pub use reference::ReferencePosition;
