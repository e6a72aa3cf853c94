//! The pileup engine: positions, alleles, reads, regions, pileups and per-contig scheduling.

pub mod allele;
pub mod par_contigs;
pub mod pileup;
pub mod position;
pub mod reads;
pub mod regions;

pub use par_contigs::{collect_ordered, ContigProcessor, ContigTask, ParContigs};
pub use pileup::{Pileup, PileupCache, PileupSource};
pub use position::{GenomicPosition, ReferencePosition};
pub use regions::TargetRegions;
