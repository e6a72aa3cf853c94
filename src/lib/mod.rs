//! supernovo: read-level de novo mutation screening for parent/child trios
//!
//! The library piles up aligned reads of a child and both parents at candidate sites, decides
//! whether the child carries an allele neither parent does, and checks that call against nearby
//! heterozygous sites on the same reads.
//!
//! # Modules
//!
//! - [`core`]: errors, I/O helpers, thread configuration and read filters
//! - [`engine`]: positions, alleles, read sources, target regions, pileups and the pileup cache,
//!   and per-contig parallel execution
//! - [`pipeline`]: the trio evaluation itself and the allele-ratio histogram

pub mod core;
pub mod engine;
pub mod pipeline;

pub mod prelude {
    pub use crate::core::prelude::*;
    pub use crate::engine::{
        GenomicPosition, Pileup, PileupCache, PileupSource, ReferencePosition, TargetRegions,
    };
    pub use crate::pipeline::prelude::*;
}
