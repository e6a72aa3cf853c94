//! Trio de novo screening.
//!
//! Candidates (heterozygous child calls from a VCF, or every covered reference base) are piled
//! up in the child and both parents. Sites where the child looks variant are classified and
//! checked against nearby heterozygous sites on the same reads; the outcome of each is a
//! [`DeNovoResult`].

pub mod candidates;
pub mod classify;
pub mod evaluator;
pub mod haplotype;
pub mod output;
pub mod result;

pub use candidates::{ReferenceBases, ReferenceWindow, VariantCall};
pub use evaluator::{BamTrioProcessor, CandidateOutcome, CandidateSource, TrioBams, TrioEvaluator};
pub use haplotype::{HaplotypeEvaluator, HaplotypeResult};
pub use output::{write_table, write_vcf};
pub use result::{DeNovoResult, SampleSummary, TrioIds};

use log::info;

use crate::core::error::Result;
use crate::engine::par_contigs::{collect_ordered, ParContigs};

/// Evaluate every contig in parallel; results come back in dictionary and position order.
pub fn find_de_novos(processor: BamTrioProcessor, threads: Option<usize>) -> Result<Vec<DeNovoResult>> {
    let tasks = processor.tasks();
    let results = collect_ordered(ParContigs::new(tasks, threads, processor)?.process())?;
    let super_novos = results.iter().filter(|r| r.super_novo).count();
    info!(
        "{} candidate sites evaluated, {} supernovo",
        results.len(),
        super_novos
    );
    Ok(results)
}
