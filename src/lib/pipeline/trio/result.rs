//! Per-candidate trio verdicts.

use super::classify::{looks_biallelic, looks_denovo, de_novo_allele, MIN_HAPLOTYPE_CONCORDANCE};
use super::haplotype::HaplotypeResult;
use crate::engine::allele::{PileAllele, SnpAllele};
use crate::engine::pileup::Pileup;
use crate::engine::position::ReferencePosition;

pub const REASON_NOT_BIALLELIC: &str = "Not biallelic heterozygote";
pub const REASON_NOT_DENOVO: &str = "Not denovo";
pub const REASON_OTHER_DENOVOS: &str = "Other denovos in region";
pub const REASON_LOW_CONCORDANCE: &str = "Haplotype Concordance < 0.75";
pub const REASON_TRIALLELICS: &str = "Triallelics in region";
pub const REASON_NONE: &str = ".";

/// Sample names of a trio.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrioIds {
    pub child: String,
    pub parent1: String,
    pub parent2: String,
}

/// The three pileups at one candidate.
#[derive(Debug, Clone, Copy)]
pub struct TrioPileups<'a> {
    pub child: &'a Pileup,
    pub parent1: &'a Pileup,
    pub parent2: &'a Pileup,
}

/// Depth summary of one sample at a candidate, relative to the child's A1/A2.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleSummary {
    pub id: String,
    pub raw_depth: u32,
    pub ref_raw_depth: u32,
    pub alt_raw_depth: Option<u32>,
    pub a1_raw_depth: u32,
    pub a2_raw_depth: u32,
    /// Raw depth of A, T, C, G.
    pub base_raw_depths: [u32; 4],
    pub a1_clipped: u32,
    pub a2_clipped: u32,
    pub a1_last_position: u32,
    pub a2_last_position: u32,
    pub a1_apparent_mismap: u32,
    pub a2_apparent_mismap: u32,
    pub a1_unmapped_mate: u32,
    pub a2_unmapped_mate: u32,
    pub weighted_depth: f64,
    pub ref_weighted_depth: f64,
    pub alt_weighted_depth: Option<f64>,
    pub a1_weighted_depth: f64,
    pub a2_weighted_depth: f64,
    /// Weighted depth of A, T, C, G.
    pub base_weighted_depths: [f64; 4],
}

impl SampleSummary {
    pub fn new(
        id: &str,
        pileup: &Pileup,
        reference: &ReferencePosition,
        a1: Option<&PileAllele>,
        a2: Option<&PileAllele>,
    ) -> Self {
        let count = |allele: Option<&PileAllele>, f: fn(&Pileup, &PileAllele) -> u32| {
            allele.map_or(0, |a| f(pileup, a))
        };
        let weight = |allele: Option<&PileAllele>| allele.map_or(0.0, |a| pileup.weighted_depth(a));
        let bases = SnpAllele::CALLED.map(PileAllele::Snp);
        Self {
            id: id.to_string(),
            raw_depth: pileup.raw_total_depth(),
            ref_raw_depth: pileup.raw_depth(reference.ref_allele()),
            alt_raw_depth: reference.alt_allele().map(|a| pileup.raw_depth(a)),
            a1_raw_depth: count(a1, Pileup::raw_depth),
            a2_raw_depth: count(a2, Pileup::raw_depth),
            base_raw_depths: [
                pileup.raw_depth(&bases[0]),
                pileup.raw_depth(&bases[1]),
                pileup.raw_depth(&bases[2]),
                pileup.raw_depth(&bases[3]),
            ],
            a1_clipped: count(a1, Pileup::clipped_count),
            a2_clipped: count(a2, Pileup::clipped_count),
            a1_last_position: count(a1, Pileup::last_position_count),
            a2_last_position: count(a2, Pileup::last_position_count),
            a1_apparent_mismap: count(a1, Pileup::apparent_mismap_count),
            a2_apparent_mismap: count(a2, Pileup::apparent_mismap_count),
            a1_unmapped_mate: count(a1, Pileup::unmapped_mate_count),
            a2_unmapped_mate: count(a2, Pileup::unmapped_mate_count),
            weighted_depth: pileup.weighted_total_depth(),
            ref_weighted_depth: pileup.weighted_depth(reference.ref_allele()),
            alt_weighted_depth: reference.alt_allele().map(|a| pileup.weighted_depth(a)),
            a1_weighted_depth: weight(a1),
            a2_weighted_depth: weight(a2),
            base_weighted_depths: [
                pileup.weighted_depth(&bases[0]),
                pileup.weighted_depth(&bases[1]),
                pileup.weighted_depth(&bases[2]),
                pileup.weighted_depth(&bases[3]),
            ],
        }
    }
}

/// Everything known about one candidate. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct DeNovoResult {
    pub reference: ReferencePosition,
    pub allele1: Option<PileAllele>,
    pub allele2: Option<PileAllele>,
    pub de_novo_allele: Option<PileAllele>,
    /// Whether the de novo allele is the reference allele.
    pub de_novo_is_ref: Option<bool>,
    pub biallelic_heterozygote: bool,
    pub de_novo: bool,
    pub super_novo: bool,
    pub non_super_novo_reason: &'static str,
    pub haplotype: HaplotypeResult,
    pub child: SampleSummary,
    pub parent1: SampleSummary,
    pub parent2: SampleSummary,
}

impl DeNovoResult {
    pub fn new(
        reference: ReferencePosition,
        haplotype: HaplotypeResult,
        ids: &TrioIds,
        pileups: TrioPileups<'_>,
    ) -> Self {
        let depth = pileups.child.depth();
        let (a1, a2) = (depth.a1(), depth.a2());

        let biallelic_heterozygote = looks_biallelic(pileups.child);
        let de_novo = looks_denovo(pileups.child, pileups.parent1, pileups.parent2);
        let de_novo_allele = de_novo_allele(pileups.child, pileups.parent1, pileups.parent2);
        let de_novo_is_ref = de_novo_allele
            .as_ref()
            .map(|allele| allele == reference.ref_allele());

        let non_super_novo_reason = if !biallelic_heterozygote {
            REASON_NOT_BIALLELIC
        } else if !de_novo {
            REASON_NOT_DENOVO
        } else if haplotype.other_de_novos > 0 {
            REASON_OTHER_DENOVOS
        } else if haplotype.mean_concordance() < MIN_HAPLOTYPE_CONCORDANCE {
            REASON_LOW_CONCORDANCE
        } else if haplotype.other_triallelics > 0 {
            REASON_TRIALLELICS
        } else {
            REASON_NONE
        };

        Self {
            child: SampleSummary::new(&ids.child, pileups.child, &reference, a1, a2),
            parent1: SampleSummary::new(&ids.parent1, pileups.parent1, &reference, a1, a2),
            parent2: SampleSummary::new(&ids.parent2, pileups.parent2, &reference, a1, a2),
            allele1: a1.cloned(),
            allele2: a2.cloned(),
            de_novo_allele,
            de_novo_is_ref,
            biallelic_heterozygote,
            de_novo,
            super_novo: non_super_novo_reason == REASON_NONE,
            non_super_novo_reason,
            haplotype,
            reference,
        }
    }

    pub fn mean_haplotype_concordance(&self) -> f64 {
        self.haplotype.mean_concordance()
    }
}
