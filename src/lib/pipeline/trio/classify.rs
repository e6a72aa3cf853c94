//! Per-position classification rules for trio pileups.

use rustc_hash::FxHashSet;

use crate::engine::allele::PileAllele;
use crate::engine::pileup::{AlleleSlot, Depth, Pileup};

/// Minimum weighted depth over the two main alleles.
pub const MIN_DEPTH: f64 = 10.0;
/// Minimum weighted depth of each of the two main alleles.
pub const MIN_ALLELIC_DEPTH: f64 = 4.0;
/// Minimum weighted share of the lighter main allele.
pub const MIN_ALLELIC_FRAC: f64 = 0.1;
/// An allele at or below this raw share is treated as a miscall.
pub const MAX_MISCALL_RATIO: f64 = 0.05;
/// An allele with at most this many reads is treated as a miscall.
pub const MAX_MISCALL_WEIGHT: f64 = 1.0;
/// Minimum mean read concordance with nearby heterozygous sites.
pub const MIN_HAPLOTYPE_CONCORDANCE: f64 = 0.75;

/// Two well-supported alleles.
pub fn looks_variant(depth: &Depth<'_>) -> bool {
    depth.bi_alleles().len() == 2
        && depth.weighted_biallelic_depth() >= MIN_DEPTH
        && depth.weighted_minor_allele_fraction() >= MIN_ALLELIC_FRAC
        && depth.slot_weighted_depth(AlleleSlot::A1) >= MIN_ALLELIC_DEPTH
        && depth.slot_weighted_depth(AlleleSlot::A2) >= MIN_ALLELIC_DEPTH
}

/// Alleles with more than a miscall's worth of reads.
pub fn viable_alleles(pileup: &Pileup) -> FxHashSet<PileAllele> {
    let total = f64::from(pileup.raw_total_depth());
    pileup
        .raw_depths()
        .filter(|(_, count)| {
            let count = f64::from(*count);
            count > MAX_MISCALL_WEIGHT && count / total > MAX_MISCALL_RATIO
        })
        .map(|(allele, _)| allele.clone())
        .collect()
}

pub fn more_than_two_viable_alleles(pileup: &Pileup) -> bool {
    viable_alleles(pileup).len() > 2
}

pub fn looks_biallelic(pileup: &Pileup) -> bool {
    looks_variant(&pileup.depth()) && !more_than_two_viable_alleles(pileup)
}

fn parental_alleles(parent1: &Pileup, parent2: &Pileup) -> FxHashSet<PileAllele> {
    let mut alleles = viable_alleles(parent1);
    alleles.extend(viable_alleles(parent2));
    alleles
}

/// A child main allele that neither parent carries.
pub fn looks_denovo(child: &Pileup, parent1: &Pileup, parent2: &Pileup) -> bool {
    let parents = parental_alleles(parent1, parent2);
    child
        .depth()
        .bi_alleles()
        .iter()
        .any(|allele| !parents.contains(*allele))
}

/// The child main allele missing from both parents, when exactly one is.
pub fn de_novo_allele(child: &Pileup, parent1: &Pileup, parent2: &Pileup) -> Option<PileAllele> {
    let parents = parental_alleles(parent1, parent2);
    let depth = child.depth();
    let mut missing = depth
        .bi_alleles()
        .into_iter()
        .filter(|allele| !parents.contains(*allele));
    match (missing.next(), missing.next()) {
        (Some(allele), None) => Some(allele.clone()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::pileup::tests::weighted_pileup;
    use crate::engine::position::GenomicPosition;

    fn pile(alleles: &[(u8, f64, u32)]) -> Pileup {
        weighted_pileup(GenomicPosition::new("chr1", 100), alleles)
    }

    #[test]
    fn total_depth_boundary() {
        assert!(looks_variant(&pile(&[(b'A', 6.0, 6), (b'G', 4.0, 4)]).depth()));
        assert!(!looks_variant(&pile(&[(b'A', 5.999, 6), (b'G', 4.0, 4)]).depth()));
    }

    #[test]
    fn minor_fraction_boundary() {
        let exact = pile(&[(b'A', 9.0, 9), (b'G', 1.0, 1)]);
        assert!(exact.depth().weighted_minor_allele_fraction() >= MIN_ALLELIC_FRAC);
        let below = pile(&[(b'A', 9.01, 9), (b'G', 0.99, 1)]);
        assert!(below.depth().weighted_minor_allele_fraction() < MIN_ALLELIC_FRAC);
        // The minor allele of {9, 1} still falls short of the per-allele floor.
        assert!(!looks_variant(&exact.depth()));
        assert!(looks_variant(&pile(&[(b'A', 36.0, 36), (b'G', 4.0, 4)]).depth()));
        assert!(!looks_variant(&pile(&[(b'A', 36.1, 36), (b'G', 4.0, 4)]).depth()));
    }

    #[test]
    fn per_allele_depth_boundary() {
        assert!(!looks_variant(&pile(&[(b'A', 20.0, 20), (b'G', 3.99, 4)]).depth()));
        assert!(!looks_variant(&pile(&[(b'A', 20.0, 20)]).depth()));
    }

    #[test]
    fn viability_needs_more_than_one_read_and_five_percent() {
        let one_in_twenty = pile(&[(b'A', 19.0, 19), (b'G', 1.0, 1)]);
        assert!(!viable_alleles(&one_in_twenty).contains(&PileAllele::snp(b'G')));
        let two_in_33 = pile(&[(b'A', 31.0, 31), (b'G', 2.0, 2)]);
        assert!(viable_alleles(&two_in_33).contains(&PileAllele::snp(b'G')));
        let two_in_40 = pile(&[(b'A', 38.0, 38), (b'G', 2.0, 2)]);
        assert!(!viable_alleles(&two_in_40).contains(&PileAllele::snp(b'G')));
    }

    #[test]
    fn triallelic_sites_are_not_biallelic() {
        let tri = pile(&[(b'A', 10.0, 10), (b'G', 8.0, 8), (b'T', 3.0, 3)]);
        assert!(looks_variant(&tri.depth()));
        assert!(more_than_two_viable_alleles(&tri));
        assert!(!looks_biallelic(&tri));
        let bi = pile(&[(b'A', 10.0, 10), (b'G', 8.0, 8), (b'T', 1.0, 1)]);
        assert!(looks_biallelic(&bi));
    }

    #[test]
    fn de_novo_allele_is_the_one_the_parents_lack() {
        let child = pile(&[(b'A', 12.0, 12), (b'G', 8.0, 8)]);
        let parent = pile(&[(b'A', 20.0, 20)]);
        assert!(looks_denovo(&child, &parent, &parent));
        assert_eq!(de_novo_allele(&child, &parent, &parent), Some(PileAllele::snp(b'G')));

        let carrier = pile(&[(b'A', 10.0, 10), (b'G', 10.0, 10)]);
        assert!(!looks_denovo(&child, &parent, &carrier));
        assert_eq!(de_novo_allele(&child, &parent, &carrier), None);

        let other = pile(&[(b'C', 20.0, 20)]);
        assert!(looks_denovo(&child, &other, &other));
        assert_eq!(de_novo_allele(&child, &other, &other), None);
    }
}
