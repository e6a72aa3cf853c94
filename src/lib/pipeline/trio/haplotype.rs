//! Read-level haplotype checks around a candidate site.
//!
//! A genuine heterozygous variant splits the reads the same way as nearby heterozygous sites:
//! reads carrying one candidate allele carry one neighbouring allele. The evaluator scans the
//! child's pileups within one read length of the candidate and records, for every nearby
//! biallelic site, the share of reads consistent with a two-haplotype split.

use log::trace;
use rustc_hash::FxHashSet;

use super::classify::{
    looks_denovo, looks_variant, more_than_two_viable_alleles, MIN_HAPLOTYPE_CONCORDANCE,
};
use crate::core::error::Result;
use crate::engine::pileup::{AlleleSlot, Pileup, PileupSource, READ_LENGTH};
use crate::engine::position::GenomicPosition;

/// Distance scanned either side of a candidate.
pub const HAPLOTYPE_SEARCH_DISTANCE: u32 = READ_LENGTH;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct HaplotypeResult {
    pub other_variants: u32,
    pub other_triallelics: u32,
    pub other_biallelics: u32,
    /// De novo sites chained directly to the candidate.
    pub adjacent_de_novos: u32,
    pub other_de_novos: u32,
    pub concordances: Vec<f64>,
}

impl HaplotypeResult {
    /// Mean of the concordances, or 1.0 when there were none.
    pub fn mean_concordance(&self) -> f64 {
        if self.concordances.is_empty() {
            return 1.0;
        }
        self.concordances.iter().sum::<f64>() / self.concordances.len() as f64
    }

    /// Nearby heterozygous sites whose reads disagree with the candidate's split.
    pub fn discordant_count(&self) -> u32 {
        self.concordances
            .iter()
            .filter(|c| **c < MIN_HAPLOTYPE_CONCORDANCE)
            .count() as u32
    }
}

/// Haplotype scan around one child pileup.
pub struct HaplotypeEvaluator<'a> {
    candidate: &'a Pileup,
    child: &'a mut dyn PileupSource,
    parent1: &'a mut dyn PileupSource,
    parent2: &'a mut dyn PileupSource,
}

impl<'a> HaplotypeEvaluator<'a> {
    pub fn new(
        candidate: &'a Pileup,
        child: &'a mut dyn PileupSource,
        parent1: &'a mut dyn PileupSource,
        parent2: &'a mut dyn PileupSource,
    ) -> Self {
        Self {
            candidate,
            child,
            parent1,
            parent2,
        }
    }

    pub fn evaluate(&mut self) -> Result<HaplotypeResult> {
        let center = self.candidate.position();
        let pos = center.position();
        let start = pos.saturating_sub(HAPLOTYPE_SEARCH_DISTANCE).max(1);
        let end = pos.saturating_add(HAPLOTYPE_SEARCH_DISTANCE);

        let mut result = HaplotypeResult::default();
        let mut de_novos = FxHashSet::default();
        for p in (start..end).filter(|p| *p != pos) {
            let at = GenomicPosition::new(center.contig(), p);
            let nearby = self.child.pileup(&at)?;
            if !looks_variant(&nearby.depth()) {
                continue;
            }
            result.other_variants += 1;
            if more_than_two_viable_alleles(&nearby) {
                result.other_triallelics += 1;
                continue;
            }
            result.other_biallelics += 1;
            result.concordances.push(concordance(self.candidate, &nearby));

            let parent1 = self.parent1.pileup(&at)?;
            let parent2 = self.parent2.pileup(&at)?;
            if looks_denovo(&nearby, &parent1, &parent2) {
                de_novos.insert(p);
            }
        }
        let (adjacent, other) = partition_de_novos(pos, &de_novos);
        result.adjacent_de_novos = adjacent;
        result.other_de_novos = other;
        trace!(
            "{}: {} nearby variants, mean concordance {:.3}",
            center,
            result.other_variants,
            result.mean_concordance()
        );
        Ok(result)
    }
}

/// Share of `search` reads consistent with the candidate's allele split.
///
/// Reads are matched by identity between the two A1/A2 pairings (cis and trans); the better
/// pairing counts, divided by all reads at the search site.
pub fn concordance(candidate: &Pileup, search: &Pileup) -> f64 {
    let total = search.raw_total_depth();
    if total == 0 {
        return 0.0;
    }
    let (base, other) = (candidate.depth(), search.depth());
    let shared = |x: AlleleSlot, y: AlleleSlot| -> usize {
        match (base.slot_records(x), other.slot_records(y)) {
            (Some(left), Some(right)) => left.intersection(right).count(),
            _ => 0,
        }
    };
    let cis = shared(AlleleSlot::A1, AlleleSlot::A1) + shared(AlleleSlot::A2, AlleleSlot::A2);
    let trans = shared(AlleleSlot::A1, AlleleSlot::A2) + shared(AlleleSlot::A2, AlleleSlot::A1);
    cis.max(trans) as f64 / f64::from(total)
}

/// Split de novo positions into those chained to `pos` (stepping +1, then -1) and the rest.
pub fn partition_de_novos(pos: u32, de_novos: &FxHashSet<u32>) -> (u32, u32) {
    let mut adjacent = 0u32;
    let mut next = pos + 1;
    while de_novos.contains(&next) {
        adjacent += 1;
        next += 1;
    }
    let mut prev = pos.checked_sub(1);
    while let Some(p) = prev.filter(|p| de_novos.contains(p)) {
        adjacent += 1;
        prev = p.checked_sub(1);
    }
    (adjacent, de_novos.len() as u32 - adjacent)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::allele::PileAllele;
    use crate::engine::pileup::{Evidence, PileupBuilder};
    use crate::engine::reads::ReadId;
    use rustc_hash::FxHashMap;
    use std::ops::Range;
    use std::sync::Arc;

    type Sites = FxHashMap<GenomicPosition, Arc<Pileup>>;

    fn at(position: u32) -> GenomicPosition {
        GenomicPosition::new("chr1", position)
    }

    /// Each read weighs 1.0; alleles are listed with the reads supporting them.
    fn site(position: u32, alleles: &[(u8, &[ReadId])]) -> Pileup {
        let mut builder = PileupBuilder::new(at(position));
        for (base, reads) in alleles {
            for read in reads.iter() {
                builder.record(PileAllele::snp(*base), *read, Evidence::Weighted(1.0));
            }
        }
        builder.build()
    }

    fn ids(range: Range<ReadId>) -> Vec<ReadId> {
        range.collect()
    }

    #[test]
    fn adjacent_de_novos_chain_outward() {
        let pos = 1_000;
        let set: FxHashSet<u32> = [pos - 2, pos - 1, pos + 1, pos + 3].into_iter().collect();
        assert_eq!(partition_de_novos(pos, &set), (3, 1));
        assert_eq!(partition_de_novos(pos, &FxHashSet::default()), (0, 0));
        let far: FxHashSet<u32> = [pos + 2, pos - 5].into_iter().collect();
        assert_eq!(partition_de_novos(pos, &far), (0, 2));
    }

    #[test]
    fn concordance_is_symmetric_under_label_swap() {
        let candidate = site(100, &[(b'A', &ids(1..7)[..]), (b'G', &ids(7..11)[..])]);
        let search = site(110, &[(b'C', &[1, 2, 3, 4, 5, 7]), (b'T', &[6, 8, 9, 10])]);
        let swapped = site(
            110,
            &[(b'T', &[6, 8, 9, 10, 11, 12]), (b'C', &[1, 2, 3, 4, 5, 7])],
        );
        assert!((concordance(&candidate, &search) - 0.8).abs() < 1e-12);
        // Extra T reads change the denominator, not the pairing choice.
        assert!((concordance(&candidate, &swapped) - 8.0 / 12.0).abs() < 1e-12);

        let relabelled = site(110, &[(b'G', &[1, 2, 3, 4, 5, 7]), (b'A', &[6, 8, 9, 10])]);
        assert_eq!(
            concordance(&candidate, &search),
            concordance(&candidate, &relabelled)
        );
    }

    #[test]
    fn empty_window_means_full_concordance() {
        let candidate = site(500, &[(b'A', &ids(1..11)[..]), (b'G', &ids(11..21)[..])]);
        let (mut child, mut p1, mut p2) = (Sites::default(), Sites::default(), Sites::default());
        let result = HaplotypeEvaluator::new(&candidate, &mut child, &mut p1, &mut p2)
            .evaluate()
            .unwrap();
        assert_eq!(result, HaplotypeResult::default());
        assert_eq!(result.mean_concordance(), 1.0);
        assert_eq!(result.discordant_count(), 0);
    }

    #[test]
    fn window_sites_are_classified() {
        let het: [(u8, &[ReadId]); 2] = [(b'A', &[1, 2, 3, 4, 5, 6]), (b'G', &[7, 8, 9, 10, 11])];
        let candidate = site(1_000, &het);

        let mut child = Sites::default();
        let mut parent1 = Sites::default();
        let mut parent2 = Sites::default();
        for p in [998, 999, 1_001, 1_003, 1_100] {
            child.insert(at(p), Arc::new(site(p, &het)));
        }
        // Both parents carry both alleles at 1100: inherited.
        parent1.insert(at(1_100), Arc::new(site(1_100, &het)));
        parent2.insert(at(1_100), Arc::new(site(1_100, &[(b'A', &ids(1..20)[..])])));
        let tri: [(u8, &[ReadId]); 3] = [
            (b'A', &[1, 2, 3, 4, 5, 6]),
            (b'G', &[7, 8, 9, 10, 11]),
            (b'T', &[12, 13, 14]),
        ];
        child.insert(at(1_050), Arc::new(site(1_050, &tri)));
        // Outside the window: ignored.
        child.insert(at(1_150), Arc::new(site(1_150, &het)));
        child.insert(at(849), Arc::new(site(849, &het)));

        let result = HaplotypeEvaluator::new(&candidate, &mut child, &mut parent1, &mut parent2)
            .evaluate()
            .unwrap();
        assert_eq!(result.other_variants, 6);
        assert_eq!(result.other_triallelics, 1);
        assert_eq!(result.other_biallelics, 5);
        assert_eq!(result.adjacent_de_novos, 3);
        assert_eq!(result.other_de_novos, 1);
        assert_eq!(result.concordances.len(), 5);
        assert_eq!(result.mean_concordance(), 1.0);
    }
}
