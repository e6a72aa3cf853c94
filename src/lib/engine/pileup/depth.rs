use rustc_hash::FxHashSet;
use smallvec::SmallVec;

use super::Pileup;
use crate::engine::allele::PileAllele;
use crate::engine::reads::ReadId;

/// The two heaviest alleles of a pileup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AlleleSlot {
    A1,
    A2,
}

/// Biallelic view of a [`Pileup`].
///
/// A1 and A2 are the first two alleles in weighted order; either may be absent.
#[derive(Debug, Clone, Copy)]
pub struct Depth<'a> {
    pileup: &'a Pileup,
    a1: Option<&'a PileAllele>,
    a2: Option<&'a PileAllele>,
}

impl<'a> Depth<'a> {
    pub fn new(pileup: &'a Pileup) -> Self {
        let mut ordered = pileup.weighted_depths().iter().map(|(a, _)| a);
        let a1 = ordered.next();
        let a2 = ordered.next();
        Self { pileup, a1, a2 }
    }

    #[inline]
    pub fn a1(&self) -> Option<&'a PileAllele> {
        self.a1
    }

    #[inline]
    pub fn a2(&self) -> Option<&'a PileAllele> {
        self.a2
    }

    #[inline]
    pub fn allele(&self, slot: AlleleSlot) -> Option<&'a PileAllele> {
        match slot {
            AlleleSlot::A1 => self.a1,
            AlleleSlot::A2 => self.a2,
        }
    }

    /// The present subset of A1 and A2.
    pub fn bi_alleles(&self) -> SmallVec<[&'a PileAllele; 2]> {
        self.a1.into_iter().chain(self.a2).collect()
    }

    pub fn weighted_depth(&self, allele: &PileAllele) -> f64 {
        self.pileup.weighted_depth(allele)
    }

    pub fn raw_depth(&self, allele: &PileAllele) -> u32 {
        self.pileup.raw_depth(allele)
    }

    pub fn slot_weighted_depth(&self, slot: AlleleSlot) -> f64 {
        self.allele(slot).map_or(0.0, |a| self.weighted_depth(a))
    }

    pub fn slot_raw_depth(&self, slot: AlleleSlot) -> u32 {
        self.allele(slot).map_or(0, |a| self.raw_depth(a))
    }

    /// Reads supporting the allele in `slot`.
    pub fn slot_records(&self, slot: AlleleSlot) -> Option<&'a FxHashSet<ReadId>> {
        self.allele(slot).and_then(|a| self.pileup.records(a))
    }

    pub fn weighted_biallelic_depth(&self) -> f64 {
        self.slot_weighted_depth(AlleleSlot::A1) + self.slot_weighted_depth(AlleleSlot::A2)
    }

    pub fn raw_biallelic_depth(&self) -> u32 {
        self.slot_raw_depth(AlleleSlot::A1) + self.slot_raw_depth(AlleleSlot::A2)
    }

    pub fn weighted_total_depth(&self) -> f64 {
        self.pileup.weighted_total_depth()
    }

    pub fn raw_total_depth(&self) -> u32 {
        self.pileup.raw_total_depth()
    }

    /// Lighter bi-allele's share of the total weighted depth.
    pub fn weighted_minor_allele_fraction(&self) -> f64 {
        let total = self.weighted_total_depth();
        if total <= 0.0 {
            return 0.0;
        }
        let minor = self
            .bi_alleles()
            .iter()
            .map(|a| self.weighted_depth(a))
            .fold(f64::INFINITY, f64::min);
        if minor.is_finite() {
            minor / total
        } else {
            0.0
        }
    }

    /// Smaller bi-allele read count over all counted reads.
    pub fn raw_minor_allele_fraction(&self) -> f64 {
        let total = self.raw_total_depth();
        if total == 0 {
            return 0.0;
        }
        let minor = self
            .bi_alleles()
            .iter()
            .map(|a| self.raw_depth(a))
            .min()
            .unwrap_or(0);
        f64::from(minor) / f64::from(total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::pileup::tests::weighted_pileup;
    use crate::engine::position::GenomicPosition;

    fn at(position: u32) -> GenomicPosition {
        GenomicPosition::new("chr1", position)
    }

    #[test]
    fn slots_follow_weighted_order() {
        let pileup = weighted_pileup(at(5), &[(b'A', 3.0, 3), (b'G', 7.0, 7), (b'T', 1.0, 2)]);
        let depth = pileup.depth();
        assert_eq!(depth.a1(), Some(&PileAllele::snp(b'G')));
        assert_eq!(depth.a2(), Some(&PileAllele::snp(b'A')));
        assert_eq!(depth.bi_alleles().len(), 2);
        assert_eq!(depth.weighted_biallelic_depth(), 10.0);
        assert_eq!(depth.raw_biallelic_depth(), 10);
        assert_eq!(depth.raw_total_depth(), 12);
        assert!((depth.weighted_minor_allele_fraction() - 3.0 / 11.0).abs() < 1e-12);
        assert!((depth.raw_minor_allele_fraction() - 3.0 / 12.0).abs() < 1e-12);
        assert_eq!(depth.slot_records(AlleleSlot::A1).map(|r| r.len()), Some(7));
    }

    #[test]
    fn empty_pileups_have_no_slots() {
        let pileup = weighted_pileup(at(5), &[]);
        let depth = pileup.depth();
        assert!(depth.a1().is_none());
        assert!(depth.bi_alleles().is_empty());
        assert_eq!(depth.weighted_minor_allele_fraction(), 0.0);
        assert_eq!(depth.raw_minor_allele_fraction(), 0.0);
        assert!(depth.slot_records(AlleleSlot::A2).is_none());
    }

    #[test]
    fn single_allele_minor_fraction_is_its_own_share() {
        let pileup = weighted_pileup(at(5), &[(b'C', 8.0, 8)]);
        let depth = pileup.depth();
        assert!(depth.a2().is_none());
        assert_eq!(depth.weighted_minor_allele_fraction(), 1.0);
    }
}
