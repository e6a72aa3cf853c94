//! Per-position read evidence.
//!
//! A [`Pileup`] is the immutable summary of every read overlapping one position: which reads
//! support which [`PileAllele`], their summed weight, and how many of them were clipped,
//! mismapped-looking, or missing a mate. Pileups come from a [`PileupGenerator`] sweeping a
//! sorted read stream, wrapped by a [`PileupCache`] that also answers point queries.

mod cache;
mod depth;
mod generator;

pub use cache::{PileupCache, EVICTION_WINDOW, READ_LENGTH};
pub use depth::{AlleleSlot, Depth};
pub use generator::PileupGenerator;

use rustc_hash::{FxHashMap, FxHashSet};
use std::sync::Arc;

use crate::core::error::Result;
use crate::engine::allele::PileAllele;
use crate::engine::position::{GenomicPosition, ReferencePosition};
use crate::engine::reads::{AlignedRead, ReadId};

/// Per-allele read counts.
pub type AlleleCounts = FxHashMap<PileAllele, u32>;

/// Anything that can hand out pileups by position.
pub trait PileupSource {
    fn pileup(&mut self, position: &GenomicPosition) -> Result<Arc<Pileup>>;
}

/// Fixed pileups; unknown positions are empty.
impl PileupSource for FxHashMap<GenomicPosition, Arc<Pileup>> {
    fn pileup(&mut self, position: &GenomicPosition) -> Result<Arc<Pileup>> {
        Ok(self
            .get(position)
            .cloned()
            .unwrap_or_else(|| Arc::new(Pileup::empty(position.clone()))))
    }
}

/// What a supporting read contributed beyond being counted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Evidence {
    Weighted(f64),
    Clipped,
    ApparentMismap,
    UnmappedMate,
}

#[derive(Debug, Clone)]
pub struct Pileup {
    position: GenomicPosition,
    reads_by_allele: FxHashMap<PileAllele, FxHashSet<ReadId>>,
    /// Descending by weight; ties keep first-seen order.
    weighted: Vec<(PileAllele, f64)>,
    clipped: AlleleCounts,
    last_position: AlleleCounts,
    apparent_mismap: AlleleCounts,
    unmapped_mate: AlleleCounts,
    reads: Vec<Arc<AlignedRead>>,
    raw_total: u32,
}

impl Pileup {
    /// A pileup with no reads.
    pub fn empty(position: GenomicPosition) -> Self {
        PileupBuilder::new(position).build()
    }

    /// Pile up `reads` at `position`, treating every base as a SNP.
    pub fn from_reads<I>(position: GenomicPosition, reads: I) -> Self
    where
        I: IntoIterator<Item = Arc<AlignedRead>>,
    {
        let mut builder = PileupBuilder::new(position);
        for read in reads {
            builder.add_read(read);
        }
        builder.build()
    }

    /// Rebuild from the same reads with known reference/alternate alleles.
    pub fn with_alleles(&self, reference: &ReferencePosition) -> Self {
        let mut builder = PileupBuilder::for_reference(reference);
        for read in self.reads.iter() {
            builder.add_read(read.clone());
        }
        builder.build()
    }

    #[inline]
    pub fn position(&self) -> &GenomicPosition {
        &self.position
    }

    pub fn is_empty(&self) -> bool {
        self.raw_total == 0
    }

    /// Alleles with their weighted depth, heaviest first.
    #[inline]
    pub fn weighted_depths(&self) -> &[(PileAllele, f64)] {
        &self.weighted
    }

    pub fn weighted_depth(&self, allele: &PileAllele) -> f64 {
        self.weighted
            .iter()
            .find(|(a, _)| a == allele)
            .map_or(0.0, |(_, w)| *w)
    }

    pub fn weighted_total_depth(&self) -> f64 {
        self.weighted.iter().map(|(_, w)| w).sum()
    }

    /// Reads supporting `allele`.
    pub fn records(&self, allele: &PileAllele) -> Option<&FxHashSet<ReadId>> {
        self.reads_by_allele.get(allele)
    }

    pub fn raw_depth(&self, allele: &PileAllele) -> u32 {
        self.records(allele).map_or(0, |r| r.len() as u32)
    }

    #[inline]
    pub fn raw_total_depth(&self) -> u32 {
        self.raw_total
    }

    /// Share of all counted reads that support `allele`.
    pub fn raw_fraction(&self, allele: &PileAllele) -> f64 {
        if self.raw_total == 0 {
            return 0.0;
        }
        f64::from(self.raw_depth(allele)) / f64::from(self.raw_total)
    }

    /// Every allele with at least one supporting read, with its read count.
    pub fn raw_depths(&self) -> impl Iterator<Item = (&PileAllele, u32)> {
        self.reads_by_allele
            .iter()
            .map(|(allele, reads)| (allele, reads.len() as u32))
    }

    pub fn clipped_count(&self, allele: &PileAllele) -> u32 {
        self.clipped.get(allele).copied().unwrap_or(0)
    }

    pub fn last_position_count(&self, allele: &PileAllele) -> u32 {
        self.last_position.get(allele).copied().unwrap_or(0)
    }

    pub fn apparent_mismap_count(&self, allele: &PileAllele) -> u32 {
        self.apparent_mismap.get(allele).copied().unwrap_or(0)
    }

    pub fn unmapped_mate_count(&self, allele: &PileAllele) -> u32 {
        self.unmapped_mate.get(allele).copied().unwrap_or(0)
    }

    /// The reads this pileup was built from.
    pub fn reads(&self) -> &[Arc<AlignedRead>] {
        &self.reads
    }

    pub fn depth(&self) -> Depth<'_> {
        Depth::new(self)
    }
}

/// Accumulates reads into a [`Pileup`].
#[derive(Debug, Clone)]
pub struct PileupBuilder {
    position: GenomicPosition,
    ref_allele: Option<PileAllele>,
    alt_allele: Option<PileAllele>,
    seen: FxHashSet<ReadId>,
    reads: Vec<Arc<AlignedRead>>,
    reads_by_allele: FxHashMap<PileAllele, FxHashSet<ReadId>>,
    weighted: Vec<(PileAllele, f64)>,
    clipped: AlleleCounts,
    last_position: AlleleCounts,
    apparent_mismap: AlleleCounts,
    unmapped_mate: AlleleCounts,
}

impl PileupBuilder {
    pub fn new(position: GenomicPosition) -> Self {
        Self {
            position,
            ref_allele: None,
            alt_allele: None,
            seen: FxHashSet::default(),
            reads: Vec::new(),
            reads_by_allele: FxHashMap::default(),
            weighted: Vec::new(),
            clipped: AlleleCounts::default(),
            last_position: AlleleCounts::default(),
            apparent_mismap: AlleleCounts::default(),
            unmapped_mate: AlleleCounts::default(),
        }
    }

    /// A builder that checks the reference, then the alternate allele, before plain bases.
    pub fn for_reference(reference: &ReferencePosition) -> Self {
        let mut builder = Self::new(reference.position().clone());
        builder.ref_allele = Some(reference.ref_allele().clone());
        builder.alt_allele = reference.alt_allele().cloned();
        builder
    }

    pub fn position(&self) -> &GenomicPosition {
        &self.position
    }

    /// Add one overlapping read. Duplicates, repeats and reads with a deletion here are ignored.
    pub fn add_read(&mut self, read: Arc<AlignedRead>) {
        if read.is_duplicate() || !self.seen.insert(read.id()) {
            return;
        }
        let pos = self.position.position();
        let read_pos = match read.read_pos_at(pos) {
            Some(p) => p,
            None => return,
        };
        let allele = self.choose_allele(&read, read_pos);

        let evidence = if read.has_soft_clip() || allele.clipped(&read, read_pos) {
            Evidence::Clipped
        } else if read.is_apparent_mismap() {
            Evidence::ApparentMismap
        } else if read.mate_unmapped() {
            Evidence::UnmappedMate
        } else {
            Evidence::Weighted(allele.weighted_depth(&read, read_pos))
        };
        if read.start() == pos || read.end() == pos {
            *self.last_position.entry(allele.clone()).or_insert(0) += 1;
        }
        self.record(allele, read.id(), evidence);
        self.reads.push(read);
    }

    fn choose_allele(&self, read: &AlignedRead, read_pos: usize) -> PileAllele {
        [&self.ref_allele, &self.alt_allele]
            .into_iter()
            .flatten()
            .find(|allele| allele.supported(read, read_pos))
            .cloned()
            .unwrap_or_else(|| PileAllele::snp(read.bases().get(read_pos).copied().unwrap_or(b'N')))
    }

    /// Tally a read under `allele`. Returns `false` if the read was already counted for it.
    pub fn record(&mut self, allele: PileAllele, read: ReadId, evidence: Evidence) -> bool {
        if !self
            .reads_by_allele
            .entry(allele.clone())
            .or_default()
            .insert(read)
        {
            return false;
        }
        let counts = match evidence {
            Evidence::Weighted(weight) => {
                match self.weighted.iter_mut().find(|(a, _)| *a == allele) {
                    Some((_, total)) => *total += weight,
                    None => self.weighted.push((allele, weight)),
                }
                return true;
            }
            Evidence::Clipped => &mut self.clipped,
            Evidence::ApparentMismap => &mut self.apparent_mismap,
            Evidence::UnmappedMate => &mut self.unmapped_mate,
        };
        *counts.entry(allele).or_insert(0) += 1;
        true
    }

    pub fn build(self) -> Pileup {
        let mut weighted = self.weighted;
        // Stable: equal weights keep the order they were first seen in.
        weighted.sort_by(|a, b| b.1.total_cmp(&a.1));
        let raw_total = self.reads_by_allele.values().map(|r| r.len() as u32).sum();
        Pileup {
            position: self.position,
            reads_by_allele: self.reads_by_allele,
            weighted,
            clipped: self.clipped,
            last_position: self.last_position,
            apparent_mismap: self.apparent_mismap,
            unmapped_mate: self.unmapped_mate,
            reads: self.reads,
            raw_total,
        }
    }
}
