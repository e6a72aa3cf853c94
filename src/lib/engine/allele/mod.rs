//! The alleles a read can support at a pileup position.
//!
//! [`PileAllele`] is a closed set: a single base, an insertion after an anchor base, or the
//! "no insertion" companion of an insertion. Each variant answers three questions about a
//! read at a read offset: does the read support me, is that support clipped, and how much
//! weight does the read contribute.

mod insertion;

pub use insertion::{InsertionAllele, InsertionSupport};

use std::fmt;
use std::sync::Arc;

use crate::core::phred::accuracy;
use crate::engine::reads::AlignedRead;

/// A canonical single base. Only `A`, `C`, `G`, `T` and `N` exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SnpAllele(u8);

impl SnpAllele {
    pub const A: SnpAllele = SnpAllele(b'A');
    pub const C: SnpAllele = SnpAllele(b'C');
    pub const G: SnpAllele = SnpAllele(b'G');
    pub const T: SnpAllele = SnpAllele(b'T');
    pub const N: SnpAllele = SnpAllele(b'N');

    /// The four called bases, in output column order.
    pub const CALLED: [SnpAllele; 4] = [Self::A, Self::T, Self::C, Self::G];

    /// Normalise any read byte; unknown bytes become `N`.
    #[inline]
    pub fn of(base: u8) -> Self {
        match base.to_ascii_uppercase() {
            b'A' => Self::A,
            b'C' => Self::C,
            b'G' => Self::G,
            b'T' => Self::T,
            _ => Self::N,
        }
    }

    #[inline]
    pub fn base(self) -> u8 {
        self.0
    }

    pub fn is_called(self) -> bool {
        self != Self::N
    }

    #[inline]
    pub fn supported(self, read: &AlignedRead, read_pos: usize) -> bool {
        read.bases()
            .get(read_pos)
            .map_or(false, |b| Self::of(*b) == self)
    }
}

impl fmt::Display for SnpAllele {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0 as char)
    }
}

/// `accuracy(base quality) * accuracy(mapping quality)` for one read offset.
#[inline]
pub(crate) fn single_position_weight(read: &AlignedRead, read_pos: usize) -> f64 {
    let base_qual = read.quals().get(read_pos).copied().unwrap_or(0);
    accuracy(base_qual) * accuracy(read.mapq())
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PileAllele {
    Snp(SnpAllele),
    Insertion(Arc<InsertionAllele>),
    /// The anchor of an insertion with nothing inserted after it.
    NonInsertion(Arc<InsertionAllele>),
}

impl PileAllele {
    pub fn snp(base: u8) -> Self {
        PileAllele::Snp(SnpAllele::of(base))
    }

    /// An insertion and its non-insertion companion, sharing one definition.
    pub fn insertion_pair(anchor: u8, inserted: &[u8]) -> (Self, Self) {
        let insertion = Arc::new(InsertionAllele::new(SnpAllele::of(anchor), inserted));
        (
            PileAllele::Insertion(insertion.clone()),
            PileAllele::NonInsertion(insertion),
        )
    }

    /// The base observed at the position, for SNP-level summaries.
    pub fn anchor(&self) -> SnpAllele {
        match self {
            PileAllele::Snp(snp) => *snp,
            PileAllele::Insertion(ins) | PileAllele::NonInsertion(ins) => ins.anchor(),
        }
    }

    pub fn is_snp(&self) -> bool {
        matches!(self, PileAllele::Snp(_))
    }

    pub fn supported(&self, read: &AlignedRead, read_pos: usize) -> bool {
        match self {
            PileAllele::Snp(snp) => snp.supported(read, read_pos),
            PileAllele::Insertion(ins) => matches!(
                ins.support(read, read_pos),
                InsertionSupport::Insertion | InsertionSupport::ClippedInsertion
            ),
            PileAllele::NonInsertion(ins) => {
                ins.support(read, read_pos) == InsertionSupport::NoInsertion
            }
        }
    }

    pub fn clipped(&self, read: &AlignedRead, read_pos: usize) -> bool {
        match self {
            PileAllele::Snp(_) => read.in_soft_clip(read_pos),
            PileAllele::Insertion(ins) => {
                ins.support(read, read_pos) == InsertionSupport::ClippedInsertion
            }
            PileAllele::NonInsertion(_) => false,
        }
    }

    pub fn weighted_depth(&self, read: &AlignedRead, read_pos: usize) -> f64 {
        match self {
            PileAllele::Insertion(ins) => ins.weighted_depth(read, read_pos),
            PileAllele::Snp(_) | PileAllele::NonInsertion(_) => {
                single_position_weight(read, read_pos)
            }
        }
    }
}

impl fmt::Display for PileAllele {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PileAllele::Snp(snp) => write!(f, "{}", snp),
            PileAllele::Insertion(ins) => write!(f, "{}", ins),
            PileAllele::NonInsertion(ins) => write!(f, "{}", ins.anchor()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::reads::ReadBuilder;
    use rustc_hash::FxHashSet;

    #[test]
    fn snp_values_are_canonical() {
        assert_eq!(SnpAllele::of(b'a'), SnpAllele::A);
        assert_eq!(SnpAllele::of(b'R'), SnpAllele::N);
        assert_eq!(PileAllele::snp(b'g'), PileAllele::Snp(SnpAllele::G));
        assert!(!SnpAllele::N.is_called());
    }

    #[test]
    fn snp_support_and_weight() {
        let read = ReadBuilder::new("r", "chr1", 1)
            .bases(b"ACGT")
            .base_qual(20)
            .mapq(30)
            .build();
        let g = PileAllele::snp(b'G');
        assert!(g.supported(&read, 2));
        assert!(!g.supported(&read, 1));
        assert!(!g.supported(&read, 10));
        let expected = (1.0 - 0.01) * (1.0 - 0.001);
        assert!((g.weighted_depth(&read, 2) - expected).abs() < 1e-12);
    }

    #[test]
    fn insertion_companions_are_distinct_but_share_data() {
        let (ins, non) = PileAllele::insertion_pair(b'A', b"GT");
        let (ins2, non2) = PileAllele::insertion_pair(b'A', b"GT");
        assert_eq!(ins, ins2);
        assert_eq!(non, non2);
        assert_ne!(ins, non);
        let set: FxHashSet<PileAllele> = vec![ins.clone(), ins2, non.clone(), non2]
            .into_iter()
            .collect();
        assert_eq!(set.len(), 2);
        assert_eq!(ins.to_string(), "AGT");
        assert_eq!(non.to_string(), "A");
        assert_eq!(non.anchor(), SnpAllele::A);
    }

    #[test]
    fn non_insertion_supports_reads_without_the_insertion() {
        let (ins, non) = PileAllele::insertion_pair(b'A', b"GT");
        let plain = ReadBuilder::new("r", "chr1", 1).bases(b"CACCC").build();
        let inserted = ReadBuilder::new("r", "chr1", 1).bases(b"CAGTC").build();
        assert!(non.supported(&plain, 1));
        assert!(!ins.supported(&plain, 1));
        assert!(ins.supported(&inserted, 1));
        assert!(!non.supported(&inserted, 1));
        assert!(!non.clipped(&plain, 1));
    }
}
