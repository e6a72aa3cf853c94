use smallvec::SmallVec;
use std::fmt;

use super::{single_position_weight, SnpAllele};
use crate::engine::reads::AlignedRead;

/// How a read relates to an insertion anchored at a given read offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertionSupport {
    /// Every inserted base is present.
    Insertion,
    /// The inserted bases that could be compared all match, but the read was clipped or ended.
    ClippedInsertion,
    /// The base after the anchor already disagrees with the insertion.
    NoInsertion,
    /// Partial insertion, anchor mismatch, or nothing to compare.
    Other,
}

/// An anchor base followed by one or more inserted bases.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct InsertionAllele {
    anchor: SnpAllele,
    inserted: SmallVec<[u8; 8]>,
}

impl InsertionAllele {
    pub fn new(anchor: SnpAllele, inserted: &[u8]) -> Self {
        Self {
            anchor,
            inserted: inserted.iter().map(|b| SnpAllele::of(*b).base()).collect(),
        }
    }

    #[inline]
    pub fn anchor(&self) -> SnpAllele {
        self.anchor
    }

    #[inline]
    pub fn inserted(&self) -> &[u8] {
        &self.inserted
    }

    pub fn support(&self, read: &AlignedRead, read_pos: usize) -> InsertionSupport {
        if !self.anchor.supported(read, read_pos) {
            return InsertionSupport::Other;
        }
        let bases = read.bases();
        let mut matched = 0usize;
        let mut clipped = false;
        for (offset, expected) in self.inserted.iter().enumerate() {
            let pos = read_pos + 1 + offset;
            let observed = match bases.get(pos) {
                Some(b) => SnpAllele::of(*b).base(),
                None => {
                    clipped = true;
                    break;
                }
            };
            if observed != *expected {
                return if matched == 0 {
                    InsertionSupport::NoInsertion
                } else {
                    InsertionSupport::Other
                };
            }
            matched += 1;
            clipped |= read.in_soft_clip(pos);
        }
        match (matched, clipped) {
            (0, _) => InsertionSupport::Other,
            (_, true) => InsertionSupport::ClippedInsertion,
            (_, false) => InsertionSupport::Insertion,
        }
    }

    /// Mean single-position weight over the anchor and inserted bases still inside the read.
    pub fn weighted_depth(&self, read: &AlignedRead, read_pos: usize) -> f64 {
        if read.is_empty() || read_pos >= read.len() {
            return 0.0;
        }
        let last = (read_pos + self.inserted.len()).min(read.len() - 1);
        let span = read_pos..=last;
        let count = span.clone().count();
        let total: f64 = span.map(|pos| single_position_weight(read, pos)).sum();
        total / count as f64
    }
}

impl fmt::Display for InsertionAllele {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.anchor)?;
        for base in self.inserted.iter() {
            write!(f, "{}", *base as char)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::reads::ReadBuilder;
    use rust_htslib::bam::record::Cigar;

    fn read(bases: &[u8]) -> AlignedRead {
        ReadBuilder::new("r", "chr1", 100).bases(bases).build()
    }

    fn ins() -> InsertionAllele {
        InsertionAllele::new(SnpAllele::A, b"GT")
    }

    #[test]
    fn classifies_full_and_missing_insertions() {
        assert_eq!(ins().support(&read(b"CAGTC"), 1), InsertionSupport::Insertion);
        assert_eq!(ins().support(&read(b"CACCC"), 1), InsertionSupport::NoInsertion);
        assert_eq!(ins().support(&read(b"CAGCC"), 1), InsertionSupport::Other);
        assert_eq!(ins().support(&read(b"CCGTC"), 1), InsertionSupport::Other);
    }

    #[test]
    fn truncated_or_clipped_insertions_are_clipped() {
        assert_eq!(
            ins().support(&read(b"CAG"), 1),
            InsertionSupport::ClippedInsertion
        );
        assert_eq!(ins().support(&read(b"CA"), 1), InsertionSupport::Other);

        let soft = ReadBuilder::new("r", "chr1", 100)
            .cigar(vec![Cigar::Match(3), Cigar::SoftClip(2)])
            .bases(b"CAGTC")
            .build();
        assert_eq!(ins().support(&soft, 1), InsertionSupport::ClippedInsertion);
    }

    #[test]
    fn weight_averages_over_the_inserted_span() {
        let r = ReadBuilder::new("r", "chr1", 100)
            .bases(b"CAGT")
            .quals(vec![30, 10, 20, 30])
            .mapq(60)
            .build();
        let expected = (single_position_weight(&r, 1)
            + single_position_weight(&r, 2)
            + single_position_weight(&r, 3))
            / 3.0;
        assert!((ins().weighted_depth(&r, 1) - expected).abs() < 1e-12);

        // Only the anchor and one inserted base remain.
        let short = ReadBuilder::new("r", "chr1", 100).bases(b"CAG").build();
        let expected = (single_position_weight(&short, 1) + single_position_weight(&short, 2)) / 2.0;
        assert!((ins().weighted_depth(&short, 1) - expected).abs() < 1e-12);
    }

    #[test]
    fn displays_anchor_then_inserted_bases() {
        assert_eq!(ins().to_string(), "AGT");
    }
}
