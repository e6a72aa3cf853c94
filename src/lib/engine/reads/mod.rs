//! Owned alignment records and the two ways the engine pulls them from a source.
//!
//! The pileup engine never touches htslib records directly. Reads are converted into
//! [`AlignedRead`] once, wrapped in an [`Arc`], and shared between every position they span.
//! Sources implement [`SequentialReader`] (a coordinate-sorted scan over target intervals)
//! and [`RandomAccessReader`] (all reads overlapping one position).

mod bam;
mod dictionary;
mod memory;

pub use self::bam::{read_dictionary, BamRandomReader, BamSequentialReader};
pub use dictionary::SequenceDictionary;
pub use memory::{InMemoryReads, InMemoryScan, ReadBuilder};

use rust_htslib::bam::record::Cigar;
use rustc_hash::FxHasher;
use smallvec::SmallVec;
use smartstring::alias::String;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::core::error::Result;
use crate::engine::position::GenomicPosition;

/// Stable identity of an alignment record.
///
/// Derived from the read name, mate/secondary flags, contig and start, so the same
/// alignment gets the same id whether it arrives through a scan or a random-access query.
pub type ReadId = u64;

const FLAG_PAIRED: u16 = 0x1;
const FLAG_MATE_UNMAPPED: u16 = 0x8;
const FLAG_FIRST_IN_PAIR: u16 = 0x40;
const FLAG_SECOND_IN_PAIR: u16 = 0x80;
const FLAG_SECONDARY: u16 = 0x100;
const FLAG_DUPLICATE: u16 = 0x400;
const FLAG_SUPPLEMENTARY: u16 = 0x800;

const IDENTITY_FLAGS: u16 =
    FLAG_FIRST_IN_PAIR | FLAG_SECOND_IN_PAIR | FLAG_SECONDARY | FLAG_SUPPLEMENTARY;

pub(crate) fn read_id(name: &[u8], flags: u16, contig: &str, start: u32) -> ReadId {
    let mut hasher = FxHasher::default();
    name.hash(&mut hasher);
    (flags & IDENTITY_FLAGS).hash(&mut hasher);
    contig.hash(&mut hasher);
    start.hash(&mut hasher);
    hasher.finish()
}

/// A mapped read with everything the pileup needs, detached from its source record.
#[derive(Debug, Clone)]
pub struct AlignedRead {
    id: ReadId,
    contig: String,
    /// 1-based position of the first aligned reference base.
    start: u32,
    /// 1-based position of the last aligned reference base.
    end: u32,
    cigar: SmallVec<[Cigar; 8]>,
    bases: Vec<u8>,
    quals: Vec<u8>,
    mapq: u8,
    flags: u16,
}

impl AlignedRead {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn from_parts(
        name: &[u8],
        contig: &str,
        start: u32,
        cigar: SmallVec<[Cigar; 8]>,
        bases: Vec<u8>,
        quals: Vec<u8>,
        mapq: u8,
        flags: u16,
    ) -> Self {
        let reference_span: u32 = cigar
            .iter()
            .map(|op| match op {
                Cigar::Match(len)
                | Cigar::Equal(len)
                | Cigar::Diff(len)
                | Cigar::Del(len)
                | Cigar::RefSkip(len) => *len,
                _ => 0,
            })
            .sum();
        let end = (start + reference_span).saturating_sub(1).max(start);
        let bases = bases.into_iter().map(|b| b.to_ascii_uppercase()).collect();
        Self {
            id: read_id(name, flags, contig, start),
            contig: contig.into(),
            start,
            end,
            cigar,
            bases,
            quals,
            mapq,
            flags,
        }
    }

    #[inline]
    pub fn id(&self) -> ReadId {
        self.id
    }

    #[inline]
    pub fn contig(&self) -> &str {
        &self.contig
    }

    #[inline]
    pub fn start(&self) -> u32 {
        self.start
    }

    #[inline]
    pub fn end(&self) -> u32 {
        self.end
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.bases.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bases.is_empty()
    }

    #[inline]
    pub fn bases(&self) -> &[u8] {
        &self.bases
    }

    #[inline]
    pub fn quals(&self) -> &[u8] {
        &self.quals
    }

    #[inline]
    pub fn mapq(&self) -> u8 {
        self.mapq
    }

    /// Base and quality at a read offset, if the offset exists.
    #[inline]
    pub fn base_at(&self, read_pos: usize) -> Option<(u8, u8)> {
        let base = *self.bases.get(read_pos)?;
        let qual = self.quals.get(read_pos).copied().unwrap_or(0);
        Some((base, qual))
    }

    pub fn overlaps(&self, position: &GenomicPosition) -> bool {
        self.contig == position.contig()
            && self.start <= position.position()
            && position.position() <= self.end
    }

    /// Read offset aligned to a 1-based reference position.
    ///
    /// Positions inside a deletion or reference skip, or outside the aligned span, have no
    /// read offset.
    pub fn read_pos_at(&self, ref_pos: u32) -> Option<usize> {
        if ref_pos < self.start || ref_pos > self.end {
            return None;
        }
        let mut ref_cursor = self.start;
        let mut read_cursor = 0usize;
        for op in self.cigar.iter() {
            match *op {
                Cigar::Match(len) | Cigar::Equal(len) | Cigar::Diff(len) => {
                    if ref_pos < ref_cursor + len {
                        return Some(read_cursor + (ref_pos - ref_cursor) as usize);
                    }
                    ref_cursor += len;
                    read_cursor += len as usize;
                }
                Cigar::Del(len) | Cigar::RefSkip(len) => {
                    if ref_pos < ref_cursor + len {
                        return None;
                    }
                    ref_cursor += len;
                }
                Cigar::Ins(len) | Cigar::SoftClip(len) => read_cursor += len as usize,
                Cigar::HardClip(_) | Cigar::Pad(_) => {}
            }
        }
        None
    }

    pub fn has_soft_clip(&self) -> bool {
        self.cigar.iter().any(|op| matches!(op, Cigar::SoftClip(_)))
    }

    /// Whether a read offset falls inside a leading or trailing soft clip.
    pub fn in_soft_clip(&self, read_pos: usize) -> bool {
        let leading = match self.cigar.iter().find(|op| !matches!(op, Cigar::HardClip(_))) {
            Some(Cigar::SoftClip(len)) => *len as usize,
            _ => 0,
        };
        let trailing = match self
            .cigar
            .iter()
            .rev()
            .find(|op| !matches!(op, Cigar::HardClip(_)))
        {
            Some(Cigar::SoftClip(len)) => *len as usize,
            _ => 0,
        };
        read_pos < leading || read_pos + trailing >= self.bases.len()
    }

    /// Share of aligned bases recorded as `=`, for CIGARs that distinguish matches.
    pub fn exact_match_fraction(&self) -> Option<f64> {
        let mut aligned = 0u32;
        let mut equal = 0u32;
        let mut explicit = false;
        for op in self.cigar.iter() {
            match *op {
                Cigar::Equal(len) => {
                    explicit = true;
                    equal += len;
                    aligned += len;
                }
                Cigar::Diff(len) => {
                    explicit = true;
                    aligned += len;
                }
                Cigar::Match(len) => aligned += len,
                _ => {}
            }
        }
        if !explicit || aligned == 0 {
            return None;
        }
        Some(f64::from(equal) / f64::from(aligned))
    }

    /// Reads where fewer than half the aligned bases match the reference exactly.
    pub fn is_apparent_mismap(&self) -> bool {
        self.exact_match_fraction().map_or(false, |f| f < 0.5)
    }

    pub fn mate_unmapped(&self) -> bool {
        self.flags & FLAG_PAIRED != 0 && self.flags & FLAG_MATE_UNMAPPED != 0
    }

    pub fn is_duplicate(&self) -> bool {
        self.flags & FLAG_DUPLICATE != 0
    }
}

/// A coordinate-sorted stream of reads restricted to target intervals.
pub trait SequentialReader {
    /// Next read, or `None` once every interval is exhausted.
    fn next_read(&mut self) -> Option<Result<Arc<AlignedRead>>>;
}

/// Point queries against an indexed read source.
pub trait RandomAccessReader {
    /// All reads whose aligned span covers `position`.
    fn overlapping(&mut self, position: &GenomicPosition) -> Result<Vec<Arc<AlignedRead>>>;
}
