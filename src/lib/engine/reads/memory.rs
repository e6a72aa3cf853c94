//! Read sources backed by plain vectors.

use rust_htslib::bam::record::Cigar;
use smallvec::SmallVec;
use std::sync::Arc;

use super::{AlignedRead, RandomAccessReader, SequentialReader};
use crate::core::error::Result;
use crate::engine::position::GenomicPosition;

/// Fluent constructor for [`AlignedRead`] values that do not come from a BAM file.
#[derive(Debug, Clone)]
pub struct ReadBuilder {
    name: String,
    contig: String,
    start: u32,
    cigar: Option<Vec<Cigar>>,
    bases: Vec<u8>,
    quals: Option<Vec<u8>>,
    base_qual: u8,
    mapq: u8,
    flags: u16,
}

impl ReadBuilder {
    pub fn new(name: &str, contig: &str, start: u32) -> Self {
        Self {
            name: name.to_string(),
            contig: contig.to_string(),
            start,
            cigar: None,
            bases: Vec::new(),
            quals: None,
            base_qual: 30,
            mapq: 60,
            flags: 0,
        }
    }

    /// Defaults to a single match spanning every base.
    pub fn cigar(mut self, cigar: Vec<Cigar>) -> Self {
        self.cigar = Some(cigar);
        self
    }

    pub fn bases(mut self, bases: &[u8]) -> Self {
        self.bases = bases.to_vec();
        self
    }

    /// Per-base qualities; overrides [`ReadBuilder::base_qual`].
    pub fn quals(mut self, quals: Vec<u8>) -> Self {
        self.quals = Some(quals);
        self
    }

    /// One quality applied to every base.
    pub fn base_qual(mut self, qual: u8) -> Self {
        self.base_qual = qual;
        self
    }

    pub fn mapq(mut self, mapq: u8) -> Self {
        self.mapq = mapq;
        self
    }

    pub fn flags(mut self, flags: u16) -> Self {
        self.flags = flags;
        self
    }

    pub fn build(self) -> AlignedRead {
        let cigar: SmallVec<[Cigar; 8]> = match self.cigar {
            Some(ops) => ops.into_iter().collect(),
            None => smallvec::smallvec![Cigar::Match(self.bases.len() as u32)],
        };
        let quals = self
            .quals
            .unwrap_or_else(|| vec![self.base_qual; self.bases.len()]);
        AlignedRead::from_parts(
            self.name.as_bytes(),
            &self.contig,
            self.start,
            cigar,
            self.bases,
            quals,
            self.mapq,
            self.flags,
        )
    }
}

/// A fixed set of reads serving both access patterns.
///
/// Reads are kept sorted by contig (in first-seen order) and start.
#[derive(Debug, Clone, Default)]
pub struct InMemoryReads {
    reads: Vec<Arc<AlignedRead>>,
}

impl InMemoryReads {
    pub fn new(reads: Vec<AlignedRead>) -> Self {
        let mut contigs: Vec<String> = Vec::new();
        for read in reads.iter() {
            if !contigs.iter().any(|c| c == read.contig()) {
                contigs.push(read.contig().to_string());
            }
        }
        let mut reads: Vec<Arc<AlignedRead>> = reads
            .into_iter()
            .filter(|r| !r.is_duplicate())
            .map(Arc::new)
            .collect();
        reads.sort_by_key(|r| {
            let rank = contigs.iter().position(|c| c == r.contig()).unwrap_or(0);
            (rank, r.start())
        });
        Self { reads }
    }

    /// A sequential scan over a snapshot of the reads.
    pub fn scan(&self) -> InMemoryScan {
        InMemoryScan {
            reads: self.reads.clone(),
            cursor: 0,
        }
    }
}

impl RandomAccessReader for InMemoryReads {
    fn overlapping(&mut self, position: &GenomicPosition) -> Result<Vec<Arc<AlignedRead>>> {
        Ok(self
            .reads
            .iter()
            .filter(|r| r.overlaps(position))
            .cloned()
            .collect())
    }
}

/// Sequential view produced by [`InMemoryReads::scan`].
#[derive(Debug, Clone)]
pub struct InMemoryScan {
    reads: Vec<Arc<AlignedRead>>,
    cursor: usize,
}

impl SequentialReader for InMemoryScan {
    fn next_read(&mut self) -> Option<Result<Arc<AlignedRead>>> {
        let read = self.reads.get(self.cursor)?.clone();
        self.cursor += 1;
        Some(Ok(read))
    }
}
