//! htslib-backed read sources.

use log::{debug, trace};
use rust_htslib::bam::{self, record::Record, Read};
use smallvec::SmallVec;
use std::collections::VecDeque;
use std::path::Path;
use std::sync::Arc;

use super::{AlignedRead, RandomAccessReader, SequenceDictionary, SequentialReader};
use crate::core::error::{Result, SupernovoError};
use crate::core::read_filter::{MappedReadFilter, ReadFilter};
use crate::engine::position::GenomicPosition;
use crate::engine::regions::TargetRegions;

fn to_aligned(record: &Record, contig: &str) -> AlignedRead {
    let cigar: SmallVec<[_; 8]> = record.cigar().iter().cloned().collect();
    AlignedRead::from_parts(
        record.qname(),
        contig,
        (record.pos() + 1) as u32,
        cigar,
        record.seq().as_bytes(),
        record.qual().to_vec(),
        record.mapq(),
        record.flags(),
    )
}

fn open_indexed(path: &Path) -> Result<bam::IndexedReader> {
    if !path.exists() {
        return Err(SupernovoError::FileNotFound(path.display().to_string()));
    }
    Ok(bam::IndexedReader::from_path(path)?)
}

/// One closed, 1-based interval to fetch.
#[derive(Debug, Clone, Copy)]
struct Fetch {
    tid: u32,
    start: u32,
    end: u32,
}

/// Coordinate-sorted scan over the target intervals of an indexed BAM/CRAM.
///
/// Each interval is fetched in turn. A read that already overlapped the previous interval on
/// the same contig is not returned a second time.
pub struct BamSequentialReader {
    reader: bam::IndexedReader,
    record: Record,
    filter: MappedReadFilter,
    names: Vec<String>,
    plan: VecDeque<Fetch>,
    active: Option<Fetch>,
    skip_through: u32,
}

impl BamSequentialReader {
    /// Open a scan over every contig in the header, or only `contig` when given.
    pub fn open(
        path: &Path,
        regions: &TargetRegions,
        contig: Option<&str>,
        filter: MappedReadFilter,
    ) -> Result<Self> {
        let reader = open_indexed(path)?;
        let dictionary = SequenceDictionary::from_header(reader.header());
        let mut plan = VecDeque::new();
        for (tid, (name, len)) in dictionary.iter().enumerate() {
            if contig.map_or(false, |c| c != name) {
                continue;
            }
            for (start, end) in regions.fetch_intervals(name, len) {
                plan.push_back(Fetch {
                    tid: tid as u32,
                    start,
                    end,
                });
            }
        }
        debug!("{}: {} intervals to scan", path.display(), plan.len());
        Ok(Self {
            reader,
            record: Record::new(),
            filter,
            names: dictionary.names().map(|n| n.to_string()).collect(),
            plan,
            active: None,
            skip_through: 0,
        })
    }

    fn start_next_fetch(&mut self) -> Result<bool> {
        let previous = self.active.take();
        let next = match self.plan.pop_front() {
            Some(next) => next,
            None => return Ok(false),
        };
        self.skip_through = match previous {
            Some(prev) if prev.tid == next.tid => prev.end,
            _ => 0,
        };
        trace!(
            "fetching {}:{}-{}",
            self.names[next.tid as usize],
            next.start,
            next.end
        );
        self.reader.fetch((
            next.tid,
            i64::from(next.start) - 1,
            i64::from(next.end),
        ))?;
        self.active = Some(next);
        Ok(true)
    }
}

impl SequentialReader for BamSequentialReader {
    fn next_read(&mut self) -> Option<Result<Arc<AlignedRead>>> {
        loop {
            if self.active.is_none() {
                match self.start_next_fetch() {
                    Ok(true) => {}
                    Ok(false) => return None,
                    Err(err) => return Some(Err(err)),
                }
            }
            match self.reader.read(&mut self.record) {
                None => match self.start_next_fetch() {
                    Ok(true) => {}
                    Ok(false) => return None,
                    Err(err) => return Some(Err(err)),
                },
                Some(Err(err)) => return Some(Err(err.into())),
                Some(Ok(())) => {
                    if !self.filter.filter_read(&self.record) {
                        continue;
                    }
                    let start = (self.record.pos() + 1) as u32;
                    if start <= self.skip_through {
                        continue;
                    }
                    let tid = self.record.tid() as usize;
                    let read = to_aligned(&self.record, &self.names[tid]);
                    return Some(Ok(Arc::new(read)));
                }
            }
        }
    }
}

/// Point queries against an indexed BAM/CRAM.
pub struct BamRandomReader {
    reader: bam::IndexedReader,
    record: Record,
    filter: MappedReadFilter,
}

impl BamRandomReader {
    pub fn open(path: &Path, filter: MappedReadFilter) -> Result<Self> {
        Ok(Self {
            reader: open_indexed(path)?,
            record: Record::new(),
            filter,
        })
    }
}

impl RandomAccessReader for BamRandomReader {
    fn overlapping(&mut self, position: &GenomicPosition) -> Result<Vec<Arc<AlignedRead>>> {
        let tid = self
            .reader
            .header()
            .tid(position.contig().as_bytes())
            .ok_or_else(|| SupernovoError::UnknownContig(position.contig().to_string()))?;
        let pos = i64::from(position.position());
        self.reader.fetch((tid, pos - 1, pos))?;
        let mut reads = Vec::new();
        while let Some(result) = self.reader.read(&mut self.record) {
            result?;
            if !self.filter.filter_read(&self.record) {
                continue;
            }
            let read = to_aligned(&self.record, position.contig());
            if read.overlaps(position) {
                reads.push(Arc::new(read));
            }
        }
        Ok(reads)
    }
}

/// Sequence dictionary from the header of an alignment file.
pub fn read_dictionary(path: &Path) -> Result<SequenceDictionary> {
    let reader = open_indexed(path)?;
    Ok(SequenceDictionary::from_header(reader.header()))
}
