use log::trace;
use smartstring::alias::String;
use std::collections::BTreeMap;
use std::sync::Arc;

use super::{Pileup, PileupBuilder};
use crate::core::error::Result;
use crate::engine::position::GenomicPosition;
use crate::engine::reads::{AlignedRead, SequentialReader};
use crate::engine::regions::TargetRegions;

/// Sweeps a coordinate-sorted read stream, yielding one pileup per covered target position.
///
/// Every consumed read opens (or joins) a builder at each targeted position of its aligned
/// span. The lowest pending position is finished once the next read starts after it, lives
/// on another contig, or the stream ends.
pub struct PileupGenerator<S: SequentialReader> {
    reads: S,
    regions: TargetRegions,
    contig: Option<String>,
    pending: BTreeMap<u32, PileupBuilder>,
    lookahead: Option<Arc<AlignedRead>>,
    exhausted: bool,
}

impl<S: SequentialReader> PileupGenerator<S> {
    pub fn new(reads: S, regions: TargetRegions) -> Self {
        Self {
            reads,
            regions,
            contig: None,
            pending: BTreeMap::new(),
            lookahead: None,
            exhausted: false,
        }
    }

    fn fill_lookahead(&mut self) -> Result<()> {
        if self.lookahead.is_none() && !self.exhausted {
            match self.reads.next_read() {
                Some(read) => self.lookahead = Some(read?),
                None => self.exhausted = true,
            }
        }
        Ok(())
    }

    /// Whether another pileup may still be produced.
    pub fn has_next(&mut self) -> Result<bool> {
        self.fill_lookahead()?;
        Ok(!self.pending.is_empty() || self.lookahead.is_some())
    }

    pub fn next_pileup(&mut self) -> Result<Option<Pileup>> {
        loop {
            self.fill_lookahead()?;
            let next_pending = self.pending.keys().next().copied();
            let consume = match (next_pending, &self.lookahead) {
                (Some(pos), Some(read)) => {
                    self.contig.as_deref() == Some(read.contig()) && read.start() <= pos
                }
                (Some(_), None) => false,
                (None, Some(_)) => true,
                (None, None) => return Ok(None),
            };
            if consume {
                if let Some(read) = self.lookahead.take() {
                    self.consume(read);
                }
            } else if let Some(pos) = next_pending {
                if let Some(builder) = self.pending.remove(&pos) {
                    return Ok(Some(builder.build()));
                }
            }
        }
    }

    fn consume(&mut self, read: Arc<AlignedRead>) {
        if self.contig.as_deref() != Some(read.contig()) {
            trace!("pileup sweep entering {}", read.contig());
            self.contig = Some(read.contig().into());
        }
        for pos in read.start()..=read.end() {
            if !self.regions.contains_at(read.contig(), pos) {
                continue;
            }
            self.pending
                .entry(pos)
                .or_insert_with(|| PileupBuilder::new(GenomicPosition::new(read.contig(), pos)))
                .add_read(read.clone());
        }
    }
}
