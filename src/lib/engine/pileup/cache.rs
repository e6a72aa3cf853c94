//! Sliding-window pileup cache over one sample.

use log::{debug, info, trace};
use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::{Pileup, PileupGenerator, PileupSource};
use crate::core::error::{Result, SupernovoError};
use crate::engine::position::{GenomicPosition, ReferencePosition};
use crate::engine::reads::{RandomAccessReader, SequenceDictionary, SequentialReader};
use crate::engine::regions::TargetRegions;

/// Assumed read length; bounds how far back a haplotype search looks.
pub const READ_LENGTH: u32 = 150;

/// Pileups further than this behind the furthest position asked for are evicted.
pub const EVICTION_WINDOW: u32 = 2 * READ_LENGTH;

const LOG_INTERVAL: Duration = Duration::from_secs(10);

/// Stream-order key: dictionary rank of the contig, then position.
type StreamKey = (usize, u32);

/// Pileups for one sample, served from a forward sweep where possible.
///
/// The generator runs ahead of the caller, filling a position-keyed cache. Once the cache is
/// iterated, every generated pileup is also queued for [`PileupCache::next_pileup`] until it
/// is yielded. Points the sweep already passed without producing a pileup had no coverage.
/// Points behind the eviction watermark fall back to a random-access query.
pub struct PileupCache<S: SequentialReader, R: RandomAccessReader> {
    sample: String,
    dictionary: Arc<SequenceDictionary>,
    regions: TargetRegions,
    generator: PileupGenerator<S>,
    random: R,
    cached: BTreeMap<StreamKey, Arc<Pileup>>,
    read_ahead: VecDeque<Arc<Pileup>>,
    iterating: bool,
    /// Furthest position requested through `get` or yielded by iteration.
    cursor: Option<StreamKey>,
    last_iterated: Option<GenomicPosition>,
    last_generated: Option<GenomicPosition>,
    last_logged: Instant,
}

impl<S: SequentialReader, R: RandomAccessReader> PileupCache<S, R> {
    pub fn new(
        sample: &str,
        dictionary: Arc<SequenceDictionary>,
        regions: TargetRegions,
        sequential: S,
        random: R,
    ) -> Self {
        Self {
            sample: sample.to_string(),
            dictionary,
            generator: PileupGenerator::new(sequential, regions.clone()),
            regions,
            random,
            cached: BTreeMap::new(),
            read_ahead: VecDeque::new(),
            iterating: false,
            cursor: None,
            last_iterated: None,
            last_generated: None,
            last_logged: Instant::now(),
        }
    }

    pub fn sample(&self) -> &str {
        &self.sample
    }

    fn key(&self, position: &GenomicPosition) -> Result<StreamKey> {
        let rank = self
            .dictionary
            .rank(position.contig())
            .ok_or_else(|| SupernovoError::UnknownContig(position.contig().to_string()))?;
        Ok((rank, position.position()))
    }

    fn empty(position: &GenomicPosition) -> Arc<Pileup> {
        Arc::new(Pileup::empty(position.clone()))
    }

    fn advance_cursor(&mut self, key: StreamKey) {
        if self.cursor.map_or(true, |cursor| key > cursor) {
            self.cursor = Some(key);
        }
    }

    /// Everything generated at or after this key is still cached.
    fn watermark(&self) -> Option<StreamKey> {
        self.cursor
            .map(|(rank, position)| (rank, position.saturating_sub(EVICTION_WINDOW)))
    }

    /// The pileup at `position`.
    pub fn get(&mut self, position: &GenomicPosition) -> Result<Arc<Pileup>> {
        if !self.regions.contains(position) {
            return Ok(Self::empty(position));
        }
        let key = self.key(position)?;
        self.advance_cursor(key);
        if let Some(pileup) = self.cached.get(&key) {
            return Ok(pileup.clone());
        }

        let last_key = match &self.last_generated {
            Some(last) => Some(self.key(last)?),
            None => None,
        };
        if last_key.map_or(true, |last| key > last) && self.generator.has_next()? {
            while let Some(pileup) = self.generate_next()? {
                let generated = self.key(pileup.position())?;
                if generated == key {
                    return Ok(pileup);
                }
                if generated > key {
                    break;
                }
            }
            return Ok(Self::empty(position));
        }

        if let (Some(last), Some(watermark)) = (last_key, self.watermark()) {
            if key.0 == last.0 && key >= watermark && key <= last {
                return Ok(Self::empty(position));
            }
        }

        trace!("{}: random access at {}", self.sample, position);
        let reads = self.random.overlapping(position)?;
        Ok(Arc::new(Pileup::from_reads(position.clone(), reads)))
    }

    /// The pileup at a reference position, rebuilt with its alleles when they are indels.
    pub fn get_reference(&mut self, reference: &ReferencePosition) -> Result<Arc<Pileup>> {
        let pileup = self.get(reference.position())?;
        if reference.is_indel() {
            Ok(Arc::new(pileup.with_alleles(reference)))
        } else {
            Ok(pileup)
        }
    }

    /// The next pileup of the sweep, in stream order.
    ///
    /// Pileups generated by lookups before the first call are not replayed, so iteration has
    /// to start before any forward `get`.
    pub fn next_pileup(&mut self) -> Result<Option<Arc<Pileup>>> {
        self.iterating = true;
        self.log_progress();
        let next = match self.read_ahead.pop_front() {
            Some(pileup) => Some(pileup),
            None => match self.generate_next()? {
                Some(_) => self.read_ahead.pop_front(),
                None => None,
            },
        };
        if let Some(pileup) = &next {
            self.exclude_gap_before(pileup.position());
            self.advance_cursor(self.key(pileup.position())?);
            self.last_iterated = Some(pileup.position().clone());
        }
        Ok(next)
    }

    /// Positions between two consecutive yielded pileups had no reads.
    fn exclude_gap_before(&mut self, next: &GenomicPosition) {
        let last = match &self.last_iterated {
            Some(last) if last.contig() == next.contig() => last.position(),
            _ => return,
        };
        if last + 1 < next.position() {
            self.regions
                .exclude(next.contig(), last + 1, next.position() - 1);
        }
    }

    fn generate_next(&mut self) -> Result<Option<Arc<Pileup>>> {
        let pileup = match self.generator.next_pileup()? {
            Some(p) => Arc::new(p),
            None => return Ok(None),
        };
        let key = self.key(pileup.position())?;
        self.last_generated = Some(pileup.position().clone());
        self.cached.insert(key, pileup.clone());
        if self.iterating {
            self.read_ahead.push_back(pileup.clone());
        }
        self.evict();
        Ok(Some(pileup))
    }

    /// Drop cached pileups behind the watermark, including earlier contigs.
    ///
    /// Queued read-ahead pileups stay until they are yielded.
    fn evict(&mut self) {
        let watermark = match self.watermark() {
            Some(watermark) => watermark,
            None => return,
        };
        while let Some(entry) = self.cached.first_entry() {
            if *entry.key() >= watermark {
                break;
            }
            entry.remove();
        }
    }

    fn log_progress(&mut self) {
        if self.last_logged.elapsed() < LOG_INTERVAL {
            return;
        }
        self.last_logged = Instant::now();
        let describe = |p: &Option<GenomicPosition>| {
            p.as_ref()
                .map_or_else(|| "-".to_string(), |p| p.to_string())
        };
        info!(
            "{}: iterated to {}, piled up to {} ({} cached)",
            self.sample,
            describe(&self.last_iterated),
            describe(&self.last_generated),
            self.cached.len()
        );
        debug!("{}: {} pileups read ahead", self.sample, self.read_ahead.len());
    }
}

impl<S: SequentialReader, R: RandomAccessReader> PileupSource for PileupCache<S, R> {
    fn pileup(&mut self, position: &GenomicPosition) -> Result<Arc<Pileup>> {
        self.get(position)
    }
}

impl<S: SequentialReader, R: RandomAccessReader> Iterator for PileupCache<S, R> {
    type Item = Result<Arc<Pileup>>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_pileup().transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::allele::PileAllele;
    use crate::engine::reads::{AlignedRead, InMemoryReads, InMemoryScan, ReadBuilder};
    use std::cell::Cell;
    use std::rc::Rc;

    /// Counts random-access queries made through it.
    struct CountingReads {
        inner: InMemoryReads,
        queries: Rc<Cell<usize>>,
    }

    impl RandomAccessReader for CountingReads {
        fn overlapping(&mut self, position: &GenomicPosition) -> Result<Vec<Arc<AlignedRead>>> {
            self.queries.set(self.queries.get() + 1);
            self.inner.overlapping(position)
        }
    }

    fn at(position: u32) -> GenomicPosition {
        GenomicPosition::new("chr1", position)
    }

    fn cache_over(
        reads: Vec<AlignedRead>,
        regions: TargetRegions,
    ) -> (PileupCache<InMemoryScan, CountingReads>, Rc<Cell<usize>>) {
        let reads = InMemoryReads::new(reads);
        let queries = Rc::new(Cell::new(0));
        let dictionary = Arc::new(SequenceDictionary::new(vec![("chr1", 100_000), ("chr2", 100_000)]));
        let cache = PileupCache::new(
            "child",
            dictionary,
            regions,
            reads.scan(),
            CountingReads {
                inner: reads,
                queries: queries.clone(),
            },
        );
        (cache, queries)
    }

    fn tiled(contig: &str, starts: impl Iterator<Item = u32>) -> Vec<AlignedRead> {
        starts
            .map(|s| {
                ReadBuilder::new(&format!("{}-{}", contig, s), contig, s)
                    .bases(&[b'A'; 10])
                    .build()
            })
            .collect()
    }

    #[test]
    fn forward_gets_come_from_the_sweep() {
        let (mut cache, queries) = cache_over(tiled("chr1", (1..=200).step_by(5)), TargetRegions::all());
        let pileup = cache.get(&at(50)).unwrap();
        assert_eq!(pileup.raw_depth(&PileAllele::snp(b'A')), 2);
        let again = cache.get(&at(50)).unwrap();
        assert!(Arc::ptr_eq(&pileup, &again));
        assert!(cache.get(&at(20)).unwrap().raw_total_depth() > 0);
        assert_eq!(queries.get(), 0);
    }

    #[test]
    fn overshoot_and_proven_gaps_are_empty() {
        let mut reads = tiled("chr1", vec![10u32, 500].into_iter());
        reads.extend(tiled("chr2", vec![5u32].into_iter()));
        let (mut cache, queries) = cache_over(reads, TargetRegions::all());
        // No read covers 100; the sweep overshoots to 500.
        assert!(cache.get(&at(100)).unwrap().is_empty());
        // Behind the sweep but above the watermark.
        assert!(cache.get(&at(300)).unwrap().is_empty());
        assert_eq!(queries.get(), 0);
    }

    #[test]
    fn positions_behind_the_watermark_use_random_access() {
        let (mut cache, queries) = cache_over(tiled("chr1", (1..=2_000).step_by(5)), TargetRegions::all());
        assert!(!cache.get(&at(1_500)).unwrap().is_empty());
        let early = cache.get(&at(100)).unwrap();
        assert_eq!(queries.get(), 1);
        assert_eq!(early.raw_depth(&PileAllele::snp(b'A')), 2);
    }

    #[test]
    fn untargeted_positions_are_empty_without_io() {
        let mut regions = TargetRegions::all();
        regions.include("chr1", 1, 40);
        let (mut cache, queries) = cache_over(tiled("chr1", (1..=200).step_by(5)), regions);
        assert!(cache.get(&at(100)).unwrap().is_empty());
        assert!(!cache.get(&at(30)).unwrap().is_empty());
        assert_eq!(queries.get(), 0);
    }

    #[test]
    fn unknown_contigs_are_errors() {
        let (mut cache, _) = cache_over(tiled("chr1", (1..=20).step_by(5)), TargetRegions::all());
        assert!(matches!(
            cache.get(&GenomicPosition::new("chrUn", 5)),
            Err(SupernovoError::UnknownContig(_))
        ));
    }

    #[test]
    fn iteration_excludes_uncovered_gaps() {
        let reads = tiled("chr1", vec![10u32, 50].into_iter());
        let (mut cache, queries) = cache_over(reads, TargetRegions::all());
        let positions: Vec<u32> = cache
            .by_ref()
            .map(|p| p.unwrap().position().position())
            .collect();
        assert_eq!(positions.len(), 20);
        assert_eq!(positions[9], 19);
        assert_eq!(positions[10], 50);
        // 30 lies in the excluded gap: empty, and no random access needed.
        assert!(cache.get(&at(30)).unwrap().is_empty());
        assert_eq!(queries.get(), 0);
    }

    #[test]
    fn indel_reference_positions_rebuild_the_pileup() {
        let reads = vec![ReadBuilder::new("i", "chr1", 10)
            .cigar(vec![
                rust_htslib::bam::record::Cigar::Match(2),
                rust_htslib::bam::record::Cigar::Ins(1),
                rust_htslib::bam::record::Cigar::Match(2),
            ])
            .bases(b"CATCC")
            .build()];
        let (mut cache, _) = cache_over(reads, TargetRegions::all());
        let reference = ReferencePosition::from_alleles(at(11), b"A", b"AT").unwrap();
        let pileup = cache.get_reference(&reference).unwrap();
        assert_eq!(pileup.raw_depth(reference.alt_allele().unwrap()), 1);
        let plain = cache.get(&at(11)).unwrap();
        assert_eq!(plain.raw_depth(&PileAllele::snp(b'A')), 1);
    }

    fn island_then_far_read() -> Vec<AlignedRead> {
        let mut reads = tiled("chr1", (1..=200).step_by(5));
        reads.extend(tiled("chr1", vec![5_000u32].into_iter()));
        reads
    }

    #[test]
    fn lookups_past_an_island_keep_unyielded_pileups() {
        let (mut cache, queries) = cache_over(island_then_far_read(), TargetRegions::all());
        let first = cache.next_pileup().unwrap().unwrap();
        assert_eq!(first.position().position(), 1);
        assert!(!cache.get(&at(150)).unwrap().is_empty());
        // Runs off the island; the sweep jumps to 5000.
        assert!(cache.get(&at(250)).unwrap().is_empty());

        let rest: Vec<u32> = cache
            .by_ref()
            .map(|p| p.unwrap().position().position())
            .collect();
        let expected: Vec<u32> = (2..=209).chain(5_000..=5_009).collect();
        assert_eq!(rest, expected);
        assert_eq!(queries.get(), 0);
    }

    #[test]
    fn window_after_an_overshoot_needs_no_random_access() {
        let (mut cache, queries) = cache_over(island_then_far_read(), TargetRegions::all());
        assert!(!cache.get(&at(100)).unwrap().is_empty());
        assert!(cache.get(&at(210)).unwrap().is_empty());
        for p in 211..=350 {
            assert!(cache.get(&at(p)).unwrap().is_empty());
        }
        // Still inside the window behind the furthest lookup.
        let back = cache.get(&at(60)).unwrap();
        assert_eq!(back.raw_depth(&PileAllele::snp(b'A')), 2);
        assert_eq!(queries.get(), 0);
    }
}
