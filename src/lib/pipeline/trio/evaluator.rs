//! Trio evaluation: candidate sites in, [`DeNovoResult`]s out.

use log::{debug, error, info};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::candidates::{read_vcf_calls, scan_position, ReferenceBases, ReferenceWindow, VariantCall};
use super::classify::looks_variant;
use super::haplotype::HaplotypeEvaluator;
use super::result::{DeNovoResult, TrioIds, TrioPileups};
use crate::core::error::Result;
use crate::core::read_filter::MappedReadFilter;
use crate::engine::par_contigs::{ContigProcessor, ContigTask};
use crate::engine::pileup::PileupCache;
use crate::engine::position::ReferencePosition;
use crate::engine::reads::{
    read_dictionary, BamRandomReader, BamSequentialReader, RandomAccessReader, SequenceDictionary,
    SequentialReader,
};
use crate::engine::regions::TargetRegions;

/// What happened to one candidate call.
#[derive(Debug)]
pub enum CandidateOutcome {
    /// Not a heterozygous call against the reference.
    Skipped,
    /// Alleles that cannot be modelled.
    Malformed,
    /// The child's reads do not look variant here.
    NoSignal,
    Emitted(Box<DeNovoResult>),
}

/// Evaluates candidates against pileup caches of the child and both parents.
pub struct TrioEvaluator<S: SequentialReader, R: RandomAccessReader> {
    ids: TrioIds,
    child: PileupCache<S, R>,
    parent1: PileupCache<S, R>,
    parent2: PileupCache<S, R>,
}

impl<S: SequentialReader, R: RandomAccessReader> TrioEvaluator<S, R> {
    pub fn new(
        ids: TrioIds,
        child: PileupCache<S, R>,
        parent1: PileupCache<S, R>,
        parent2: PileupCache<S, R>,
    ) -> Self {
        Self {
            ids,
            child,
            parent1,
            parent2,
        }
    }

    /// Full evaluation of one site, or `None` when the child does not look variant.
    pub fn evaluate(&mut self, reference: &ReferencePosition) -> Result<Option<DeNovoResult>> {
        let child = self.child.get_reference(reference)?;
        if !looks_variant(&child.depth()) {
            return Ok(None);
        }
        let haplotype =
            HaplotypeEvaluator::new(&child, &mut self.child, &mut self.parent1, &mut self.parent2)
                .evaluate()?;
        let parent1 = self.parent1.get_reference(reference)?;
        let parent2 = self.parent2.get_reference(reference)?;
        Ok(Some(DeNovoResult::new(
            reference.clone(),
            haplotype,
            &self.ids,
            TrioPileups {
                child: &child,
                parent1: &parent1,
                parent2: &parent2,
            },
        )))
    }

    pub fn evaluate_call(&mut self, call: &VariantCall) -> Result<CandidateOutcome> {
        if !call.is_candidate() {
            return Ok(CandidateOutcome::Skipped);
        }
        let reference = match call.reference_position() {
            Ok(reference) => reference,
            Err(err) => {
                error!("Skipping candidate: {}", err);
                return Ok(CandidateOutcome::Malformed);
            }
        };
        Ok(match self.evaluate(&reference)? {
            Some(result) => CandidateOutcome::Emitted(Box::new(result)),
            None => CandidateOutcome::NoSignal,
        })
    }

    /// Evaluate calls in order, keeping the emitted results.
    pub fn evaluate_calls(&mut self, calls: &[VariantCall]) -> Result<Vec<DeNovoResult>> {
        let (mut skipped, mut malformed, mut silent) = (0usize, 0usize, 0usize);
        let mut results = Vec::new();
        for call in calls {
            match self.evaluate_call(call)? {
                CandidateOutcome::Skipped => skipped += 1,
                CandidateOutcome::Malformed => malformed += 1,
                CandidateOutcome::NoSignal => silent += 1,
                CandidateOutcome::Emitted(result) => results.push(*result),
            }
        }
        debug!(
            "{}: {} calls, {} emitted, {} not candidates, {} malformed, {} without signal",
            self.ids.child,
            calls.len(),
            results.len(),
            skipped,
            malformed,
            silent
        );
        Ok(results)
    }

    /// Evaluate every position the child's sweep covers whose reference base is A, C, G or T.
    pub fn scan_reference(&mut self, reference: &mut dyn ReferenceBases) -> Result<Vec<DeNovoResult>> {
        let mut results = Vec::new();
        while let Some(pileup) = self.child.next_pileup()? {
            if !looks_variant(&pileup.depth()) {
                continue;
            }
            if let Some(position) = scan_position(reference, pileup.position())? {
                results.extend(self.evaluate(&position)?);
            }
        }
        Ok(results)
    }
}

/// Where candidate sites come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CandidateSource {
    Vcf(PathBuf),
    Fasta(PathBuf),
}

/// Alignment files of a trio.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrioBams {
    pub child: PathBuf,
    pub parent1: PathBuf,
    pub parent2: PathBuf,
}

type BamCache = PileupCache<BamSequentialReader, BamRandomReader>;

/// Per-contig trio evaluation over indexed BAM/CRAM files.
pub struct BamTrioProcessor {
    ids: TrioIds,
    bams: TrioBams,
    source: CandidateSource,
    regions: TargetRegions,
    dictionary: Arc<SequenceDictionary>,
    filter: MappedReadFilter,
}

impl BamTrioProcessor {
    /// Fails unless all three alignment headers share one sequence dictionary.
    pub fn new(
        ids: TrioIds,
        bams: TrioBams,
        source: CandidateSource,
        regions: TargetRegions,
        filter: MappedReadFilter,
    ) -> Result<Self> {
        let dictionary = read_dictionary(&bams.child)?;
        for (id, path) in [(&ids.parent1, &bams.parent1), (&ids.parent2, &bams.parent2)] {
            dictionary.ensure_matches(&read_dictionary(path)?, id, &ids.child)?;
        }
        info!(
            "{} contigs shared by {}, {} and {}",
            dictionary.len(),
            ids.child,
            ids.parent1,
            ids.parent2
        );
        Ok(Self {
            ids,
            bams,
            source,
            regions,
            dictionary: Arc::new(dictionary),
            filter,
        })
    }

    pub fn dictionary(&self) -> &SequenceDictionary {
        &self.dictionary
    }

    /// Contigs with any targeted territory, in dictionary order.
    pub fn tasks(&self) -> Vec<ContigTask> {
        self.dictionary
            .names()
            .enumerate()
            .filter(|(_, name)| self.regions.covers_contig(name))
            .map(|(rank, name)| ContigTask {
                rank,
                contig: name.to_string(),
            })
            .collect()
    }

    fn open_cache(
        &self,
        sample: &str,
        path: &Path,
        contig: &str,
        regions: &TargetRegions,
    ) -> Result<BamCache> {
        Ok(PileupCache::new(
            sample,
            self.dictionary.clone(),
            regions.clone(),
            BamSequentialReader::open(path, regions, Some(contig), self.filter)?,
            BamRandomReader::open(path, self.filter)?,
        ))
    }
}

impl ContigProcessor for BamTrioProcessor {
    type P = DeNovoResult;

    fn process_contig(&self, contig: &str) -> Result<Vec<DeNovoResult>> {
        let regions = self.regions.restricted_to(contig);
        let mut evaluator = TrioEvaluator::new(
            self.ids.clone(),
            self.open_cache(&self.ids.child, &self.bams.child, contig, &regions)?,
            self.open_cache(&self.ids.parent1, &self.bams.parent1, contig, &regions)?,
            self.open_cache(&self.ids.parent2, &self.bams.parent2, contig, &regions)?,
        );
        let results = match &self.source {
            CandidateSource::Vcf(path) => {
                let calls = read_vcf_calls(path, contig, &self.ids.child)?;
                evaluator.evaluate_calls(&calls)?
            }
            CandidateSource::Fasta(path) => {
                let mut reference = ReferenceWindow::open(path)?;
                evaluator.scan_reference(&mut reference)?
            }
        };
        debug!("{}: {} results", contig, results.len());
        Ok(results)
    }
}
