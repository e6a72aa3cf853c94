//! Candidate sites: the child's heterozygous VCF calls, or every covered reference base.

use bio::io::fasta;
use log::{debug, warn};
use rust_htslib::bcf::{self, Read};
use rustc_hash::FxHashMap;
use std::fs::File;
use std::path::Path;

use crate::core::error::{Result, SupernovoError};
use crate::engine::allele::SnpAllele;
use crate::engine::position::{GenomicPosition, ReferencePosition};

/// One child genotype call from a VCF record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantCall {
    position: GenomicPosition,
    /// Reference first.
    alleles: Vec<Vec<u8>>,
    /// Allele indices of the child's genotype; `None` when uncalled.
    genotype: Vec<Option<usize>>,
}

impl VariantCall {
    pub fn new(position: GenomicPosition, alleles: Vec<Vec<u8>>, genotype: Vec<Option<usize>>) -> Self {
        Self {
            position,
            alleles,
            genotype,
        }
    }

    pub fn position(&self) -> &GenomicPosition {
        &self.position
    }

    fn called(&self) -> Option<(usize, usize)> {
        match self.genotype.as_slice() {
            [Some(a), Some(b)] => Some((*a, *b)),
            _ => None,
        }
    }

    /// Heterozygous with the reference, with at least one called allele a single base long.
    pub fn is_candidate(&self) -> bool {
        let (a, b) = match self.called() {
            Some(pair) => pair,
            None => return false,
        };
        if a == b || (a != 0 && b != 0) {
            return false;
        }
        [a, b]
            .iter()
            .filter_map(|i| self.alleles.get(*i))
            .any(|allele| allele.len() == 1)
    }

    /// The reference position for the genotype's ref/alt pair.
    pub fn reference_position(&self) -> Result<ReferencePosition> {
        let malformed = |reason: &str| {
            SupernovoError::unsupported_variant(
                self.position.contig(),
                self.position.position(),
                reason,
            )
        };
        let (a, b) = self.called().ok_or_else(|| malformed("child genotype is not diploid"))?;
        let alt_index = if a == 0 { b } else { a };
        let ref_bases = self.alleles.first().ok_or_else(|| malformed("no alleles"))?;
        let alt_bases = self
            .alleles
            .get(alt_index)
            .ok_or_else(|| malformed("genotype refers to a missing allele"))?;
        ReferencePosition::from_alleles(self.position.clone(), ref_bases, alt_bases)
    }
}

/// The child's calls on `contig` from an indexed VCF/BCF, in file order.
///
/// A contig the VCF does not index yields no calls.
pub fn read_vcf_calls(path: &Path, contig: &str, child: &str) -> Result<Vec<VariantCall>> {
    let mut reader = bcf::IndexedReader::from_path(path)?;
    let sample = reader
        .header()
        .sample_id(child.as_bytes())
        .ok_or_else(|| SupernovoError::SampleNotFound(child.to_string()))?;
    let rid = match reader.header().name2rid(contig.as_bytes()) {
        Ok(rid) => rid,
        Err(_) => {
            debug!("{} has no records on {}", path.display(), contig);
            return Ok(Vec::new());
        }
    };
    if let Err(err) = reader.fetch(rid, 0, None) {
        debug!("{}: cannot fetch {}: {}", path.display(), contig, err);
        return Ok(Vec::new());
    }

    let mut calls = Vec::new();
    for record in reader.records() {
        let record = record?;
        let position = GenomicPosition::new(contig, (record.pos() + 1) as u32);
        let alleles = record.alleles().into_iter().map(|a| a.to_vec()).collect();
        let genotypes = record.genotypes()?;
        let genotype = genotypes
            .get(sample)
            .iter()
            .map(|allele| allele.index().map(|i| i as usize))
            .collect();
        calls.push(VariantCall::new(position, alleles, genotype));
    }
    Ok(calls)
}

/// Reference bases by position.
pub trait ReferenceBases {
    /// The upper-cased base at a 1-based position, or `None` past the contig end.
    fn base(&mut self, position: &GenomicPosition) -> Result<Option<u8>>;
}

/// Whole contig sequences held in memory.
impl ReferenceBases for FxHashMap<String, Vec<u8>> {
    fn base(&mut self, position: &GenomicPosition) -> Result<Option<u8>> {
        let sequence = self
            .get(position.contig())
            .ok_or_else(|| SupernovoError::UnknownContig(position.contig().to_string()))?;
        Ok(sequence
            .get(position.position() as usize - 1)
            .map(u8::to_ascii_uppercase))
    }
}

const WINDOW_SIZE: u64 = 1 << 20;

/// Indexed FASTA access through a sliding window of about a megabase.
pub struct ReferenceWindow {
    reader: fasta::IndexedReader<File>,
    contig: String,
    start: u64,
    bases: Vec<u8>,
}

impl ReferenceWindow {
    /// Open `path`; its `.fai` index must exist alongside.
    pub fn open(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(SupernovoError::FileNotFound(path.display().to_string()));
        }
        let reader = fasta::IndexedReader::from_file(&path).map_err(|e| {
            SupernovoError::ReferenceGenome(format!(
                "cannot open {} (is it indexed with samtools faidx?): {}",
                path.display(),
                e
            ))
        })?;
        Ok(Self {
            reader,
            contig: String::new(),
            start: 0,
            bases: Vec::new(),
        })
    }

    fn load(&mut self, contig: &str, offset: u64) -> Result<()> {
        let length = self
            .reader
            .index
            .sequences()
            .into_iter()
            .find(|s| s.name == contig)
            .map(|s| s.len)
            .ok_or_else(|| SupernovoError::UnknownContig(contig.to_string()))?;
        let end = (offset + WINDOW_SIZE).min(length);
        self.bases.clear();
        if offset < end {
            self.reader
                .fetch(contig, offset, end)
                .and_then(|_| self.reader.read(&mut self.bases))
                .map_err(|e| {
                    SupernovoError::ReferenceGenome(format!("{}:{}-{}: {}", contig, offset, end, e))
                })?;
        }
        self.bases.make_ascii_uppercase();
        self.contig = contig.to_string();
        self.start = offset;
        Ok(())
    }
}

impl ReferenceBases for ReferenceWindow {
    fn base(&mut self, position: &GenomicPosition) -> Result<Option<u8>> {
        let offset = u64::from(position.position()) - 1;
        let inside = self.contig == position.contig()
            && offset >= self.start
            && offset < self.start + self.bases.len() as u64;
        if !inside {
            self.load(position.contig(), offset)?;
        }
        Ok(self.bases.get((offset - self.start) as usize).copied())
    }
}

/// A reference-only position for scanning, when the base is A, C, G or T.
pub fn scan_position(
    reference: &mut dyn ReferenceBases,
    position: &GenomicPosition,
) -> Result<Option<ReferencePosition>> {
    match reference.base(position)? {
        Some(base) if SnpAllele::of(base).is_called() => Ok(Some(ReferencePosition::reference_only(
            position.clone(),
            base,
        ))),
        Some(_) => Ok(None),
        None => {
            warn!("{} lies past the end of the reference contig", position);
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::allele::PileAllele;
    use std::io::Write;
    use tempfile::tempdir;

    fn call(alleles: &[&str], genotype: &[Option<usize>]) -> VariantCall {
        VariantCall::new(
            GenomicPosition::new("chr1", 100),
            alleles.iter().map(|a| a.as_bytes().to_vec()).collect(),
            genotype.to_vec(),
        )
    }

    #[test]
    fn only_ref_heterozygotes_are_candidates() {
        assert!(call(&["A", "G"], &[Some(0), Some(1)]).is_candidate());
        assert!(call(&["A", "G"], &[Some(1), Some(0)]).is_candidate());
        assert!(!call(&["A", "G"], &[Some(1), Some(1)]).is_candidate());
        assert!(!call(&["A", "G"], &[Some(0), Some(0)]).is_candidate());
        assert!(!call(&["A", "G", "T"], &[Some(1), Some(2)]).is_candidate());
        assert!(!call(&["A", "G"], &[Some(0), None]).is_candidate());
        assert!(!call(&["A", "G"], &[Some(1)]).is_candidate());
        // A one-base reference is enough for an insertion call.
        assert!(call(&["A", "ATT"], &[Some(0), Some(1)]).is_candidate());
        assert!(!call(&["AC", "GT"], &[Some(0), Some(1)]).is_candidate());
    }

    #[test]
    fn reference_positions_follow_the_child_alt() {
        let snp = call(&["A", "C", "G"], &[Some(2), Some(0)])
            .reference_position()
            .unwrap();
        assert_eq!(snp.alt_allele(), Some(&PileAllele::snp(b'G')));

        let deletion = call(&["ATT", "A"], &[Some(0), Some(1)]).reference_position().unwrap();
        assert!(deletion.is_indel());

        let complex = call(&["AT", "GC"], &[Some(0), Some(1)]).reference_position();
        assert!(matches!(complex, Err(SupernovoError::UnsupportedVariant { .. })));
    }

    #[test]
    fn in_memory_reference_scan_skips_ambiguous_bases() {
        let mut reference: FxHashMap<String, Vec<u8>> = FxHashMap::default();
        reference.insert("chr1".to_string(), b"acgNT".to_vec());
        let at = |p| GenomicPosition::new("chr1", p);
        let first = scan_position(&mut reference, &at(1)).unwrap().unwrap();
        assert_eq!(first.ref_allele(), &PileAllele::snp(b'A'));
        assert!(scan_position(&mut reference, &at(4)).unwrap().is_none());
        assert!(scan_position(&mut reference, &at(9)).unwrap().is_none());
    }

    #[test]
    fn fasta_window_reads_indexed_bases() {
        let dir = tempdir().unwrap();
        let fasta_path = dir.path().join("ref.fa");
        let mut fasta = File::create(&fasta_path).unwrap();
        fasta.write_all(b">chr1\nACGTA\nCGTAC\n>chr2\nGGGG\n").unwrap();
        let mut fai = File::create(dir.path().join("ref.fa.fai")).unwrap();
        fai.write_all(b"chr1\t10\t6\t5\t6\nchr2\t4\t24\t4\t5\n").unwrap();

        let mut window = ReferenceWindow::open(&fasta_path).unwrap();
        let base = |w: &mut ReferenceWindow, c: &str, p: u32| {
            w.base(&GenomicPosition::new(c, p)).unwrap()
        };
        assert_eq!(base(&mut window, "chr1", 1), Some(b'A'));
        assert_eq!(base(&mut window, "chr1", 7), Some(b'G'));
        assert_eq!(base(&mut window, "chr2", 2), Some(b'G'));
        assert_eq!(base(&mut window, "chr1", 10), Some(b'C'));
        assert_eq!(base(&mut window, "chr1", 11), None);
        assert!(matches!(
            window.base(&GenomicPosition::new("chr9", 1)),
            Err(SupernovoError::UnknownContig(_))
        ));
        assert!(ReferenceWindow::open(&dir.path().join("missing.fa")).is_err());
    }
}
