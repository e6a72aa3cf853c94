use std::fmt;

use super::GenomicPosition;
use crate::core::error::{Result, SupernovoError};
use crate::engine::allele::PileAllele;

/// A position with its reference allele and, when known, one alternate allele.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ReferencePosition {
    position: GenomicPosition,
    ref_allele: PileAllele,
    alt_allele: Option<PileAllele>,
}

impl ReferencePosition {
    /// A reference base with no alternate allele.
    pub fn reference_only(position: GenomicPosition, ref_base: u8) -> Self {
        Self {
            position,
            ref_allele: PileAllele::snp(ref_base),
            alt_allele: None,
        }
    }

    /// Map a ref/alt pair onto pileup alleles.
    ///
    /// Two single bases map to SNPs. A single base against a longer allele sharing its first
    /// base maps to an insertion (the longer allele) and its non-insertion companion. Anything
    /// else is unsupported.
    pub fn from_alleles(position: GenomicPosition, ref_bases: &[u8], alt_bases: &[u8]) -> Result<Self> {
        let unsupported = |reason: String| {
            SupernovoError::unsupported_variant(position.contig(), position.position(), reason)
        };
        let (ref_allele, alt_allele) = match (ref_bases.len(), alt_bases.len()) {
            (1, 1) => (PileAllele::snp(ref_bases[0]), PileAllele::snp(alt_bases[0])),
            (1, n) | (n, 1) if n > 1 => {
                if !ref_bases[0].eq_ignore_ascii_case(&alt_bases[0]) {
                    return Err(unsupported(format!(
                        "alleles {} and {} do not share an anchor base",
                        String::from_utf8_lossy(ref_bases),
                        String::from_utf8_lossy(alt_bases)
                    )));
                }
                let ref_is_longer = ref_bases.len() > 1;
                let longer = if ref_is_longer { ref_bases } else { alt_bases };
                let (insertion, non_insertion) = PileAllele::insertion_pair(longer[0], &longer[1..]);
                if ref_is_longer {
                    (insertion, non_insertion)
                } else {
                    (non_insertion, insertion)
                }
            }
            _ => {
                return Err(unsupported(format!(
                    "cannot pile up {} -> {}",
                    String::from_utf8_lossy(ref_bases),
                    String::from_utf8_lossy(alt_bases)
                )))
            }
        };
        Ok(Self {
            position,
            ref_allele,
            alt_allele: Some(alt_allele),
        })
    }

    #[inline]
    pub fn position(&self) -> &GenomicPosition {
        &self.position
    }

    #[inline]
    pub fn ref_allele(&self) -> &PileAllele {
        &self.ref_allele
    }

    #[inline]
    pub fn alt_allele(&self) -> Option<&PileAllele> {
        self.alt_allele.as_ref()
    }

    /// Whether the alleles need an indel-aware pileup.
    pub fn is_indel(&self) -> bool {
        !self.ref_allele.is_snp() || self.alt_allele.as_ref().map_or(false, |a| !a.is_snp())
    }
}

impl fmt::Display for ReferencePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.position, self.ref_allele)?;
        if let Some(alt) = &self.alt_allele {
            write!(f, ">{}", alt)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(position: u32) -> GenomicPosition {
        GenomicPosition::new("chr1", position)
    }

    #[test]
    fn single_bases_become_snps() {
        let rp = ReferencePosition::from_alleles(at(10), b"A", b"g").unwrap();
        assert_eq!(rp.ref_allele(), &PileAllele::snp(b'A'));
        assert_eq!(rp.alt_allele(), Some(&PileAllele::snp(b'G')));
        assert!(!rp.is_indel());
    }

    #[test]
    fn longer_allele_becomes_the_insertion() {
        let (ins, non) = PileAllele::insertion_pair(b'A', b"TT");
        let gained = ReferencePosition::from_alleles(at(10), b"A", b"ATT").unwrap();
        assert_eq!(gained.ref_allele(), &non);
        assert_eq!(gained.alt_allele(), Some(&ins));

        let lost = ReferencePosition::from_alleles(at(10), b"ATT", b"A").unwrap();
        assert_eq!(lost.ref_allele(), &ins);
        assert_eq!(lost.alt_allele(), Some(&non));
        assert!(lost.is_indel());
    }

    #[test]
    fn unsupported_shapes_are_rejected() {
        let cases: [(&[u8], &[u8]); 3] = [(b"AT", b"GC"), (b"C", b"ATT"), (b"AC", b"ACT")];
        for (r, a) in cases {
            assert!(matches!(
                ReferencePosition::from_alleles(at(5), r, a),
                Err(SupernovoError::UnsupportedVariant { position: 5, .. })
            ));
        }
    }
}
