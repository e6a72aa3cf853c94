use itertools::{EitherOrBoth, Itertools};
use rust_htslib::bam::HeaderView;
use rustc_hash::FxHashMap;
use smartstring::alias::String;

use crate::core::error::{Result, SupernovoError};

/// Ordered contig names and lengths shared by every input of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SequenceDictionary {
    contigs: Vec<(String, u64)>,
    ranks: FxHashMap<String, usize>,
}

impl SequenceDictionary {
    pub fn new<I, S>(contigs: I) -> Self
    where
        I: IntoIterator<Item = (S, u64)>,
        S: Into<String>,
    {
        let contigs: Vec<(String, u64)> = contigs
            .into_iter()
            .map(|(name, len)| (name.into(), len))
            .collect();
        let ranks = contigs
            .iter()
            .enumerate()
            .map(|(rank, (name, _))| (name.clone(), rank))
            .collect();
        Self { contigs, ranks }
    }

    pub fn from_header(header: &HeaderView) -> Self {
        Self::new((0..header.target_count()).map(|tid| {
            let name = std::string::String::from_utf8_lossy(header.tid2name(tid)).into_owned();
            let len = header.target_len(tid).unwrap_or(0);
            (name, len)
        }))
    }

    /// Position of a contig in dictionary (and therefore file) order.
    #[inline]
    pub fn rank(&self, contig: &str) -> Option<usize> {
        self.ranks.get(contig).copied()
    }

    pub fn length(&self, contig: &str) -> Option<u64> {
        self.rank(contig).map(|rank| self.contigs[rank].1)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.contigs.iter().map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.contigs.iter().map(|(name, len)| (name.as_str(), *len))
    }

    pub fn len(&self) -> usize {
        self.contigs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contigs.is_empty()
    }

    /// Require `other` to list the same contigs, with the same lengths, in the same order.
    pub fn ensure_matches(&self, other: &SequenceDictionary, sample: &str, reference: &str) -> Result<()> {
        let mismatch = |detail: std::string::String| SupernovoError::DictionaryMismatch {
            sample: sample.to_string(),
            reference: reference.to_string(),
            detail,
        };
        for pair in self.contigs.iter().zip_longest(other.contigs.iter()) {
            match pair {
                EitherOrBoth::Both((name, len), (other_name, other_len)) => {
                    if name != other_name || len != other_len {
                        return Err(mismatch(format!(
                            "found {} ({} bp) where {} ({} bp) was expected",
                            other_name, other_len, name, len
                        )));
                    }
                }
                EitherOrBoth::Left((name, _)) => {
                    return Err(mismatch(format!("missing {}", name)));
                }
                EitherOrBoth::Right((other_name, _)) => {
                    return Err(mismatch(format!("unexpected extra contig {}", other_name)));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ranks_follow_insertion_order() {
        let dict = SequenceDictionary::new(vec![("chr2", 100), ("chr1", 200)]);
        assert_eq!(dict.rank("chr2"), Some(0));
        assert_eq!(dict.rank("chr1"), Some(1));
        assert_eq!(dict.rank("chr3"), None);
        assert_eq!(dict.length("chr1"), Some(200));
    }

    #[test]
    fn mismatched_dictionaries_are_rejected() {
        let child = SequenceDictionary::new(vec![("chr1", 100), ("chr2", 50)]);
        let same = SequenceDictionary::new(vec![("chr1", 100), ("chr2", 50)]);
        let shorter = SequenceDictionary::new(vec![("chr1", 100)]);
        let renamed = SequenceDictionary::new(vec![("1", 100), ("2", 50)]);
        assert!(child.ensure_matches(&same, "mother", "child").is_ok());
        assert!(matches!(
            child.ensure_matches(&shorter, "mother", "child"),
            Err(SupernovoError::DictionaryMismatch { .. })
        ));
        assert!(child.ensure_matches(&renamed, "father", "child").is_err());
    }
}
