//! Include/exclude interval sets that decide which positions get piled up.
//!
//! A [`TargetRegions`] is an optional whitelist plus a blacklist. A position is targeted
//! when it lies in the whitelist (or there is none) and not in the blacklist. The blacklist
//! also grows at run time: the pileup cache excludes stretches it has proven carry no reads.

use bio::io::bed;
use log::debug;
use rust_lapper::{Interval, Lapper};
use rustc_hash::FxHashMap;
use smartstring::alias::String;
use std::collections::BTreeMap;
use std::path::Path;

use crate::core::error::{Result, SupernovoError};
use crate::engine::position::GenomicPosition;

fn region_error(path: &Path, err: impl std::fmt::Display) -> SupernovoError {
    SupernovoError::InvalidRegion(format!("{}: {}", path.display(), err))
}

/// Disjoint, closed, 1-based intervals keyed by contig.
#[derive(Debug, Clone, Default)]
struct IntervalSet {
    by_contig: FxHashMap<String, BTreeMap<u32, u32>>,
}

impl IntervalSet {
    /// Add `[start, end]`, merging with anything it overlaps or touches.
    fn insert(&mut self, contig: &str, mut start: u32, mut end: u32) {
        if start > end {
            return;
        }
        let intervals = self.by_contig.entry(contig.into()).or_default();
        let touching: Vec<u32> = intervals
            .range(..=end.saturating_add(1))
            .rev()
            .take_while(|&(_, &e)| e.saturating_add(1) >= start)
            .map(|(&s, _)| s)
            .collect();
        for s in touching {
            if let Some(e) = intervals.remove(&s) {
                start = start.min(s);
                end = end.max(e);
            }
        }
        intervals.insert(start, end);
    }

    fn contains(&self, contig: &str, position: u32) -> bool {
        self.by_contig.get(contig).map_or(false, |intervals| {
            intervals
                .range(..=position)
                .next_back()
                .map_or(false, |(_, &end)| position <= end)
        })
    }

    fn intervals(&self, contig: &str) -> impl Iterator<Item = (u32, u32)> + '_ {
        self.by_contig
            .get(contig)
            .into_iter()
            .flat_map(|intervals| intervals.iter().map(|(&s, &e)| (s, e)))
    }

    fn has_contig(&self, contig: &str) -> bool {
        self.by_contig
            .get(contig)
            .map_or(false, |intervals| !intervals.is_empty())
    }

    fn restricted_to(&self, contig: &str) -> Self {
        let mut by_contig = FxHashMap::default();
        if let Some(intervals) = self.by_contig.get(contig) {
            by_contig.insert(contig.into(), intervals.clone());
        }
        Self { by_contig }
    }

    /// Load a BED file, merging overlapping records per contig.
    fn from_bed(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(SupernovoError::FileNotFound(path.display().to_string()));
        }
        let mut reader = bed::Reader::from_file(path).map_err(|e| region_error(path, e))?;
        let mut raw: FxHashMap<String, Vec<Interval<u32, ()>>> = FxHashMap::default();
        for (i, record) in reader.records().enumerate() {
            let record = record.map_err(|e| region_error(path, e))?;
            if record.end() < record.start() {
                return Err(SupernovoError::InvalidRegion(format!(
                    "{}: record {} has end < start",
                    path.display(),
                    i
                )));
            }
            // BED is 0-based half-open; keep 1-based half-open here and close it below.
            raw.entry(record.chrom().into())
                .or_default()
                .push(Interval {
                    start: record.start() as u32 + 1,
                    stop: record.end() as u32 + 1,
                    val: (),
                });
        }

        let mut set = IntervalSet::default();
        for (contig, intervals) in raw {
            let mut lapper = Lapper::new(intervals);
            lapper.merge_overlaps();
            for iv in lapper.iter() {
                if iv.stop > iv.start {
                    set.insert(&contig, iv.start, iv.stop - 1);
                }
            }
        }
        debug!(
            "Loaded {} contigs of intervals from {}",
            set.by_contig.len(),
            path.display()
        );
        Ok(set)
    }
}

/// The positions a run is allowed to look at.
#[derive(Debug, Clone, Default)]
pub struct TargetRegions {
    include: Option<IntervalSet>,
    exclude: IntervalSet,
}

impl TargetRegions {
    /// Every position on every contig.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn from_beds(whitelist: Option<&Path>, blacklist: Option<&Path>) -> Result<Self> {
        let include = whitelist.map(IntervalSet::from_bed).transpose()?;
        let exclude = match blacklist {
            Some(path) => IntervalSet::from_bed(path)?,
            None => IntervalSet::default(),
        };
        Ok(Self { include, exclude })
    }

    /// Restrict to an explicit whitelist interval; mostly useful for tests.
    pub fn include(&mut self, contig: &str, start: u32, end: u32) {
        self.include
            .get_or_insert_with(IntervalSet::default)
            .insert(contig, start, end);
    }

    /// Exclude `[start, end]` from now on.
    pub fn exclude(&mut self, contig: &str, start: u32, end: u32) {
        self.exclude.insert(contig, start, end);
    }

    pub fn contains(&self, position: &GenomicPosition) -> bool {
        self.contains_at(position.contig(), position.position())
    }

    #[inline]
    pub fn contains_at(&self, contig: &str, position: u32) -> bool {
        let included = self
            .include
            .as_ref()
            .map_or(true, |set| set.contains(contig, position));
        included && !self.exclude.contains(contig, position)
    }

    /// Whether any whitelisted position exists on `contig`.
    pub fn covers_contig(&self, contig: &str) -> bool {
        self.include
            .as_ref()
            .map_or(true, |set| set.has_contig(contig))
    }

    /// Whitelisted closed intervals on `contig`, clipped to `[1, length]`.
    ///
    /// Without a whitelist this is the whole contig. The blacklist is not applied here.
    pub fn fetch_intervals(&self, contig: &str, length: u64) -> Vec<(u32, u32)> {
        let length = length.min(u64::from(u32::MAX)) as u32;
        if length == 0 {
            return Vec::new();
        }
        match &self.include {
            None => vec![(1, length)],
            Some(set) => set
                .intervals(contig)
                .filter(|&(start, _)| start <= length)
                .map(|(start, end)| (start.max(1), end.min(length)))
                .collect(),
        }
    }

    /// A copy that only knows about `contig`.
    pub fn restricted_to(&self, contig: &str) -> Self {
        Self {
            include: self.include.as_ref().map(|set| set.restricted_to(contig)),
            exclude: self.exclude.restricted_to(contig),
        }
    }
}
