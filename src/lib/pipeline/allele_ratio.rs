//! Alternate allele fraction histogram of a single-sample gVCF.
//!
//! Each record's `AD` is reduced to the reference depth and the deepest alternate depth; sites
//! passing both depth floors add one count to the smallest bin edge at or above their alternate
//! fraction. A contaminated sample shows up as mass in the low bins.

use log::{debug, info};
use rust_htslib::bcf::{self, Read};
use std::io::Write;
use std::path::Path;

use crate::core::error::{Result, SupernovoError};

pub const DEFAULT_BINS: usize = 100;
pub const DEFAULT_MIN_ALT_DEPTH: u32 = 3;
pub const DEFAULT_MIN_DEPTH: u32 = 3;

/// Upper bin edges `1/n, 2/n, ..., 1`.
pub fn calculate_bins(n: usize) -> Vec<f64> {
    (1..=n).map(|i| i as f64 / n as f64).collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct AlleleRatio {
    bins: Vec<f64>,
    counts: Vec<u64>,
    min_alt_depth: u32,
    min_depth: u32,
}

impl AlleleRatio {
    pub fn new(bins: Vec<f64>, min_alt_depth: u32, min_depth: u32) -> Result<Self> {
        if bins.is_empty() {
            return Err(SupernovoError::Config("at least one bin is required".to_string()));
        }
        Ok(Self {
            counts: vec![0; bins.len()],
            bins,
            min_alt_depth,
            min_depth,
        })
    }

    pub fn bins(&self) -> &[f64] {
        &self.bins
    }

    pub fn counts(&self) -> &[u64] {
        &self.counts
    }

    /// Count one site from its allelic depths, reference first. Negative values are missing.
    ///
    /// Returns whether the site was counted.
    pub fn add_depths(&mut self, ad: &[i32]) -> bool {
        let depth = |d: i32| u32::try_from(d).ok();
        let ref_depth = match ad.first().copied().and_then(depth) {
            Some(d) => d,
            None => return false,
        };
        let alt_depth = ad[1..].iter().filter_map(|d| depth(*d)).max().unwrap_or(0);
        let biallelic = ref_depth + alt_depth;
        if alt_depth < self.min_alt_depth || biallelic < self.min_depth || biallelic == 0 {
            return false;
        }
        let ratio = f64::from(alt_depth) / f64::from(biallelic);
        let bin = self
            .bins
            .partition_point(|edge| *edge < ratio)
            .min(self.bins.len() - 1);
        self.counts[bin] += 1;
        true
    }

    /// Two tab-separated lines: bin edges, then counts.
    pub fn write<W: Write>(&self, writer: &mut csv::Writer<W>) -> Result<()> {
        writer.write_record(self.bins.iter().map(|b| b.to_string()))?;
        writer.write_record(self.counts.iter().map(|c| c.to_string()))?;
        writer.flush()?;
        Ok(())
    }
}

/// Bin every record of a single-sample VCF/gVCF.
pub fn allele_ratio_from_vcf(path: &Path, mut ratio: AlleleRatio) -> Result<AlleleRatio> {
    if !path.exists() {
        return Err(SupernovoError::FileNotFound(path.display().to_string()));
    }
    let mut reader = bcf::Reader::from_path(path)?;
    let samples = reader.header().sample_count();
    if samples != 1 {
        return Err(SupernovoError::InvalidInput(format!(
            "{} is not a single-sample gVCF: {} samples",
            path.display(),
            samples
        )));
    }

    let (mut seen, mut counted) = (0usize, 0usize);
    for record in reader.records() {
        let record = record?;
        seen += 1;
        let ad = match record.format(b"AD").integer() {
            Ok(values) => values.first().map(|sample| sample.to_vec()),
            Err(_) => None,
        };
        match ad {
            Some(ad) if ratio.add_depths(&ad) => counted += 1,
            Some(_) => {}
            None => debug!("record {} has no AD", seen),
        }
    }
    info!(
        "{} of {} records from {} binned",
        counted,
        seen,
        path.display()
    );
    Ok(ratio)
}
