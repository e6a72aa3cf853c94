//! Read filtering primitives applied before reads reach the pileup engine.
//!
//! This module exposes the [`ReadFilter`] trait along with [`MappedReadFilter`], the filter
//! used by the sequential BAM scan: it keeps mapped, non-duplicate reads above an optional
//! mapping-quality floor.

use rust_htslib::bam::record::Record;

/// A trait for filtering reads based on various criteria.
///
/// Implementations should return `true` if the read passes the filter and `false`
/// otherwise.
pub trait ReadFilter {
    /// Filter a read based on various criteria.
    fn filter_read(&self, read: &Record) -> bool;
}

/// Keeps mapped, non-duplicate reads.
#[derive(Debug, Clone, Copy, Default)]
pub struct MappedReadFilter {
    /// Minimum mapping quality for a read to pass filtering.
    min_mapq: u8,
}

impl MappedReadFilter {
    /// Create a new [`MappedReadFilter`] with the specified mapping-quality floor.
    pub fn new(min_mapq: u8) -> Self {
        Self { min_mapq }
    }
}

impl ReadFilter for MappedReadFilter {
    #[inline(always)]
    fn filter_read(&self, read: &Record) -> bool {
        !read.is_unmapped() && !read.is_duplicate() && read.mapq() >= self.min_mapq
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const UNMAPPED: u16 = 0x4;
    const DUPLICATE: u16 = 0x400;

    fn record(flags: u16, mapq: u8) -> Record {
        let mut record = Record::new();
        record.set_flags(flags);
        record.set_mapq(mapq);
        record
    }

    #[test]
    fn rejects_unmapped_and_duplicate_reads() {
        let filter = MappedReadFilter::default();
        assert!(!filter.filter_read(&record(UNMAPPED, 60)));
        assert!(!filter.filter_read(&record(DUPLICATE, 60)));
        assert!(filter.filter_read(&record(0, 0)));
    }

    #[test]
    fn applies_mapping_quality_floor() {
        let filter = MappedReadFilter::new(20);
        assert!(!filter.filter_read(&record(0, 10)));
        assert!(filter.filter_read(&record(0, 25)));
    }
}
