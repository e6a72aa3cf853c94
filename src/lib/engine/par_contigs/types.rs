use lazy_static::lazy_static;

use crate::core::error::Result;

lazy_static! {
    /// Logical CPU count as a string, for CLI defaults.
    pub static ref DEFAULT_THREADS_STR: String = num_cpus::get().to_string();
}

/// One contig to process, with its rank in the sequence dictionary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContigTask {
    pub rank: usize,
    pub contig: String,
}

/// Everything one contig produced, or why it failed.
#[derive(Debug)]
pub struct ContigBatch<P> {
    pub rank: usize,
    pub contig: String,
    pub results: Result<Vec<P>>,
}

/// Trait defining how a single contig is processed.
pub trait ContigProcessor {
    /// The type returned when processing a contig.
    type P: 'static + Send;

    /// Process every candidate on `contig`, returning results in position order.
    fn process_contig(&self, contig: &str) -> Result<Vec<Self::P>>;
}
