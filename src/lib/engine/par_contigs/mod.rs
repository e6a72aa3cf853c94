//! Parallel per-contig execution.
//!
//! The [`ParContigs`] executor fans contigs out across a Rayon pool and streams each contig's
//! results through a bounded crossbeam channel. Callers implement [`ContigProcessor`] to
//! define per-contig work; [`collect_ordered`] puts the batches back into dictionary order.

mod scheduler;
mod types;

pub use scheduler::{collect_ordered, ParContigs};
pub use types::{ContigBatch, ContigProcessor, ContigTask, DEFAULT_THREADS_STR};
