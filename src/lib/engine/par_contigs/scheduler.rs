use crossbeam::channel::{bounded, Receiver, Sender};
use log::*;
use rayon::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

use super::types::{ContigBatch, ContigProcessor, ContigTask};
use crate::core::error::{Result, SupernovoError};

/// Parallel contig executor driven by [`ContigProcessor`] implementations.
pub struct ParContigs<R: 'static + ContigProcessor + Send + Sync> {
    tasks: Vec<ContigTask>,
    threads: usize,
    pool: rayon::ThreadPool,
    processor: R,
}

impl<R: ContigProcessor + Send + Sync> ParContigs<R> {
    /// Create a new [`ParContigs`] executor.
    pub fn new(tasks: Vec<ContigTask>, threads: Option<usize>, processor: R) -> Result<Self> {
        let requested_threads = threads.unwrap_or_else(num_cpus::get);
        let threads = std::cmp::max(requested_threads, 1);
        info!(
            "Using {} worker threads for {} contigs.",
            threads,
            tasks.len()
        );

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build()
            .map_err(|e| SupernovoError::Config(format!("failed to build thread pool: {}", e)))?;

        Ok(Self {
            tasks,
            threads,
            pool,
            processor,
        })
    }

    /// Launch processing of every contig; batches arrive in completion order.
    pub fn process(self) -> Receiver<ContigBatch<R::P>> {
        let ParContigs {
            tasks,
            threads,
            pool,
            processor,
        } = self;

        let (sender, receiver) = bounded::<ContigBatch<R::P>>(threads.max(1));
        thread::spawn(move || {
            pool.install(move || run(tasks, processor, sender));
        });
        receiver
    }
}

fn run<R: ContigProcessor + Send + Sync>(
    tasks: Vec<ContigTask>,
    processor: R,
    sender: Sender<ContigBatch<R::P>>,
) {
    let total = tasks.len();
    let completed = AtomicUsize::new(0);
    let log_step = std::cmp::max(1, total / 10);

    tasks
        .into_par_iter()
        .for_each_with(sender, |snd, ContigTask { rank, contig }| {
            trace!("Processing contig {}", contig);
            let results = processor.process_contig(&contig);
            if let Err(err) = &results {
                error!("Contig {} failed: {}", contig, err);
            }

            let done = completed.fetch_add(1, Ordering::Relaxed) + 1;
            if done == total || done % log_step == 0 {
                info!(
                    "Processed {:.1}% ({} / {} contigs)",
                    done as f64 / total as f64 * 100.0,
                    done,
                    total
                );
            }

            if snd
                .send(ContigBatch {
                    rank,
                    contig,
                    results,
                })
                .is_err()
            {
                warn!("Channel closed; terminating contig processing early");
            }
        });
}

/// Drain `receiver` and concatenate the batches in contig rank order.
///
/// The first failed contig (in rank order) is returned as the error.
pub fn collect_ordered<P>(receiver: Receiver<ContigBatch<P>>) -> Result<Vec<P>> {
    let mut batches: Vec<ContigBatch<P>> = receiver.into_iter().collect();
    batches.sort_by_key(|batch| batch.rank);
    let mut out = Vec::new();
    for batch in batches {
        match batch.results {
            Ok(results) => out.extend(results),
            Err(err) => {
                error!("Aborting: contig {} did not complete", batch.contig);
                return Err(err);
            }
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    struct Echo;

    impl ContigProcessor for Echo {
        type P = (String, u32);

        fn process_contig(&self, contig: &str) -> Result<Vec<Self::P>> {
            if contig == "bad" {
                return Err(SupernovoError::UnknownContig(contig.to_string()));
            }
            Ok((1..=3).map(|i| (contig.to_string(), i)).collect())
        }
    }

    fn tasks(names: &[String]) -> Vec<ContigTask> {
        names
            .iter()
            .enumerate()
            .map(|(rank, contig)| ContigTask {
                rank,
                contig: contig.clone(),
            })
            .collect()
    }

    proptest! {
        #[test]
        fn results_come_back_in_rank_order(count in 0usize..40, threads in 1usize..8) {
            let names: Vec<String> = (0..count).map(|i| format!("ctg{}", i)).collect();
            let runner = ParContigs::new(tasks(&names), Some(threads), Echo).unwrap();
            let results = collect_ordered(runner.process()).unwrap();
            prop_assert_eq!(results.len(), count * 3);
            for (i, (contig, pos)) in results.iter().enumerate() {
                prop_assert_eq!(contig, &names[i / 3]);
                prop_assert_eq!(*pos, (i % 3) as u32 + 1);
            }
        }
    }

    #[test]
    fn failed_contigs_fail_the_run() {
        let names = vec!["chr1".to_string(), "bad".to_string()];
        let runner = ParContigs::new(tasks(&names), Some(2), Echo).unwrap();
        assert!(matches!(
            collect_ordered(runner.process()),
            Err(SupernovoError::UnknownContig(_))
        ));
    }
}
