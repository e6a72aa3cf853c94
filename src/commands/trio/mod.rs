mod args;

use anyhow::{Context, Result};
use log::info;
use std::convert::TryFrom;
use supernovo_lib::core::prelude::*;
use supernovo_lib::engine::regions::TargetRegions;
use supernovo_lib::pipeline::trio::{find_de_novos, write_table, write_vcf, BamTrioProcessor};

pub use args::{TrioArgs, TrioConfig};

/// Execute the `trio` command end-to-end.
pub fn run_trio(args: TrioArgs) -> Result<()> {
    let config = TrioConfig::try_from(args)?;
    info!(
        "Screening {} against {} and {} ({:?})",
        config.ids.child, config.ids.parent1, config.ids.parent2, config.source
    );
    let threads = determine_allowed_cpus(config.threads)?;

    let regions = TargetRegions::from_beds(
        config.white_list.as_deref(),
        config.black_list.as_deref(),
    )
    .context("Failed to load target regions")?;

    let processor = BamTrioProcessor::new(
        config.ids.clone(),
        config.bams.clone(),
        config.source.clone(),
        regions,
        MappedReadFilter::new(config.min_mapq),
    )
    .context("Failed to open trio alignments")?;
    let dictionary = processor.dictionary().clone();

    let results = find_de_novos(processor, Some(threads))?;

    make_parent_dirs(&config.output)?;
    let mut writer = get_writer(
        &Some(&config.output),
        is_bgzipped(&config.output),
        false,
        threads,
        6,
    )?;
    write_table(&mut writer, &results)
        .with_context(|| format!("Failed to write {}", config.output.display()))?;

    if let Some(vcf_output) = &config.vcf_output {
        make_parent_dirs(vcf_output)?;
        write_vcf(vcf_output, &dictionary, &config.ids, &results)
            .with_context(|| format!("Failed to write {}", vcf_output.display()))?;
    }
    info!("Trio screening complete -> {:?}", config.output);
    Ok(())
}
