mod args;

use anyhow::{Context, Result};
use log::info;
use supernovo_lib::core::prelude::*;
use supernovo_lib::pipeline::allele_ratio::{allele_ratio_from_vcf, calculate_bins, AlleleRatio};

pub use args::AlleleRatioArgs;

/// Execute the `allele-ratio` command.
pub fn run_allele_ratio(args: AlleleRatioArgs) -> Result<()> {
    let ratio = AlleleRatio::new(calculate_bins(args.bins), args.min_alt_depth, args.min_depth)?;
    let ratio = allele_ratio_from_vcf(&args.vcf, ratio)
        .with_context(|| format!("Failed to bin {}", args.vcf.display()))?;

    if let Some(output) = &args.output {
        make_parent_dirs(output)?;
    }
    let bgzipped = args.output.as_ref().map_or(false, is_bgzipped);
    let mut writer = get_writer(&args.output, bgzipped, false, 1, 6)?;
    ratio.write(&mut writer)?;
    info!("Wrote {} bins", ratio.bins().len());
    Ok(())
}
