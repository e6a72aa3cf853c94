use std::path::PathBuf;
use structopt::StructOpt;

/// CLI arguments for the `allele-ratio` subcommand.
#[derive(Debug, Clone, StructOpt)]
#[structopt(author, name = "allele-ratio")]
pub struct AlleleRatioArgs {
    /// Single-sample VCF/gVCF carrying FORMAT/AD.
    #[structopt(long, short = "v")]
    pub vcf: PathBuf,

    /// Number of equal-width alternate fraction bins.
    #[structopt(long, short = "b", default_value = "100")]
    pub bins: usize,

    /// Minimum alternate depth for a site to be counted.
    #[structopt(long = "min-alt-depth", default_value = "3")]
    pub min_alt_depth: u32,

    /// Minimum reference + alternate depth for a site to be counted.
    #[structopt(long = "min-depth", default_value = "3")]
    pub min_depth: u32,

    /// Output file, stdout when omitted or `-`.
    #[structopt(long, short = "o")]
    pub output: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_library() {
        let args = AlleleRatioArgs::from_iter_safe(["allele-ratio", "--vcf", "sample.g.vcf.gz"])
            .unwrap();
        assert_eq!(args.bins, supernovo_lib::pipeline::allele_ratio::DEFAULT_BINS);
        assert_eq!(
            args.min_alt_depth,
            supernovo_lib::pipeline::allele_ratio::DEFAULT_MIN_ALT_DEPTH
        );
        assert_eq!(args.min_depth, supernovo_lib::pipeline::allele_ratio::DEFAULT_MIN_DEPTH);
        assert!(args.output.is_none());
    }
}
