use anyhow::{anyhow, Error};
use std::convert::TryFrom;
use std::path::PathBuf;
use structopt::StructOpt;
use supernovo_lib::engine::par_contigs::DEFAULT_THREADS_STR;
use supernovo_lib::pipeline::trio::{CandidateSource, TrioBams, TrioIds};

/// CLI arguments for the `trio` subcommand.
#[derive(Debug, Clone, StructOpt)]
#[structopt(
    author,
    name = "trio",
    after_help = "The *_apparent_mismap_reads columns are only measured for reads whose CIGAR \
                  uses =/X operators. Alignments written with M only (e.g. bwa mem) always \
                  report 0 there."
)]
pub struct TrioArgs {
    /// Indexed VCF/BCF with the child's calls to screen.
    #[structopt(long, short = "v", required_unless = "fasta", conflicts_with = "fasta")]
    pub vcf: Option<PathBuf>,

    /// Indexed reference FASTA; every base the child's reads cover is screened.
    #[structopt(long, short = "f")]
    pub fasta: Option<PathBuf>,

    /// Indexed BAM/CRAM of the child.
    #[structopt(long = "child-bam", alias = "bam")]
    pub child_bam: PathBuf,

    /// Sample ID of the child (must match the VCF sample name in VCF mode).
    #[structopt(long = "child-id")]
    pub child_id: String,

    /// Indexed BAM/CRAM of the first parent.
    #[structopt(long = "parent1-bam")]
    pub parent1_bam: PathBuf,

    #[structopt(long = "parent1-id")]
    pub parent1_id: String,

    /// Indexed BAM/CRAM of the second parent.
    #[structopt(long = "parent2-bam")]
    pub parent2_bam: PathBuf,

    #[structopt(long = "parent2-id")]
    pub parent2_id: String,

    /// BED of regions to screen. Defaults to everything.
    #[structopt(long = "white-list", short = "i")]
    pub white_list: Option<PathBuf>,

    /// BED of regions to skip.
    #[structopt(long = "black-list", short = "x")]
    pub black_list: Option<PathBuf>,

    /// Output table (`-` for stdout; BGZF-compressed when ending in `.gz`).
    #[structopt(long, short = "o")]
    pub output: PathBuf,

    /// Also write the results as VCF, ready for effect annotation.
    #[structopt(long = "vcf-output")]
    pub vcf_output: Option<PathBuf>,

    /// Number of contigs processed in parallel.
    #[structopt(long, short = "t", default_value = DEFAULT_THREADS_STR.as_str())]
    pub threads: usize,

    /// Minimum mapping quality for reads to be piled up.
    #[structopt(long = "min-mapq", short = "q", default_value = "0")]
    pub min_mapq: u8,
}

/// Normalised configuration derived from [`TrioArgs`].
#[derive(Debug, Clone)]
pub struct TrioConfig {
    pub source: CandidateSource,
    pub ids: TrioIds,
    pub bams: TrioBams,
    pub white_list: Option<PathBuf>,
    pub black_list: Option<PathBuf>,
    pub output: PathBuf,
    pub vcf_output: Option<PathBuf>,
    pub threads: usize,
    pub min_mapq: u8,
}

impl TryFrom<TrioArgs> for TrioConfig {
    type Error = Error;

    fn try_from(args: TrioArgs) -> Result<Self, Self::Error> {
        let source = match (args.vcf, args.fasta) {
            (Some(vcf), None) => CandidateSource::Vcf(vcf),
            (None, Some(fasta)) => CandidateSource::Fasta(fasta),
            _ => return Err(anyhow!("exactly one of --vcf and --fasta is required")),
        };
        Ok(TrioConfig {
            source,
            ids: TrioIds {
                child: args.child_id,
                parent1: args.parent1_id,
                parent2: args.parent2_id,
            },
            bams: TrioBams {
                child: args.child_bam,
                parent1: args.parent1_bam,
                parent2: args.parent2_bam,
            },
            white_list: args.white_list,
            black_list: args.black_list,
            output: args.output,
            vcf_output: args.vcf_output,
            threads: args.threads,
            min_mapq: args.min_mapq,
        })
    }
}
