//! supernovo - read-level de novo mutation screening for parent/child trios
//!
//! # Tools
//!
//! - `trio`: pile up a child and both parents at candidate sites and report de novo and
//!   haplotype-supported ("super novo") mutations
//! - `allele-ratio`: histogram of alternate allele fractions in a single-sample gVCF
//!
//! # Usage
//!
//! ```bash
//! # Screen the child's variant calls
//! supernovo trio --vcf kid.vcf.gz --child-bam kid.bam --child-id kid \
//!     --parent1-bam mom.bam --parent1-id mom --parent2-bam dad.bam --parent2-id dad \
//!     --output kid.denovo.tsv --vcf-output kid.denovo.vcf
//!
//! # Screen every covered base of the reference
//! supernovo trio --fasta ref.fa --child-bam kid.bam --child-id kid \
//!     --parent1-bam mom.bam --parent1-id mom --parent2-bam dad.bam --parent2-id dad \
//!     --white-list exome.bed --output kid.denovo.tsv.gz
//!
//! # Contamination check
//! supernovo allele-ratio --vcf kid.g.vcf.gz --bins 50
//! ```

extern crate supernovo_lib;
pub mod commands;
use anyhow::Result;
use env_logger::Env;
use log::*;
use structopt::StructOpt;
use supernovo_lib::core::errors::is_broken_pipe;

#[derive(StructOpt)]
#[structopt(rename_all = "kebab-case", author, about)]
/// De novo mutation screening for trios
struct Args {
    #[structopt(subcommand)]
    subcommand: Subcommand,
}

#[derive(StructOpt)]
enum Subcommand {
    /// Find de novo mutations in a child and check them against nearby haplotypes
    Trio(commands::TrioArgs),
    /// Bin alternate allele fractions of a single-sample gVCF
    AlleleRatio(commands::AlleleRatioArgs),
}

impl Subcommand {
    fn run(self) -> Result<()> {
        match self {
            Subcommand::Trio(args) => commands::run_trio(args)?,
            Subcommand::AlleleRatio(args) => commands::run_allele_ratio(args)?,
        }
        Ok(())
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    if let Err(err) = Args::from_args().subcommand.run() {
        if is_broken_pipe(&err) {
            std::process::exit(0);
        }
        error!("{}", err);
        std::process::exit(1);
    }
    Ok(())
}
