pub mod allele_ratio;
pub mod trio;

pub mod prelude {
    pub use super::allele_ratio::{allele_ratio_from_vcf, calculate_bins, AlleleRatio};
    pub use super::trio::{
        find_de_novos, write_table, write_vcf, BamTrioProcessor, CandidateSource, DeNovoResult,
        TrioBams, TrioEvaluator, TrioIds,
    };
}
