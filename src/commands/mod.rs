pub mod allele_ratio;
pub mod trio;

pub use allele_ratio::{run_allele_ratio, AlleleRatioArgs};
pub use trio::{run_trio, TrioArgs};
