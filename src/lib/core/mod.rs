pub mod concurrency;
pub mod error;
pub mod errors;
pub mod fs;
pub mod io;
pub mod phred;
pub mod read_filter;

pub mod prelude {
    pub use super::concurrency::determine_allowed_cpus;
    pub use super::error::{Result, SupernovoError};
    pub use super::errors::is_broken_pipe;
    pub use super::fs::{is_bgzipped, make_parent_dirs};
    pub use super::io::get_writer;
    pub use super::phred::{accuracy, error_probability};
    pub use super::read_filter::{MappedReadFilter, ReadFilter};
}
