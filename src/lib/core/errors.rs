use anyhow::Error;
use std::io;

use super::error::SupernovoError;

/// Returns `true` if the error originated from a broken pipe.
///
/// Library errors wrap `io::Error` inside [`SupernovoError::Io`], so both the bare and the
/// wrapped form are recognised.
#[inline]
pub fn is_broken_pipe(err: &Error) -> bool {
    err.chain().any(|cause| {
        let io_err = match cause.downcast_ref::<SupernovoError>() {
            Some(SupernovoError::Io(inner)) => Some(inner),
            _ => cause.downcast_ref::<io::Error>(),
        };
        io_err.map_or(false, |e| e.kind() == io::ErrorKind::BrokenPipe)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_bare_and_wrapped_broken_pipes() {
        let bare = Error::new(io::Error::new(io::ErrorKind::BrokenPipe, "closed"));
        assert!(is_broken_pipe(&bare));

        let wrapped = Error::new(SupernovoError::Io(io::Error::new(
            io::ErrorKind::BrokenPipe,
            "closed",
        )))
        .context("writing results");
        assert!(is_broken_pipe(&wrapped));

        let other = Error::new(io::Error::new(io::ErrorKind::NotFound, "missing"));
        assert!(!is_broken_pipe(&other));
    }
}
