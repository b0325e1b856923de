use thiserror::Error;

/// Top-level construction error, wrapping [`psh_core::BuildError`] the way
/// the inner engine's failure kinds surface to application callers.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PshError {
    #[error(transparent)]
    Build(#[from] psh_core::BuildError),
}
