use thiserror::Error;

pub type BemtResult<T> = Result<T, BemtError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum BemtError {
    #[error("Non-finite numeric value for {what}: {value}")]
    NonFinite { what: &'static str, value: f64 },

    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    #[error("Length mismatch in {what}: {left} vs {right} samples")]
    LengthMismatch {
        what: &'static str,
        left: usize,
        right: usize,
    },

    #[error("Invariant violated: {what}")]
    Invariant { what: &'static str },
}
