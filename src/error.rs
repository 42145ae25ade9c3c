use std::error::Error;
use std::fmt::{Display, Formatter};

/// Possible errors that arise from invalid BANG-file parameters or input data.
#[derive(Debug, Clone)]
pub enum BangFileError {
    InvalidParameter(String),
    DimensionMismatch(String),
    DomainViolation(String),
    UseAfterBuild,
    InternalInconsistency(String),
}

impl Error for BangFileError {}

impl Display for BangFileError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let message = match self {
            BangFileError::InvalidParameter(msg) => {
                format!("Invalid parameter: {msg}")
            }
            BangFileError::DimensionMismatch(msg) => {
                format!("Tuple has mismatched dimensions: {msg}")
            }
            BangFileError::DomainViolation(msg) => {
                format!("Tuple coordinate outside the unit hypercube: {msg}")
            }
            BangFileError::UseAfterBuild => {
                String::from("Tuples cannot be inserted once the clustering model is built")
            }
            BangFileError::InternalInconsistency(msg) => {
                format!("Directory inconsistency: {msg}")
            }
        };
        write!(f, "{message}")
    }
}
