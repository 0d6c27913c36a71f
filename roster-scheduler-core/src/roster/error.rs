use thiserror::Error;

/// Failure taxonomy of the pipeline. Validation and expansion errors are
/// recovered into the output document; only `Internal` aborts the process.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RosterError {
    #[error("input is not valid JSON: {0}")]
    InputParse(String),

    #[error("missing required top-level key '{0}'")]
    InvalidSchema(String),

    #[error("invalid field '{field}': {message}")]
    InvalidField { field: String, message: String },

    #[error("duplicate person id '{0}'")]
    DuplicateId(String),

    #[error("catalogue mismatch: {0}")]
    CatalogueMismatch(String),

    #[error("dayTypeByDate has {actual} entries but days = {days}")]
    InconsistentDays { days: u32, actual: usize },

    #[error("solver hit the time limit without finding any solution")]
    SolverTimeout,

    #[error("the hard constraints admit no roster: {0}")]
    SolverInfeasible(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl RosterError {
    /// Stable machine-readable code carried in the output document.
    pub fn code(&self) -> &'static str {
        match self {
            RosterError::InputParse(_) => "InputParse",
            RosterError::InvalidSchema(_) => "InvalidSchema",
            RosterError::InvalidField { .. } => "InvalidField",
            RosterError::DuplicateId(_) => "DuplicateId",
            RosterError::CatalogueMismatch(_) => "CatalogueMismatch",
            RosterError::InconsistentDays { .. } => "InconsistentDays",
            RosterError::SolverTimeout => "SolverTimeout",
            RosterError::SolverInfeasible(_) => "SolverInfeasible",
            RosterError::Internal(_) => "InternalError",
        }
    }

    pub fn invalid_field(field: &str, message: impl Into<String>) -> RosterError {
        RosterError::InvalidField {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

pub type RosterResult<T> = Result<T, RosterError>;
