#[derive(thiserror::Error, Debug)]
pub enum ReportError {
    #[error("invalid report period: {0}")]
    InvalidPeriod(String),
    #[error("unknown group: {0}")]
    UnknownGroup(String),
    #[error("missing data: {0}")]
    MissingData(String),
    #[error("render failed: {0}")]
    RenderError(String),
    #[error("mail dispatch failed: {0}")]
    DispatchError(String),
}

impl ReportError {
    pub fn code(&self) -> &'static str {
        match self {
            ReportError::InvalidPeriod(_) => "INVALID_PERIOD",
            ReportError::UnknownGroup(_) => "UNKNOWN_GROUP",
            ReportError::MissingData(_) => "MISSING_DATA",
            ReportError::RenderError(_) => "RENDER_ERROR",
            ReportError::DispatchError(_) => "DISPATCH_ERROR",
        }
    }

    pub fn exit_code(&self) -> u8 {
        match self {
            ReportError::InvalidPeriod(_) => 2,
            ReportError::UnknownGroup(_) => 3,
            ReportError::MissingData(_) => 4,
            ReportError::RenderError(_) => 5,
            ReportError::DispatchError(_) => 6,
        }
    }
}

/// Finds the first [`ReportError`] in an error chain.
pub fn report_error(err: &anyhow::Error) -> Option<&ReportError> {
    err.chain().find_map(|cause| cause.downcast_ref::<ReportError>())
}
