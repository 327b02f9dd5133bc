use std::fmt;

/// Process exit status for each failure class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// CLI usage error (missing args, invalid flags).
    Usage = 1,
    /// Input error (missing or malformed design file, bad expression).
    Input = 2,
    /// Processing error (components failed to build, output not written).
    Processing = 3,
}

#[derive(Debug)]
pub struct CliError {
    pub code: ErrorCode,
    pub message: String,
}

impl CliError {
    pub fn input(err: impl Into<anyhow::Error>) -> Self {
        Self {
            code: ErrorCode::Input,
            message: format!("{:#}", err.into()),
        }
    }

    pub fn processing(err: impl Into<anyhow::Error>) -> Self {
        Self {
            code: ErrorCode::Processing,
            message: format!("{:#}", err.into()),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}
