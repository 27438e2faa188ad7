//! Exit codes and machine-readable error reports.

use serde::Serialize;

/// Process exit codes.
///
/// - 0: the scan (or generation) completed; a report was produced
/// - 1: a fatal error ended the run without a report
/// - 2: the command line or configuration file was invalid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExitCode {
    /// Completed normally.
    Success = 0,
    /// A fatal error occurred.
    GeneralError = 1,
    /// Invalid arguments or configuration.
    Usage = 2,
}

impl ExitCode {
    #[must_use]
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Machine-readable code prefix shown in error messages.
    #[must_use]
    pub fn code_prefix(self) -> &'static str {
        match self {
            Self::Success => "DF000",
            Self::GeneralError => "DF001",
            Self::Usage => "DF002",
        }
    }

    /// Pick the exit code for an error that ended the run.
    #[must_use]
    pub fn for_error(err: &anyhow::Error) -> Self {
        if err.downcast_ref::<figment::Error>().is_some() {
            Self::Usage
        } else {
            Self::GeneralError
        }
    }
}

/// Error report printed to stderr when JSON output was requested.
#[derive(Debug, Serialize)]
pub struct StructuredError {
    /// Code prefix, e.g. "DF001"
    pub code: String,
    pub exit_code: i32,
    /// Top-level message
    pub message: String,
    /// Underlying causes, outermost first
    pub causes: Vec<String>,
}

impl StructuredError {
    #[must_use]
    pub fn new(err: &anyhow::Error, exit_code: ExitCode) -> Self {
        Self {
            code: exit_code.code_prefix().to_string(),
            exit_code: exit_code.as_i32(),
            message: err.to_string(),
            causes: err.chain().skip(1).map(ToString::to_string).collect(),
        }
    }
}
