use std::process::ExitCode;

/// Process exit status of a flatstack command.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ExitStatus {
    /// Everything was written.
    Success,
    /// The run finished but some post-patches did not apply.
    Failure,
    /// A fatal build error or bad configuration.
    Error,
}

impl ExitStatus {
    pub fn from_problem_count(count: usize) -> Self {
        if count == 0 { Self::Success } else { Self::Failure }
    }
}

impl From<ExitStatus> for ExitCode {
    fn from(status: ExitStatus) -> Self {
        match status {
            ExitStatus::Success => ExitCode::from(0),
            ExitStatus::Failure => ExitCode::from(1),
            ExitStatus::Error => ExitCode::from(2),
        }
    }
}
