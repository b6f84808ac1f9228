use crate::error::Error;
use crate::http::response::{ErrorResult, FailureCause, RunResult};

pub fn exit_code_for_error(err: &Error) -> i32 {
    match err {
        Error::Config(_) => 2,
        Error::InvalidUrl(_) => 3,
        Error::Io(_) => 23,
        Error::Json(_) => 26,
        Error::Transport(err) => transport_exit_code(err),
    }
}

/// Exit code for a chain of results: 0 when all succeeded, otherwise the
/// code of the last failure.
pub fn exit_code_for_results(results: &[RunResult]) -> i32 {
    results
        .iter()
        .rev()
        .find_map(RunResult::error)
        .map(exit_code_for_failure)
        .unwrap_or(0)
}

pub fn exit_code_for_failure(error: &ErrorResult) -> i32 {
    match error.exception.cause {
        FailureCause::MissingUrl | FailureCause::InvalidUrl => 3,
        FailureCause::InvalidMethod | FailureCause::InvalidHeader => 2,
        FailureCause::Timeout => 28,
        FailureCause::Connect | FailureCause::Transport => 7,
        FailureCause::Status => 22,
        FailureCause::RedirectLimit => 47,
    }
}

fn transport_exit_code(err: &reqwest::Error) -> i32 {
    if err.is_timeout() {
        return 28;
    }
    if err.is_connect() {
        return 7;
    }
    if err.is_builder() {
        return 2;
    }
    43
}
