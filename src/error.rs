use std::string::FromUtf16Error;

use crate::status::PdhStatus;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{call} returned {status}")]
    Pdh {
        call: &'static str,
        status: PdhStatus,
    },

    #[error("{call} returned {status}, expected {expected}")]
    UnexpectedStatus {
        call: &'static str,
        status: PdhStatus,
        expected: PdhStatus,
    },

    #[error("Failed to open PDH query, {0}")]
    OpenQuery(Box<Error>),

    #[error("{call} reported an empty path list")]
    EmptyPathList { call: &'static str },

    #[error("invalid UTF-16 in PDH string: {0}")]
    Utf16(#[from] FromUtf16Error),

    #[error("malformed counter path '{0}'")]
    MalformedPath(String),

    #[error("unknown value kind '{0}', expected double, large or long")]
    UnknownValueKind(String),
}

impl Error {
    /// The PDH status behind this error, if it came from a native call.
    pub fn status(&self) -> Option<PdhStatus> {
        match self {
            Error::Pdh { status, .. } | Error::UnexpectedStatus { status, .. } => Some(*status),
            Error::OpenQuery(error) => error.status(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_query_failure_keeps_status() {
        let error = Error::OpenQuery(Box::new(Error::Pdh {
            call: "PdhOpenQueryW",
            status: PdhStatus::MEMORY_ALLOCATION_FAILURE,
        }));
        assert_eq!(
            error.to_string(),
            "Failed to open PDH query, PdhOpenQueryW returned \
             PDH_MEMORY_ALLOCATION_FAILURE (0xC0000BBB)"
        );
        assert_eq!(error.status(), Some(PdhStatus::MEMORY_ALLOCATION_FAILURE));
    }

    #[test]
    fn non_pdh_errors_have_no_status() {
        assert_eq!(Error::MalformedPath(r"\Memory".to_owned()).status(), None);
        assert_eq!(
            Error::EmptyPathList {
                call: "PdhExpandWildCardPathW"
            }
            .status(),
            None
        );
    }
}
