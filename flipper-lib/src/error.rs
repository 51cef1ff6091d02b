use std::panic::Location;

/// Error kinds that can occur in flipper-lib
#[derive(Debug)]
pub enum ErrorKind {
    InvalidInput(String),
    Io(std::io::Error),
    JoinError(tokio::task::JoinError),
    MisconfiguredInterval(u64),
    PostAfterDispose,
    SerdeJson(serde_json::Error),
    Usage(String, String), // error, usage line
}

/// Errors that can occur in flipper-lib, including the file and line number
/// where they were generated
#[derive(Debug)]
pub struct Error {
    pub kind: ErrorKind,
    location: &'static Location<'static>,
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}, {}", self.kind, self.location)
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use ErrorKind::*;
        match self {
            InvalidInput(s) => write!(f, "Invalid input: {s}"),
            Io(e) => write!(f, "I/O Error: {e}"),
            JoinError(e) => write!(f, "Task join error: {e}"),
            MisconfiguredInterval(ms) => {
                write!(f, "Flip interval of {ms}ms is not usable, must be positive")
            }
            PostAfterDispose => write!(f, "Flipper has already been disposed"),
            SerdeJson(e) => write!(f, "JSON: {e}"),
            Usage(e, usage) => write!(f, "{e}\n{usage}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match &self.kind {
            ErrorKind::Io(e) => Some(e),
            ErrorKind::JoinError(e) => Some(e),
            ErrorKind::SerdeJson(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ErrorKind> for Error {
    #[track_caller]
    fn from(kind: ErrorKind) -> Error {
        Error {
            kind,
            location: Location::caller(),
        }
    }
}

impl From<std::io::Error> for Error {
    #[track_caller]
    fn from(e: std::io::Error) -> Error {
        Error {
            kind: ErrorKind::Io(e),
            location: Location::caller(),
        }
    }
}

impl From<tokio::task::JoinError> for Error {
    #[track_caller]
    fn from(e: tokio::task::JoinError) -> Error {
        Error {
            kind: ErrorKind::JoinError(e),
            location: Location::caller(),
        }
    }
}

impl From<serde_json::Error> for Error {
    #[track_caller]
    fn from(e: serde_json::Error) -> Error {
        Error {
            kind: ErrorKind::SerdeJson(e),
            location: Location::caller(),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_kinds_convert_and_chain() {
        let e = Error::from(ErrorKind::MisconfiguredInterval(0));
        assert!(e.to_string().starts_with("Flip interval of 0ms"));
        assert!(e.to_string().contains("error.rs"));
        assert!(e.source().is_none());

        let json = serde_json::from_str::<u64>("nope").unwrap_err();
        let e = Error::from(json);
        assert!(matches!(e.kind, ErrorKind::SerdeJson(_)));
        assert!(e.source().is_some());
    }
}
