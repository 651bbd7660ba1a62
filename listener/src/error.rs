use std::error;
use std::fmt;

/// Result type of fallible listener operations.
pub type ListenerResult<T> = Result<T, ListenerError>;

/// Main error type of the listener.
///
/// Made of an [`ErrorKind`], a static description and an optional dynamic detail.
#[derive(Debug, Clone)]
pub struct ListenerError {
    repr: ErrorRepr,
}

#[derive(Debug, Clone)]
enum ErrorRepr {
    WithDescription(ErrorKind, &'static str),
    WithDescriptionAndDetail(ErrorKind, &'static str, String),
}

/// Categories of listener errors.
///
/// The kind identifies the stage that failed, which is what an operator needs to know since every
/// error surfacing from the session loop terminates the process.
#[derive(PartialEq, Eq, Copy, Clone, Debug)]
#[non_exhaustive]
pub enum ErrorKind {
    // Source connection and protocol
    SourceConnectionFailed,
    SourceQueryFailed,
    SourceSchemaError,
    SourceIoError,
    SourceDatabaseShutdown,
    AuthenticationError,
    ReplicationSlotNotFound,
    ReplicationStreamEnded,
    AcknowledgmentFailed,

    // Payload
    InvalidData,

    // Publisher
    PublisherConnectionFailed,
    PublishFailed,

    // Configuration and state
    ConfigError,
    InvalidState,
}

impl ListenerError {
    pub fn kind(&self) -> ErrorKind {
        match self.repr {
            ErrorRepr::WithDescription(kind, _)
            | ErrorRepr::WithDescriptionAndDetail(kind, _, _) => kind,
        }
    }

    /// Returns the dynamic detail, if any.
    pub fn detail(&self) -> Option<&str> {
        match self.repr {
            ErrorRepr::WithDescriptionAndDetail(_, _, ref detail) => Some(detail.as_str()),
            ErrorRepr::WithDescription(..) => None,
        }
    }
}

/// Errors are equal when their kinds are.
impl PartialEq for ListenerError {
    fn eq(&self, other: &ListenerError) -> bool {
        self.kind() == other.kind()
    }
}

impl fmt::Display for ListenerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.repr {
            ErrorRepr::WithDescription(kind, desc) => write!(f, "{kind:?}: {desc}"),
            ErrorRepr::WithDescriptionAndDetail(kind, desc, ref detail) => {
                write!(f, "{kind:?}: {desc} -> {detail}")
            }
        }
    }
}

impl error::Error for ListenerError {}

impl From<(ErrorKind, &'static str)> for ListenerError {
    fn from((kind, desc): (ErrorKind, &'static str)) -> ListenerError {
        ListenerError {
            repr: ErrorRepr::WithDescription(kind, desc),
        }
    }
}

impl From<(ErrorKind, &'static str, String)> for ListenerError {
    fn from((kind, desc, detail): (ErrorKind, &'static str, String)) -> ListenerError {
        ListenerError {
            repr: ErrorRepr::WithDescriptionAndDetail(kind, desc, detail),
        }
    }
}

/// Raised when a parsed document does not match the wal2json model.
impl From<serde_json::Error> for ListenerError {
    fn from(err: serde_json::Error) -> ListenerError {
        ListenerError::from((
            ErrorKind::InvalidData,
            "JSON payload has an unexpected shape",
            err.to_string(),
        ))
    }
}

/// Classifies [`tokio_postgres::Error`] by SQLSTATE, errors without one being connection failures.
impl From<tokio_postgres::Error> for ListenerError {
    fn from(err: tokio_postgres::Error) -> ListenerError {
        let (kind, description) = match err.code() {
            Some(sqlstate) => {
                use tokio_postgres::error::SqlState;

                match *sqlstate {
                    SqlState::CONNECTION_EXCEPTION
                    | SqlState::CONNECTION_DOES_NOT_EXIST
                    | SqlState::CONNECTION_FAILURE
                    | SqlState::SQLCLIENT_UNABLE_TO_ESTABLISH_SQLCONNECTION
                    | SqlState::SQLSERVER_REJECTED_ESTABLISHMENT_OF_SQLCONNECTION
                    | SqlState::TOO_MANY_CONNECTIONS
                    | SqlState::IDLE_SESSION_TIMEOUT => (
                        ErrorKind::SourceConnectionFailed,
                        "Postgres connection error",
                    ),

                    SqlState::INVALID_AUTHORIZATION_SPECIFICATION | SqlState::INVALID_PASSWORD => (
                        ErrorKind::AuthenticationError,
                        "Postgres authentication failed",
                    ),

                    // Raised by START_REPLICATION for a missing slot.
                    SqlState::UNDEFINED_OBJECT => (
                        ErrorKind::ReplicationSlotNotFound,
                        "Postgres replication slot not found",
                    ),

                    SqlState::OBJECT_IN_USE | SqlState::OBJECT_NOT_IN_PREREQUISITE_STATE => (
                        ErrorKind::InvalidState,
                        "Postgres replication slot not usable",
                    ),

                    SqlState::UNDEFINED_TABLE
                    | SqlState::UNDEFINED_SCHEMA
                    | SqlState::DATABASE_DROPPED => (
                        ErrorKind::SourceSchemaError,
                        "Postgres schema object not found",
                    ),

                    SqlState::SYNTAX_ERROR
                    | SqlState::INVALID_PARAMETER_VALUE
                    | SqlState::INSUFFICIENT_PRIVILEGE => (
                        ErrorKind::SourceQueryFailed,
                        "Postgres syntax or access error",
                    ),

                    SqlState::ADMIN_SHUTDOWN
                    | SqlState::CRASH_SHUTDOWN
                    | SqlState::CANNOT_CONNECT_NOW => (
                        ErrorKind::SourceDatabaseShutdown,
                        "Postgres is shutting down",
                    ),

                    SqlState::IO_ERROR | SqlState::DISK_FULL | SqlState::DATA_CORRUPTED => {
                        (ErrorKind::SourceIoError, "Postgres I/O error")
                    }

                    _ => (ErrorKind::SourceQueryFailed, "Postgres error"),
                }
            }
            None => (
                ErrorKind::SourceConnectionFailed,
                "Postgres connection failed",
            ),
        };

        ListenerError::from((kind, description, err.to_string()))
    }
}
