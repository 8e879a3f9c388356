use std::fmt;

use reqwest::header::InvalidHeaderValue;
use reqwest::StatusCode;

#[derive(Debug)]
pub enum Error {
    /// The service answered 401 on the token endpoint or an authenticated endpoint.
    InvalidCredentials(u16),
    /// Any other non-200 answer.
    Http(u16),
    /// The HTTP call itself failed (connection reset, timeout, DNS).
    Transport(reqwest::Error),
    Parse(serde_json::Error),
    MissingField(&'static str),
    Header(InvalidHeaderValue),
    Config(String),
    Io(std::io::Error),
    Yaml(serde_yaml::Error),
}

impl Error {
    /// HTTP status code carried by the error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::InvalidCredentials(code) | Error::Http(code) => Some(*code),
            Error::Transport(err) => err.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    pub fn is_invalid_credentials(&self) -> bool {
        matches!(self, Error::InvalidCredentials(_))
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidCredentials(code) => {
                write!(f, "Invalid credentials (HTTP {})", code)
            }
            Error::Http(code) => write!(f, "HTTP error: status {}", code),
            Error::Transport(err) => write!(f, "Transport error: {}", err),
            Error::Parse(err) => write!(f, "JSON parsing error: {}", err),
            Error::MissingField(field) => write!(f, "Response is missing field '{}'", field),
            Error::Header(err) => write!(f, "Invalid header value: {}", err),
            Error::Config(msg) => write!(f, "Configuration error: {}", msg),
            Error::Io(err) => write!(f, "IO error: {}", err),
            Error::Yaml(err) => write!(f, "YAML parsing error: {}", err),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Transport(err) => Some(err),
            Error::Parse(err) => Some(err),
            Error::Header(err) => Some(err),
            Error::Io(err) => Some(err),
            Error::Yaml(err) => Some(err),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::Transport(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Parse(err)
    }
}

impl From<InvalidHeaderValue> for Error {
    fn from(err: InvalidHeaderValue) -> Self {
        Error::Header(err)
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err)
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(err: serde_yaml::Error) -> Self {
        Error::Yaml(err)
    }
}

/// Maps a response status onto the error taxonomy: only 200 is a success.
pub(crate) fn check_status(status: StatusCode) -> Result<()> {
    match status.as_u16() {
        200 => Ok(()),
        401 => Err(Error::InvalidCredentials(401)),
        code => Err(Error::Http(code)),
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_status_mapping() {
        assert!(check_status(StatusCode::OK).is_ok());

        let err = check_status(StatusCode::UNAUTHORIZED).unwrap_err();
        assert!(err.is_invalid_credentials());
        assert_eq!(err.status(), Some(401));

        // Other 2xx codes are not treated as success
        let err = check_status(StatusCode::NO_CONTENT).unwrap_err();
        assert!(matches!(err, Error::Http(204)));

        let err = check_status(StatusCode::INTERNAL_SERVER_ERROR).unwrap_err();
        assert!(matches!(err, Error::Http(500)));
        assert_eq!(err.status(), Some(500));
    }

    #[test]
    fn test_error_display() {
        assert_eq!(
            Error::InvalidCredentials(401).to_string(),
            "Invalid credentials (HTTP 401)"
        );
        assert_eq!(Error::Http(503).to_string(), "HTTP error: status 503");
        assert_eq!(
            Error::MissingField("id").to_string(),
            "Response is missing field 'id'"
        );
        assert!(Error::Config("bad".to_string()).status().is_none());
    }
}
