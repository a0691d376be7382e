/// Everything the annotation engine can refuse to do.
///
/// None of these is fatal to a session: the state that was loaded before the
/// failing command is left exactly as it was.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("CSV must contain Cell_ID, X, Y (missing: {})", .missing.join(", "))]
    Schema { missing: Vec<&'static str> },
    #[error("CSV line {line}: {message}")]
    Parse { line: u64, message: String },
    #[error("no active group selected; selection discarded")]
    NoActiveGroup,
    #[error("nothing to export: no points loaded")]
    EmptyExport,
    #[error("failed to decode image: {0}")]
    Image(#[from] image::ImageError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("invalid settings: {0}")]
    Settings(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn parse(line: u64, message: impl Into<String>) -> Self {
        Error::Parse {
            line,
            message: message.into(),
        }
    }

    /// Malformed CSV coming out of the reader is reported as a parse failure.
    pub(crate) fn from_csv(err: csv::Error) -> Self {
        let line = err.position().map(|p| p.line()).unwrap_or(0);
        match err.into_kind() {
            csv::ErrorKind::Io(io) => Error::Io(io),
            csv::ErrorKind::UnequalLengths {
                expected_len, len, ..
            } => Error::parse(line, format!("expected {expected_len} fields, found {len}")),
            csv::ErrorKind::Utf8 { err, .. } => Error::parse(line, format!("invalid UTF-8: {err}")),
            kind => Error::parse(line, format!("{kind:?}")),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
