use thiserror::Error;

/// Crate-wide error type. Fetch/parse/upsample failures are normally caught
/// and folded into a tile state transition (see `scheduler`); `Invariant`
/// is the only variant that should ever propagate out of a public entry
/// point, and only for a genuine programmer error.
#[derive(Debug, Error)]
pub enum TfError {
    #[error("fetch failed: {0}")]
    Fetch(String),

    #[error("fetch failed permanently: {0}")]
    FetchPermanent(String),

    #[error("parse failed for {uri}{}: {detail}", offset.map(|o| format!(" at offset {o}")).unwrap_or_default())]
    Parse {
        uri: String,
        offset: Option<u64>,
        detail: String,
    },

    #[error("upsample failed: {0}")]
    Upsample(String),

    #[error("invariant violated: {0}")]
    Invariant(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Mirrors `abetterworld`'s `TileLoadingContext`: attach an operation/URI to
/// a lower-level error as it's folded into a `TfError`.
pub trait ResultExt<T> {
    fn context(self, msg: &str) -> Result<T, TfError>;
}

impl<T, E> ResultExt<T> for Result<T, E>
where
    E: std::fmt::Display,
{
    fn context(self, msg: &str) -> Result<T, TfError> {
        self.map_err(|e| TfError::Invariant(format!("{msg}: {e}")))
    }
}
