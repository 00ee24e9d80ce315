use std::path::PathBuf;

/// Failure to load or validate a [`VehicleSpec`](crate::spec::VehicleSpec).
///
/// The simulation itself never fails; only turning outside data into a spec can.
#[derive(Debug, thiserror::Error)]
pub enum SpecError {
    #[error("failed to read `{}`: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse vehicle JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to parse vehicle TOML: {0}")]
    Toml(#[from] Box<toml::de::Error>),

    #[error("unrecognized tire designation `{0}` (expected e.g. \"225/40R18\")")]
    TireSize(String),

    #[error("invalid vehicle spec: {field} {reason}")]
    Invalid { field: &'static str, reason: String },
}

impl SpecError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid { field, reason: reason.into() }
    }
}
