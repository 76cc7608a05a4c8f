use thiserror::Error;

/// Fatal configuration errors abort process startup with a single
/// actionable message (spec.md section 7, "Fatal configuration").
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    MissingVar(&'static str),

    #[error("invalid value for {name}: {source}")]
    InvalidValue {
        name: &'static str,
        #[source]
        source: anyhow::Error,
    },

    #[error("SOURCES_JSON failed to parse: {0}")]
    InvalidSources(serde_json::Error),
}
