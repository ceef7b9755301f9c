use thiserror::Error;

/// Errors raised while constructing an engine
///
/// These are fatal and returned synchronously; no engine state exists when
/// one of them is produced.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("a cache with read and write support is required")]
    MissingCache,

    #[error("a mutation -> query -> update function map is required")]
    MissingMutationMap,

    #[error("mutation names in the mutation map must not be empty")]
    EmptyMutationName,

    #[error("query names watched by mutation '{mutation}' must not be empty")]
    EmptyQueryName { mutation: String },

    #[error("mutation '{mutation}' must map to at least one query update function")]
    NoQueriesForMutation { mutation: String },

    #[error("invalid link settings: {0}")]
    InvalidSettings(String),
}
