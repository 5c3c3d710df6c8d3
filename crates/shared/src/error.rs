use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown sort option '{0}' (expected recent, featured or oldest)")]
pub struct UnknownSortOption(pub String);
