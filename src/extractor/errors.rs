use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("listing container not found in page")]
    ContentNotFound,

    #[error("no pharmacy could be extracted (source format may have changed)")]
    NoPharmacies,
}

/// Why a single accumulated pharmacy was dropped.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum RecordError {
    #[error("pharmacy {name:?} appears before any zone")]
    MissingZone { name: String },

    #[error("pharmacy name {name:?} yields an empty identifier")]
    EmptySlug { name: String },
}
