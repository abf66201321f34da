use thiserror::Error;

/// Errors raised while reading state cells.
///
/// A missing store entry is never an error: reads fall back to the cell's
/// default.
#[derive(Debug, Error)]
pub enum StateError {
    #[error("format function of cell `{cell}` failed")]
    Format {
        cell: String,
        #[source]
        source: anyhow::Error,
    },
    #[error("namespace has no cell named `{name}`")]
    UnknownCell { name: String },
}
