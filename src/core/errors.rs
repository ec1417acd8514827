//! Bundle error types and diagnostics.

use miette::Diagnostic;
use thiserror::Error;

/// Domain failures raised while resolving or applying a source bundle.
///
/// Library functions return `anyhow::Result`; these values sit at the root
/// of the chain so callers can `downcast_ref::<BundleError>()`.
#[derive(Debug, Error, Diagnostic)]
pub enum BundleError {
    #[error("invalid origin `{origin}`: {reason}")]
    #[diagnostic(
        code(srcbundle::origin::invalid),
        help("Declarations look like `<path|url|repo.git[::subfolder[::ref]]>[##sha256]`")
    )]
    InvalidOrigin { origin: String, reason: String },

    #[error("bundle `{bundle}` expects SHA256 = {expected}, but found SHA256 = {actual}")]
    #[diagnostic(
        code(srcbundle::integrity::mismatch),
        help("Check the bundle source, or update the `##` hash if the change is expected")
    )]
    IntegrityMismatch {
        bundle: String,
        expected: String,
        actual: String,
    },

    #[error("failed to acquire `{origin}`: {reason}")]
    #[diagnostic(
        code(srcbundle::acquire::failed),
        help("Check your network connection and that `git` is installed")
    )]
    AcquisitionFailed { origin: String, reason: String },

    #[error("dependency scope `{scope}` is not available in this project")]
    #[diagnostic(code(srcbundle::apply::unavailable_scope))]
    UnavailableScope { scope: String, coordinate: String },
}

impl BundleError {
    pub fn invalid_origin(origin: impl Into<String>, reason: impl Into<String>) -> Self {
        BundleError::InvalidOrigin {
            origin: origin.into(),
            reason: reason.into(),
        }
    }

    pub fn acquisition_failed(origin: impl Into<String>, reason: impl ToString) -> Self {
        BundleError::AcquisitionFailed {
            origin: origin.into(),
            reason: reason.to_string(),
        }
    }

    /// Whether the error aborts resolution. Only unavailable scopes are tolerated.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, BundleError::UnavailableScope { .. })
    }
}
