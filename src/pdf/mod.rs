//! PDF output: the printable certificate and the expiry report.

pub mod builder;
pub mod certificate;
pub mod fonts;
#[cfg(feature = "document-info")]
pub mod info;
pub mod report;

use thiserror::Error;

use genpdf::Mm;

pub use certificate::{render_certificate, CertificatePdf};
pub use report::render_expiry_report;

/// Errors raised while producing a PDF.
#[derive(Debug, Error)]
pub enum RenderError {
    /// No usable font family was found.
    #[error("failed to load fonts: {0}")]
    FontLoad(#[source] genpdf::error::Error),
    /// Layout or serialization inside `genpdf` failed.
    #[error("failed to render document: {0}")]
    Layout(#[source] genpdf::error::Error),
    /// The rendered bytes could not be reopened to write document metadata.
    #[cfg(feature = "document-info")]
    #[error("failed to write document info: {0}")]
    DocumentInfo(#[from] lopdf::Error),
}

pub(crate) fn mm_from_f64(value: f64) -> Mm {
    Mm::from(printpdf::Mm(value))
}
