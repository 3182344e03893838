//! Core entry point for the fsic_registry crate.

pub mod error;
pub mod filter;
pub mod model;
pub mod page;
pub mod pdf;
pub mod status;
pub mod store;

pub use error::RegistryError;
pub use filter::CertificateFilter;
pub use store::CertificateStore;
