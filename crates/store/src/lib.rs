//! Persistence layer for Sitecost.
//!
//! Envelopes, projects and the tender/purchase-order collaborator data
//! are stored as JSON objects behind an OpenDAL [`opendal::Operator`],
//! so the same code runs against S3, Azure Blob, the local filesystem
//! and the in-memory backend used by tests.
//!
//! [`service::EnvelopeService`] is the write path: it serializes all
//! mutations per project and keeps totals and profit metrics current.

pub mod backend;
pub mod envelopes;
pub mod error;
mod json;
pub mod projects;
pub mod purchase_orders;
pub mod service;
pub mod tenders;

pub use backend::build_operator;
pub use envelopes::EnvelopeStore;
pub use error::StoreError;
pub use projects::ProjectStore;
pub use purchase_orders::PurchaseOrderStore;
pub use service::{EnvelopeService, NewManualItem, ServiceError};
pub use tenders::TenderBoqStore;
