//! Payload types for the veterinary treatment ledger (VTL).
//!
//! The ledger core treats a treatment event as an opaque [`Record`]. This
//! crate defines that record along with the application-level view of it:
//!
//! - [`Record`]: ordered string map; key order is part of the hash input
//! - [`TreatmentRecord`]: typed treatment schema with caller-side validation
//! - [`encode_lens_text`] / [`encode_url_payload`] / [`decode_payload`]: the
//!   text handed to and received from the QR collaborator

pub mod error;
pub mod payload;
pub mod record;
pub mod treatment;

pub use error::TypeError;
pub use payload::{
    decode_payload, encode_lens_text, encode_url_payload, DecodedPayload, PayloadFormat,
};
pub use record::Record;
pub use treatment::TreatmentRecord;
