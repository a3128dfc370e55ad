//! # Heron Core
//!
//! Core types shared by every Heron crate.
//!
//! This crate provides the per-request transport object and the capabilities
//! the binding pipeline consumes:
//!
//! - [`Exchange`] - The transport object: request parts, body buffer, file parts,
//!   abort flag and reply slot
//! - [`RequestContext`] - Per-request context handed to handlers
//! - [`Params`] - Matched path parameters
//! - [`SourceKind`] - Where a record field reads its raw value from
//! - [`DispatchError`] - The single error type of the binding pipeline
//! - [`Serial`] - Type-directed coercion of raw request text ([`TextSerial`])
//! - [`Validator`] - Record validation ([`SchemaValidator`], [`NoopValidator`])
//! - [`Responder`] - The response-writing collaborator ([`JsonResponder`])

#![doc(html_root_url = "https://docs.rs/heron-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod context;
mod error;
mod exchange;
mod params;
mod respond;
pub mod schema;
pub mod serial;
mod source;
mod validate;

pub use context::{RequestContext, RequestId};
pub use error::{BoxError, DispatchError, ErrorDetail, ErrorEnvelope, QueryError};
pub use exchange::{Exchange, ExchangeBuilder, ExchangeSnapshot, Reply, UploadedFile};
pub use params::Params;
pub use respond::{JsonResponder, Responder};
pub use schema::{Schema, ValidationError};
pub use serial::{Raw, Serial, SerialError, TextSerial};
pub use source::SourceKind;
pub use validate::{NoopValidator, SchemaValidator, Validator};
