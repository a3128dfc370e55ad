//! # Heron
//!
//! **Request binding and handler dispatch for HTTP routers**
//!
//! Heron sits between a router and plain Rust functions:
//!
//! - Record structs declare where each field comes from: query, route
//!   parameter, header, cookie, body or file part
//! - Handlers are ordinary functions taking records, the request context or
//!   the exchange, in any order
//! - Every record is validated before the handler runs
//! - The handler's outcome (data, error, or nothing) goes to a responder
//!
//! ## Quick Start
//!
//! ```rust
//! use heron::prelude::*;
//! use heron_test::TestRequest;
//! use serde::Serialize;
//!
//! #[derive(Record, Serialize)]
//! struct Search {
//!     #[heron(query = "q")]
//!     q: String,
//!     #[heron(query = "page,1")]
//!     page: u32,
//! }
//!
//! fn search(params: Search) -> String {
//!     format!("{} (page {})", params.q, params.page)
//! }
//!
//! let dispatcher = Dispatcher::new();
//! let endpoint = dispatcher.endpoint(search);
//!
//! let exchange = TestRequest::get("/search").query("q", "heron").build().unwrap();
//! assert_eq!(endpoint.call(&exchange), Dispatched::Responded);
//! assert_eq!(exchange.take_reply().unwrap().text(), Some("\"heron (page 1)\""));
//! ```
//!
//! ## Pipeline
//!
//! ```text
//! Exchange → Capture → Resolve → Coerce → Assemble → Validate → Handler
//!                                                                  ↓
//!                                       Exchange ← Responder ← Outcome
//! ```

#![doc(html_root_url = "https://docs.rs/heron/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Re-export member crates
pub use heron_bind as bind;
pub use heron_config as config;
pub use heron_core as core;
pub use heron_telemetry as telemetry;

// Core types
pub use heron_core::{
    BoxError, DispatchError, ErrorDetail, ErrorEnvelope, Exchange, ExchangeBuilder,
    ExchangeSnapshot, JsonResponder, NoopValidator, Params, QueryError, Raw, Reply,
    RequestContext, RequestId, Responder, Schema, SchemaValidator, Serial, SerialError,
    SourceKind, TextSerial, UploadedFile, ValidationError, Validator,
};

// Binding and dispatch
pub use heron_bind::{
    Assembler, BodyMismatch, Dispatched, Dispatcher, DispatcherBuilder, Endpoint, FieldSpec,
    Handler, IntoOutcome, Mount, Outcome, Param, ParamKind, ParamPlan, Planner, Record, Route,
    Routes,
};

// The `Record` derive, in the macro namespace next to the trait
pub use heron_macros::Record;

/// Prelude module for convenient imports.
///
/// ```rust
/// use heron::prelude::*;
/// ```
pub mod prelude {
    pub use heron_bind::{
        BodyMismatch, Dispatched, Dispatcher, Endpoint, IntoOutcome, Mount, Outcome, Record,
        Routes,
    };
    pub use heron_core::{
        DispatchError, Exchange, RequestContext, Schema, SchemaValidator, UploadedFile,
    };
    pub use heron_macros::Record;
}
