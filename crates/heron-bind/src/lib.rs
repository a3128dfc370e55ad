//! # Heron Bind
//!
//! Request binding and handler dispatch.
//!
//! A request flows through these stages:
//!
//! | Stage | Type | Description |
//! |-------|------|-------------|
//! | Capture | [`ValueStore`] | Content type, raw body, parsed query and form values |
//! | Resolve | [`Resolver`] | Finds a field's raw value by [`SourceKind`](heron_core::SourceKind) |
//! | Coerce | [`coerce`] | Turns raw data into the field's type via a [`Serial`](heron_core::Serial) |
//! | Assemble | [`Assembler`] | Builds a [`Record`] field by field |
//! | Plan | [`Planner`] | Produces every handler argument, validating records |
//! | Dispatch | [`Dispatcher`] | Runs the handler and hands its [`Outcome`] to the responder |
//!
//! ## Example
//!
//! ```rust
//! use heron_bind::{Dispatched, Dispatcher, Outcome};
//! use heron_core::{Exchange, RequestContext};
//!
//! let dispatcher = Dispatcher::new();
//! let endpoint = dispatcher.endpoint(|ctx: RequestContext| {
//!     Outcome::ok(ctx.exchange().path().to_string())
//! });
//!
//! let exchange = Exchange::builder()
//!     .uri(http::Uri::from_static("/ping"))
//!     .build();
//!
//! assert_eq!(endpoint.call(&exchange), Dispatched::Responded);
//! assert_eq!(exchange.take_reply().unwrap().text(), Some("\"/ping\""));
//! ```

#![doc(html_root_url = "https://docs.rs/heron-bind/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod coerce;
mod dispatch;
mod handler;
mod outcome;
mod plan;
mod record;
mod resolve;
mod routes;
mod values;

pub use coerce::{coerce, coerce_default};
pub use dispatch::{Dispatched, Dispatcher, DispatcherBuilder, Endpoint};
pub use handler::Handler;
pub use outcome::{IntoOutcome, Outcome};
pub use plan::{Param, ParamKind, ParamPlan, Planner};
pub use record::{Assembler, Record};
pub use resolve::{split_payload, BodyMismatch, FieldSpec, Resolved, Resolver};
pub use routes::{Mount, Route, Routes};
pub use values::{content_type_essence, parse_query, unescape, ContentKind, RawValues, ValueStore};
