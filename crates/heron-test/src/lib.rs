//! # Heron Test
//!
//! Test utilities for Heron, running dispatchers against in-memory
//! exchanges without a server or router.
//!
//! ## Key Features
//!
//! - **Request Builder**: [`TestRequest`] builds exchanges with query, form,
//!   JSON, cookies, path parameters, file parts or a failing body
//! - **Chains**: [`Chain`] runs middleware and handlers in order and stops
//!   once the request is aborted
//! - **Routing**: [`RecordingMount`] records mounted routes and serves
//!   requests by path pattern
//! - **Response Assertions**: [`TestResponse`] wraps the written reply
//!
//! ## Example
//!
//! ```rust
//! use heron_bind::Dispatcher;
//! use heron_core::RequestContext;
//! use heron_test::{RecordingMount, TestRequest};
//! use http::StatusCode;
//!
//! let mut mount = RecordingMount::new();
//! Dispatcher::new()
//!     .routes()
//!     .post("/echo", |ctx: RequestContext| {
//!         ctx.exchange().read_body().map(|b| String::from_utf8_lossy(&b).into_owned())
//!     })
//!     .mount(&mut mount);
//!
//! let response = mount
//!     .send(TestRequest::post("/echo").body("hi"))
//!     .unwrap();
//!
//! response.assert_status(StatusCode::OK).assert_body_eq("\"hi\"");
//! ```

#![doc(html_root_url = "https://docs.rs/heron-test/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod chain;
mod error;
mod mount;
mod request;
mod response;

pub use chain::Chain;
pub use error::TestError;
pub use mount::RecordingMount;
pub use request::{TestRequest, TestRequestBuilder, MULTIPART_BOUNDARY};
pub use response::TestResponse;
