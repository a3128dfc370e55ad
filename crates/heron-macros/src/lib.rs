//! Procedural macros for Heron records.
//!
//! # Overview
//!
//! `#[derive(Record)]` turns a struct with named fields into a record the
//! dispatcher can bind from a request. Each field carries at most one
//! source inside a `#[heron(...)]` annotation:
//!
//! | Annotation | Source |
//! |------------|--------|
//! | `#[heron(query = "name")]` | Query string |
//! | `#[heron(path = "name")]` | Route parameter |
//! | `#[heron(header = "name")]` | Request header |
//! | `#[heron(cookie = "name")]` | Cookie |
//! | `#[heron(body)]` / `#[heron(body = "name")]` | Whole body, or a form field |
//! | `#[heron(file = "name")]` | Multipart file part |
//!
//! The payload is `"name"` or `"name,default"`. Everything after the first
//! comma is the default text. Unannotated fields are left at
//! `Default::default()`.
//!
//! # Example
//!
//! ```rust,ignore
//! use heron::Record;
//! use serde::Serialize;
//!
//! #[derive(Record, Serialize)]
//! struct Search {
//!     #[heron(query = "q")]
//!     q: String,
//!     #[heron(query = "page,1")]
//!     page: u32,
//! }
//! ```
//!
//! The derive also makes `Search` and `Box<Search>` usable as handler
//! parameters.

mod parse;
mod record;

use proc_macro::TokenStream;

/// Derives `Record` and `Param` for a struct with named fields.
#[proc_macro_derive(Record, attributes(heron))]
pub fn derive_record(input: TokenStream) -> TokenStream {
    record::expand_record(input.into())
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}
