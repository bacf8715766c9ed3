//! Implementation of proc macros on signal types.
//!
//! # Note
//!
//! `#[derive(Signal)]` supports two shapes:
//!
//! - Structs with named fields. Fields are concatenated in declaration order, and the first field occupies the
//!   least significant bits. This is the layout every wide word decoder relies on.
//! - Enums with unit variants only. A variant is encoded with its index, or with `#[encode(N)]` if given, in
//!   `clog2(#variants)` bits unless the enum carries `#[width(N)]`.
//!
//! The generated impl refers to `Signal` unqualified, so the trait must be in scope at the derive site.
//!
//! ```ignore
//! #[derive(Debug, Clone, Default, PartialEq, Signal)]
//! pub struct Sample {
//!     de: bool,   // bit 0
//!     hsync: bool, // bit 1
//!     vsync: bool, // bit 2
//!     r: u8,      // bits 3..11
//! }
//! ```

mod signal;
mod utils;

use proc_macro::TokenStream;

#[proc_macro_derive(Signal, attributes(width, encode))]
pub fn signal(input: TokenStream) -> TokenStream { signal::derive(input) }
