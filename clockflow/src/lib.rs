//! clockflow: cycle-level models of latency-insensitive hardware running in several clock domains.
//!
//! A design is built from [`Module`]s talking over valid/ready channels ([`VrChannel`]). Each module is evaluated
//! combinationally ([`Module::comb`]) and then advanced on the active edge of its clock ([`Module::tick`]). The
//! [`domain::Scheduler`] interleaves the edges of independent clock domains in simulated time, and values only
//! travel between domains through the primitives in [`cdc`].

// # Tries to deny all lints (`rustc -W help`).
#![deny(absolute_paths_not_starting_with_crate)]
#![deny(anonymous_parameters)]
#![deny(deprecated_in_future)]
#![deny(explicit_outlives_requirements)]
#![deny(keyword_idents)]
#![deny(macro_use_extern_crate)]
#![deny(missing_debug_implementations)]
#![deny(non_ascii_idents)]
#![deny(rust_2018_idioms)]
#![deny(trivial_numeric_casts)]
#![deny(unsafe_op_in_unsafe_fn)]
#![deny(unused_extern_crates)]
#![deny(unused_import_braces)]
// #![deny(unused_qualifications)]
// #![deny(variant_size_differences)]
//
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]
#![deny(rustdoc::missing_crate_level_docs)]
#![deny(rustdoc::invalid_codeblock_attributes)]
#![deny(rustdoc::invalid_html_tags)]
#![deny(rustdoc::bare_urls)]
// #![deny(unreachable_pub)]
//
#![allow(clippy::needless_lifetimes)]
#![allow(elided_lifetimes_in_paths)]

pub mod cdc;
pub mod domain;
mod error;
mod interface;
mod module;
mod signal;
pub mod utils;

pub use clockflow_macro::Signal;
pub use error::*;
pub use interface::*;
pub use module::*;
pub use signal::*;
pub use utils::*;
