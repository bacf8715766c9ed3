//! Camera link capture pipeline.
//!
//! A video source clocked by the camera link pixel clock feeds samples through a clock crossing queue into the
//! memory clock domain, where four samples are packed into one 128-bit word and buffered in a window of external
//! memory before a consumer takes them. [`simulation::Simulation`] runs the two clocks against each other.

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
//
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]
#![deny(rustdoc::missing_crate_level_docs)]
#![deny(rustdoc::invalid_codeblock_attributes)]
#![deny(rustdoc::invalid_html_tags)]
#![deny(rustdoc::bare_urls)]
//
#![allow(clippy::needless_lifetimes)]
#![allow(elided_lifetimes_in_paths)]

pub mod capture;
pub mod config;
pub mod logging;
pub mod pipeline;
pub mod report;
pub mod sample;
pub mod simulation;
pub mod sink;
pub mod source;
