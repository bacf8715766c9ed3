//! Standard library.
//!
//! Reusable components built on `clockflow`: the asynchronous FIFO crossing between two clock domains, width
//! converters, a model of an external memory device, the FIFO buffered in that memory, and a skid buffer.

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
#![deny(unreachable_pub)]
//
#![allow(clippy::needless_lifetimes)]
#![allow(clippy::type_complexity)]
#![allow(elided_lifetimes_in_paths)]

use clockflow::*;

mod buffer_skid;
pub mod converter;
pub mod dram_fifo;
pub mod fifo;
pub mod memory;

pub use buffer_skid::{skid_buffer, SkidBuffer, SkidLogic, SkidState};
pub use converter::{ConverterConfig, DownConverter, LaneOrder, UpConverter};
pub use dram_fifo::{DramFifo, DramFifoConfig};
pub use fifo::{AsyncFifo, AsyncFifoConfig};
pub use memory::{DeviceTiming, MemoryDevice};
