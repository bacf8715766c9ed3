//! FIFOs.

mod async_fifo;
pub mod tracker;

pub use async_fifo::{AsyncFifo, AsyncFifoConfig};
