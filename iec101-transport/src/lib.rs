//! Transport layer module for the IEC 60870-5-101 protocol
//!
//! This crate provides the full-duplex byte channel the link layer runs on:
//! read/write traits, adapters for any tokio stream, and serial and TCP
//! transports that split into independent read and write halves.

pub mod io;
pub mod retry;
pub mod serial;
pub mod shutdown;
pub mod stream;
pub mod tcp;

pub use io::{split_stream, IoReader, IoWriter};
pub use retry::{RetryPolicy, RetryTracker};
pub use serial::{SerialSettings, SerialTransport, DEFAULT_BAUD_RATE};
pub use shutdown::{shutdown_channel, Shutdown, ShutdownTrigger};
pub use stream::{BoxedReader, BoxedWriter, ByteReader, ByteWriter, TransportLayer};
pub use tcp::{TcpSettings, TcpTransport};
