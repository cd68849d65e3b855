//! Byte channel traits for the transport layer

use async_trait::async_trait;
use iec101_core::{Iec101Error, Iec101Result};

/// Read side of a full-duplex byte channel
#[async_trait]
pub trait ByteReader: Send {
    /// Read whatever is available into `buf`; `Ok(0)` means the peer closed
    async fn read(&mut self, buf: &mut [u8]) -> Iec101Result<usize>;

    /// Fill `buf` completely or fail with `UnexpectedEof`
    async fn read_exact(&mut self, mut buf: &mut [u8]) -> Iec101Result<()> {
        while !buf.is_empty() {
            let n = self.read(buf).await?;
            if n == 0 {
                return Err(Iec101Error::Transport(std::io::Error::new(
                    std::io::ErrorKind::UnexpectedEof,
                    "Channel closed mid-read",
                )));
            }
            buf = &mut buf[n..];
        }
        Ok(())
    }

    /// Read a single byte, blocking until one is available
    async fn read_byte(&mut self) -> Iec101Result<u8> {
        let mut byte = [0u8; 1];
        self.read_exact(&mut byte).await?;
        Ok(byte[0])
    }
}

/// Write side of a full-duplex byte channel
#[async_trait]
pub trait ByteWriter: Send {
    /// Write part of `buf`, returning how much was taken
    async fn write(&mut self, buf: &[u8]) -> Iec101Result<usize>;

    /// Write the whole of `buf`
    async fn write_all(&mut self, buf: &[u8]) -> Iec101Result<()> {
        let mut written = 0;
        while written < buf.len() {
            let n = self.write(&buf[written..]).await?;
            if n == 0 {
                return Err(Iec101Error::Transport(std::io::Error::new(
                    std::io::ErrorKind::WriteZero,
                    "Channel accepted no bytes",
                )));
            }
            written += n;
        }
        Ok(())
    }

    /// Push buffered bytes onto the line
    async fn flush(&mut self) -> Iec101Result<()>;
}

/// Boxed read half handed to a session
pub type BoxedReader = Box<dyn ByteReader>;

/// Boxed write half handed to a session
pub type BoxedWriter = Box<dyn ByteWriter>;

#[async_trait]
impl<R: ByteReader + ?Sized> ByteReader for Box<R> {
    async fn read(&mut self, buf: &mut [u8]) -> Iec101Result<usize> {
        (**self).read(buf).await
    }
}

#[async_trait]
impl<W: ByteWriter + ?Sized> ByteWriter for Box<W> {
    async fn write(&mut self, buf: &[u8]) -> Iec101Result<usize> {
        (**self).write(buf).await
    }

    async fn flush(&mut self) -> Iec101Result<()> {
        (**self).flush().await
    }
}

/// Transport layer trait for a physical channel that must be opened first
#[async_trait]
pub trait TransportLayer: Send {
    /// Open the physical layer connection
    async fn open(&mut self) -> Iec101Result<()>;

    /// Check if the channel is closed
    fn is_closed(&self) -> bool;

    /// Split an opened channel into independently owned read and write halves
    ///
    /// The master runs its receive loop on the read half while the dispatch
    /// point keeps the write half, so both directions proceed concurrently.
    fn split(self) -> Iec101Result<(BoxedReader, BoxedWriter)>
    where
        Self: Sized;
}
