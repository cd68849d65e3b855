//! Adapters from tokio `AsyncRead` / `AsyncWrite` to the byte channel traits

use crate::stream::{BoxedReader, BoxedWriter, ByteReader, ByteWriter};
use async_trait::async_trait;
use iec101_core::{Iec101Error, Iec101Result};
use std::fmt;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Read half over any tokio reader
pub struct IoReader<R> {
    inner: R,
    timeout: Option<Duration>,
}

impl<R> IoReader<R> {
    /// Wrap a reader; `timeout` bounds each individual read
    pub fn new(inner: R, timeout: Option<Duration>) -> Self {
        Self { inner, timeout }
    }

}

impl<R> fmt::Debug for IoReader<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IoReader")
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[async_trait]
impl<R: AsyncRead + Unpin + Send> ByteReader for IoReader<R> {
    async fn read(&mut self, buf: &mut [u8]) -> Iec101Result<usize> {
        if let Some(timeout) = self.timeout {
            tokio::time::timeout(timeout, self.inner.read(buf))
                .await
                .map_err(|_| Iec101Error::Timeout)?
                .map_err(Iec101Error::Transport)
        } else {
            self.inner.read(buf).await.map_err(Iec101Error::Transport)
        }
    }
}

/// Write half over any tokio writer
pub struct IoWriter<W> {
    inner: W,
    timeout: Option<Duration>,
}

impl<W> IoWriter<W> {
    /// Wrap a writer; `timeout` bounds each individual write
    pub fn new(inner: W, timeout: Option<Duration>) -> Self {
        Self { inner, timeout }
    }

}

impl<W> fmt::Debug for IoWriter<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IoWriter")
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[async_trait]
impl<W: AsyncWrite + Unpin + Send> ByteWriter for IoWriter<W> {
    async fn write(&mut self, buf: &[u8]) -> Iec101Result<usize> {
        if let Some(timeout) = self.timeout {
            tokio::time::timeout(timeout, self.inner.write(buf))
                .await
                .map_err(|_| Iec101Error::Timeout)?
                .map_err(Iec101Error::Transport)
        } else {
            self.inner.write(buf).await.map_err(Iec101Error::Transport)
        }
    }

    async fn flush(&mut self) -> Iec101Result<()> {
        self.inner.flush().await.map_err(Iec101Error::Transport)
    }
}

/// Split a full-duplex tokio stream into boxed reader and writer halves
pub fn split_stream<S>(stream: S, timeout: Option<Duration>) -> (BoxedReader, BoxedWriter)
where
    S: AsyncRead + AsyncWrite + Send + 'static,
{
    let (read_half, write_half) = tokio::io::split(stream);
    (
        Box::new(IoReader::new(read_half, timeout)),
        Box::new(IoWriter::new(write_half, timeout)),
    )
}
