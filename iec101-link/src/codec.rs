//! Frame reader and writer over a byte channel

use crate::address::AddressWidth;
use crate::frame::Frame;
use iec101_core::{Iec101Error, Iec101Result};
use iec101_transport::{ByteReader, ByteWriter};

/// Reads frames from a byte stream
pub struct FrameDecoder;

impl FrameDecoder {
    /// Read exactly one frame from the stream
    ///
    /// Blocks on the first byte, then reads only as many bytes as the header
    /// announces. On a framing error the bytes consumed so far are gone and
    /// the caller continues with the next read; the start byte of a rejected
    /// frame is always consumed, so the stream makes progress.
    ///
    /// A read timeout before the first byte is reported as `Idle`; one in the
    /// middle of a frame stays `Timeout`.
    pub async fn decode<R: ByteReader + ?Sized>(
        reader: &mut R,
        width: AddressWidth,
    ) -> Iec101Result<Frame> {
        let first = match reader.read_byte().await {
            Err(Iec101Error::Timeout) => return Err(Iec101Error::Idle),
            other => other?,
        };
        let mut raw = Vec::with_capacity(16);
        raw.push(first);

        let total = loop {
            match Frame::wire_length(&raw, width)? {
                Some(total) => break total,
                None => raw.push(reader.read_byte().await?),
            }
        };

        let header_length = raw.len();
        raw.resize(total, 0);
        reader.read_exact(&mut raw[header_length..]).await?;

        Frame::decode(&raw, width)
    }
}

/// Writes frames to a byte stream
pub struct FrameEncoder;

impl FrameEncoder {
    /// Encode and send one frame, returning the number of bytes written
    ///
    /// The frame is encoded completely before anything is written, so an
    /// encode failure leaves the channel untouched.
    pub async fn write<W: ByteWriter + ?Sized>(
        writer: &mut W,
        frame: &Frame,
        width: AddressWidth,
    ) -> Iec101Result<usize> {
        let bytes = frame.encode(width)?;
        writer.write_all(&bytes).await?;
        writer.flush().await?;
        Ok(bytes.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use iec101_core::FramingError;
    use iec101_transport::{split_stream, IoReader, IoWriter};

    #[tokio::test]
    async fn test_stream_roundtrip() {
        let (left, right) = tokio::io::duplex(1024);
        let (_left_rx, mut tx) = split_stream(left, None);
        let (mut rx, _right_tx) = split_stream(right, None);

        let frames = vec![
            Frame::fixed(0x40, 1),
            Frame::SingleChar,
            Frame::variable(0x08, 1, vec![11, 1, 20, 1, 0, 1, 0, 0xD2, 0x04, 0]),
            Frame::fixed(0x00, 1),
        ];
        for frame in &frames {
            FrameEncoder::write(&mut tx, frame, AddressWidth::Two).await.unwrap();
        }
        for frame in &frames {
            let decoded = FrameDecoder::decode(&mut rx, AddressWidth::Two).await.unwrap();
            assert_eq!(&decoded, frame);
        }
    }

    #[tokio::test]
    async fn test_resynchronises_after_garbage() {
        let (left, right) = tokio::io::duplex(1024);
        let (_left_rx, mut tx) = split_stream(left, None);
        let (mut rx, _right_tx) = split_stream(right, None);

        tx.write_all(&[0x00, 0xFF]).await.unwrap();
        FrameEncoder::write(&mut tx, &Frame::fixed(0x49, 1), AddressWidth::Two)
            .await
            .unwrap();

        for garbage in [0x00u8, 0xFF] {
            let err = FrameDecoder::decode(&mut rx, AddressWidth::Two).await.unwrap_err();
            assert!(matches!(
                err,
                Iec101Error::Framing(FramingError::UnknownStartByte(b)) if b == garbage
            ));
        }
        let frame = FrameDecoder::decode(&mut rx, AddressWidth::Two).await.unwrap();
        assert_eq!(frame, Frame::fixed(0x49, 1));
    }

    #[tokio::test]
    async fn test_checksum_error_consumes_whole_frame() {
        let (left, right) = tokio::io::duplex(1024);
        let (_left_rx, mut tx) = split_stream(left, None);
        let (mut rx, _right_tx) = split_stream(right, None);

        let mut bad = Frame::fixed(0x40, 1).encode(AddressWidth::Two).unwrap();
        bad[4] ^= 0x01;
        tx.write_all(&bad).await.unwrap();
        tx.write_all(&[0xE5]).await.unwrap();

        let err = FrameDecoder::decode(&mut rx, AddressWidth::Two).await.unwrap_err();
        assert!(matches!(
            err,
            Iec101Error::Framing(FramingError::ChecksumMismatch { .. })
        ));
        let frame = FrameDecoder::decode(&mut rx, AddressWidth::Two).await.unwrap();
        assert_eq!(frame, Frame::SingleChar);
    }

    #[tokio::test]
    async fn test_short_read_is_transport_error() {
        let (left, right) = tokio::io::duplex(1024);
        let (_left_rx, mut tx) = split_stream(left, None);
        let (mut rx, _right_tx) = split_stream(right, None);

        tx.write_all(&[0x10, 0x40]).await.unwrap();
        tx.flush().await.unwrap();
        drop(tx);
        drop(_left_rx);

        let err = FrameDecoder::decode(&mut rx, AddressWidth::Two).await.unwrap_err();
        assert!(err.is_transport());
    }

    #[tokio::test]
    async fn test_oversized_frame_writes_nothing() {
        let (left, right) = tokio::io::duplex(1024);
        let (_left_rx, mut tx) = split_stream(left, Some(std::time::Duration::from_millis(50)));
        let (mut rx, _right_tx) = split_stream(right, Some(std::time::Duration::from_millis(50)));

        let frame = Frame::variable(0x08, 1, vec![0u8; 300]);
        let err = FrameEncoder::write(&mut tx, &frame, AddressWidth::Two)
            .await
            .unwrap_err();
        assert!(matches!(err, Iec101Error::Framing(FramingError::FrameTooLarge(_))));

        let err = rx.read_byte().await.unwrap_err();
        assert!(matches!(err, Iec101Error::Timeout));
    }

    #[tokio::test]
    async fn test_silence_is_idle_but_stall_is_timeout() {
        let (left, right) = tokio::io::duplex(64);
        let (mut rx, _left_tx) = split_stream(left, Some(std::time::Duration::from_millis(20)));
        let (_right_rx, mut tx) = split_stream(right, None);

        let err = FrameDecoder::decode(&mut rx, AddressWidth::Two).await.unwrap_err();
        assert!(err.is_idle());

        tx.write_all(&[0x10, 0x40]).await.unwrap();
        tx.flush().await.unwrap();
        let err = FrameDecoder::decode(&mut rx, AddressWidth::Two).await.unwrap_err();
        assert!(matches!(err, Iec101Error::Timeout));
    }

    #[tokio::test]
    async fn test_fragmented_arrival() {
        let bytes = Frame::variable(0x43, 1, vec![100, 1, 6, 1, 0, 0, 0, 20])
            .encode(AddressWidth::Two)
            .unwrap();
        let mock = tokio_test::io::Builder::new()
            .read(&bytes[..1])
            .read(&bytes[1..5])
            .read(&bytes[5..9])
            .read(&bytes[9..])
            .build();
        let mut rx = IoReader::new(mock, None);

        let frame = FrameDecoder::decode(&mut rx, AddressWidth::Two).await.unwrap();
        assert_eq!(frame.asdu(), Some(&[100u8, 1, 6, 1, 0, 0, 0, 20][..]));
    }

    #[tokio::test]
    async fn test_exact_bytes_on_the_wire() {
        let mock = tokio_test::io::Builder::new()
            .write(&[0x10, 0x40, 0x01, 0x00, 0x41, 0x16])
            .write(&[0xE5])
            .build();
        let mut tx = IoWriter::new(mock, None);

        let written = FrameEncoder::write(&mut tx, &Frame::fixed(0x40, 1), AddressWidth::Two)
            .await
            .unwrap();
        assert_eq!(written, 6);
        FrameEncoder::write(&mut tx, &Frame::SingleChar, AddressWidth::Two)
            .await
            .unwrap();
    }
}
