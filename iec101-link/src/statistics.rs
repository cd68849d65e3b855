//! Link statistics collection

use iec101_core::{FramingError, Iec101Error};

/// Link layer statistics
///
/// Counters a session keeps while it sends and receives frames. Rejected
/// frames are counted once in `frames_rejected` and once in the counter for
/// their error class. An idle line counts nowhere.
///
/// # Example
/// ```
/// use iec101_core::FramingError;
/// use iec101_link::LinkStatistics;
///
/// let mut stats = LinkStatistics::new();
/// stats.increment_frames_received();
/// stats.record_rejection(&FramingError::Truncated.into());
/// assert_eq!(stats.framing_errors, 1);
/// assert_eq!(stats.error_rate(), 50.0);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkStatistics {
    /// Total number of frames sent
    pub frames_sent: u64,
    /// Total number of frames received and accepted
    pub frames_received: u64,
    /// Number of frames or messages discarded due to decode errors
    pub frames_rejected: u64,
    /// Number of checksum mismatches
    pub checksum_errors: u64,
    /// Number of other framing errors
    pub framing_errors: u64,
    /// Number of malformed ASDUs
    pub asdu_errors: u64,
    /// Number of malformed information object payloads
    pub payload_errors: u64,
    /// Number of transient transport errors waited out
    pub transport_retries: u64,
}

impl LinkStatistics {
    /// Create new statistics with all counters at zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear all statistics counters
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Increment frames sent counter
    pub fn increment_frames_sent(&mut self) {
        self.frames_sent += 1;
    }

    /// Increment frames received counter
    pub fn increment_frames_received(&mut self) {
        self.frames_received += 1;
    }

    /// Increment transport retry counter
    pub fn increment_transport_retries(&mut self) {
        self.transport_retries += 1;
    }

    /// Count a discarded frame by the class of its decode error
    ///
    /// Transport errors are not rejections and leave the counters unchanged.
    pub fn record_rejection(&mut self, error: &Iec101Error) {
        match error {
            Iec101Error::Framing(FramingError::ChecksumMismatch { .. }) => {
                self.checksum_errors += 1;
            }
            Iec101Error::Framing(_) => self.framing_errors += 1,
            Iec101Error::Asdu(_) => self.asdu_errors += 1,
            Iec101Error::Payload(_) => self.payload_errors += 1,
            _ => return,
        }
        self.frames_rejected += 1;
    }

    /// Percentage of received frames that were rejected
    ///
    /// Returns 0.0 if nothing has been received.
    pub fn error_rate(&self) -> f64 {
        let total = self.frames_received + self.frames_rejected;
        if total == 0 {
            0.0
        } else {
            (self.frames_rejected as f64 / total as f64) * 100.0
        }
    }
}
