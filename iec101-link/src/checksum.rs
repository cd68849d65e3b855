//! Arithmetic checksum for FT1.2 frames

use iec101_core::{FramingError, Iec101Result};

/// Modulo-256 sum over control, address and user data bytes
#[derive(Debug, Clone, Copy, Default)]
pub struct ChecksumCalc {
    sum: u8,
}

impl ChecksumCalc {
    /// Create a new checksum calculator
    pub fn new() -> Self {
        Self { sum: 0 }
    }

    /// Reset the checksum to its initial state
    pub fn reset(&mut self) {
        self.sum = 0;
    }

    /// Update the checksum with a single byte
    pub fn update(&mut self, data: u8) {
        self.sum = self.sum.wrapping_add(data);
    }

    /// Update the checksum with multiple bytes
    pub fn update_bytes(&mut self, data: &[u8]) {
        for &byte in data {
            self.update(byte);
        }
    }

    /// Get the current checksum value
    pub fn value(&self) -> u8 {
        self.sum
    }

    /// Compare against the checksum byte received on the wire
    pub fn validate(&self, received: u8) -> Iec101Result<()> {
        if self.sum != received {
            Err(FramingError::ChecksumMismatch {
                expected: self.sum,
                actual: received,
            }
            .into())
        } else {
            Ok(())
        }
    }

    /// Checksum of a byte slice in one call
    pub fn of(data: &[u8]) -> u8 {
        let mut calc = Self::new();
        calc.update_bytes(data);
        calc.value()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checksum_wraps() {
        let mut calc = ChecksumCalc::new();
        calc.update(0xFF);
        calc.update(0x02);
        assert_eq!(calc.value(), 0x01);
    }

    #[test]
    fn test_reset_link_checksum() {
        // control 0x40, address 0x0001
        assert_eq!(ChecksumCalc::of(&[0x40, 0x01, 0x00]), 0x41);
    }

    #[test]
    fn test_validate() {
        let mut calc = ChecksumCalc::new();
        calc.update_bytes(&[0x08, 0x01, 0x00]);
        assert!(calc.validate(0x09).is_ok());
        assert!(calc.validate(0x0A).is_err());
        calc.reset();
        assert_eq!(calc.value(), 0);
    }
}
