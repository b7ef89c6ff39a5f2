use std::fmt;

use crate::CodestreamError;

// Marker segment parameters are packed most significant bit first. Bit index
// 0 is therefore the MSB of the first byte, both for the cursor position and
// for sub-field slices of an already read field.

/// A field of `width` bits as read from a payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Bits {
    value: u64,
    width: u8,
}

impl Bits {
    pub fn new(value: u64, width: u8) -> Bits {
        let value = if width >= 64 {
            value
        } else {
            value & ((1u64 << width) - 1)
        };
        Bits { value, width }
    }

    pub fn uint(&self) -> u64 {
        self.value
    }

    pub fn width(&self) -> u8 {
        self.width
    }

    /// Sub-field from bit `first` (inclusive) to `last` (exclusive), where bit
    /// 0 is the most significant bit of this field.
    ///
    /// Bounds are clamped to the field width, so an out of range slice yields
    /// an empty field rather than panicking.
    pub fn slice(&self, first: u8, last: u8) -> Bits {
        let last = last.min(self.width);
        let first = first.min(last);
        let width = last - first;
        if width == 0 {
            return Bits::default();
        }
        let shift = self.width - last;
        Bits::new(self.value >> shift, width)
    }

    /// Single bit at `index` counted from the most significant bit.
    pub fn bit(&self, index: u8) -> bool {
        self.slice(index, index + 1).value == 1
    }

    /// Binary representation, zero padded to the field width.
    pub fn bin(&self) -> String {
        if self.width == 0 {
            return String::new();
        }
        format!("{:0width$b}", self.value, width = self.width as usize)
    }
}

impl fmt::Display for Bits {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "0b{}", self.bin())
    }
}

/// Forward-only reader of arbitrary width fields over a marker segment
/// payload.
#[derive(Debug, Clone)]
pub struct BitCursor<'a> {
    buffer: &'a [u8],
    position: usize,
}

impl<'a> BitCursor<'a> {
    pub fn new(buffer: &'a [u8]) -> BitCursor<'a> {
        BitCursor {
            buffer,
            position: 0,
        }
    }

    pub fn position(&self) -> usize {
        self.position
    }

    fn len(&self) -> usize {
        self.buffer.len() * 8
    }

    pub fn remaining_bits(&self) -> usize {
        self.len() - self.position
    }

    pub fn has_bits(&self, n: usize) -> bool {
        self.remaining_bits() >= n
    }

    /// Reads the next `n` bits, at most 64.
    ///
    /// On failure the position is left untouched.
    pub fn read_bits(&mut self, n: u8) -> Result<Bits, CodestreamError> {
        if n > 64 || !self.has_bits(n as usize) {
            return Err(CodestreamError::InsufficientData {
                requested: n as usize,
                remaining: self.remaining_bits(),
            });
        }

        let bits = self.peek(self.position, n);
        self.position += n as usize;
        Ok(bits)
    }

    /// Bits `first..last` of the buffer. Only bits already consumed may be
    /// sliced; the position does not move.
    pub fn slice(&self, first: usize, last: usize) -> Result<Bits, CodestreamError> {
        if first > last || last > self.position || last - first > 64 {
            return Err(CodestreamError::InsufficientData {
                requested: last.saturating_sub(first),
                remaining: self.position.saturating_sub(first),
            });
        }
        Ok(self.peek(first, (last - first) as u8))
    }

    /// The unread part of the buffer, starting at the next whole byte.
    pub fn tail(&self) -> &'a [u8] {
        let start = (self.position + 7) / 8;
        self.buffer.get(start..).unwrap_or(&[])
    }

    /// Consumes every remaining bit.
    pub fn skip_to_end(&mut self) {
        self.position = self.len();
    }

    fn peek(&self, start: usize, n: u8) -> Bits {
        let mut value: u64 = 0;
        for offset in start..start + n as usize {
            let byte = self.buffer[offset / 8];
            let bit = (byte >> (7 - offset % 8)) & 1;
            value = (value << 1) | bit as u64;
        }
        Bits::new(value, n)
    }
}
