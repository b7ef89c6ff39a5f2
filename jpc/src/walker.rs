use log::{info, warn};
use std::io;

use crate::marker::{marker_hex, MarkerKind, MarkerSymbol};
use crate::report::{DecodedSegment, MarkerSegment};
use crate::segments;
use crate::CodestreamError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Scanning,
    Done,
}

/// Iterates over the marker segments of a codestream, one decoded segment at
/// a time.
///
/// The walker owns the read position of the stream. Only the SOT decoder is
/// handed the stream, to pull in the SOD region that follows it.
pub struct SegmentWalker<R> {
    reader: R,
    state: State,
}

impl<R: io::Read + io::Seek> SegmentWalker<R> {
    pub fn new(reader: R) -> SegmentWalker<R> {
        SegmentWalker {
            reader,
            state: State::Scanning,
        }
    }

    pub fn is_done(&self) -> bool {
        self.state == State::Done
    }

    // Reads up to `buffer.len()` bytes, returning how many were available.
    fn read_available(&mut self, buffer: &mut [u8]) -> Result<usize, CodestreamError> {
        let mut filled = 0;
        while filled < buffer.len() {
            match self.reader.read(&mut buffer[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
        Ok(filled)
    }

    fn next_segment(&mut self) -> Result<Option<DecodedSegment>, CodestreamError> {
        let offset = self.reader.stream_position()?;

        let mut marker: MarkerSymbol = [0; 2];
        match self.read_available(&mut marker)? {
            0 => {
                info!("end of stream at byte offset {}", offset);
                return Ok(None);
            }
            1 => {
                warn!("trailing byte 0x{:02X} at byte offset {}", marker[0], offset);
                return Ok(None);
            }
            _ => {}
        }

        if !MarkerKind::has_length(marker) {
            info!("{} at byte offset {}", marker_hex(marker), offset);
            let segment = MarkerSegment::new(marker, offset, None, vec![]);
            let report = segments::decode(&segment, &mut self.reader);
            return Ok(Some(DecodedSegment { segment, report }));
        }

        let mut length: [u8; 2] = [0; 2];
        let read = self.read_available(&mut length)?;
        if read < length.len() {
            let segment = MarkerSegment::new(marker, offset, None, vec![]);
            return Ok(Some(DecodedSegment {
                segment,
                report: Err(CodestreamError::TruncatedSegment {
                    marker,
                    offset,
                    declared: 2,
                    available: read as u64,
                }),
            }));
        }

        let declared_length = u16::from_be_bytes(length);
        // the length field counts itself
        let payload_length = match declared_length.checked_sub(2) {
            Some(value) => value as usize,
            None => {
                warn!(
                    "marker {} at byte offset {} declares length {}, using empty payload",
                    marker_hex(marker),
                    offset,
                    declared_length
                );
                0
            }
        };

        let mut payload = vec![0; payload_length];
        let read = self.read_available(&mut payload)?;
        payload.truncate(read);
        let segment = MarkerSegment::new(marker, offset, Some(declared_length), payload);

        if read < payload_length {
            warn!(
                "marker {} at byte offset {} is cut short: {} of {} payload bytes",
                marker_hex(marker),
                offset,
                read,
                payload_length
            );
            return Ok(Some(DecodedSegment {
                segment,
                report: Err(CodestreamError::TruncatedSegment {
                    marker,
                    offset,
                    declared: declared_length as u64,
                    available: read as u64 + 2,
                }),
            }));
        }

        let report = match MarkerKind::lookup(marker) {
            Some(kind) => {
                info!(
                    "{} start at byte offset {}, {} payload bytes",
                    kind.mnemonic(),
                    offset,
                    payload_length
                );
                segments::decode(&segment, &mut self.reader)
            }
            None => {
                warn!(
                    "undefined marker {} at byte offset {}",
                    marker_hex(marker),
                    offset
                );
                Err(CodestreamError::UnknownMarker { marker, offset })
            }
        };

        Ok(Some(DecodedSegment { segment, report }))
    }
}

impl<R: io::Read + io::Seek> Iterator for SegmentWalker<R> {
    type Item = Result<DecodedSegment, CodestreamError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.state == State::Done {
            return None;
        }

        match self.next_segment() {
            Ok(Some(decoded)) => Some(Ok(decoded)),
            Ok(None) => {
                self.state = State::Done;
                None
            }
            Err(error) => {
                // unreadable input, nothing after this can be trusted
                self.state = State::Done;
                Some(Err(error))
            }
        }
    }
}

/// Walks every marker segment of `reader` until the stream is exhausted.
///
/// The sequence is lazy and can only be consumed once.
pub fn walk<R: io::Read + io::Seek>(reader: R) -> SegmentWalker<R> {
    SegmentWalker::new(reader)
}
