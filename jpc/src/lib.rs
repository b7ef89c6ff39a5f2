//! Marker segment inspector for JPEG 2000 codestreams of the DCI/SMPTE
//! digital cinema profile.
//!
//! [`walk`] frames every marker segment of a stream and decodes the ones it
//! knows about into a [`FieldReport`]. Decoding is done field by field with a
//! [`BitCursor`], so reports keep the raw bits next to their interpretation.

use std::error;
use std::fmt;
use std::io;

mod bits;
mod marker;
mod report;
mod segments;
mod tile_part;
mod walker;

pub use bits::{BitCursor, Bits};
pub use marker::{
    marker_hex, Decoder, MarkerKind, MarkerSymbol, MARKER_SYMBOL_CME, MARKER_SYMBOL_COC,
    MARKER_SYMBOL_COD, MARKER_SYMBOL_EOC, MARKER_SYMBOL_EPH, MARKER_SYMBOL_PLM,
    MARKER_SYMBOL_PLT, MARKER_SYMBOL_POC, MARKER_SYMBOL_PPM, MARKER_SYMBOL_PPT,
    MARKER_SYMBOL_QCC, MARKER_SYMBOL_QCD, MARKER_SYMBOL_RGN, MARKER_SYMBOL_SIZ,
    MARKER_SYMBOL_SOC, MARKER_SYMBOL_SOD, MARKER_SYMBOL_SOP, MARKER_SYMBOL_SOT,
    MARKER_SYMBOL_TLM,
};
pub use report::{DecodedSegment, Field, FieldReport, FieldValue, MarkerSegment};
pub use segments::decode_payload;
pub use tile_part::{read_tile_data, TilePart, SOT_SEGMENT_LENGTH};
pub use walker::{walk, SegmentWalker};

#[derive(Debug, Clone, PartialEq)]
pub enum CodestreamError {
    // A field asked for more bits than the payload has left
    InsufficientData {
        requested: usize,
        remaining: usize,
    },
    UnknownMarker {
        marker: MarkerSymbol,
        offset: u64,
    },
    // Psot does not fit the stream, either negative or past its end. Raised
    // by read_tile_data; the SOT decoder turns it into a report warning.
    TruncatedTilePart {
        tile_part: TilePart,
        available: u64,
    },
    // The stream ends inside a marker segment
    TruncatedSegment {
        marker: MarkerSymbol,
        offset: u64,
        declared: u64,
        available: u64,
    },
    Io {
        kind: io::ErrorKind,
        error: String,
    },
}

impl error::Error for CodestreamError {}
impl fmt::Display for CodestreamError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::InsufficientData {
                requested,
                remaining,
            } => {
                write!(
                    f,
                    "insufficient data: {} bits requested, {} remaining",
                    requested, remaining
                )
            }
            Self::UnknownMarker { marker, offset } => {
                write!(
                    f,
                    "undefined marker 0x{} at byte offset {}",
                    marker_hex(*marker),
                    offset
                )
            }
            Self::TruncatedTilePart {
                tile_part,
                available,
            } => {
                write!(
                    f,
                    "truncated tile-part ({}): SOD length {} with {} bytes available",
                    tile_part,
                    tile_part.sod_length(),
                    available
                )
            }
            Self::TruncatedSegment {
                marker,
                offset,
                declared,
                available,
            } => {
                write!(
                    f,
                    "marker 0x{} at byte offset {} declares {} bytes, only {} available",
                    marker_hex(*marker),
                    offset,
                    declared,
                    available
                )
            }
            Self::Io { error, .. } => write!(f, "error reading codestream {}", error),
        }
    }
}

impl From<io::Error> for CodestreamError {
    fn from(error: io::Error) -> Self {
        CodestreamError::Io {
            kind: error.kind(),
            error: error.to_string(),
        }
    }
}
