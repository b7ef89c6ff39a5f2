use log::{info, warn};
use std::fmt;
use std::io;

use crate::bits::BitCursor;
use crate::marker::{Decoder, MARKER_SYMBOL_SOD};
use crate::report::{DecodedSegment, Field, FieldReport, FieldValue, MarkerSegment};
use crate::segments;
use crate::CodestreamError;

// SOT marker (2) + Lsot (2) + Isot (2) + Psot (4) + TPsot (1) + TNsot (1)
pub const SOT_SEGMENT_LENGTH: i64 = 12;

// A.4.2
//
// Start of tile-part (SOT)
//
// Marks the beginning of a tile-part, the index of its tile, and the index of
// its tile-part. The SOD region that follows has no length of its own; its
// extent is given by Psot.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TilePart {
    // Isot: Tile index, in raster order starting at 0
    tile_index: u16,

    // Psot: Length, in bytes, from the first byte of the SOT marker segment
    // to the end of the data of that tile-part.
    total_length: u32,

    // TPsot: Tile-part index, from 0
    part_index: u8,

    // TNsot: Number of tile-parts of the tile, 0 when not specified
    part_count: u8,
}

impl TilePart {
    pub fn new(tile_index: u16, total_length: u32, part_index: u8, part_count: u8) -> TilePart {
        TilePart {
            tile_index,
            total_length,
            part_index,
            part_count,
        }
    }

    pub fn tile_index(&self) -> u16 {
        self.tile_index
    }

    pub fn total_length(&self) -> u32 {
        self.total_length
    }

    pub fn part_index(&self) -> u8 {
        self.part_index
    }

    pub fn part_count(&self) -> u8 {
        self.part_count
    }

    /// Bytes of the SOD region, SOD marker included. Negative for a corrupt
    /// Psot.
    pub fn sod_length(&self) -> i64 {
        self.total_length as i64 - SOT_SEGMENT_LENGTH
    }
}

impl fmt::Display for TilePart {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "Isot = {}, Psot = {}, TPsot = {}, TNsot = {}",
            self.tile_index, self.total_length, self.part_index, self.part_count
        )
    }
}

pub(crate) fn read_tile_part(
    cursor: &mut BitCursor,
    report: &mut FieldReport,
) -> Result<TilePart, CodestreamError> {
    let isot = cursor.read_bits(16)?;
    report.push(
        Field::new("Isot", "Tile number", FieldValue::Integer(isot.uint())).with_raw(isot),
    );

    let psot = cursor.read_bits(32)?;
    report.push(
        Field::new(
            "Psot",
            "Length of SOT+SOD",
            FieldValue::Integer(psot.uint()),
        )
        .with_raw(psot)
        .with_unit("bytes"),
    );

    let tpsot = cursor.read_bits(8)?;
    report.push(
        Field::new(
            "TPsot",
            "Tile-part number",
            FieldValue::Integer(tpsot.uint()),
        )
        .with_raw(tpsot),
    );

    let tnsot = cursor.read_bits(8)?;
    report.push(
        Field::new(
            "TNsot",
            "Number of tile-parts",
            FieldValue::Integer(tnsot.uint()),
        )
        .with_raw(tnsot),
    );

    Ok(TilePart::new(
        isot.uint() as u16,
        psot.uint() as u32,
        tpsot.uint() as u8,
        tnsot.uint() as u8,
    ))
}

/// Decodes SOT and hands the SOD region that follows it to the SOD decoder.
///
/// The reader must be positioned right after the SOT payload. When Psot
/// cannot be satisfied the SOT fields are kept, the truncation is reported
/// as a warning, and the reader is left where it was so scanning resumes as
/// if the SOD region were empty.
pub(crate) fn decode_sot<R: io::Read + io::Seek>(
    segment: &MarkerSegment,
    reader: &mut R,
) -> Result<FieldReport, CodestreamError> {
    let mut report = FieldReport::default();
    let mut cursor = BitCursor::new(segment.payload());

    let tile_part = match read_tile_part(&mut cursor, &mut report) {
        Ok(tile_part) => tile_part,
        Err(error) => {
            // without Psot there is nothing to delegate
            report.warn(format!("payload ends early, partial decode: {}", error));
            return Ok(report);
        }
    };
    if cursor.remaining_bits() > 0 {
        report.warn(format!(
            "{} trailing bytes not decoded",
            cursor.remaining_bits() / 8
        ));
    }

    let tile_data = match read_tile_data(&tile_part, reader) {
        Ok(tile_data) => tile_data,
        Err(error @ CodestreamError::TruncatedTilePart { .. }) => {
            report.warn(error.to_string());
            return Ok(report);
        }
        Err(error) => return Err(error),
    };
    report.push(
        Field::new(
            "SOD length",
            "Psot minus the SOT marker segment",
            FieldValue::Integer(tile_part.sod_length() as u64),
        )
        .with_unit("bytes"),
    );
    report.set_tile_data(tile_data);

    Ok(report)
}

/// Reads the `sod_length` bytes that follow the SOT payload and decodes them
/// as SOD, without the two byte SOD marker.
pub fn read_tile_data<R: io::Read + io::Seek>(
    tile_part: &TilePart,
    reader: &mut R,
) -> Result<DecodedSegment, CodestreamError> {
    let offset = reader.stream_position()?;
    let end = reader.seek(io::SeekFrom::End(0))?;
    reader.seek(io::SeekFrom::Start(offset))?;
    let available = end.saturating_sub(offset);

    let sod_length = tile_part.sod_length();
    if sod_length < 0 || sod_length as u64 > available {
        warn!(
            "tile-part at byte offset {} needs {} bytes of SOD, {} available",
            offset, sod_length, available
        );
        return Err(CodestreamError::TruncatedTilePart {
            tile_part: *tile_part,
            available,
        });
    }

    info!("SOD start at byte offset {}", offset);
    let mut region = vec![0; sod_length as usize];
    reader.read_exact(&mut region)?;
    info!("SOD end at byte offset {}", reader.stream_position()?);

    let data = region.get(MARKER_SYMBOL_SOD.len()..).unwrap_or(&[]).to_vec();
    let segment = MarkerSegment::new(MARKER_SYMBOL_SOD, offset, None, data);
    let mut report = segments::decode_payload(Decoder::Sod, segment.payload());
    if !region.starts_with(&MARKER_SYMBOL_SOD) {
        warn!("no SOD marker at byte offset {}", offset);
        report.warn(format!(
            "tile data at byte offset {} does not start with the SOD marker",
            offset
        ));
    }

    Ok(DecodedSegment {
        segment,
        report: Ok(report),
    })
}

// Start of data (SOD)
//
// Entropy coded data, reported as is.
pub(crate) fn decode_sod(
    cursor: &mut BitCursor,
    report: &mut FieldReport,
) -> Result<(), CodestreamError> {
    let data = cursor.tail();
    report.push(
        Field::new(
            "length",
            "Bytes of tile-part data",
            FieldValue::Integer(data.len() as u64),
        )
        .with_unit("bytes"),
    );
    report.push(Field::new(
        "data",
        "Tile-part data",
        FieldValue::Bytes(data.to_vec()),
    ));
    cursor.skip_to_end();
    Ok(())
}
