use log::debug;
use std::io;

use crate::bits::{BitCursor, Bits};
use crate::marker::{Decoder, MarkerKind};
use crate::report::{Field, FieldReport, FieldValue, MarkerSegment};
use crate::tile_part;
use crate::CodestreamError;

// DCI profile bounds: a 2K codestream has 3 tile-parts per frame and a 4K
// one 6, and 60 step sizes cover every decomposition level the profile
// allows. The loops below are bounded by these, not by the stream.
const MAX_QUANTIZATION_VALUES: usize = 60;
const MAX_TILE_PART_LENGTHS: usize = 6;

// Progressions carried by a DCI POC marker segment, in order.
const PROGRESSION_PROFILES: [&str; 2] = ["2K", "4K"];
// RSpoc + CSpoc + LYEpoc + REpoc + CEpoc + Ppoc with 8-bit component indices
const PROGRESSION_ENTRY_LENGTH: usize = 7;

/// Decodes one framed segment. Only SOT touches `reader`, to pull in the SOD
/// region that follows it.
pub(crate) fn decode<R: io::Read + io::Seek>(
    segment: &MarkerSegment,
    reader: &mut R,
) -> Result<FieldReport, CodestreamError> {
    let kind = match segment.kind() {
        Some(kind) => kind,
        None => {
            return Err(CodestreamError::UnknownMarker {
                marker: segment.marker(),
                offset: segment.offset(),
            })
        }
    };

    match kind.decoder() {
        Decoder::Sot => tile_part::decode_sot(segment, reader),
        decoder => Ok(decode_payload(decoder, segment.payload())),
    }
}

/// Decodes a payload on its own.
///
/// Running out of payload is never fatal here: the fields read so far are
/// kept and the report carries a warning. For SOT only the four header fields
/// are decoded, since the SOD region lives in the stream.
pub fn decode_payload(decoder: Decoder, payload: &[u8]) -> FieldReport {
    match decoder {
        Decoder::Default => FieldReport::default(),
        Decoder::Siz => run(payload, decode_siz),
        Decoder::Cod => run(payload, decode_cod),
        Decoder::Qcd => run(payload, decode_qcd),
        Decoder::Tlm => run(payload, decode_tlm),
        Decoder::Poc => run(payload, decode_poc),
        Decoder::Sot => run(payload, |cursor, report| {
            tile_part::read_tile_part(cursor, report).map(|_| ())
        }),
        Decoder::Sod => run(payload, tile_part::decode_sod),
        Decoder::Cme => run(payload, decode_cme),
    }
}

pub(crate) fn run<F>(payload: &[u8], decode: F) -> FieldReport
where
    F: FnOnce(&mut BitCursor, &mut FieldReport) -> Result<(), CodestreamError>,
{
    let mut cursor = BitCursor::new(payload);
    let mut report = FieldReport::default();

    if let Err(error) = decode(&mut cursor, &mut report) {
        report.warn(format!("payload ends early, partial decode: {}", error));
        return report;
    }

    let trailing = cursor.remaining_bits() / 8;
    if trailing > 0 {
        report.warn(format!("{} trailing bytes not decoded", trailing));
    }

    report
}

fn read_integer(
    cursor: &mut BitCursor,
    width: u8,
    name: impl Into<String>,
    description: &'static str,
) -> Result<Field, CodestreamError> {
    let name = name.into();
    debug!("{} at bit {}, {} bits", name, cursor.position(), width);
    let bits = cursor.read_bits(width)?;
    Ok(Field::new(name, description, FieldValue::Integer(bits.uint())).with_raw(bits))
}

fn power_of_two(exponent: u64) -> FieldValue {
    if exponent < 64 {
        FieldValue::Integer(1 << exponent)
    } else {
        FieldValue::Text(format!("2^{}", exponent))
    }
}

fn progression_order(value: u64) -> &'static str {
    match value {
        0b0000_0000 => "Layer-resolution-component-position progressive",
        0b0000_0001 => "Resolution-layer-component-position progressive",
        0b0000_0010 => "Resolution-position-component-layer progressive",
        0b0000_0011 => "Position-component-resolution-layer progressive",
        0b0000_0100 => "Component-position-resolution-layer progressive",
        _ => "Reserved",
    }
}

fn capabilities(value: u64) -> &'static str {
    match value {
        0x0000 => "No restrictions beyond ISO/IEC 15444-1",
        0x0001 => "Profile 0",
        0x0002 => "Profile 1",
        0x0003 => "2K digital cinema profile",
        0x0004 => "4K digital cinema profile",
        _ => "Other profile",
    }
}

// A.5.1 - Image and tile size (SIZ)
fn decode_siz(cursor: &mut BitCursor, report: &mut FieldReport) -> Result<(), CodestreamError> {
    let rsiz = cursor.read_bits(16)?;
    report.push(
        Field::new(
            "Rsiz",
            "Profile",
            FieldValue::Enumerated {
                value: rsiz.uint(),
                meaning: capabilities(rsiz.uint()),
            },
        )
        .with_raw(rsiz),
    );

    let grid: [(&str, &'static str); 8] = [
        ("Xsiz", "Width of the reference grid"),
        ("Ysiz", "Height of the reference grid"),
        ("XOsiz", "Horizontal offset of the image area"),
        ("YOsiz", "Vertical offset of the image area"),
        ("XTsiz", "Width of one reference tile"),
        ("YTsiz", "Height of one reference tile"),
        ("XTOsiz", "Horizontal offset of the first tile"),
        ("YTOsiz", "Vertical offset of the first tile"),
    ];
    for (name, description) in grid.iter() {
        report.push(read_integer(cursor, 32, *name, *description)?.with_unit("px"));
    }

    let csiz = read_integer(cursor, 16, "Csiz", "Number of components")?;
    let no_components = csiz.integer().unwrap_or(0);
    report.push(csiz.with_unit("components"));

    for i in 0..no_components {
        // x000 0000 to x010 0101: component depth minus one, 1 to 38 bits
        // 0xxx xxxx unsigned, 1xxx xxxx signed
        let ssiz = cursor.read_bits(8)?;
        report.push(
            Field::new(
                format!("Ssiz[{}]", i),
                "Component parameters",
                FieldValue::Integer(ssiz.uint()),
            )
            .with_raw(ssiz),
        );
        report.push(
            Field::new(
                format!("depth[{}]", i),
                "Component bit depth",
                FieldValue::Integer(ssiz.slice(1, 8).uint() + 1),
            )
            .with_raw(ssiz.slice(1, 8))
            .with_unit("bits"),
        );
        report.push(
            Field::new(
                format!("signed[{}]", i),
                "Component values are signed",
                FieldValue::Flag(ssiz.bit(0)),
            )
            .with_raw(ssiz.slice(0, 1)),
        );
        report.push(read_integer(
            cursor,
            8,
            format!("XRsiz[{}]", i),
            "Horizontal separation of a sample",
        )?);
        report.push(read_integer(
            cursor,
            8,
            format!("YRsiz[{}]", i),
            "Vertical separation of a sample",
        )?);
    }

    Ok(())
}

// (bit cleared, bit set) meaning of each code-block style bit, indexed from
// the most significant bit.
const CODE_BLOCK_STYLES: [(&str, &str); 8] = [
    ("Unknown parameter", "Unknown parameter"),
    ("Unknown parameter", "Unknown parameter"),
    (
        "No segmentation symbols are used",
        "Segmentation symbols are used",
    ),
    ("No predictable termination", "Predictable termination"),
    (
        "No vertically stripe causal context",
        "Vertically stripe causal context",
    ),
    (
        "No termination on each coding pass",
        "Termination on each coding pass",
    ),
    (
        "No reset of context probabilities on coding pass boundaries",
        "Reset context probabilities on coding pass boundaries",
    ),
    (
        "No selective arithmetic coding bypass",
        "Selective arithmetic coding bypass",
    ),
];

// A.6.1 - Coding style default (COD)
fn decode_cod(cursor: &mut BitCursor, report: &mut FieldReport) -> Result<(), CodestreamError> {
    // xxxx xxx1 precincts defined below
    // xxxx xx1x SOP marker segments may be used
    // xxxx x1xx EPH marker segments may be used
    let scod = cursor.read_bits(8)?;
    report.push(
        Field::new("Scod", "Coding style", FieldValue::Integer(scod.uint())).with_raw(scod),
    );
    let has_precincts = scod.uint() & 0b001 != 0;
    report.push(Field::new(
        "Scod precincts",
        "Entropy coder with precincts defined below",
        FieldValue::Flag(has_precincts),
    ));
    report.push(Field::new(
        "Scod SOP",
        "SOP marker segments may be used",
        FieldValue::Flag(scod.uint() & 0b010 != 0),
    ));
    report.push(Field::new(
        "Scod EPH",
        "EPH marker segments may be used",
        FieldValue::Flag(scod.uint() & 0b100 != 0),
    ));

    let order = cursor.read_bits(8)?;
    if order.uint() > 4 {
        report.warn(format!("reserved progression order {}", order.uint()));
    }
    report.push(
        Field::new(
            "SGcod order",
            "Progression order",
            FieldValue::Enumerated {
                value: order.uint(),
                meaning: progression_order(order.uint()),
            },
        )
        .with_raw(order),
    );

    report.push(read_integer(cursor, 16, "SGcod layers", "Number of layers")?);

    let mct = cursor.read_bits(8)?;
    let meaning = match mct.uint() {
        0 => "No multiple component transformation",
        1 => "Component transformation used on components 0, 1, 2",
        _ => "Reserved",
    };
    report.push(
        Field::new(
            "SGcod MCT",
            "Multiple component transformation",
            FieldValue::Enumerated {
                value: mct.uint(),
                meaning,
            },
        )
        .with_raw(mct),
    );

    let levels = read_integer(cursor, 8, "SPcod levels", "Number of decomposition levels")?;
    let no_decomposition_levels = levels.integer().unwrap_or(0);
    report.push(levels);

    // code-block size = 2 ^ (value + 2)
    let xcb = cursor.read_bits(8)?;
    report.push(
        Field::new("xcb", "Code-block width", power_of_two(xcb.uint() + 2))
            .with_raw(xcb)
            .with_unit("px"),
    );
    let ycb = cursor.read_bits(8)?;
    report.push(
        Field::new("ycb", "Code-block height", power_of_two(ycb.uint() + 2))
            .with_raw(ycb)
            .with_unit("px"),
    );

    let style = cursor.read_bits(8)?;
    report.push(
        Field::new(
            "cbstyle",
            "Style of the code-block coding passes",
            FieldValue::Integer(style.uint()),
        )
        .with_raw(style),
    );
    let style_byte = [style.uint() as u8];
    let mut style_bits = BitCursor::new(&style_byte);
    for (i, (cleared, set)) in CODE_BLOCK_STYLES.iter().enumerate() {
        let bit = style_bits.read_bits(1)?;
        let meaning = if bit.uint() == 1 { set } else { cleared };
        if i < 2 && bit.uint() == 1 {
            report.warn(format!("unknown code-block style bit {} is set", i));
        }
        report.push(
            Field::new(
                format!("cbstyle[{}]", i),
                "Code-block style parameter bit",
                FieldValue::Text(meaning.to_string()),
            )
            .with_raw(bit),
        );
    }

    let transform = cursor.read_bits(8)?;
    let meaning = match transform.uint() {
        0 => "9-7 irreversible wavelet",
        1 => "5-3 reversible wavelet",
        _ => "Reserved",
    };
    if transform.uint() > 1 {
        report.warn(format!("reserved transformation {}", transform.uint()));
    }
    report.push(
        Field::new(
            "transform",
            "Wavelet transformation",
            FieldValue::Enumerated {
                value: transform.uint(),
                meaning,
            },
        )
        .with_raw(transform),
    );

    if !has_precincts && cursor.remaining_bits() == 0 {
        report.push(Field::new(
            "precincts",
            "Default precincts, PPx = 15 and PPy = 15",
            FieldValue::Flag(false),
        ));
        return Ok(());
    }

    // 4 MSBs are the height exponent PPy, 4 LSBs the width exponent PPx.
    // The first entry is the NLLL sub-band, one more per resolution level.
    for level in 0..=no_decomposition_levels {
        let height = cursor.read_bits(4)?;
        let width = cursor.read_bits(4)?;
        report.push(
            Field::new(
                format!("PPx[{}]", level),
                "Precinct width",
                power_of_two(width.uint()),
            )
            .with_raw(width)
            .with_unit("px"),
        );
        report.push(
            Field::new(
                format!("PPy[{}]", level),
                "Precinct height",
                power_of_two(height.uint()),
            )
            .with_raw(height)
            .with_unit("px"),
        );
    }

    Ok(())
}

// A.6.4 - Quantization default (QCD)
fn decode_qcd(cursor: &mut BitCursor, report: &mut FieldReport) -> Result<(), CodestreamError> {
    let sqcd = cursor.read_bits(8)?;
    report.push(
        Field::new(
            "Sqcd",
            "Quantization style for all components",
            FieldValue::Integer(sqcd.uint()),
        )
        .with_raw(sqcd),
    );

    // xxx0 0000 to xxx1 1111 guard bits 0 to 7
    let guard = sqcd.slice(0, 3);
    report.push(
        Field::new(
            "guard bits",
            "Number of guard bits",
            FieldValue::Integer(guard.uint()),
        )
        .with_raw(guard)
        .with_unit("bits"),
    );

    let style = sqcd.slice(3, 8);
    let meaning = if style.bin() == "00010" {
        "Scalar explicit"
    } else {
        report.warn(format!(
            "quantization style {} is not scalar explicit",
            style.bin()
        ));
        "Scalar NOT explicit (wrong bits)"
    };
    report.push(
        Field::new(
            "Sqcd style",
            "Quantization style",
            FieldValue::Enumerated {
                value: style.uint(),
                meaning,
            },
        )
        .with_raw(style),
    );

    // The actual number of sub-bands follows from the decomposition levels
    // of COD, which are not known here, so read until the payload runs out.
    //
    // 0000 0xxx xxxx xxxx to 1111 1xxx xxxx xxxx mantissa
    // xxxx x000 0000 0000 to xxxx x111 1111 1111 exponent
    //
    // ISO/IEC 15444-1 A.6.4 names these the other way round (epsilon in the
    // high 5 bits, mu in the low 11); the labels here follow the DCI tooling.
    for i in 0..MAX_QUANTIZATION_VALUES {
        if !cursor.has_bits(16) {
            break;
        }
        let spqcd = cursor.read_bits(16)?;
        let mantissa = spqcd.slice(0, 5);
        let exponent = spqcd.slice(5, 16);
        report.push(
            Field::new(
                format!("SPqcd[{}]", i),
                "Quantization step size value",
                FieldValue::Integer(spqcd.uint()),
            )
            .with_raw(spqcd),
        );
        report.push(
            Field::new(
                format!("mantissa[{}]", i),
                "Mantissa of the quantization step size",
                FieldValue::Integer(mantissa.uint()),
            )
            .with_raw(mantissa),
        );
        report.push(
            Field::new(
                format!("exponent[{}]", i),
                "Exponent of the quantization step size",
                FieldValue::Integer(exponent.uint()),
            )
            .with_raw(exponent),
        );
    }

    if cursor.has_bits(16) {
        report.warn(format!(
            "{} bytes left after {} sub-bands, beyond the DCI profile",
            cursor.remaining_bits() / 8,
            MAX_QUANTIZATION_VALUES
        ));
    }
    cursor.skip_to_end();

    Ok(())
}

// A.7.1 - Tile-part lengths (TLM)
fn decode_tlm(cursor: &mut BitCursor, report: &mut FieldReport) -> Result<(), CodestreamError> {
    report.push(read_integer(
        cursor,
        8,
        "Ztlm",
        "Index of this marker segment",
    )?);

    // xx00 xxxx ST = 0, Ttlm is 0 bits, tile-parts are in index order
    // xx01 xxxx ST = 1, Ttlm is 8 bits
    // xx10 xxxx ST = 2, Ttlm is 16 bits
    // x0xx xxxx SP = 0, Ptlm is 16 bits
    // x1xx xxxx SP = 1, Ptlm is 32 bits
    let stlm = cursor.read_bits(8)?;
    report.push(
        Field::new(
            "Stlm",
            "Size of the Ttlm and Ptlm parameters",
            FieldValue::Integer(stlm.uint()),
        )
        .with_raw(stlm),
    );

    let sp = stlm.slice(1, 2);
    let (ptlm_width, meaning) = if sp.uint() == 1 {
        (32, "Ptlm parameter 32 bits")
    } else {
        (16, "Ptlm parameter 16 bits")
    };
    report.push(
        Field::new(
            "Stlm SP",
            "Size of Ptlm",
            FieldValue::Enumerated {
                value: sp.uint(),
                meaning,
            },
        )
        .with_raw(sp),
    );

    let st = stlm.slice(2, 4);
    let (ttlm_width, meaning) = match st.uint() {
        0 => (
            0,
            "Ttlm parameter is 0 bits, one tile-part per tile in index order",
        ),
        1 => (8, "Ttlm parameter 8 bits"),
        2 => (16, "Ttlm parameter 16 bits"),
        _ => (0, "Reserved"),
    };
    report.push(
        Field::new(
            "Stlm ST",
            "Size of Ttlm",
            FieldValue::Enumerated {
                value: st.uint(),
                meaning,
            },
        )
        .with_raw(st),
    );
    if st.uint() == 3 {
        report.warn("reserved Ttlm size, tile-part lengths not decoded");
        cursor.skip_to_end();
        return Ok(());
    }

    let pair_width = (ttlm_width + ptlm_width) as usize;
    for i in 0..MAX_TILE_PART_LENGTHS {
        if !cursor.has_bits(pair_width) {
            break;
        }

        if ttlm_width == 0 {
            report.push(Field::new(
                format!("Ttlm[{}]", i),
                "Tile index of the tile-part (implicit)",
                FieldValue::Integer(i as u64),
            ));
        } else {
            report.push(read_integer(
                cursor,
                ttlm_width,
                format!("Ttlm[{}]", i),
                "Tile index of the tile-part",
            )?);
        }

        report.push(
            read_integer(
                cursor,
                ptlm_width,
                format!("Ptlm[{}]", i),
                "Length of SOT and SOD of the tile-part",
            )?
            .with_unit("bytes"),
        );
    }

    if cursor.has_bits(pair_width) {
        report.warn(format!(
            "{} bytes left after {} tile-parts, beyond the DCI profile",
            cursor.remaining_bits() / 8,
            MAX_TILE_PART_LENGTHS
        ));
        cursor.skip_to_end();
    }

    Ok(())
}

// A.6.6 - Progression order change (POC)
//
// Component indices are 16 bits when Csiz >= 257. DCI codestreams have three
// components, so they are always read as 8 bits here.
fn decode_poc(cursor: &mut BitCursor, report: &mut FieldReport) -> Result<(), CodestreamError> {
    let expected = PROGRESSION_PROFILES.len() * PROGRESSION_ENTRY_LENGTH;
    if cursor.remaining_bits() != expected * 8 {
        report.warn(format!(
            "POC payload is {} bytes, the DCI layout of two progressions with 8-bit component \
             indices (Csiz < 257) takes {}",
            cursor.remaining_bits() / 8,
            expected
        ));
    }

    for profile in PROGRESSION_PROFILES.iter() {
        report.push(read_integer(
            cursor,
            8,
            format!("RSpoc[{}]", profile),
            "Resolution level index for the start of a progression",
        )?);
        report.push(read_integer(
            cursor,
            8,
            format!("CSpoc[{}]", profile),
            "Component index for the start of a progression",
        )?);
        report.push(read_integer(
            cursor,
            16,
            format!("LYEpoc[{}]", profile),
            "Layer index for the end of a progression",
        )?);
        report.push(read_integer(
            cursor,
            8,
            format!("REpoc[{}]", profile),
            "Resolution level index for the end of a progression",
        )?);
        report.push(read_integer(
            cursor,
            8,
            format!("CEpoc[{}]", profile),
            "Component index for the end of a progression",
        )?);
        let ppoc = cursor.read_bits(8)?;
        report.push(
            Field::new(
                format!("Ppoc[{}]", profile),
                "Progression order",
                FieldValue::Enumerated {
                    value: ppoc.uint(),
                    meaning: progression_order(ppoc.uint()),
                },
            )
            .with_raw(ppoc),
        );
    }

    Ok(())
}

fn registration(value: u64) -> &'static str {
    match value {
        0 => "Binary values",
        1 => "Text ISO 8859-1",
        65535 => "Reserved for extension",
        _ => "Reserved",
    }
}

// Comment and extension (CME)
fn decode_cme(cursor: &mut BitCursor, report: &mut FieldReport) -> Result<(), CodestreamError> {
    let rcme: Bits = cursor.read_bits(16)?;
    report.push(
        Field::new(
            "Rcme",
            "Registration value",
            FieldValue::Enumerated {
                value: rcme.uint(),
                meaning: registration(rcme.uint()),
            },
        )
        .with_raw(rcme),
    );

    let data = cursor.tail();
    let value = if rcme.uint() == 1 {
        // ISO 8859-1 maps every byte to the code point of the same value
        FieldValue::Text(data.iter().map(|&byte| byte as char).collect())
    } else {
        FieldValue::Bytes(data.to_vec())
    };
    report.push(Field::new("Ccme", "Comment data", value));
    cursor.skip_to_end();

    Ok(())
}

impl MarkerKind {
    /// Convenience for decoding a payload by marker kind.
    pub fn decode_payload(&self, payload: &[u8]) -> FieldReport {
        decode_payload(self.decoder(), payload)
    }
}
