use std::fmt::Write as _;
use std::error;
use std::io;

use jpc::{marker_hex, CodestreamError, DecodedSegment, Field, FieldReport, FieldValue, MarkerKind};

#[derive(Debug, Clone, Copy, Default)]
pub struct RenderOptions {
    // Leave out raw payload and tile data dumps
    pub no_data: bool,

    // Bytes shown per hex dump, 0 for all of them
    pub max_hex: usize,
}

pub fn to_hex(bytes: &[u8], max: usize) -> Result<String, Box<dyn error::Error>> {
    let shown = if max == 0 { bytes.len() } else { max.min(bytes.len()) };
    let mut hex = String::with_capacity(shown * 2 + 3);
    for byte in &bytes[..shown] {
        write!(hex, "{:02x}", byte)?;
    }
    if shown < bytes.len() {
        hex.push_str("...");
    }
    Ok(hex)
}

fn encode_value(field: &Field, options: &RenderOptions) -> Result<String, Box<dyn error::Error>> {
    let mut value = match field.value() {
        FieldValue::Bytes(bytes) if options.no_data => format!("{} bytes", bytes.len()),
        FieldValue::Bytes(bytes) => to_hex(bytes, options.max_hex)?,
        other => other.to_string(),
    };
    if let Some(unit) = field.unit() {
        write!(value, " {}", unit)?;
    }
    Ok(value)
}

fn encode_field<W: io::Write>(
    writer: &mut W,
    prefix: &str,
    field: &Field,
    options: &RenderOptions,
) -> Result<(), Box<dyn error::Error>> {
    let value = encode_value(field, options)?;
    // enumerated meanings are longer than the value column
    match field.raw() {
        Some(raw) if raw.width() > 0 => writeln!(
            writer,
            "{} - {:<14} : {:<24} | {} ({})",
            prefix,
            field.name(),
            value,
            field.description(),
            raw
        )?,
        _ => writeln!(
            writer,
            "{} - {:<14} : {:<24} | {}",
            prefix,
            field.name(),
            value,
            field.description()
        )?,
    }
    Ok(())
}

fn encode_report<W: io::Write>(
    writer: &mut W,
    prefix: &str,
    report: &FieldReport,
    options: &RenderOptions,
) -> Result<(), Box<dyn error::Error>> {
    for field in report.fields() {
        encode_field(writer, prefix, field, options)?;
    }
    for warning in report.warnings() {
        writeln!(writer, "{} - warning: {}", prefix, warning)?;
    }
    if let Some(tile_data) = report.tile_data() {
        writeln!(writer)?;
        encode_segment(writer, tile_data, options)?;
    }
    Ok(())
}

fn encode_error<W: io::Write>(
    writer: &mut W,
    prefix: &str,
    error: &CodestreamError,
) -> Result<(), Box<dyn error::Error>> {
    match error {
        CodestreamError::UnknownMarker { marker, .. } => {
            writeln!(writer, "undefined marker {}", marker_hex(*marker).to_lowercase())?
        }
        _ => writeln!(writer, "{} - error: {}", prefix, error)?,
    }
    Ok(())
}

/// Writes one decoded segment: header, framing, then one line per field.
pub fn encode_segment<W: io::Write>(
    writer: &mut W,
    decoded: &DecodedSegment,
    options: &RenderOptions,
) -> Result<(), Box<dyn error::Error>> {
    let segment = &decoded.segment;
    let kind = match decoded.kind() {
        Some(kind) => kind,
        None => {
            if let Err(error) = &decoded.report {
                encode_error(writer, "???", error)?;
            }
            return Ok(());
        }
    };

    writeln!(
        writer,
        "{:45} ({})",
        kind.name(),
        marker_hex(segment.marker())
    )?;

    let payload = segment.payload();
    let framed = segment.declared_length().is_some() || kind == MarkerKind::Sod;
    if framed {
        if !kind.description().is_empty() {
            writeln!(writer, "---- {}", kind.description())?;
        }
        writeln!(writer, "offs: {}", segment.offset())?;
        if let Some(length) = segment.declared_length() {
            writeln!(writer, "size: {} bytes", length)?;
        }
        if !options.no_data && kind != MarkerKind::Sod {
            writeln!(
                writer,
                "data: {} bytes : {}",
                payload.len(),
                to_hex(payload, options.max_hex)?
            )?;
        }
    }

    match &decoded.report {
        Ok(report) => encode_report(writer, kind.mnemonic(), report, options)?,
        Err(error) => encode_error(writer, kind.mnemonic(), error)?,
    }

    if framed {
        writeln!(writer)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn render(bytes: Vec<u8>, options: RenderOptions) -> String {
        let mut output = vec![];
        for decoded in jpc::walk(Cursor::new(bytes)) {
            encode_segment(&mut output, &decoded.unwrap(), &options).unwrap();
        }
        String::from_utf8(output).unwrap()
    }

    #[test]
    fn test_to_hex() {
        assert_eq!(to_hex(&[0xff, 0x4f, 0x00], 0).unwrap(), "ff4f00");
        assert_eq!(to_hex(&[0xff, 0x4f, 0x00], 2).unwrap(), "ff4f...");
        assert_eq!(to_hex(&[], 4).unwrap(), "");
    }

    #[test]
    fn test_render_delimiters() {
        let output = render(vec![0xFF, 0x4F, 0xFF, 0xD9], RenderOptions::default());
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("[SOC] Start of codestream"));
        assert!(lines[0].ends_with("(FF4F)"));
        assert!(lines[1].starts_with("[EOC] End of codestream"));
    }

    #[test]
    fn test_render_comment() {
        let mut bytes = vec![0xFF, 0x64, 0x00, 0x08, 0x00, 0x01];
        bytes.extend_from_slice(b"DCI!");
        let output = render(bytes, RenderOptions::default());
        assert!(output.contains("offs: 0"));
        assert!(output.contains("size: 8 bytes"));
        assert!(output.contains("data: 6 bytes : 000144434921"));
        assert!(output.contains("CME - Ccme"));
        assert!(output.contains("DCI!"));
    }

    #[test]
    fn test_render_field_columns() {
        let mut bytes = vec![0xFF, 0x52, 0x00, 0x0C];
        bytes.extend_from_slice(&[0x00, 0x04, 0x00, 0x01, 0x01, 0x05, 0x04, 0x04, 0x00, 0x01]);
        let output = render(bytes, RenderOptions::default());

        let order = output
            .lines()
            .find(|line| line.starts_with("COD - SGcod order"))
            .unwrap();
        assert!(order.ends_with(
            ": 4 ─➤ Component-position-resolution-layer progressive | Progression order (0b00000100)"
        ));

        let xcb = output
            .lines()
            .find(|line| line.starts_with("COD - xcb"))
            .unwrap();
        assert_eq!(
            xcb,
            format!(
                "COD - {:<14} : {:<24} | Code-block width (0b00000100)",
                "xcb", "64 px"
            )
        );

        let sop = output
            .lines()
            .find(|line| line.starts_with("COD - Scod SOP"))
            .unwrap();
        assert!(sop.ends_with("| SOP marker segments may be used"));
    }

    #[test]
    fn test_render_unknown_marker() {
        let output = render(
            vec![0xFF, 0x63, 0x00, 0x03, 0x01],
            RenderOptions {
                no_data: true,
                max_hex: 0,
            },
        );
        assert_eq!(output.trim(), "undefined marker ff63");
    }
}
