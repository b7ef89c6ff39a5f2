use std::fmt;

use crate::bits::Bits;
use crate::marker::{MarkerKind, MarkerSymbol};
use crate::CodestreamError;

/// One marker segment as framed by the walker.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerSegment {
    marker: MarkerSymbol,

    // Byte offset of the marker itself
    offset: u64,

    // Lxxx: Length of marker segment in bytes (not including the marker).
    // Absent for SOC, EOC and the delegated SOD region.
    declared_length: Option<u16>,

    payload: Vec<u8>,
}

impl MarkerSegment {
    pub fn new(
        marker: MarkerSymbol,
        offset: u64,
        declared_length: Option<u16>,
        payload: Vec<u8>,
    ) -> MarkerSegment {
        MarkerSegment {
            marker,
            offset,
            declared_length,
            payload,
        }
    }

    pub fn marker(&self) -> MarkerSymbol {
        self.marker
    }

    pub fn kind(&self) -> Option<MarkerKind> {
        MarkerKind::lookup(self.marker)
    }

    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn declared_length(&self) -> Option<u16> {
        self.declared_length
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }
}

/// Interpretation attached to a decoded field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Integer(u64),
    Flag(bool),
    // A coded value and what the code means
    Enumerated { value: u64, meaning: &'static str },
    Text(String),
    Bytes(Vec<u8>),
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            FieldValue::Integer(value) => write!(f, "{}", value),
            FieldValue::Flag(value) => write!(f, "{}", if *value { "yes" } else { "no" }),
            FieldValue::Enumerated { value, meaning } => write!(f, "{} ─➤ {}", value, meaning),
            FieldValue::Text(text) => write!(f, "{}", text),
            FieldValue::Bytes(bytes) => write!(f, "{} bytes", bytes.len()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    // Parameter symbol, e.g. Xsiz or SPqcd[3]
    name: String,
    description: &'static str,
    raw: Option<Bits>,
    value: FieldValue,
    unit: Option<&'static str>,
}

impl Field {
    pub fn new(name: impl Into<String>, description: &'static str, value: FieldValue) -> Field {
        Field {
            name: name.into(),
            description,
            raw: None,
            value,
            unit: None,
        }
    }

    pub fn with_raw(mut self, raw: Bits) -> Field {
        self.raw = Some(raw);
        self
    }

    pub fn with_unit(mut self, unit: &'static str) -> Field {
        self.unit = Some(unit);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &'static str {
        self.description
    }

    pub fn raw(&self) -> Option<Bits> {
        self.raw
    }

    pub fn value(&self) -> &FieldValue {
        &self.value
    }

    pub fn unit(&self) -> Option<&'static str> {
        self.unit
    }

    pub fn integer(&self) -> Option<u64> {
        match self.value {
            FieldValue::Integer(value) | FieldValue::Enumerated { value, .. } => Some(value),
            FieldValue::Flag(value) => Some(value as u64),
            _ => None,
        }
    }
}

/// Ordered output of one decoder run.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct FieldReport {
    fields: Vec<Field>,
    warnings: Vec<String>,

    // Only filled by SOT, which owns the trailing SOD region
    tile_data: Option<Box<DecodedSegment>>,
}

impl FieldReport {
    pub fn push(&mut self, field: Field) {
        self.fields.push(field);
    }

    pub fn warn(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|field| field.name == name)
    }

    pub fn integer(&self, name: &str) -> Option<u64> {
        self.field(name).and_then(Field::integer)
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        match self.field(name).map(Field::value) {
            Some(FieldValue::Text(text)) => Some(text.as_str()),
            Some(FieldValue::Enumerated { meaning, .. }) => Some(*meaning),
            _ => None,
        }
    }

    pub fn tile_data(&self) -> Option<&DecodedSegment> {
        self.tile_data.as_deref()
    }

    pub(crate) fn set_tile_data(&mut self, decoded: DecodedSegment) {
        self.tile_data = Some(Box::new(decoded));
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.warnings.is_empty() && self.tile_data.is_none()
    }
}

/// A framed segment and the outcome of decoding its payload.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedSegment {
    pub segment: MarkerSegment,
    pub report: Result<FieldReport, CodestreamError>,
}

impl DecodedSegment {
    pub fn kind(&self) -> Option<MarkerKind> {
        self.segment.kind()
    }

    pub fn report(&self) -> Option<&FieldReport> {
        self.report.as_ref().ok()
    }

    pub fn error(&self) -> Option<&CodestreamError> {
        self.report.as_ref().err()
    }
}
