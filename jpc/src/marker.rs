use std::fmt;

/// Two byte marker code, always in the 0xFF00 to 0xFFFF range.
pub type MarkerSymbol = [u8; 2];

// Delimiting markers and marker segments
pub const MARKER_SYMBOL_SOC: MarkerSymbol = [255, 79]; // Start of code stream
pub const MARKER_SYMBOL_SOT: MarkerSymbol = [255, 144]; // Start of tile-part
pub const MARKER_SYMBOL_SOD: MarkerSymbol = [255, 147]; // Start of data
pub const MARKER_SYMBOL_EOC: MarkerSymbol = [255, 217]; // End of codestream

// Fixed information marker segments
pub const MARKER_SYMBOL_SIZ: MarkerSymbol = [255, 81]; // Image and tile size

// Functional marker segments
pub const MARKER_SYMBOL_COD: MarkerSymbol = [255, 82]; // Coding style default
pub const MARKER_SYMBOL_COC: MarkerSymbol = [255, 83]; // Coding style component
pub const MARKER_SYMBOL_RGN: MarkerSymbol = [255, 94]; // Region-of-interest
pub const MARKER_SYMBOL_QCD: MarkerSymbol = [255, 92]; // Quantization default
pub const MARKER_SYMBOL_QCC: MarkerSymbol = [255, 93]; // Quantization component
pub const MARKER_SYMBOL_POC: MarkerSymbol = [255, 95]; // Progression order change

// Pointer marker segments
pub const MARKER_SYMBOL_TLM: MarkerSymbol = [255, 85]; // Tile-part lengths
pub const MARKER_SYMBOL_PLM: MarkerSymbol = [255, 87]; // Packet length, main header
pub const MARKER_SYMBOL_PLT: MarkerSymbol = [255, 88]; // Packet length, tile-part header
pub const MARKER_SYMBOL_PPM: MarkerSymbol = [255, 96]; // Packed packet headers, main header
pub const MARKER_SYMBOL_PPT: MarkerSymbol = [255, 97]; // Packed packet headers, tile-part header

// In bit stream markers and marker segments
pub const MARKER_SYMBOL_SOP: MarkerSymbol = [255, 145]; // Start of packet
pub const MARKER_SYMBOL_EPH: MarkerSymbol = [255, 146]; // End of packet header

// Informational marker segments
pub const MARKER_SYMBOL_CME: MarkerSymbol = [255, 100]; // Comment and extension

/// Formats a marker code the way it is printed everywhere: `FF90`.
pub fn marker_hex(marker: MarkerSymbol) -> String {
    format!("{:02X}{:02X}", marker[0], marker[1])
}

/// Routine used to interpret the payload of a marker segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decoder {
    // Framed and skipped, payload left uninterpreted
    Default,
    Siz,
    Cod,
    Qcd,
    Tlm,
    Poc,
    Sot,
    Sod,
    Cme,
}

/// Every marker the DCI profile inspector knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MarkerKind {
    Soc,
    Sot,
    Sod,
    Eoc,
    Siz,
    Cod,
    Coc,
    Rgn,
    Qcd,
    Qcc,
    Poc,
    Tlm,
    Plm,
    Plt,
    Ppm,
    Ppt,
    Sop,
    Eph,
    Cme,
}

impl MarkerKind {
    pub const ALL: [MarkerKind; 19] = [
        MarkerKind::Soc,
        MarkerKind::Sot,
        MarkerKind::Sod,
        MarkerKind::Eoc,
        MarkerKind::Siz,
        MarkerKind::Cod,
        MarkerKind::Coc,
        MarkerKind::Rgn,
        MarkerKind::Qcd,
        MarkerKind::Qcc,
        MarkerKind::Poc,
        MarkerKind::Tlm,
        MarkerKind::Plm,
        MarkerKind::Plt,
        MarkerKind::Ppm,
        MarkerKind::Ppt,
        MarkerKind::Sop,
        MarkerKind::Eph,
        MarkerKind::Cme,
    ];

    /// Registry lookup. Unknown codes yield `None`.
    pub fn lookup(marker: MarkerSymbol) -> Option<MarkerKind> {
        let kind = match marker {
            MARKER_SYMBOL_SOC => MarkerKind::Soc,
            MARKER_SYMBOL_SOT => MarkerKind::Sot,
            MARKER_SYMBOL_SOD => MarkerKind::Sod,
            MARKER_SYMBOL_EOC => MarkerKind::Eoc,
            MARKER_SYMBOL_SIZ => MarkerKind::Siz,
            MARKER_SYMBOL_COD => MarkerKind::Cod,
            MARKER_SYMBOL_COC => MarkerKind::Coc,
            MARKER_SYMBOL_RGN => MarkerKind::Rgn,
            MARKER_SYMBOL_QCD => MarkerKind::Qcd,
            MARKER_SYMBOL_QCC => MarkerKind::Qcc,
            MARKER_SYMBOL_POC => MarkerKind::Poc,
            MARKER_SYMBOL_TLM => MarkerKind::Tlm,
            MARKER_SYMBOL_PLM => MarkerKind::Plm,
            MARKER_SYMBOL_PLT => MarkerKind::Plt,
            MARKER_SYMBOL_PPM => MarkerKind::Ppm,
            MARKER_SYMBOL_PPT => MarkerKind::Ppt,
            MARKER_SYMBOL_SOP => MarkerKind::Sop,
            MARKER_SYMBOL_EPH => MarkerKind::Eph,
            MARKER_SYMBOL_CME => MarkerKind::Cme,
            _ => return None,
        };
        Some(kind)
    }

    pub fn symbol(&self) -> MarkerSymbol {
        match self {
            MarkerKind::Soc => MARKER_SYMBOL_SOC,
            MarkerKind::Sot => MARKER_SYMBOL_SOT,
            MarkerKind::Sod => MARKER_SYMBOL_SOD,
            MarkerKind::Eoc => MARKER_SYMBOL_EOC,
            MarkerKind::Siz => MARKER_SYMBOL_SIZ,
            MarkerKind::Cod => MARKER_SYMBOL_COD,
            MarkerKind::Coc => MARKER_SYMBOL_COC,
            MarkerKind::Rgn => MARKER_SYMBOL_RGN,
            MarkerKind::Qcd => MARKER_SYMBOL_QCD,
            MarkerKind::Qcc => MARKER_SYMBOL_QCC,
            MarkerKind::Poc => MARKER_SYMBOL_POC,
            MarkerKind::Tlm => MARKER_SYMBOL_TLM,
            MarkerKind::Plm => MARKER_SYMBOL_PLM,
            MarkerKind::Plt => MARKER_SYMBOL_PLT,
            MarkerKind::Ppm => MARKER_SYMBOL_PPM,
            MarkerKind::Ppt => MARKER_SYMBOL_PPT,
            MarkerKind::Sop => MARKER_SYMBOL_SOP,
            MarkerKind::Eph => MARKER_SYMBOL_EPH,
            MarkerKind::Cme => MARKER_SYMBOL_CME,
        }
    }

    /// Three letter mnemonic, used as the prefix of every field line.
    pub fn mnemonic(&self) -> &'static str {
        match self {
            MarkerKind::Soc => "SOC",
            MarkerKind::Sot => "SOT",
            MarkerKind::Sod => "SOD",
            MarkerKind::Eoc => "EOC",
            MarkerKind::Siz => "SIZ",
            MarkerKind::Cod => "COD",
            MarkerKind::Coc => "COC",
            MarkerKind::Rgn => "RGN",
            MarkerKind::Qcd => "QCD",
            MarkerKind::Qcc => "QCC",
            MarkerKind::Poc => "POC",
            MarkerKind::Tlm => "TLM",
            MarkerKind::Plm => "PLM",
            MarkerKind::Plt => "PLT",
            MarkerKind::Ppm => "PPM",
            MarkerKind::Ppt => "PPT",
            MarkerKind::Sop => "SOP",
            MarkerKind::Eph => "EPH",
            MarkerKind::Cme => "CME",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            MarkerKind::Soc => "[SOC] Start of codestream",
            MarkerKind::Sot => "[SOT] Start of tile-part",
            MarkerKind::Sod => "[SOD] Start of data",
            MarkerKind::Eoc => "[EOC] End of codestream",
            MarkerKind::Siz => "[SIZ] Image and tile size",
            MarkerKind::Cod => "[COD] Coding style default",
            MarkerKind::Coc => "[COC] Coding style component",
            MarkerKind::Rgn => "[RGN] Region-of-interest",
            MarkerKind::Qcd => "[QCD] Quantization default",
            MarkerKind::Qcc => "[QCC] Quantization component",
            MarkerKind::Poc => "[POC] Progression Order Change",
            MarkerKind::Tlm => "[TLM] Tile-part lengths, main header",
            MarkerKind::Plm => "[PLM] Packet length, main header",
            MarkerKind::Plt => "[PLT] Packet length, tile-part header",
            MarkerKind::Ppm => "[PPM] Packed packet headers, main header",
            MarkerKind::Ppt => "[PPT] Packed packet headers, tile-part header",
            MarkerKind::Sop => "[SOP] Start of packet",
            MarkerKind::Eph => "[EPH] End of packet header",
            MarkerKind::Cme => "[CME] Comment and extension",
        }
    }

    /// What the segment is for, empty for segments that are only framed.
    pub fn description(&self) -> &'static str {
        match self {
            MarkerKind::Siz => {
                "Provides information about the uncompressed image such as the width and height \
                 of the reference grid, the width and height of the tiles, the number of \
                 components, component bit depth, and the separation of component samples with \
                 respect to the reference grid"
            }
            MarkerKind::Cod => {
                "Describes the coding style, decomposition, and layering that is the default used \
                 for compressing all components of an image or a tile"
            }
            MarkerKind::Qcd => {
                "Describes the quantization default used for compressing all components not \
                 defined by a QCC marker segment"
            }
            MarkerKind::Tlm => {
                "Describes the length of every tile-part in the codestream, measured from the \
                 first byte of the SOT marker segment to the end of the data of that tile-part"
            }
            MarkerKind::Poc => {
                "Describes the bounds and progression order for any progression order other than \
                 default in the codestream"
            }
            MarkerKind::Sot => {
                "Marks the beginning of a tile-part and the index of its tile within a codestream"
            }
            MarkerKind::Sod => "Raw entropy coded data of the tile-part, framed by Psot",
            MarkerKind::Cme => "Comment, extension and unstructured data in the header",
            _ => "",
        }
    }

    pub fn decoder(&self) -> Decoder {
        match self {
            MarkerKind::Siz => Decoder::Siz,
            MarkerKind::Cod => Decoder::Cod,
            MarkerKind::Qcd => Decoder::Qcd,
            MarkerKind::Tlm => Decoder::Tlm,
            MarkerKind::Poc => Decoder::Poc,
            MarkerKind::Sot => Decoder::Sot,
            MarkerKind::Sod => Decoder::Sod,
            MarkerKind::Cme => Decoder::Cme,
            _ => Decoder::Default,
        }
    }

    /// SOC and EOC are bare markers; everything else is assumed to be
    /// followed by a 16-bit length.
    pub fn has_length(marker: MarkerSymbol) -> bool {
        marker != MARKER_SYMBOL_SOC && marker != MARKER_SYMBOL_EOC
    }
}

impl fmt::Display for MarkerKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} ({})", self.name(), marker_hex(self.symbol()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_lookup_round_trip() {
        for kind in MarkerKind::ALL.iter() {
            assert_eq!(MarkerKind::lookup(kind.symbol()), Some(*kind));
            assert!(kind.name().contains(kind.mnemonic()));
        }
    }

    #[test]
    fn test_codes_and_names_are_unique() {
        let symbols: HashSet<MarkerSymbol> = MarkerKind::ALL.iter().map(|k| k.symbol()).collect();
        let names: HashSet<&str> = MarkerKind::ALL.iter().map(|k| k.name()).collect();
        assert_eq!(symbols.len(), MarkerKind::ALL.len());
        assert_eq!(names.len(), MarkerKind::ALL.len());
    }

    #[test]
    fn test_unknown_marker() {
        assert_eq!(MarkerKind::lookup([0xFF, 0x63]), None);
        assert_eq!(MarkerKind::lookup([0x00, 0x4F]), None);
    }

    #[test]
    fn test_decoders() {
        assert_eq!(MarkerKind::Sot.decoder(), Decoder::Sot);
        assert_eq!(MarkerKind::Cme.decoder(), Decoder::Cme);
        for kind in [
            MarkerKind::Coc,
            MarkerKind::Rgn,
            MarkerKind::Qcc,
            MarkerKind::Plm,
            MarkerKind::Plt,
            MarkerKind::Ppm,
            MarkerKind::Ppt,
            MarkerKind::Sop,
            MarkerKind::Eph,
        ]
        .iter()
        {
            assert_eq!(kind.decoder(), Decoder::Default);
        }
    }

    #[test]
    fn test_framing() {
        assert!(!MarkerKind::has_length(MARKER_SYMBOL_SOC));
        assert!(!MarkerKind::has_length(MARKER_SYMBOL_EOC));
        assert!(MarkerKind::has_length(MARKER_SYMBOL_SIZ));
        // unknown codes are assumed to carry a length
        assert!(MarkerKind::has_length([0xFF, 0x30]));
        assert_eq!(marker_hex(MARKER_SYMBOL_SOT), "FF90");
    }
}
