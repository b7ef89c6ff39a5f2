use std::{fs::File, io::BufReader, path::Path};

use jpc::{walk, DecodedSegment, FieldValue, MarkerKind};

fn decode_fixture(filename: &str) -> Vec<DecodedSegment> {
    let path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join(filename);
    let file = File::open(path).expect("file should exist");
    let reader = BufReader::new(file);
    walk(reader)
        .collect::<Result<Vec<_>, _>>()
        .expect("fixture should be readable")
}

#[test]
fn test_dci_2k_segments() {
    let segments = decode_fixture("dci_2k.j2c");

    let kinds: Vec<MarkerKind> = segments.iter().filter_map(|s| s.kind()).collect();
    assert_eq!(
        kinds,
        vec![
            MarkerKind::Soc,
            MarkerKind::Siz,
            MarkerKind::Cod,
            MarkerKind::Qcd,
            MarkerKind::Tlm,
            MarkerKind::Cme,
            MarkerKind::Sot,
            MarkerKind::Sot,
            MarkerKind::Sot,
            MarkerKind::Eoc,
        ]
    );

    let offsets: Vec<u64> = segments.iter().map(|s| s.segment.offset()).collect();
    assert_eq!(offsets, vec![0, 2, 51, 71, 108, 132, 147, 171, 191, 209]);

    for decoded in &segments {
        let report = decoded.report().expect("every segment should decode");
        assert!(
            report.warnings().is_empty(),
            "{:?} warned {:?}",
            decoded.kind(),
            report.warnings()
        );
    }
}

#[test]
fn test_dci_2k_siz() {
    let segments = decode_fixture("dci_2k.j2c");
    let siz = &segments[1];
    assert_eq!(siz.segment.declared_length(), Some(47));
    assert_eq!(siz.segment.payload().len(), 45);

    let report = siz.report().unwrap();
    assert_eq!(report.integer("Rsiz"), Some(3));
    assert_eq!(report.text("Rsiz"), Some("2K digital cinema profile"));
    assert_eq!(report.integer("Xsiz"), Some(1998));
    assert_eq!(report.integer("Ysiz"), Some(1080));
    assert_eq!(report.integer("XOsiz"), Some(0));
    assert_eq!(report.integer("YOsiz"), Some(0));
    assert_eq!(report.integer("XTsiz"), Some(1998));
    assert_eq!(report.integer("YTsiz"), Some(1080));
    assert_eq!(report.field("Xsiz").unwrap().unit(), Some("px"));
    assert_eq!(report.integer("Csiz"), Some(3));
    for i in 0..3 {
        assert_eq!(report.integer(&format!("Ssiz[{}]", i)), Some(11));
        assert_eq!(report.integer(&format!("depth[{}]", i)), Some(12));
        assert_eq!(report.integer(&format!("signed[{}]", i)), Some(0));
        assert_eq!(report.integer(&format!("XRsiz[{}]", i)), Some(1));
        assert_eq!(report.integer(&format!("YRsiz[{}]", i)), Some(1));
    }
}

#[test]
fn test_dci_2k_cod() {
    let segments = decode_fixture("dci_2k.j2c");
    let report = segments[2].report().unwrap();

    assert_eq!(report.integer("Scod"), Some(1));
    assert_eq!(report.integer("Scod precincts"), Some(1));
    assert_eq!(report.integer("Scod SOP"), Some(0));
    assert_eq!(report.integer("Scod EPH"), Some(0));
    assert_eq!(
        report.text("SGcod order"),
        Some("Component-position-resolution-layer progressive")
    );
    assert_eq!(report.integer("SGcod layers"), Some(1));
    assert_eq!(report.integer("SGcod MCT"), Some(1));
    assert_eq!(report.integer("SPcod levels"), Some(5));
    assert_eq!(report.integer("xcb"), Some(32));
    assert_eq!(report.integer("ycb"), Some(32));
    assert_eq!(report.integer("cbstyle"), Some(0));
    assert_eq!(
        report.text("cbstyle[7]"),
        Some("No selective arithmetic coding bypass")
    );
    assert_eq!(report.text("transform"), Some("9-7 irreversible wavelet"));

    assert_eq!(report.integer("PPx[0]"), Some(128));
    assert_eq!(report.integer("PPy[0]"), Some(128));
    for level in 1..=5 {
        assert_eq!(report.integer(&format!("PPx[{}]", level)), Some(256));
        assert_eq!(report.integer(&format!("PPy[{}]", level)), Some(256));
    }
    assert!(report.field("PPx[6]").is_none());
}

#[test]
fn test_dci_2k_qcd() {
    let segments = decode_fixture("dci_2k.j2c");
    let report = segments[3].report().unwrap();

    assert_eq!(report.integer("Sqcd"), Some(0x22));
    assert_eq!(report.integer("guard bits"), Some(1));
    assert_eq!(report.text("Sqcd style"), Some("Scalar explicit"));

    assert_eq!(report.integer("SPqcd[0]"), Some(0x7f00));
    assert_eq!(report.integer("mantissa[0]"), Some(15));
    assert_eq!(report.integer("exponent[0]"), Some(0x700));
    assert_eq!(report.integer("SPqcd[15]"), Some(0x7f78));
    assert_eq!(report.integer("exponent[15]"), Some(0x778));
    assert!(report.field("SPqcd[16]").is_none());
}

#[test]
fn test_dci_2k_tlm() {
    let segments = decode_fixture("dci_2k.j2c");
    let report = segments[4].report().unwrap();

    assert_eq!(report.integer("Ztlm"), Some(0));
    assert_eq!(report.integer("Stlm SP"), Some(1));
    assert_eq!(report.integer("Stlm ST"), Some(2));
    assert_eq!(report.integer("Ttlm[0]"), Some(0));
    assert_eq!(report.integer("Ptlm[0]"), Some(24));
    assert_eq!(report.integer("Ptlm[1]"), Some(20));
    assert_eq!(report.integer("Ptlm[2]"), Some(18));
    assert!(report.field("Ptlm[3]").is_none());
}

#[test]
fn test_dci_2k_cme() {
    let segments = decode_fixture("dci_2k.j2c");
    let report = segments[5].report().unwrap();

    assert_eq!(report.integer("Rcme"), Some(1));
    assert_eq!(report.text("Ccme"), Some("Kakadu-v8"));
}

#[test]
fn test_dci_2k_tile_parts() {
    let segments = decode_fixture("dci_2k.j2c");
    let expected: [(u64, u64, u64, &[u8]); 3] = [
        (147, 24, 0, &[1, 2, 3, 4, 5, 6, 7, 8, 9, 10]),
        (171, 20, 1, &[0xaa; 6]),
        (191, 18, 2, &[0x55; 4]),
    ];

    for (decoded, (offset, psot, tpsot, data)) in segments[6..9].iter().zip(expected.iter()) {
        assert_eq!(decoded.segment.offset(), *offset);
        assert_eq!(decoded.segment.declared_length(), Some(10));

        let report = decoded.report().unwrap();
        assert_eq!(report.integer("Isot"), Some(0));
        assert_eq!(report.integer("Psot"), Some(*psot));
        assert_eq!(report.integer("TPsot"), Some(*tpsot));
        assert_eq!(report.integer("TNsot"), Some(3));
        assert_eq!(report.integer("SOD length"), Some(psot - 12));

        let sod = report.tile_data().expect("SOT should carry its SOD region");
        assert_eq!(sod.kind(), Some(MarkerKind::Sod));
        assert_eq!(sod.segment.offset(), offset + 12);
        assert_eq!(sod.segment.declared_length(), None);
        assert_eq!(sod.segment.payload(), *data);

        let sod_report = sod.report().unwrap();
        assert!(sod_report.warnings().is_empty());
        assert_eq!(sod_report.integer("length"), Some(data.len() as u64));
        assert_eq!(
            sod_report.field("data").map(|f| f.value()),
            Some(&FieldValue::Bytes(data.to_vec()))
        );
    }
}
