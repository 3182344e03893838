mod common;

use fsic_registry::pdf::fonts;
use fsic_registry::pdf::{render_certificate, render_expiry_report};
use sha2::{Digest, Sha256};

use common::{seeded_store, today};

const SKIP_HINT: &str = "bundled fonts missing. Set FSIC_FONTS_DIR or copy Roboto into assets/fonts.";

fn render_certificate_pdf(id: i64) -> Option<(String, Vec<u8>)> {
    if !fonts::fonts_available(None) {
        return None;
    }

    let detail = seeded_store()
        .detail(id)
        .expect("load certificate")
        .expect("certificate exists");
    let pdf = render_certificate(&detail, None).expect("render certificate");
    Some((pdf.file_name, pdf.bytes))
}

fn scrub_pdf(bytes: &[u8]) -> Vec<u8> {
    fn scrub_segment(data: &mut [u8], tag: &[u8], terminator: u8) {
        let mut index = 0;
        while index + tag.len() < data.len() {
            if data[index..].starts_with(tag) {
                let mut cursor = index + tag.len();
                while cursor < data.len() && data[cursor] != terminator {
                    if terminator == b')'
                        || !matches!(data[cursor], b'<' | b'>' | b' ' | b'\n' | b'\r' | b'\t')
                    {
                        data[cursor] = b'0';
                    }
                    cursor += 1;
                }
                index = cursor;
            } else {
                index += 1;
            }
        }
    }

    fn scrub_xml(data: &mut [u8], start: &[u8], end: &[u8]) {
        let mut offset = 0;
        while offset + start.len() < data.len() {
            let Some(start_pos) = data[offset..]
                .windows(start.len())
                .position(|window| window == start)
            else {
                break;
            };
            let start_index = offset + start_pos + start.len();
            let Some(end_pos) = data[start_index..]
                .windows(end.len())
                .position(|window| window == end)
            else {
                break;
            };
            for byte in &mut data[start_index..start_index + end_pos] {
                if !matches!(*byte, b'<' | b'>' | b'/' | b' ' | b'\n' | b'\r' | b'\t') {
                    *byte = b'0';
                }
            }
            offset = start_index + end_pos + end.len();
        }
    }

    let mut normalized = bytes.to_vec();
    for tag in [&b"/CreationDate("[..], b"/ModDate(", b"/Producer("] {
        scrub_segment(&mut normalized, tag, b')');
    }
    scrub_segment(&mut normalized, b"/ID[", b']');
    for (start, end) in [
        (&b"<xmp:CreateDate>"[..], &b"</xmp:CreateDate>"[..]),
        (b"<xmp:ModifyDate>", b"</xmp:ModifyDate>"),
        (b"<xmp:MetadataDate>", b"</xmp:MetadataDate>"),
        (b"<xmpMM:DocumentID>", b"</xmpMM:DocumentID>"),
        (b"<xmpMM:InstanceID>", b"</xmpMM:InstanceID>"),
        (b"<xmpMM:VersionID>", b"</xmpMM:VersionID>"),
    ] {
        scrub_xml(&mut normalized, start, end);
    }
    normalized
}

fn normalized_hash(bytes: &[u8]) -> [u8; 32] {
    Sha256::digest(scrub_pdf(bytes)).into()
}

#[test]
fn certificate_renders_single_pdf_page() {
    let Some((file_name, bytes)) = render_certificate_pdf(1) else {
        eprintln!("Skipping certificate_renders_single_pdf_page: {SKIP_HINT}");
        return;
    };

    assert_eq!(file_name, "Certificate_FSIC-0001.pdf");
    assert!(bytes.starts_with(b"%PDF"), "output should be a PDF document");
}

#[test]
fn certificate_without_report_still_renders() {
    let Some((file_name, bytes)) = render_certificate_pdf(3) else {
        eprintln!("Skipping certificate_without_report_still_renders: {SKIP_HINT}");
        return;
    };

    assert_eq!(file_name, "Certificate_FSIC-0003.pdf");
    assert!(!bytes.is_empty());
}

#[cfg(feature = "document-info")]
fn info_entry(document: &lopdf::Document, key: &[u8]) -> String {
    let info_id = document
        .trailer
        .get(b"Info")
        .and_then(lopdf::Object::as_reference)
        .expect("trailer references /Info");
    let value = document
        .get_dictionary(info_id)
        .expect("/Info is a dictionary")
        .get(key)
        .and_then(lopdf::Object::as_str)
        .expect("/Info entry is a string");
    String::from_utf8_lossy(value).into_owned()
}

#[cfg(feature = "document-info")]
fn number(object: &lopdf::Object) -> f64 {
    match object {
        lopdf::Object::Integer(value) => *value as f64,
        lopdf::Object::Real(value) => f64::from(*value),
        other => panic!("expected a number, found {other:?}"),
    }
}

#[cfg(feature = "document-info")]
#[test]
fn certificate_carries_document_info() {
    let Some((_, bytes)) = render_certificate_pdf(1) else {
        eprintln!("Skipping certificate_carries_document_info: {SKIP_HINT}");
        return;
    };

    let document = lopdf::Document::load_mem(&bytes).expect("parse rendered PDF");
    assert_eq!(info_entry(&document, b"Title"), "Fire Safety Certificate - FSIC-0001");
    assert_eq!(info_entry(&document, b"Author"), "Barangay Commonwealth Fire & Rescue");
    assert_eq!(info_entry(&document, b"Subject"), "Fire Safety Certificate");
}

#[cfg(feature = "document-info")]
#[test]
fn certificate_is_one_landscape_a4_page() {
    let Some((_, bytes)) = render_certificate_pdf(1) else {
        eprintln!("Skipping certificate_is_one_landscape_a4_page: {SKIP_HINT}");
        return;
    };

    let document = lopdf::Document::load_mem(&bytes).expect("parse rendered PDF");
    let pages = document.get_pages();
    assert_eq!(pages.len(), 1);

    let page_id = *pages.values().next().expect("one page");
    let media_box: Vec<f64> = document
        .get_dictionary(page_id)
        .expect("page dictionary")
        .get(b"MediaBox")
        .and_then(lopdf::Object::as_array)
        .expect("page has a /MediaBox")
        .iter()
        .map(number)
        .collect();
    assert_eq!(media_box.len(), 4);

    let (width, height) = (media_box[2] - media_box[0], media_box[3] - media_box[1]);
    assert!((width - 841.89).abs() < 0.5, "width was {width} pt");
    assert!((height - 595.28).abs() < 0.5, "height was {height} pt");
}

#[test]
fn certificate_rendering_is_deterministic() {
    let (Some((_, bytes_a)), Some((_, bytes_b))) =
        (render_certificate_pdf(2), render_certificate_pdf(2))
    else {
        eprintln!("Skipping certificate_rendering_is_deterministic: {SKIP_HINT}");
        return;
    };

    assert_eq!(bytes_a.len(), bytes_b.len(), "PDF sizes should match");
    assert_eq!(
        normalized_hash(&bytes_a),
        normalized_hash(&bytes_b),
        "PDF renders must be deterministic after metadata normalization"
    );
}

#[test]
fn expiry_report_renders() {
    if !fonts::fonts_available(None) {
        eprintln!("Skipping expiry_report_renders: {SKIP_HINT}");
        return;
    }

    let rows = seeded_store().expiry_report(today()).expect("expiry report rows");
    let bytes = render_expiry_report(&rows, today(), None).expect("render expiry report");
    assert!(bytes.starts_with(b"%PDF"));

    let empty = render_expiry_report(&[], today(), None).expect("render empty report");
    assert!(!empty.is_empty());
}
