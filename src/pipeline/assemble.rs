//! PDF assembly: page buffers → one multi-page document via `lopdf`.
//!
//! Each page is a single full-bleed image XObject. The JPEG bytes go in
//! untouched under `DCTDecode`; only the tiny content streams are deflated.
//! Page geometry comes from the pixel size and a nominal resolution:
//! `points = pixels × 72 / dpi`.

use crate::pipeline::encode::PageBuffer;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use std::io::Write;
use tracing::debug;

const IMAGE_NAME: &str = "Im0";

/// Build the document in memory, pages in the order given.
pub fn build_document(pages: Vec<PageBuffer>, resolution: f32) -> Result<Document, lopdf::Error> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let mut kids = Vec::with_capacity(pages.len());
    let total = pages.len();

    for page in pages {
        let width_pt = page.width as f32 * 72.0 / resolution;
        let height_pt = page.height as f32 * 72.0 / resolution;

        let image = Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => i64::from(page.width),
                "Height" => i64::from(page.height),
                "ColorSpace" => "DeviceRGB",
                "BitsPerComponent" => 8_i64,
                "Filter" => "DCTDecode",
            },
            page.jpeg,
        )
        .with_compression(false);
        let image_id = doc.add_object(image);

        let content = Content {
            operations: vec![
                Operation::new("q", vec![]),
                Operation::new(
                    "cm",
                    vec![
                        Object::Real(width_pt),
                        Object::Integer(0),
                        Object::Integer(0),
                        Object::Real(height_pt),
                        Object::Integer(0),
                        Object::Integer(0),
                    ],
                ),
                Operation::new("Do", vec![Object::Name(IMAGE_NAME.as_bytes().to_vec())]),
                Operation::new("Q", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));

        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Real(width_pt),
                Object::Real(height_pt),
            ],
            "Resources" => dictionary! {
                "XObject" => dictionary! {
                    IMAGE_NAME => image_id,
                },
            },
            "Contents" => content_id,
        });
        kids.push(Object::Reference(page_id));
    }

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => total as i64,
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    let info_id = doc.add_object(dictionary! {
        "Producer" => Object::string_literal(concat!("tile2pdf ", env!("CARGO_PKG_VERSION"))),
    });
    doc.trailer.set("Root", catalog_id);
    doc.trailer.set("Info", info_id);

    doc.compress();
    debug!("Assembled PDF with {} pages", total);
    Ok(doc)
}

/// Build the document and serialise it into `out`.
pub fn write_pdf<W: Write>(
    pages: Vec<PageBuffer>,
    resolution: f32,
    out: &mut W,
) -> Result<(), lopdf::Error> {
    let mut doc = build_document(pages, resolution)?;
    doc.save_to(out)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::encode::encode_page;
    use image::{Rgb, RgbImage};

    fn page(w: u32, h: u32) -> PageBuffer {
        encode_page(&RgbImage::from_pixel(w, h, Rgb([200, 100, 50])), 80).unwrap()
    }

    fn image_width(doc: &Document, page_id: lopdf::ObjectId) -> i64 {
        let page = doc.get_dictionary(page_id).unwrap();
        let resources = page.get(b"Resources").unwrap().as_dict().unwrap();
        let xobjects = resources.get(b"XObject").unwrap().as_dict().unwrap();
        let image_id = xobjects.get(b"Im0").unwrap().as_reference().unwrap();
        let stream = doc.get_object(image_id).unwrap().as_stream().unwrap();
        stream.dict.get(b"Width").unwrap().as_i64().unwrap()
    }

    #[test]
    fn pages_keep_input_order() {
        let doc = build_document(vec![page(10, 20), page(30, 20), page(50, 20)], 100.0).unwrap();
        let pages = doc.get_pages();
        assert_eq!(pages.len(), 3);
        let widths: Vec<i64> = pages.values().map(|&id| image_width(&doc, id)).collect();
        assert_eq!(widths, vec![10, 30, 50]);
    }

    #[test]
    fn jpeg_bytes_are_embedded_verbatim() {
        let p = page(16, 16);
        let original = p.jpeg.clone();
        let doc = build_document(vec![p], 100.0).unwrap();
        let page_id = *doc.get_pages().values().next().unwrap();
        let xobjects = doc
            .get_dictionary(page_id)
            .unwrap()
            .get(b"Resources")
            .unwrap()
            .as_dict()
            .unwrap()
            .get(b"XObject")
            .unwrap()
            .as_dict()
            .unwrap()
            .get(b"Im0")
            .unwrap()
            .as_reference()
            .unwrap();
        let stream = doc.get_object(xobjects).unwrap().as_stream().unwrap();
        assert_eq!(stream.content, original);
    }

    #[test]
    fn written_bytes_reload() {
        let mut buf = Vec::new();
        write_pdf(vec![page(8, 8), page(9, 9)], 100.0, &mut buf).unwrap();
        assert!(buf.starts_with(b"%PDF-1.5"));
        let doc = Document::load_mem(&buf).unwrap();
        assert_eq!(doc.get_pages().len(), 2);
    }

    #[test]
    fn media_box_follows_resolution() {
        let doc = build_document(vec![page(200, 100)], 100.0).unwrap();
        let page_id = *doc.get_pages().values().next().unwrap();
        let media_box = doc
            .get_dictionary(page_id)
            .unwrap()
            .get(b"MediaBox")
            .unwrap()
            .as_array()
            .unwrap()
            .clone();
        let w = media_box[2].as_float().unwrap();
        let h = media_box[3].as_float().unwrap();
        assert!((w - 144.0).abs() < 0.01, "width {w}");
        assert!((h - 72.0).abs() < 0.01, "height {h}");
    }
}
