//! Page images for scanned PDFs without PDFium.
//!
//! A scanned standard is almost always one image XObject per page. Pulling
//! that image out with lopdf gives OCR the original scan resolution, which
//! is usually at least as good as a fresh render.

use image::ImageOutputFormat;
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};

use super::types::PdfPageRenderer;
use super::ExtractionError;

/// Fallback [`PdfPageRenderer`] returning the largest embedded image of a page
/// as PNG. The `dpi` argument is ignored: the scan is returned at its native
/// resolution.
pub struct EmbeddedImageRenderer;

impl PdfPageRenderer for EmbeddedImageRenderer {
    fn page_count(&self, pdf_bytes: &[u8]) -> Result<usize, ExtractionError> {
        Ok(load_document(pdf_bytes)?.get_pages().len())
    }

    fn render_page(
        &self,
        pdf_bytes: &[u8],
        page_index: usize,
        _dpi: u32,
    ) -> Result<Vec<u8>, ExtractionError> {
        let doc = load_document(pdf_bytes)?;

        let page_ids: Vec<ObjectId> = doc.page_iter().collect();
        let &page_id = page_ids
            .get(page_index)
            .ok_or_else(|| ExtractionError::PdfRendering {
                page: page_index,
                reason: format!("page not found (PDF has {} pages)", page_ids.len()),
            })?;

        let raw = largest_page_image(&doc, page_id).map_err(|reason| {
            ExtractionError::PdfRendering {
                page: page_index,
                reason,
            }
        })?;
        let image = decode_page_image(&doc, &raw)?;

        let mut png = std::io::Cursor::new(Vec::new());
        image
            .write_to(&mut png, ImageOutputFormat::Png)
            .map_err(|e| ExtractionError::ImageProcessing(format!("PNG encode failed: {e}")))?;

        tracing::debug!(
            page = page_index,
            raw_size = raw.content.len(),
            png_size = png.get_ref().len(),
            "Extracted embedded page image"
        );

        Ok(png.into_inner())
    }
}

fn load_document(pdf_bytes: &[u8]) -> Result<Document, ExtractionError> {
    let doc = Document::load_mem(pdf_bytes)
        .map_err(|e| ExtractionError::PdfParsing(format!("Failed to parse PDF: {e}")))?;
    if doc.is_encrypted() {
        return Err(ExtractionError::PdfEncrypted);
    }
    Ok(doc)
}

/// Walks page → /Resources → /XObject and keeps the image stream with the
/// largest payload (the page scan, not a logo or stamp).
fn largest_page_image(doc: &Document, page_id: ObjectId) -> Result<Stream, String> {
    let page = doc
        .get_object(page_id)
        .and_then(Object::as_dict)
        .map_err(|e| format!("page object: {e}"))?;
    let resources = dict_entry(doc, page, b"Resources")?;
    let xobjects = dict_entry(doc, resources, b"XObject")?;

    xobjects
        .iter()
        .filter_map(|(_, obj)| match resolve(doc, obj) {
            Object::Stream(stream) if is_image(&stream.dict) => Some(stream),
            _ => None,
        })
        .max_by_key(|stream| stream.content.len())
        .cloned()
        .ok_or_else(|| "no image XObjects on this page".to_string())
}

fn is_image(dict: &Dictionary) -> bool {
    matches!(dict.get(b"Subtype"), Ok(Object::Name(n)) if n == b"Image")
}

fn has_filter(dict: &Dictionary, name: &[u8]) -> bool {
    match dict.get(b"Filter") {
        Ok(Object::Name(n)) => n == name,
        Ok(Object::Array(filters)) => filters
            .iter()
            .any(|f| matches!(f, Object::Name(n) if n == name)),
        _ => false,
    }
}

/// JPEG (DCTDecode) streams and embedded image files decode directly; other
/// streams are raw samples described by /Width, /Height and /ColorSpace.
fn decode_page_image(doc: &Document, stream: &Stream) -> Result<image::DynamicImage, ExtractionError> {
    if has_filter(&stream.dict, b"DCTDecode") {
        return image::load_from_memory(&stream.content)
            .map_err(|e| ExtractionError::ImageProcessing(format!("JPEG decode failed: {e}")));
    }

    let samples = stream
        .decompressed_content()
        .unwrap_or_else(|_| stream.content.clone());
    if let Ok(img) = image::load_from_memory(&samples) {
        return Ok(img);
    }

    raw_samples_to_image(doc, &stream.dict, samples)
}

fn raw_samples_to_image(
    doc: &Document,
    dict: &Dictionary,
    samples: Vec<u8>,
) -> Result<image::DynamicImage, ExtractionError> {
    let width = int_entry(dict, b"Width")? as u32;
    let height = int_entry(dict, b"Height")? as u32;
    let bits = int_entry(dict, b"BitsPerComponent").unwrap_or(8);
    if bits != 8 {
        return Err(ExtractionError::ImageProcessing(format!(
            "unsupported BitsPerComponent {bits}"
        )));
    }

    let too_small = || {
        ExtractionError::ImageProcessing(format!(
            "sample buffer of {} bytes does not fit {width}x{height}",
            samples.len()
        ))
    };

    match channel_count(doc, dict) {
        1 => image::GrayImage::from_raw(width, height, samples.clone())
            .map(image::DynamicImage::ImageLuma8)
            .ok_or_else(too_small),
        3 => image::RgbImage::from_raw(width, height, samples.clone())
            .map(image::DynamicImage::ImageRgb8)
            .ok_or_else(too_small),
        n => Err(ExtractionError::ImageProcessing(format!(
            "unsupported channel count {n}"
        ))),
    }
}

fn channel_count(doc: &Document, dict: &Dictionary) -> u32 {
    let Ok(space) = dict.get(b"ColorSpace") else {
        return 3;
    };
    match resolve(doc, space) {
        Object::Name(n) if n == b"DeviceGray" => 1,
        Object::Name(n) if n == b"DeviceCMYK" => 4,
        Object::Array(parts) => match parts.first() {
            Some(Object::Name(n)) if n == b"Indexed" => 1,
            Some(Object::Name(n)) if n == b"ICCBased" => parts
                .get(1)
                .map(|icc| resolve(doc, icc))
                .and_then(|icc| icc.as_stream().ok())
                .and_then(|s| int_entry(&s.dict, b"N").ok())
                .unwrap_or(3) as u32,
            _ => 3,
        },
        _ => 3,
    }
}

fn resolve<'a>(doc: &'a Document, obj: &'a Object) -> &'a Object {
    match obj {
        Object::Reference(id) => doc.get_object(*id).unwrap_or(obj),
        _ => obj,
    }
}

fn dict_entry<'a>(doc: &'a Document, dict: &'a Dictionary, key: &[u8]) -> Result<&'a Dictionary, String> {
    let name = String::from_utf8_lossy(key);
    let obj = dict.get(key).map_err(|_| format!("missing /{name}"))?;
    resolve(doc, obj)
        .as_dict()
        .map_err(|_| format!("/{name} is not a dictionary"))
}

fn int_entry(dict: &Dictionary, key: &[u8]) -> Result<i64, ExtractionError> {
    dict.get(key)
        .and_then(Object::as_i64)
        .map_err(|_| {
            ExtractionError::PdfParsing(format!(
                "missing or non-integer /{}",
                String::from_utf8_lossy(key)
            ))
        })
}
