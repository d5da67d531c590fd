pub mod extraction;
pub mod format;
pub mod identifier;
pub mod segmenter;
pub mod parameters;
pub mod ingest;

/// Synthetic documents shared by the pipeline tests.
#[cfg(test)]
pub(crate) mod fixtures {
    use std::io::Write;
    use std::path::{Path, PathBuf};

    use image::{GenericImageView, ImageOutputFormat};
    use lopdf::dictionary;
    use lopdf::{Document, Object, ObjectId, Stream};

    /// Digital PDF with one Helvetica text line per page.
    pub fn text_pdf(pages: &[&str]) -> Vec<u8> {
        let contents: Vec<Vec<u8>> = pages
            .iter()
            .map(|text| format!("BT /F1 12 Tf 72 720 Td ({text}) Tj ET").into_bytes())
            .collect();

        build_pdf(contents.len(), |doc, i| {
            let font_id = doc.add_object(dictionary! {
                "Type" => "Font",
                "Subtype" => "Type1",
                "BaseFont" => "Helvetica",
            });
            let content_id = doc.add_object(Stream::new(dictionary! {}, contents[i].clone()));
            (
                content_id,
                dictionary! {
                    "Font" => dictionary! { "F1" => font_id },
                },
            )
        })
    }

    /// Scanned PDF: every page is the same full-page JPEG and no text layer.
    pub fn scanned_pdf(jpeg: &[u8], page_count: usize) -> Vec<u8> {
        let (width, height) = image::load_from_memory(jpeg)
            .map(|img| (img.width(), img.height()))
            .unwrap_or((1, 1));

        build_pdf(page_count, |doc, _| {
            let mut img_stream = Stream::new(
                dictionary! {
                    "Type" => "XObject",
                    "Subtype" => "Image",
                    "Width" => width as i64,
                    "Height" => height as i64,
                    "ColorSpace" => "DeviceRGB",
                    "BitsPerComponent" => 8,
                    "Filter" => "DCTDecode",
                },
                jpeg.to_vec(),
            );
            img_stream.allows_compression = false;
            let img_id = doc.add_object(img_stream);
            let content_id = doc.add_object(Stream::new(
                dictionary! {},
                b"q 595 0 0 842 0 0 cm /Scan Do Q".to_vec(),
            ));
            (
                content_id,
                dictionary! {
                    "XObject" => dictionary! { "Scan" => img_id },
                },
            )
        })
    }

    fn build_pdf<F>(page_count: usize, mut page: F) -> Vec<u8>
    where
        F: FnMut(&mut Document, usize) -> (ObjectId, lopdf::Dictionary),
    {
        let mut doc = Document::with_version("1.4");
        let pages_id = doc.new_object_id();

        let kids: Vec<Object> = (0..page_count)
            .map(|i| {
                let (content_id, resources) = page(&mut doc, i);
                doc.add_object(dictionary! {
                    "Type" => "Page",
                    "Parent" => pages_id,
                    "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
                    "Contents" => content_id,
                    "Resources" => resources,
                })
                .into()
            })
            .collect();

        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => page_count as i64,
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut buf = Vec::new();
        doc.save_to(&mut buf).unwrap();
        buf
    }

    /// Flat grey RGB JPEG.
    pub fn test_jpeg(width: u32, height: u32) -> Vec<u8> {
        let img = image::RgbImage::from_pixel(width, height, image::Rgb([128u8, 128, 128]));
        let mut jpeg = std::io::Cursor::new(Vec::new());
        image::DynamicImage::ImageRgb8(img)
            .write_to(&mut jpeg, ImageOutputFormat::Jpeg(85))
            .unwrap();
        jpeg.into_inner()
    }

    /// Minimal .docx with one `w:p` per entry of `paragraphs`.
    pub fn docx_bytes(paragraphs: &[&str]) -> Vec<u8> {
        let body: String = paragraphs
            .iter()
            .map(|p| format!(r#"<w:p><w:r><w:t xml:space="preserve">{}</w:t></w:r></w:p>"#, xml_escape(p)))
            .collect();
        let document = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{body}</w:body></w:document>"#
        );
        let content_types = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="xml" ContentType="application/xml"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/></Types>"#;

        let mut zip = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
        let options = zip::write::SimpleFileOptions::default()
            .compression_method(zip::CompressionMethod::Stored);
        zip.start_file("[Content_Types].xml", options).unwrap();
        zip.write_all(content_types.as_bytes()).unwrap();
        zip.start_file("word/document.xml", options).unwrap();
        zip.write_all(document.as_bytes()).unwrap();
        zip.finish().unwrap().into_inner()
    }

    pub fn write_docx(dir: &Path, name: &str, paragraphs: &[&str]) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, docx_bytes(paragraphs)).unwrap();
        path
    }

    fn xml_escape(s: &str) -> String {
        s.replace('&', "&amp;")
            .replace('<', "&lt;")
            .replace('>', "&gt;")
    }
}
