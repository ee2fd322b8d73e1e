//! Document assembly: one page per chosen JPEG.
//!
//! Each JPEG is embedded byte-for-byte as a `DCTDecode` image XObject, so
//! nothing is decoded or re-encoded here. The page is sized from the JFIF
//! density: `points = pixels × 72 / dpi`.

use crate::config::PageMode;
use crate::error::Jpeg2PdfError;
use crate::pipeline::header::{read_jpeg_header, JpegHeader};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream, StringFormat};
use std::path::Path;
use tracing::debug;

/// Density used for pages whose JPEG has no absolute density.
pub const FALLBACK_DPI: f64 = 96.0;

/// Document-level metadata written to `/Info`.
#[derive(Debug, Clone, Default)]
pub struct DocumentInfo<'a> {
    pub title: Option<&'a str>,
    pub author: Option<&'a str>,
}

/// Page size in points for a JPEG header.
pub fn page_size(header: &JpegHeader) -> (f64, f64) {
    let (dpi_x, dpi_y) = header
        .jfif
        .and_then(|j| j.density.dpi())
        .unwrap_or((FALLBACK_DPI, FALLBACK_DPI));
    (
        f64::from(header.width) * 72.0 / dpi_x,
        f64::from(header.height) * 72.0 / dpi_y,
    )
}

/// PDF text string: literal when ASCII, UTF-16BE with a byte-order mark
/// otherwise.
pub fn text_string(s: &str) -> Object {
    if s.is_ascii() {
        Object::string_literal(s)
    } else {
        let mut bytes = vec![0xFE, 0xFF];
        for unit in s.encode_utf16() {
            bytes.extend_from_slice(&unit.to_be_bytes());
        }
        Object::String(bytes, StringFormat::Hexadecimal)
    }
}

fn image_xobject(path: &Path, bytes: Vec<u8>) -> Result<(Stream, JpegHeader), Jpeg2PdfError> {
    let failed = |detail: &str| Jpeg2PdfError::AssemblyFailed {
        path: path.to_path_buf(),
        detail: detail.to_string(),
    };

    let header = read_jpeg_header(&bytes).ok_or_else(|| failed("not a JPEG file"))?;
    if header.width == 0 || header.height == 0 {
        return Err(failed("JPEG has zero width or height"));
    }
    let color_space = match header.components {
        1 => "DeviceGray",
        3 => "DeviceRGB",
        4 => "DeviceCMYK",
        n => return Err(failed(&format!("unsupported component count {n}"))),
    };

    let mut dict = dictionary! {
        "Type" => "XObject",
        "Subtype" => "Image",
        "Width" => i64::from(header.width),
        "Height" => i64::from(header.height),
        "ColorSpace" => color_space,
        "BitsPerComponent" => 8i64,
        "Filter" => "DCTDecode",
    };
    // Adobe writes CMYK JPEGs inverted.
    if header.components == 4 && header.adobe {
        dict.set(
            "Decode",
            [1, 0, 1, 0, 1, 0, 1, 0]
                .into_iter()
                .map(Object::Integer)
                .collect::<Vec<_>>(),
        );
    }

    Ok((Stream::new(dict, bytes).with_compression(false), header))
}

fn add_page(
    doc: &mut Document,
    pages_id: ObjectId,
    path: &Path,
) -> Result<ObjectId, Jpeg2PdfError> {
    let bytes = std::fs::read(path).map_err(|e| Jpeg2PdfError::AssemblyFailed {
        path: path.to_path_buf(),
        detail: e.to_string(),
    })?;
    let (image, header) = image_xobject(path, bytes)?;
    let (w, h) = page_size(&header);
    debug!(
        "Page from {}: {}x{} px → {:.2}x{:.2} pt",
        path.display(),
        header.width,
        header.height,
        w,
        h
    );

    let image_id = doc.add_object(image);
    let content = format!("q\n{w:.4} 0 0 {h:.4} 0 0 cm\n/Im0 Do\nQ\n");
    let content_id = doc.add_object(Stream::new(Dictionary::new(), content.into_bytes()));

    let media_box = vec![
        Object::Integer(0),
        Object::Integer(0),
        Object::from(w as f32),
        Object::from(h as f32),
    ];

    Ok(doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "MediaBox" => media_box,
        "Contents" => content_id,
        "Resources" => dictionary! {
            "XObject" => dictionary! {
                "Im0" => image_id,
            },
        },
    }))
}

/// Build a document from `paths`, one page each, in order.
///
/// # Errors
/// * [`Jpeg2PdfError::AssemblyFailed`]: a file is unreadable or not an
///   embeddable JPEG
pub fn assemble<P: AsRef<Path>>(
    paths: &[P],
    info: &DocumentInfo<'_>,
    page_mode: Option<PageMode>,
) -> Result<Vec<u8>, Jpeg2PdfError> {
    if paths.is_empty() {
        return Err(Jpeg2PdfError::Internal("no pages to assemble".into()));
    }

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let mut kids: Vec<Object> = Vec::with_capacity(paths.len());
    for path in paths {
        kids.push(add_page(&mut doc, pages_id, path.as_ref())?.into());
    }
    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );

    let mut catalog = dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    };
    if let Some(mode) = page_mode {
        catalog.set("PageMode", Object::Name(mode.pdf_name().as_bytes().to_vec()));
    }
    let catalog_id = doc.add_object(catalog);
    doc.trailer.set("Root", catalog_id);

    let mut info_dict = dictionary! {
        "Producer" => Object::string_literal(concat!("jpeg2pdf ", env!("CARGO_PKG_VERSION"))),
    };
    if let Some(title) = info.title {
        info_dict.set("Title", text_string(title));
    }
    if let Some(author) = info.author {
        info_dict.set("Author", text_string(author));
    }
    let info_id = doc.add_object(info_dict);
    doc.trailer.set("Info", info_id);

    let mut out = Vec::new();
    doc.save_to(&mut out)
        .map_err(|e| Jpeg2PdfError::Internal(format!("failed to serialise document: {e}")))?;
    debug!("Assembled {} pages, {} bytes", count, out.len());
    Ok(out)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::config::Quality;
    use crate::pipeline::encode::encode_jpeg_to_vec;
    use crate::pipeline::header::{Density, DensityUnit};
    use image::codecs::jpeg::JpegEncoder;
    use image::{GrayImage, Luma, Rgb, RgbImage};
    use tempfile::TempDir;

    pub(crate) fn number(obj: &Object) -> f64 {
        match obj {
            Object::Integer(i) => *i as f64,
            Object::Real(r) => f64::from(*r),
            other => panic!("not a number: {other:?}"),
        }
    }

    pub(crate) fn image_stream(doc: &Document, page_id: ObjectId) -> &Stream {
        let page = doc.get_dictionary(page_id).unwrap();
        let resources = page.get(b"Resources").unwrap().as_dict().unwrap();
        let xobjects = resources.get(b"XObject").unwrap().as_dict().unwrap();
        let id = xobjects.get(b"Im0").unwrap().as_reference().unwrap();
        doc.get_object(id).unwrap().as_stream().unwrap()
    }

    fn media_box(doc: &Document, page_id: ObjectId) -> Vec<f64> {
        doc.get_dictionary(page_id)
            .unwrap()
            .get(b"MediaBox")
            .unwrap()
            .as_array()
            .unwrap()
            .iter()
            .map(number)
            .collect()
    }

    fn write_rgb(dir: &Path, name: &str, w: u32, h: u32, density: Density) -> std::path::PathBuf {
        let img = RgbImage::from_fn(w, h, |x, y| Rgb([x as u8, y as u8, 7]));
        let bytes = encode_jpeg_to_vec(&img, Quality::new(80).unwrap(), density).unwrap();
        let path = dir.join(name);
        std::fs::write(&path, bytes).unwrap();
        path
    }

    #[test]
    fn pages_follow_input_order_and_density() {
        let dir = TempDir::new().unwrap();
        let a = write_rgb(dir.path(), "a.jpg", 200, 100, Density::ppi(144, 144));
        let b = write_rgb(
            dir.path(),
            "b.jpg",
            96,
            48,
            Density {
                x: 1,
                y: 1,
                unit: DensityUnit::AspectOnly,
            },
        );

        let pdf = assemble(&[&a, &b], &DocumentInfo::default(), None).unwrap();
        let doc = Document::load_mem(&pdf).unwrap();
        let pages = doc.get_pages();
        assert_eq!(pages.len(), 2);

        let first = pages[&1];
        let second = pages[&2];
        let mb = media_box(&doc, first);
        assert!((mb[2] - 100.0).abs() < 0.01 && (mb[3] - 50.0).abs() < 0.01, "{mb:?}");
        let mb = media_box(&doc, second);
        assert!((mb[2] - 72.0).abs() < 0.01 && (mb[3] - 36.0).abs() < 0.01, "{mb:?}");

        let img = image_stream(&doc, first);
        assert_eq!(img.dict.get(b"Width").unwrap().as_i64().unwrap(), 200);
        assert_eq!(img.dict.get(b"Filter").unwrap().as_name().unwrap(), b"DCTDecode");
        assert_eq!(img.content, std::fs::read(&a).unwrap());
    }

    #[test]
    fn greyscale_jpeg_uses_device_gray() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("g.jpg");
        let mut file = std::fs::File::create(&path).unwrap();
        JpegEncoder::new_with_quality(&mut file, 80)
            .encode_image(&GrayImage::from_pixel(8, 8, Luma([90])))
            .unwrap();
        drop(file);

        let pdf = assemble(&[&path], &DocumentInfo::default(), None).unwrap();
        let doc = Document::load_mem(&pdf).unwrap();
        let page = doc.get_pages()[&1];
        let img = image_stream(&doc, page);
        assert_eq!(img.dict.get(b"ColorSpace").unwrap().as_name().unwrap(), b"DeviceGray");
    }

    #[test]
    fn info_and_page_mode() {
        let dir = TempDir::new().unwrap();
        let a = write_rgb(dir.path(), "a.jpg", 10, 10, Density::DEFAULT);
        let info = DocumentInfo {
            title: Some("Holiday"),
            author: Some("Zoë"),
        };
        let pdf = assemble(&[&a], &info, Some(PageMode::ShowThumbnails)).unwrap();
        let doc = Document::load_mem(&pdf).unwrap();

        let info_id = doc.trailer.get(b"Info").unwrap().as_reference().unwrap();
        let info = doc.get_dictionary(info_id).unwrap();
        assert_eq!(info.get(b"Title").unwrap().as_str().unwrap(), b"Holiday");
        let author = info.get(b"Author").unwrap().as_str().unwrap();
        assert_eq!(&author[..2], &[0xFE, 0xFF]);

        let root = doc.trailer.get(b"Root").unwrap().as_reference().unwrap();
        let catalog = doc.get_dictionary(root).unwrap();
        assert_eq!(catalog.get(b"PageMode").unwrap().as_name().unwrap(), b"UseThumbs");
    }

    #[test]
    fn non_jpeg_is_assembly_failure() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("x.png");
        RgbImage::new(2, 2).save(&path).unwrap();
        let err = assemble(&[&path], &DocumentInfo::default(), None).unwrap_err();
        assert!(matches!(err, Jpeg2PdfError::AssemblyFailed { .. }));
    }

    #[test]
    fn page_size_uses_cm_density() {
        let header = JpegHeader {
            jfif: Some(crate::pipeline::header::JfifInfo {
                density: Density {
                    x: 100,
                    y: 100,
                    unit: DensityUnit::PixelsPerCm,
                },
            }),
            width: 254,
            height: 508,
            components: 3,
            adobe: false,
        };
        let (w, h) = page_size(&header);
        assert!((w - 72.0).abs() < 1e-9);
        assert!((h - 144.0).abs() < 1e-9);
    }
}
