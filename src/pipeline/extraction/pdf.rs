//! PDF page reading with lopdf: the text layer per page, and an embedded
//! scan image for pages that have no text layer.

use std::io::{Cursor, Read};

use image::{DynamicImage, GrayImage, ImageOutputFormat, RgbImage};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};

use super::CapabilityError;

/// One page as the capability sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdfPage {
    /// 1-based page number.
    pub number: u32,
    pub text: String,
    /// Encoded image (JPEG, PNG or TIFF) of the page scan. Only filled for
    /// pages without text.
    pub scan: Option<Vec<u8>>,
}

impl PdfPage {
    pub fn has_text(&self) -> bool {
        !self.text.trim().is_empty()
    }
}

/// Read every page of a PDF in page order.
pub fn read_pdf_pages(pdf_bytes: &[u8]) -> Result<Vec<PdfPage>, CapabilityError> {
    let doc = Document::load_mem(pdf_bytes)
        .map_err(|e| CapabilityError::Document(format!("Failed to parse PDF: {e}")))?;

    let mut pages = Vec::new();
    for (number, page_id) in doc.get_pages() {
        let text = match doc.extract_text(&[number]) {
            Ok(text) => text,
            Err(e) => {
                tracing::debug!(page = number, error = %e, "No text layer on PDF page");
                String::new()
            }
        };

        let scan = if text.trim().is_empty() {
            page_scan(&doc, page_id, number)
        } else {
            None
        };

        pages.push(PdfPage { number, text, scan });
    }

    if pages.is_empty() {
        return Err(CapabilityError::Document("PDF has no pages".into()));
    }

    tracing::debug!(
        pages = pages.len(),
        scanned = pages.iter().filter(|p| p.scan.is_some()).count(),
        "Read PDF pages"
    );
    Ok(pages)
}

/// Walks page → /Resources → /XObject and returns the largest image (by
/// pixel area) that can be handed to a vision model.
fn page_scan(doc: &Document, page_id: ObjectId, number: u32) -> Option<Vec<u8>> {
    let page = doc.get_object(page_id).ok()?.as_dict().ok()?;
    let resources = resolve_dict_entry(doc, page, b"Resources")?;
    let xobjects = resolve_dict_entry(doc, resources, b"XObject")?;

    let mut images: Vec<&Stream> = xobjects
        .iter()
        .filter_map(|(_, obj)| match resolve_object(doc, obj) {
            Object::Stream(stream) if is_image_subtype(&stream.dict) => Some(stream),
            _ => None,
        })
        .collect();
    images.sort_by_key(|stream| std::cmp::Reverse(pixel_area(&stream.dict)));

    for stream in images {
        match encode_page_image(doc, stream) {
            Ok(bytes) => return Some(bytes),
            Err(reason) => tracing::debug!(page = number, reason = %reason, "Skipping page image"),
        }
    }
    None
}

/// Turn an image XObject into an encoded image file.
///
/// Filters are undone in order. A trailing DCTDecode leaves a JPEG file.
/// Otherwise the decoded stream is either an image file already or raw
/// samples, which are re-encoded as PNG.
fn encode_page_image(doc: &Document, stream: &Stream) -> Result<Vec<u8>, String> {
    let filters = stream.filters().unwrap_or_default();
    let mut data = stream.content.clone();

    for (i, filter) in filters.iter().enumerate() {
        match filter.as_str() {
            "FlateDecode" => {
                if predictor(&stream.dict) > 1 {
                    return Err("FlateDecode with a predictor".into());
                }
                data = inflate(&data)?;
            }
            "DCTDecode" if i + 1 == filters.len() => return Ok(data),
            other => return Err(format!("unsupported image filter {other}")),
        }
    }

    if image::guess_format(&data).is_ok() && image::load_from_memory(&data).is_ok() {
        return Ok(data);
    }
    reconstruct_raw_image(doc, &stream.dict, &data)
}

/// Re-encode raw samples as PNG using /Width, /Height, /BitsPerComponent
/// and /ColorSpace.
fn reconstruct_raw_image(doc: &Document, dict: &Dictionary, samples: &[u8]) -> Result<Vec<u8>, String> {
    let width = get_dimension(dict, b"Width")?;
    let height = get_dimension(dict, b"Height")?;
    let bpc = dict
        .get(b"BitsPerComponent")
        .and_then(Object::as_i64)
        .unwrap_or(8);
    let channels = color_channels(doc, dict)?;

    let img = match (bpc, channels) {
        (1, 1) => DynamicImage::ImageLuma8(expand_bilevel(width, height, samples)?),
        (8, 1) => DynamicImage::ImageLuma8(
            GrayImage::from_raw(width, height, take_samples(samples, width, height, 1)?)
                .ok_or("grayscale buffer mismatch")?,
        ),
        (8, 3) => DynamicImage::ImageRgb8(
            RgbImage::from_raw(width, height, take_samples(samples, width, height, 3)?)
                .ok_or("RGB buffer mismatch")?,
        ),
        (8, 4) => {
            let cmyk = take_samples(samples, width, height, 4)?;
            let rgb = cmyk.chunks_exact(4).flat_map(cmyk_to_rgb).collect();
            DynamicImage::ImageRgb8(RgbImage::from_raw(width, height, rgb).ok_or("CMYK buffer mismatch")?)
        }
        _ => return Err(format!("unsupported sample layout: {bpc} bits, {channels} channels")),
    };

    let mut png = Cursor::new(Vec::new());
    img.write_to(&mut png, ImageOutputFormat::Png)
        .map_err(|e| format!("PNG encode failed: {e}"))?;
    Ok(png.into_inner())
}

fn take_samples(samples: &[u8], width: u32, height: u32, channels: usize) -> Result<Vec<u8>, String> {
    let expected = width as usize * height as usize * channels;
    if samples.len() < expected {
        return Err(format!(
            "sample buffer too small: {} bytes, expected {expected}",
            samples.len()
        ));
    }
    Ok(samples[..expected].to_vec())
}

/// 1-bit samples, rows padded to a byte. A set bit is white (DeviceGray).
fn expand_bilevel(width: u32, height: u32, samples: &[u8]) -> Result<GrayImage, String> {
    let row_bytes = (width as usize).div_ceil(8);
    if samples.len() < row_bytes * height as usize {
        return Err("bilevel buffer too small".into());
    }
    Ok(GrayImage::from_fn(width, height, |x, y| {
        let byte = samples[y as usize * row_bytes + x as usize / 8];
        let bit = (byte >> (7 - (x % 8))) & 1;
        image::Luma([if bit == 1 { 255 } else { 0 }])
    }))
}

fn cmyk_to_rgb(px: &[u8]) -> [u8; 3] {
    let k = 255 - u16::from(px[3]);
    let channel = |c: u8| ((255 - u16::from(c)) * k / 255) as u8;
    [channel(px[0]), channel(px[1]), channel(px[2])]
}

fn inflate(data: &[u8]) -> Result<Vec<u8>, String> {
    let mut out = Vec::with_capacity(data.len() * 2);
    flate2::read::ZlibDecoder::new(data)
        .read_to_end(&mut out)
        .map_err(|e| format!("FlateDecode failed: {e}"))?;
    Ok(out)
}

fn predictor(dict: &Dictionary) -> i64 {
    dict.get(b"DecodeParms")
        .and_then(Object::as_dict)
        .and_then(|parms| parms.get(b"Predictor"))
        .and_then(Object::as_i64)
        .unwrap_or(1)
}

fn color_channels(doc: &Document, dict: &Dictionary) -> Result<usize, String> {
    let Ok(cs) = dict.get(b"ColorSpace") else {
        return Ok(1);
    };
    match resolve_object(doc, cs) {
        Object::Name(n) => match n.as_slice() {
            b"DeviceGray" | b"CalGray" => Ok(1),
            b"DeviceRGB" | b"CalRGB" => Ok(3),
            b"DeviceCMYK" => Ok(4),
            other => Err(format!("unsupported color space {}", String::from_utf8_lossy(other))),
        },
        Object::Array(arr) if matches!(arr.first(), Some(Object::Name(n)) if n == b"ICCBased") => {
            let n = arr
                .get(1)
                .map(|obj| resolve_object(doc, obj))
                .and_then(|obj| obj.as_stream().ok())
                .and_then(|icc| icc.dict.get(b"N").and_then(Object::as_i64).ok())
                .unwrap_or(3);
            Ok(n as usize)
        }
        _ => Err("unsupported color space".into()),
    }
}

fn get_dimension(dict: &Dictionary, key: &[u8]) -> Result<u32, String> {
    dict.get(key)
        .and_then(Object::as_i64)
        .ok()
        .filter(|v| *v > 0)
        .and_then(|v| u32::try_from(v).ok())
        .ok_or_else(|| format!("missing /{}", String::from_utf8_lossy(key)))
}

fn pixel_area(dict: &Dictionary) -> u64 {
    let w = get_dimension(dict, b"Width").unwrap_or(0);
    let h = get_dimension(dict, b"Height").unwrap_or(0);
    u64::from(w) * u64::from(h)
}

fn is_image_subtype(dict: &Dictionary) -> bool {
    dict.get(b"Subtype")
        .map(|obj| matches!(obj, Object::Name(ref n) if n == b"Image"))
        .unwrap_or(false)
}

fn resolve_object<'a>(doc: &'a Document, obj: &'a Object) -> &'a Object {
    match obj {
        Object::Reference(id) => doc.get_object(*id).unwrap_or(obj),
        _ => obj,
    }
}

fn resolve_dict_entry<'a>(doc: &'a Document, dict: &'a Dictionary, key: &[u8]) -> Option<&'a Dictionary> {
    let obj = dict.get(key).ok()?;
    resolve_object(doc, obj).as_dict().ok()
}
