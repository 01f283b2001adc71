//! Header-only image size detection.
//!
//! Reads just enough of a byte prefix to find the natural size of PNG, GIF,
//! JPEG, WebP, BMP and SVG images. Raster formats are identified with
//! `infer`; SVG is recognized as markup.

use super::Dimensions;
use once_cell::sync::Lazy;
use regex::Regex;

/// Unknown binary prefixes shorter than this may still turn into an image.
const MIN_SNIFF_BYTES: usize = 32;
/// Give up looking for an `<svg>` tag after this much markup.
const SVG_SCAN_LIMIT: usize = 64 * 1024;

static SVG_TAG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<svg\b[^>]*>").expect("valid svg tag regex"));
static SVG_WIDTH_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?:^|\s)width\s*=\s*["']\s*([0-9]+(?:\.[0-9]+)?)\s*(?:px)?\s*["']"#)
        .expect("valid svg width regex")
});
static SVG_HEIGHT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?:^|\s)height\s*=\s*["']\s*([0-9]+(?:\.[0-9]+)?)\s*(?:px)?\s*["']"#)
        .expect("valid svg height regex")
});
static SVG_VIEWBOX_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?:^|\s)viewBox\s*=\s*["']\s*-?[0-9.]+[\s,]+-?[0-9.]+[\s,]+([0-9.]+)[\s,]+([0-9.]+)\s*["']"#,
    )
    .expect("valid svg viewBox regex")
});

/// Outcome of inspecting a byte prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sniff {
    Found(Dimensions),
    /// The prefix is too short to decide.
    NeedMore,
    /// Recognized image without an intrinsic size.
    Unsized,
    /// Not an image format this module understands (mime type or hint).
    Unsupported(String),
}

/// Inspects the start of an image file.
pub fn sniff_dimensions(bytes: &[u8]) -> Sniff {
    match infer::get(bytes).map(|kind| kind.mime_type()) {
        Some("image/png" | "image/apng") => sniff_png(bytes),
        Some("image/gif") => sniff_gif(bytes),
        Some("image/jpeg") => sniff_jpeg(bytes),
        Some("image/webp") => sniff_webp(bytes),
        Some("image/bmp") => sniff_bmp(bytes),
        Some("text/xml" | "text/html") => sniff_svg(bytes),
        Some(other) => Sniff::Unsupported(other.to_string()),
        None if looks_like_markup(bytes) => sniff_svg(bytes),
        None if bytes.len() < MIN_SNIFF_BYTES => Sniff::NeedMore,
        None => Sniff::Unsupported("unknown".to_string()),
    }
}

fn sniff_png(b: &[u8]) -> Sniff {
    if b.len() < 24 {
        return Sniff::NeedMore;
    }
    if &b[12..16] != b"IHDR" {
        return Sniff::Unsupported("image/png".to_string());
    }
    Sniff::Found(Dimensions::new(be_u32(&b[16..20]), be_u32(&b[20..24])))
}

fn sniff_gif(b: &[u8]) -> Sniff {
    if b.len() < 10 {
        return Sniff::NeedMore;
    }
    Sniff::Found(Dimensions::new(
        u32::from(le_u16(&b[6..8])),
        u32::from(le_u16(&b[8..10])),
    ))
}

fn sniff_bmp(b: &[u8]) -> Sniff {
    if b.len() < 26 {
        return Sniff::NeedMore;
    }
    // OS/2 core headers store 16-bit sizes.
    if le_u32(&b[14..18]) == 12 {
        return Sniff::Found(Dimensions::new(
            u32::from(le_u16(&b[18..20])),
            u32::from(le_u16(&b[20..22])),
        ));
    }
    let width = i32::from_le_bytes([b[18], b[19], b[20], b[21]]);
    // Negative height marks a top-down bitmap.
    let height = i32::from_le_bytes([b[22], b[23], b[24], b[25]]);
    Sniff::Found(Dimensions::new(width.unsigned_abs(), height.unsigned_abs()))
}

fn sniff_jpeg(b: &[u8]) -> Sniff {
    let mut i = 2;
    loop {
        while i < b.len() && b[i] != 0xFF {
            i += 1;
        }
        while i < b.len() && b[i] == 0xFF {
            i += 1;
        }
        if i >= b.len() {
            return Sniff::NeedMore;
        }
        let marker = b[i];
        i += 1;

        match marker {
            0x01 | 0xD0..=0xD8 => continue,
            // Start of scan or end of image before any frame header.
            0xD9 | 0xDA => return Sniff::Unsized,
            0xC0..=0xCF if !matches!(marker, 0xC4 | 0xC8 | 0xCC) => {
                if b.len() < i + 7 {
                    return Sniff::NeedMore;
                }
                let height = u32::from(be_u16(&b[i + 3..i + 5]));
                let width = u32::from(be_u16(&b[i + 5..i + 7]));
                return Sniff::Found(Dimensions::new(width, height));
            }
            _ => {
                if b.len() < i + 2 {
                    return Sniff::NeedMore;
                }
                let length = usize::from(be_u16(&b[i..i + 2]));
                if length < 2 {
                    return Sniff::Unsupported("image/jpeg".to_string());
                }
                i += length;
            }
        }
    }
}

fn sniff_webp(b: &[u8]) -> Sniff {
    if b.len() < 30 {
        return Sniff::NeedMore;
    }
    match &b[12..16] {
        b"VP8 " => Sniff::Found(Dimensions::new(
            u32::from(le_u16(&b[26..28]) & 0x3FFF),
            u32::from(le_u16(&b[28..30]) & 0x3FFF),
        )),
        b"VP8L" => {
            let bits = le_u32(&b[21..25]);
            Sniff::Found(Dimensions::new(
                (bits & 0x3FFF) + 1,
                ((bits >> 14) & 0x3FFF) + 1,
            ))
        }
        b"VP8X" => Sniff::Found(Dimensions::new(
            le_u24(&b[24..27]) + 1,
            le_u24(&b[27..30]) + 1,
        )),
        _ => Sniff::Unsupported("image/webp".to_string()),
    }
}

fn looks_like_markup(bytes: &[u8]) -> bool {
    let body = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    body.iter()
        .find(|byte| !byte.is_ascii_whitespace())
        .is_some_and(|byte| *byte == b'<')
}

fn sniff_svg(bytes: &[u8]) -> Sniff {
    let text = String::from_utf8_lossy(bytes);
    let Some(tag) = SVG_TAG_RE.find(&text) else {
        return if bytes.len() >= SVG_SCAN_LIMIT {
            Sniff::Unsupported("text/xml".to_string())
        } else {
            Sniff::NeedMore
        };
    };
    let tag = tag.as_str();

    let width = capture_pixels(&SVG_WIDTH_RE, tag);
    let height = capture_pixels(&SVG_HEIGHT_RE, tag);
    if let (Some(width), Some(height)) = (width, height) {
        return Sniff::Found(Dimensions::new(width, height));
    }

    match SVG_VIEWBOX_RE.captures(tag) {
        Some(caps) => {
            let box_width = caps.get(1).and_then(|m| parse_pixels(m.as_str()));
            let box_height = caps.get(2).and_then(|m| parse_pixels(m.as_str()));
            match (width.or(box_width), height.or(box_height)) {
                (Some(w), Some(h)) => Sniff::Found(Dimensions::new(w, h)),
                _ => Sniff::Unsized,
            }
        }
        None => Sniff::Unsized,
    }
}

fn capture_pixels(re: &Regex, tag: &str) -> Option<u32> {
    re.captures(tag)
        .and_then(|caps| caps.get(1))
        .and_then(|m| parse_pixels(m.as_str()))
}

fn parse_pixels(value: &str) -> Option<u32> {
    let parsed = value.parse::<f64>().ok()?;
    if !parsed.is_finite() || parsed < 0.0 || parsed > f64::from(u32::MAX) {
        return None;
    }
    Some(parsed.round() as u32)
}

fn be_u16(b: &[u8]) -> u16 {
    u16::from_be_bytes([b[0], b[1]])
}

fn be_u32(b: &[u8]) -> u32 {
    u32::from_be_bytes([b[0], b[1], b[2], b[3]])
}

fn le_u16(b: &[u8]) -> u16 {
    u16::from_le_bytes([b[0], b[1]])
}

fn le_u24(b: &[u8]) -> u32 {
    u32::from_le_bytes([b[0], b[1], b[2], 0])
}

fn le_u32(b: &[u8]) -> u32 {
    u32::from_le_bytes([b[0], b[1], b[2], b[3]])
}
