//! Handwritten signature capture.
//!
//! The pad records pointer strokes and keeps an RGBA raster of the ink, with a
//! transparent background. Exports are PNG, either of the whole surface or
//! trimmed to the bounding box of the inked pixels.

use crate::Error;
use base64::{engine::general_purpose::STANDARD, Engine as _};

pub const DEFAULT_WIDTH: u32 = 500;
pub const DEFAULT_HEIGHT: u32 = 200;
const DATA_URL_PREFIX: &str = "data:image/png;base64,";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Point { x, y }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl From<[f64; 2]> for Point {
    fn from([x, y]: [f64; 2]) -> Self {
        Point { x, y }
    }
}

/// Pixel bounds of the drawn ink, inclusive on both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InkBounds {
    pub left: u32,
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
}

impl InkBounds {
    pub fn width(&self) -> u32 {
        self.right - self.left + 1
    }

    pub fn height(&self) -> u32 {
        self.bottom - self.top + 1
    }
}

#[derive(Debug, Clone)]
pub struct SignaturePad {
    width: u32,
    height: u32,
    pen_radius: f64,
    pen_color: [u8; 3],
    strokes: Vec<Vec<Point>>,
    drawing: bool,
    pixels: Vec<u8>,
}

impl Default for SignaturePad {
    fn default() -> Self {
        SignaturePad::new(DEFAULT_WIDTH, DEFAULT_HEIGHT)
    }
}

impl SignaturePad {
    pub fn new(width: u32, height: u32) -> Self {
        SignaturePad {
            width,
            height,
            pen_radius: 1.5,
            pen_color: [0, 0, 0],
            strokes: Vec::new(),
            drawing: false,
            pixels: vec![0; width as usize * height as usize * 4],
        }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Pointer down: starts a new stroke and inks a dot under the pen.
    /// Points with a non-finite coordinate are dropped.
    pub fn begin_stroke(&mut self, point: Point) {
        if !point.is_finite() {
            self.drawing = false;
            return;
        }
        self.strokes.push(vec![point]);
        self.drawing = true;
        self.stamp(point);
    }

    /// Pointer move while the pen is down. Ignored when no stroke is in progress.
    pub fn extend_stroke(&mut self, point: Point) {
        if !self.drawing || !point.is_finite() {
            return;
        }
        let last = self
            .strokes
            .last_mut()
            .and_then(|stroke| {
                let previous = stroke.last().copied();
                stroke.push(point);
                previous
            })
            .unwrap_or(point);
        self.segment(last, point);
    }

    pub fn end_stroke(&mut self) {
        self.drawing = false;
    }

    /// Draws a complete stroke through `points`.
    pub fn draw_stroke(&mut self, points: &[Point]) {
        let mut points = points.iter().copied();
        if let Some(first) = points.next() {
            self.begin_stroke(first);
            for point in points {
                self.extend_stroke(point);
            }
            self.end_stroke();
        }
    }

    pub fn clear(&mut self) {
        self.strokes.clear();
        self.drawing = false;
        self.pixels.iter_mut().for_each(|sample| *sample = 0);
    }

    pub fn is_empty(&self) -> bool {
        self.strokes.is_empty()
    }

    pub fn ink_bounds(&self) -> Option<InkBounds> {
        let mut bounds: Option<InkBounds> = None;
        for y in 0..self.height {
            for x in 0..self.width {
                if self.alpha_at(x, y) == 0 {
                    continue;
                }
                bounds = Some(match bounds {
                    None => InkBounds {
                        left: x,
                        top: y,
                        right: x,
                        bottom: y,
                    },
                    Some(b) => InkBounds {
                        left: b.left.min(x),
                        top: b.top.min(y),
                        right: b.right.max(x),
                        bottom: b.bottom.max(y),
                    },
                });
            }
        }
        bounds
    }

    /// The whole surface as PNG, empty or not.
    pub fn to_png(&self) -> Result<Vec<u8>, Error> {
        encode_rgba(self.width, self.height, &self.pixels)
    }

    /// PNG cropped to the drawn strokes.
    pub fn trimmed_png(&self) -> Result<Vec<u8>, Error> {
        let bounds = self.ink_bounds().ok_or(Error::EmptySignature)?;
        let row_len = bounds.width() as usize * 4;
        let mut cropped = Vec::with_capacity(row_len * bounds.height() as usize);
        for y in bounds.top..=bounds.bottom {
            let start = self.offset(bounds.left, y);
            cropped.extend_from_slice(&self.pixels[start..start + row_len]);
        }
        encode_rgba(bounds.width(), bounds.height(), &cropped)
    }

    /// Trimmed export as a `data:image/png;base64,` URL.
    pub fn to_data_url(&self) -> Result<String, Error> {
        Ok(format!("{}{}", DATA_URL_PREFIX, STANDARD.encode(self.trimmed_png()?)))
    }

    fn offset(&self, x: u32, y: u32) -> usize {
        (y as usize * self.width as usize + x as usize) * 4
    }

    fn alpha_at(&self, x: u32, y: u32) -> u8 {
        self.pixels[self.offset(x, y) + 3]
    }

    fn segment(&mut self, from: Point, to: Point) {
        let (dx, dy) = (to.x - from.x, to.y - from.y);
        let (t0, t1) = match self.clip(from, dx, dy) {
            Some(range) => range,
            None => return,
        };
        let distance = (dx * dx + dy * dy).sqrt() * (t1 - t0);
        let steps = (distance / (self.pen_radius * 0.5)).ceil().max(1.0) as usize;
        for step in 0..=steps {
            let t = t0 + (t1 - t0) * step as f64 / steps as f64;
            self.stamp(Point::new(from.x + dx * t, from.y + dy * t));
        }
    }

    /// Parameter range of `from + t * (dx, dy)`, `t` in `0..=1`, that lies on the
    /// surface grown by the pen radius. `None` when the segment misses it.
    fn clip(&self, from: Point, dx: f64, dy: f64) -> Option<(f64, f64)> {
        let r = self.pen_radius;
        let (mut t0, mut t1) = (0.0_f64, 1.0_f64);
        let edges = [
            (-dx, from.x + r),
            (dx, self.width as f64 + r - from.x),
            (-dy, from.y + r),
            (dy, self.height as f64 + r - from.y),
        ];
        for (p, q) in edges {
            if p == 0.0 {
                if q < 0.0 {
                    return None;
                }
                continue;
            }
            let t = q / p;
            if p < 0.0 {
                t0 = t0.max(t);
            } else {
                t1 = t1.min(t);
            }
            if t0 > t1 {
                return None;
            }
        }
        Some((t0, t1))
    }

    /// Inks a filled disc of the pen radius around `center`, clipped to the surface.
    fn stamp(&mut self, center: Point) {
        let r = self.pen_radius;
        let min_x = (center.x - r).floor().max(0.0) as i64;
        let min_y = (center.y - r).floor().max(0.0) as i64;
        let max_x = ((center.x + r).ceil() as i64).min(self.width as i64 - 1);
        let max_y = ((center.y + r).ceil() as i64).min(self.height as i64 - 1);
        for y in min_y..=max_y {
            for x in min_x..=max_x {
                let (px, py) = (x as f64 + 0.5 - center.x, y as f64 + 0.5 - center.y);
                if px * px + py * py > r * r {
                    continue;
                }
                let offset = self.offset(x as u32, y as u32);
                self.pixels[offset..offset + 3].copy_from_slice(&self.pen_color);
                self.pixels[offset + 3] = 255;
            }
        }
    }
}

fn encode_rgba(width: u32, height: u32, pixels: &[u8]) -> Result<Vec<u8>, Error> {
    let mut bytes = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut bytes, width, height);
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);
        let mut writer = encoder.write_header()?;
        writer.write_image_data(pixels)?;
        writer.finish()?;
    }
    Ok(bytes)
}

/// Raw image bytes behind a base64 data URL.
pub fn data_url_bytes(url: &str) -> Result<Vec<u8>, Error> {
    let (header, payload) = url
        .split_once(',')
        .ok_or_else(|| Error::Other("Data url has no payload.".to_owned()))?;
    if !header.starts_with("data:") || !header.ends_with(";base64") {
        return Err(Error::Other(format!("Unsupported data url header `{}`.", header)));
    }
    Ok(STANDARD.decode(payload)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn signed() -> SignaturePad {
        let mut pad = SignaturePad::default();
        pad.draw_stroke(&[Point::new(10.0, 20.0), Point::new(60.0, 40.0)]);
        pad
    }

    #[test]
    fn new_pad_is_empty() {
        let pad = SignaturePad::default();
        assert!(pad.is_empty());
        assert_eq!(pad.dimensions(), (500, 200));
        assert!(pad.ink_bounds().is_none());
    }

    #[test]
    fn clear_resets_to_empty() {
        let mut pad = signed();
        assert!(!pad.is_empty());

        pad.clear();
        assert!(pad.is_empty());
        assert!(pad.ink_bounds().is_none());
    }

    #[test]
    fn single_dot_counts_as_signature() {
        let mut pad = SignaturePad::default();
        pad.begin_stroke(Point::new(5.0, 5.0));
        pad.end_stroke();
        assert!(!pad.is_empty());
        assert!(pad.ink_bounds().is_some());
    }

    #[test]
    fn moves_without_pen_down_are_ignored() {
        let mut pad = SignaturePad::default();
        pad.extend_stroke(Point::new(5.0, 5.0));
        assert!(pad.is_empty());
    }

    #[test]
    fn trimmed_png_matches_ink_bounds() {
        let pad = signed();
        let bounds = pad.ink_bounds().unwrap();
        let png = pad.trimmed_png().unwrap();
        let size = imagesize::blob_size(&png).unwrap();

        assert_eq!(
            (size.width, size.height),
            (bounds.width() as usize, bounds.height() as usize)
        );
        assert!(bounds.width() < 500);
        assert!(bounds.left <= 10 && bounds.right >= 60);
    }

    #[test]
    fn strokes_are_clipped_to_surface() {
        let mut pad = SignaturePad::new(20, 10);
        pad.draw_stroke(&[Point::new(-30.0, 5.0), Point::new(50.0, 5.0)]);
        let bounds = pad.ink_bounds().unwrap();
        assert_eq!((bounds.left, bounds.right), (0, 19));
    }

    #[test]
    fn far_off_surface_segments_are_clipped() {
        let mut pad = SignaturePad::default();
        pad.draw_stroke(&[Point::new(0.0, 0.0), Point::new(1.0e12, 0.0)]);
        let bounds = pad.ink_bounds().unwrap();
        assert_eq!((bounds.left, bounds.top), (0, 0));
        assert_eq!(bounds.right, 499);
        assert!(bounds.bottom <= 2);

        let mut pad = SignaturePad::default();
        pad.draw_stroke(&[Point::new(-1.0e12, -50.0), Point::new(1.0e12, -50.0)]);
        assert!(!pad.is_empty());
        assert!(pad.ink_bounds().is_none());
    }

    #[test]
    fn non_finite_points_are_dropped() {
        let mut pad = SignaturePad::default();
        pad.draw_stroke(&[Point::new(f64::NAN, f64::NAN)]);
        assert!(pad.is_empty());
        assert!(pad.ink_bounds().is_none());

        pad.draw_stroke(&[
            Point::new(100.0, 100.0),
            Point::new(f64::NAN, 0.0),
            Point::new(f64::INFINITY, 100.0),
        ]);
        let bounds = pad.ink_bounds().unwrap();
        assert!(bounds.left >= 98 && bounds.right <= 101);
        assert!(bounds.top >= 98 && bounds.bottom <= 101);
    }

    #[test]
    fn empty_pad_cannot_be_trimmed() {
        let pad = SignaturePad::default();
        assert!(matches!(pad.trimmed_png(), Err(Error::EmptySignature)));
        assert!(pad.to_png().is_ok());
    }

    #[test]
    fn data_url_decodes_back_to_png() {
        let pad = signed();
        let url = pad.to_data_url().unwrap();
        assert!(url.starts_with("data:image/png;base64,"));
        assert_eq!(data_url_bytes(&url).unwrap(), pad.trimmed_png().unwrap());
    }

    #[test]
    fn malformed_data_urls_are_rejected() {
        assert!(data_url_bytes("not a url").is_err());
        assert!(data_url_bytes("data:image/png,abc").is_err());
        assert!(data_url_bytes("data:image/png;base64,@@@").is_err());
    }
}
