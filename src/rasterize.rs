//! Rasterize-and-paginate export.
//!
//! The rendered form is a single image that is scaled to the page width. When it
//! is taller than one page the whole image is drawn again on every following
//! page, shifted up by one page height each time, and the page boundary does the
//! clipping.

use crate::{ClearingDocument, Error, Rectangle};
use serde::Deserialize;

const POINTS_PER_MM: f64 = 72.0 / 25.4;
const FORM_IMAGE_NAME: &str = "CIForm";

/// Page size in millimetres.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct PageSize {
    pub width_mm: f64,
    pub height_mm: f64,
}

impl Default for PageSize {
    /// A4 portrait.
    fn default() -> Self {
        PageSize {
            width_mm: 210.0,
            height_mm: 297.0,
        }
    }
}

impl PageSize {
    /// Height of an image of `pixel_width` x `pixel_height` once scaled to the page width.
    pub fn scaled_height(&self, pixel_width: f64, pixel_height: f64) -> f64 {
        Rectangle::scale_image_on_width(self.width_mm, 0.0, 0.0, (pixel_width, pixel_height))
            .height()
    }
}

/// Vertical offset (mm, downwards from the page top) of the image on each page.
/// The first page always shows the image at 0; later offsets are negative.
pub fn page_offsets(image_height: f64, page_height: f64) -> Vec<f64> {
    let mut offsets = vec![0.0];
    let mut height_left = image_height - page_height;
    while height_left > 0.0 {
        offsets.push(height_left - image_height);
        height_left -= page_height;
    }
    offsets
}

/// Lays the PNG of the rendered form out over as many pages as its height needs.
pub fn paginate_png(png: &[u8], page: PageSize) -> Result<Vec<u8>, Error> {
    let size = imagesize::blob_size(png)
        .map_err(|err| Error::Other(format!("Rasterized form is not an image: {:?}", err)))?;
    if size.width == 0 || size.height == 0 {
        return Err(Error::Other("Rasterized form has no area.".to_owned()));
    }

    let image_width = page.width_mm;
    let image_height = page.scaled_height(size.width as f64, size.height as f64);
    let offsets = page_offsets(image_height, page.height_mm);
    log::debug!(
        "Paginating {}x{} px form: {:.1} mm tall over {} page(s)",
        size.width,
        size.height,
        image_height,
        offsets.len()
    );

    let mut doc = ClearingDocument::blank();
    let page_width_pt = page.width_mm * POINTS_PER_MM;
    let page_height_pt = page.height_mm * POINTS_PER_MM;
    for offset in offsets {
        let page_id = doc.add_page(page_width_pt, page_height_pt)?;
        // top-down offset to PDF's bottom-up user space
        let bottom = page.height_mm - offset - image_height;
        let rect = Rectangle::from_origin_size(
            0.0,
            bottom * POINTS_PER_MM,
            image_width * POINTS_PER_MM,
            image_height * POINTS_PER_MM,
        );
        doc.add_image_to_page(png, FORM_IMAGE_NAME, page_id, rect)?;
    }
    doc.to_bytes()
}
