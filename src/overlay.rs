//! Template overlay export: the form values and the signature are drawn at fixed
//! positions on the first page of an existing PDF.
//!
//! The coordinates are tied to the layout of the template in use; changing the
//! template means changing [`TemplateLayout`].

use crate::{
    form::FormData,
    signature::{data_url_bytes, SignaturePad},
    ClearingDocument, Error, Font, Rectangle,
};
use serde::Deserialize;
use std::{fs, path::PathBuf};

const SIGNATURE_IMAGE_NAME: &str = "CISignature";

/// Where things go on the template page. Vertical positions are measured down
/// from the top edge of the page.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct TemplateLayout {
    pub text_x: f64,
    /// Distance below the page top of the first field's baseline.
    pub first_line_offset: f64,
    pub line_spacing: f64,
    pub font_size: f64,
    pub signature_x: f64,
    pub signature_offset: f64,
    pub signature_width: f64,
    pub signature_height: f64,
}

impl Default for TemplateLayout {
    fn default() -> Self {
        TemplateLayout {
            text_x: 100.0,
            first_line_offset: 100.0,
            line_spacing: 20.0,
            font_size: 12.0,
            signature_x: 100.0,
            signature_offset: 300.0,
            signature_width: 150.0,
            signature_height: 50.0,
        }
    }
}

impl TemplateLayout {
    /// Baseline of the `index`th field in declared order.
    pub fn text_position(&self, index: usize, page_height: f64) -> (f64, f64) {
        (
            self.text_x,
            page_height - (self.first_line_offset + self.line_spacing * index as f64),
        )
    }

    /// Signature box; the image is stretched to it whatever its own aspect ratio.
    pub fn signature_rect(&self, page_height: f64) -> Rectangle {
        Rectangle::from_origin_size(
            self.signature_x,
            page_height - self.signature_offset,
            self.signature_width,
            self.signature_height,
        )
    }
}

/// Supplies the bytes of the template PDF.
pub trait TemplateSource {
    fn fetch(&self) -> Result<Vec<u8>, Error>;
}

/// Template read from a file, typically a static asset shipped next to the binary.
#[derive(Debug, Clone)]
pub struct FileTemplate {
    pub path: PathBuf,
}

impl FileTemplate {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        FileTemplate { path: path.into() }
    }
}

impl TemplateSource for FileTemplate {
    fn fetch(&self) -> Result<Vec<u8>, Error> {
        log::debug!("Fetching template {}", self.path.display());
        fs::read(&self.path)
            .map_err(|err| Error::TemplateFetch(format!("{}: {}", self.path.display(), err)))
    }
}

impl TemplateSource for Vec<u8> {
    fn fetch(&self) -> Result<Vec<u8>, Error> {
        Ok(self.clone())
    }
}

impl TemplateSource for [u8] {
    fn fetch(&self) -> Result<Vec<u8>, Error> {
        Ok(self.to_vec())
    }
}

/// Fills the first page of `template` with the form values and the signature.
///
/// The text goes on first; an empty signature then aborts with
/// [`Error::EmptySignature`] and the partly filled document is dropped.
pub fn fill_template(
    template: &[u8],
    form: &FormData,
    signature: &SignaturePad,
    layout: &TemplateLayout,
) -> Result<Vec<u8>, Error> {
    let mut doc = ClearingDocument::load_mem(template)?;
    let page_id = doc.first_page()?;
    let page_height = doc.page_height(page_id)?;

    for (index, (field, value)) in form.entries().enumerate() {
        let position = layout.text_position(index, page_height);
        log::debug!("Drawing {} at {:?}", field, position);
        doc.add_text_to_doc(value, position, Font::Helvetica, layout.font_size, page_id)?;
    }

    if signature.is_empty() {
        return Err(Error::EmptySignature);
    }
    let signature_png = data_url_bytes(&signature.to_data_url()?)?;
    doc.add_image_to_page(
        signature_png.as_slice(),
        SIGNATURE_IMAGE_NAME,
        page_id,
        layout.signature_rect(page_height),
    )?;

    doc.to_bytes()
}
