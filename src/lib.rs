pub mod app;
pub mod config;
mod error;
pub mod form;
pub mod html;
mod image_xobject;
pub mod overlay;
mod pdf_object;
pub mod rasterize;
pub mod render;
pub mod signature;
mod utils;

use image_xobject::ImageXObject;
use lopdf::{
    content::{Content, Operation},
    dictionary, Dictionary, Document, Object, ObjectId, Stream,
};
use pdf_object::{as_number, inherited_attribute};
use std::{
    collections::{HashMap, HashSet},
    io::Read,
};

pub use app::{ClearingForm, ExportArtifact};
pub use config::ExportConfig;
pub use error::Error;
pub use form::{Field, FormData};
pub use lopdf;
pub use signature::{Point, SignaturePad};

/// Axis aligned box in PDF user space (origin bottom left).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Rectangle {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

impl Rectangle {
    pub fn scale_image_on_width(width: f64, x: f64, y: f64, dimensions: (f64, f64)) -> Self {
        let (dx, dy) = dimensions;
        let ratio = dy / dx;
        Self {
            x1: x,
            y1: y,
            x2: x + width,
            y2: y + width * ratio,
        }
    }

    pub fn from_origin_size(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x1: x,
            y1: y,
            x2: x + width,
            y2: y + height,
        }
    }

    pub fn width(&self) -> f64 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> f64 {
        self.y2 - self.y1
    }
}

/// Standard 14 fonts; none of them need to be embedded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Font {
    Helvetica,
    Courier,
    TimesRoman,
}

impl Font {
    fn base_font(self) -> &'static str {
        match self {
            Font::Helvetica => "Helvetica",
            Font::Courier => "Courier",
            Font::TimesRoman => "Times-Roman",
        }
    }

    /// Resource name, prefixed so it does not collide with fonts the template already uses.
    fn resource_name(self) -> String {
        format!("CI{}", self.base_font().replace('-', ""))
    }
}

/// A PDF being filled in or assembled. Fonts and images are added to the object
/// list once and shared between pages.
#[derive(Debug, Clone)]
pub struct ClearingDocument {
    raw_document: Document,
    /// Link between the image name saved and the objectId of the image.
    /// This is used to reduce the amount of copies of the images in the pdf file.
    image_object_id: HashMap<String, ObjectId>,
    font_object_id: HashMap<Font, ObjectId>,
    /// Pages whose original content has already been wrapped in `q`/`Q`.
    isolated_pages: HashSet<ObjectId>,
    pages_id: Option<ObjectId>,
}

impl ClearingDocument {
    pub fn new(raw_document: Document) -> Self {
        ClearingDocument {
            raw_document,
            image_object_id: HashMap::new(),
            font_object_id: HashMap::new(),
            isolated_pages: HashSet::new(),
            pages_id: None,
        }
    }

    pub fn load_mem(bytes: &[u8]) -> Result<Self, Error> {
        Ok(Self::new(Document::load_mem(bytes)?))
    }

    /// Empty document with a page tree and catalog, ready for `add_page`.
    pub fn blank() -> Self {
        let mut document = Document::with_version("1.5");
        let pages_id = document.add_object(dictionary! {
            "Type" => "Pages",
            "Kids" => Vec::<Object>::new(),
            "Count" => 0,
        });
        let catalog_id = document.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        document.trailer.set("Root", catalog_id);

        let mut doc = Self::new(document);
        doc.pages_id = Some(pages_id);
        doc
    }

    pub fn get_document_ref(&self) -> &Document {
        &self.raw_document
    }

    /// Serializes the document with its streams compressed.
    pub fn to_bytes(mut self) -> Result<Vec<u8>, Error> {
        self.raw_document.compress();
        let mut bytes = Vec::new();
        self.raw_document.save_to(&mut bytes)?;
        Ok(bytes)
    }

    pub fn page_count(&self) -> usize {
        self.raw_document.get_pages().len()
    }

    pub fn first_page(&self) -> Result<ObjectId, Error> {
        self.raw_document
            .get_pages()
            .get(&1)
            .copied()
            .ok_or_else(|| Error::Other("Document has no pages.".to_owned()))
    }

    /// Page size as `(width, height)` from its (possibly inherited) MediaBox.
    pub fn page_size(&self, page_id: ObjectId) -> Result<(f64, f64), Error> {
        let media_box = inherited_attribute(&self.raw_document, page_id, b"MediaBox")?.as_array()?;
        if media_box.len() < 4 {
            return Err(Error::Other("MediaBox: expected 4 numbers.".to_owned()));
        }
        let x1 = as_number(&media_box[0])?;
        let y1 = as_number(&media_box[1])?;
        let x2 = as_number(&media_box[2])?;
        let y2 = as_number(&media_box[3])?;
        Ok(((x2 - x1).abs(), (y2 - y1).abs()))
    }

    pub fn page_height(&self, page_id: ObjectId) -> Result<f64, Error> {
        Ok(self.page_size(page_id)?.1)
    }

    /// Appends an empty page to a document created with `blank`.
    pub fn add_page(&mut self, width: f64, height: f64) -> Result<ObjectId, Error> {
        let pages_id = self
            .pages_id
            .ok_or_else(|| Error::Other("Pages can only be added to blank documents.".to_owned()))?;
        let content_id = self
            .raw_document
            .add_object(Stream::new(Dictionary::new(), Vec::new()));
        let page_id = self.raw_document.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), width.into(), height.into()],
            "Resources" => Dictionary::new(),
            "Contents" => content_id,
        });

        let pages = self.raw_document.get_object_mut(pages_id)?.as_dict_mut()?;
        let mut kids = pages.get(b"Kids")?.as_array()?.clone();
        kids.push(page_id.into());
        let count = kids.len() as i64;
        pages.set("Kids", kids);
        pages.set("Count", count);

        self.isolated_pages.insert(page_id);
        Ok(page_id)
    }

    /// Places a PNG on the page, stretched to `rect`. Images are keyed by `image_name`:
    /// placing the same name again reuses the embedded image.
    pub fn add_image_to_page<R: Read>(
        &mut self,
        image_reader: R,
        image_name: &str,
        page_id: ObjectId,
        rect: Rectangle,
    ) -> Result<ObjectId, Error> {
        let image_object_id_opt = self.image_object_id.get(image_name).cloned();

        Ok(if let Some(image_object_id) = image_object_id_opt {
            // Image was already added so we can reuse it.
            self.add_image_to_page_only(image_object_id, image_name, page_id, rect)?
        } else {
            // Image was not added already so we need to add it in full
            let image_object_id = self.add_image(image_reader, image_name, page_id, rect)?;
            self.image_object_id
                .insert(image_name.to_owned(), image_object_id);
            image_object_id
        })
    }

    /// Draws a single line of text with its baseline starting at `position`.
    pub fn add_text_to_doc(
        &mut self,
        text: &str,
        position: (f64, f64),
        font: Font,
        font_size: f64,
        page_id: ObjectId,
    ) -> Result<(), Error> {
        self.prepare_page(page_id)?;
        let font_name = self.add_font_to_page(font, page_id)?;
        let mut page_content = self.isolated_page_content(page_id)?;
        let (x, y) = position;

        let operations = vec![
            Operation::new("q", vec![]),
            // black fill
            Operation::new("rg", vec![0.into(), 0.into(), 0.into()]),
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec![Object::Name(font_name.into_bytes()), font_size.into()]),
            Operation::new("Td", vec![x.into(), y.into()]),
            Operation::new("Tj", vec![Object::string_literal(encode_win_ansi(text))]),
            Operation::new("ET", vec![]),
            Operation::new("Q", vec![]),
        ];

        page_content.operations.extend(operations);

        self.raw_document
            .change_page_content(page_id, page_content.encode()?)?;
        Ok(())
    }

    /// Current page content, with the original operations wrapped in `q`/`Q` the
    /// first time the page is touched so template state does not leak into ours.
    fn isolated_page_content(&mut self, page_id: ObjectId) -> Result<Content, Error> {
        let mut content = self.raw_document.get_and_decode_page_content(page_id)?;
        if self.isolated_pages.insert(page_id) && !content.operations.is_empty() {
            content.operations.insert(0, Operation::new("q", vec![]));
            content.operations.push(Operation::new("Q", vec![]));
        }
        Ok(content)
    }

    /// Gives the page its own `Resources` (copied when inherited from the page tree)
    /// and a `Contents` stream, which `change_page_content` needs to write to.
    fn prepare_page(&mut self, page_id: ObjectId) -> Result<(), Error> {
        let page = self.raw_document.get_dictionary(page_id)?;
        let has_contents = page.has(b"Contents");
        let inherited_resources = if page.has(b"Resources") {
            None
        } else {
            inherited_attribute(&self.raw_document, page_id, b"Resources")
                .ok()
                .cloned()
        };

        let content_id = if has_contents {
            None
        } else {
            Some(
                self.raw_document
                    .add_object(Stream::new(Dictionary::new(), Vec::new())),
            )
        };
        let page = self.raw_document.get_object_mut(page_id)?.as_dict_mut()?;
        if let Some(resources) = inherited_resources {
            page.set("Resources", resources);
        }
        if let Some(content_id) = content_id {
            page.set("Contents", content_id);
        }
        Ok(())
    }

    fn add_font_to_page(&mut self, font: Font, page_id: ObjectId) -> Result<String, Error> {
        let font_id = match self.font_object_id.get(&font) {
            Some(font_id) => *font_id,
            None => {
                let font_id = self.raw_document.add_object(dictionary! {
                    "Type" => "Font",
                    "Subtype" => "Type1",
                    "BaseFont" => font.base_font(),
                    "Encoding" => "WinAnsiEncoding",
                });
                self.font_object_id.insert(font, font_id);
                font_id
            }
        };
        let font_name = font.resource_name();

        // The font dictionary may be inline or a reference shared with other pages.
        let existing = self
            .raw_document
            .get_or_create_resources(page_id)?
            .as_dict()?
            .get(b"Font")
            .ok()
            .cloned();
        let fonts = match existing {
            Some(Object::Reference(fonts_id)) => self.raw_document.get_object_mut(fonts_id)?,
            Some(_) => self
                .raw_document
                .get_or_create_resources(page_id)?
                .as_dict_mut()?
                .get_mut(b"Font")?,
            None => {
                let resources = self
                    .raw_document
                    .get_or_create_resources(page_id)?
                    .as_dict_mut()?;
                resources.set("Font", Dictionary::new());
                resources.get_mut(b"Font")?
            }
        };
        fonts.as_dict_mut()?.set(font_name.clone(), font_id);
        Ok(font_name)
    }

    fn add_image<R: Read>(
        &mut self,
        image_reader: R,
        image_name: &str,
        page_id: ObjectId,
        rect: Rectangle,
    ) -> Result<ObjectId, Error> {
        // Load image
        let image_decoder = png::Decoder::new(image_reader);
        let (mut image_xobject, mask_xobject) = ImageXObject::try_from(image_decoder)?;
        // Add object to object list
        if let Some(mask_xobject) = mask_xobject {
            let mask_xobject_id = self.raw_document.add_object(mask_xobject);
            image_xobject.s_mask = Some(mask_xobject_id);
        }
        let image_xobject_id = self.raw_document.add_object(image_xobject);
        self.add_image_to_page_only(image_xobject_id, image_name, page_id, rect)
    }

    fn add_image_to_page_only(
        &mut self,
        image_xobject_id: ObjectId,
        image_name: &str,
        page_id: ObjectId,
        rect: Rectangle,
    ) -> Result<ObjectId, Error> {
        self.prepare_page(page_id)?;
        // Add object to xobject list on page (with new IR)
        // Because of the unique name this item will not be inserted more then once.
        self.raw_document
            .add_xobject(page_id, image_name, image_xobject_id)?;
        // Add xobject to layer (make visible)
        self.add_image_to_page_stream(image_name, page_id, rect)?;

        Ok(image_xobject_id)
    }

    // The image must already be added to the object list!
    // Please use `add_image_to_page` instead.
    fn add_image_to_page_stream(
        &mut self,
        xobject_name: &str,
        page_id: ObjectId,
        rect: Rectangle,
    ) -> Result<(), Error> {
        let mut content = self.isolated_page_content(page_id)?;
        let position = (rect.x1, rect.y1);
        let size = (rect.width(), rect.height());
        // `q` = Save graphics state
        content.operations.push(Operation::new("q", vec![]));
        // `cm` = Concatenate matrix to current transformation matrix
        content.operations.push(Operation::new(
            "cm",
            vec![
                size.0.into(),
                0i32.into(),
                0i32.into(),
                size.1.into(),
                position.0.into(),
                position.1.into(),
            ],
        ));
        // `Do` = Invoke named XObject
        content.operations.push(Operation::new(
            "Do",
            vec![Object::Name(xobject_name.as_bytes().to_vec())],
        ));
        // `Q` = Restore graphics state
        content.operations.push(Operation::new("Q", vec![]));

        self.raw_document
            .change_page_content(page_id, content.encode()?)?;

        Ok(())
    }
}

/// Characters of the WinAnsiEncoding block 0x80..=0x9F, `None` for unused codes.
const WIN_ANSI_HIGH: [Option<char>; 32] = [
    Some('\u{20AC}'), None, Some('\u{201A}'), Some('\u{0192}'),
    Some('\u{201E}'), Some('\u{2026}'), Some('\u{2020}'), Some('\u{2021}'),
    Some('\u{02C6}'), Some('\u{2030}'), Some('\u{0160}'), Some('\u{2039}'),
    Some('\u{0152}'), None, Some('\u{017D}'), None,
    None, Some('\u{2018}'), Some('\u{2019}'), Some('\u{201C}'),
    Some('\u{201D}'), Some('\u{2022}'), Some('\u{2013}'), Some('\u{2014}'),
    Some('\u{02DC}'), Some('\u{2122}'), Some('\u{0161}'), Some('\u{203A}'),
    Some('\u{0153}'), None, Some('\u{017E}'), Some('\u{0178}'),
];

/// Standard fonts use WinAnsiEncoding; characters it cannot show become `?`.
fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c as u32 {
            0x80..=0x9F => b'?',
            code if code < 0x100 => code as u8,
            _ => WIN_ANSI_HIGH
                .iter()
                .position(|mapped| *mapped == Some(c))
                .map_or(b'?', |index| 0x80 + index as u8),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn operators(doc: &ClearingDocument, page_id: ObjectId) -> Vec<String> {
        doc.get_document_ref()
            .get_and_decode_page_content(page_id)
            .unwrap()
            .operations
            .into_iter()
            .map(|op| op.operator)
            .collect()
    }

    #[test]
    fn scale_image_on_width_keeps_aspect_ratio() {
        let rect = Rectangle::scale_image_on_width(210.0, 0.0, 0.0, (1000.0, 2000.0));
        assert_eq!(rect.width(), 210.0);
        assert_eq!(rect.height(), 420.0);
    }

    #[test]
    fn blank_document_grows_page_tree() {
        let mut doc = ClearingDocument::blank();
        assert_eq!(doc.page_count(), 0);
        assert!(doc.first_page().is_err());

        let first = doc.add_page(595.0, 842.0).unwrap();
        doc.add_page(595.0, 842.0).unwrap();

        assert_eq!(doc.page_count(), 2);
        assert_eq!(doc.first_page().unwrap(), first);
        assert_eq!(doc.page_size(first).unwrap(), (595.0, 842.0));
    }

    #[test]
    fn text_registers_font_and_draws() {
        let mut doc = ClearingDocument::blank();
        let page_id = doc.add_page(612.0, 792.0).unwrap();
        doc.add_text_to_doc("Acme", (100.0, 692.0), Font::Helvetica, 12.0, page_id)
            .unwrap();

        let resources = doc
            .get_document_ref()
            .get_dictionary(page_id)
            .unwrap()
            .get(b"Resources")
            .unwrap()
            .as_dict()
            .unwrap();
        assert!(resources
            .get(b"Font")
            .unwrap()
            .as_dict()
            .unwrap()
            .has(b"CIHelvetica"));
        assert_eq!(
            operators(&doc, page_id),
            vec!["q", "rg", "BT", "Tf", "Td", "Tj", "ET", "Q"]
        );
    }

    #[test]
    fn same_image_name_is_embedded_once() {
        let mut png_bytes = Vec::new();
        {
            let mut encoder = png::Encoder::new(&mut png_bytes, 1, 1);
            encoder.set_color(png::ColorType::Rgb);
            encoder.set_depth(png::BitDepth::Eight);
            let mut writer = encoder.write_header().unwrap();
            writer.write_image_data(&[0, 0, 0]).unwrap();
        }

        let mut doc = ClearingDocument::blank();
        let first = doc.add_page(100.0, 100.0).unwrap();
        let second = doc.add_page(100.0, 100.0).unwrap();
        let rect = Rectangle::from_origin_size(0.0, 0.0, 10.0, 10.0);
        let a = doc
            .add_image_to_page(png_bytes.as_slice(), "Img", first, rect.clone())
            .unwrap();
        let b = doc
            .add_image_to_page(png_bytes.as_slice(), "Img", second, rect)
            .unwrap();

        assert_eq!(a, b);
        assert_eq!(operators(&doc, second), vec!["q", "cm", "Do", "Q"]);
    }

    #[test]
    fn existing_content_is_isolated_once() {
        let mut document = Document::with_version("1.5");
        let pages_id = document.new_object_id();
        let content_id = document.add_object(Stream::new(
            Dictionary::new(),
            b"2 0 0 2 0 0 cm".to_vec(),
        ));
        let page_id = document.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            "Contents" => content_id,
        });
        document.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![page_id.into()],
                "Count" => 1,
            }),
        );
        let catalog_id = document.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        document.trailer.set("Root", catalog_id);

        let mut doc = ClearingDocument::new(document);
        doc.add_text_to_doc("a", (0.0, 0.0), Font::Courier, 12.0, page_id)
            .unwrap();
        doc.add_text_to_doc("b", (0.0, 20.0), Font::Courier, 12.0, page_id)
            .unwrap();

        let ops = operators(&doc, page_id);
        assert_eq!(&ops[..3], &["q", "cm", "Q"]);
        assert_eq!(ops.iter().filter(|op| op.as_str() == "BT").count(), 2);
    }

    #[test]
    fn non_latin_text_is_replaced() {
        assert_eq!(encode_win_ansi("Zoë 船"), vec![b'Z', b'o', 0xEB, b' ', b'?']);
    }

    #[test]
    fn win_ansi_punctuation_is_kept() {
        assert_eq!(encode_win_ansi("O\u{2019}Neill"), b"O\x92Neill".to_vec());
        assert_eq!(encode_win_ansi("\u{20AC}5 \u{2013} ok"), b"\x805 \x96 ok".to_vec());
        assert_eq!(encode_win_ansi("a\u{0085}b"), b"a?b".to_vec());
    }
}
