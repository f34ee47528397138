use clearing_pdf::{
    lopdf::{dictionary, Dictionary, Document, Object, Stream},
    render::FormRenderer,
    ClearingForm, Error, Field, Point,
};
use pretty_assertions::assert_eq;

const PAGE_HEIGHT: f64 = 842.0;

/// One A4 page with some existing content using its own font, like a printed form.
fn template() -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let content_id = doc.add_object(Stream::new(
        Dictionary::new(),
        b"BT /F1 18 Tf 72 800 Td (IMPORT CLEARING INSTRUCTION) Tj ET".to_vec(),
    ));
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
    });
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
            "Resources" => dictionary! {
                "Font" => dictionary! { "F1" => font_id },
            },
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).unwrap();
    bytes
}

fn number(object: &Object) -> f64 {
    match object {
        Object::Integer(value) => *value as f64,
        Object::Real(value) => *value as f64,
        other => panic!("not a number: {:?}", other),
    }
}

fn scenario_form() -> ClearingForm {
    let mut form = ClearingForm::default();
    for (name, value) in [
        ("companyName", "Acme"),
        ("companyRegNo", ""),
        ("vatNo", ""),
        ("contactPerson", ""),
        ("telephoneNo", ""),
        ("email", "a@b.com"),
        ("vessel", "MV Test"),
        ("billNo", ""),
    ] {
        form.handle_change(name, value).unwrap();
    }
    form.signature_mut()
        .draw_stroke(&[Point::new(40.0, 150.0), Point::new(260.0, 50.0)]);
    form
}

/// Returns a white PNG of the given pixel size, as a browser screenshot would.
struct FixedSizeRenderer(u32, u32);

impl FormRenderer for FixedSizeRenderer {
    fn rasterize(&self, _html: &str, _selector: &str) -> Result<Option<Vec<u8>>, Error> {
        let mut bytes = Vec::new();
        {
            let mut encoder = png::Encoder::new(&mut bytes, self.0, self.1);
            encoder.set_color(png::ColorType::Rgb);
            encoder.set_depth(png::BitDepth::Eight);
            let mut writer = encoder.write_header().unwrap();
            writer
                .write_image_data(&vec![255; (self.0 * self.1 * 3) as usize])
                .unwrap();
        }
        Ok(Some(bytes))
    }
}

#[test]
fn template_fields_are_stacked_from_the_top() {
    let mut form = scenario_form();
    form.handle_change("billNo", "BL-7").unwrap();
    let artifact = form.submit_template(&template()).unwrap();
    assert_eq!(artifact.file_name, "completed-form.pdf");

    let doc = Document::load_mem(&artifact.bytes).unwrap();
    let page_id = *doc.get_pages().get(&1).unwrap();
    let operations = doc.get_and_decode_page_content(page_id).unwrap().operations;

    let positions: Vec<(f64, f64)> = operations
        .iter()
        .filter(|op| op.operator == "Td")
        .map(|op| (number(&op.operands[0]), number(&op.operands[1])))
        .filter(|(x, _)| *x == 100.0)
        .collect();
    assert_eq!(positions.len(), Field::ALL.len());
    assert_eq!(positions[0].1, PAGE_HEIGHT - 100.0);
    assert_eq!(positions[7].1, PAGE_HEIGHT - 240.0);

    let shown: Vec<Vec<u8>> = operations
        .iter()
        .filter(|op| op.operator == "Tj")
        .map(|op| op.operands[0].as_str().unwrap().to_vec())
        .collect();
    assert!(shown.contains(&b"Acme".to_vec()));
    assert!(shown.contains(&b"BL-7".to_vec()));
    assert!(shown.contains(&b"IMPORT CLEARING INSTRUCTION".to_vec()));
}

#[test]
fn template_signature_is_stretched_into_fixed_box() {
    let mut form = scenario_form();
    let artifact = form.submit_template(&template()).unwrap();

    let doc = Document::load_mem(&artifact.bytes).unwrap();
    let page_id = *doc.get_pages().get(&1).unwrap();
    let operations = doc.get_and_decode_page_content(page_id).unwrap().operations;

    let matrix: Vec<f64> = operations
        .iter()
        .find(|op| {
            op.operator == "cm" && op.operands.len() == 6 && number(&op.operands[0]) == 150.0
        })
        .map(|op| op.operands.iter().map(number).collect())
        .unwrap();
    assert_eq!(matrix, vec![150.0, 0.0, 0.0, 50.0, 100.0, PAGE_HEIGHT - 300.0]);
    assert!(operations.iter().any(|op| op.operator == "Do"));
}

#[test]
fn template_fonts_survive_the_overlay() {
    let mut form = scenario_form();
    let artifact = form.submit_template(&template()).unwrap();

    let doc = Document::load_mem(&artifact.bytes).unwrap();
    let page_id = *doc.get_pages().get(&1).unwrap();
    let fonts = doc.get_page_fonts(page_id);
    assert!(fonts.contains_key(&b"F1"[..]));
    assert!(fonts.contains_key(&b"CIHelvetica"[..]));
}

#[test]
fn unsigned_template_export_produces_nothing() {
    let mut form = scenario_form();
    form.clear_signature();

    assert!(form.submit_template(&template()).is_none());
    assert_eq!(form.signature_error(), Some("Please provide a signature."));
}

#[test]
fn scenario_fits_on_one_page() {
    let mut form = scenario_form();
    // 800 x 1000 px is 262.5 mm tall at 210 mm wide
    let artifact = form
        .submit_rasterized(&FixedSizeRenderer(800, 1000))
        .unwrap();
    assert_eq!(artifact.file_name, "clearing-instruction.pdf");

    let doc = Document::load_mem(&artifact.bytes).unwrap();
    assert_eq!(doc.get_pages().len(), 1);
}

#[test]
fn long_form_is_paginated() {
    let mut form = scenario_form();
    // 600 x 2500 px is 875 mm tall: three A4 pages
    let artifact = form
        .submit_rasterized(&FixedSizeRenderer(600, 2500))
        .unwrap();

    let doc = Document::load_mem(&artifact.bytes).unwrap();
    let pages = doc.get_pages();
    assert_eq!(pages.len(), 3);

    // every page draws the same full-height image, shifted up one page at a time
    let points_per_mm = 72.0 / 25.4;
    let bottoms: Vec<f64> = pages
        .values()
        .map(|page_id| {
            let operations = doc.get_and_decode_page_content(*page_id).unwrap().operations;
            let cm = operations.iter().find(|op| op.operator == "cm").unwrap();
            (number(&cm.operands[5]) / points_per_mm).round()
        })
        .collect();
    assert_eq!(bottoms, vec![297.0 - 875.0, 297.0 - 875.0 + 297.0, 297.0 - 875.0 + 594.0]);
}
