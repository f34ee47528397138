use clearing_pdf::{ClearingDocument, ClearingForm, Font, Point};

fn main() {
    // Stand-in for the printed template: a Letter page with a heading.
    let mut template = ClearingDocument::blank();
    let page_id = template.add_page(612.0, 792.0).unwrap();
    template
        .add_text_to_doc(
            "IMPORT CLEARING INSTRUCTION",
            (100.0, 740.0),
            Font::TimesRoman,
            18.0,
            page_id,
        )
        .unwrap();
    let template = template.to_bytes().unwrap();

    let mut form = ClearingForm::default();
    form.handle_change("companyName", "Acme Shipping Ltd").unwrap();
    form.handle_change("email", "ops@acme.example").unwrap();
    form.handle_change("vessel", "MV Test").unwrap();
    form.handle_change("billNo", "BL-2024-0042").unwrap();
    form.signature_mut().draw_stroke(&[
        Point::new(20.0, 120.0),
        Point::new(80.0, 40.0),
        Point::new(140.0, 150.0),
        Point::new(220.0, 60.0),
    ]);

    let artifact = form.submit_template(&template).unwrap();
    artifact.save_in(".").unwrap();
}
