use clearing_pdf::{render::ChromeRenderer, ClearingForm, Point};

fn main() {
    let mut form = ClearingForm::default();
    form.handle_change("companyName", "Acme Shipping Ltd").unwrap();
    form.handle_change("email", "ops@acme.example").unwrap();
    form.handle_change("vessel", "MV Test").unwrap();
    form.signature_mut()
        .draw_stroke(&[Point::new(30.0, 100.0), Point::new(200.0, 80.0)]);

    match form.submit_rasterized(&ChromeRenderer::default()) {
        Some(artifact) => {
            artifact.save_in(".").unwrap();
        }
        None => eprintln!("nothing generated"),
    }
}
