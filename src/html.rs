//! HTML rendering of the clearing instruction page. This is what the browser
//! rasterizes; the element with id [`FORM_ELEMENT_ID`] is the capture target.

use crate::form::{Field, FormData};

pub const FORM_ELEMENT_ID: &str = "form";
pub const TITLE: &str = "Import Clearing Instruction";

/// What the page shows besides the field values.
#[derive(Debug, Clone, Default)]
pub struct PageState<'a> {
    pub form_error: Option<&'a str>,
    pub signature_error: Option<&'a str>,
    /// Signature image as a data URL, if anything has been drawn.
    pub signature_data_url: Option<String>,
    pub loading: bool,
}

const STYLE: &str = "\
body{margin:0;font-family:Helvetica,Arial,sans-serif;background:#f9fafb;color:#1f2937}\
.card{background:#fff;max-width:32rem;margin:2.5rem auto;padding:3rem;border-radius:.75rem;box-shadow:0 10px 15px rgba(0,0,0,.1)}\
h2{font-size:1.875rem;text-align:center;margin:0 0 1.5rem}\
label{display:block;color:#374151}\
input{width:100%;box-sizing:border-box;padding:.5rem 1rem;border:1px solid #d1d5db;border-radius:.375rem}\
.field{margin-bottom:1rem}\
.error{color:#ef4444}\
.signature{border:1px solid #d1d5db;border-radius:.375rem;width:500px;height:200px;display:flex;align-items:center;justify-content:center}\
button{margin-top:1.5rem;width:100%;padding:.5rem 1.25rem;border:0;border-radius:.5rem;background:#6b2d5c;color:#fff}\
button[disabled]{opacity:.5}";

pub fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            c => escaped.push(c),
        }
    }
    escaped
}

fn render_field(out: &mut String, field: Field, value: &str) {
    out.push_str(&format!(
        "<div class=\"field\"><label>{label}</label>\
         <input type=\"{kind}\" name=\"{name}\" value=\"{value}\" placeholder=\"{placeholder}\"{required}/></div>",
        label = field.label(),
        kind = field.input_type(),
        name = field.name(),
        value = escape(value),
        placeholder = field.placeholder(),
        required = if field.is_marked_required() { " required" } else { "" },
    ));
}

/// Full page markup for the given form values.
pub fn render_page(form: &FormData, state: &PageState<'_>) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "<!DOCTYPE html><html><head><meta charset=\"utf-8\"><title>{title}</title>\
         <style>{style}</style></head><body><div class=\"card\"><h2>{title}</h2>",
        title = TITLE,
        style = STYLE,
    ));
    if let Some(message) = state.form_error {
        out.push_str(&format!("<p class=\"error\">{}</p>", escape(message)));
    }

    out.push_str(&format!("<form id=\"{}\">", FORM_ELEMENT_ID));
    for (field, value) in form.entries() {
        render_field(&mut out, field, value);
    }

    out.push_str("<div class=\"field\"><h3>Signature</h3><div class=\"signature\">");
    if let Some(url) = &state.signature_data_url {
        out.push_str(&format!("<img alt=\"Signature\" src=\"{}\"/>", escape(url)));
    }
    out.push_str("</div>");
    if let Some(message) = state.signature_error {
        out.push_str(&format!("<p class=\"error\">{}</p>", escape(message)));
    }
    out.push_str("</div>");

    if state.loading {
        out.push_str("<button type=\"submit\" disabled>Generating PDF...</button>");
    } else {
        out.push_str("<button type=\"submit\">Generate PDF</button>");
    }
    out.push_str("</form></div></body></html>");
    out
}
