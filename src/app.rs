//! The clearing instruction form: field state, signature pad, submit handlers.

use crate::{
    config::ExportConfig,
    form::{Field, FormData},
    html::{self, PageState},
    overlay::{self, TemplateSource},
    rasterize,
    render::FormRenderer,
    signature::SignaturePad,
    Error,
};
use std::{
    fs,
    path::{Path, PathBuf},
};

pub const REQUIRED_FIELDS_MESSAGE: &str = "Please fill in all required fields.";
pub const SIGNATURE_MESSAGE: &str = "Please provide a signature.";

/// A generated PDF on its way to the user.
#[derive(Debug, Clone)]
pub struct ExportArtifact {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl ExportArtifact {
    /// Writes the file into `dir`, creating it if needed.
    pub fn save_in<P: AsRef<Path>>(self, dir: P) -> Result<PathBuf, Error> {
        fs::create_dir_all(dir.as_ref())?;
        let path = dir.as_ref().join(&self.file_name);
        fs::write(&path, &self.bytes)?;
        log::info!("Saved {} ({} bytes)", path.display(), self.bytes.len());
        Ok(path)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ClearingForm {
    data: FormData,
    signature: SignaturePad,
    loading: bool,
    form_error: Option<String>,
    signature_error: Option<String>,
    config: ExportConfig,
}

impl ClearingForm {
    pub fn new(config: ExportConfig) -> Self {
        ClearingForm {
            config,
            ..Default::default()
        }
    }

    pub fn data(&self) -> &FormData {
        &self.data
    }

    pub fn config(&self) -> &ExportConfig {
        &self.config
    }

    pub fn signature(&self) -> &SignaturePad {
        &self.signature
    }

    pub fn signature_mut(&mut self) -> &mut SignaturePad {
        &mut self.signature
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn form_error(&self) -> Option<&str> {
        self.form_error.as_deref()
    }

    pub fn signature_error(&self) -> Option<&str> {
        self.signature_error.as_deref()
    }

    /// Input change: swaps in a new record with `name` set to `value`.
    pub fn handle_change(&mut self, name: &str, value: impl Into<String>) -> Result<(), Error> {
        let field: Field = name.parse()?;
        self.data = self.data.with(field, value);
        Ok(())
    }

    pub fn clear_signature(&mut self) {
        self.signature.clear();
    }

    /// The page as currently shown, including messages and busy state.
    pub fn render_page(&self) -> String {
        let state = PageState {
            form_error: self.form_error(),
            signature_error: self.signature_error(),
            signature_data_url: self.signature.to_data_url().ok(),
            loading: self.loading,
        };
        html::render_page(&self.data, &state)
    }

    /// Rasterizes the rendered form and paginates it onto A4 pages.
    ///
    /// Validation failures end up in `form_error` / `signature_error`. A page
    /// without a render target silently produces nothing.
    pub fn submit_rasterized<R: FormRenderer + ?Sized>(
        &mut self,
        renderer: &R,
    ) -> Option<ExportArtifact> {
        self.begin_submit();
        let artifact = self.rasterized_export(renderer);
        self.loading = false;
        artifact
    }

    /// Overlays the form values and signature on the template.
    ///
    /// Only an empty signature is reported to the user; template problems are
    /// logged and the export quietly stops.
    pub fn submit_template<S: TemplateSource + ?Sized>(
        &mut self,
        source: &S,
    ) -> Option<ExportArtifact> {
        self.begin_submit();
        let artifact = self.template_export(source);
        self.loading = false;
        artifact
    }

    fn begin_submit(&mut self) {
        self.loading = true;
        self.form_error = None;
        self.signature_error = None;
    }

    fn check_required(&mut self) -> bool {
        match self.data.validate() {
            Ok(()) => true,
            Err(err) => {
                log::debug!("Submit rejected: {}", err);
                self.form_error = Some(REQUIRED_FIELDS_MESSAGE.to_owned());
                false
            }
        }
    }

    fn check_signature(&mut self) -> bool {
        if self.signature.is_empty() {
            log::debug!("Submit rejected: {}", Error::EmptySignature);
            self.signature_error = Some(SIGNATURE_MESSAGE.to_owned());
            false
        } else {
            true
        }
    }

    fn rasterized_export<R: FormRenderer + ?Sized>(
        &mut self,
        renderer: &R,
    ) -> Option<ExportArtifact> {
        if !self.check_required() || !self.check_signature() {
            return None;
        }

        log::info!("Generating {}", self.config.rasterized_file_name);
        let html = self.render_page();
        let result = renderer
            .rasterize(&html, &format!("#{}", html::FORM_ELEMENT_ID))
            .and_then(|png| match png {
                Some(png) => rasterize::paginate_png(&png, self.config.page).map(Some),
                None => Ok(None),
            });
        match result {
            Ok(Some(bytes)) => Some(ExportArtifact {
                file_name: self.config.rasterized_file_name.clone(),
                bytes,
            }),
            Ok(None) => {
                log::debug!("Render target missing, nothing exported");
                None
            }
            Err(err) => {
                log::error!("Error generating PDF: {}", err);
                None
            }
        }
    }

    fn template_export<S: TemplateSource + ?Sized>(&mut self, source: &S) -> Option<ExportArtifact> {
        if self.config.enforce_required_fields && !self.check_required() {
            return None;
        }
        if !self.check_signature() {
            return None;
        }

        log::info!("Generating {}", self.config.completed_file_name);
        let result = source.fetch().and_then(|template| {
            overlay::fill_template(&template, &self.data, &self.signature, &self.config.layout)
        });
        match result {
            Ok(bytes) => Some(ExportArtifact {
                file_name: self.config.completed_file_name.clone(),
                bytes,
            }),
            Err(Error::EmptySignature) => {
                self.signature_error = Some(SIGNATURE_MESSAGE.to_owned());
                None
            }
            Err(err) => {
                log::error!("Error generating PDF: {}", err);
                None
            }
        }
    }
}
