use crate::{
    form::FormData,
    overlay::TemplateLayout,
    rasterize::PageSize,
    signature::{Point, SignaturePad},
    Error,
};
use serde::Deserialize;
use std::{
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
};

pub const RASTERIZED_FILE_NAME: &str = "clearing-instruction.pdf";
pub const COMPLETED_FILE_NAME: &str = "completed-form.pdf";
pub const DEFAULT_TEMPLATE_PATH: &str = "assets/template.pdf";

/// Settings for both export pipelines. Every key is optional in the TOML file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Where downloads are written.
    pub output_dir: PathBuf,
    pub template_path: PathBuf,
    pub rasterized_file_name: String,
    pub completed_file_name: String,
    /// Apply the presence check before the template overlay as well.
    pub enforce_required_fields: bool,
    pub page: PageSize,
    pub layout: TemplateLayout,
}

impl Default for ExportConfig {
    fn default() -> Self {
        ExportConfig {
            output_dir: PathBuf::from("."),
            template_path: PathBuf::from(DEFAULT_TEMPLATE_PATH),
            rasterized_file_name: RASTERIZED_FILE_NAME.to_owned(),
            completed_file_name: COMPLETED_FILE_NAME.to_owned(),
            enforce_required_fields: false,
            page: PageSize::default(),
            layout: TemplateLayout::default(),
        }
    }
}

impl ExportConfig {
    pub fn from_toml(source: &str) -> Result<Self, Error> {
        Ok(toml::from_str(source)?)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        Self::from_toml(&fs::read_to_string(path)?)
    }

    /// Like `load`, but a missing file means defaults.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        match fs::read_to_string(path.as_ref()) {
            Ok(source) => Self::from_toml(&source),
            Err(err) if err.kind() == ErrorKind::NotFound => {
                log::debug!(
                    "No config at {}, using defaults",
                    path.as_ref().display()
                );
                Ok(Self::default())
            }
            Err(err) => Err(err.into()),
        }
    }
}

/// Recorded signature: strokes as lists of `[x, y]` points on the pad.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct SignatureStrokes {
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub strokes: Vec<Vec<[f64; 2]>>,
}

impl SignatureStrokes {
    /// Replays the strokes on a fresh pad.
    pub fn to_pad(&self) -> SignaturePad {
        let mut pad = match (self.width, self.height) {
            (Some(width), Some(height)) => SignaturePad::new(width, height),
            _ => SignaturePad::default(),
        };
        for stroke in &self.strokes {
            let points: Vec<Point> = stroke.iter().copied().map(Point::from).collect();
            pad.draw_stroke(&points);
        }
        pad
    }
}

/// A filled-in form as read from disk by the command line tool.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Submission {
    pub form: FormData,
    pub signature: SignatureStrokes,
}

impl Submission {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        Ok(toml::from_str(&fs::read_to_string(path)?)?)
    }
}
