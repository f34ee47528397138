use crate::form::Field;
use std::fmt;

#[derive(Debug)]
pub enum Error {
    IOError(std::io::Error),
    LoPdfError(lopdf::Error),
    DecodingError(png::DecodingError),
    EncodingError(png::EncodingError),
    Base64Error(base64::DecodeError),
    ConfigError(toml::de::Error),
    /// Launching or driving the headless browser failed.
    Browser(String),
    /// `handle_change` was called with a name that is not one of the form inputs.
    UnknownField(String),
    MissingRequiredFields(Vec<Field>),
    EmptySignature,
    /// The template could not be retrieved (missing asset, unreadable file).
    TemplateFetch(String),
    Other(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::IOError(err) => write!(f, "io error: {}", err),
            Error::LoPdfError(err) => write!(f, "pdf error: {}", err),
            Error::DecodingError(err) => write!(f, "png decoding error: {}", err),
            Error::EncodingError(err) => write!(f, "png encoding error: {}", err),
            Error::Base64Error(err) => write!(f, "base64 error: {}", err),
            Error::ConfigError(err) => write!(f, "config error: {}", err),
            Error::Browser(msg) => write!(f, "browser error: {}", msg),
            Error::UnknownField(name) => write!(f, "unknown form field `{}`", name),
            Error::MissingRequiredFields(fields) => {
                let names: Vec<&str> = fields.iter().map(|field| field.name()).collect();
                write!(f, "missing required fields: {}", names.join(", "))
            }
            Error::EmptySignature => write!(f, "signature is empty"),
            Error::TemplateFetch(msg) => write!(f, "failed to fetch template: {}", msg),
            Error::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::IOError(err) => Some(err),
            Error::LoPdfError(err) => Some(err),
            Error::DecodingError(err) => Some(err),
            Error::EncodingError(err) => Some(err),
            Error::Base64Error(err) => Some(err),
            Error::ConfigError(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::IOError(err)
    }
}

impl From<lopdf::Error> for Error {
    fn from(err: lopdf::Error) -> Self {
        Error::LoPdfError(err)
    }
}

impl From<png::DecodingError> for Error {
    fn from(err: png::DecodingError) -> Self {
        Error::DecodingError(err)
    }
}

impl From<png::EncodingError> for Error {
    fn from(err: png::EncodingError) -> Self {
        Error::EncodingError(err)
    }
}

impl From<base64::DecodeError> for Error {
    fn from(err: base64::DecodeError) -> Self {
        Error::Base64Error(err)
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::ConfigError(err)
    }
}
