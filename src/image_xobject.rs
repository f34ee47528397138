use crate::Error;
use lopdf::{dictionary, Object, ObjectId, Stream};
use png::{ColorType, Decoder, Transformations};
use std::io::Read;

/// An image as it is stored inside the PDF: raw samples plus the keys of the image dictionary.
#[derive(Debug, Clone)]
pub struct ImageXObject {
    pub width: u32,
    pub height: u32,
    pub color_space: &'static str,
    pub bits_per_component: u8,
    pub interpolate: bool,
    pub image_data: Vec<u8>,
    /// Soft mask carrying the alpha channel, once it has been added to the document.
    pub s_mask: Option<ObjectId>,
}

impl ImageXObject {
    fn gray(width: u32, height: u32, image_data: Vec<u8>) -> Self {
        ImageXObject {
            width,
            height,
            color_space: "DeviceGray",
            bits_per_component: 8,
            interpolate: true,
            image_data,
            s_mask: None,
        }
    }

    fn rgb(width: u32, height: u32, image_data: Vec<u8>) -> Self {
        ImageXObject {
            color_space: "DeviceRGB",
            ..Self::gray(width, height, image_data)
        }
    }

    /// Decode a PNG into an image XObject and, when the PNG has alpha, its soft mask.
    pub fn try_from<R: Read>(mut decoder: Decoder<R>) -> Result<(Self, Option<Self>), Error> {
        // Palette and sub-byte images are expanded, 16 bit samples are cut down to 8.
        decoder.set_transformations(Transformations::EXPAND | Transformations::STRIP_16);
        let mut reader = decoder.read_info()?;
        let mut buffer = vec![0; reader.output_buffer_size()];
        let info = reader.next_frame(&mut buffer)?;
        buffer.truncate(info.buffer_size());

        let (width, height) = (info.width, info.height);
        log::debug!(
            "Decoded png {}x{} with color type {:?}",
            width,
            height,
            info.color_type
        );

        Ok(match info.color_type {
            ColorType::Grayscale => (ImageXObject::gray(width, height, buffer), None),
            ColorType::Rgb => (ImageXObject::rgb(width, height, buffer), None),
            ColorType::GrayscaleAlpha => {
                let (gray, alpha) = split_alpha(&buffer, 1);
                (
                    ImageXObject::gray(width, height, gray),
                    Some(ImageXObject::gray(width, height, alpha)),
                )
            }
            ColorType::Rgba => {
                let (rgb, alpha) = split_alpha(&buffer, 3);
                (
                    ImageXObject::rgb(width, height, rgb),
                    Some(ImageXObject::gray(width, height, alpha)),
                )
            }
            ColorType::Indexed => {
                return Err(Error::Other(
                    "Indexed png was not expanded by the decoder.".to_owned(),
                ))
            }
        })
    }
}

/// Split interleaved samples into color channels and a separate alpha plane.
fn split_alpha(samples: &[u8], color_channels: usize) -> (Vec<u8>, Vec<u8>) {
    let pixel_size = color_channels + 1;
    let pixels = samples.len() / pixel_size;
    let mut color = Vec::with_capacity(pixels * color_channels);
    let mut alpha = Vec::with_capacity(pixels);
    for pixel in samples.chunks_exact(pixel_size) {
        color.extend_from_slice(&pixel[..color_channels]);
        alpha.push(pixel[color_channels]);
    }
    (color, alpha)
}

impl From<ImageXObject> for Stream {
    fn from(image: ImageXObject) -> Self {
        let mut dict = dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => image.width as i64,
            "Height" => image.height as i64,
            "ColorSpace" => image.color_space,
            "BitsPerComponent" => image.bits_per_component as i64,
            "Interpolate" => image.interpolate,
        };
        if let Some(s_mask) = image.s_mask {
            dict.set("SMask", s_mask);
        }
        Stream::new(dict, image.image_data)
    }
}

impl From<ImageXObject> for Object {
    fn from(image: ImageXObject) -> Self {
        Object::Stream(image.into())
    }
}
