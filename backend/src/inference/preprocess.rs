use image::DynamicImage;
use image::imageops::FilterType;
use ndarray::Array3;

#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("empty image payload")]
    Empty,
    #[error("cannot decode image: {0}")]
    Image(#[from] image::ImageError),
}

/// Decodes an encoded crop; the format is guessed from its magic bytes.
pub fn decode_image(bytes: &[u8]) -> Result<DynamicImage, DecodeError> {
    if bytes.is_empty() {
        return Err(DecodeError::Empty);
    }
    Ok(image::load_from_memory(bytes)?)
}

/// Resizes to `size x size` RGB and lays the pixels out as a CHW tensor
/// scaled to `[0, 1]`.
pub fn preprocess(image: &DynamicImage, size: u32) -> Array3<f32> {
    let resized = image
        .resize_exact(size, size, FilterType::Triangle)
        .to_rgb8();
    let side = size as usize;

    Array3::from_shape_fn((3, side, side), |(channel, y, x)| {
        resized.get_pixel(x as u32, y as u32)[channel] as f32 / 255.0
    })
}
