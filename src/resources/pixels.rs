use crate::{
    data_structures::{color::Color, texture::PixelTexture},
    error::TextureError,
};

/// Overwrite all pixels of `texture` with `colors`.
///
/// This is a single call into the texture's upload primitive; size and
/// allocation checks, and the error returned on failure, are the texture's.
/// Call it from the thread running the game loop, typically inside an update
/// or draw subscriber.
pub fn set_texture_pixels<T>(texture: &mut T, colors: &[Color]) -> Result<(), TextureError>
where
    T: PixelTexture + ?Sized,
{
    texture.set_data(colors)
}
