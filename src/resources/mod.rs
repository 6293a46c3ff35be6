/**
 * Helpers that push caller data into engine-owned resources.
 */
pub mod pixels;

pub use pixels::set_texture_pixels;
