//! Texture stores that accept whole-image pixel uploads.
//!
//! [`PixelTexture`] is the data-upload primitive: it takes a row-major colour
//! slice covering the base level of the texture exactly once. Implementations
//! check the slice before touching their store, so a rejected upload leaves the
//! previous contents as they were.
//!
//! - [`CpuTexture`] keeps its pixels in an [`image::RgbaImage`]; useful for
//!   software rendering and for reading pixels back.
//! - [`GpuTexture`] is a `wgpu` texture written through the queue of the
//!   running game.

use anyhow::Context as _;

use crate::{context::GraphicsHandle, data_structures::color::Color, error::TextureError};

/// Pixel dimensions of a texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Number of colour values a full upload needs.
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    pub fn to_vector2(&self) -> cgmath::Vector2<f32> {
        cgmath::Vector2::new(self.width as f32, self.height as f32)
    }
}

impl From<(u32, u32)> for Size {
    fn from((width, height): (u32, u32)) -> Self {
        Self::new(width, height)
    }
}

/// A texture whose whole base level can be replaced from a colour slice.
pub trait PixelTexture {
    /// Dimensions the store was created with. A full upload needs
    /// `size().pixel_count()` colours. For a [`GpuTexture`] this can differ
    /// from what was requested, see [`GpuTexture::custom`].
    fn size(&self) -> Size;

    /// Replace every pixel, row-major from the top-left corner.
    fn set_data(&mut self, colors: &[Color]) -> Result<(), TextureError>;
}

fn check_len(size: Size, colors: &[Color]) -> Result<(), TextureError> {
    let expected = size.pixel_count();
    if colors.len() != expected {
        return Err(TextureError::InvalidBufferSize {
            expected,
            actual: colors.len(),
        });
    }
    Ok(())
}

/// Texture kept in main memory.
#[derive(Debug, Clone)]
pub struct CpuTexture {
    size: Size,
    store: Option<image::RgbaImage>,
}

impl CpuTexture {
    /// Allocate a fully transparent texture.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            size: Size::new(width, height),
            store: Some(image::RgbaImage::new(width, height)),
        }
    }

    /// Declare a texture without a backing store. Uploads fail until
    /// [`allocate`](Self::allocate) is called.
    pub fn unallocated(width: u32, height: u32) -> Self {
        Self {
            size: Size::new(width, height),
            store: None,
        }
    }

    pub fn from_image(image: image::RgbaImage) -> Self {
        Self {
            size: Size::new(image.width(), image.height()),
            store: Some(image),
        }
    }

    pub fn allocate(&mut self) {
        if self.store.is_none() {
            self.store = Some(image::RgbaImage::new(self.size.width, self.size.height));
        }
    }

    pub fn is_allocated(&self) -> bool {
        self.store.is_some()
    }

    pub fn image(&self) -> Option<&image::RgbaImage> {
        self.store.as_ref()
    }

    /// All pixels in row-major order, `None` when unallocated.
    pub fn pixels(&self) -> Option<Vec<Color>> {
        self.store
            .as_ref()
            .map(|image| image.pixels().map(|p| Color::from(*p)).collect())
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Color> {
        self.store
            .as_ref()?
            .get_pixel_checked(x, y)
            .map(|p| Color::from(*p))
    }
}

impl PixelTexture for CpuTexture {
    fn size(&self) -> Size {
        self.size
    }

    fn set_data(&mut self, colors: &[Color]) -> Result<(), TextureError> {
        let image = self
            .store
            .as_mut()
            .ok_or(TextureError::UninitializedResource)?;
        check_len(self.size, colors)?;
        let store: &mut [u8] = &mut *image;
        store.copy_from_slice(bytemuck::cast_slice(colors));
        Ok(())
    }
}

/// A sampled `wgpu` texture owned by the caller.
///
/// Must stay on the thread running the game loop; uploads go through the
/// loop's queue and assume nobody else writes the texture meanwhile.
#[derive(Debug, Clone)]
pub struct GpuTexture {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    sampler: wgpu::Sampler,
    device: wgpu::Device,
    queue: wgpu::Queue,
    size: Size,
}

impl GpuTexture {
    pub const FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;

    /// Create an empty texture on the game's graphics device.
    ///
    /// Fails with [`TextureError::UninitializedResource`] while the device is
    /// not up yet, i.e. before the game started running. Zero dimensions are
    /// raised to one, as the device cannot create empty textures; `size()`
    /// reports the raised value, so `custom(g, 0, 3)` takes 3 colours.
    pub fn custom(
        graphics: &GraphicsHandle,
        width: u32,
        height: u32,
    ) -> Result<Self, TextureError> {
        let graphics = graphics.get().ok_or(TextureError::UninitializedResource)?;
        let size = Size::new(width.max(1), height.max(1));
        let texture = graphics.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("custom pixel texture"),
            size: extent(size),
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: Self::FORMAT,
            usage: wgpu::TextureUsages::TEXTURE_BINDING
                | wgpu::TextureUsages::COPY_DST
                | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = create_default_sampler(&graphics.device);
        Ok(Self {
            texture,
            view,
            sampler,
            device: graphics.device.clone(),
            queue: graphics.queue.clone(),
            size,
        })
    }

    pub fn texture(&self) -> &wgpu::Texture {
        &self.texture
    }

    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }

    pub fn sampler(&self) -> &wgpu::Sampler {
        &self.sampler
    }

    /// Copy the base level back to main memory, row-major.
    ///
    /// Blocks until the GPU finished every submitted write, including pending
    /// uploads. Meant for tests and screenshots, not per-frame use.
    pub fn read_pixels(&self) -> anyhow::Result<Vec<Color>> {
        let row_bytes = 4 * self.size.width;
        let padded_row_bytes = row_bytes.div_ceil(wgpu::COPY_BYTES_PER_ROW_ALIGNMENT)
            * wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
        let output_buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("pixel readback buffer"),
            size: (padded_row_bytes * self.size.height) as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Readback Encoder"),
            });
        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                aspect: wgpu::TextureAspect::All,
                texture: &self.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: &output_buffer,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(padded_row_bytes),
                    rows_per_image: Some(self.size.height),
                },
            },
            extent(self.size),
        );
        self.queue.submit(std::iter::once(encoder.finish()));

        let (tx, rx) = futures_intrusive::channel::shared::oneshot_channel();
        let buffer_slice = output_buffer.slice(..);
        buffer_slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });
        // The mapping callback only runs once the device is polled.
        self.device.poll(wgpu::PollType::Wait {
            submission_index: None,
            timeout: Some(std::time::Duration::from_secs(3)),
        })?;
        futures::executor::block_on(rx.receive())
            .context("readback buffer mapping was cancelled")??;

        let pixels = {
            let data = buffer_slice.get_mapped_range();
            data.chunks_exact(padded_row_bytes as usize)
                .flat_map(|row| bytemuck::cast_slice::<u8, Color>(&row[..row_bytes as usize]))
                .copied()
                .collect()
        };
        output_buffer.unmap();
        Ok(pixels)
    }
}

impl PixelTexture for GpuTexture {
    fn size(&self) -> Size {
        self.size
    }

    fn set_data(&mut self, colors: &[Color]) -> Result<(), TextureError> {
        check_len(self.size, colors)?;
        self.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                aspect: wgpu::TextureAspect::All,
                texture: &self.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
            },
            bytemuck::cast_slice(colors),
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * self.size.width),
                rows_per_image: Some(self.size.height),
            },
            extent(self.size),
        );
        Ok(())
    }
}

fn extent(size: Size) -> wgpu::Extent3d {
    wgpu::Extent3d {
        width: size.width,
        height: size.height,
        depth_or_array_layers: 1,
    }
}

pub fn create_default_sampler(device: &wgpu::Device) -> wgpu::Sampler {
    device.create_sampler(&wgpu::SamplerDescriptor {
        address_mode_u: wgpu::AddressMode::ClampToEdge,
        address_mode_v: wgpu::AddressMode::ClampToEdge,
        address_mode_w: wgpu::AddressMode::ClampToEdge,
        mag_filter: wgpu::FilterMode::Linear,
        min_filter: wgpu::FilterMode::Linear,
        ..Default::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn size_converts_for_math_and_counts_pixels() {
        let size = Size::from((320, 200));
        assert_eq!(size.pixel_count(), 64_000);
        assert_eq!(size.to_vector2(), cgmath::Vector2::new(320.0, 200.0));
        assert_eq!(Size::default().pixel_count(), 0);
    }

    #[test]
    fn cpu_upload_is_checked_before_allocation_state_changes() {
        let mut texture = CpuTexture::unallocated(2, 2);
        assert_eq!(
            texture.set_data(&[Color::RED; 3]),
            Err(TextureError::UninitializedResource)
        );
        assert!(!texture.is_allocated());
        texture.allocate();
        assert_eq!(
            texture.set_data(&[Color::RED; 3]),
            Err(TextureError::InvalidBufferSize {
                expected: 4,
                actual: 3
            })
        );
        assert_eq!(texture.pixels(), Some(vec![Color::TRANSPARENT; 4]));
    }
}
