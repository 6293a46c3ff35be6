//! RGBA8 colours as consumed by texture uploads.
//!
//! [`Color`] is laid out exactly like an `Rgba8Unorm(Srgb)` texel so a colour
//! slice can be handed to the GPU with [`bytemuck::cast_slice`] and no copy.
//! The named constants follow the CSS colour keywords.

use bytemuck::{Pod, Zeroable};

/// A straight (non-premultiplied) RGBA colour with 8 bits per channel.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Pod, Zeroable)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Opaque colour from its three channels.
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 255)
    }

    /// Opaque colour from a `0xRRGGBB` value. Bits above the low 24 are ignored.
    pub const fn from_hex(hex: u32) -> Self {
        Self::rgb(
            ((hex >> 16) & 0xFF) as u8,
            ((hex >> 8) & 0xFF) as u8,
            (hex & 0xFF) as u8,
        )
    }

    pub const TRANSPARENT: Color = Color::new(0, 0, 0, 0);

    pub const ALICE_BLUE: Color = Color::from_hex(0xF0F8FF);
    pub const ANTIQUE_WHITE: Color = Color::from_hex(0xFAEBD7);
    pub const AQUA: Color = Color::from_hex(0x00FFFF);
    pub const AQUAMARINE: Color = Color::from_hex(0x7FFFD4);
    pub const AZURE: Color = Color::from_hex(0xF0FFFF);
    pub const BEIGE: Color = Color::from_hex(0xF5F5DC);
    pub const BISQUE: Color = Color::from_hex(0xFFE4C4);
    pub const BLACK: Color = Color::from_hex(0x000000);
    pub const BLANCHED_ALMOND: Color = Color::from_hex(0xFFEBCD);
    pub const BLUE: Color = Color::from_hex(0x0000FF);
    pub const BLUE_VIOLET: Color = Color::from_hex(0x8A2BE2);
    pub const BROWN: Color = Color::from_hex(0xA52A2A);
    pub const BURLY_WOOD: Color = Color::from_hex(0xDEB887);
    pub const CADET_BLUE: Color = Color::from_hex(0x5F9EA0);
    pub const CHARTREUSE: Color = Color::from_hex(0x7FFF00);
    pub const CHOCOLATE: Color = Color::from_hex(0xD2691E);
    pub const CORAL: Color = Color::from_hex(0xFF7F50);
    pub const CORNFLOWER_BLUE: Color = Color::from_hex(0x6495ED);
    pub const CORNSILK: Color = Color::from_hex(0xFFF8DC);
    pub const CRIMSON: Color = Color::from_hex(0xDC143C);
    pub const CYAN: Color = Color::from_hex(0x00FFFF);
    pub const DARK_BLUE: Color = Color::from_hex(0x00008B);
    pub const DARK_CYAN: Color = Color::from_hex(0x008B8B);
    pub const DARK_GOLDEN_ROD: Color = Color::from_hex(0xB8860B);
    pub const DARK_GRAY: Color = Color::from_hex(0xA9A9A9);
    pub const DARK_GREY: Color = Color::from_hex(0xA9A9A9);
    pub const DARK_GREEN: Color = Color::from_hex(0x006400);
    pub const DARK_KHAKI: Color = Color::from_hex(0xBDB76B);
    pub const DARK_MAGENTA: Color = Color::from_hex(0x8B008B);
    pub const DARK_OLIVE_GREEN: Color = Color::from_hex(0x556B2F);
    pub const DARK_ORANGE: Color = Color::from_hex(0xFF8C00);
    pub const DARK_ORCHID: Color = Color::from_hex(0x9932CC);
    pub const DARK_RED: Color = Color::from_hex(0x8B0000);
    pub const DARK_SALMON: Color = Color::from_hex(0xE9967A);
    pub const DARK_SEA_GREEN: Color = Color::from_hex(0x8FBC8F);
    pub const DARK_SLATE_BLUE: Color = Color::from_hex(0x483D8B);
    pub const DARK_SLATE_GRAY: Color = Color::from_hex(0x2F4F4F);
    pub const DARK_SLATE_GREY: Color = Color::from_hex(0x2F4F4F);
    pub const DARK_TURQUOISE: Color = Color::from_hex(0x00CED1);
    pub const DARK_VIOLET: Color = Color::from_hex(0x9400D3);
    pub const DEEP_PINK: Color = Color::from_hex(0xFF1493);
    pub const DEEP_SKY_BLUE: Color = Color::from_hex(0x00BFFF);
    pub const DIM_GRAY: Color = Color::from_hex(0x696969);
    pub const DIM_GREY: Color = Color::from_hex(0x696969);
    pub const DODGER_BLUE: Color = Color::from_hex(0x1E90FF);
    pub const FIRE_BRICK: Color = Color::from_hex(0xB22222);
    pub const FLORAL_WHITE: Color = Color::from_hex(0xFFFAF0);
    pub const FOREST_GREEN: Color = Color::from_hex(0x228B22);
    pub const FUCHSIA: Color = Color::from_hex(0xFF00FF);
    pub const GAINSBORO: Color = Color::from_hex(0xDCDCDC);
    pub const GHOST_WHITE: Color = Color::from_hex(0xF8F8FF);
    pub const GOLD: Color = Color::from_hex(0xFFD700);
    pub const GOLDEN_ROD: Color = Color::from_hex(0xDAA520);
    pub const GRAY: Color = Color::from_hex(0x808080);
    pub const GREY: Color = Color::from_hex(0x808080);
    pub const GREEN: Color = Color::from_hex(0x008000);
    pub const GREEN_YELLOW: Color = Color::from_hex(0xADFF2F);
    pub const HONEY_DEW: Color = Color::from_hex(0xF0FFF0);
    pub const HOT_PINK: Color = Color::from_hex(0xFF69B4);
    pub const INDIAN_RED: Color = Color::from_hex(0xCD5C5C);
    pub const INDIGO: Color = Color::from_hex(0x4B0082);
    pub const IVORY: Color = Color::from_hex(0xFFFFF0);
    pub const KHAKI: Color = Color::from_hex(0xF0E68C);
    pub const LAVENDER: Color = Color::from_hex(0xE6E6FA);
    pub const LAVENDER_BLUSH: Color = Color::from_hex(0xFFF0F5);
    pub const LAWN_GREEN: Color = Color::from_hex(0x7CFC00);
    pub const LEMON_CHIFFON: Color = Color::from_hex(0xFFFACD);
    pub const LIGHT_BLUE: Color = Color::from_hex(0xADD8E6);
    pub const LIGHT_CORAL: Color = Color::from_hex(0xF08080);
    pub const LIGHT_CYAN: Color = Color::from_hex(0xE0FFFF);
    pub const LIGHT_GOLDEN_ROD_YELLOW: Color = Color::from_hex(0xFAFAD2);
    pub const LIGHT_GRAY: Color = Color::from_hex(0xD3D3D3);
    pub const LIGHT_GREY: Color = Color::from_hex(0xD3D3D3);
    pub const LIGHT_GREEN: Color = Color::from_hex(0x90EE90);
    pub const LIGHT_PINK: Color = Color::from_hex(0xFFB6C1);
    pub const LIGHT_SALMON: Color = Color::from_hex(0xFFA07A);
    pub const LIGHT_SEA_GREEN: Color = Color::from_hex(0x20B2AA);
    pub const LIGHT_SKY_BLUE: Color = Color::from_hex(0x87CEFA);
    pub const LIGHT_SLATE_GRAY: Color = Color::from_hex(0x778899);
    pub const LIGHT_SLATE_GREY: Color = Color::from_hex(0x778899);
    pub const LIGHT_STEEL_BLUE: Color = Color::from_hex(0xB0C4DE);
    pub const LIGHT_YELLOW: Color = Color::from_hex(0xFFFFE0);
    pub const LIME: Color = Color::from_hex(0x00FF00);
    pub const LIME_GREEN: Color = Color::from_hex(0x32CD32);
    pub const LINEN: Color = Color::from_hex(0xFAF0E6);
    pub const MAGENTA: Color = Color::from_hex(0xFF00FF);
    pub const MAROON: Color = Color::from_hex(0x800000);
    pub const MEDIUM_AQUA_MARINE: Color = Color::from_hex(0x66CDAA);
    pub const MEDIUM_BLUE: Color = Color::from_hex(0x0000CD);
    pub const MEDIUM_ORCHID: Color = Color::from_hex(0xBA55D3);
    pub const MEDIUM_PURPLE: Color = Color::from_hex(0x9370DB);
    pub const MEDIUM_SEA_GREEN: Color = Color::from_hex(0x3CB371);
    pub const MEDIUM_SLATE_BLUE: Color = Color::from_hex(0x7B68EE);
    pub const MEDIUM_SPRING_GREEN: Color = Color::from_hex(0x00FA9A);
    pub const MEDIUM_TURQUOISE: Color = Color::from_hex(0x48D1CC);
    pub const MEDIUM_VIOLET_RED: Color = Color::from_hex(0xC71585);
    pub const MIDNIGHT_BLUE: Color = Color::from_hex(0x191970);
    pub const MINT_CREAM: Color = Color::from_hex(0xF5FFFA);
    pub const MISTY_ROSE: Color = Color::from_hex(0xFFE4E1);
    pub const MOCCASIN: Color = Color::from_hex(0xFFE4B5);
    pub const NAVAJO_WHITE: Color = Color::from_hex(0xFFDEAD);
    pub const NAVY: Color = Color::from_hex(0x000080);
    pub const OLD_LACE: Color = Color::from_hex(0xFDF5E6);
    pub const OLIVE: Color = Color::from_hex(0x808000);
    pub const OLIVE_DRAB: Color = Color::from_hex(0x6B8E23);
    pub const ORANGE: Color = Color::from_hex(0xFFA500);
    pub const ORANGE_RED: Color = Color::from_hex(0xFF4500);
    pub const ORCHID: Color = Color::from_hex(0xDA70D6);
    pub const PALE_GOLDEN_ROD: Color = Color::from_hex(0xEEE8AA);
    pub const PALE_GREEN: Color = Color::from_hex(0x98FB98);
    pub const PALE_TURQUOISE: Color = Color::from_hex(0xAFEEEE);
    pub const PALE_VIOLET_RED: Color = Color::from_hex(0xDB7093);
    pub const PAPAYA_WHIP: Color = Color::from_hex(0xFFEFD5);
    pub const PEACH_PUFF: Color = Color::from_hex(0xFFDAB9);
    pub const PERU: Color = Color::from_hex(0xCD853F);
    pub const PINK: Color = Color::from_hex(0xFFC0CB);
    pub const PLUM: Color = Color::from_hex(0xDDA0DD);
    pub const POWDER_BLUE: Color = Color::from_hex(0xB0E0E6);
    pub const PURPLE: Color = Color::from_hex(0x800080);
    pub const REBECCA_PURPLE: Color = Color::from_hex(0x663399);
    pub const RED: Color = Color::from_hex(0xFF0000);
    pub const ROSY_BROWN: Color = Color::from_hex(0xBC8F8F);
    pub const ROYAL_BLUE: Color = Color::from_hex(0x4169E1);
    pub const SADDLE_BROWN: Color = Color::from_hex(0x8B4513);
    pub const SALMON: Color = Color::from_hex(0xFA8072);
    pub const SANDY_BROWN: Color = Color::from_hex(0xF4A460);
    pub const SEA_GREEN: Color = Color::from_hex(0x2E8B57);
    pub const SEA_SHELL: Color = Color::from_hex(0xFFF5EE);
    pub const SIENNA: Color = Color::from_hex(0xA0522D);
    pub const SILVER: Color = Color::from_hex(0xC0C0C0);
    pub const SKY_BLUE: Color = Color::from_hex(0x87CEEB);
    pub const SLATE_BLUE: Color = Color::from_hex(0x6A5ACD);
    pub const SLATE_GRAY: Color = Color::from_hex(0x708090);
    pub const SLATE_GREY: Color = Color::from_hex(0x708090);
    pub const SNOW: Color = Color::from_hex(0xFFFAFA);
    pub const SPRING_GREEN: Color = Color::from_hex(0x00FF7F);
    pub const STEEL_BLUE: Color = Color::from_hex(0x4682B4);
    pub const TAN: Color = Color::from_hex(0xD2B48C);
    pub const TEAL: Color = Color::from_hex(0x008080);
    pub const THISTLE: Color = Color::from_hex(0xD8BFD8);
    pub const TOMATO: Color = Color::from_hex(0xFF6347);
    pub const TURQUOISE: Color = Color::from_hex(0x40E0D0);
    pub const VIOLET: Color = Color::from_hex(0xEE82EE);
    pub const WHEAT: Color = Color::from_hex(0xF5DEB3);
    pub const WHITE: Color = Color::from_hex(0xFFFFFF);
    pub const WHITE_SMOKE: Color = Color::from_hex(0xF5F5F5);
    pub const YELLOW: Color = Color::from_hex(0xFFFF00);
    pub const YELLOW_GREEN: Color = Color::from_hex(0x9ACD32);
}

impl Default for Color {
    fn default() -> Self {
        Color::BLACK
    }
}

impl From<[u8; 4]> for Color {
    fn from([r, g, b, a]: [u8; 4]) -> Self {
        Color::new(r, g, b, a)
    }
}

impl From<Color> for [u8; 4] {
    fn from(color: Color) -> Self {
        [color.r, color.g, color.b, color.a]
    }
}

impl From<image::Rgba<u8>> for Color {
    fn from(pixel: image::Rgba<u8>) -> Self {
        pixel.0.into()
    }
}

impl From<Color> for image::Rgba<u8> {
    fn from(color: Color) -> Self {
        image::Rgba(color.into())
    }
}

/// Channels mapped to `0.0..=1.0`, as the render pass clear colour expects.
impl From<Color> for wgpu::Color {
    fn from(color: Color) -> Self {
        let f = |v: u8| v as f64 / 255.0;
        wgpu::Color {
            r: f(color.r),
            g: f(color.g),
            b: f(color.b),
            a: f(color.a),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_hex_splits_channels() {
        assert_eq!(Color::from_hex(0x6495ED), Color::new(100, 149, 237, 255));
        assert_eq!(Color::CORNFLOWER_BLUE, Color::from_hex(0x6495ED));
        assert_eq!(Color::from_hex(0xFF_000000), Color::BLACK);
    }

    #[test]
    fn transparent_has_zero_alpha() {
        assert_eq!(Color::TRANSPARENT.a, 0);
        assert_eq!(Color::WHITE.a, 255);
    }

    #[test]
    fn colour_slice_is_viewable_as_texel_bytes() {
        let colors = [Color::RED, Color::new(1, 2, 3, 4)];
        let bytes: &[u8] = bytemuck::cast_slice(&colors);
        assert_eq!(bytes, &[255, 0, 0, 255, 1, 2, 3, 4]);
    }

    #[test]
    fn converts_to_unit_range() {
        let c: wgpu::Color = Color::new(255, 0, 51, 255).into();
        assert_eq!(c.r, 1.0);
        assert_eq!(c.g, 0.0);
        assert!((c.b - 0.2).abs() < 1e-9);
        assert_eq!(c.a, 1.0);
    }
}
