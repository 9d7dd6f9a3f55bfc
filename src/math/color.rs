/// Splits a 0xRRGGBB value into normalized sRGB components
pub const fn hex_to_rgb(hex: u32) -> [f32; 3] {
    [
        ((hex >> 16) & 0xff) as f32 / 255.0,
        ((hex >> 8) & 0xff) as f32 / 255.0,
        (hex & 0xff) as f32 / 255.0,
    ]
}

/// Converts one sRGB-encoded channel to linear
pub fn srgb_channel_to_linear(c: f32) -> f32 {
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

pub fn srgb_to_linear(rgb: [f32; 3]) -> [f32; 3] {
    rgb.map(srgb_channel_to_linear)
}
