mod color;

pub use color::{hex_to_rgb, srgb_channel_to_linear, srgb_to_linear};
