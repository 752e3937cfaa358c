/// Image decoding into premultiplied RGBA8.
pub mod decode;
/// Caption font discovery and loading.
pub mod font;
