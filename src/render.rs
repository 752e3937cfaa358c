/// Reel frame composition.
pub mod frame;
pub(crate) mod glow;
pub(crate) mod paint;
/// Drawing surface and frame snapshots.
pub mod surface;
pub(crate) mod text;
