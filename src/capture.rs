/// Frame clocks and cancellation.
pub mod clock;
/// Session state and the capture loop.
pub mod session;
