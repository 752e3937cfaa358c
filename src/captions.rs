/// Timed caption schedule built from a script.
pub mod schedule;
/// Topic to caption-script expansion.
pub mod script;
