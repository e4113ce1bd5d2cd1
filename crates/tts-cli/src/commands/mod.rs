//! CLI command implementations.

pub mod frontend;
pub mod info;
pub mod inspect;
pub mod synth;
