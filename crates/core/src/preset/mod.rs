//! Presets that turn typed encoder settings into engine commands.

mod audio;

pub use audio::{AudioFormat, AudioPreset};
