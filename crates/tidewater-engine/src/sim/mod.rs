//! Water surface simulation.
//!
//! A fixed-topology height field integrated on the CPU, plus the random
//! stimulus that keeps it moving. Nothing here knows about the GPU.

mod error;
mod height_field;
mod stimulus;

pub use error::SimError;
pub use height_field::{grid_indices, HeightField, WaveParams};
pub use stimulus::{Disturbance, Stimulus, StimulusConfig};
