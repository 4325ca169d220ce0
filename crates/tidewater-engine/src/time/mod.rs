//! Time subsystem.
//!
//! Provides stable, testable frame timing utilities without coupling to the renderer.
//! Intended usage:
//! - one `FrameClock` per render loop (`FrameClock::fixed` for headless runs)
//! - call `tick()` once per submitted frame to obtain `FrameTime`

mod frame_clock;

pub use frame_clock::{FrameClock, FrameTime};
