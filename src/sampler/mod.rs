//! Periodic stack sampling.
//!
//! - `stack`: frames, samples, per-thread shadow stacks
//! - `pool`: shared fixed-rate scheduler
//! - `session`: the `Sampler` state machine and its `Recording`

pub mod pool;
pub mod session;
pub mod stack;

// Re-export main types
pub use pool::{Periodic, SamplingPool, TaskHandle};
pub use session::{profile, Recording, Sampler};
pub use stack::{enter, enter_at, Frame, FrameGuard, Sample, StackSource, ThreadStack};
