pub mod event;
pub mod sequence;

pub use event::{ReplayEvent, ReplayLocation};
pub use sequence::EventSequence;
