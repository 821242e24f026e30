pub mod buffer;
pub mod clock;
pub mod player;

pub use buffer::{EventBuffer, DEFAULT_BATCH_SIZE, DEFAULT_BUFFER_THRESHOLD};
pub use clock::ReplayClock;
pub use player::{
    HistoryPlayer, ReplayEventsObserver, DEFAULT_IDLE_INTERVAL, DEFAULT_TICK_INTERVAL,
};
