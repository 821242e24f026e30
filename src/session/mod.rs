pub mod history;
pub mod route;

pub use history::HistoryReplaySession;
pub use route::{RouteReplaySession, RouteSessionOptions};
