pub mod csv_trace;
pub mod event_source;
pub mod history_file;
pub mod memory;
pub mod route_sim;

pub use csv_trace::CsvTraceSource;
pub use event_source::EventSource;
pub use history_file::HistoryFileSource;
pub use memory::MemoryEventSource;
pub use route_sim::RouteEventSource;
