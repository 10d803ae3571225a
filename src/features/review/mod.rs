pub mod error_conversions;
pub mod error_responses;
pub mod queue;
pub mod scheduler;
pub mod service;
pub mod session;
pub mod store;

pub use queue::QueueFilter;
pub use service::ReviewService;
pub use store::WordStore;
