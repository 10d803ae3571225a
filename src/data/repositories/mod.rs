pub mod stats;
pub mod user;
pub mod word;

pub use stats::StatsRepository;
pub use user::UserRepository;
pub use word::SqliteWordStore;
