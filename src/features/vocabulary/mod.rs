pub mod error_conversions;
pub mod error_responses;
pub mod search;

pub use search::VocabularySearch;
