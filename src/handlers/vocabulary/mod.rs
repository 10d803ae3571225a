pub mod words;

pub use words::vocabulary_router;
