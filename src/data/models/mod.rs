pub mod auth_models;
pub mod review_models;
pub mod user_models;
pub mod word_models;

pub use auth_models::{LoginError, RegisterError, RegisterForm, LoginForm};
pub use review_models::{
    NewWordReview, ReviewError, ReviewOutcome, ReviewResponse, SessionState,
    StartReviewParams, StoreError, WordStats,
};
pub use user_models::{User, NewUser};
pub use word_models::{
    InvalidValue, NewWord, NewWordRow, SortOrder, VocabularyError, WordLevel,
    WordListParams, WordRecord, WordRow, WordStatus, WordUpdate,
};
