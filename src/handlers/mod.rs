pub mod auth;
pub mod pages;
pub mod review;
pub mod vocabulary;
