pub mod app;
pub mod cli;
pub mod config;
pub mod generation;
pub mod global;
pub mod meeting;
pub mod prompts;
pub mod storage;
pub mod transcription;
