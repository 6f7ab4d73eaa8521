//! System instructions for the two generation stages.

pub mod detailed_minutes;
pub mod summary;

pub use detailed_minutes::DETAILED_MINUTES_SYSTEM;
pub use summary::SUMMARY_SYSTEM;
