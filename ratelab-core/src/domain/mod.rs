//! Domain types for RateLab

pub mod action;
pub mod sample;

pub use action::Action;
pub use sample::{first_unordered, IndicatorSample, RawSample};
