//! Foreign model formats.

pub mod lightgbm;
