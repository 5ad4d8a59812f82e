//! Model architecture built with Burn.

pub mod xception;

pub use xception::{SeparableConv2d, Xception, XceptionBlock, XceptionConfig};
