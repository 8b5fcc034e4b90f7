//! Weighted font matching: score queries against candidates, sort whole
//! font sets, and compose the render pattern for the winner.

pub mod matcher;
pub mod render;
pub mod sort;
pub mod weight;

pub use matcher::{match_best, score, Priority, Score};
pub use render::prepare_render;
pub use sort::sort;
