//! Grid representation and the Game of Life update rule.
//!
//! This module knows nothing about workers or files; `store`, `exchange`
//! and `engine` build on it.

pub mod grid;
pub mod stepping;
pub mod toroidal;

pub use grid::{BitGrid, ALIVE_CELL, DEAD_CELL};
pub use stepping::{count_neighbors, next_state, step_interior, step_toroidal};
pub use toroidal::{wrap, ToroidalView, ToroidalViewMut};
