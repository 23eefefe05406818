pub mod api;
pub mod execution;
pub mod tictactoe;

pub use execution::*;
