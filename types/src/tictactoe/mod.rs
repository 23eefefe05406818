mod board;
mod constants;
mod error;
mod game;
mod stats;

pub use board::*;
pub use constants::*;
pub use error::*;
pub use game::*;
pub use stats::*;

#[cfg(test)]
mod tests;
