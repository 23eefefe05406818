pub mod query;
pub mod state_transition;
pub mod tictactoe;

#[cfg(any(test, feature = "mocks"))]
pub mod mocks;

mod layer;

mod state;

pub use layer::{Layer, Receipt};
pub use state::{account, credit, nonce, Adb, Memory, PrepareError, State, Status};
