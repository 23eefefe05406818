/// Number of cells on the 3x3 board
pub const BOARD_CELLS: usize = 9;

/// Encoded value of an empty cell
pub const CELL_EMPTY: u8 = 0;

/// Encoded value of an X cell
pub const CELL_X: u8 = 1;

/// Encoded value of an O cell
pub const CELL_O: u8 = 2;

/// Maximum length of the message carried by a GameError event
pub const MAX_ERROR_MESSAGE_LENGTH: usize = 256;

/// Error codes for GameError events.
///
/// External clients match on these values; never renumber them.
pub const ERROR_INVALID_BET: u8 = 100;
pub const ERROR_INVALID_MOVE: u8 = 101;
pub const ERROR_GAME_NOT_FOUND: u8 = 102;
pub const ERROR_ALREADY_JOINED: u8 = 103;
pub const ERROR_GAME_NOT_ACTIVE: u8 = 104;
pub const ERROR_INSUFFICIENT_FUNDS: u8 = 105;
