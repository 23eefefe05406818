//! Tic-tac-toe rules.
//!
//! Pure functions over [Board]: decoding a requested move, checking that it
//! targets a free cell, and classifying a board as won, drawn, or still open.
//! The escrow and turn bookkeeping lives in the layer handlers.


use tictactoe_types::tictactoe::{Board, Cell, GameError, Mark};

/// The 8 winning lines: rows, columns, then diagonals.
pub const LINES: [[usize; 3]; 8] = [
    [0, 1, 2],
    [3, 4, 5],
    [6, 7, 8],
    [0, 3, 6],
    [1, 4, 7],
    [2, 5, 8],
    [0, 4, 8],
    [2, 4, 6],
];

/// State of a board after a move.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// No line complete and at least one empty cell.
    Continue,
    /// A line of three of this mark.
    Win(Mark),
    /// Board full with no line complete.
    Draw,
}

/// Decodes a raw move, rejecting indices outside the board and unknown marks.
pub fn parse_move(move_index: u8, mark: u8) -> Result<(Cell, Mark), GameError> {
    let cell = Cell::new(move_index as usize)
        .ok_or(GameError::InvalidMove("cell index out of range"))?;
    let mark = Mark::try_from(mark).map_err(|_| GameError::InvalidMove("unknown mark"))?;
    Ok((cell, mark))
}

/// Ensures `cell` is empty on `board`.
pub fn ensure_vacant(board: &Board, cell: Cell) -> Result<(), GameError> {
    if !board.is_empty_at(cell.index()) {
        return Err(GameError::InvalidMove("cell is occupied"));
    }
    Ok(())
}

/// Mark occupying a complete line, if any.
pub fn winning_mark(board: &Board) -> Option<Mark> {
    LINES.iter().find_map(|[a, b, c]| {
        let mark = board.get(*a)?;
        (board.get(*b) == Some(mark) && board.get(*c) == Some(mark)).then_some(mark)
    })
}

pub fn is_full(board: &Board) -> bool {
    board.cells().iter().all(Option::is_some)
}

/// Classifies a board. A win takes precedence over a full board.
pub fn evaluate(board: &Board) -> Outcome {
    if let Some(mark) = winning_mark(board) {
        return Outcome::Win(mark);
    }
    if is_full(board) {
        return Outcome::Draw;
    }
    Outcome::Continue
}
