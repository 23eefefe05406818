use bytes::{Buf, BufMut};
use commonware_codec::{Error, FixedSize, Read, ReadExt, Write};

use super::{BOARD_CELLS, CELL_EMPTY, CELL_O, CELL_X};

/// A player's symbol for the duration of one game.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Mark {
    X = CELL_X,
    O = CELL_O,
}

impl Mark {
    /// The mark the opponent is forced to use.
    pub fn opponent(self) -> Self {
        match self {
            Self::X => Self::O,
            Self::O => Self::X,
        }
    }
}

impl TryFrom<u8> for Mark {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            CELL_X => Ok(Self::X),
            CELL_O => Ok(Self::O),
            other => Err(other),
        }
    }
}

impl Write for Mark {
    fn write(&self, writer: &mut impl BufMut) {
        (*self as u8).write(writer);
    }
}

impl Read for Mark {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let value = u8::read(reader)?;
        Self::try_from(value).map_err(Error::InvalidEnum)
    }
}

impl FixedSize for Mark {
    const SIZE: usize = 1;
}

/// Index of a board cell, guaranteed to be below [BOARD_CELLS].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct Cell(usize);

impl Cell {
    /// Returns `None` for indices outside the board.
    pub fn new(index: usize) -> Option<Self> {
        (index < BOARD_CELLS).then_some(Self(index))
    }

    pub fn index(self) -> usize {
        self.0
    }
}

/// Row-major 3x3 board. `None` is an empty cell.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Board {
    cells: [Option<Mark>; BOARD_CELLS],
}

impl Board {
    /// A board with a single opening mark.
    pub fn with_opening(cell: Cell, mark: Mark) -> Self {
        let mut board = Self::default();
        board.place(cell, mark);
        board
    }

    /// Returns the content of a cell, `None` if empty or out of range.
    pub fn get(&self, index: usize) -> Option<Mark> {
        self.cells.get(index).copied().flatten()
    }

    pub fn is_empty_at(&self, index: usize) -> bool {
        matches!(self.cells.get(index), Some(None))
    }

    /// Writes a mark into a cell. Callers check vacancy first.
    pub fn place(&mut self, cell: Cell, mark: Mark) {
        self.cells[cell.index()] = Some(mark);
    }

    pub fn cells(&self) -> &[Option<Mark>; BOARD_CELLS] {
        &self.cells
    }

    /// Cells in their encoded form (0 = empty, 1 = X, 2 = O).
    pub fn to_codes(&self) -> [u8; BOARD_CELLS] {
        self.cells
            .map(|cell| cell.map(|mark| mark as u8).unwrap_or(CELL_EMPTY))
    }
}

impl Write for Board {
    fn write(&self, writer: &mut impl BufMut) {
        for code in self.to_codes() {
            code.write(writer);
        }
    }
}

impl Read for Board {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let mut cells = [None; BOARD_CELLS];
        for cell in cells.iter_mut() {
            *cell = match u8::read(reader)? {
                CELL_EMPTY => None,
                code => Some(Mark::try_from(code).map_err(Error::InvalidEnum)?),
            };
        }
        Ok(Self { cells })
    }
}

impl FixedSize for Board {
    const SIZE: usize = BOARD_CELLS;
}
