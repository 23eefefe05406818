use bytes::{Buf, BufMut};
use commonware_codec::{EncodeSize, Error, Read, ReadExt, Write};
use commonware_cryptography::ed25519::PublicKey;

use super::{Board, Cell, Mark};

/// Where a game sits in its lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    /// Created, waiting for a second player.
    Waiting,
    /// Both players staked; moves are accepted.
    Active,
    /// Winner recorded (a player, or the house on a draw). Immutable.
    Finished,
}

/// Escrowed two-player game.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Game {
    pub player_one: PublicKey,
    pub player_two: Option<PublicKey>,
    pub bet_amount: u64,
    pub board: Board,
    /// Mark chosen by player one's opening move. Player two plays the opposite.
    pub player_one_mark: Mark,
    pub is_player_one_turn: bool,
    pub winner: Option<PublicKey>,
}

impl Game {
    /// A freshly created game: player one has already placed their opening mark.
    pub fn new(player_one: PublicKey, bet_amount: u64, opening: Cell, mark: Mark) -> Self {
        Self {
            player_one,
            player_two: None,
            bet_amount,
            board: Board::with_opening(opening, mark),
            player_one_mark: mark,
            is_player_one_turn: false,
            winner: None,
        }
    }

    pub fn phase(&self) -> Phase {
        match (&self.player_two, &self.winner) {
            (_, Some(_)) => Phase::Finished,
            (None, None) => Phase::Waiting,
            (Some(_), None) => Phase::Active,
        }
    }

    pub fn player_two_mark(&self) -> Mark {
        self.player_one_mark.opponent()
    }

    /// The participant owning a mark (player two only once joined).
    pub fn owner_of(&self, mark: Mark) -> Option<&PublicKey> {
        if mark == self.player_one_mark {
            Some(&self.player_one)
        } else {
            self.player_two.as_ref()
        }
    }

    /// The player whose turn it is, if the game is active.
    pub fn player_to_move(&self) -> Option<&PublicKey> {
        if self.phase() != Phase::Active {
            return None;
        }
        if self.is_player_one_turn {
            Some(&self.player_one)
        } else {
            self.player_two.as_ref()
        }
    }

    /// Funds currently held in escrow for this game.
    pub fn escrowed(&self) -> u64 {
        match self.phase() {
            Phase::Finished => 0,
            Phase::Waiting => self.bet_amount,
            Phase::Active => self.bet_amount.saturating_mul(2),
        }
    }
}

impl Write for Game {
    fn write(&self, writer: &mut impl BufMut) {
        self.player_one.write(writer);
        self.player_two.write(writer);
        self.bet_amount.write(writer);
        self.board.write(writer);
        self.player_one_mark.write(writer);
        self.is_player_one_turn.write(writer);
        self.winner.write(writer);
    }
}

impl Read for Game {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        Ok(Self {
            player_one: PublicKey::read(reader)?,
            player_two: Option::<PublicKey>::read(reader)?,
            bet_amount: u64::read(reader)?,
            board: Board::read(reader)?,
            player_one_mark: Mark::read(reader)?,
            is_player_one_turn: bool::read(reader)?,
            winner: Option::<PublicKey>::read(reader)?,
        })
    }
}

impl EncodeSize for Game {
    fn encode_size(&self) -> usize {
        self.player_one.encode_size()
            + self.player_two.encode_size()
            + self.bet_amount.encode_size()
            + self.board.encode_size()
            + self.player_one_mark.encode_size()
            + self.is_player_one_turn.encode_size()
            + self.winner.encode_size()
    }
}
