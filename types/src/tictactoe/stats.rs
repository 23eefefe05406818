use bytes::{Buf, BufMut};
use commonware_codec::{Error, FixedSize, Read, ReadExt, Write};

/// Lifetime results of one address. Created on the first settlement it takes part in.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PlayerStats {
    pub wins: u64,
    pub losses: u64,
    pub draws: u64,
    pub total_games: u64,
}

impl PlayerStats {
    pub fn record_win(&mut self) {
        self.wins += 1;
        self.total_games += 1;
    }

    pub fn record_loss(&mut self) {
        self.losses += 1;
        self.total_games += 1;
    }

    pub fn record_draw(&mut self) {
        self.draws += 1;
        self.total_games += 1;
    }

    /// Share of completed games won, in basis points (0 when no games were completed).
    pub fn win_rate_bps(&self) -> u64 {
        if self.total_games == 0 {
            return 0;
        }
        self.wins.saturating_mul(10_000) / self.total_games
    }
}

impl Write for PlayerStats {
    fn write(&self, writer: &mut impl BufMut) {
        self.wins.write(writer);
        self.losses.write(writer);
        self.draws.write(writer);
        self.total_games.write(writer);
    }
}

impl Read for PlayerStats {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        Ok(Self {
            wins: u64::read(reader)?,
            losses: u64::read(reader)?,
            draws: u64::read(reader)?,
            total_games: u64::read(reader)?,
        })
    }
}

impl FixedSize for PlayerStats {
    const SIZE: usize = u64::SIZE * 4;
}
