use bytes::{Buf, BufMut};
use commonware_codec::{Encode, EncodeSize, Error, FixedSize, Read, ReadExt, Write};
use commonware_cryptography::{
    ed25519::{self, Batch, PublicKey},
    sha256::{Digest, Sha256},
    BatchVerifier, Digestible, Hasher, Signer, Verifier,
};
use commonware_utils::union;

use crate::tictactoe::{Game, Mark, PlayerStats, MAX_ERROR_MESSAGE_LENGTH};

pub const NAMESPACE: &[u8] = b"_TICTACTOE";
pub const TRANSACTION_SUFFIX: &[u8] = b"_TX";

#[inline]
pub fn transaction_namespace(namespace: &[u8]) -> Vec<u8> {
    union(namespace, TRANSACTION_SUFFIX)
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Transaction {
    pub nonce: u64,
    pub instruction: Instruction,

    pub public: ed25519::PublicKey,
    pub signature: ed25519::Signature,
}

impl Transaction {
    fn payload(nonce: &u64, instruction: &Instruction) -> Vec<u8> {
        let mut payload = Vec::new();
        nonce.write(&mut payload);
        instruction.write(&mut payload);

        payload
    }

    pub fn sign(private: &ed25519::PrivateKey, nonce: u64, instruction: Instruction) -> Self {
        let signature = private.sign(
            Some(&transaction_namespace(NAMESPACE)),
            &Self::payload(&nonce, &instruction),
        );

        Self {
            nonce,
            instruction,
            public: private.public_key(),
            signature,
        }
    }

    pub fn verify(&self) -> bool {
        self.public.verify(
            Some(&transaction_namespace(NAMESPACE)),
            &Self::payload(&self.nonce, &self.instruction),
            &self.signature,
        )
    }

    pub fn verify_batch(&self, batch: &mut Batch) {
        batch.add(
            Some(&transaction_namespace(NAMESPACE)),
            &Self::payload(&self.nonce, &self.instruction),
            &self.public,
            &self.signature,
        );
    }
}

impl Write for Transaction {
    fn write(&self, writer: &mut impl BufMut) {
        self.nonce.write(writer);
        self.instruction.write(writer);
        self.public.write(writer);
        self.signature.write(writer);
    }
}

impl Read for Transaction {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let nonce = u64::read(reader)?;
        let instruction = Instruction::read(reader)?;
        let public = ed25519::PublicKey::read(reader)?;
        let signature = ed25519::Signature::read(reader)?;

        Ok(Self {
            nonce,
            instruction,
            public,
            signature,
        })
    }
}

impl EncodeSize for Transaction {
    fn encode_size(&self) -> usize {
        self.nonce.encode_size()
            + self.instruction.encode_size()
            + self.public.encode_size()
            + self.signature.encode_size()
    }
}

impl Digestible for Transaction {
    type Digest = Digest;

    fn digest(&self) -> Digest {
        let mut hasher = Sha256::new();
        hasher.update(self.nonce.to_be_bytes().as_ref());
        hasher.update(self.instruction.encode().as_ref());
        hasher.update(self.public.as_ref());
        // The signature is excluded (any valid signature authorizes the same transaction)
        hasher.finalize()
    }
}

/// Game instructions.
///
/// `move_index` and `mark` travel as raw integers so that out-of-domain values
/// reach the game rules (and fail with `InvalidMove`) instead of failing to decode.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Instruction {
    /// Open a game, stake `bet_amount`, and place the opening mark.
    /// Binary: [0] [betAmount:u64 BE] [moveIndex:u8] [mark:u8]
    CreateGame {
        bet_amount: u64,
        move_index: u8,
        mark: u8,
    },

    /// Take the second seat of a waiting game, matching its stake.
    /// Binary: [1] [gameId:u64 BE] [moveIndex:u8] [mark:u8]
    JoinGame {
        game_id: u64,
        move_index: u8,
        mark: u8,
    },

    /// Place a mark in an active game.
    /// Binary: [2] [gameId:u64 BE] [moveIndex:u8] [mark:u8]
    Play {
        game_id: u64,
        move_index: u8,
        mark: u8,
    },
}

impl Write for Instruction {
    fn write(&self, writer: &mut impl BufMut) {
        match self {
            Self::CreateGame {
                bet_amount,
                move_index,
                mark,
            } => {
                0u8.write(writer);
                bet_amount.write(writer);
                move_index.write(writer);
                mark.write(writer);
            }
            Self::JoinGame {
                game_id,
                move_index,
                mark,
            } => {
                1u8.write(writer);
                game_id.write(writer);
                move_index.write(writer);
                mark.write(writer);
            }
            Self::Play {
                game_id,
                move_index,
                mark,
            } => {
                2u8.write(writer);
                game_id.write(writer);
                move_index.write(writer);
                mark.write(writer);
            }
        }
    }
}

impl Read for Instruction {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let instruction = match u8::read(reader)? {
            0 => Self::CreateGame {
                bet_amount: u64::read(reader)?,
                move_index: u8::read(reader)?,
                mark: u8::read(reader)?,
            },
            1 => Self::JoinGame {
                game_id: u64::read(reader)?,
                move_index: u8::read(reader)?,
                mark: u8::read(reader)?,
            },
            2 => Self::Play {
                game_id: u64::read(reader)?,
                move_index: u8::read(reader)?,
                mark: u8::read(reader)?,
            },

            i => return Err(Error::InvalidEnum(i)),
        };

        Ok(instruction)
    }
}

impl EncodeSize for Instruction {
    fn encode_size(&self) -> usize {
        // bet_amount or game_id, then move_index and mark
        u8::SIZE + u64::SIZE + u8::SIZE + u8::SIZE
    }
}

/// Per-address ledger account: replay-protection nonce and spendable balance.
#[derive(Clone, Default, Eq, PartialEq, Debug)]
pub struct Account {
    pub nonce: u64,
    pub balance: u64,
}

impl Write for Account {
    fn write(&self, writer: &mut impl BufMut) {
        self.nonce.write(writer);
        self.balance.write(writer);
    }
}

impl Read for Account {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        Ok(Self {
            nonce: u64::read(reader)?,
            balance: u64::read(reader)?,
        })
    }
}

impl FixedSize for Account {
    const SIZE: usize = u64::SIZE + u64::SIZE;
}

#[derive(Hash, Eq, PartialEq, Ord, PartialOrd, Clone, Debug)]
pub enum Key {
    /// Account for nonce and balance tracking (tag 0)
    Account(PublicKey),

    // Game keys (tags 1-3)
    Game(u64),
    GameCounter,
    PlayerStats(PublicKey),
}

impl Write for Key {
    fn write(&self, writer: &mut impl BufMut) {
        match self {
            Self::Account(pk) => {
                0u8.write(writer);
                pk.write(writer);
            }
            Self::Game(id) => {
                1u8.write(writer);
                id.write(writer);
            }
            Self::GameCounter => 2u8.write(writer),
            Self::PlayerStats(pk) => {
                3u8.write(writer);
                pk.write(writer);
            }
        }
    }
}

impl Read for Key {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let key = match u8::read(reader)? {
            0 => Self::Account(PublicKey::read(reader)?),
            1 => Self::Game(u64::read(reader)?),
            2 => Self::GameCounter,
            3 => Self::PlayerStats(PublicKey::read(reader)?),

            i => return Err(Error::InvalidEnum(i)),
        };

        Ok(key)
    }
}

impl EncodeSize for Key {
    fn encode_size(&self) -> usize {
        u8::SIZE
            + match self {
                Self::Account(_) | Self::PlayerStats(_) => PublicKey::SIZE,
                Self::Game(_) => u64::SIZE,
                Self::GameCounter => 0,
            }
    }
}

#[derive(Clone, Eq, PartialEq, Debug)]
pub enum Value {
    /// Account for nonce and balance tracking (tag 0)
    Account(Account),

    // Game values (tags 1, 2, 4)
    Game(Game),
    /// Next game id to allocate.
    GameCounter(u64),
    PlayerStats(PlayerStats),

    // System values
    Commit {
        height: u64,
        start: u64,
    },
}

impl Write for Value {
    fn write(&self, writer: &mut impl BufMut) {
        match self {
            Self::Account(account) => {
                0u8.write(writer);
                account.write(writer);
            }
            Self::Game(game) => {
                1u8.write(writer);
                game.write(writer);
            }
            Self::GameCounter(next) => {
                2u8.write(writer);
                next.write(writer);
            }
            Self::Commit { height, start } => {
                3u8.write(writer);
                height.write(writer);
                start.write(writer);
            }
            Self::PlayerStats(stats) => {
                4u8.write(writer);
                stats.write(writer);
            }
        }
    }
}

impl Read for Value {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let value = match u8::read(reader)? {
            0 => Self::Account(Account::read(reader)?),
            1 => Self::Game(Game::read(reader)?),
            2 => Self::GameCounter(u64::read(reader)?),
            3 => Self::Commit {
                height: u64::read(reader)?,
                start: u64::read(reader)?,
            },
            4 => Self::PlayerStats(PlayerStats::read(reader)?),

            i => return Err(Error::InvalidEnum(i)),
        };

        Ok(value)
    }
}

impl EncodeSize for Value {
    fn encode_size(&self) -> usize {
        u8::SIZE
            + match self {
                Self::Account(account) => account.encode_size(),
                Self::Game(game) => game.encode_size(),
                Self::GameCounter(next) => next.encode_size(),
                Self::Commit { height, start } => height.encode_size() + start.encode_size(),
                Self::PlayerStats(stats) => stats.encode_size(),
            }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    GameCreated {
        game_id: u64,
        game: Game,
    },
    GameJoined {
        game_id: u64,
        game: Game,
    },
    MovePlayed {
        game_id: u64,
        player: PublicKey,
        move_index: u8,
        mark: Mark,
        game: Game,
    },
    /// Funds moved between two accounts (escrow, payout, or refund).
    Transfer {
        sender: PublicKey,
        recipient: PublicKey,
        amount: u64,
    },
    GameError {
        player: PublicKey,
        game_id: Option<u64>,
        error_code: u8,
        message: String,
    },
}

impl Write for Event {
    fn write(&self, writer: &mut impl BufMut) {
        match self {
            Self::GameCreated { game_id, game } => {
                0u8.write(writer);
                game_id.write(writer);
                game.write(writer);
            }
            Self::GameJoined { game_id, game } => {
                1u8.write(writer);
                game_id.write(writer);
                game.write(writer);
            }
            Self::MovePlayed {
                game_id,
                player,
                move_index,
                mark,
                game,
            } => {
                2u8.write(writer);
                game_id.write(writer);
                player.write(writer);
                move_index.write(writer);
                mark.write(writer);
                game.write(writer);
            }
            Self::Transfer {
                sender,
                recipient,
                amount,
            } => {
                3u8.write(writer);
                sender.write(writer);
                recipient.write(writer);
                amount.write(writer);
            }
            Self::GameError {
                player,
                game_id,
                error_code,
                message,
            } => {
                4u8.write(writer);
                player.write(writer);
                game_id.write(writer);
                error_code.write(writer);
                (message.len() as u32).write(writer);
                writer.put_slice(message.as_bytes());
            }
        }
    }
}

impl Read for Event {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let event = match u8::read(reader)? {
            0 => Self::GameCreated {
                game_id: u64::read(reader)?,
                game: Game::read(reader)?,
            },
            1 => Self::GameJoined {
                game_id: u64::read(reader)?,
                game: Game::read(reader)?,
            },
            2 => Self::MovePlayed {
                game_id: u64::read(reader)?,
                player: PublicKey::read(reader)?,
                move_index: u8::read(reader)?,
                mark: Mark::read(reader)?,
                game: Game::read(reader)?,
            },
            3 => Self::Transfer {
                sender: PublicKey::read(reader)?,
                recipient: PublicKey::read(reader)?,
                amount: u64::read(reader)?,
            },
            4 => {
                let player = PublicKey::read(reader)?;
                let game_id = Option::<u64>::read(reader)?;
                let error_code = u8::read(reader)?;
                let message_len = u32::read(reader)? as usize;
                if message_len > MAX_ERROR_MESSAGE_LENGTH {
                    return Err(Error::Invalid("Event", "error message too long"));
                }
                if reader.remaining() < message_len {
                    return Err(Error::EndOfBuffer);
                }
                let mut message_bytes = vec![0u8; message_len];
                reader.copy_to_slice(&mut message_bytes);
                let message = String::from_utf8(message_bytes)
                    .map_err(|_| Error::Invalid("Event", "invalid UTF-8 in error message"))?;
                Self::GameError {
                    player,
                    game_id,
                    error_code,
                    message,
                }
            }

            i => return Err(Error::InvalidEnum(i)),
        };

        Ok(event)
    }
}

impl EncodeSize for Event {
    fn encode_size(&self) -> usize {
        u8::SIZE
            + match self {
                Self::GameCreated { game_id, game } | Self::GameJoined { game_id, game } => {
                    game_id.encode_size() + game.encode_size()
                }
                Self::MovePlayed {
                    game_id,
                    player,
                    move_index,
                    mark,
                    game,
                } => {
                    game_id.encode_size()
                        + player.encode_size()
                        + move_index.encode_size()
                        + mark.encode_size()
                        + game.encode_size()
                }
                Self::Transfer {
                    sender,
                    recipient,
                    amount,
                } => sender.encode_size() + recipient.encode_size() + amount.encode_size(),
                Self::GameError {
                    player,
                    game_id,
                    error_code,
                    message,
                } => {
                    player.encode_size()
                        + game_id.encode_size()
                        + error_code.encode_size()
                        + 4
                        + message.len()
                }
            }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Output {
    Event(Event),
    Transaction(Transaction),
    Commit { height: u64, start: u64 },
}

impl Write for Output {
    fn write(&self, writer: &mut impl BufMut) {
        match self {
            Self::Event(event) => {
                0u8.write(writer);
                event.write(writer);
            }
            Self::Transaction(transaction) => {
                1u8.write(writer);
                transaction.write(writer);
            }
            Self::Commit { height, start } => {
                2u8.write(writer);
                height.write(writer);
                start.write(writer);
            }
        }
    }
}

impl Read for Output {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let kind = u8::read(reader)?;
        match kind {
            0 => Ok(Self::Event(Event::read(reader)?)),
            1 => Ok(Self::Transaction(Transaction::read(reader)?)),
            2 => Ok(Self::Commit {
                height: u64::read(reader)?,
                start: u64::read(reader)?,
            }),
            _ => Err(Error::InvalidEnum(kind)),
        }
    }
}

impl EncodeSize for Output {
    fn encode_size(&self) -> usize {
        1 + match self {
            Self::Event(event) => event.encode_size(),
            Self::Transaction(transaction) => transaction.encode_size(),
            Self::Commit { height, start } => height.encode_size() + start.encode_size(),
        }
    }
}
