use super::super::*;
use crate::tictactoe::{ensure_vacant, evaluate, parse_move, Outcome};
use tictactoe_types::tictactoe::{Game, Phase};

impl<'a, S: State> Layer<'a, S> {
    // === Game Operations ===

    /// Opens a game, escrowing `bet_amount` from `caller` and placing the opening mark.
    ///
    /// Returns the new game id. Emits `GameCreated` then the escrow `Transfer`.
    pub async fn create_game(
        &mut self,
        caller: &PublicKey,
        bet_amount: u64,
        move_index: u8,
        mark: u8,
    ) -> Result<Receipt<u64>, GameError> {
        if bet_amount == 0 {
            return Err(GameError::InvalidBet);
        }
        let (cell, mark) = parse_move(move_index, mark)?;

        // Last fallible step: nothing is staged before the stake is secured
        let house = self.house.clone();
        let escrow = self.transfer(caller, &house, bet_amount).await?;

        let game_id = self.next_game_id().await;
        let game = Game::new(caller.clone(), bet_amount, cell, mark);
        self.insert(Key::Game(game_id), Value::Game(game.clone()));
        self.insert(Key::GameCounter, Value::GameCounter(game_id + 1));

        debug!(game_id, bet_amount, "game created");
        Ok(Receipt::new(
            game_id,
            vec![Event::GameCreated { game_id, game }, escrow],
        ))
    }

    /// Takes the second seat of a waiting game, matching its stake.
    ///
    /// The joining move must use the mark opposite to the opening mark.
    pub async fn join_game(
        &mut self,
        caller: &PublicKey,
        game_id: u64,
        move_index: u8,
        mark: u8,
    ) -> Result<Receipt<()>, GameError> {
        let mut game = self.load_game(game_id).await?;
        if game.player_two.is_some() {
            return Err(GameError::AlreadyJoined);
        }
        let (cell, mark) = parse_move(move_index, mark)?;
        if mark != game.player_two_mark() {
            return Err(GameError::InvalidMove("mark must oppose the opening mark"));
        }
        ensure_vacant(&game.board, cell)?;

        let house = self.house.clone();
        let escrow = self.transfer(caller, &house, game.bet_amount).await?;

        game.player_two = Some(caller.clone());
        game.board.place(cell, mark);
        game.is_player_one_turn = true;
        self.insert(Key::Game(game_id), Value::Game(game.clone()));

        debug!(game_id, "game joined");
        Ok(Receipt::new(
            (),
            vec![Event::GameJoined { game_id, game }, escrow],
        ))
    }

    /// Places a mark in an active game, settling it if the move wins or fills the board.
    ///
    /// The turn flag flips on every accepted move, including the one that ends
    /// the game.
    pub async fn play(
        &mut self,
        caller: &PublicKey,
        game_id: u64,
        move_index: u8,
        mark: u8,
    ) -> Result<Receipt<()>, GameError> {
        let mut game = self.load_game(game_id).await?;
        if game.phase() != Phase::Active {
            return Err(GameError::GameNotActive);
        }
        let (cell, mark) = parse_move(move_index, mark)?;
        if game.player_to_move() != Some(caller) {
            return Err(GameError::InvalidMove("not your turn"));
        }
        let expected = if game.is_player_one_turn {
            game.player_one_mark
        } else {
            game.player_two_mark()
        };
        if mark != expected {
            return Err(GameError::InvalidMove("mark does not belong to the mover"));
        }
        ensure_vacant(&game.board, cell)?;

        game.board.place(cell, mark);
        game.is_player_one_turn = !game.is_player_one_turn;
        let transfers = match evaluate(&game.board) {
            Outcome::Continue => Vec::new(),
            Outcome::Win(mark) => self.settle_win(game_id, &mut game, mark).await?,
            Outcome::Draw => self.settle_draw(game_id, &mut game).await?,
        };
        self.insert(Key::Game(game_id), Value::Game(game.clone()));

        let mut events = Vec::with_capacity(1 + transfers.len());
        events.push(Event::MovePlayed {
            game_id,
            player: caller.clone(),
            move_index,
            mark,
            game,
        });
        events.extend(transfers);
        Ok(Receipt::new((), events))
    }

    async fn load_game(&self, game_id: u64) -> Result<Game, GameError> {
        match self.get(&Key::Game(game_id)).await {
            Some(Value::Game(game)) => Ok(game),
            _ => Err(GameError::GameNotFound),
        }
    }

    async fn next_game_id(&self) -> u64 {
        match self.get(&Key::GameCounter).await {
            Some(Value::GameCounter(next)) => next,
            _ => 0,
        }
    }
}
