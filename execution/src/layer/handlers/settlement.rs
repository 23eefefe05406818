use super::super::*;
use tictactoe_types::tictactoe::{Game, Mark, PlayerStats};
use tracing::info;

impl<'a, S: State> Layer<'a, S> {
    // === Funds ===

    /// Moves `amount` from `sender` to `recipient`, failing without staging anything
    /// if `sender` cannot cover it.
    pub(in crate::layer) async fn transfer(
        &mut self,
        sender: &PublicKey,
        recipient: &PublicKey,
        amount: u64,
    ) -> Result<Event, GameError> {
        let mut from = load_account(self, sender).await;
        if from.balance < amount {
            return Err(GameError::InsufficientFunds {
                have: from.balance,
                need: amount,
            });
        }
        from.balance -= amount;
        self.insert(Key::Account(sender.clone()), Value::Account(from));

        // Reload so a transfer to self nets out
        let mut to = load_account(self, recipient).await;
        to.balance = to.balance.saturating_add(amount);
        self.insert(Key::Account(recipient.clone()), Value::Account(to));

        Ok(Event::Transfer {
            sender: sender.clone(),
            recipient: recipient.clone(),
            amount,
        })
    }

    /// Releases escrow to each recipient, checking the house can cover the total first.
    async fn release(&mut self, payouts: &[(PublicKey, u64)]) -> Result<Vec<Event>, GameError> {
        let total = payouts
            .iter()
            .fold(0u64, |acc, (_, amount)| acc.saturating_add(*amount));
        let held = load_account(self, &self.house).await.balance;
        if held < total {
            return Err(GameError::InsufficientFunds {
                have: held,
                need: total,
            });
        }

        let house = self.house.clone();
        let mut events = Vec::with_capacity(payouts.len());
        for (recipient, amount) in payouts {
            events.push(self.transfer(&house, recipient, *amount).await?);
        }
        Ok(events)
    }

    // === Settlement ===

    /// Pays the whole pot to the owner of `mark` and records win/loss.
    pub(in crate::layer) async fn settle_win(
        &mut self,
        game_id: u64,
        game: &mut Game,
        mark: Mark,
    ) -> Result<Vec<Event>, GameError> {
        let (Some(winner), Some(loser)) = (
            game.owner_of(mark).cloned(),
            game.owner_of(mark.opponent()).cloned(),
        ) else {
            return Err(GameError::GameNotActive);
        };

        let pot = game.bet_amount.saturating_mul(2);
        let events = self.release(&[(winner.clone(), pot)]).await?;

        self.update_stats(&winner, PlayerStats::record_win).await;
        self.update_stats(&loser, PlayerStats::record_loss).await;
        game.winner = Some(winner);

        info!(game_id, pot, "game won");
        Ok(events)
    }

    /// Refunds each stake separately, records a draw for both players, and marks
    /// the game closed by recording the house as winner.
    pub(in crate::layer) async fn settle_draw(
        &mut self,
        game_id: u64,
        game: &mut Game,
    ) -> Result<Vec<Event>, GameError> {
        let Some(player_two) = game.player_two.clone() else {
            return Err(GameError::GameNotActive);
        };
        let player_one = game.player_one.clone();

        let events = self
            .release(&[
                (player_one.clone(), game.bet_amount),
                (player_two.clone(), game.bet_amount),
            ])
            .await?;

        self.update_stats(&player_one, PlayerStats::record_draw).await;
        self.update_stats(&player_two, PlayerStats::record_draw).await;
        game.winner = Some(self.house.clone());

        info!(game_id, refund = game.bet_amount, "game drawn");
        Ok(events)
    }

    async fn update_stats(&mut self, player: &PublicKey, record: fn(&mut PlayerStats)) {
        let mut stats = match self.get(&Key::PlayerStats(player.clone())).await {
            Some(Value::PlayerStats(stats)) => stats,
            _ => PlayerStats::default(),
        };
        record(&mut stats);
        self.insert(Key::PlayerStats(player.clone()), Value::PlayerStats(stats));
    }
}
