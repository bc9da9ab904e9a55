use super::models::{GameStatistics, PlayerStat};

/// One guess as seen by the statistics
#[derive(Debug, Clone, PartialEq)]
pub struct GuessRecord {
    pub is_correct: bool,
    /// Correct on the player's first guess of the round
    pub is_ace: bool,
    /// Seconds since the round started, only for the player's first guess
    pub reaction_time: Option<f64>,
    /// Player's combo after this guess, 0 when incorrect
    pub streak: u32,
    /// Fuzzy score, only for correct guesses
    pub precision: Option<f64>,
}

impl PlayerStat {
    /// Copy of this record with one more skip vote
    pub fn with_skip(&self) -> PlayerStat {
        PlayerStat {
            nb_skips: self.nb_skips + 1,
            ..self.clone()
        }
    }

    /// Copy of this record with the guess applied
    ///
    /// Reaction time is averaged over timed samples, precision over correct
    /// guesses.
    pub fn with_guess(&self, guess: &GuessRecord) -> PlayerStat {
        let mut next = self.clone();
        next.nb_guesses += 1;

        if let Some(reaction_time) = guess.reaction_time {
            let played = self.nb_samples_played as f64;
            next.nb_samples_played += 1;
            next.reaction_time =
                (self.reaction_time * played + reaction_time) / next.nb_samples_played as f64;
        }

        if guess.is_correct {
            next.nb_correct_guesses += 1;
        }
        if guess.is_ace {
            next.nb_aces += 1;
        }
        next.max_streak = self.max_streak.max(guess.streak);

        if let Some(precision) = guess.precision {
            let correct = self.nb_correct_guesses as f64;
            next.precision = (self.precision * correct + precision) / (correct + 1.0);
        }

        next
    }
}

impl GameStatistics {
    fn current(&self, player_id: &str, player_name: &str) -> PlayerStat {
        self.stats
            .get(player_id)
            .cloned()
            .unwrap_or_else(|| PlayerStat::new(player_id, player_name))
    }

    /// Count a skip vote, creating the player's record if needed
    pub fn record_skip(&mut self, player_id: &str, player_name: &str) -> &PlayerStat {
        let next = self.current(player_id, player_name).with_skip();
        self.replace(next)
    }

    /// Apply a guess, creating the player's record if needed
    pub fn record_guess(&mut self, player_id: &str, player_name: &str, guess: &GuessRecord) -> &PlayerStat {
        let next = self.current(player_id, player_name).with_guess(guess);
        self.replace(next)
    }

    fn replace(&mut self, stat: PlayerStat) -> &PlayerStat {
        let player_id = stat.player_id.clone();
        self.stats.insert(player_id.clone(), stat);
        &self.stats[&player_id]
    }
}
