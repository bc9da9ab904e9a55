use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

use crate::{
    fuzzy::{fuzzy_compare, FuzzyResult},
    sample::Sample,
};

use super::countdown::{Countdown, CountdownHandle};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundState {
    NotStarted,
    Running,
    Ended,
}

/// One timed guessing window for a sample
#[derive(Debug)]
pub struct Round {
    sample: Arc<Sample>,
    started_at: Option<Instant>,
    ended_at: Option<Instant>,
    /// Players who guessed at least once
    guessers: HashSet<String>,
    skip_voters: HashSet<String>,
}

impl Round {
    pub fn new(sample: Arc<Sample>) -> Self {
        Self {
            sample,
            started_at: None,
            ended_at: None,
            guessers: HashSet::new(),
            skip_voters: HashSet::new(),
        }
    }

    pub fn sample(&self) -> &Arc<Sample> {
        &self.sample
    }

    pub fn state(&self) -> RoundState {
        match (self.started_at, self.ended_at) {
            (None, _) => RoundState::NotStarted,
            (Some(_), None) => RoundState::Running,
            (Some(_), Some(_)) => RoundState::Ended,
        }
    }

    /// Start the clock and return the round's countdown
    pub fn start(&mut self, duration: Duration) -> (Countdown, CountdownHandle) {
        self.started_at.get_or_insert_with(Instant::now);
        Countdown::new(duration)
    }

    /// Freeze the elapsed time
    pub fn end(&mut self) {
        if self.started_at.is_some() {
            self.ended_at.get_or_insert_with(Instant::now);
        }
    }

    pub fn elapsed_time(&self) -> Duration {
        match self.started_at {
            None => Duration::ZERO,
            Some(started_at) => self
                .ended_at
                .unwrap_or_else(Instant::now)
                .saturating_duration_since(started_at),
        }
    }

    pub fn has_guessed(&self, player_id: &str) -> bool {
        self.guessers.contains(player_id)
    }

    /// Score a guess against the sample's accepted answers
    pub fn register_guess(&mut self, player_id: &str, guess: &str) -> Option<FuzzyResult> {
        self.guessers.insert(player_id.to_string());
        fuzzy_compare(self.sample.solutions(), guess)
    }

    /// Returns false when the player had already voted
    pub fn register_skip_vote(&mut self, player_id: &str) -> bool {
        self.skip_voters.insert(player_id.to_string())
    }

    pub fn skip_votes(&self) -> usize {
        self.skip_voters.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Arc<Sample> {
        Arc::new(Sample {
            track_title: "Queen - Bohemian Rhapsody".to_string(),
            title: "Bohemian Rhapsody".to_string(),
            aliases: vec![],
            image_url: String::new(),
            image_data: vec![],
        })
    }

    #[tokio::test(start_paused = true)]
    async fn elapsed_time_is_zero_before_start_and_frozen_after_end() {
        let mut round = Round::new(sample());
        assert_eq!(round.state(), RoundState::NotStarted);
        assert_eq!(round.elapsed_time(), Duration::ZERO);

        let _countdown = round.start(Duration::from_secs(30));
        assert_eq!(round.state(), RoundState::Running);
        tokio::time::sleep(Duration::from_secs(4)).await;
        assert_eq!(round.elapsed_time(), Duration::from_secs(4));

        round.end();
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(round.state(), RoundState::Ended);
        assert_eq!(round.elapsed_time(), Duration::from_secs(4));
    }

    #[test]
    fn guess_is_matched_against_the_title() {
        let mut round = Round::new(sample());

        let result = round.register_guess("1", "bohemian rhapsody").unwrap();

        assert_eq!(result.score, 1.0);
        assert_eq!(result.matched, "Bohemian Rhapsody");
        assert!(round.has_guessed("1"));
        assert!(!round.has_guessed("2"));
    }

    #[test]
    fn skip_votes_are_counted_once_per_player() {
        let mut round = Round::new(sample());

        assert!(round.register_skip_vote("1"));
        assert!(!round.register_skip_vote("1"));
        assert!(round.register_skip_vote("2"));
        assert_eq!(round.skip_votes(), 2);
    }
}
