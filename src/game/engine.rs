use std::collections::HashMap;
use std::sync::Arc;
use strum_macros::Display;
use thiserror::Error;
use tokio::sync::{mpsc, Mutex};
use tokio::time::sleep;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use crate::{
    config::QuizConfig,
    event::{EventBus, QuizEvent},
    sample::{ProviderError, Sample, SampleProvider},
    stats::{GameStatistics, GuessRecord},
};

use super::{
    combo::Combo,
    countdown::{CountdownHandle, RoundEnd},
    round::{Round, RoundState},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum GameStatus {
    Idle,
    /// Between rounds, or waiting for the next sample
    Loading,
    WaitingForGuesses,
}

#[derive(Debug, Error)]
pub enum GameError {
    #[error("A game is already running ({0})")]
    AlreadyRunning(GameStatus),

    #[error("Could not fetch a sample: {0}")]
    Provider(#[from] ProviderError),

    #[error("Sample producer stopped unexpectedly: {0}")]
    ProducerCrashed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum GuessOutcome {
    /// No round is accepting guesses
    Ignored,
    Correct {
        matched: String,
        score: f64,
        points: u32,
        combo: u32,
    },
    Incorrect {
        score: Option<f64>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipOutcome {
    Ignored,
    /// Vote registered, quorum not reached
    Counted { votes: usize, quorum: usize },
    Skipped,
}

/// Point-in-time view of a game
#[derive(Debug, Clone, PartialEq)]
pub struct GameSnapshot {
    pub game_id: Uuid,
    pub status: GameStatus,
    pub sample_number: usize,
    pub scores: Vec<(String, u32)>,
    pub combo: Option<Combo>,
}

/// Result of a completed game
#[derive(Debug, Clone)]
pub struct GameSummary {
    pub game_id: Uuid,
    pub samples_played: usize,
    pub scores: Vec<(String, u32)>,
    pub statistics: GameStatistics,
}

#[derive(Debug)]
struct GameState {
    game_id: Uuid,
    status: GameStatus,
    sample_number: usize,
    /// Player name -> points
    scores: HashMap<String, u32>,
    statistics: GameStatistics,
    round: Option<Round>,
    countdown: Option<CountdownHandle>,
    combo: Option<Combo>,
}

impl GameState {
    fn new() -> Self {
        Self {
            game_id: Uuid::new_v4(),
            status: GameStatus::Idle,
            sample_number: 0,
            scores: HashMap::new(),
            statistics: GameStatistics::started_now(),
            round: None,
            countdown: None,
            combo: None,
        }
    }

    /// Round accepting guesses, with its countdown
    fn open_round(&mut self) -> Option<(&mut Round, &CountdownHandle)> {
        if self.status != GameStatus::WaitingForGuesses {
            return None;
        }
        match (self.round.as_mut(), self.countdown.as_ref()) {
            (Some(round), Some(countdown)) if round.state() == RoundState::Running && !countdown.is_settled() => {
                Some((round, countdown))
            }
            _ => None,
        }
    }

    fn clear_combo_of(&mut self, player_id: &str) {
        if self.combo.as_ref().is_some_and(|combo| combo.is_held_by(player_id)) {
            debug!(player_id = %player_id, "Combo broken");
            self.combo = None;
        }
    }
}

/// Score table sorted best first, ties by name
pub fn ranked_scores(scores: &HashMap<String, u32>) -> Vec<(String, u32)> {
    let mut ranked: Vec<(String, u32)> = scores.iter().map(|(name, points)| (name.clone(), *points)).collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked
}

/// Drives the games of one channel
///
/// All mutations go through one mutex, so the round loop, guesses and skip
/// votes never interleave. Cloning gives another handle to the same game.
#[derive(Clone)]
pub struct GameEngine {
    config: Arc<QuizConfig>,
    provider: Arc<dyn SampleProvider>,
    events: EventBus,
    state: Arc<Mutex<GameState>>,
}

impl GameEngine {
    pub fn new(config: QuizConfig, provider: Arc<dyn SampleProvider>) -> Self {
        Self::with_event_bus(config, provider, EventBus::new())
    }

    pub fn with_event_bus(config: QuizConfig, provider: Arc<dyn SampleProvider>, events: EventBus) -> Self {
        Self {
            config: Arc::new(config),
            provider,
            events,
            state: Arc::new(Mutex::new(GameState::new())),
        }
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn config(&self) -> &QuizConfig {
        &self.config
    }

    pub async fn status(&self) -> GameStatus {
        self.state.lock().await.status
    }

    pub async fn snapshot(&self) -> GameSnapshot {
        let state = self.state.lock().await;
        GameSnapshot {
            game_id: state.game_id,
            status: state.status,
            sample_number: state.sample_number,
            scores: ranked_scores(&state.scores),
            combo: state.combo.clone(),
        }
    }

    /// Whether both handles drive the same game
    pub fn same_game(&self, other: &GameEngine) -> bool {
        Arc::ptr_eq(&self.state, &other.state)
    }

    /// Claim the engine and play a whole game
    pub async fn run(&self) -> Result<GameSummary, GameError> {
        let game_id = self.begin().await?;
        self.play(game_id).await
    }

    /// Play the game claimed by [`GameEngine::begin`]
    ///
    /// Samples are fetched in the background while rounds are played. A
    /// provider failure aborts the game: no finished event is emitted.
    pub async fn play(&self, game_id: Uuid) -> Result<GameSummary, GameError> {
        let nb_samples = self.config.nb_samples;
        info!(game_id = %game_id, nb_samples, "Game started");

        let (queue, samples) = mpsc::channel(nb_samples.max(1));
        let producer = tokio::spawn(produce_samples(self.provider.clone(), nb_samples, queue));

        let played = match self.play_rounds(game_id, samples).await {
            Ok(played) => match producer.await {
                Ok(()) => Ok(played),
                Err(join_error) => Err(GameError::ProducerCrashed(join_error.to_string())),
            },
            Err(e) => {
                producer.abort();
                Err(e)
            }
        };

        match played {
            Ok(samples_played) => Ok(self.finish(game_id, samples_played).await),
            Err(e) => {
                self.abort(game_id, &e).await;
                Err(e)
            }
        }
    }

    /// Move an idle engine to Loading and return the new game's id
    pub async fn begin(&self) -> Result<Uuid, GameError> {
        let mut state = self.state.lock().await;
        if state.status != GameStatus::Idle {
            return Err(GameError::AlreadyRunning(state.status));
        }
        *state = GameState::new();
        state.status = GameStatus::Loading;
        Ok(state.game_id)
    }

    async fn play_rounds(
        &self,
        game_id: Uuid,
        mut samples: mpsc::Receiver<Result<Sample, ProviderError>>,
    ) -> Result<usize, GameError> {
        let mut sample_number = 0;
        while let Some(fetched) = samples.recv().await {
            let sample = Arc::new(fetched?);
            sample_number += 1;
            self.play_round(game_id, sample_number, sample).await;
        }
        Ok(sample_number)
    }

    #[instrument(skip(self, sample))]
    async fn play_round(&self, game_id: Uuid, sample_number: usize, sample: Arc<Sample>) {
        if !sample.has_solution() {
            warn!(track_title = %sample.track_title, "Sample has no accepted answer");
        }

        let countdown = {
            let mut state = self.state.lock().await;
            let mut round = Round::new(sample.clone());
            let (countdown, handle) = round.start(self.config.guess_time);

            state.sample_number = sample_number;
            state.round = Some(round);
            state.countdown = Some(handle);
            state.status = GameStatus::WaitingForGuesses;

            self.events
                .emit(QuizEvent::NewSample {
                    sample_number,
                    total_samples: self.config.nb_samples,
                    sample: sample.clone(),
                })
                .await;
            countdown
        };

        let outcome = countdown.finished().await;
        debug!(?outcome, "Round over");

        {
            let mut state = self.state.lock().await;
            state.status = GameStatus::Loading;
            if let Some(round) = state.round.as_mut() {
                round.end();
            }
            if outcome == RoundEnd::Expired {
                state.combo = None;
                self.events
                    .emit(QuizEvent::SampleTimeout {
                        track_title: sample.track_title.clone(),
                    })
                    .await;
            }
        }

        sleep(self.config.cooldown).await;
    }

    async fn finish(&self, game_id: Uuid, samples_played: usize) -> GameSummary {
        let mut state = self.state.lock().await;
        let scores = ranked_scores(&state.scores);
        let statistics = state.statistics.clone();

        self.events
            .emit(QuizEvent::GameFinished {
                scores: scores.clone(),
                statistics: statistics.clone(),
            })
            .await;

        state.status = GameStatus::Idle;
        state.countdown = None;
        info!(game_id = %game_id, samples_played, players = scores.len(), "Game finished");

        GameSummary {
            game_id,
            samples_played,
            scores,
            statistics,
        }
    }

    async fn abort(&self, game_id: Uuid, reason: &GameError) {
        let mut state = self.state.lock().await;
        if let Some(countdown) = state.countdown.take() {
            countdown.cancel(RoundEnd::Skipped);
        }
        state.status = GameStatus::Idle;
        state.combo = None;
        error!(game_id = %game_id, error = %reason, "Game aborted");
    }

    /// Handle a guess from a player
    #[instrument(skip(self, guess))]
    pub async fn handle_guess(&self, player_id: &str, player_name: &str, guess: &str) -> GuessOutcome {
        let mut guard = self.state.lock().await;
        let state = &mut *guard;
        let threshold = self.config.correct_threshold;

        let Some((round, countdown)) = state.open_round() else {
            return GuessOutcome::Ignored;
        };

        let first_guess = !round.has_guessed(player_id);
        let reaction_time = first_guess.then(|| round.elapsed_time().as_secs_f64());
        let result = round.register_guess(player_id, guess);
        let score = result.as_ref().map(|r| r.score);

        if let Some(result) = result.filter(|r| r.score >= threshold) {
            if !countdown.cancel(RoundEnd::Guessed) {
                return GuessOutcome::Ignored;
            }

            let combo = Combo::extend_or_start(state.combo.take(), player_id, player_name);
            let points = combo.points(self.config.max_combo);
            *state.scores.entry(player_name.to_string()).or_insert(0) += points;

            state.statistics.record_guess(
                player_id,
                player_name,
                &GuessRecord {
                    is_correct: true,
                    is_ace: first_guess,
                    reaction_time,
                    streak: combo.count,
                    precision: Some(result.score),
                },
            );
            state.status = GameStatus::Loading;

            info!(
                player_name = %player_name,
                matched = %result.matched,
                score = result.score,
                points,
                combo = combo.count,
                "Correct guess"
            );

            self.events
                .emit(QuizEvent::CorrectGuess {
                    player_id: player_id.to_string(),
                    player_name: player_name.to_string(),
                    matched_title: result.matched.clone(),
                    points,
                    combo: combo.count,
                    next_multiplier: combo.next_multiplier(self.config.max_combo),
                    scores: ranked_scores(&state.scores),
                })
                .await;

            let combo_count = combo.count;
            state.combo = Some(combo);

            return GuessOutcome::Correct {
                matched: result.matched,
                score: result.score,
                points,
                combo: combo_count,
            };
        }

        state.scores.entry(player_name.to_string()).or_insert(0);
        state.statistics.record_guess(
            player_id,
            player_name,
            &GuessRecord {
                is_correct: false,
                is_ace: false,
                reaction_time,
                streak: 0,
                precision: None,
            },
        );
        state.clear_combo_of(player_id);

        debug!(score = ?score, "Incorrect guess");

        self.events
            .emit(QuizEvent::IncorrectGuess {
                player_id: player_id.to_string(),
                player_name: player_name.to_string(),
                guess: guess.to_string(),
            })
            .await;

        GuessOutcome::Incorrect { score }
    }

    /// Register a vote to skip the current sample
    ///
    /// The sample is skipped once at least half of the game's players voted.
    #[instrument(skip(self))]
    pub async fn vote_skip(&self, player_id: &str, player_name: &str) -> SkipOutcome {
        let mut guard = self.state.lock().await;
        let state = &mut *guard;
        let quorum = state.scores.len() / 2;

        let Some((round, countdown)) = state.open_round() else {
            return SkipOutcome::Ignored;
        };

        let new_vote = round.register_skip_vote(player_id);
        let votes = round.skip_votes();
        let track_title = round.sample().track_title.clone();

        if !new_vote {
            return SkipOutcome::Counted { votes, quorum };
        }

        if votes >= quorum {
            if !countdown.cancel(RoundEnd::Skipped) {
                return SkipOutcome::Ignored;
            }
            state.status = GameStatus::Loading;
        }

        // Repeated votes returned above, so each player counts one skip per round
        state.statistics.record_skip(player_id, player_name);
        state.clear_combo_of(player_id);

        if state.status == GameStatus::Loading {
            info!(votes, quorum, "Sample skipped");
            self.events.emit(QuizEvent::SampleSkipped { track_title }).await;
            return SkipOutcome::Skipped;
        }

        debug!(votes, quorum, "Skip vote counted");
        SkipOutcome::Counted { votes, quorum }
    }
}

/// Fetch samples into the queue, stopping at the first failure
async fn produce_samples(
    provider: Arc<dyn SampleProvider>,
    nb_samples: usize,
    queue: mpsc::Sender<Result<Sample, ProviderError>>,
) {
    for index in 0..nb_samples {
        let fetched = provider.fetch_random_sample(true).await;
        let failed = fetched.is_err();

        match &fetched {
            Ok(sample) => debug!(index, track_title = %sample.track_title, "Sample fetched"),
            Err(e) => warn!(index, error = %e, "Sample fetch failed"),
        }

        if queue.send(fetched).await.is_err() {
            debug!("Sample queue closed, producer stopping");
            return;
        }
        if failed {
            return;
        }
    }
}
