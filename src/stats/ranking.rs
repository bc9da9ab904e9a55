use std::collections::HashMap;

use super::models::{AggregatedPlayerStat, GameStatistics};

/// Players need this many games to appear in the ranking
pub const MIN_GAMES_FOR_RANKING: u32 = 10;
pub const RANKING_SIZE: usize = 10;

/// Fold every player's games, oldest first, into one aggregate per player
///
/// Players are returned in order of first appearance.
pub fn aggregate_players(history: &[GameStatistics]) -> Vec<AggregatedPlayerStat> {
    let mut games: Vec<&GameStatistics> = history.iter().collect();
    games.sort_by_key(|game| game.started_at);

    let mut order: Vec<String> = Vec::new();
    let mut aggregates: HashMap<String, AggregatedPlayerStat> = HashMap::new();

    for game in games {
        for (player_id, stat) in &game.stats {
            let current = AggregatedPlayerStat::from(stat.clone());
            let next = match aggregates.get(player_id) {
                Some(previous) => previous.combine(&current),
                None => {
                    order.push(player_id.clone());
                    current
                }
            };
            aggregates.insert(player_id.clone(), next);
        }
    }

    order
        .into_iter()
        .filter_map(|player_id| aggregates.remove(&player_id))
        .collect()
}

/// Best players of a channel's history
///
/// Sorted by average correct guesses per game, then games played.
pub fn rank_players(history: &[GameStatistics]) -> Vec<AggregatedPlayerStat> {
    let mut players = aggregate_players(history);

    players.sort_by(|a, b| {
        b.avg_correct_guesses_per_game()
            .total_cmp(&a.avg_correct_guesses_per_game())
            .then(b.nb_games.cmp(&a.nb_games))
    });

    players
        .into_iter()
        .filter(|player| player.nb_games >= MIN_GAMES_FOR_RANKING)
        .take(RANKING_SIZE)
        .collect()
}
