/// Current streak of consecutive correct guesses
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Combo {
    pub player_id: String,
    pub player_name: String,
    pub count: u32,
}

impl Combo {
    /// Extend `current` if the player holds it, otherwise start a new combo
    pub fn extend_or_start(current: Option<Combo>, player_id: &str, player_name: &str) -> Combo {
        match current {
            Some(combo) if combo.is_held_by(player_id) => Combo {
                player_name: player_name.to_string(),
                count: combo.count + 1,
                ..combo
            },
            _ => Combo {
                player_id: player_id.to_string(),
                player_name: player_name.to_string(),
                count: 1,
            },
        }
    }

    pub fn is_held_by(&self, player_id: &str) -> bool {
        self.player_id == player_id
    }

    /// Points awarded for the guess that produced this combo
    pub fn points(&self, max_combo: u32) -> u32 {
        self.count.min(max_combo)
    }

    /// Multiplier of the holder's next correct guess
    pub fn next_multiplier(&self, max_combo: u32) -> u32 {
        (self.count + 1).min(max_combo)
    }
}
