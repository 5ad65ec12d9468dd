/// One side of a pairing result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchSide {
    pub player_id: String,
    pub score: i64,
}

/// Higher score wins; equal scores are an explicit tie (`None`).
pub fn resolve_winner<'a>(first: &'a MatchSide, second: &'a MatchSide) -> Option<&'a str> {
    match first.score.cmp(&second.score) {
        std::cmp::Ordering::Greater => Some(first.player_id.as_str()),
        std::cmp::Ordering::Less => Some(second.player_id.as_str()),
        std::cmp::Ordering::Equal => None,
    }
}

/// A resolved match. `match_index` is its position in the tournament document
/// and, together with the tournament id, its duplicate identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchRecord {
    pub tournament_id: String,
    pub match_index: i64,
    pub player1: MatchSide,
    pub player2: MatchSide,
    pub winner: Option<String>,
}

impl MatchRecord {
    pub fn new(tournament_id: &str, match_index: i64, player1: MatchSide, player2: MatchSide) -> Self {
        let winner = resolve_winner(&player1, &player2).map(str::to_string);
        Self {
            tournament_id: tournament_id.to_string(),
            match_index,
            player1,
            player2,
            winner,
        }
    }

    /// One row per participating player, each carrying the match winner.
    pub fn participants(&self) -> [ParticipantOutcome; 2] {
        [&self.player1, &self.player2].map(|side| ParticipantOutcome {
            player_id: side.player_id.clone(),
            tournament_id: self.tournament_id.clone(),
            winner: self.winner.clone(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParticipantOutcome {
    pub player_id: String,
    pub tournament_id: String,
    pub winner: Option<String>,
}

impl ParticipantOutcome {
    pub fn is_victory(&self) -> bool {
        self.winner.as_deref() == Some(self.player_id.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn side(id: &str, score: i64) -> MatchSide {
        MatchSide {
            player_id: id.to_string(),
            score,
        }
    }

    #[test]
    fn higher_score_wins_either_side() {
        assert_eq!(resolve_winner(&side("a", 2), &side("b", 1)), Some("a"));
        assert_eq!(resolve_winner(&side("a", 0), &side("b", 2)), Some("b"));
    }

    #[test]
    fn tie_has_no_winner_and_no_victory() {
        let record = MatchRecord::new("t1", 0, side("a", 2), side("b", 2));
        assert_eq!(record.winner, None);
        let [p1, p2] = record.participants();
        assert!(!p1.is_victory());
        assert!(!p2.is_victory());
    }

    #[test]
    fn participants_carry_winner() {
        let record = MatchRecord::new("t1", 3, side("a", 1), side("b", 2));
        let [p1, p2] = record.participants();
        assert_eq!(p1.player_id, "a");
        assert_eq!(p2.winner.as_deref(), Some("b"));
        assert!(!p1.is_victory());
        assert!(p2.is_victory());
        assert_eq!(p1.tournament_id, "t1");
    }
}
