use std::cmp::Ordering;

use crate::models::{ChallengeParticipant, LeaderboardEntry};

/// Anything that competes on a numeric score and carries a display rank.
pub trait Scored {
    fn score(&self) -> f64;
    fn set_rank(&mut self, rank: u32);
}

impl Scored for ChallengeParticipant {
    fn score(&self) -> f64 {
        self.progress
    }

    fn set_rank(&mut self, rank: u32) {
        self.rank = rank;
    }
}

impl Scored for LeaderboardEntry {
    fn score(&self) -> f64 {
        self.score
    }

    fn set_rank(&mut self, rank: u32) {
        self.rank = rank;
    }
}

/// Sort by score descending and assign dense 1-based ranks.
///
/// The sort is stable, so equal scores keep their input order and the
/// earlier item takes the better rank.
#[must_use]
pub fn rank<T: Scored + Clone>(items: &[T]) -> Vec<T> {
    let mut ranked = items.to_vec();
    ranked.sort_by(|a, b| {
        b.score()
            .partial_cmp(&a.score())
            .unwrap_or(Ordering::Equal)
    });
    for (index, item) in ranked.iter_mut().enumerate() {
        item.set_rank(index as u32 + 1);
    }
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn participant(user_id: &str, progress: f64) -> ChallengeParticipant {
        ChallengeParticipant {
            user_id: user_id.to_string(),
            user_name: user_id.to_uppercase(),
            progress,
            joined_at: Utc::now(),
            rank: 0,
        }
    }

    #[test]
    fn test_rank_sorts_descending_with_dense_ranks() {
        let ranked = rank(&[
            participant("low", 10.0),
            participant("high", 80.0),
            participant("mid", 50.0),
        ]);
        let order: Vec<(&str, u32)> = ranked
            .iter()
            .map(|p| (p.user_id.as_str(), p.rank))
            .collect();
        assert_eq!(order, vec![("high", 1), ("mid", 2), ("low", 3)]);
    }

    #[test]
    fn test_ties_keep_input_order() {
        let ranked = rank(&[
            participant("first", 50.0),
            participant("second", 50.0),
            participant("top", 90.0),
        ]);
        assert_eq!(ranked[0].user_id, "top");
        assert_eq!(ranked[1].user_id, "first");
        assert_eq!(ranked[1].rank, 2);
        assert_eq!(ranked[2].user_id, "second");
        assert_eq!(ranked[2].rank, 3);
    }

    #[test]
    fn test_empty_input_yields_empty_output() {
        let ranked = rank::<ChallengeParticipant>(&[]);
        assert!(ranked.is_empty());
    }
}
