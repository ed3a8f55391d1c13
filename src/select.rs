//! Fuzzy candidate selection.
//!
//! Providers answer a title search with several hits; [`choose_result`] picks
//! the one whose title best matches what we searched for, using popularity
//! only to separate hits whose titles match equally well.
//!
//! Scoring, on normalized titles (punctuation removed, lower-cased,
//! whitespace collapsed):
//!
//! | match                         | score             |
//! |-------------------------------|-------------------|
//! | exact                         | 100               |
//! | one contains the other        | 60                |
//! | otherwise, per shared word    | 15                |
//! | popularity bonus (any tier)   | `min(log10(1 + votes), 5)` |
//!
//! The bonus stays below 15, the smallest gap between tiers, so it never
//! lifts a hit over a better title match.

use serde_json::Value;

/// Exact normalized title match.
pub const EXACT_SCORE: f64 = 100.0;
/// One normalized title contains the other.
pub const SUBSTRING_SCORE: f64 = 60.0;
/// Per distinct word the titles share.
pub const WORD_SCORE: f64 = 15.0;
/// Cap on the popularity bonus.
pub const MAX_POPULARITY_BONUS: f64 = 5.0;

/// A search hit that can be scored against a target title.
pub trait SearchHit {
    /// Display title of the hit, if it has one.
    fn hit_title(&self) -> Option<String>;

    /// Vote count or comparable popularity figure.
    fn votes(&self) -> u64 {
        0
    }
}

/// Provider search responses are scored straight off the JSON.
///
/// Title keys cover TMDB (`title`, `name`), OMDB (`Title`) and TheTVDB
/// (`seriesName`); votes cover TMDB `vote_count`, OMDB `imdbVotes` (a string
/// with thousands separators) and TVMaze `weight`.
impl SearchHit for Value {
    fn hit_title(&self) -> Option<String> {
        ["title", "name", "Title", "seriesName"]
            .iter()
            .find_map(|key| self.get(*key).and_then(Value::as_str))
            .map(str::to_string)
    }

    fn votes(&self) -> u64 {
        ["vote_count", "votes", "imdbVotes", "weight"]
            .iter()
            .find_map(|key| match self.get(*key)? {
                Value::Number(n) => n.as_u64().or_else(|| n.as_f64().map(|f| f.max(0.0) as u64)),
                Value::String(s) => s.replace(',', "").trim().parse().ok(),
                _ => None,
            })
            .unwrap_or(0)
    }
}

/// Normalize a title for comparison.
pub fn normalize_title(title: &str) -> String {
    let cleaned: String = title
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect();
    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Title-only part of the score. Zero means no textual overlap at all.
pub fn title_score(title: &str, target: &str) -> f64 {
    let title = normalize_title(title);
    let target = normalize_title(target);
    if title.is_empty() || target.is_empty() {
        return 0.0;
    }

    if title == target {
        return EXACT_SCORE;
    }
    if title.contains(&target) || target.contains(&title) {
        return SUBSTRING_SCORE;
    }

    let mut shared: Vec<&str> = Vec::new();
    let target_words: Vec<&str> = target.split(' ').collect();
    for word in title.split(' ') {
        if target_words.contains(&word) && !shared.contains(&word) {
            shared.push(word);
        }
    }
    shared.len() as f64 * WORD_SCORE
}

/// Popularity bonus, capped at [`MAX_POPULARITY_BONUS`].
pub fn popularity_bonus(votes: u64) -> f64 {
    (1.0 + votes as f64).log10().min(MAX_POPULARITY_BONUS)
}

/// Pick the best hit for `target`.
///
/// The highest score wins, even when no hit shares any text with the target;
/// only an empty list yields `None`. Ties go to the earlier hit.
pub fn choose_result<'a, T: SearchHit>(candidates: &'a [T], target: &str) -> Option<&'a T> {
    let mut best: Option<(&T, f64)> = None;

    for candidate in candidates {
        let title = candidate.hit_title().unwrap_or_default();
        let score = title_score(&title, target) + popularity_bonus(candidate.votes());
        tracing::trace!(title = %title, score, "Scored search hit");

        if best.map_or(true, |(_, top)| score > top) {
            best = Some((candidate, score));
        }
    }

    best.map(|(candidate, _)| candidate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct Hit(&'static str, u64);

    impl SearchHit for Hit {
        fn hit_title(&self) -> Option<String> {
            Some(self.0.to_string())
        }

        fn votes(&self) -> u64 {
            self.1
        }
    }

    #[test]
    fn test_normalize_title() {
        assert_eq!(normalize_title("  The Office (US)! "), "the office us");
        assert_eq!(normalize_title("Grey's   Anatomy"), "greys anatomy");
    }

    #[test]
    fn test_exact_beats_popular_substring() {
        let hits = [Hit("The Office (US)", 50_000), Hit("The Office", 500)];
        let chosen = choose_result(&hits, "The Office").unwrap();
        assert_eq!(chosen.0, "The Office");
    }

    #[test]
    fn test_popularity_breaks_equal_matches() {
        let hits = [Hit("Lost", 10), Hit("Lost", 10_000)];
        let chosen = choose_result(&hits, "lost").unwrap();
        assert_eq!(chosen.1, 10_000);
    }

    #[test]
    fn test_first_wins_ties() {
        let hits = [Hit("Lost", 10), Hit("LOST", 10)];
        let chosen = choose_result(&hits, "Lost").unwrap();
        assert_eq!(chosen.0, "Lost");
    }

    #[test]
    fn test_word_overlap() {
        assert_eq!(title_score("Doctor Who Confidential", "Who Is Doctor"), 30.0);
        assert_eq!(title_score("Breaking Bad", "Better Call Saul"), 0.0);
    }

    #[test]
    fn test_lone_unrelated_hit_is_chosen() {
        let hits = [Hit("Breaking Bad", 1_000_000)];
        let chosen = choose_result(&hits, "Better Call Saul").unwrap();
        assert_eq!(chosen.0, "Breaking Bad");
    }

    #[test]
    fn test_any_overlap_beats_popular_unrelated() {
        let hits = [Hit("Breaking Bad", 1_000_000), Hit("Saul", 3)];
        let chosen = choose_result(&hits, "Better Call Saul").unwrap();
        assert_eq!(chosen.0, "Saul");
    }

    #[test]
    fn test_empty_is_none() {
        let hits: [Hit; 0] = [];
        assert!(choose_result(&hits, "Lost").is_none());
    }

    #[test]
    fn test_popularity_bonus_is_capped() {
        assert_eq!(popularity_bonus(0), 0.0);
        assert!((popularity_bonus(99) - 2.0).abs() < 1e-9);
        assert_eq!(popularity_bonus(u64::MAX), MAX_POPULARITY_BONUS);
    }

    #[test]
    fn test_json_hits() {
        let hits = vec![
            json!({"id": 1, "name": "The Office (US)", "vote_count": 50000}),
            json!({"id": 2, "name": "The Office", "vote_count": 500}),
        ];
        let chosen = choose_result(&hits, "The Office").unwrap();
        assert_eq!(chosen["id"], 2);
    }

    #[test]
    fn test_json_omdb_votes_with_separators() {
        let hit = json!({"Title": "Lost", "imdbVotes": "585,213"});
        assert_eq!(hit.votes(), 585_213);
        assert_eq!(hit.hit_title().as_deref(), Some("Lost"));
    }
}
