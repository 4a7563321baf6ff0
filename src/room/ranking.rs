//! Vote application and queue ordering

use crate::types::{Song, VoteDirection, VoteOrder};

/// Adjust the score of every song named `name`. Scores are unbounded.
///
/// Returns how many entries matched.
pub fn apply_vote(songs: &mut [Song], name: &str, direction: VoteDirection) -> usize {
    let mut matched = 0;
    for song in songs.iter_mut().filter(|song| song.name == name) {
        song.vote_count += direction.delta();
        matched += 1;
    }
    matched
}

/// Re-sort the queue by score. The sort is stable: entries with equal
/// scores keep their previous relative order.
pub fn rank(songs: &mut [Song], order: VoteOrder) {
    match order {
        VoteOrder::Descending => songs.sort_by(|a, b| b.vote_count.cmp(&a.vote_count)),
        VoteOrder::Ascending => songs.sort_by(|a, b| a.vote_count.cmp(&b.vote_count)),
    }
}
