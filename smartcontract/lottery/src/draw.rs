// Copyright (c) Zefchain Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Seeded winner selection.
//!
//! Every ticket is one unit of weight. Winners are picked one at a time with
//! probability proportional to their remaining weight and then removed, so an
//! account holding several tickets is more likely to win but never takes two
//! winner slots. The same seed and ticket list always give the same winners.

use std::collections::HashMap;
use std::hash::Hash;

use rand::{rngs::StdRng, Rng, SeedableRng};

/// Counts tickets per distinct account, in order of first purchase.
pub fn tally<T>(tickets: &[T]) -> Vec<(T, u64)>
where
    T: Clone + Eq + Hash,
{
    let mut positions: HashMap<T, usize> = HashMap::new();
    let mut counts: Vec<(T, u64)> = Vec::new();
    for ticket in tickets {
        match positions.get(ticket) {
            Some(&position) => counts[position].1 += 1,
            None => {
                positions.insert(ticket.clone(), counts.len());
                counts.push((ticket.clone(), 1));
            }
        }
    }
    counts
}

/// Picks up to `n` distinct entries, weighted by their counts.
pub fn sample_weighted<T: Clone>(entries: &[(T, u64)], n: usize, seed: u64) -> Vec<T> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut pool: Vec<(T, u64)> = entries
        .iter()
        .filter(|(_, weight)| *weight > 0)
        .cloned()
        .collect();
    let mut total: u64 = pool.iter().map(|(_, weight)| weight).sum();
    let mut winners = Vec::with_capacity(n.min(pool.len()));

    while winners.len() < n && total > 0 {
        let mut target = rng.gen_range(0..total);
        let mut index = 0;
        while target >= pool[index].1 {
            target -= pool[index].1;
            index += 1;
        }
        let (winner, weight) = pool.remove(index);
        total -= weight;
        winners.push(winner);
    }
    winners
}

/// Mixes the host-provided entropy into a single draw seed.
pub fn seed_from(timestamp_micros: u64, block_height: u64) -> u64 {
    timestamp_micros ^ block_height.wrapping_mul(0x9E37_79B9_7F4A_7C15)
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn tally_keeps_first_purchase_order() {
        let tickets = ["carol", "alice", "carol", "bob", "carol", "alice"];
        assert_eq!(
            tally(&tickets),
            vec![("carol", 3), ("alice", 2), ("bob", 1)]
        );
    }

    #[test]
    fn picks_distinct_winners() {
        let tickets: Vec<String> = (0..20).map(|i| format!("player{i}")).collect();
        let entries = tally(&tickets);

        let winners = sample_weighted(&entries, 10, 42);

        assert_eq!(winners.len(), 10);
        let distinct: HashSet<_> = winners.iter().collect();
        assert_eq!(distinct.len(), 10);
        assert!(winners.iter().all(|winner| tickets.contains(winner)));
    }

    #[test]
    fn repeated_tickets_never_fill_two_slots() {
        let tickets = ["alice", "alice", "alice", "alice", "bob"];
        let entries = tally(&tickets);

        for seed in 0..100 {
            let mut winners = sample_weighted(&entries, 2, seed);
            winners.sort();
            assert_eq!(winners, vec!["alice", "bob"]);
        }
    }

    #[test]
    fn same_seed_same_winners() {
        let tickets: Vec<u32> = (0..50).collect();
        let entries = tally(&tickets);

        assert_eq!(
            sample_weighted(&entries, 5, 7),
            sample_weighted(&entries, 5, 7)
        );
    }

    #[test]
    fn more_tickets_win_more_often() {
        let entries = vec![("heavy", 9), ("light", 1)];

        let heavy_wins = (0..1_000)
            .filter(|seed| sample_weighted(&entries, 1, *seed) == vec!["heavy"])
            .count();

        // Expected around 900.
        assert!(heavy_wins > 800, "heavy won {heavy_wins} times");
        assert!(heavy_wins < 980, "heavy won {heavy_wins} times");
    }

    #[test]
    fn stops_when_pool_is_exhausted() {
        let entries = vec![("alice", 1), ("bob", 2)];
        assert_eq!(sample_weighted(&entries, 5, 1).len(), 2);
        assert!(sample_weighted::<&str>(&[], 1, 1).is_empty());
    }
}
