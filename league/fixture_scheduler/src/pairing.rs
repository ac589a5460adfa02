//! Double round-robin pairing generation (circle method).
//!
//! Entities are laid out in a fixed array; each round pairs position `i`
//! with position `n - 1 - i`. Between rounds every position except the first
//! rotates one step, so after `n - 1` rounds each unordered pair has met once.
//! An odd entity count is padded with a bye slot whose pairings are dropped.
//!
//! The second leg mirrors the first with venues swapped and round numbers
//! offset past the first leg.

use std::collections::HashSet;
use std::hash::Hash;

use crate::error::SchedulerError;
use crate::types::Pairing;

/// Generates the full double round-robin for `entities`.
///
/// Output is leg-major, round-major, position-major. The entity from the
/// low half of the array plays at home in the first leg.
pub fn generate_pairings<T>(entities: &[T]) -> Result<Vec<Pairing<T>>, SchedulerError>
where
    T: Clone + Eq + Hash,
{
    if entities.len() < 2 {
        return Err(SchedulerError::InsufficientEntities(entities.len()));
    }
    let mut seen = HashSet::with_capacity(entities.len());
    if let Some(position) = entities.iter().position(|e| !seen.insert(e)) {
        return Err(SchedulerError::DuplicateEntity(position));
    }

    let first_leg = single_round_robin(entities);
    let rounds_per_leg = round_count(entities.len());
    let second_leg: Vec<Pairing<T>> = first_leg
        .iter()
        .cloned()
        .map(|p| p.reversed(rounds_per_leg))
        .collect();

    let mut pairings = first_leg;
    pairings.extend(second_leg);
    Ok(pairings)
}

/// Rounds in one leg: `n - 1` for even `n`, `n` when a bye pads an odd count.
pub fn round_count(entity_count: usize) -> u32 {
    let padded = entity_count + entity_count % 2;
    padded.saturating_sub(1) as u32
}

fn single_round_robin<T: Clone>(entities: &[T]) -> Vec<Pairing<T>> {
    // None is the bye
    let mut slots: Vec<Option<&T>> = entities.iter().map(Some).collect();
    if slots.len() % 2 != 0 {
        slots.push(None);
    }

    let n = slots.len();
    let mut pairings = Vec::with_capacity(entities.len() * (entities.len() - 1) / 2);

    for round in 1..n as u32 {
        for i in 0..n / 2 {
            if let (Some(home), Some(away)) = (slots[i], slots[n - 1 - i]) {
                pairings.push(Pairing {
                    home: home.clone(),
                    away: away.clone(),
                    round,
                });
            }
        }
        slots[1..].rotate_right(1);
    }

    pairings
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn pairs(pairings: &[Pairing<char>]) -> Vec<(char, char, u32)> {
        pairings.iter().map(|p| (p.home, p.away, p.round)).collect()
    }

    #[test]
    fn test_rejects_fewer_than_two_entities() {
        assert_eq!(
            generate_pairings::<u32>(&[]),
            Err(SchedulerError::InsufficientEntities(0))
        );
        assert_eq!(
            generate_pairings(&[1]),
            Err(SchedulerError::InsufficientEntities(1))
        );
    }

    #[test]
    fn test_rejects_duplicate_entities() {
        assert_eq!(
            generate_pairings(&[1, 2, 1]),
            Err(SchedulerError::DuplicateEntity(2))
        );
    }

    #[test]
    fn test_two_entities_play_home_and_away() {
        let pairings = generate_pairings(&['A', 'B']).unwrap();
        assert_eq!(pairs(&pairings), vec![('A', 'B', 1), ('B', 'A', 2)]);
    }

    #[test]
    fn test_four_entities_exact_order() {
        let pairings = generate_pairings(&['A', 'B', 'C', 'D']).unwrap();
        assert_eq!(
            pairs(&pairings),
            vec![
                ('A', 'D', 1),
                ('B', 'C', 1),
                ('A', 'C', 2),
                ('D', 'B', 2),
                ('A', 'B', 3),
                ('C', 'D', 3),
                ('D', 'A', 4),
                ('C', 'B', 4),
                ('C', 'A', 5),
                ('B', 'D', 5),
                ('B', 'A', 6),
                ('D', 'C', 6),
            ]
        );
    }

    #[test]
    fn test_every_ordered_pair_exactly_once() {
        for n in 2..=12u32 {
            let entities: Vec<u32> = (0..n).collect();
            let pairings = generate_pairings(&entities).unwrap();
            assert_eq!(pairings.len() as u32, n * (n - 1), "n = {}", n);

            let mut counts: HashMap<(u32, u32), usize> = HashMap::new();
            for p in &pairings {
                assert_ne!(p.home, p.away);
                *counts.entry((p.home, p.away)).or_default() += 1;
            }
            assert_eq!(counts.len() as u32, n * (n - 1));
            assert!(counts.values().all(|&c| c == 1));

            for e in &entities {
                let home = pairings.iter().filter(|p| p.home == *e).count();
                let away = pairings.iter().filter(|p| p.away == *e).count();
                assert_eq!(home as u32, n - 1);
                assert_eq!(away as u32, n - 1);
            }
        }
    }

    #[test]
    fn test_odd_count_gives_one_bye_per_leg() {
        let entities = ['A', 'B', 'C', 'D', 'E'];
        let pairings = generate_pairings(&entities).unwrap();
        assert_eq!(pairings.len(), 20);
        assert_eq!(round_count(entities.len()), 5);

        let rounds = round_count(entities.len());
        for e in &entities {
            for leg in 0..2 {
                let leg_rounds = (leg * rounds + 1)..=((leg + 1) * rounds);
                let played = pairings
                    .iter()
                    .filter(|p| leg_rounds.contains(&p.round) && p.involves(e))
                    .count();
                assert_eq!(played, 4, "entity {} leg {}", e, leg + 1);
            }
        }
    }

    #[test]
    fn test_no_entity_plays_twice_in_a_round() {
        let entities: Vec<u32> = (0..9).collect();
        let pairings = generate_pairings(&entities).unwrap();
        let mut per_round: HashMap<u32, HashSet<u32>> = HashMap::new();
        for p in &pairings {
            let seen = per_round.entry(p.round).or_default();
            assert!(seen.insert(p.home));
            assert!(seen.insert(p.away));
        }
        assert_eq!(per_round.len() as u32, 2 * round_count(entities.len()));
    }

    #[test]
    fn test_second_leg_mirrors_first() {
        let entities: Vec<u32> = (0..6).collect();
        let pairings = generate_pairings(&entities).unwrap();
        let (first, second) = pairings.split_at(pairings.len() / 2);
        for (a, b) in first.iter().zip(second) {
            assert_eq!(a.home, b.away);
            assert_eq!(a.away, b.home);
            assert_eq!(a.round + 5, b.round);
        }
    }
}
