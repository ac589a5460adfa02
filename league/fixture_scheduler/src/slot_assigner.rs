//! Greedy day-by-day slot assignment.
//!
//! Each calendar day the remaining pairings are scanned once (tail first by
//! default). A pairing takes the earliest free slot of the day when neither
//! team has played yet that day and both have rested at least the configured
//! interval since their previous match. The day closes when its slots or its
//! match cap run out.

use chrono::{DateTime, NaiveDate, Utc};
use std::collections::{HashMap, HashSet};
use std::hash::Hash;
use tracing::{debug, info};

use crate::config::{ScanOrder, SlotConfiguration};
use crate::error::SchedulerError;
use crate::types::{Pairing, ScheduledFixture};

pub struct SlotAssigner {
    config: SlotConfiguration,
    scan_order: ScanOrder,
}

impl SlotAssigner {
    pub fn new(config: SlotConfiguration) -> Self {
        Self {
            config,
            scan_order: ScanOrder::default(),
        }
    }

    pub fn with_scan_order(mut self, scan_order: ScanOrder) -> Self {
        self.scan_order = scan_order;
        self
    }

    /// Binds every pairing to a kick-off time at or after `start`.
    ///
    /// Fixtures come back in assignment order, which is chronological.
    /// Fails with `DegenerateConfiguration` instead of looping when the
    /// configuration can never place the remaining pairings.
    pub fn assign<T>(
        &self,
        pairings: Vec<Pairing<T>>,
        start: DateTime<Utc>,
    ) -> Result<Vec<ScheduledFixture<T>>, SchedulerError>
    where
        T: Clone + Eq + Hash,
    {
        self.config.validate()?;

        let total = pairings.len();
        let max_idle_days = self.config.max_idle_days();
        let mut run = SchedulerRun::new(pairings, start.date_naive());
        let mut fixtures = Vec::with_capacity(total);
        let mut idle_days = 0;
        let mut days_used = 0;

        while !run.remaining.is_empty() {
            let slots = self.day_slots(run.cursor, start);
            if slots.is_empty() {
                debug!("No slots left on {} after {}, moving to next day", run.cursor, start);
                run.advance()?;
                continue;
            }

            let assigned = run.fill_day(&slots, &self.config, self.scan_order);
            if assigned.is_empty() {
                idle_days += 1;
                if idle_days > max_idle_days {
                    return Err(SchedulerError::DegenerateConfiguration(format!(
                        "no fixture could be placed for {} consecutive days with {} pairings remaining",
                        idle_days,
                        run.remaining.len()
                    )));
                }
            } else {
                idle_days = 0;
                days_used += 1;
            }

            debug!(
                "Assigned {} fixtures on {}, {} remaining",
                assigned.len(),
                run.cursor,
                run.remaining.len()
            );
            fixtures.extend(assigned);
            run.advance()?;
        }

        info!(
            "Scheduled {} fixtures across {} match days starting {}",
            fixtures.len(),
            days_used,
            start
        );
        Ok(fixtures)
    }

    /// Kick-off times for `day`. On the start day, slots before `start` are dropped.
    fn day_slots(&self, day: NaiveDate, start: DateTime<Utc>) -> Vec<DateTime<Utc>> {
        self.config
            .daily_slots
            .iter()
            .map(|time| day.and_time(*time).and_utc())
            .filter(|slot| day != start.date_naive() || *slot >= start)
            .collect()
    }
}

/// Transient state of one assignment run.
struct SchedulerRun<T> {
    remaining: Vec<Pairing<T>>,
    last_played: HashMap<T, DateTime<Utc>>,
    cursor: NaiveDate,
}

impl<T> SchedulerRun<T>
where
    T: Clone + Eq + Hash,
{
    fn new(pairings: Vec<Pairing<T>>, first_day: NaiveDate) -> Self {
        Self {
            remaining: pairings,
            last_played: HashMap::new(),
            cursor: first_day,
        }
    }

    fn advance(&mut self) -> Result<(), SchedulerError> {
        self.cursor = self.cursor.succ_opt().ok_or_else(|| {
            SchedulerError::DegenerateConfiguration("ran past the end of the calendar".to_string())
        })?;
        Ok(())
    }

    fn rested(&self, entity: &T, slot: DateTime<Utc>, config: &SlotConfiguration) -> bool {
        self.last_played
            .get(entity)
            .map_or(true, |last| slot - *last >= config.min_rest())
    }

    /// One pass over the remaining pairings for the current day.
    fn fill_day(
        &mut self,
        slots: &[DateTime<Utc>],
        config: &SlotConfiguration,
        scan_order: ScanOrder,
    ) -> Vec<ScheduledFixture<T>> {
        let limit = slots.len().min(config.daily_capacity());
        let candidates: Vec<usize> = match scan_order {
            ScanOrder::TailFirst => (0..self.remaining.len()).rev().collect(),
            ScanOrder::HeadFirst => (0..self.remaining.len()).collect(),
        };

        let mut used_today: HashSet<T> = HashSet::new();
        let mut picked = vec![false; self.remaining.len()];
        let mut fixtures = Vec::new();

        for i in candidates {
            if fixtures.len() >= limit {
                break;
            }
            let slot = slots[fixtures.len()];
            let pairing = &self.remaining[i];

            if used_today.contains(&pairing.home) || used_today.contains(&pairing.away) {
                continue;
            }
            if !self.rested(&pairing.home, slot, config) || !self.rested(&pairing.away, slot, config) {
                continue;
            }

            let pairing = pairing.clone();
            self.last_played.insert(pairing.home.clone(), slot);
            self.last_played.insert(pairing.away.clone(), slot);
            used_today.insert(pairing.home.clone());
            used_today.insert(pairing.away.clone());
            picked[i] = true;
            fixtures.push(ScheduledFixture {
                pairing,
                kickoff: slot,
            });
        }

        let mut index = 0;
        self.remaining.retain(|_| {
            let keep = !picked[index];
            index += 1;
            keep
        });

        fixtures
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pairing::generate_pairings;
    use chrono::{NaiveTime, TimeDelta, TimeZone};
    use pretty_assertions::assert_eq;
    use rand::seq::SliceRandom;
    use test_log::test;

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap()
    }

    fn schedule(n: u32, config: SlotConfiguration, order: ScanOrder) -> Vec<ScheduledFixture<u32>> {
        let teams: Vec<u32> = (1..=n).collect();
        let pairings = generate_pairings(&teams).unwrap();
        SlotAssigner::new(config)
            .with_scan_order(order)
            .assign(pairings, start())
            .unwrap()
    }

    fn assert_valid_calendar(
        fixtures: &[ScheduledFixture<u32>],
        expected: usize,
        config: &SlotConfiguration,
        start: DateTime<Utc>,
    ) {
        assert_eq!(fixtures.len(), expected);

        let mut per_day: HashMap<NaiveDate, Vec<&ScheduledFixture<u32>>> = HashMap::new();
        for f in fixtures {
            assert!(f.kickoff >= start);
            per_day.entry(f.kickoff.date_naive()).or_default().push(f);
        }
        for (day, day_fixtures) in &per_day {
            assert!(
                day_fixtures.len() <= config.max_matches_per_day as usize,
                "{} has {} fixtures",
                day,
                day_fixtures.len()
            );
            let mut teams = HashSet::new();
            for f in day_fixtures {
                assert!(teams.insert(f.pairing.home), "team plays twice on {}", day);
                assert!(teams.insert(f.pairing.away), "team plays twice on {}", day);
            }
        }

        let mut per_team: HashMap<u32, Vec<DateTime<Utc>>> = HashMap::new();
        for f in fixtures {
            per_team.entry(f.pairing.home).or_default().push(f.kickoff);
            per_team.entry(f.pairing.away).or_default().push(f.kickoff);
        }
        for (team, mut dates) in per_team {
            dates.sort();
            for pair in dates.windows(2) {
                assert!(
                    pair[1] - pair[0] >= config.min_rest(),
                    "team {} rests only {} between matches",
                    team,
                    pair[1] - pair[0]
                );
            }
        }

        assert!(fixtures.windows(2).all(|w| w[0].kickoff <= w[1].kickoff));
    }

    #[test]
    fn test_four_teams_default_config() {
        let config = SlotConfiguration::default();
        let fixtures = schedule(4, config.clone(), ScanOrder::TailFirst);
        assert_valid_calendar(&fixtures, 12, &config, start());

        for team in 1..=4 {
            let home = fixtures.iter().filter(|f| f.pairing.home == team).count();
            let away = fixtures.iter().filter(|f| f.pairing.away == team).count();
            assert_eq!((home, away), (3, 3));
        }
    }

    #[test]
    fn test_first_day_follows_tail_first_order() {
        let fixtures = schedule(4, SlotConfiguration::default(), ScanOrder::TailFirst);
        let first_day: Vec<(u32, u32, String)> = fixtures
            .iter()
            .filter(|f| f.kickoff.date_naive() == start().date_naive())
            .map(|f| (f.pairing.home, f.pairing.away, f.kickoff.format("%H:%M").to_string()))
            .collect();
        // Tail of the queue is (4, 3, round 6), then (2, 1, round 6)
        assert_eq!(
            first_day,
            vec![(4, 3, "16:00".to_string()), (2, 1, "18:30".to_string())]
        );
    }

    #[test]
    fn test_first_day_follows_head_first_order() {
        let fixtures = schedule(4, SlotConfiguration::default(), ScanOrder::HeadFirst);
        let first_two: Vec<(u32, u32)> = fixtures
            .iter()
            .take(2)
            .map(|f| (f.pairing.home, f.pairing.away))
            .collect();
        assert_eq!(first_two, vec![(1, 4), (2, 3)]);
    }

    #[test]
    fn test_two_teams() {
        let config = SlotConfiguration::default();
        let fixtures = schedule(2, config.clone(), ScanOrder::TailFirst);
        assert_valid_calendar(&fixtures, 2, &config, start());
        assert_eq!(fixtures[1].kickoff - fixtures[0].kickoff, TimeDelta::days(3));
    }

    #[test]
    fn test_constraints_hold_for_many_sizes() {
        let config = SlotConfiguration::default();
        for n in 2..=10 {
            for order in [ScanOrder::TailFirst, ScanOrder::HeadFirst] {
                let fixtures = schedule(n, config.clone(), order);
                assert_valid_calendar(&fixtures, (n * (n - 1)) as usize, &config, start());
            }
        }
    }

    #[test]
    fn test_constraints_hold_for_shuffled_input() {
        let config = SlotConfiguration {
            daily_slots: vec![
                NaiveTime::from_hms_opt(12, 0, 0).unwrap(),
                NaiveTime::from_hms_opt(15, 0, 0).unwrap(),
                NaiveTime::from_hms_opt(18, 0, 0).unwrap(),
                NaiveTime::from_hms_opt(20, 0, 0).unwrap(),
            ],
            min_rest_days: 2,
            max_matches_per_day: 3,
        };
        let mut rng = rand::thread_rng();
        for n in [3u32, 6, 7, 12] {
            let mut teams: Vec<u32> = (1..=n).collect();
            teams.shuffle(&mut rng);
            let pairings = generate_pairings(&teams).unwrap();
            let fixtures = SlotAssigner::new(config.clone()).assign(pairings, start()).unwrap();
            assert_valid_calendar(&fixtures, (n * (n - 1)) as usize, &config, start());
        }
    }

    #[test]
    fn test_skips_to_next_day_when_start_is_after_last_slot() {
        let late_start = Utc.with_ymd_and_hms(2024, 3, 1, 22, 0, 0).unwrap();
        let pairings = generate_pairings(&[1u32, 2, 3, 4]).unwrap();
        let fixtures = SlotAssigner::new(SlotConfiguration::default())
            .assign(pairings, late_start)
            .unwrap();
        assert_eq!(
            fixtures[0].kickoff,
            Utc.with_ymd_and_hms(2024, 3, 2, 16, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_drops_earlier_slots_on_start_day_only() {
        let mid_start = Utc.with_ymd_and_hms(2024, 3, 1, 17, 0, 0).unwrap();
        let pairings = generate_pairings(&[1u32, 2, 3, 4, 5, 6]).unwrap();
        let config = SlotConfiguration::default();
        let fixtures = SlotAssigner::new(config.clone())
            .assign(pairings, mid_start)
            .unwrap();
        assert_valid_calendar(&fixtures, 30, &config, mid_start);

        let first_day: Vec<_> = fixtures
            .iter()
            .filter(|f| f.kickoff.date_naive() == mid_start.date_naive())
            .collect();
        assert_eq!(first_day.len(), 2);
        assert_eq!(first_day[0].kickoff, Utc.with_ymd_and_hms(2024, 3, 1, 18, 30, 0).unwrap());

        // The two teams idle on the start day open the next day at the first slot
        let next_day = fixtures
            .iter()
            .find(|f| f.kickoff.date_naive() == mid_start.date_naive().succ_opt().unwrap())
            .unwrap();
        assert_eq!(next_day.kickoff, Utc.with_ymd_and_hms(2024, 3, 2, 16, 0, 0).unwrap());
    }

    #[test]
    fn test_slot_on_start_instant_is_kept() {
        let exact = Utc.with_ymd_and_hms(2024, 3, 1, 16, 0, 0).unwrap();
        let pairings = generate_pairings(&[1u32, 2]).unwrap();
        let fixtures = SlotAssigner::new(SlotConfiguration::default())
            .assign(pairings, exact)
            .unwrap();
        assert_eq!(fixtures[0].kickoff, exact);
    }

    #[test]
    fn test_max_per_day_caps_below_slot_count() {
        let config = SlotConfiguration {
            max_matches_per_day: 1,
            ..SlotConfiguration::default()
        };
        let fixtures = schedule(6, config.clone(), ScanOrder::TailFirst);
        assert_valid_calendar(&fixtures, 30, &config, start());
        let days: HashSet<NaiveDate> = fixtures.iter().map(|f| f.kickoff.date_naive()).collect();
        assert_eq!(days.len(), 30);
    }

    #[test]
    fn test_zero_rest_allows_back_to_back_days() {
        let config = SlotConfiguration {
            min_rest_days: 0,
            ..SlotConfiguration::default()
        };
        let fixtures = schedule(2, config.clone(), ScanOrder::TailFirst);
        assert_valid_calendar(&fixtures, 2, &config, start());
        assert_eq!(fixtures[1].kickoff - fixtures[0].kickoff, TimeDelta::days(1));
    }

    #[test]
    fn test_degenerate_configuration_fails_fast() {
        let pairings = generate_pairings(&[1u32, 2, 3]).unwrap();
        let no_slots = SlotConfiguration {
            daily_slots: Vec::new(),
            ..SlotConfiguration::default()
        };
        assert!(matches!(
            SlotAssigner::new(no_slots).assign(pairings.clone(), start()),
            Err(SchedulerError::DegenerateConfiguration(_))
        ));

        let no_matches = SlotConfiguration {
            max_matches_per_day: 0,
            ..SlotConfiguration::default()
        };
        assert!(matches!(
            SlotAssigner::new(no_matches).assign(pairings, start()),
            Err(SchedulerError::DegenerateConfiguration(_))
        ));
    }

    #[test]
    fn test_stalled_run_is_reported() {
        let pairings = generate_pairings(&[1u32, 2]).unwrap();
        let endless_rest = SlotConfiguration {
            min_rest_days: u32::MAX,
            ..SlotConfiguration::default()
        };
        match SlotAssigner::new(endless_rest).assign(pairings, start()) {
            Err(SchedulerError::DegenerateConfiguration(reason)) => {
                assert!(reason.contains("367 consecutive days"), "{}", reason);
                assert!(reason.contains("1 pairings remaining"), "{}", reason);
            }
            other => panic!("expected a stalled run, got {:?}", other.map(|f| f.len())),
        }
    }

    #[test]
    fn test_running_off_the_calendar_is_an_error() {
        let last_day = NaiveDate::MAX.and_hms_opt(9, 0, 0).unwrap().and_utc();
        let pairings = generate_pairings(&[1u32, 2]).unwrap();
        assert_eq!(
            SlotAssigner::new(SlotConfiguration::default()).assign(pairings, last_day),
            Err(SchedulerError::DegenerateConfiguration(
                "ran past the end of the calendar".to_string()
            ))
        );
    }

    #[test]
    fn test_empty_pairing_set_yields_empty_calendar() {
        let fixtures = SlotAssigner::new(SlotConfiguration::default())
            .assign(Vec::<Pairing<u32>>::new(), start())
            .unwrap();
        assert!(fixtures.is_empty());
    }
}
