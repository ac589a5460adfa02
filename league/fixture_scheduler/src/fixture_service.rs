use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::{error, info};

use crate::clock::Clock;
use crate::config::SchedulerConfig;
use crate::error::{FixtureError, SchedulerError};
use crate::pairing::generate_pairings;
use crate::repository::MatchRepository;
use crate::slot_assigner::SlotAssigner;
use crate::types::{DivisionId, MatchRecord, NewMatch, Team, TeamId};

/// One async mutex per division. Regenerations of the same division queue up,
/// different divisions never block each other.
#[derive(Default)]
struct DivisionLocks {
    locks: Mutex<HashMap<DivisionId, Arc<tokio::sync::Mutex<()>>>>,
}

impl DivisionLocks {
    fn for_division(&self, division_id: DivisionId) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        locks.entry(division_id).or_default().clone()
    }
}

pub struct FixtureService {
    repository: Arc<dyn MatchRepository>,
    clock: Arc<dyn Clock>,
    config: SchedulerConfig,
    locks: DivisionLocks,
}

impl FixtureService {
    pub fn new(
        repository: Arc<dyn MatchRepository>,
        clock: Arc<dyn Clock>,
        config: SchedulerConfig,
    ) -> Self {
        Self {
            repository,
            clock,
            config,
            locks: DivisionLocks::default(),
        }
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Regenerates the calendar of a division.
    ///
    /// Scheduled-but-unplayed matches of the division are replaced wholesale;
    /// matches in any other state are kept. Without an explicit `start` the
    /// calendar begins one lead time after the clock's "now". On error the
    /// stored calendar is unchanged.
    pub async fn generate_fixtures(
        &self,
        division_id: DivisionId,
        team_ids: &[TeamId],
        start: Option<DateTime<Utc>>,
    ) -> Result<Vec<MatchRecord>, FixtureError> {
        let pairings = generate_pairings(team_ids)?;

        let lock = self.locks.for_division(division_id);
        let _guard = lock.lock().await;

        let start = match start {
            Some(start) => start,
            None => self.default_start()?,
        };
        info!(
            "Generating {} fixtures for division {} with {} teams from {}",
            pairings.len(),
            division_id,
            team_ids.len(),
            start
        );

        let fixtures = SlotAssigner::new(self.config.slots.clone())
            .with_scan_order(self.config.scan_order)
            .assign(pairings, start)?;
        let new_matches: Vec<NewMatch> = fixtures
            .iter()
            .map(|fixture| NewMatch::from_fixture(division_id, fixture))
            .collect();

        let records = self
            .repository
            .replace_scheduled(division_id, &new_matches)
            .await
            .map_err(|source| {
                error!("Failed to store fixtures for division {}: {}", division_id, source);
                FixtureError::Storage {
                    division_id,
                    source,
                }
            })?;

        info!("Stored {} fixtures for division {}", records.len(), division_id);
        Ok(records)
    }

    fn default_start(&self) -> Result<DateTime<Utc>, SchedulerError> {
        self.config
            .lead_time()
            .and_then(|lead| self.clock.now().checked_add_signed(lead))
            .ok_or_else(|| {
                SchedulerError::DegenerateConfiguration(format!(
                    "lead time of {} days is outside the calendar",
                    self.config.lead_time_days
                ))
            })
    }

    pub async fn generate_for_teams(
        &self,
        division_id: DivisionId,
        teams: &[Team],
        start: Option<DateTime<Utc>>,
    ) -> Result<Vec<MatchRecord>, FixtureError> {
        let team_ids: Vec<TeamId> = teams.iter().map(|t| t.id).collect();
        self.generate_fixtures(division_id, &team_ids, start).await
    }

    pub async fn fixtures_for_division(
        &self,
        division_id: DivisionId,
    ) -> Result<Vec<MatchRecord>, FixtureError> {
        self.repository
            .matches_for_division(division_id)
            .await
            .map_err(|source| FixtureError::Storage {
                division_id,
                source,
            })
    }
}
