use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::error::RepositoryError;
use crate::types::{DivisionId, MatchId, MatchRecord, MatchStatus, NewMatch};

/// Storage for a division's match calendar.
#[async_trait]
pub trait MatchRepository: Send + Sync {
    /// Deletes the division's `SCHEDULED` matches and inserts `matches` as one
    /// transition. On error the stored calendar is left as it was.
    async fn replace_scheduled(
        &self,
        division_id: DivisionId,
        matches: &[NewMatch],
    ) -> Result<Vec<MatchRecord>, RepositoryError>;

    /// All matches of a division, ordered by date then id.
    async fn matches_for_division(
        &self,
        division_id: DivisionId,
    ) -> Result<Vec<MatchRecord>, RepositoryError>;
}

pub(crate) fn validate_batch(
    division_id: DivisionId,
    matches: &[NewMatch],
) -> Result<(), RepositoryError> {
    for new_match in matches {
        new_match.validate().map_err(RepositoryError::InvalidMatch)?;
        if new_match.division_id != division_id {
            return Err(RepositoryError::InvalidMatch(format!(
                "match belongs to division {}, expected {}",
                new_match.division_id, division_id
            )));
        }
    }
    Ok(())
}

#[derive(Default)]
struct MemoryState {
    matches: Vec<MatchRecord>,
    next_id: MatchId,
}

impl MemoryState {
    fn allocate_id(&mut self) -> MatchId {
        self.next_id += 1;
        self.next_id
    }
}

#[derive(Default)]
pub struct InMemoryMatchRepository {
    state: Mutex<MemoryState>,
}

impl InMemoryMatchRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a match in an arbitrary state, e.g. one already being played.
    pub async fn insert(
        &self,
        new_match: &NewMatch,
        status: MatchStatus,
    ) -> Result<MatchRecord, RepositoryError> {
        new_match.validate().map_err(RepositoryError::InvalidMatch)?;
        let mut state = self.state.lock().await;
        let mut record = MatchRecord::scheduled(state.allocate_id(), new_match);
        record.status = status;
        state.matches.push(record.clone());
        Ok(record)
    }

    pub async fn len(&self) -> usize {
        self.state.lock().await.matches.len()
    }
}

#[async_trait]
impl MatchRepository for InMemoryMatchRepository {
    async fn replace_scheduled(
        &self,
        division_id: DivisionId,
        matches: &[NewMatch],
    ) -> Result<Vec<MatchRecord>, RepositoryError> {
        validate_batch(division_id, matches)?;

        let mut state = self.state.lock().await;
        state
            .matches
            .retain(|m| m.division_id != division_id || m.status != MatchStatus::Scheduled);

        let mut created = Vec::with_capacity(matches.len());
        for new_match in matches {
            created.push(MatchRecord::scheduled(state.allocate_id(), new_match));
        }
        state.matches.extend(created.iter().cloned());
        Ok(created)
    }

    async fn matches_for_division(
        &self,
        division_id: DivisionId,
    ) -> Result<Vec<MatchRecord>, RepositoryError> {
        let state = self.state.lock().await;
        let mut matches: Vec<MatchRecord> = state
            .matches
            .iter()
            .filter(|m| m.division_id == division_id)
            .cloned()
            .collect();
        matches.sort_by_key(|m| (m.match_date, m.id));
        Ok(matches)
    }
}
