use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub type TeamId = i64;
pub type DivisionId = i64;
pub type MatchId = i64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    pub id: TeamId,
    pub name: String,
    pub short_name: String,
    pub city: String,
    pub division_id: DivisionId,
}

/// An unscheduled meeting between two entities in a logical round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pairing<T> {
    pub home: T,
    pub away: T,
    pub round: u32,
}

impl<T> Pairing<T> {
    /// The same meeting with venues swapped, moved `offset` rounds later.
    pub fn reversed(self, offset: u32) -> Self {
        Self {
            home: self.away,
            away: self.home,
            round: self.round + offset,
        }
    }

    pub fn involves(&self, entity: &T) -> bool
    where
        T: PartialEq,
    {
        &self.home == entity || &self.away == entity
    }
}

/// A pairing bound to a concrete kick-off time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledFixture<T> {
    pub pairing: Pairing<T>,
    pub kickoff: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MatchStatus {
    Scheduled,
    InProgress,
    Finished,
    Cancelled,
}

impl MatchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchStatus::Scheduled => "SCHEDULED",
            MatchStatus::InProgress => "IN_PROGRESS",
            MatchStatus::Finished => "FINISHED",
            MatchStatus::Cancelled => "CANCELLED",
        }
    }
}

impl fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MatchStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SCHEDULED" => Ok(MatchStatus::Scheduled),
            "IN_PROGRESS" => Ok(MatchStatus::InProgress),
            "FINISHED" => Ok(MatchStatus::Finished),
            "CANCELLED" => Ok(MatchStatus::Cancelled),
            other => Err(format!("Unknown match status: {}", other)),
        }
    }
}

/// A match about to be written by the fixture service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewMatch {
    pub division_id: DivisionId,
    pub home_team_id: TeamId,
    pub away_team_id: TeamId,
    pub round: u32,
    pub match_date: DateTime<Utc>,
}

impl NewMatch {
    pub fn from_fixture(division_id: DivisionId, fixture: &ScheduledFixture<TeamId>) -> Self {
        Self {
            division_id,
            home_team_id: fixture.pairing.home,
            away_team_id: fixture.pairing.away,
            round: fixture.pairing.round,
            match_date: fixture.kickoff,
        }
    }

    /// A team can never play against itself.
    pub fn validate(&self) -> Result<(), String> {
        if self.home_team_id == self.away_team_id {
            return Err(format!(
                "Team {} cannot play against itself",
                self.home_team_id
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchRecord {
    pub id: MatchId,
    pub division_id: DivisionId,
    pub home_team_id: TeamId,
    pub away_team_id: TeamId,
    pub round: u32,
    pub match_date: DateTime<Utc>,
    pub status: MatchStatus,
    pub home_score: u32,
    pub away_score: u32,
}

impl MatchRecord {
    pub fn scheduled(id: MatchId, new_match: &NewMatch) -> Self {
        Self {
            id,
            division_id: new_match.division_id,
            home_team_id: new_match.home_team_id,
            away_team_id: new_match.away_team_id,
            round: new_match.round,
            match_date: new_match.match_date,
            status: MatchStatus::Scheduled,
            home_score: 0,
            away_score: 0,
        }
    }
}

/// Renders team ids, since a record does not carry team names. Use
/// `export::write_fixtures_csv` for a listing with names.
impl fmt::Display for MatchRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} vs {}", self.home_team_id, self.away_team_id)
    }
}
