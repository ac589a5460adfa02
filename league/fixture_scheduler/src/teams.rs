use std::collections::HashSet;
use std::io::Read;
use std::path::Path;
use tracing::debug;

use crate::error::RepositoryError;
use crate::types::{DivisionId, Team};

/// Supplies the teams of a division in a stable order.
pub trait TeamSource {
    fn teams_in_division(&self, division_id: DivisionId) -> Result<Vec<Team>, RepositoryError>;
}

/// Teams read from a CSV file with columns `id,name,short_name,city,division_id`.
#[derive(Debug, Clone)]
pub struct CsvTeamSource {
    teams: Vec<Team>,
}

impl CsvTeamSource {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, RepositoryError> {
        let file = std::fs::File::open(path.as_ref())?;
        debug!("Loading teams from {:?}", path.as_ref());
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, RepositoryError> {
        let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
        let mut teams = Vec::new();
        let mut ids = HashSet::new();

        for result in rdr.deserialize() {
            let team: Team = result?;
            if !ids.insert(team.id) {
                return Err(RepositoryError::Other(format!("Duplicate team id {}", team.id)));
            }
            teams.push(team);
        }

        Ok(Self { teams })
    }
}

impl TeamSource for CsvTeamSource {
    fn teams_in_division(&self, division_id: DivisionId) -> Result<Vec<Team>, RepositoryError> {
        Ok(self
            .teams
            .iter()
            .filter(|t| t.division_id == division_id)
            .cloned()
            .collect())
    }
}
