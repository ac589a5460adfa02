use std::collections::HashMap;
use std::io::Write;

use crate::error::RepositoryError;
use crate::types::{MatchRecord, Team, TeamId};

/// Writes a fixture list as CSV, resolving team names where known.
pub fn write_fixtures_csv<W: Write>(
    writer: W,
    matches: &[MatchRecord],
    teams: &[Team],
) -> Result<(), RepositoryError> {
    let names: HashMap<TeamId, &str> = teams.iter().map(|t| (t.id, t.name.as_str())).collect();
    let name_of = |id: TeamId| names.get(&id).map(|n| n.to_string()).unwrap_or_default();

    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record([
        "match_id",
        "division_id",
        "round",
        "match_date",
        "home_team_id",
        "home_team",
        "away_team_id",
        "away_team",
        "status",
    ])?;

    for m in matches {
        wtr.write_record([
            m.id.to_string(),
            m.division_id.to_string(),
            m.round.to_string(),
            m.match_date.to_rfc3339(),
            m.home_team_id.to_string(),
            name_of(m.home_team_id),
            m.away_team_id.to_string(),
            name_of(m.away_team_id),
            m.status.to_string(),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}
