//! Player roster import/export.
//!
//! Imports are batch-tolerant: a record missing its identity fields is
//! rejected on its own and the rest of the batch continues. An unparsable
//! date is not an error; it falls back to today, logged at warn.

use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::models::{Gender, Player, PlayerRole};

/// Flat player record as it appears in an exported or imported sheet.
///
/// Everything is optional so partially-filled rows can still be examined;
/// the importer decides which absences are fatal per row.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlayerRecord {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub dob: Option<String>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub photo_url: Option<String>,
    #[serde(default)]
    pub registration_date: Option<String>,
    #[serde(default)]
    pub jersey_number: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportError {
    /// 1-based row number in the imported sheet.
    pub row: usize,
    pub reason: String,
}

#[derive(Debug, Default)]
pub struct ImportReport {
    pub imported: usize,
    pub updated: usize,
    pub errors: Vec<ImportError>,
}

impl ImportReport {
    pub fn accepted(&self) -> usize {
        self.imported + self.updated
    }
}

/// Merge a batch of records into the roster.
///
/// Known ids are updated in place, new ids appended. Rows missing id,
/// full name or email are reported individually; valid rows still land.
pub fn import_players(players: &mut Vec<Player>, records: &[PlayerRecord]) -> ImportReport {
    let today = Local::now().date_naive();
    let mut report = ImportReport::default();

    for (index, record) in records.iter().enumerate() {
        let row = index + 1;
        let (id, full_name, email) = match required_fields(record) {
            Ok(fields) => fields,
            Err(reason) => {
                log::warn!("import row {} skipped: {}", row, reason);
                report.errors.push(ImportError { row, reason });
                continue;
            }
        };

        let player = Player {
            id: id.clone(),
            full_name,
            email,
            dob: parse_imported_date(record.dob.as_deref(), today),
            gender: parse_gender(record.gender.as_deref()),
            role: parse_role(record.role.as_deref()),
            state: record.state.clone().unwrap_or_default(),
            country: record.country.clone().unwrap_or_default(),
            photo_url: record.photo_url.clone().unwrap_or_default(),
            registration_date: parse_imported_date(record.registration_date.as_deref(), today),
            jersey_number: record.jersey_number,
        };

        if let Some(existing) = players.iter_mut().find(|p| p.id == id) {
            *existing = player;
            report.updated += 1;
        } else {
            players.push(player);
            report.imported += 1;
        }
    }

    log::info!(
        "import finished: {} new, {} updated, {} rejected",
        report.imported,
        report.updated,
        report.errors.len()
    );
    report
}

/// Roster as flat records, ready for a sheet export.
pub fn export_players(players: &[Player]) -> Vec<PlayerRecord> {
    players
        .iter()
        .map(|p| PlayerRecord {
            id: Some(p.id.clone()),
            full_name: Some(p.full_name.clone()),
            email: Some(p.email.clone()),
            dob: Some(p.dob.clone()),
            gender: Some(format!("{:?}", p.gender)),
            role: Some(p.role.name().to_string()),
            state: Some(p.state.clone()),
            country: Some(p.country.clone()),
            photo_url: Some(p.photo_url.clone()),
            registration_date: Some(p.registration_date.clone()),
            jersey_number: p.jersey_number,
        })
        .collect()
}

fn required_fields(record: &PlayerRecord) -> Result<(String, String, String), String> {
    let id = record.id.as_deref().map(str::trim).filter(|s| !s.is_empty());
    let full_name = record.full_name.as_deref().map(str::trim).filter(|s| !s.is_empty());
    let email = record.email.as_deref().map(str::trim).filter(|s| !s.is_empty());
    match (id, full_name, email) {
        (Some(id), Some(name), Some(email)) => {
            Ok((id.to_string(), name.to_string(), email.to_string()))
        }
        _ => Err("missing required data (id, full name, email)".to_string()),
    }
}

/// Accept the date formats the club's sheets have historically used;
/// anything else becomes today.
fn parse_imported_date(raw: Option<&str>, today: NaiveDate) -> String {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return today.format("%Y-%m-%d").to_string();
    };
    for format in ["%Y-%m-%d", "%d-%m-%Y", "%d/%m/%Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(raw, format) {
            return date.format("%Y-%m-%d").to_string();
        }
    }
    log::warn!("could not parse date {:?}, defaulting to today", raw);
    today.format("%Y-%m-%d").to_string()
}

fn parse_gender(raw: Option<&str>) -> Gender {
    match raw.map(|s| s.trim().to_lowercase()).as_deref() {
        Some("male") => Gender::Male,
        Some("female") => Gender::Female,
        Some("other") => Gender::Other,
        _ => Gender::Other,
    }
}

fn parse_role(raw: Option<&str>) -> PlayerRole {
    raw.and_then(PlayerRole::from_str).unwrap_or(PlayerRole::AllRounder)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, name: &str, email: &str) -> PlayerRecord {
        PlayerRecord {
            id: Some(id.to_string()),
            full_name: Some(name.to_string()),
            email: Some(email.to_string()),
            ..PlayerRecord::default()
        }
    }

    #[test]
    fn test_import_appends_new_players() {
        let mut players = Vec::new();
        let records =
            vec![record("p1", "Rahul H", "rahul@club.in"), record("p2", "Amol G", "amol@club.in")];
        let report = import_players(&mut players, &records);

        assert_eq!(report.imported, 2);
        assert_eq!(report.updated, 0);
        assert!(report.errors.is_empty());
        assert_eq!(players.len(), 2);
        assert_eq!(players[0].full_name, "Rahul H");
    }

    #[test]
    fn test_import_updates_known_ids_in_place() {
        let mut players = vec![Player::new("p1", "Old Name", PlayerRole::Batter)];
        let mut updated = record("p1", "New Name", "new@club.in");
        updated.role = Some("Bowler".to_string());

        let report = import_players(&mut players, &[updated]);
        assert_eq!(report.updated, 1);
        assert_eq!(players.len(), 1);
        assert_eq!(players[0].full_name, "New Name");
        assert_eq!(players[0].role, PlayerRole::Bowler);
    }

    #[test]
    fn test_bad_row_does_not_stop_the_batch() {
        let mut players = Vec::new();
        let records = vec![
            record("p1", "Rahul H", "rahul@club.in"),
            PlayerRecord { id: Some("p2".to_string()), ..PlayerRecord::default() },
            record("p3", "Shree P", "shree@club.in"),
        ];
        let report = import_players(&mut players, &records);

        assert_eq!(report.accepted(), 2);
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].row, 2);
        assert_eq!(players.len(), 2);
    }

    #[test]
    fn test_date_formats_normalized() {
        let today = NaiveDate::from_ymd_opt(2024, 6, 2).unwrap();
        assert_eq!(parse_imported_date(Some("1994-04-26"), today), "1994-04-26");
        assert_eq!(parse_imported_date(Some("26-04-1994"), today), "1994-04-26");
        assert_eq!(parse_imported_date(Some("26/04/1994"), today), "1994-04-26");
    }

    #[test]
    fn test_unparsable_date_defaults_to_today() {
        let today = NaiveDate::from_ymd_opt(2024, 6, 2).unwrap();
        assert_eq!(parse_imported_date(Some("next tuesday"), today), "2024-06-02");
        assert_eq!(parse_imported_date(None, today), "2024-06-02");
    }

    #[test]
    fn test_export_round_trips_through_import() {
        let mut original = vec![Player::new("p1", "Rahul H", PlayerRole::Bowler)];
        original[0].email = "rahul@club.in".to_string();
        original[0].dob = "1980-10-05".to_string();
        original[0].jersey_number = Some(27);

        let records = export_players(&original);
        let mut restored = Vec::new();
        let report = import_players(&mut restored, &records);

        assert_eq!(report.imported, 1);
        assert_eq!(restored[0].id, original[0].id);
        assert_eq!(restored[0].full_name, original[0].full_name);
        assert_eq!(restored[0].role, original[0].role);
        assert_eq!(restored[0].dob, original[0].dob);
        assert_eq!(restored[0].jersey_number, Some(27));
    }
}
