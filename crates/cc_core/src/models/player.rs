use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Gender {
    Male,
    Female,
    Other,
}

/// Playing role, used for roster display and selection hints.
///
/// The scoring engine itself never branches on role: any player may bat,
/// bowl, or field in a club game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlayerRole {
    Batter,
    Bowler,
    #[serde(rename = "All-Rounder")]
    AllRounder,
}

impl PlayerRole {
    /// Get all roles in display order
    pub fn all() -> &'static [PlayerRole] {
        &[PlayerRole::Batter, PlayerRole::Bowler, PlayerRole::AllRounder]
    }

    /// Get role name as string
    pub fn name(&self) -> &'static str {
        match self {
            PlayerRole::Batter => "Batter",
            PlayerRole::Bowler => "Bowler",
            PlayerRole::AllRounder => "All-Rounder",
        }
    }

    /// Parse from string (case-insensitive, accepts "all-rounder"/"allrounder")
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "batter" => Some(PlayerRole::Batter),
            "bowler" => Some(PlayerRole::Bowler),
            "all-rounder" | "allrounder" => Some(PlayerRole::AllRounder),
            _ => None,
        }
    }
}

/// Registered club member.
///
/// Identity (`id`) is immutable once assigned; everything else is editable
/// through the roster collaborator. The scoring engine only ever refers to
/// players by id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    /// Unique identifier (imported id or generated)
    pub id: String,

    /// Display name (e.g., "Rahul H")
    pub full_name: String,

    /// Contact email, doubles as the login identity
    pub email: String,

    /// Date of birth, ISO `YYYY-MM-DD`
    pub dob: String,

    pub gender: Gender,

    pub role: PlayerRole,

    /// Home state/province
    pub state: String,

    pub country: String,

    /// Avatar URL shown on rosters and scorecards
    pub photo_url: String,

    /// Date the player joined the club, ISO `YYYY-MM-DD`
    pub registration_date: String,

    /// Shirt number, if assigned
    pub jersey_number: Option<u32>,
}

impl Player {
    /// Create a new player with the required identity fields.
    ///
    /// Mainly for tests and registration; imports construct the struct
    /// directly from records.
    pub fn new(id: impl Into<String>, full_name: impl Into<String>, role: PlayerRole) -> Self {
        Self {
            id: id.into(),
            full_name: full_name.into(),
            email: String::new(),
            dob: String::new(),
            gender: Gender::Male,
            role,
            state: String::new(),
            country: String::new(),
            photo_url: String::new(),
            registration_date: String::new(),
            jersey_number: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parsing() {
        assert_eq!(PlayerRole::from_str("Batter"), Some(PlayerRole::Batter));
        assert_eq!(PlayerRole::from_str("bowler"), Some(PlayerRole::Bowler));
        assert_eq!(PlayerRole::from_str("All-Rounder"), Some(PlayerRole::AllRounder));
        assert_eq!(PlayerRole::from_str("allrounder"), Some(PlayerRole::AllRounder));
        assert_eq!(PlayerRole::from_str("keeper"), None);
    }

    #[test]
    fn test_role_serde_rename() {
        let json = serde_json::to_string(&PlayerRole::AllRounder).unwrap();
        assert_eq!(json, "\"All-Rounder\"");

        let parsed: PlayerRole = serde_json::from_str("\"All-Rounder\"").unwrap();
        assert_eq!(parsed, PlayerRole::AllRounder);
    }

    #[test]
    fn test_player_creation() {
        let player = Player::new("p1", "Rahul H", PlayerRole::Bowler);
        assert_eq!(player.id, "p1");
        assert_eq!(player.full_name, "Rahul H");
        assert_eq!(player.role, PlayerRole::Bowler);
        assert!(player.jersey_number.is_none());
    }
}
