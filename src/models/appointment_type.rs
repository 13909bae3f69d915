use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of session booked between a staff member and an athlete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentType {
    Training,
    Trial,
    Assessment,
    FirstVisit,
    Meeting,
    Massage,
    Nutrition,
}

impl AppointmentType {
    pub const ALL: [AppointmentType; 7] = [
        AppointmentType::Training,
        AppointmentType::Trial,
        AppointmentType::Assessment,
        AppointmentType::FirstVisit,
        AppointmentType::Meeting,
        AppointmentType::Massage,
        AppointmentType::Nutrition,
    ];

    /// Convert enum → DB string
    pub fn to_db_str(&self) -> &'static str {
        match self {
            AppointmentType::Training => "training",
            AppointmentType::Trial => "trial",
            AppointmentType::Assessment => "assessment",
            AppointmentType::FirstVisit => "first_visit",
            AppointmentType::Meeting => "meeting",
            AppointmentType::Massage => "massage",
            AppointmentType::Nutrition => "nutrition",
        }
    }

    /// Convert DB string → enum
    pub fn from_db_str(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.to_db_str() == s)
    }

    /// Lenient parse for user input: case-insensitive, `-` and `_` are equivalent.
    pub fn from_input(s: &str) -> Option<Self> {
        let normalized = s.trim().to_lowercase().replace('-', "_");
        Self::from_db_str(&normalized)
    }

    pub fn label(&self) -> &'static str {
        match self {
            AppointmentType::Training => "Training",
            AppointmentType::Trial => "Trial",
            AppointmentType::Assessment => "Assessment",
            AppointmentType::FirstVisit => "First visit",
            AppointmentType::Meeting => "Meeting",
            AppointmentType::Massage => "Massage",
            AppointmentType::Nutrition => "Nutrition",
        }
    }
}

impl fmt::Display for AppointmentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_db_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn db_strings_are_stable() {
        for t in AppointmentType::ALL {
            assert_eq!(AppointmentType::from_db_str(t.to_db_str()), Some(t));
        }
    }

    #[test]
    fn input_accepts_dashes_and_case() {
        assert_eq!(
            AppointmentType::from_input("First-Visit"),
            Some(AppointmentType::FirstVisit)
        );
        assert_eq!(AppointmentType::from_input("yoga"), None);
    }
}
