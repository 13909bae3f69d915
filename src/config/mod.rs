use crate::core::overlap::OverlapPolicy;
use crate::core::recurrence::DEFAULT_SAFETY_CAP;
use crate::core::validator::Limits;
use crate::errors::AppResult;
use crate::models::appointment_type::AppointmentType;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::PathBuf;

pub mod migrate;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub database: String,
    /// Tenant used when `--org` is not given.
    #[serde(default)]
    pub default_org: Option<String>,
    #[serde(default = "default_type")]
    pub default_type: AppointmentType,
    #[serde(default = "default_duration")]
    pub default_duration_minutes: i64,
    #[serde(default = "default_notes_max")]
    pub notes_max_len: usize,
    #[serde(default = "default_location_max")]
    pub location_max_len: usize,
    #[serde(default = "default_safety_cap")]
    pub recurrence_safety_cap: u32,
    #[serde(default)]
    pub overlap_policy: OverlapPolicy,
    /// Types that may be double booked (group sessions and the like).
    #[serde(default = "default_double_booking")]
    pub double_booking_types: Vec<AppointmentType>,
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
}

fn default_type() -> AppointmentType {
    AppointmentType::Training
}
fn default_duration() -> i64 {
    60
}
fn default_notes_max() -> usize {
    1000
}
fn default_location_max() -> usize {
    200
}
fn default_safety_cap() -> u32 {
    DEFAULT_SAFETY_CAP
}
fn default_double_booking() -> Vec<AppointmentType> {
    vec![AppointmentType::Meeting]
}
fn default_log_filter() -> String {
    "warn".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self::with_database(Self::database_file())
    }
}

impl Config {
    fn with_database(db_path: PathBuf) -> Self {
        Self {
            database: db_path.to_string_lossy().to_string(),
            default_org: None,
            default_type: default_type(),
            default_duration_minutes: default_duration(),
            notes_max_len: default_notes_max(),
            location_max_len: default_location_max(),
            recurrence_safety_cap: default_safety_cap(),
            overlap_policy: OverlapPolicy::default(),
            double_booking_types: default_double_booking(),
            log_filter: default_log_filter(),
        }
    }

    /// Return the standard configuration directory depending on the platform
    pub fn config_dir() -> PathBuf {
        if cfg!(target_os = "windows") {
            dirs::config_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("clubcal")
        } else {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".clubcal")
        }
    }

    /// Return the full path of the config file
    pub fn config_file() -> PathBuf {
        Self::config_dir().join("clubcal.conf")
    }

    /// Return the full path of the SQLite database
    pub fn database_file() -> PathBuf {
        Self::config_dir().join("clubcal.sqlite")
    }

    /// Load configuration from file, or return defaults if not found
    pub fn load() -> AppResult<Self> {
        let path = Self::config_file();

        if path.exists() {
            let content = fs::read_to_string(&path)?;
            Ok(serde_yaml::from_str(&content)?)
        } else {
            Ok(Self::default())
        }
    }

    pub fn limits(&self) -> Limits {
        Limits {
            notes_max_len: self.notes_max_len,
            location_max_len: self.location_max_len,
        }
    }

    /// Initialize configuration and database files.
    ///
    /// A relative `custom_name` is resolved inside the config directory.
    /// Returns the database path that was set up.
    pub fn init_all(custom_name: Option<String>, is_test: bool) -> AppResult<PathBuf> {
        let dir = Self::config_dir();
        fs::create_dir_all(&dir)?;

        let db_path = match custom_name {
            Some(name) => {
                let p = PathBuf::from(&name);
                if p.is_absolute() { p } else { dir.join(p) }
            }
            None => Self::database_file(),
        };

        if let Some(parent) = db_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let config = Self::with_database(db_path.clone());

        // Write config file
        if !is_test {
            let yaml = serde_yaml::to_string(&config)?;
            let mut file = fs::File::create(Self::config_file())?;
            file.write_all(yaml.as_bytes())?;
            println!("✅ Config file: {:?}", Self::config_file());
        }

        // Create empty DB file if not exists
        if !db_path.exists() {
            fs::File::create(&db_path)?;
        }

        println!("✅ Database:    {:?}", db_path);

        Ok(db_path)
    }
}
