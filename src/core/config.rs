use crate::config::Config;
use crate::config::migrate::missing_keys;
use crate::errors::{AppError, AppResult};
use crate::ui::messages::{error, info, success, warning};
use std::fs;
use std::path::Path;
use std::process::Command;

pub struct ConfigLogic;

impl ConfigLogic {
    pub fn print(cfg: &Config) -> AppResult<()> {
        println!("📄 Current configuration:\n");
        println!("{}", serde_yaml::to_string(cfg)?);
        Ok(())
    }

    /// Report keys this version knows that the file on disk lacks.
    pub fn check(path: &Path) -> AppResult<Vec<String>> {
        if !path.exists() {
            return Err(AppError::Config(format!(
                "configuration file not found: {} (run `clubcal init`)",
                path.display()
            )));
        }
        let missing = missing_keys(&fs::read_to_string(path)?)?;
        if missing.is_empty() {
            success("Configuration file is complete.");
        } else {
            warning(format!(
                "Missing keys: {} (run `clubcal config --migrate`)",
                missing.join(", ")
            ));
        }
        Ok(missing)
    }

    fn default_editor() -> String {
        std::env::var("EDITOR")
            .or_else(|_| std::env::var("VISUAL"))
            .unwrap_or_else(|_| {
                if cfg!(target_os = "windows") {
                    "notepad".to_string()
                } else {
                    "nano".to_string()
                }
            })
    }

    /// Open the file in `editor`, falling back to `$EDITOR`/`$VISUAL` or
    /// the platform default.
    pub fn edit(path: &Path, editor: Option<&str>) -> AppResult<()> {
        let fallback = Self::default_editor();
        let requested = editor.map(str::to_string).unwrap_or_else(|| fallback.clone());

        match Command::new(&requested).arg(path).status() {
            Ok(s) if s.success() => {
                success(format!("Configuration file edited using '{requested}'"));
                return Ok(());
            }
            _ if requested == fallback => {
                error(format!("Failed to edit configuration file using '{requested}'"));
                return Err(AppError::Config(format!("could not run editor '{requested}'")));
            }
            _ => warning(format!(
                "Editor '{requested}' not available, falling back to '{fallback}'"
            )),
        }

        match Command::new(&fallback).arg(path).status() {
            Ok(s) if s.success() => {
                info(format!("Configuration file edited using fallback '{fallback}'"));
                Ok(())
            }
            Ok(_) | Err(_) => {
                error(format!("Failed to edit configuration file using '{fallback}'"));
                Err(AppError::Config(format!("could not run editor '{fallback}'")))
            }
        }
    }
}
