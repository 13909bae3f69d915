// src/export/logic.rs

use crate::db::log::audit_quiet;
use crate::db::pool::DbPool;
use crate::db::queries::{ListFilter, list_filtered};
use crate::errors::{AppError, AppResult};
use crate::export::ExportFormat;
use crate::export::fs_utils::ensure_writable;
use crate::export::json_csv::{export_csv, export_json};
use crate::export::model::AppointmentExport;
use crate::models::session::Session;
use crate::ui::messages::warning;
use crate::utils::date::period_filter;
use crate::utils::path::expand_tilde;

/// High-level export logic.
pub struct ExportLogic;

impl ExportLogic {
    /// Export appointments, cancelled ones included.
    ///
    /// - `file`: absolute path of the output file
    /// - `range`: `None`, `"all"`, or a period such as `YYYY`, `YYYY-MM`,
    ///   `YYYY-MM-DD` or `start:end` of the same shape
    ///
    /// Returns how many rows were written.
    pub fn export(
        pool: &DbPool,
        session: &Session,
        format: ExportFormat,
        file: &str,
        range: Option<&str>,
        force: bool,
    ) -> AppResult<usize> {
        let path = expand_tilde(file);

        if !path.is_absolute() {
            return Err(AppError::Export(format!(
                "output file path must be absolute: {file}"
            )));
        }

        let bounds = match range {
            None => None,
            Some(r) => period_filter(r)?,
        };

        let filter = ListFilter {
            from: bounds.map(|(from, _)| from),
            to: bounds.map(|(_, to)| to),
            include_cancelled: true,
            ..Default::default()
        };
        let rows: Vec<AppointmentExport> = list_filtered(&pool.conn, session, &filter)?
            .iter()
            .map(AppointmentExport::from)
            .collect();

        if rows.is_empty() {
            warning("No appointments found for the selected range.");
            return Ok(0);
        }

        ensure_writable(&path, force)?;

        match format {
            ExportFormat::Csv => export_csv(&rows, &path)?,
            ExportFormat::Json => export_json(&rows, &path)?,
        }

        audit_quiet(
            &pool.conn,
            "export",
            format.as_str(),
            &format!("Exported {} appointment(s) to {}", rows.len(), path.display()),
        );
        Ok(rows.len())
    }
}
