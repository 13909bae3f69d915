use crate::db::pool::DbPool;
use crate::errors::{AppError, AppResult};
use crate::ui::messages::info;
use ansi_term::Colour;
use regex::Regex;

const OP_TARGET_MAX: usize = 60;

/// Colour of an audit operation.
fn color_for_operation(op: &str) -> Colour {
    match op {
        "add" => Colour::Green,
        "del" => Colour::Red,
        "cancel" => Colour::RGB(255, 99, 71),
        "edit" | "move" => Colour::Yellow,
        "status" => Colour::Cyan,
        "migration_applied" => Colour::Purple,
        "backup" | "export" => Colour::Blue,
        "init" => Colour::RGB(255, 153, 51),
        _ => Colour::White,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub id: i64,
    pub date: String,
    pub operation: String,
    pub target: String,
    pub message: String,
}

impl LogEntry {
    /// `operation (target)`, target shortened to its first 8 chars when it
    /// looks like a generated id.
    fn op_target(&self) -> String {
        if self.target.is_empty() {
            return self.operation.clone();
        }
        let target = if self.target.len() == 36 && self.target.matches('-').count() == 4 {
            &self.target[..8]
        } else {
            self.target.as_str()
        };
        format!("{} ({target})", self.operation)
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max.saturating_sub(3)).collect();
    out.push_str("...");
    out
}

pub struct LogLogic;

impl LogLogic {
    /// Audit lines, oldest first, optionally filtered by a regex matched
    /// against operation, target and message.
    pub fn load(pool: &DbPool, pattern: Option<&str>) -> AppResult<Vec<LogEntry>> {
        let re = pattern
            .map(Regex::new)
            .transpose()
            .map_err(|e| AppError::Other(format!("invalid log filter: {e}")))?;

        let mut stmt = pool.conn.prepare_cached(
            "SELECT id, date, operation, target, message FROM log ORDER BY id ASC",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(LogEntry {
                id: row.get(0)?,
                date: row.get(1)?,
                operation: row.get(2)?,
                target: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
                message: row.get(4)?,
            })
        })?;

        let mut entries = Vec::new();
        for r in rows {
            let e = r?;
            let keep = re.as_ref().is_none_or(|re| {
                re.is_match(&e.operation) || re.is_match(&e.target) || re.is_match(&e.message)
            });
            if keep {
                entries.push(e);
            }
        }
        Ok(entries)
    }

    pub fn print_log(pool: &DbPool, pattern: Option<&str>) -> AppResult<()> {
        let entries = Self::load(pool, pattern)?;
        if entries.is_empty() {
            info("No log entries.");
            return Ok(());
        }

        let labels: Vec<String> = entries
            .iter()
            .map(|e| truncate(&e.op_target(), OP_TARGET_MAX))
            .collect();
        let op_w = labels.iter().map(|l| l.chars().count()).max().unwrap_or(10);
        let id_w = entries.iter().map(|e| e.id.to_string().len()).max().unwrap_or(1);
        let date_w = entries.iter().map(|e| e.date.len()).max().unwrap_or(20);

        println!("📜 Internal log:\n");

        for (e, label) in entries.iter().zip(labels) {
            let color = color_for_operation(&e.operation);
            let padding = " ".repeat(op_w.saturating_sub(label.chars().count()));

            // only the operation word is coloured
            let colored = match label.split_once(' ') {
                Some((op, rest)) => format!("{} {rest}", color.paint(op)),
                None => color.paint(label.as_str()).to_string(),
            };

            println!(
                "{:>id_w$}: {:<date_w$} | {}{} => {}",
                e.id, e.date, colored, padding, e.message
            );
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::initialize::init_db;
    use crate::db::log::audit;

    #[test]
    fn filter_matches_any_column() {
        let pool = DbPool::in_memory().unwrap();
        init_db(&pool.conn).unwrap();
        audit(&pool.conn, "add", "abc", "Booked training").unwrap();
        audit(&pool.conn, "cancel", "def", "Cancelled 3 appointment(s), scope future").unwrap();

        let all = LogLogic::load(&pool, None).unwrap();
        assert!(all.len() >= 4);

        let cancels = LogLogic::load(&pool, Some("^cancel$")).unwrap();
        assert_eq!(cancels.len(), 1);
        assert_eq!(cancels[0].target, "def");

        let by_message = LogLogic::load(&pool, Some("(?i)booked")).unwrap();
        assert_eq!(by_message.len(), 1);

        assert!(LogLogic::load(&pool, Some("(")).is_err());
    }

    #[test]
    fn generated_ids_are_shortened() {
        let e = LogEntry {
            id: 1,
            date: String::new(),
            operation: "move".into(),
            target: "0f8fad5b-d9cb-469f-a165-70867728950e".into(),
            message: String::new(),
        };
        assert_eq!(e.op_target(), "move (0f8fad5b)");
        assert_eq!(truncate("abcdefgh", 5), "ab...");
    }
}
