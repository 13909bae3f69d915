pub mod backup;
pub mod config;
pub mod del;
pub mod log;
pub mod overlap;
pub mod recurrence;
pub mod reschedule;
pub mod schedule;
pub mod series;
pub mod status;
pub mod validator;
