//! clubcal main entrypoint.

use clubcal::errors::AppError;
use clubcal::run;
use clubcal::ui::messages::{error, field_errors};

fn main() {
    if let Err(e) = run() {
        match &e {
            AppError::Validation(errors) => field_errors(errors),
            other => error(other),
        }
        std::process::exit(1);
    }
}
