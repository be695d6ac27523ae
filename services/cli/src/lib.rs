mod cli;
mod demo;
mod fixtures;
mod infra;

use cleanflow::error::AppError;

pub fn run() -> Result<(), AppError> {
    cli::run()
}
