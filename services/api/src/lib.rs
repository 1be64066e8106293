mod cli;
mod demo;
mod infra;
mod routes;
mod server;

use valve_estimate::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
