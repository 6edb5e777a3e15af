mod cli;
mod infra;
mod routes;
mod server;

use loyalty_rules::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
