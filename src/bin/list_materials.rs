//! Print one page of aggregated SDS materials as a JSON envelope.
//!
//! Usage: `list_materials [material_type] [page] [page_size]`
//! Defaults match the inbound API contract: `raw_material`, page 1, 20 rows.

use anyhow::Result;
use tracing_subscriber::EnvFilter;

use sds_backend::response::{ErrorResponse, SuccessResponse};
use sds_backend::DatabaseManager;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = std::env::args().collect();
    let material_type = args
        .get(1)
        .cloned()
        .unwrap_or_else(|| "raw_material".to_string());
    let page: u32 = args.get(2).and_then(|v| v.parse().ok()).unwrap_or(1);
    let page_size: u32 = args.get(3).and_then(|v| v.parse().ok()).unwrap_or(20);

    let manager = DatabaseManager::with_default_config().await?;
    let service = manager.material_service();

    match service
        .list_materials(&material_type, page, page_size)
        .await
    {
        Ok(listing) => {
            if listing.dropped_records > 0 {
                tracing::warn!(
                    dropped = listing.dropped_records,
                    "page returned with dropped records"
                );
            }
            let envelope = SuccessResponse::new(
                &listing.data,
                Some(serde_json::to_value(&listing.meta)?),
            );
            println!("{}", serde_json::to_string_pretty(&envelope)?);
            Ok(())
        }
        Err(err) => {
            let envelope = ErrorResponse::from(&err);
            println!("{}", serde_json::to_string_pretty(&envelope)?);
            std::process::exit(1);
        }
    }
}
