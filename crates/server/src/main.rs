//! NutriScan Server: HTTP API for nutrition estimates from food photos and
//! dish descriptions.

use server::ServerConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ServerConfig::load()?;
    server::start_server(config).await?;
    Ok(())
}
