//! Install command: bootstrap the managed runtime ahead of first use.

use pybridge::{BridgeConfig, runtime};

pub async fn execute() -> anyhow::Result<()> {
    let config = BridgeConfig::default();
    let python = runtime::ensure(&config).await?;
    println!("python runtime ready at {}", python.display());
    Ok(())
}
