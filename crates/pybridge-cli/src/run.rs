//! Run and eval commands: execute code through the bridge, print the result.

use std::time::Duration;

use pybridge::{BridgeConfig, PyBridge};
use serde_json::Value;

/// Execute a script file through the bridge.
pub async fn execute_file(path: &str, args: &[String], timeout: u64, port: u16) -> anyhow::Result<()> {
    let code = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| anyhow::anyhow!("failed to read {path}: {e}"))?;
    execute_inline(&code, args, timeout, port).await
}

/// Execute inline code through the bridge.
pub async fn execute_inline(
    code: &str,
    args: &[String],
    timeout: u64,
    port: u16,
) -> anyhow::Result<()> {
    let values = parse_args(args);

    let config = BridgeConfig {
        callback_port: port,
        result_timeout: Duration::from_secs(timeout),
        ..BridgeConfig::default()
    };

    let bridge = PyBridge::connect(config).await?;
    let result = bridge.run_with(code, &values).await?;

    println!("{}", serde_json::to_string_pretty(&Value::Object(result))?);
    Ok(())
}

/// Each `--arg` is parsed as a JSON value; bare words fall back to strings.
fn parse_args(args: &[String]) -> Vec<Value> {
    args.iter()
        .map(|raw| serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.clone())))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_args_json_and_bare() {
        let raw = vec![
            "3".to_string(),
            "[1, 2]".to_string(),
            "\"quoted\"".to_string(),
            "bare word".to_string(),
        ];
        let values = parse_args(&raw);
        assert_eq!(values[0], json!(3));
        assert_eq!(values[1], json!([1, 2]));
        assert_eq!(values[2], json!("quoted"));
        assert_eq!(values[3], json!("bare word"));
    }
}
