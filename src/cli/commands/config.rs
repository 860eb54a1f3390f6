use crate::cli::args::ConfigArgs;
use anyhow::Result;

/// Execute config command
pub fn execute_config(args: ConfigArgs) -> Result<()> {
    let config = args.pool.resolve()?;
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}
