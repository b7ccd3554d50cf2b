use std::path::Path;

use anyhow::Result;
use console::style;

use super::commands::ValidateArgs;

pub fn handle_validate(args: ValidateArgs) -> Result<()> {
    let config = crate::config::parser::load_config(Path::new(&args.config))?;
    println!("{} {}", style("Configuration valid:").green().bold(), args.config);
    println!("  probe batch size:    {}", config.probes.batch_size);
    println!("  probe budget:        {}", config.probes.max_probes);
    println!("  collector timeout:   {}ms", config.collectors.timeout_ms);
    println!("  engine cooldown:     {}ms", config.engine.cooldown_ms);
    println!("  telemetry capacity:  {}", config.telemetry.capacity);
    Ok(())
}
