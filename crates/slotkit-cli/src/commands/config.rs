//! Configuration management commands

use crate::console::CliConsole;
use anyhow::{Context, Result, bail};
use slotkit_core::config::{SlotkitConfig, render_for_path, save_to_file};
use std::path::Path;

/// Show the effective configuration (file plus environment overrides)
pub fn show(config_file: &Path, config: &SlotkitConfig) -> Result<()> {
    let console = CliConsole::new(true);
    console.print_header("Configuration");

    if config_file.exists() {
        console.success(&format!("Loaded configuration from: {}", config_file.display()));
    } else {
        console.warn(&format!(
            "Configuration file not found: {}",
            config_file.display()
        ));
        console.info("Using default configuration");
    }

    let rendered = render_for_path(config, config_file)?;
    println!("{}", rendered.trim_end());
    Ok(())
}

/// Write a configuration file with default values
pub fn init(config_file: &Path, force: bool) -> Result<()> {
    let console = CliConsole::new(true);
    console.print_header("Configuration Initialization");

    if config_file.exists() && !force {
        console.info("Use --force to overwrite");
        bail!(
            "Configuration file already exists: {}",
            config_file.display()
        );
    }

    save_to_file(&SlotkitConfig::default(), config_file).with_context(|| {
        format!(
            "Failed to write configuration file {}",
            config_file.display()
        )
    })?;

    console.success(&format!(
        "Created configuration file: {}",
        config_file.display()
    ));
    Ok(())
}
