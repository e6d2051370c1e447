use crate::app::{resolve_config_path, resolve_store_path};
use crate::cli::{Cli, InitArgs};
use crate::config::{write_config, PromptvConfig};
use crate::output::OutputMode;

pub fn handle_init(cli: &Cli, args: &InitArgs) -> anyhow::Result<()> {
    let config_path = resolve_config_path()?;
    if config_path.exists() && !args.force {
        return Err(anyhow::anyhow!(
            "Config already exists at {}\n\nRe-run with --force to overwrite it.",
            config_path.display()
        ));
    }

    let store_path = match args.path.as_ref() {
        Some(path) => std::path::PathBuf::from(path),
        None => resolve_store_path(cli, &PromptvConfig::default())?,
    };
    std::fs::create_dir_all(&store_path).map_err(|e| {
        anyhow::anyhow!(
            "Failed to create store directory {}: {}",
            store_path.display(),
            e
        )
    })?;

    let config = PromptvConfig::default().with_store_path(&store_path);
    write_config(&config_path, &config)?;
    tracing::info!(config = %config_path.display(), store = %store_path.display(), "initialized");

    if OutputMode::detect(cli.json).is_json() {
        println!(
            "{}",
            serde_json::json!({
                "config_path": config_path,
                "store_path": store_path,
            })
        );
    } else if !cli.quiet {
        println!("Initialized promptv store at {}", store_path.display());
        println!("Config written to {}", config_path.display());
    }
    Ok(())
}
