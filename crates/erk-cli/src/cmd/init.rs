use anyhow::Context;
use erk_core::{config::Config, io, paths};
use std::path::Path;

pub fn run(root: &Path) -> anyhow::Result<()> {
    println!("Initializing erk in: {}", root.display());

    let erk_dir = paths::erk_dir(root);
    io::ensure_dir(&erk_dir)
        .with_context(|| format!("failed to create {}", erk_dir.display()))?;

    let config = if paths::config_path(root).exists() {
        println!("  exists:  {}", paths::CONFIG_FILE);
        Config::load(root).context("failed to load config")?
    } else {
        let cfg = Config::default();
        cfg.save(root).context("failed to write config.yaml")?;
        println!("  created: {}", paths::CONFIG_FILE);
        cfg
    };

    let issues = config.issues_path(root);
    io::ensure_dir(&issues)
        .with_context(|| format!("failed to create {}", issues.display()))?;
    println!("  issues:  {}", config.issues_dir);

    let gitkeep = issues.join(".gitkeep");
    io::write_if_missing(&gitkeep, b"").context("failed to write .gitkeep")?;

    Ok(())
}
