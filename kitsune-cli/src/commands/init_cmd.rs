use std::path::{Path, PathBuf};

use crate::config::{starter_config, CONFIG_FILE};

pub fn run(dir: &Path, model: &str, force: bool) -> anyhow::Result<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(CONFIG_FILE);
    if path.exists() && !force {
        anyhow::bail!(
            "{} already exists. Use --force to overwrite it.",
            path.display()
        );
    }
    std::fs::write(&path, starter_config(model))?;
    println!("Wrote {}", path.display());
    Ok(path)
}
