use std::path::{Path, PathBuf};

use anyhow::Context;

use kitsune_runtime::StageConfig;
use serde::{Deserialize, Serialize};

/// Name of the per-project config file.
pub const CONFIG_FILE: &str = "kitsune.toml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "Kitsune".to_string(),
            width: 1280,
            height: 720,
        }
    }
}

/// Contents of kitsune.toml.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    /// Model path, relative to the config file.
    pub model: Option<PathBuf>,
    pub window: WindowConfig,
    pub stage: StageConfig,
}

/// A kitsune.toml found on disk.
#[derive(Debug, Clone)]
pub struct ProjectContext {
    /// Directory holding the config file.
    pub project_root: PathBuf,
    pub config_path: PathBuf,
    pub config: ViewerConfig,
}

impl ProjectContext {
    /// Configured model path resolved against the project root.
    pub fn model_path(&self) -> Option<PathBuf> {
        self.config.model.as_ref().map(|m| self.project_root.join(m))
    }
}

/// Look for kitsune.toml from the current directory upwards.
pub fn detect_project_context() -> anyhow::Result<Option<ProjectContext>> {
    detect_project_context_from(&std::env::current_dir()?)
}

/// Look for kitsune.toml starting at `start`, walking up. `Ok(None)` when no
/// directory up to the filesystem root has one.
pub fn detect_project_context_from(start: &Path) -> anyhow::Result<Option<ProjectContext>> {
    let mut dir = start.to_path_buf();
    loop {
        let config_path = dir.join(CONFIG_FILE);
        if config_path.is_file() {
            let config = load_config(&config_path)?;
            log::debug!("using {}", config_path.display());
            return Ok(Some(ProjectContext {
                project_root: dir,
                config_path,
                config,
            }));
        }
        if !dir.pop() {
            return Ok(None);
        }
    }
}

pub fn load_config(path: &Path) -> anyhow::Result<ViewerConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    toml::from_str(&content).with_context(|| format!("parsing {}", path.display()))
}

/// Starter config written by `kitsune init`. Every value shown is the default.
pub fn starter_config(model: &str) -> String {
    format!(
        r#"# Kitsune viewer settings. Delete any line to fall back to its default.
model = "{model}"

[window]
title = "Kitsune"
width = 1280
height = 720

[stage]
clear_color = 0x000000
release_keys_on_blur = false
max_pixel_ratio = 2.0

[stage.actor]
scale = 0.025
idle_clip = 0
walk_clip = 1
time_scale = 1.0
cast_shadow = true
# per_frame moves `speed` units every frame, per_second scales by frame time
movement = {{ mode = "per_frame", speed = 0.1 }}

[stage.camera]
fov_degrees = 70.0
near = 0.1
far = 100.0
position = [3.0, 3.0, 3.0]
target = [0.0, 0.75, 0.0]
enable_damping = true
damping_factor = 0.05

[stage.lighting]
ambient_color = 0xffffff
ambient_intensity = 2.4
light_color = 0xffffff
light_intensity = 1.8
light_position = [5.0, 5.0, 5.0]
shadows = true
shadow_map_size = 1024

[stage.floor]
width = 10.0
depth = 15.0
color = 0x444444
metalness = 0.0
roughness = 0.5
"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use kitsune_runtime::MovementPolicy;

    #[test]
    fn test_detect_in_start_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "model = \"Fox.glb\"\n").unwrap();

        let ctx = detect_project_context_from(dir.path()).unwrap().unwrap();
        assert_eq!(ctx.project_root, dir.path());
        assert_eq!(ctx.model_path(), Some(dir.path().join("Fox.glb")));
        assert_eq!(ctx.config.window, WindowConfig::default());
    }

    #[test]
    fn test_detect_walks_up() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE),
            "[stage.actor]\nwalk_clip = 2\n",
        )
        .unwrap();
        let nested = dir.path().join("assets/models");
        std::fs::create_dir_all(&nested).unwrap();

        let ctx = detect_project_context_from(&nested).unwrap().unwrap();
        assert_eq!(ctx.project_root, dir.path());
        assert_eq!(ctx.config.stage.actor.walk_clip, 2);
        assert!(ctx.model_path().is_none());
    }

    #[test]
    fn test_detect_no_project() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a/b/c");
        std::fs::create_dir_all(&nested).unwrap();
        // an ancestor of the temp dir could in theory hold a kitsune.toml
        if let Some(ctx) = detect_project_context_from(&nested).unwrap() {
            assert!(!ctx.project_root.starts_with(dir.path()));
        }
    }

    #[test]
    fn test_malformed_config_is_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "model = [").unwrap();
        let err = detect_project_context_from(dir.path()).unwrap_err();
        assert!(format!("{err:#}").contains(CONFIG_FILE));
    }

    #[test]
    fn test_starter_config_matches_defaults() {
        let config: ViewerConfig = toml::from_str(&starter_config("Fox.glb")).unwrap();
        assert_eq!(config.model, Some(PathBuf::from("Fox.glb")));
        assert_eq!(config.window, WindowConfig::default());
        assert_eq!(config.stage, StageConfig::default());
        assert_eq!(config.stage.actor.movement, MovementPolicy::PerFrame(0.1));
    }
}
