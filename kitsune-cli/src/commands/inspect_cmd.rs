use std::fmt::Write;
use std::path::Path;

use anyhow::Context;
use kitsune_runtime::animation::ChannelValues;
use kitsune_runtime::config::ActorConfig;
use kitsune_runtime::LoadedModel;

pub fn run(model_path: &Path, actor: &ActorConfig) -> anyhow::Result<()> {
    let model = LoadedModel::load(model_path)
        .with_context(|| format!("loading {}", model_path.display()))?;
    print!("{}", describe(&model, actor));
    Ok(())
}

/// Human-readable summary: node tree, mesh, skin and clips, with the clips
/// the gait machine would use marked.
pub fn describe(model: &LoadedModel, actor: &ActorConfig) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "Nodes ({}):", model.nodes.len());
    for &i in &model.traversal {
        let mut depth = 0;
        let mut parent = model.nodes[i].parent;
        while let Some(p) = parent {
            depth += 1;
            parent = model.nodes[p].parent;
        }
        let name = match model.nodes[i].name.as_str() {
            "" => "<unnamed>",
            n => n,
        };
        let _ = writeln!(out, "  {}{} [{}]", "  ".repeat(depth), name, i);
    }

    match &model.mesh {
        Some(mesh) => {
            let _ = writeln!(
                out,
                "Mesh: node {}, {} vertices, {} triangles, texture: {}",
                mesh.node,
                mesh.vertices.len(),
                mesh.indices.len() / 3,
                mesh.texture
                    .as_ref()
                    .map_or("none".to_string(), |t| format!("{}x{}", t.width, t.height)),
            );
        }
        None => {
            let _ = writeln!(out, "Mesh: none");
        }
    }

    match &model.skin {
        Some(skin) => {
            let _ = writeln!(out, "Skin: {} joints", skin.joints.len());
        }
        None => {
            let _ = writeln!(out, "Skin: none (rigid)");
        }
    }

    let _ = writeln!(out, "Clips ({}):", model.clips.len());
    for (i, clip) in model.clips.iter().enumerate() {
        let role = if i == actor.idle_clip {
            "  <- idle"
        } else if i == actor.walk_clip {
            "  <- walk"
        } else {
            ""
        };
        let (mut t, mut r, mut s) = (0, 0, 0);
        for ch in &clip.channels {
            match ch.values {
                ChannelValues::Translation(_) => t += 1,
                ChannelValues::Rotation(_) => r += 1,
                ChannelValues::Scale(_) => s += 1,
            }
        }
        let _ = writeln!(
            out,
            "  [{i}] {:<12} {:>6.3}s  T{t} R{r} S{s}{role}",
            clip.name, clip.duration
        );
    }

    if model.clips.len() <= actor.idle_clip.max(actor.walk_clip) {
        let _ = writeln!(
            out,
            "warning: needs clips {} (idle) and {} (walk) to be driven",
            actor.idle_clip, actor.walk_clip
        );
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const RIG_GLTF: &[u8] = include_bytes!("../../../kitsune-runtime/src/testdata/rig.gltf");

    #[test]
    fn test_describe_lists_tree_and_roles() {
        let model = LoadedModel::from_slice(RIG_GLTF).unwrap();
        let text = describe(&model, &ActorConfig::default());

        assert!(text.contains("Nodes (3):"));
        assert!(text.contains("  root [0]"));
        assert!(text.contains("    bone [1]"));
        assert!(text.contains("3 vertices, 1 triangles"));
        assert!(text.contains("Skin: 2 joints"));
        assert!(text.contains("[0] Survey"));
        assert!(text.contains("<- idle"));
        assert!(text.contains("<- walk"));
        assert!(!text.contains("warning"));
    }

    #[test]
    fn test_describe_warns_on_missing_clip() {
        let model = LoadedModel::from_slice(RIG_GLTF).unwrap();
        let actor = ActorConfig {
            walk_clip: 4,
            ..Default::default()
        };
        assert!(describe(&model, &actor).contains("warning"));
    }
}
