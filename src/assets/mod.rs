use crate::scene::variants::{MaterialDesc, Mesh, SceneNode};
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("failed to read model at {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse model JSON {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Reads a geometry graph stored as a JSON [`SceneNode`] tree.
pub fn load_node_graph(path: &Path) -> Result<SceneNode, AssetError> {
    let json = std::fs::read_to_string(path).map_err(|source| AssetError::Read {
        path: path.display().to_string(),
        source,
    })?;
    let root: SceneNode = serde_json::from_str(&json).map_err(|source| AssetError::Parse {
        path: path.display().to_string(),
        source,
    })?;
    log::info!(
        "Loaded model {} ({} meshes)",
        path.display(),
        root.mesh_count()
    );
    Ok(root)
}

/// Built-in graph used when no model path is configured.
pub fn demo_cube() -> SceneNode {
    SceneNode::group(
        "Scene",
        vec![SceneNode::mesh(
            "Cube",
            Mesh {
                geometry: "cube".to_string(),
                material: MaterialDesc {
                    base_color: [0.8, 0.55, 0.2, 1.0],
                    metallic: 0.4,
                    roughness: 0.35,
                    ..MaterialDesc::default()
                },
            },
        )],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::variants::Layer;

    fn temp_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("scrollstage-model-{}-{}.json", name, std::process::id()))
    }

    #[test]
    fn loads_nested_graph() {
        let path = temp_path("nested");
        std::fs::write(
            &path,
            r#"{
                "name": "Scene",
                "children": [
                    { "name": "Pivot", "translation": [0.0, 1.0, 0.0], "children": [
                        { "name": "Cube", "mesh": { "geometry": "cube", "material": { "color_map": "albedo.png" } } }
                    ] },
                    { "name": "Halo", "layer": 1, "mesh": { "geometry": "ring" } }
                ]
            }"#,
        )
        .unwrap();
        let root = load_node_graph(&path).unwrap();
        let _ = std::fs::remove_file(&path);

        assert_eq!(root.mesh_count(), 2);
        let cube = &root.children[0].children[0];
        assert_eq!(
            cube.mesh.as_ref().unwrap().material.color_map.as_deref(),
            Some("albedo.png")
        );
        assert_eq!(root.children[1].layer, Some(Layer::EMPHASIS));
    }

    #[test]
    fn missing_file_is_read_error() {
        let err = load_node_graph(&temp_path("missing")).unwrap_err();
        assert!(matches!(err, AssetError::Read { .. }));
    }

    #[test]
    fn out_of_range_layer_is_parse_error() {
        let path = temp_path("bad-layer");
        std::fs::write(&path, r#"{ "name": "Scene", "layer": 9 }"#).unwrap();
        let err = load_node_graph(&path).unwrap_err();
        let _ = std::fs::remove_file(&path);
        assert!(matches!(err, AssetError::Parse { .. }));
    }

    #[test]
    fn demo_cube_has_one_mesh() {
        assert_eq!(demo_cube().mesh_count(), 1);
    }
}
