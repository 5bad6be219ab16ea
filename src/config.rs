use crate::anim::Ease;
use crate::render::{BloomSettings, PerspectiveCamera, ToneMapping};
use crate::scene::{AxisValues, TransformField, TransformState};
use crate::timeline::layout::PageLayout;
use crate::timeline::media::MediaRule;
use crate::timeline::ZoneBinding;
use crate::ui::EditPolicy;
use glam::Vec3;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct BloomConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(flatten)]
    pub settings: BloomSettings,
}

impl Default for BloomConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            settings: BloomSettings::default(),
        }
    }
}

/// Which render-only copies of the model to build.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct VariantToggles {
    pub emphasis: bool,
    pub wireframe: bool,
}

impl Default for VariantToggles {
    fn default() -> Self {
        Self {
            emphasis: true,
            wireframe: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct StageConfig {
    pub model_path: Option<PathBuf>,
    pub camera: PerspectiveCamera,
    pub initial_transform: TransformState,
    pub bloom: BloomConfig,
    pub tone_mapping: ToneMapping,
    pub variants: VariantToggles,
    pub panel: EditPolicy,
    pub layout: Option<PageLayout>,
    pub zones: Vec<ZoneBinding>,
    pub media_rules: Vec<MediaRule>,
}

impl Default for StageConfig {
    fn default() -> Self {
        Self {
            model_path: None,
            camera: PerspectiveCamera::default(),
            initial_transform: TransformState::new(
                Vec3::new(0.15, 0.0, -0.15),
                Vec3::ONE,
                Vec3::ZERO,
            ),
            bloom: BloomConfig::default(),
            tone_mapping: ToneMapping::default(),
            variants: VariantToggles::default(),
            panel: EditPolicy::default(),
            layout: None,
            zones: default_zones(),
            media_rules: vec![MediaRule {
                name: "wide-viewport".to_string(),
                min_width: 1980,
                field: TransformField::Scale,
                targets: AxisValues::splat(1.5),
                duration: 0.5,
                ease: Ease::POWER1_OUT,
            }],
        }
    }
}

fn default_zones() -> Vec<ZoneBinding> {
    vec![
        ZoneBinding::progress(
            "zone-two",
            0.2,
            0.6,
            TransformField::Rotation,
            AxisValues {
                x: Some(0.0),
                y: Some(6.3),
                z: Some(0.0),
            },
        ),
        ZoneBinding::progress(
            "zone-three",
            0.6,
            1.0,
            TransformField::Rotation,
            AxisValues {
                y: Some(12.6),
                ..AxisValues::default()
            },
        ),
        ZoneBinding::progress(
            "zone-three-scale",
            0.6,
            1.0,
            TransformField::Scale,
            AxisValues::splat(2.0),
        ),
    ]
}

pub fn save_config(config: &StageConfig, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(config)?;
    std::fs::write(path, json)?;
    Ok(())
}

pub fn load_config(path: &Path) -> Result<StageConfig> {
    let json = std::fs::read_to_string(path)?;
    let config: StageConfig = serde_json::from_str(&json)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::ToneMappingMode;
    use crate::timeline::ZoneRange;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("scrollstage-{}-{}.json", name, std::process::id()))
    }

    #[test]
    fn test_default_matches_authored_page() {
        let config = StageConfig::default();
        assert_eq!(config.camera.fov_deg, 35.0);
        assert_eq!(config.camera.position, Vec3::new(0.0, 0.0, 407.0));
        assert_eq!(
            config.initial_transform.get(TransformField::Rotation),
            Vec3::new(0.15, 0.0, -0.15)
        );
        assert!(!config.bloom.enabled);
        assert_eq!(config.bloom.settings.radius, 1.16);
        assert_eq!(config.tone_mapping.mode, ToneMappingMode::None);
        assert_eq!(config.zones.len(), 3);
        assert_eq!(config.media_rules[0].min_width, 1980);
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let config: StageConfig = serde_json::from_str(
            r#"{
                "bloom": { "enabled": true, "strength": 3.0, "radius": 0.5, "threshold": 0.1 },
                "tone_mapping": { "mode": "aces_filmic", "exposure": 1.2 },
                "zones": [{
                    "name": "spin",
                    "range": { "anchored": { "trigger": "zone-two", "start": "top bottom", "end": "bottom bottom" } },
                    "field": "rotation",
                    "targets": { "y": 6.3 },
                    "ease": "power2.inOut"
                }]
            }"#,
        )
        .unwrap();

        assert!(config.bloom.enabled);
        assert_eq!(config.bloom.settings.strength, 3.0);
        assert_eq!(config.tone_mapping.mode, ToneMappingMode::AcesFilmic);
        assert_eq!(config.camera, PerspectiveCamera::default());
        assert_eq!(config.panel, EditPolicy::default());

        let zone = &config.zones[0];
        assert!(zone.scrub);
        assert_eq!(zone.priority, 0);
        assert_eq!(zone.ease.to_string(), "power2.inOut");
        assert!(matches!(&zone.range, ZoneRange::Anchored { trigger, .. } if trigger == "zone-two"));
    }

    #[test]
    fn test_save_then_load_preserves_config() {
        let path = temp_path("roundtrip");
        let mut config = StageConfig::default();
        config.model_path = Some(PathBuf::from("models/cube.json"));
        config.variants.wireframe = true;

        save_config(&config, &path).unwrap();
        let loaded = load_config(&path).unwrap();
        let _ = std::fs::remove_file(&path);
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let path = temp_path("missing");
        assert!(matches!(load_config(&path), Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_malformed_file_is_json_error() {
        let path = temp_path("malformed");
        std::fs::write(&path, "{ not json").unwrap();
        let result = load_config(&path);
        let _ = std::fs::remove_file(&path);
        assert!(matches!(result, Err(ConfigError::Json(_))));
    }
}
