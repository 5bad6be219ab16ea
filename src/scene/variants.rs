//! Render-only copies of one geometry graph.
//!
//! A variant is a deep clone of the loaded graph whose meshes carry their own
//! material and visibility layer. Variants own no transform: every frame they
//! are flattened against the single authoritative [`TransformState`].

use super::TransformState;
use glam::{Mat4, Vec3};

/// Visibility layer tag in `0..8`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Layer(u8);

impl Layer {
    pub const COUNT: u8 = 8;
    /// Default visibility; untagged nodes live here.
    pub const BASE: Layer = Layer(0);
    pub const EMPHASIS: Layer = Layer(1);
    pub const OUTLINE: Layer = Layer(2);

    pub fn new(index: u8) -> Option<Self> {
        (index < Self::COUNT).then_some(Self(index))
    }

    pub fn index(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for Layer {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Layer::new(value).ok_or_else(|| format!("layer {value} out of range 0..{}", Layer::COUNT))
    }
}

impl From<Layer> for u8 {
    fn from(layer: Layer) -> Self {
        layer.0
    }
}

/// Set of layers a render pass draws.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, serde::Serialize, serde::Deserialize)]
pub struct LayerMask(u8);

impl LayerMask {
    pub const NONE: LayerMask = LayerMask(0x00);

    pub const fn single(layer: Layer) -> Self {
        Self(1 << layer.0)
    }

    pub const fn with(self, layer: Layer) -> Self {
        Self(self.0 | (1 << layer.0))
    }

    pub fn contains(self, layer: Layer) -> bool {
        self.0 & (1 << layer.0) != 0
    }

    pub fn bits(self) -> u8 {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Shading {
    #[default]
    Lit,
    Unlit,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct MaterialDesc {
    pub base_color: [f32; 4],
    pub color_map: Option<String>,
    pub metallic: f32,
    pub roughness: f32,
    pub emissive: [f32; 3],
    pub shading: Shading,
    pub wireframe: bool,
}

impl Default for MaterialDesc {
    fn default() -> Self {
        Self {
            base_color: [1.0, 1.0, 1.0, 1.0],
            color_map: None,
            metallic: 0.0,
            roughness: 1.0,
            emissive: [0.0, 0.0, 0.0],
            shading: Shading::Lit,
            wireframe: false,
        }
    }
}

/// Keeps only the color channel and drops the lighting response.
pub fn emphasis_material(source: &MaterialDesc) -> MaterialDesc {
    MaterialDesc {
        base_color: source.base_color,
        color_map: source.color_map.clone(),
        shading: Shading::Unlit,
        ..MaterialDesc::default()
    }
}

pub fn wireframe_material(source: &MaterialDesc) -> MaterialDesc {
    MaterialDesc {
        wireframe: true,
        ..source.clone()
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Mesh {
    pub geometry: String,
    #[serde(default)]
    pub material: MaterialDesc,
}

/// Node of a loaded geometry graph.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SceneNode {
    pub name: String,
    #[serde(default)]
    pub translation: [f32; 3],
    #[serde(default)]
    pub mesh: Option<Mesh>,
    #[serde(default)]
    pub children: Vec<SceneNode>,
    /// `None` means default visibility.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layer: Option<Layer>,
}

impl SceneNode {
    pub fn group(name: impl Into<String>, children: Vec<SceneNode>) -> Self {
        Self {
            name: name.into(),
            translation: [0.0; 3],
            mesh: None,
            children,
            layer: None,
        }
    }

    pub fn mesh(name: impl Into<String>, mesh: Mesh) -> Self {
        Self {
            name: name.into(),
            translation: [0.0; 3],
            mesh: Some(mesh),
            children: Vec::new(),
            layer: None,
        }
    }

    pub fn mesh_count(&self) -> usize {
        usize::from(self.mesh.is_some())
            + self.children.iter().map(SceneNode::mesh_count).sum::<usize>()
    }

    fn for_each_mut(&mut self, visit: &mut impl FnMut(&mut SceneNode)) {
        visit(self);
        for child in &mut self.children {
            child.for_each_mut(visit);
        }
    }

    fn flatten_into(&self, parent: Mat4, out: &mut Vec<DrawItem>) {
        let world = parent * Mat4::from_translation(Vec3::from(self.translation));
        if let Some(mesh) = &self.mesh {
            out.push(DrawItem {
                node: self.name.clone(),
                geometry: mesh.geometry.clone(),
                material: mesh.material.clone(),
                layer: self.layer.unwrap_or(Layer::BASE),
                world,
            });
        }
        for child in &self.children {
            child.flatten_into(world, out);
        }
    }
}

/// Clones `source` and retags every mesh to `layer` with a transformed material.
///
/// Non-mesh nodes keep their tag. A graph without meshes yields an equally
/// mesh-free clone that draws nothing.
pub fn derive_variant<F>(source: &SceneNode, layer: Layer, material_transform: F) -> SceneNode
where
    F: Fn(&MaterialDesc) -> MaterialDesc,
{
    let mut variant = source.clone();
    variant.for_each_mut(&mut |node| {
        if let Some(mesh) = &mut node.mesh {
            mesh.material = material_transform(&mesh.material);
            node.layer = Some(layer);
        }
    });
    variant
}

/// One mesh ready for a render pass.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawItem {
    pub node: String,
    pub geometry: String,
    pub material: MaterialDesc,
    pub layer: Layer,
    pub world: Mat4,
}

#[derive(Debug, Clone)]
pub struct Variant {
    pub name: String,
    pub root: SceneNode,
}

/// Primary graph plus its presentation-only variants.
#[derive(Debug, Clone)]
pub struct VariantSet {
    primary: SceneNode,
    variants: Vec<Variant>,
}

impl VariantSet {
    pub fn new(primary: SceneNode) -> Self {
        Self {
            primary,
            variants: Vec::new(),
        }
    }

    pub fn push<F>(&mut self, name: impl Into<String>, layer: Layer, material_transform: F)
    where
        F: Fn(&MaterialDesc) -> MaterialDesc,
    {
        let root = derive_variant(&self.primary, layer, material_transform);
        self.variants.push(Variant {
            name: name.into(),
            root,
        });
    }

    pub fn primary(&self) -> &SceneNode {
        &self.primary
    }

    pub fn variants(&self) -> &[Variant] {
        &self.variants
    }

    /// Flattens primary and variants against the current transform.
    pub fn draw_list(&self, state: &TransformState) -> Vec<DrawItem> {
        let root = state.matrix();
        let mut out = Vec::new();
        self.primary.flatten_into(root, &mut out);
        for variant in &self.variants {
            variant.root.flatten_into(root, &mut out);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{Axis, FieldPath, TransformField};

    fn textured_cube() -> SceneNode {
        SceneNode::group(
            "Scene",
            vec![SceneNode {
                translation: [0.0, 1.0, 0.0],
                ..SceneNode::mesh(
                    "Cube",
                    Mesh {
                        geometry: "cube".to_string(),
                        material: MaterialDesc {
                            color_map: Some("albedo.png".to_string()),
                            metallic: 0.8,
                            roughness: 0.2,
                            ..MaterialDesc::default()
                        },
                    },
                )
            }],
        )
    }

    #[test]
    fn variant_retags_meshes_only() {
        let source = textured_cube();
        let variant = derive_variant(&source, Layer::EMPHASIS, emphasis_material);

        assert_eq!(variant.layer, None);
        let cube = &variant.children[0];
        assert_eq!(cube.layer, Some(Layer::EMPHASIS));
        let material = &cube.mesh.as_ref().unwrap().material;
        assert_eq!(material.shading, Shading::Unlit);
        assert_eq!(material.color_map.as_deref(), Some("albedo.png"));
        assert_eq!(material.metallic, 0.0);
    }

    #[test]
    fn variant_is_independent_of_source() {
        let source = textured_cube();
        let mut variant = derive_variant(&source, Layer::OUTLINE, wireframe_material);
        variant.children[0].mesh.as_mut().unwrap().material.base_color = [1.0, 0.0, 0.0, 1.0];

        let original = &source.children[0];
        assert_eq!(original.layer, None);
        let material = &original.mesh.as_ref().unwrap().material;
        assert!(!material.wireframe);
        assert_eq!(material.base_color, [1.0, 1.0, 1.0, 1.0]);
    }

    #[test]
    fn graph_without_meshes_yields_empty_variant() {
        let empty = SceneNode::group("Empty", vec![SceneNode::group("Child", Vec::new())]);
        let variant = derive_variant(&empty, Layer::EMPHASIS, emphasis_material);
        assert_eq!(variant.mesh_count(), 0);

        let set = {
            let mut set = VariantSet::new(empty);
            set.push("bloom", Layer::EMPHASIS, emphasis_material);
            set
        };
        assert!(set.draw_list(&TransformState::default()).is_empty());
    }

    #[test]
    fn variants_share_the_authoritative_transform() {
        let mut set = VariantSet::new(textured_cube());
        set.push("bloom", Layer::EMPHASIS, emphasis_material);
        set.push("lines", Layer::OUTLINE, wireframe_material);

        let mut state = TransformState::default();
        state.apply_component(FieldPath::new(TransformField::Position, Axis::X), 5.0);
        let draws = set.draw_list(&state);

        assert_eq!(draws.len(), 3);
        let layers: Vec<_> = draws.iter().map(|draw| draw.layer).collect();
        assert_eq!(layers, vec![Layer::BASE, Layer::EMPHASIS, Layer::OUTLINE]);
        for draw in &draws {
            let origin = draw.world.transform_point3(Vec3::ZERO);
            assert!((origin - Vec3::new(5.0, 1.0, 0.0)).length() < 1e-6);
        }
    }

    #[test]
    fn layer_mask_membership() {
        let mask = LayerMask::single(Layer::BASE).with(Layer::OUTLINE);
        assert!(mask.contains(Layer::BASE));
        assert!(mask.contains(Layer::OUTLINE));
        assert!(!mask.contains(Layer::EMPHASIS));
        assert_eq!(mask.bits(), 0b101);
        assert!(Layer::new(8).is_none());
    }
}
