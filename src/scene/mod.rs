pub mod variants;

use glam::{EulerRot, Mat4, Quat, Vec3};
use std::fmt;
use std::str::FromStr;

/// One of the three vector fields of the object transform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransformField {
    Rotation,
    Scale,
    Position,
}

impl TransformField {
    pub const ALL: [TransformField; 3] = [Self::Rotation, Self::Scale, Self::Position];

    pub fn name(self) -> &'static str {
        match self {
            Self::Rotation => "rotation",
            Self::Scale => "scale",
            Self::Position => "position",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub const ALL: [Axis; 3] = [Self::X, Self::Y, Self::Z];

    pub fn index(self) -> usize {
        match self {
            Self::X => 0,
            Self::Y => 1,
            Self::Z => 2,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::X => "x",
            Self::Y => "y",
            Self::Z => "z",
        }
    }
}

/// Scalar address inside the transform, e.g. `rotation.y`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FieldPath {
    pub field: TransformField,
    pub axis: Axis,
}

impl FieldPath {
    pub const fn new(field: TransformField, axis: Axis) -> Self {
        Self { field, axis }
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.field.name(), self.axis.name())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("invalid field path: {0}")]
pub struct FieldPathError(String);

impl FromStr for FieldPath {
    type Err = FieldPathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (field, axis) = s
            .split_once('.')
            .ok_or_else(|| FieldPathError(s.to_string()))?;
        let field = match field {
            "rotation" => TransformField::Rotation,
            "scale" => TransformField::Scale,
            "position" => TransformField::Position,
            _ => return Err(FieldPathError(s.to_string())),
        };
        let axis = match axis {
            "x" => Axis::X,
            "y" => Axis::Y,
            "z" => Axis::Z,
            _ => return Err(FieldPathError(s.to_string())),
        };
        Ok(Self { field, axis })
    }
}

/// Per-axis optional values, used for zone targets and start values.
#[derive(Debug, Clone, Copy, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct AxisValues {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub z: Option<f32>,
}

impl AxisValues {
    pub fn splat(value: f32) -> Self {
        Self {
            x: Some(value),
            y: Some(value),
            z: Some(value),
        }
    }

    pub fn get(&self, axis: Axis) -> Option<f32> {
        match axis {
            Axis::X => self.x,
            Axis::Y => self.y,
            Axis::Z => self.z,
        }
    }

    pub fn set(&mut self, axis: Axis, value: Option<f32>) {
        match axis {
            Axis::X => self.x = value,
            Axis::Y => self.y = value,
            Axis::Z => self.z = value,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Axis, f32)> + '_ {
        Axis::ALL
            .into_iter()
            .filter_map(|axis| self.get(axis).map(|value| (axis, value)))
    }
}

/// Authoritative rotation/scale/position of the rendered object.
///
/// Only the tween engine writes it; every other component reads it or asks the
/// tween engine for a change, so each mutation is observable by the panel.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TransformState {
    rotation: Vec3,
    scale: Vec3,
    position: Vec3,
}

impl Default for TransformState {
    fn default() -> Self {
        Self::new(Vec3::ZERO, Vec3::ONE, Vec3::ZERO)
    }
}

impl TransformState {
    pub fn new(rotation: Vec3, scale: Vec3, position: Vec3) -> Self {
        Self {
            rotation,
            scale: scale.max(Vec3::ZERO),
            position,
        }
    }

    pub fn get(&self, field: TransformField) -> Vec3 {
        match field {
            TransformField::Rotation => self.rotation,
            TransformField::Scale => self.scale,
            TransformField::Position => self.position,
        }
    }

    pub fn component(&self, path: FieldPath) -> f32 {
        self.get(path.field)[path.axis.index()]
    }

    /// Last write wins; scale components are floored at zero.
    pub(crate) fn apply(&mut self, field: TransformField, value: Vec3) {
        match field {
            TransformField::Rotation => self.rotation = value,
            TransformField::Scale => self.scale = value.max(Vec3::ZERO),
            TransformField::Position => self.position = value,
        }
    }

    pub(crate) fn apply_component(&mut self, path: FieldPath, value: f32) {
        let mut vector = self.get(path.field);
        vector[path.axis.index()] = value;
        self.apply(path.field, vector);
    }

    /// Object-to-world matrix. Rotation is intrinsic X then Y then Z, in radians.
    pub fn matrix(&self) -> Mat4 {
        let rotation = Quat::from_euler(
            EulerRot::XYZ,
            self.rotation.x,
            self.rotation.y,
            self.rotation.z,
        );
        Mat4::from_scale_rotation_translation(self.scale, rotation, self.position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn apply_is_visible_to_next_read() {
        let mut state = TransformState::default();
        state.apply(TransformField::Rotation, Vec3::new(0.1, 0.2, 0.3));
        assert_eq!(state.get(TransformField::Rotation), Vec3::new(0.1, 0.2, 0.3));

        state.apply_component(FieldPath::new(TransformField::Rotation, Axis::Y), 6.3);
        assert_eq!(state.get(TransformField::Rotation), Vec3::new(0.1, 6.3, 0.3));
    }

    #[test]
    fn scale_is_floored_at_zero() {
        let mut state = TransformState::default();
        state.apply_component(FieldPath::new(TransformField::Scale, Axis::X), -0.25);
        assert_eq!(state.get(TransformField::Scale), Vec3::new(0.0, 1.0, 1.0));

        let created = TransformState::new(Vec3::ZERO, Vec3::splat(-1.0), Vec3::ZERO);
        assert_eq!(created.get(TransformField::Scale), Vec3::ZERO);
    }

    #[test]
    fn rotation_is_not_clamped() {
        let mut state = TransformState::default();
        state.apply_component(FieldPath::new(TransformField::Rotation, Axis::Y), 12.6);
        assert_eq!(state.component(FieldPath::new(TransformField::Rotation, Axis::Y)), 12.6);
    }

    #[test]
    fn matrix_composes_scale_and_translation() {
        let state = TransformState::new(Vec3::ZERO, Vec3::splat(2.0), Vec3::new(1.0, 2.0, 3.0));
        let point = state.matrix().transform_point3(Vec3::new(1.0, 0.0, 0.0));
        assert!((point - Vec3::new(3.0, 2.0, 3.0)).length() < 1e-6);
    }

    #[test]
    fn matrix_rotates_about_y() {
        let state = TransformState::new(
            Vec3::new(0.0, std::f32::consts::FRAC_PI_2, 0.0),
            Vec3::ONE,
            Vec3::ZERO,
        );
        let point = state.matrix().transform_point3(Vec3::X);
        assert!((point - Vec3::new(0.0, 0.0, -1.0)).length() < 1e-6);
    }

    #[test]
    fn field_path_round_trips_through_text() {
        let path: FieldPath = "rotation.y".parse().unwrap();
        assert_eq!(path, FieldPath::new(TransformField::Rotation, Axis::Y));
        assert_eq!(path.to_string(), "rotation.y");
        assert!("rotation.w".parse::<FieldPath>().is_err());
        assert!("spin.x".parse::<FieldPath>().is_err());
    }

    #[test]
    fn axis_values_iterate_only_present_axes() {
        let values = AxisValues {
            x: Some(0.0),
            y: None,
            z: Some(2.0),
        };
        let collected: Vec<_> = values.iter().collect();
        assert_eq!(collected, vec![(Axis::X, 0.0), (Axis::Z, 2.0)]);
    }
}
