//! Spatial pose primitives shared by surfaces and anchors

use serde::{Deserialize, Serialize};

/// Position in meters, right-handed, y up
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec3 {
    /// X component
    pub x: f32,
    /// Y component
    pub y: f32,
    /// Z component
    pub z: f32,
}

impl Vec3 {
    /// Create a new vector
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Zero vector
    pub const fn zero() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }
}

/// Unit quaternion orientation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quat {
    /// X component
    pub x: f32,
    /// Y component
    pub y: f32,
    /// Z component
    pub z: f32,
    /// W component
    pub w: f32,
}

impl Quat {
    /// Create a quaternion from raw components
    pub const fn new(x: f32, y: f32, z: f32, w: f32) -> Self {
        Self { x, y, z, w }
    }

    /// No rotation
    pub const fn identity() -> Self {
        Self::new(0.0, 0.0, 0.0, 1.0)
    }

    /// Rotation of `angle` radians around the Y axis
    pub fn from_rotation_y(angle: f32) -> Self {
        let half = angle * 0.5;
        Self::new(0.0, half.sin(), 0.0, half.cos())
    }
}

impl Default for Quat {
    fn default() -> Self {
        Self::identity()
    }
}

/// Position plus orientation
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Pose {
    /// Position
    pub position: Vec3,
    /// Orientation
    pub orientation: Quat,
}

impl Pose {
    /// Create a pose from position and orientation
    pub const fn new(position: Vec3, orientation: Quat) -> Self {
        Self {
            position,
            orientation,
        }
    }

    /// Pose at the origin with no rotation
    pub const fn identity() -> Self {
        Self::new(Vec3::zero(), Quat::identity())
    }

    /// Pose at a position with no rotation
    pub const fn from_position(x: f32, y: f32, z: f32) -> Self {
        Self::new(Vec3::new(x, y, z), Quat::identity())
    }

    /// Same orientation, new position
    pub fn with_position(self, x: f32, y: f32, z: f32) -> Self {
        Self {
            position: Vec3::new(x, y, z),
            ..self
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pose_defaults_to_identity() {
        let pose = Pose::default();
        assert_eq!(pose, Pose::identity());
        assert_eq!(pose.orientation.w, 1.0);
    }

    #[test]
    fn test_with_position_keeps_orientation() {
        let turned = Pose::new(Vec3::zero(), Quat::from_rotation_y(std::f32::consts::PI));
        let moved = turned.with_position(1.2, 1.3, -1.5);
        assert_eq!(moved.position, Vec3::new(1.2, 1.3, -1.5));
        assert_eq!(moved.orientation, turned.orientation);
    }

    #[test]
    fn test_pose_serialization() {
        let pose = Pose::from_position(0.0, 1.29, -1.9);
        let json = serde_json::to_string(&pose).unwrap();
        let back: Pose = serde_json::from_str(&json).unwrap();
        assert_eq!(back, pose);
    }
}
