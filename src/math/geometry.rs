//! Vector helpers shared by the shape functions and the mesher

use crate::core::types::{Quat, Vec3};
use crate::math::rng::SimpleRng;

/// Lengths below this are treated as zero
pub const EPSILON: f32 = 1e-6;

/// pi * (3 - sqrt(5)), in radians
pub const GOLDEN_ANGLE: f32 = 2.399_963_2;

/// Random vector in the unit cube, with its Z extent reduced by `flatness`.
///
/// Not normalized; callers normalize after combining with other terms.
pub fn random_vec(rng: &mut SimpleRng, flatness: f32) -> Vec3 {
    let x = rng.range(-1.0, 1.0);
    let y = rng.range(-1.0, 1.0);
    let z = rng.range(-1.0, 1.0) * (1.0 - flatness.clamp(0.0, 1.0));
    Vec3::new(x, y, z)
}

/// Normalize, falling back to `fallback` for (near) zero vectors
pub fn normalize_or(v: Vec3, fallback: Vec3) -> Vec3 {
    let len = v.length();
    if len > EPSILON && len.is_finite() {
        v / len
    } else {
        fallback
    }
}

/// Unit vector perpendicular to `v`
pub fn orthogonal_vector(v: Vec3) -> Vec3 {
    normalize_or(v, Vec3::Z).any_orthonormal_vector()
}

/// Remove the component of `v` along `normal` (`normal` must be unit length)
pub fn project_on_plane(v: Vec3, normal: Vec3) -> Vec3 {
    v - normal * v.dot(normal)
}

/// Rotation taking +Z onto `direction`
pub fn look_at_rotation(direction: Vec3) -> Quat {
    rotation_arc(Vec3::Z, direction)
}

/// Shortest rotation from `from` to `to`, robust to zero and opposite vectors
pub fn rotation_arc(from: Vec3, to: Vec3) -> Quat {
    let from = normalize_or(from, Vec3::Z);
    let to = normalize_or(to, Vec3::Z);
    if from.dot(to) < -1.0 + EPSILON {
        // Opposite vectors: any perpendicular axis works
        return Quat::from_axis_angle(from.any_orthonormal_vector(), std::f32::consts::PI);
    }
    Quat::from_rotation_arc(from, to)
}

/// Rotation of `angle` radians about `axis`, identity when the axis is degenerate
pub fn axis_angle(axis: Vec3, angle: f32) -> Quat {
    let len = axis.length();
    if len > EPSILON && angle.is_finite() {
        Quat::from_axis_angle(axis / len, angle)
    } else {
        Quat::IDENTITY
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_vec_flatness() {
        let mut rng = SimpleRng::new(1);
        for _ in 0..100 {
            let v = random_vec(&mut rng, 1.0);
            assert_eq!(v.z, 0.0);
            assert!(v.x.abs() <= 1.0 && v.y.abs() <= 1.0);
        }
    }

    #[test]
    fn test_normalize_or_fallback() {
        assert_eq!(normalize_or(Vec3::ZERO, Vec3::X), Vec3::X);
        assert!((normalize_or(Vec3::new(0.0, 3.0, 0.0), Vec3::X) - Vec3::Y).length() < 1e-6);
    }

    #[test]
    fn test_orthogonal_vector() {
        for v in [Vec3::X, Vec3::Z, Vec3::new(1.0, 2.0, 3.0), Vec3::ZERO] {
            let o = orthogonal_vector(v);
            assert!((o.length() - 1.0).abs() < 1e-5);
            assert!(o.dot(normalize_or(v, Vec3::Z)).abs() < 1e-5);
        }
    }

    #[test]
    fn test_rotation_arc_opposite() {
        let q = rotation_arc(Vec3::Z, -Vec3::Z);
        assert!((q * Vec3::Z + Vec3::Z).length() < 1e-5);
    }

    #[test]
    fn test_look_at_rotation() {
        let dir = Vec3::new(1.0, 1.0, 0.0).normalize();
        let q = look_at_rotation(dir);
        assert!((q * Vec3::Z - dir).length() < 1e-5);
    }

    #[test]
    fn test_axis_angle_degenerate_axis() {
        assert_eq!(axis_angle(Vec3::ZERO, 1.0), Quat::IDENTITY);
    }
}
