//! Mathematical types shared between the bridge and playback.
//!
//! These are the canonical representations stored in frame records.
//! Native data arrives as `f64`; everything downstream works in `f32`.

use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};

/// Quaternions closer than this (by dot product) are lerped instead of slerped.
const SLERP_DOT_THRESHOLD: f32 = 0.9995;

/// 3D Vector - position, offset, euler angles
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable, Serialize, Deserialize)]
pub struct Vec3 {
    /// X component
    pub x: f32,
    /// Y component
    pub y: f32,
    /// Z component
    pub z: f32,
}

impl Vec3 {
    /// Creates a new Vec3
    #[must_use]
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Zero vector
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);

    /// Converts to array
    #[must_use]
    pub const fn to_array(self) -> [f32; 3] {
        [self.x, self.y, self.z]
    }

    /// Creates from array
    #[must_use]
    pub const fn from_array(arr: [f32; 3]) -> Self {
        Self::new(arr[0], arr[1], arr[2])
    }

    /// Narrows a native `f64` triple.
    #[must_use]
    pub fn from_f64(arr: [f64; 3]) -> Self {
        Self::new(arr[0] as f32, arr[1] as f32, arr[2] as f32)
    }

    /// Dot product
    #[must_use]
    pub fn dot(self, other: Self) -> f32 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    /// Cross product
    #[must_use]
    pub fn cross(self, other: Self) -> Self {
        Self::new(
            self.y * other.z - self.z * other.y,
            self.z * other.x - self.x * other.z,
            self.x * other.y - self.y * other.x,
        )
    }

    /// Length squared (avoids sqrt)
    #[must_use]
    pub fn length_squared(self) -> f32 {
        self.dot(self)
    }

    /// Length
    #[must_use]
    pub fn length(self) -> f32 {
        self.length_squared().sqrt()
    }

    /// Distance to another point
    #[must_use]
    pub fn distance(self, other: Self) -> f32 {
        (self - other).length()
    }

    /// Unit vector in the same direction, or zero for a zero vector.
    #[must_use]
    pub fn normalized(self) -> Self {
        let len = self.length();
        if len <= f32::EPSILON {
            Self::ZERO
        } else {
            self * (1.0 / len)
        }
    }

    /// Linear interpolation towards `other` by `t` (unclamped).
    #[must_use]
    pub fn lerp(self, other: Self, t: f32) -> Self {
        self + (other - self) * t
    }
}

impl std::ops::Add for Vec3 {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl std::ops::Sub for Vec3 {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl std::ops::Mul<f32> for Vec3 {
    type Output = Self;
    fn mul(self, rhs: f32) -> Self {
        Self::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

impl std::ops::Neg for Vec3 {
    type Output = Self;
    fn neg(self) -> Self {
        Self::new(-self.x, -self.y, -self.z)
    }
}

/// Quaternion for rotations
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable, Serialize, Deserialize)]
pub struct Quaternion {
    /// X component
    pub x: f32,
    /// Y component
    pub y: f32,
    /// Z component
    pub z: f32,
    /// W component
    pub w: f32,
}

impl Quaternion {
    /// Creates a new quaternion
    #[must_use]
    pub const fn new(x: f32, y: f32, z: f32, w: f32) -> Self {
        Self { x, y, z, w }
    }

    /// Identity rotation
    pub const IDENTITY: Self = Self::new(0.0, 0.0, 0.0, 1.0);

    /// Narrows a native `f64` xyzw quadruple.
    #[must_use]
    pub fn from_f64(arr: [f64; 4]) -> Self {
        Self::new(arr[0] as f32, arr[1] as f32, arr[2] as f32, arr[3] as f32)
    }

    /// Converts to xyzw array
    #[must_use]
    pub const fn to_array(self) -> [f32; 4] {
        [self.x, self.y, self.z, self.w]
    }

    /// Rotation of `angle_rad` around `axis`.
    #[must_use]
    pub fn from_axis_angle(axis: Vec3, angle_rad: f32) -> Self {
        let axis = axis.normalized();
        let (s, c) = (angle_rad * 0.5).sin_cos();
        Self::new(axis.x * s, axis.y * s, axis.z * s, c)
    }

    /// Rotation from euler angles in degrees, applied Z then X then Y
    /// (the convention used by the capture rigs' rest poses).
    #[must_use]
    pub fn from_euler_degrees(euler: Vec3) -> Self {
        let x = Self::from_axis_angle(Vec3::new(1.0, 0.0, 0.0), euler.x.to_radians());
        let y = Self::from_axis_angle(Vec3::new(0.0, 1.0, 0.0), euler.y.to_radians());
        let z = Self::from_axis_angle(Vec3::new(0.0, 0.0, 1.0), euler.z.to_radians());
        y * x * z
    }

    /// Shortest-arc rotation taking direction `from` onto direction `to`.
    ///
    /// Degenerate (zero-length) inputs yield the identity.
    #[must_use]
    pub fn from_to(from: Vec3, to: Vec3) -> Self {
        let a = from.normalized();
        let b = to.normalized();
        if a == Vec3::ZERO || b == Vec3::ZERO {
            return Self::IDENTITY;
        }
        let d = a.dot(b);
        if d >= 1.0 - 1e-6 {
            return Self::IDENTITY;
        }
        if d <= -1.0 + 1e-6 {
            // Opposite directions: rotate half a turn around any orthogonal axis.
            let mut axis = Vec3::new(1.0, 0.0, 0.0).cross(a);
            if axis.length_squared() < 1e-6 {
                axis = Vec3::new(0.0, 1.0, 0.0).cross(a);
            }
            return Self::from_axis_angle(axis, std::f32::consts::PI);
        }
        let c = a.cross(b);
        Self::new(c.x, c.y, c.z, 1.0 + d).normalized()
    }

    /// 4D dot product
    #[must_use]
    pub fn dot(self, other: Self) -> f32 {
        self.x * other.x + self.y * other.y + self.z * other.z + self.w * other.w
    }

    /// Unit quaternion, or identity for a zero quaternion.
    #[must_use]
    pub fn normalized(self) -> Self {
        let mag = self.dot(self).sqrt();
        if mag <= f32::EPSILON {
            Self::IDENTITY
        } else {
            Self::new(self.x / mag, self.y / mag, self.z / mag, self.w / mag)
        }
    }

    /// Spherical interpolation along the shortest path.
    #[must_use]
    pub fn slerp(self, other: Self, t: f32) -> Self {
        let qa = self.normalized();
        let mut qb = other.normalized();

        let mut dot = qa.dot(qb);
        if dot < 0.0 {
            qb = Self::new(-qb.x, -qb.y, -qb.z, -qb.w);
            dot = -dot;
        }

        if dot > SLERP_DOT_THRESHOLD {
            return Self::new(
                qa.x + (qb.x - qa.x) * t,
                qa.y + (qb.y - qa.y) * t,
                qa.z + (qb.z - qa.z) * t,
                qa.w + (qb.w - qa.w) * t,
            )
            .normalized();
        }

        let theta_0 = dot.clamp(-1.0, 1.0).acos();
        let theta = theta_0 * t;
        let sin_theta_0 = theta_0.sin();
        let s0 = (theta_0 - theta).sin() / sin_theta_0;
        let s1 = theta.sin() / sin_theta_0;

        Self::new(
            s0 * qa.x + s1 * qb.x,
            s0 * qa.y + s1 * qb.y,
            s0 * qa.z + s1 * qb.z,
            s0 * qa.w + s1 * qb.w,
        )
    }

    /// Rotates a vector by this quaternion.
    #[must_use]
    pub fn rotate(self, v: Vec3) -> Vec3 {
        let q = Vec3::new(self.x, self.y, self.z);
        let t = q.cross(v) * 2.0;
        v + t * self.w + q.cross(t)
    }
}

impl Default for Quaternion {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl std::ops::Mul for Quaternion {
    type Output = Self;
    /// Hamilton product: `self * rhs` applies `rhs` first.
    fn mul(self, rhs: Self) -> Self {
        Self::new(
            self.w * rhs.x + self.x * rhs.w + self.y * rhs.z - self.z * rhs.y,
            self.w * rhs.y - self.x * rhs.z + self.y * rhs.w + self.z * rhs.x,
            self.w * rhs.z + self.x * rhs.y - self.y * rhs.x + self.z * rhs.w,
            self.w * rhs.w - self.x * rhs.x - self.y * rhs.y - self.z * rhs.z,
        )
    }
}
