/*
    Nyx, blazing fast astrodynamics
    Copyright (C) 2023 Christopher Rabotin <christopher.rabotin@gmail.com>

    This program is free software: you can redistribute it and/or modify
    it under the terms of the GNU Affero General Public License as published
    by the Free Software Foundation, either version 3 of the License, or
    (at your option) any later version.

    This program is distributed in the hope that it will be useful,
    but WITHOUT ANY WARRANTY; without even the implied warranty of
    MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
    GNU Affero General Public License for more details.

    You should have received a copy of the GNU Affero General Public License
    along with this program.  If not, see <https://www.gnu.org/licenses/>.
*/

use super::{Bodies, EphemerisError};
use crate::linalg::{Matrix3, Rotation3, UnitQuaternion, Vector3};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Reference frames known to the ephemeris service.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Frame {
    /// International Celestial Reference Frame, also known as J2000 or EME2000 for our purposes.
    ICRF,
    /// Mean ecliptic and equinox of J2000.
    EclipJ2000,
    /// Body fixed frame of the body with the provided NAIF ID, e.g. IAU_EARTH.
    BodyFixed(i32),
}

impl Frame {
    /// Returns true if this frame does not rotate with respect to ICRF.
    pub fn is_inertial(&self) -> bool {
        !matches!(self, Self::BodyFixed(_))
    }

    /// Returns the NAIF ID of the body this frame is attached to, if any.
    pub fn body_id(&self) -> Option<i32> {
        match self {
            Self::BodyFixed(id) => Some(*id),
            _ => None,
        }
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::ICRF => write!(f, "ICRF"),
            Self::EclipJ2000 => write!(f, "ECLIPJ2000"),
            Self::BodyFixed(id) => match Bodies::try_from(*id) {
                Ok(body) => write!(f, "IAU_{}", body.name().to_uppercase()),
                Err(_) => write!(f, "IAU_{id}"),
            },
        }
    }
}

impl FromStr for Frame {
    type Err = EphemerisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_uppercase();
        match name.as_str() {
            "ICRF" | "J2000" | "EME2000" => Ok(Self::ICRF),
            "ECLIPJ2000" | "ECLIPTIC" => Ok(Self::EclipJ2000),
            _ => {
                if let Some(body) = name.strip_prefix("IAU_") {
                    if let Ok(id) = body.parse::<i32>() {
                        return Ok(Self::BodyFixed(id));
                    }
                    if let Ok(body) = Bodies::try_from(body) {
                        return Ok(Self::BodyFixed(body.naif_id()));
                    }
                }
                Err(EphemerisError::UnknownFrame {
                    name: s.to_string(),
                })
            }
        }
    }
}

impl Serialize for Frame {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&format!("{self}"))
    }
}

impl<'de> Deserialize<'de> for Frame {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let name = String::deserialize(deserializer)?;
        Self::from_str(&name).map_err(serde::de::Error::custom)
    }
}

/// Transformation from one frame to another at a given epoch.
///
/// Positions transform as `r' = R r` and velocities as `v' = R v - ω × r'`, where `ω` is the angular
/// velocity of the destination frame with respect to the source frame, expressed in the destination frame.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct FrameTransform {
    /// Direction cosine matrix from the source frame to the destination frame
    pub rotation: Matrix3<f64>,
    /// Angular velocity of the destination frame with respect to the source, in the destination frame, in rad/s
    pub angular_velocity: Vector3<f64>,
}

impl FrameTransform {
    pub fn identity() -> Self {
        Self {
            rotation: Matrix3::identity(),
            angular_velocity: Vector3::zeros(),
        }
    }

    /// Fixed rotation, no angular velocity.
    pub fn fixed(rotation: Matrix3<f64>) -> Self {
        Self {
            rotation,
            angular_velocity: Vector3::zeros(),
        }
    }

    /// Returns the transformation going the other way.
    pub fn inverse(&self) -> Self {
        let rotation = self.rotation.transpose();
        Self {
            rotation,
            angular_velocity: -(rotation * self.angular_velocity),
        }
    }

    /// Chains this transformation (A to B) with `then` (B to C), yielding A to C.
    pub fn then(&self, then: &Self) -> Self {
        Self {
            rotation: then.rotation * self.rotation,
            angular_velocity: then.rotation * self.angular_velocity + then.angular_velocity,
        }
    }

    /// Transforms a position vector.
    pub fn apply_position(&self, position: &Vector3<f64>) -> Vector3<f64> {
        self.rotation * position
    }

    /// Transforms a position and velocity pair, accounting for the transport of the velocity in the rotating frame.
    pub fn apply(
        &self,
        position: &Vector3<f64>,
        velocity: &Vector3<f64>,
    ) -> (Vector3<f64>, Vector3<f64>) {
        let new_pos = self.rotation * position;
        let new_vel = self.rotation * velocity - self.angular_velocity.cross(&new_pos);
        (new_pos, new_vel)
    }

    /// Returns the rotation as a unit quaternion.
    pub fn quaternion(&self) -> UnitQuaternion<f64> {
        UnitQuaternion::from_rotation_matrix(&Rotation3::from_matrix_unchecked(self.rotation))
    }
}
