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

use super::{AstroError, Frame, TimeTagged};
use crate::linalg::{UnitQuaternion, Vector3};
use crate::time::Epoch;
use std::f64::consts::PI;
use std::fmt;

/// Axes of the spacecraft body frame.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum BodyAxis {
    /// +Y
    Front,
    /// +X
    Right,
    /// +Z
    Up,
}

impl BodyAxis {
    pub fn unit_vector(&self) -> Vector3<f64> {
        match self {
            Self::Front => Vector3::y(),
            Self::Right => Vector3::x(),
            Self::Up => Vector3::z(),
        }
    }
}

/// Attitude of a spacecraft: rotation from the body frame to the reference frame, and body rate.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct StateOrientation {
    pub rotation: UnitQuaternion<f64>,
    /// Angular velocity of the body with respect to the reference frame, in the body frame, in rad/s
    pub angular_velocity: Vector3<f64>,
    pub epoch: Epoch,
    pub frame: Frame,
}

impl StateOrientation {
    /// Body frame aligned with the reference frame, not rotating.
    pub fn identity(epoch: Epoch, frame: Frame) -> Self {
        Self {
            rotation: UnitQuaternion::identity(),
            angular_velocity: Vector3::zeros(),
            epoch,
            frame,
        }
    }

    /// Smallest rotation bringing the body vector onto the direction, expressed in the reference frame.
    pub fn aligning(
        body_vector: &Vector3<f64>,
        direction: &Vector3<f64>,
        epoch: Epoch,
        frame: Frame,
    ) -> Result<Self, AstroError> {
        if direction.norm() <= f64::EPSILON || body_vector.norm() <= f64::EPSILON {
            return Err(AstroError::InvalidCoordinates {
                reason: "cannot align with a zero vector".to_string(),
            });
        }
        let rotation = match UnitQuaternion::rotation_between(body_vector, direction) {
            Some(rotation) => rotation,
            None => {
                // Anti-parallel: half turn about any axis orthogonal to the body vector
                let axis = body_vector.cross(&Vector3::x());
                let axis = if axis.norm() > f64::EPSILON {
                    axis
                } else {
                    body_vector.cross(&Vector3::y())
                };
                UnitQuaternion::from_scaled_axis(axis.normalize() * PI)
            }
        };
        Ok(Self {
            rotation,
            angular_velocity: Vector3::zeros(),
            epoch,
            frame,
        })
    }

    /// Direction of the body axis in the reference frame
    pub fn axis_in_frame(&self, axis: BodyAxis) -> Vector3<f64> {
        self.rotation * axis.unit_vector()
    }

    /// Rotation from the body frame of `other` to the body frame of `self`.
    pub fn relative_to(&self, other: &Self) -> UnitQuaternion<f64> {
        self.rotation.inverse() * other.rotation
    }
}

impl TimeTagged for StateOrientation {
    fn epoch(&self) -> Epoch {
        self.epoch
    }
}

impl fmt::Display for StateOrientation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let (roll, pitch, yaw) = self.rotation.euler_angles();
        write!(
            f,
            "[{}] {}\troll = {:.6} deg\tpitch = {:.6} deg\tyaw = {:.6} deg",
            self.frame,
            self.epoch,
            roll.to_degrees(),
            pitch.to_degrees(),
            yaw.to_degrees()
        )
    }
}
