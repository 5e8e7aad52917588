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

use crate::linalg::{Matrix3, Vector3};
use std::f64::consts::{PI, TAU};

/// Returns the tilde matrix from the provided Vector3, i.e. the matrix such that `tilde(a) * b = a x b`.
pub fn tilde_matrix(v: &Vector3<f64>) -> Matrix3<f64> {
    Matrix3::new(0.0, -v.z, v.y, v.z, 0.0, -v.x, -v.y, v.x, 0.0)
}

/// Rotation matrix about the X axis, angle in radians (passive, i.e. it rotates the frame).
pub fn r1(angle_rad: f64) -> Matrix3<f64> {
    let (s, c) = angle_rad.sin_cos();
    Matrix3::new(1.0, 0.0, 0.0, 0.0, c, s, 0.0, -s, c)
}

/// Rotation matrix about the Y axis, angle in radians (passive).
pub fn r2(angle_rad: f64) -> Matrix3<f64> {
    let (s, c) = angle_rad.sin_cos();
    Matrix3::new(c, 0.0, -s, 0.0, 1.0, 0.0, s, 0.0, c)
}

/// Rotation matrix about the Z axis, angle in radians (passive).
pub fn r3(angle_rad: f64) -> Matrix3<f64> {
    let (s, c) = angle_rad.sin_cos();
    Matrix3::new(c, s, 0.0, -s, c, 0.0, 0.0, 0.0, 1.0)
}

/// Returns the provided angle bounded between 0.0 (included) and 2π (excluded), in radians.
pub fn between_0_tau(angle_rad: f64) -> f64 {
    let bounded = angle_rad.rem_euclid(TAU);
    // rem_euclid may round up to TAU for tiny negative inputs
    if bounded >= TAU {
        0.0
    } else {
        bounded
    }
}

/// Returns the provided angle bounded between -π (excluded) and π (included), in radians.
pub fn between_pm_pi(angle_rad: f64) -> f64 {
    let bounded = between_0_tau(angle_rad);
    if bounded > PI {
        bounded - TAU
    } else {
        bounded
    }
}

/// Returns the unit vector of the provided vector, or the vector itself if its norm is zero.
pub fn unit_or_zero(v: &Vector3<f64>) -> Vector3<f64> {
    let norm = v.norm();
    if norm > f64::EPSILON {
        v / norm
    } else {
        *v
    }
}
