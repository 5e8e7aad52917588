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

use super::FrameTransform;
use crate::linalg::{Matrix3, Vector3};
use crate::time::Epoch;
use crate::utils::{r1, r2, r3};
use serde_derive::{Deserialize, Serialize};
use std::f64::consts::{FRAC_PI_2, TAU};
use std::fmt;

/// Mean angular velocity of the Earth, in radians per second.
pub const EARTH_ANGULAR_VELOCITY_RAD_S: f64 = 7.292_115_146_706_979e-5;

/// Orientation of a frame with respect to its parent, the ICRF.
pub trait ParentRotation: Send + Sync + fmt::Debug {
    /// Returns the transformation from the parent (ICRF) to this frame at the provided epoch.
    fn from_parent(&self, epoch: Epoch) -> FrameTransform;
}

/// Defines an Euler rotation, angle must be in radians
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum EulerRotation {
    R1(f64),
    R2(f64),
    R3(f64),
}

impl EulerRotation {
    pub fn r1_from_degrees(angle_deg: f64) -> Self {
        Self::R1(angle_deg.to_radians())
    }
    pub fn r2_from_degrees(angle_deg: f64) -> Self {
        Self::R2(angle_deg.to_radians())
    }
    pub fn r3_from_degrees(angle_deg: f64) -> Self {
        Self::R3(angle_deg.to_radians())
    }
    /// Get the DCM from this Euler rotation
    pub fn dcm(&self) -> Matrix3<f64> {
        match *self {
            Self::R1(angle) => r1(angle),
            Self::R2(angle) => r2(angle),
            Self::R3(angle) => r3(angle),
        }
    }
}

impl ParentRotation for EulerRotation {
    fn from_parent(&self, _: Epoch) -> FrameTransform {
        FrameTransform::fixed(self.dcm())
    }
}

/// A fixed three-axis Euler rotation
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Euler3Axis {
    /// The first rotation (e.g. R3)
    pub first: EulerRotation,
    /// The second rotation (e.g. R1)
    pub second: EulerRotation,
    /// The third and final rotation (e.g. R3, to complete a 3-1-3 rotation)
    pub third: EulerRotation,
}

impl Euler3Axis {
    pub fn dcm(&self) -> Matrix3<f64> {
        self.third.dcm() * self.second.dcm() * self.first.dcm()
    }
}

impl ParentRotation for Euler3Axis {
    fn from_parent(&self, _: Epoch) -> FrameTransform {
        FrameTransform::fixed(self.dcm())
    }
}

/// IAU rotation model: right ascension and declination of the north pole, drifting linearly per
/// Julian century, and prime meridian angle `W = W0 + Ẇ d`, `d` in days past J2000 TDB. All angles in degrees.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct IauPole {
    pub pole_ra_deg: f64,
    #[serde(default)]
    pub pole_ra_dot_deg_cy: f64,
    pub pole_dec_deg: f64,
    #[serde(default)]
    pub pole_dec_dot_deg_cy: f64,
    pub w0_deg: f64,
    pub w_dot_deg_day: f64,
}

impl IauPole {
    /// The IAU_EARTH model of the IAU 2009 report
    pub const EARTH: Self = Self {
        pole_ra_deg: 0.0,
        pole_ra_dot_deg_cy: -0.641,
        pole_dec_deg: 90.0,
        pole_dec_dot_deg_cy: -0.557,
        w0_deg: 190.147,
        w_dot_deg_day: 360.985_623_5,
    };

    /// A pole which does not drift
    pub fn fixed(pole_ra_deg: f64, pole_dec_deg: f64, w0_deg: f64, w_dot_deg_day: f64) -> Self {
        Self {
            pole_ra_deg,
            pole_ra_dot_deg_cy: 0.0,
            pole_dec_deg,
            pole_dec_dot_deg_cy: 0.0,
            w0_deg,
            w_dot_deg_day,
        }
    }

    /// Right ascension and declination of the pole, in radians
    pub fn pole_rad(&self, epoch: Epoch) -> (f64, f64) {
        let centuries = epoch.to_tdb_centuries_since_j2000();
        (
            (self.pole_ra_deg + self.pole_ra_dot_deg_cy * centuries).to_radians(),
            (self.pole_dec_deg + self.pole_dec_dot_deg_cy * centuries).to_radians(),
        )
    }

    /// Prime meridian angle, in radians, bounded to [0, 2π)
    pub fn prime_meridian_rad(&self, epoch: Epoch) -> f64 {
        let days = epoch.to_tdb_days_since_j2000();
        (self.w0_deg + self.w_dot_deg_day * days)
            .to_radians()
            .rem_euclid(TAU)
    }
}

impl ParentRotation for IauPole {
    fn from_parent(&self, epoch: Epoch) -> FrameTransform {
        let (alpha, delta) = self.pole_rad(epoch);
        let rotation = Euler3Axis {
            first: EulerRotation::R3(FRAC_PI_2 + alpha),
            second: EulerRotation::R1(FRAC_PI_2 - delta),
            third: EulerRotation::R3(self.prime_meridian_rad(epoch)),
        }
        .dcm();
        // The drift of the pole is negligible compared to the spin
        FrameTransform {
            rotation,
            angular_velocity: Vector3::new(0.0, 0.0, self.w_dot_deg_day.to_radians() / 86_400.0),
        }
    }
}

/// Orientation model of a body fixed frame, as stored in the body constants.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "model")]
pub enum Orientation {
    /// IAU pole and prime meridian model
    Iau(IauPole),
}

impl ParentRotation for Orientation {
    fn from_parent(&self, epoch: Epoch) -> FrameTransform {
        match self {
            Self::Iau(pole) => pole.from_parent(epoch),
        }
    }
}

#[cfg(test)]
mod ut_rotations {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn iau_pole_points_to_z() {
        let pole = IauPole::fixed(269.9949, 66.5392, 38.3213, 13.176_358_15);
        let epoch = Epoch::from_gregorian_utc_at_midnight(2021, 6, 2);
        let (ra, dec) = (pole.pole_ra_deg.to_radians(), pole.pole_dec_deg.to_radians());
        let pole_icrf = Vector3::new(dec.cos() * ra.cos(), dec.cos() * ra.sin(), dec.sin());
        let tf = pole.from_parent(epoch);
        assert_abs_diff_eq!(tf.rotation * pole_icrf, Vector3::z(), epsilon = 1e-12);
        assert_abs_diff_eq!(tf.angular_velocity.z, 2.661_699e-6, epsilon = 1e-11);
    }

    #[test]
    fn iau_earth() {
        let earth = IauPole::EARTH;
        // Prime meridian at J2000 TDB
        assert_abs_diff_eq!(
            earth.prime_meridian_rad(Epoch::from_jde_tdb(2_451_545.0)),
            190.147_f64.to_radians(),
            epsilon = 1e-12
        );
        // Spin rate of the prime meridian
        let tf = earth.from_parent(Epoch::from_gregorian_utc_at_midnight(2021, 6, 2));
        assert_abs_diff_eq!(tf.angular_velocity.z, EARTH_ANGULAR_VELOCITY_RAD_S, epsilon = 1e-12);
        // The pole drifts by a fraction of a degree per century
        let epoch = Epoch::from_jde_tdb(2_451_545.0 + 36_525.0);
        let (ra, dec) = earth.pole_rad(epoch);
        assert_abs_diff_eq!(ra.to_degrees(), -0.641, epsilon = 1e-9);
        assert_abs_diff_eq!(dec.to_degrees(), 89.443, epsilon = 1e-9);
        let pole_icrf = Vector3::new(dec.cos() * ra.cos(), dec.cos() * ra.sin(), dec.sin());
        assert_abs_diff_eq!(earth.from_parent(epoch).rotation * pole_icrf, Vector3::z(), epsilon = 1e-12);
    }

    #[test]
    fn euler_three_axis() {
        let rot = Euler3Axis {
            first: EulerRotation::r3_from_degrees(90.0),
            second: EulerRotation::r1_from_degrees(0.0),
            third: EulerRotation::r3_from_degrees(-90.0),
        };
        assert_abs_diff_eq!(rot.dcm(), Matrix3::identity(), epsilon = 1e-15);
        let tf = EulerRotation::R1(0.5).from_parent(Epoch::from_gregorian_utc_at_noon(2000, 1, 1));
        assert_eq!(tf.angular_velocity, Vector3::zeros());
    }
}
