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

use super::{AstroError, CelestialBody, Frame, OrbitalElements, StateVector, TimeTagged};
use crate::linalg::Vector3;
use crate::time::Epoch;
use crate::utils::between_0_tau;
use std::f64::consts::{FRAC_PI_2, TAU};
use std::sync::Arc;

/// Equatorial coordinates (declination, right ascension and distance) of a state.
///
/// The Cartesian velocity of the originating state is kept so that the orbital elements remain derivable.
#[derive(Clone, Debug)]
pub struct EquatorialCoordinates {
    pub(crate) declination_rad: f64,
    pub(crate) right_ascension_rad: f64,
    pub(crate) distance_m: f64,
    pub(crate) velocity_m_s: Vector3<f64>,
    pub(crate) center: Arc<CelestialBody>,
    pub(crate) epoch: Epoch,
    pub(crate) frame: Frame,
}

impl EquatorialCoordinates {
    #[allow(clippy::too_many_arguments)]
    pub fn try_new(
        declination_rad: f64,
        right_ascension_rad: f64,
        distance_m: f64,
        velocity_m_s: Vector3<f64>,
        center: Arc<CelestialBody>,
        epoch: Epoch,
        frame: Frame,
    ) -> Result<Self, AstroError> {
        if !(-FRAC_PI_2..=FRAC_PI_2).contains(&declination_rad) {
            return Err(AstroError::InvalidElement {
                param: "declination",
                value: declination_rad,
                expected: "within [-π/2, π/2]",
            });
        }
        if !(0.0..TAU).contains(&right_ascension_rad) {
            return Err(AstroError::InvalidElement {
                param: "right ascension",
                value: right_ascension_rad,
                expected: "within [0, 2π)",
            });
        }
        if !(distance_m > 0.0 && distance_m.is_finite()) {
            return Err(AstroError::InvalidElement {
                param: "distance",
                value: distance_m,
                expected: "strictly positive",
            });
        }
        Ok(Self {
            declination_rad,
            right_ascension_rad,
            distance_m,
            velocity_m_s,
            center,
            epoch,
            frame,
        })
    }

    /// Computes the equatorial coordinates of a Cartesian state.
    pub fn from_state_vector(sv: &StateVector) -> Self {
        let r = sv.radius_m;
        let distance_m = r.norm();
        Self {
            declination_rad: (r.z / distance_m).asin(),
            right_ascension_rad: between_0_tau(r.y.atan2(r.x)),
            distance_m,
            velocity_m_s: sv.velocity_m_s,
            center: sv.center.clone(),
            epoch: sv.epoch,
            frame: sv.frame,
        }
    }

    pub fn declination_rad(&self) -> f64 {
        self.declination_rad
    }

    pub fn right_ascension_rad(&self) -> f64 {
        self.right_ascension_rad
    }

    pub fn distance_m(&self) -> f64 {
        self.distance_m
    }

    pub fn radius_m(&self) -> Vector3<f64> {
        let (sin_dec, cos_dec) = self.declination_rad.sin_cos();
        let (sin_ra, cos_ra) = self.right_ascension_rad.sin_cos();
        self.distance_m * Vector3::new(cos_dec * cos_ra, cos_dec * sin_ra, sin_dec)
    }

    pub fn to_state_vector(&self) -> StateVector {
        StateVector {
            radius_m: self.radius_m(),
            velocity_m_s: self.velocity_m_s,
            center: self.center.clone(),
            epoch: self.epoch,
            frame: self.frame,
        }
    }
}

impl TimeTagged for EquatorialCoordinates {
    fn epoch(&self) -> Epoch {
        self.epoch
    }
}

impl OrbitalElements for EquatorialCoordinates {
    fn center(&self) -> &Arc<CelestialBody> {
        &self.center
    }

    fn frame(&self) -> Frame {
        self.frame
    }

    fn ecc(&self) -> f64 {
        self.to_state_vector().ecc()
    }

    fn inc_rad(&self) -> f64 {
        self.to_state_vector().inc_rad()
    }

    fn sma_m(&self) -> f64 {
        self.to_state_vector().sma_m()
    }

    fn raan_rad(&self) -> f64 {
        self.to_state_vector().raan_rad()
    }

    fn aop_rad(&self) -> f64 {
        self.to_state_vector().aop_rad()
    }

    fn ta_rad(&self) -> f64 {
        self.to_state_vector().ta_rad()
    }
}
