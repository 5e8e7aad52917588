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

use super::{AstroError, CelestialBody, Frame, OrbitalElements, TimeTagged};
use crate::time::Epoch;
use crate::utils::between_0_tau;
use std::sync::Arc;

/// Modified equinoctial elements, free of singularities for circular and equatorial orbits.
///
/// `f` and `g` are the components of the eccentricity vector in the equinoctial frame, `h` and `k` those
/// of the node vector scaled by `tan(i/2)`, and `l` is the true longitude.
#[derive(Clone, Debug)]
pub struct EquinoctialElements {
    /// Semi-parameter, in meters
    pub(crate) p_m: f64,
    pub(crate) f: f64,
    pub(crate) g: f64,
    pub(crate) h: f64,
    pub(crate) k: f64,
    pub(crate) l_rad: f64,
    pub(crate) center: Arc<CelestialBody>,
    pub(crate) epoch: Epoch,
    pub(crate) frame: Frame,
}

impl EquinoctialElements {
    #[allow(clippy::too_many_arguments)]
    pub fn try_new(
        p_m: f64,
        f: f64,
        g: f64,
        h: f64,
        k: f64,
        l_rad: f64,
        center: Arc<CelestialBody>,
        epoch: Epoch,
        frame: Frame,
    ) -> Result<Self, AstroError> {
        if !(p_m > 0.0 && p_m.is_finite()) {
            return Err(AstroError::InvalidElement {
                param: "semi-parameter",
                value: p_m,
                expected: "strictly positive",
            });
        }
        for (param, value) in [("f", f), ("g", g), ("h", h), ("k", k), ("true longitude", l_rad)] {
            if !value.is_finite() {
                return Err(AstroError::InvalidElement {
                    param,
                    value,
                    expected: "finite",
                });
            }
        }
        Ok(Self {
            p_m,
            f,
            g,
            h,
            k,
            l_rad: between_0_tau(l_rad),
            center,
            epoch,
            frame,
        })
    }

    pub fn p_m(&self) -> f64 {
        self.p_m
    }

    pub fn f(&self) -> f64 {
        self.f
    }

    pub fn g(&self) -> f64 {
        self.g
    }

    pub fn h(&self) -> f64 {
        self.h
    }

    pub fn k(&self) -> f64 {
        self.k
    }

    /// True longitude, in radians
    pub fn l_rad(&self) -> f64 {
        self.l_rad
    }

    /// Longitude of periapsis, Ω + ω
    fn long_peri_rad(&self) -> f64 {
        between_0_tau(self.g.atan2(self.f))
    }
}

impl TimeTagged for EquinoctialElements {
    fn epoch(&self) -> Epoch {
        self.epoch
    }
}

impl OrbitalElements for EquinoctialElements {
    fn center(&self) -> &Arc<CelestialBody> {
        &self.center
    }

    fn frame(&self) -> Frame {
        self.frame
    }

    fn ecc(&self) -> f64 {
        (self.f.powi(2) + self.g.powi(2)).sqrt()
    }

    fn inc_rad(&self) -> f64 {
        2.0 * (self.h.powi(2) + self.k.powi(2)).sqrt().atan()
    }

    fn sma_m(&self) -> f64 {
        self.p_m / (1.0 - self.f.powi(2) - self.g.powi(2))
    }

    fn raan_rad(&self) -> f64 {
        between_0_tau(self.k.atan2(self.h))
    }

    fn aop_rad(&self) -> f64 {
        between_0_tau(self.long_peri_rad() - self.raan_rad())
    }

    fn ta_rad(&self) -> f64 {
        between_0_tau(self.l_rad - self.long_peri_rad())
    }
}
