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
use crate::linalg::Vector3;
use crate::time::Epoch;
use crate::utils::{between_0_tau, between_pm_pi, r1, r3};
use std::f64::consts::{PI, TAU};
use std::sync::Arc;

/// Convergence threshold on successive eccentric anomaly estimates, in radians
pub const KEPLER_TOLERANCE: f64 = 1e-9;
/// Maximum number of Newton iterations when solving Kepler's equation
pub const KEPLER_MAX_ITERATIONS: usize = 1000;

/// Solves Kepler's equation `M = E - e sin E` for the eccentric anomaly with a Newton iteration.
///
/// If the iteration does not converge within [KEPLER_MAX_ITERATIONS], a warning is logged and the last
/// estimate is returned.
pub fn mean_to_eccentric_anomaly(ma_rad: f64, ecc: f64) -> f64 {
    let ma = between_0_tau(ma_rad);
    let mut ea = if ecc < 0.8 { ma } else { PI };
    for _ in 0..KEPLER_MAX_ITERATIONS {
        let next = ea - (ea - ecc * ea.sin() - ma) / (1.0 - ecc * ea.cos());
        if (next - ea).abs() < KEPLER_TOLERANCE {
            return between_0_tau(next);
        }
        ea = next;
    }
    warn!(
        "Kepler's equation did not converge after {KEPLER_MAX_ITERATIONS} iterations (M = {ma_rad}, e = {ecc})"
    );
    between_0_tau(ea)
}

/// Mean anomaly from the eccentric anomaly, bounded to [0, 2π)
pub fn eccentric_to_mean_anomaly(ea_rad: f64, ecc: f64) -> f64 {
    between_0_tau(ea_rad - ecc * ea_rad.sin())
}

/// True anomaly from the eccentric anomaly, bounded to [0, 2π)
pub fn eccentric_to_true_anomaly(ea_rad: f64, ecc: f64) -> f64 {
    between_0_tau(((1.0 - ecc.powi(2)).sqrt() * ea_rad.sin()).atan2(ea_rad.cos() - ecc))
}

/// Eccentric anomaly from the true anomaly, bounded to [0, 2π)
pub fn true_to_eccentric_anomaly(ta_rad: f64, ecc: f64) -> f64 {
    between_0_tau(((1.0 - ecc.powi(2)).sqrt() * ta_rad.sin()).atan2(ecc + ta_rad.cos()))
}

/// Mean anomaly from the true anomaly of an elliptical orbit, bounded to [0, 2π)
pub fn true_to_mean_anomaly(ta_rad: f64, ecc: f64) -> f64 {
    eccentric_to_mean_anomaly(true_to_eccentric_anomaly(ta_rad, ecc), ecc)
}

/// True anomaly from the mean anomaly of an elliptical orbit, bounded to [0, 2π)
pub fn mean_to_true_anomaly(ma_rad: f64, ecc: f64) -> f64 {
    eccentric_to_true_anomaly(mean_to_eccentric_anomaly(ma_rad, ecc), ecc)
}

/// Computes the inertial position and velocity from the classical elements, rotating the perifocal
/// state by `R3(-Ω) R1(-i) R3(-ω)`.
pub fn perifocal_to_inertial(
    gm: f64,
    sma_m: f64,
    ecc: f64,
    inc_rad: f64,
    raan_rad: f64,
    aop_rad: f64,
    ta_rad: f64,
) -> (Vector3<f64>, Vector3<f64>) {
    let p = sma_m * (1.0 - ecc.powi(2));
    let (sin_ta, cos_ta) = ta_rad.sin_cos();
    let radius = p / (1.0 + ecc * cos_ta);
    let sqrt_gm_p = (gm / p).sqrt();
    let r_pqw = Vector3::new(radius * cos_ta, radius * sin_ta, 0.0);
    let v_pqw = Vector3::new(-sqrt_gm_p * sin_ta, sqrt_gm_p * (ecc + cos_ta), 0.0);
    let dcm = r3(-raan_rad) * r1(-inc_rad) * r3(-aop_rad);
    (dcm * r_pqw, dcm * v_pqw)
}

/// Classical Keplerian elements. Angles are in radians and the semi-major axis in meters.
#[derive(Clone, Debug)]
pub struct KeplerianElements {
    pub(crate) sma_m: f64,
    pub(crate) ecc: f64,
    pub(crate) inc_rad: f64,
    pub(crate) raan_rad: f64,
    pub(crate) aop_rad: f64,
    pub(crate) ma_rad: f64,
    pub(crate) center: Arc<CelestialBody>,
    pub(crate) epoch: Epoch,
    pub(crate) frame: Frame,
}

impl KeplerianElements {
    /// Validates and builds the elements, failing on the first invalid one.
    #[allow(clippy::too_many_arguments)]
    pub fn try_new(
        sma_m: f64,
        ecc: f64,
        inc_rad: f64,
        raan_rad: f64,
        aop_rad: f64,
        ma_rad: f64,
        center: Arc<CelestialBody>,
        epoch: Epoch,
        frame: Frame,
    ) -> Result<Self, AstroError> {
        check_element("semi-major axis", sma_m, sma_m > 0.0, "strictly positive")?;
        check_element("eccentricity", ecc, ecc >= 0.0, "positive")?;
        check_element(
            "inclination",
            inc_rad,
            (-PI..=PI).contains(&inc_rad),
            "within [-π, π]",
        )?;
        for (param, value) in [
            ("right ascension of the ascending node", raan_rad),
            ("argument of periapsis", aop_rad),
            ("mean anomaly", ma_rad),
        ] {
            check_element(param, value, (0.0..TAU).contains(&value), "within [0, 2π)")?;
        }
        Ok(Self {
            sma_m,
            ecc,
            inc_rad,
            raan_rad,
            aop_rad,
            ma_rad,
            center,
            epoch,
            frame,
        })
    }
}

fn check_element(
    param: &'static str,
    value: f64,
    valid: bool,
    expected: &'static str,
) -> Result<(), AstroError> {
    if valid && value.is_finite() {
        Ok(())
    } else {
        Err(AstroError::InvalidElement {
            param,
            value,
            expected,
        })
    }
}

impl TimeTagged for KeplerianElements {
    fn epoch(&self) -> Epoch {
        self.epoch
    }
}

impl OrbitalElements for KeplerianElements {
    fn center(&self) -> &Arc<CelestialBody> {
        &self.center
    }

    fn frame(&self) -> Frame {
        self.frame
    }

    fn ecc(&self) -> f64 {
        self.ecc
    }

    fn inc_rad(&self) -> f64 {
        self.inc_rad
    }

    fn sma_m(&self) -> f64 {
        self.sma_m
    }

    fn raan_rad(&self) -> f64 {
        self.raan_rad
    }

    fn aop_rad(&self) -> f64 {
        self.aop_rad
    }

    fn ta_rad(&self) -> f64 {
        if self.ecc < 1.0 {
            mean_to_true_anomaly(self.ma_rad, self.ecc)
        } else {
            // Hyperbolic: solve M = e sinh H - H, with M taken in (-π, π]
            let ma = between_pm_pi(self.ma_rad);
            let mut h = ma;
            for _ in 0..KEPLER_MAX_ITERATIONS {
                let next = h - (self.ecc * h.sinh() - h - ma) / (self.ecc * h.cosh() - 1.0);
                if (next - h).abs() < KEPLER_TOLERANCE {
                    h = next;
                    break;
                }
                h = next;
            }
            between_0_tau(
                2.0 * (((self.ecc + 1.0) / (self.ecc - 1.0)).sqrt() * (h / 2.0).tanh()).atan(),
            )
        }
    }

    fn ma_rad(&self) -> f64 {
        self.ma_rad
    }
}
