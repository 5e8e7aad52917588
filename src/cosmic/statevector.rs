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
use crate::linalg::{Vector3, Vector6};
use crate::time::Epoch;
use crate::utils::between_0_tau;
use std::f64::consts::TAU;
use std::sync::Arc;

/// If an orbit has an eccentricity below the following value, it is considered circular (only affects warning messages)
pub const ECC_EPSILON: f64 = 1e-11;

/// Below this ratio of the node vector norm over the angular momentum norm, the orbit is equatorial
const EQUATORIAL_EPSILON: f64 = 1e-11;

/// Cartesian position (m) and velocity (m/s) about the center of motion.
#[derive(Clone, Debug)]
pub struct StateVector {
    pub(crate) radius_m: Vector3<f64>,
    pub(crate) velocity_m_s: Vector3<f64>,
    pub(crate) center: Arc<CelestialBody>,
    pub(crate) epoch: Epoch,
    pub(crate) frame: Frame,
}

impl StateVector {
    /// Builds a state vector, the position must be non zero and all components finite.
    pub fn try_new(
        radius_m: Vector3<f64>,
        velocity_m_s: Vector3<f64>,
        center: Arc<CelestialBody>,
        epoch: Epoch,
        frame: Frame,
    ) -> Result<Self, AstroError> {
        if radius_m.iter().chain(velocity_m_s.iter()).any(|x| !x.is_finite()) {
            return Err(AstroError::InvalidStateVector {
                reason: format!("non finite component in {radius_m} / {velocity_m_s}"),
            });
        }
        if radius_m.norm() <= f64::EPSILON {
            return Err(AstroError::InvalidStateVector {
                reason: "position is zero".to_string(),
            });
        }
        Ok(Self {
            radius_m,
            velocity_m_s,
            center,
            epoch,
            frame,
        })
    }

    pub fn radius_m(&self) -> Vector3<f64> {
        self.radius_m
    }

    pub fn velocity_m_s(&self) -> Vector3<f64> {
        self.velocity_m_s
    }

    /// Position and velocity stacked, in [m, m, m, m/s, m/s, m/s]
    pub fn to_cartesian_vec(&self) -> Vector6<f64> {
        let r = self.radius_m;
        let v = self.velocity_m_s;
        Vector6::new(r.x, r.y, r.z, v.x, v.y, v.z)
    }

    /// Specific angular momentum vector, in m^2/s
    pub fn hvec(&self) -> Vector3<f64> {
        self.radius_m.cross(&self.velocity_m_s)
    }

    /// Eccentricity vector (no unit)
    pub fn evec(&self) -> Vector3<f64> {
        let gm = self.center.gm_m3_s2;
        let r = self.radius_m;
        let v = self.velocity_m_s;
        ((v.norm().powi(2) - gm / r.norm()) * r - (r.dot(&v)) * v) / gm
    }

    /// Specific mechanical energy, in m^2/s^2
    pub fn energy_m2_s2(&self) -> f64 {
        self.velocity_m_s.norm().powi(2) / 2.0 - self.center.gm_m3_s2 / self.radius_m.norm()
    }

    /// Node vector, zero for equatorial orbits
    fn nvec(&self) -> Vector3<f64> {
        let h = self.hvec();
        let n = Vector3::z().cross(&h);
        if n.norm() < EQUATORIAL_EPSILON * h.norm() {
            Vector3::zeros()
        } else {
            n
        }
    }

    fn is_retrograde(&self) -> bool {
        self.hvec().z < 0.0
    }
}

/// Angle between two vectors in [0, π], flipped to [π, 2π) when `flip` is set.
fn angle_between(a: &Vector3<f64>, b: &Vector3<f64>, flip: bool) -> f64 {
    let cos_angle = (a.dot(b) / (a.norm() * b.norm())).clamp(-1.0, 1.0);
    let angle = cos_angle.acos();
    if flip {
        between_0_tau(TAU - angle)
    } else {
        angle
    }
}

impl TimeTagged for StateVector {
    fn epoch(&self) -> Epoch {
        self.epoch
    }
}

impl OrbitalElements for StateVector {
    fn center(&self) -> &Arc<CelestialBody> {
        &self.center
    }

    fn frame(&self) -> Frame {
        self.frame
    }

    fn ecc(&self) -> f64 {
        self.evec().norm()
    }

    fn inc_rad(&self) -> f64 {
        let h = self.hvec();
        (h.z / h.norm()).clamp(-1.0, 1.0).acos()
    }

    fn sma_m(&self) -> f64 {
        -self.center.gm_m3_s2 / (2.0 * self.energy_m2_s2())
    }

    /// Zero for equatorial orbits
    fn raan_rad(&self) -> f64 {
        let n = self.nvec();
        if n.norm() == 0.0 {
            0.0
        } else {
            angle_between(&Vector3::x(), &n, n.y < 0.0)
        }
    }

    /// Zero for circular orbits. For equatorial orbits, this is the longitude of periapsis.
    fn aop_rad(&self) -> f64 {
        let e = self.evec();
        if e.norm() < ECC_EPSILON {
            return 0.0;
        }
        let n = self.nvec();
        if n.norm() == 0.0 {
            let long_peri = between_0_tau(e.y.atan2(e.x));
            if self.is_retrograde() {
                between_0_tau(TAU - long_peri)
            } else {
                long_peri
            }
        } else {
            angle_between(&n, &e, e.z < 0.0)
        }
    }

    /// For circular orbits, this is the argument of latitude (or the true longitude if also equatorial).
    fn ta_rad(&self) -> f64 {
        let e = self.evec();
        let r = self.radius_m;
        if e.norm() < ECC_EPSILON {
            let n = self.nvec();
            if n.norm() == 0.0 {
                let long = between_0_tau(r.y.atan2(r.x));
                if self.is_retrograde() {
                    between_0_tau(TAU - long)
                } else {
                    long
                }
            } else {
                angle_between(&n, &r, r.z < 0.0)
            }
        } else {
            angle_between(&e, &r, r.dot(&self.velocity_m_s) < 0.0)
        }
    }
}
