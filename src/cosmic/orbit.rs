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

use super::{
    eccentric_to_mean_anomaly, perifocal_to_inertial, true_to_eccentric_anomaly,
    true_to_mean_anomaly, AstroEphemerisSnafu, AstroError, CelestialBody, EphemerisService,
    EquatorialCoordinates, EquinoctialElements, Frame, KeplerianElements, StateVector, Tle,
    TimeTagged, ECC_EPSILON,
};
use crate::linalg::Vector3;
use crate::time::{Duration, Epoch, Unit};
use crate::utils::between_0_tau;
use snafu::ResultExt;
use std::f64::consts::TAU;
use std::fmt;
use std::sync::Arc;

/// The minimal basis every orbital state representation provides: the classical elements, the center of
/// motion, the epoch and the frame. Angles are in radians and distances in meters.
pub trait OrbitalElements: TimeTagged {
    /// Center of motion of this state
    fn center(&self) -> &Arc<CelestialBody>;
    fn frame(&self) -> Frame;
    /// Eccentricity (no unit)
    fn ecc(&self) -> f64;
    /// Inclination, in radians
    fn inc_rad(&self) -> f64;
    /// Semi-major axis, in meters
    fn sma_m(&self) -> f64;
    /// Right ascension of the ascending node, in radians
    fn raan_rad(&self) -> f64;
    /// Argument of periapsis, in radians
    fn aop_rad(&self) -> f64;
    /// True anomaly, in radians
    fn ta_rad(&self) -> f64;

    /// Eccentric anomaly, in radians
    fn ea_rad(&self) -> f64 {
        true_to_eccentric_anomaly(self.ta_rad(), self.ecc())
    }

    /// Mean anomaly, in radians
    fn ma_rad(&self) -> f64 {
        eccentric_to_mean_anomaly(self.ea_rad(), self.ecc())
    }
}

/// Orbital state of an object about its center of motion, in one of the supported representations.
///
/// States are immutable: propagation and conversions return new values.
#[derive(Clone, Debug)]
pub enum OrbitalState {
    Keplerian(KeplerianElements),
    StateVector(StateVector),
    Equinoctial(EquinoctialElements),
    Tle(Box<Tle>),
    Equatorial(EquatorialCoordinates),
}

macro_rules! dispatch {
    ($state:expr, $inner:ident => $body:expr) => {
        match $state {
            OrbitalState::Keplerian($inner) => $body,
            OrbitalState::StateVector($inner) => $body,
            OrbitalState::Equinoctial($inner) => $body,
            OrbitalState::Tle($inner) => $body,
            OrbitalState::Equatorial($inner) => $body,
        }
    };
}

impl OrbitalState {
    /// Creates a new state from the Keplerian elements, using the mean anomaly.
    #[allow(clippy::too_many_arguments)]
    pub fn keplerian(
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
        Ok(Self::Keplerian(KeplerianElements::try_new(
            sma_m, ecc, inc_rad, raan_rad, aop_rad, ma_rad, center, epoch, frame,
        )?))
    }

    /// Creates a new state from the Keplerian elements, using the true anomaly (elliptical orbits only).
    #[allow(clippy::too_many_arguments)]
    pub fn keplerian_with_ta(
        sma_m: f64,
        ecc: f64,
        inc_rad: f64,
        raan_rad: f64,
        aop_rad: f64,
        ta_rad: f64,
        center: Arc<CelestialBody>,
        epoch: Epoch,
        frame: Frame,
    ) -> Result<Self, AstroError> {
        if ecc >= 1.0 {
            return Err(AstroError::NotElliptical {
                action: "initializing from the true anomaly",
                ecc,
            });
        }
        Self::keplerian(
            sma_m,
            ecc,
            inc_rad,
            raan_rad,
            aop_rad,
            true_to_mean_anomaly(ta_rad, ecc),
            center,
            epoch,
            frame,
        )
    }

    /// Creates a new state from the position (m) and velocity (m/s).
    pub fn cartesian(
        radius_m: Vector3<f64>,
        velocity_m_s: Vector3<f64>,
        center: Arc<CelestialBody>,
        epoch: Epoch,
        frame: Frame,
    ) -> Result<Self, AstroError> {
        Ok(Self::StateVector(StateVector::try_new(
            radius_m,
            velocity_m_s,
            center,
            epoch,
            frame,
        )?))
    }

    /// Creates a new state from the modified equinoctial elements.
    #[allow(clippy::too_many_arguments)]
    pub fn equinoctial(
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
        Ok(Self::Equinoctial(EquinoctialElements::try_new(
            p_m, f, g, h, k, l_rad, center, epoch, frame,
        )?))
    }

    /// Creates a new state from a two-line element set.
    pub fn from_tle(
        name: &str,
        line1: &str,
        line2: &str,
        center: Arc<CelestialBody>,
    ) -> Result<Self, AstroError> {
        Ok(Self::Tle(Box::new(Tle::parse(name, line1, line2, center)?)))
    }

    /// Creates a new state from equatorial coordinates and the Cartesian velocity.
    #[allow(clippy::too_many_arguments)]
    pub fn equatorial(
        declination_rad: f64,
        right_ascension_rad: f64,
        distance_m: f64,
        velocity_m_s: Vector3<f64>,
        center: Arc<CelestialBody>,
        epoch: Epoch,
        frame: Frame,
    ) -> Result<Self, AstroError> {
        Ok(Self::Equatorial(EquatorialCoordinates::try_new(
            declination_rad,
            right_ascension_rad,
            distance_m,
            velocity_m_s,
            center,
            epoch,
            frame,
        )?))
    }

    /// Position and velocity of this state. TLEs use their SGP4 state at the TLE epoch.
    pub fn to_state_vector(&self) -> StateVector {
        match self {
            Self::StateVector(sv) => sv.clone(),
            Self::Tle(tle) => tle.state().clone(),
            Self::Equatorial(eq) => eq.to_state_vector(),
            Self::Keplerian(el) => elements_to_state_vector(el),
            Self::Equinoctial(el) => elements_to_state_vector(el),
        }
    }

    /// Keplerian elements of this state, only defined for elliptical orbits.
    pub fn to_keplerian(&self) -> Result<KeplerianElements, AstroError> {
        if let Self::Keplerian(el) = self {
            return Ok(el.clone());
        }
        let ecc = self.ecc();
        if ecc >= 1.0 {
            return Err(AstroError::NotElliptical {
                action: "converting to Keplerian elements",
                ecc,
            });
        }
        KeplerianElements::try_new(
            self.sma_m(),
            ecc,
            self.inc_rad(),
            self.raan_rad(),
            self.aop_rad(),
            self.ma_rad(),
            self.center().clone(),
            self.epoch(),
            self.frame(),
        )
    }

    pub fn to_equinoctial(&self) -> Result<EquinoctialElements, AstroError> {
        if let Self::Equinoctial(el) = self {
            return Ok(el.clone());
        }
        let ecc = self.ecc();
        let (raan, aop) = (self.raan_rad(), self.aop_rad());
        let tan_half_inc = (self.inc_rad() / 2.0).tan();
        EquinoctialElements::try_new(
            self.semi_parameter_m(),
            ecc * (raan + aop).cos(),
            ecc * (raan + aop).sin(),
            tan_half_inc * raan.cos(),
            tan_half_inc * raan.sin(),
            raan + aop + self.ta_rad(),
            self.center().clone(),
            self.epoch(),
            self.frame(),
        )
    }

    pub fn to_equatorial(&self) -> EquatorialCoordinates {
        match self {
            Self::Equatorial(eq) => eq.clone(),
            _ => EquatorialCoordinates::from_state_vector(&self.to_state_vector()),
        }
    }

    /// Position vector, in meters
    pub fn radius_m(&self) -> Vector3<f64> {
        self.to_state_vector().radius_m
    }

    /// Velocity vector, in meters per second
    pub fn velocity_m_s(&self) -> Vector3<f64> {
        self.to_state_vector().velocity_m_s
    }

    /// Gravitational parameter of the center of motion, in m^3/s^2
    pub fn gm(&self) -> f64 {
        self.center().gm_m3_s2
    }

    /// Propagates this state to the provided epoch with two-body motion, returning Keplerian elements.
    ///
    /// TLEs are propagated with SGP4 and the result converted to Keplerian elements.
    pub fn at_epoch(&self, epoch: Epoch) -> Result<Self, AstroError> {
        if let Self::Tle(tle) = self {
            return Ok(Self::Keplerian(
                Self::StateVector(tle.propagate(epoch)?).to_keplerian()?,
            ));
        }
        let ecc = self.ecc();
        if ecc >= 1.0 {
            return Err(AstroError::NotElliptical {
                action: "two-body propagation",
                ecc,
            });
        }
        let ma_rad = self.ma_rad() + self.mean_motion_rad_s() * (epoch - self.epoch()).to_seconds();
        Self::keplerian(
            self.sma_m(),
            ecc,
            self.inc_rad(),
            self.raan_rad(),
            self.aop_rad(),
            between_0_tau(ma_rad),
            self.center().clone(),
            epoch,
            self.frame(),
        )
    }

    /// Returns this state in the target frame, as a state vector.
    ///
    /// # Frame transformation
    /// `r' = R r` and `v' = R v - ω × r'`, with the rotation and angular velocity queried from the service at the epoch of this state.
    pub fn to_frame(
        &self,
        target: Frame,
        service: &dyn EphemerisService,
    ) -> Result<Self, AstroError> {
        if self.frame() == target {
            return Ok(self.clone());
        }
        let transform = service
            .frame_transform(self.frame(), target, self.epoch())
            .context(AstroEphemerisSnafu {
                action: "transforming an orbital state",
            })?;
        let sv = self.to_state_vector();
        let (radius_m, velocity_m_s) = transform.apply(&sv.radius_m, &sv.velocity_m_s);
        Self::cartesian(
            radius_m,
            velocity_m_s,
            self.center().clone(),
            self.epoch(),
            target,
        )
    }

    /// Applies an impulsive change of velocity (m/s, in the frame of this state).
    pub fn with_delta_v(&self, delta_v_m_s: Vector3<f64>) -> Result<Self, AstroError> {
        let sv = self.to_state_vector();
        Self::cartesian(
            sv.radius_m,
            sv.velocity_m_s + delta_v_m_s,
            sv.center,
            sv.epoch,
            sv.frame,
        )
    }

    /// Returns true if the eccentricity is below [ECC_EPSILON]
    pub fn is_circular(&self) -> bool {
        self.ecc() < ECC_EPSILON
    }

    /// Eccentricity vector, pointing to the periapsis
    pub fn eccentricity_vector(&self) -> Vector3<f64> {
        self.to_state_vector().evec()
    }

    /// Specific angular momentum vector, in m^2/s
    pub fn specific_angular_momentum(&self) -> Vector3<f64> {
        self.to_state_vector().hvec()
    }

    /// Specific mechanical energy, in m^2/s^2
    pub fn specific_energy_m2_s2(&self) -> f64 {
        -self.gm() / (2.0 * self.sma_m())
    }

    /// Semi-parameter, in meters
    pub fn semi_parameter_m(&self) -> f64 {
        self.sma_m() * (1.0 - self.ecc().powi(2))
    }

    /// Periapsis radius, in meters
    pub fn periapsis_m(&self) -> f64 {
        self.sma_m() * (1.0 - self.ecc())
    }

    /// Apoapsis radius, in meters
    pub fn apoapsis_m(&self) -> f64 {
        self.sma_m() * (1.0 + self.ecc())
    }

    /// Perigee position vector. Circular orbits use the X axis of the frame.
    pub fn perigee_vector(&self) -> Vector3<f64> {
        if self.is_circular() {
            Vector3::x() * self.sma_m()
        } else {
            self.eccentricity_vector().normalize() * self.periapsis_m()
        }
    }

    /// Apogee position vector, opposite to the perigee.
    pub fn apogee_vector(&self) -> Vector3<f64> {
        if self.is_circular() {
            -Vector3::x() * self.sma_m()
        } else {
            -self.eccentricity_vector().normalize() * self.apoapsis_m()
        }
    }

    /// Velocity at perigee from the vis-viva equation, in m/s
    pub fn perigee_velocity_m_s(&self) -> f64 {
        (self.gm() * (2.0 / self.periapsis_m() - 1.0 / self.sma_m())).sqrt()
    }

    /// Velocity at apogee from the vis-viva equation, in m/s
    pub fn apogee_velocity_m_s(&self) -> f64 {
        (self.gm() * (2.0 / self.apoapsis_m() - 1.0 / self.sma_m())).sqrt()
    }

    /// Mean motion, in rad/s
    pub fn mean_motion_rad_s(&self) -> f64 {
        (self.gm() / self.sma_m().abs().powi(3)).sqrt()
    }

    /// Orbital period, only defined for elliptical orbits
    pub fn period(&self) -> Result<Duration, AstroError> {
        let ecc = self.ecc();
        if ecc >= 1.0 {
            return Err(AstroError::NotElliptical {
                action: "computing the period",
                ecc,
            });
        }
        Ok(TAU / self.mean_motion_rad_s() * Unit::Second)
    }

    /// True longitude (Ω + ω + ν), in radians in [0, 2π)
    pub fn true_longitude_rad(&self) -> f64 {
        between_0_tau(self.raan_rad() + self.aop_rad() + self.ta_rad())
    }

    /// Mean longitude (Ω + ω + M), in radians in [0, 2π)
    pub fn mean_longitude_rad(&self) -> f64 {
        between_0_tau(self.raan_rad() + self.aop_rad() + self.ma_rad())
    }

    /// Name of the representation
    pub fn representation(&self) -> &'static str {
        match self {
            Self::Keplerian(_) => "Keplerian",
            Self::StateVector(_) => "state vector",
            Self::Equinoctial(_) => "equinoctial",
            Self::Tle(_) => "TLE",
            Self::Equatorial(_) => "equatorial",
        }
    }
}

fn elements_to_state_vector<E: OrbitalElements>(el: &E) -> StateVector {
    let (radius_m, velocity_m_s) = perifocal_to_inertial(
        el.center().gm_m3_s2,
        el.sma_m(),
        el.ecc(),
        el.inc_rad(),
        el.raan_rad(),
        el.aop_rad(),
        el.ta_rad(),
    );
    StateVector {
        radius_m,
        velocity_m_s,
        center: el.center().clone(),
        epoch: el.epoch(),
        frame: el.frame(),
    }
}

impl TimeTagged for OrbitalState {
    fn epoch(&self) -> Epoch {
        dispatch!(self, inner => inner.epoch())
    }
}

impl OrbitalElements for OrbitalState {
    fn center(&self) -> &Arc<CelestialBody> {
        dispatch!(self, inner => inner.center())
    }

    fn frame(&self) -> Frame {
        dispatch!(self, inner => inner.frame())
    }

    fn ecc(&self) -> f64 {
        dispatch!(self, inner => inner.ecc())
    }

    fn inc_rad(&self) -> f64 {
        dispatch!(self, inner => inner.inc_rad())
    }

    fn sma_m(&self) -> f64 {
        dispatch!(self, inner => inner.sma_m())
    }

    fn raan_rad(&self) -> f64 {
        dispatch!(self, inner => inner.raan_rad())
    }

    fn aop_rad(&self) -> f64 {
        dispatch!(self, inner => inner.aop_rad())
    }

    fn ta_rad(&self) -> f64 {
        dispatch!(self, inner => inner.ta_rad())
    }

    fn ea_rad(&self) -> f64 {
        dispatch!(self, inner => inner.ea_rad())
    }

    fn ma_rad(&self) -> f64 {
        dispatch!(self, inner => inner.ma_rad())
    }
}

impl PartialEq for OrbitalState {
    /// Structural equality: same representation, center, epoch, frame and elements.
    fn eq(&self, other: &Self) -> bool {
        if self.center().naif_id != other.center().naif_id
            || self.epoch() != other.epoch()
            || self.frame() != other.frame()
        {
            return false;
        }
        match (self, other) {
            (Self::Keplerian(a), Self::Keplerian(b)) => {
                (a.sma_m, a.ecc, a.inc_rad, a.raan_rad, a.aop_rad, a.ma_rad)
                    == (b.sma_m, b.ecc, b.inc_rad, b.raan_rad, b.aop_rad, b.ma_rad)
            }
            (Self::StateVector(a), Self::StateVector(b)) => {
                a.radius_m == b.radius_m && a.velocity_m_s == b.velocity_m_s
            }
            (Self::Equinoctial(a), Self::Equinoctial(b)) => {
                (a.p_m, a.f, a.g, a.h, a.k, a.l_rad) == (b.p_m, b.f, b.g, b.h, b.k, b.l_rad)
            }
            (Self::Tle(a), Self::Tle(b)) => {
                (&a.name, &a.line1, &a.line2) == (&b.name, &b.line1, &b.line2)
            }
            (Self::Equatorial(a), Self::Equatorial(b)) => {
                (a.declination_rad, a.right_ascension_rad, a.distance_m)
                    == (b.declination_rad, b.right_ascension_rad, b.distance_m)
                    && a.velocity_m_s == b.velocity_m_s
            }
            _ => false,
        }
    }
}

#[allow(clippy::format_in_format_args)]
impl fmt::Display for OrbitalState {
    // Prints each representation with its own elements, in km and degrees
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let decimals = f.precision().unwrap_or(6);
        write!(f, "[{}] {}\t", self.frame(), self.epoch())?;
        match self {
            Self::Keplerian(_) => self.fmt_keplerian(f, decimals),
            Self::StateVector(sv) => write!(
                f,
                "position = [{}, {}, {}] km\tvelocity = [{}, {}, {}] km/s",
                format!("{:.*}", decimals, sv.radius_m.x * 1e-3),
                format!("{:.*}", decimals, sv.radius_m.y * 1e-3),
                format!("{:.*}", decimals, sv.radius_m.z * 1e-3),
                format!("{:.*}", decimals, sv.velocity_m_s.x * 1e-3),
                format!("{:.*}", decimals, sv.velocity_m_s.y * 1e-3),
                format!("{:.*}", decimals, sv.velocity_m_s.z * 1e-3),
            ),
            Self::Equinoctial(eq) => write!(
                f,
                "p = {} km\tf = {}\tg = {}\th = {}\tk = {}\tL = {} deg",
                format!("{:.*}", decimals, eq.p_m * 1e-3),
                format!("{:.*}", decimals, eq.f),
                format!("{:.*}", decimals, eq.g),
                format!("{:.*}", decimals, eq.h),
                format!("{:.*}", decimals, eq.k),
                format!("{:.*}", decimals, eq.l_rad.to_degrees()),
            ),
            Self::Tle(tle) => {
                let (line1, line2) = tle.lines();
                write!(f, "{}\n{line1}\n{line2}", tle.name())
            }
            Self::Equatorial(eq) => write!(
                f,
                "dec = {} deg\tra = {} deg\tdistance = {} km",
                format!("{:.*}", decimals, eq.declination_rad.to_degrees()),
                format!("{:.*}", decimals, eq.right_ascension_rad.to_degrees()),
                format!("{:.*}", decimals, eq.distance_m * 1e-3),
            ),
        }
    }
}

impl OrbitalState {
    #[allow(clippy::format_in_format_args)]
    fn fmt_keplerian(&self, f: &mut fmt::Formatter, decimals: usize) -> fmt::Result {
        write!(
            f,
            "sma = {} km\tecc = {}\tinc = {} deg\traan = {} deg\taop = {} deg\tta = {} deg",
            format!("{:.*}", decimals, self.sma_m() * 1e-3),
            format!("{:.*}", decimals, self.ecc()),
            format!("{:.*}", decimals, self.inc_rad().to_degrees()),
            format!("{:.*}", decimals, self.raan_rad().to_degrees()),
            format!("{:.*}", decimals, self.aop_rad().to_degrees()),
            format!("{:.*}", decimals, self.ta_rad().to_degrees()),
        )
    }
}

impl fmt::LowerHex for OrbitalState {
    // Prints the Keplerian orbital elements in floating point with units, whatever the representation
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let decimals = f.precision().unwrap_or(6);
        write!(f, "[{}] {}\t", self.frame(), self.epoch())?;
        self.fmt_keplerian(f, decimals)
    }
}
