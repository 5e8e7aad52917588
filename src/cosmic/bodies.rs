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
    Aberration, AstroEphemerisSnafu, AstroError, BodyConstants, EphemerisError, EphemerisService,
    Frame, OrbitalElements, OrbitalState, GRAVITATIONAL_CONSTANT,
};
use crate::time::Epoch;
use snafu::ResultExt;
use std::convert::TryFrom;
use std::fmt;
use std::sync::Arc;

/// Defines the celestial bodies known to the analytic ephemeris, by NAIF ID.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Bodies {
    Sun,
    Mercury,
    Venus,
    Earth,
    Moon,
    Mars,
    Jupiter,
}

impl Bodies {
    pub fn naif_id(&self) -> i32 {
        match *self {
            Self::Sun => 10,
            Self::Mercury => 199,
            Self::Venus => 299,
            Self::Earth => 399,
            Self::Moon => 301,
            Self::Mars => 499,
            Self::Jupiter => 599,
        }
    }

    /// Returns the human name
    pub fn name(&self) -> &'static str {
        match *self {
            Self::Sun => "Sun",
            Self::Mercury => "Mercury",
            Self::Venus => "Venus",
            Self::Earth => "Earth",
            Self::Moon => "Moon",
            Self::Mars => "Mars",
            Self::Jupiter => "Jupiter",
        }
    }
}

impl TryFrom<i32> for Bodies {
    type Error = EphemerisError;

    fn try_from(naif_id: i32) -> Result<Self, Self::Error> {
        match naif_id {
            10 => Ok(Self::Sun),
            199 => Ok(Self::Mercury),
            299 => Ok(Self::Venus),
            399 => Ok(Self::Earth),
            301 => Ok(Self::Moon),
            499 => Ok(Self::Mars),
            599 => Ok(Self::Jupiter),
            _ => Err(EphemerisError::UnknownBody { naif_id }),
        }
    }
}

impl TryFrom<&str> for Bodies {
    type Error = EphemerisError;

    fn try_from(name: &str) -> Result<Self, Self::Error> {
        match name.to_lowercase().as_str() {
            "sun" => Ok(Self::Sun),
            "mercury" => Ok(Self::Mercury),
            "venus" => Ok(Self::Venus),
            "earth" => Ok(Self::Earth),
            "moon" | "luna" => Ok(Self::Moon),
            "mars" => Ok(Self::Mars),
            "jupiter" => Ok(Self::Jupiter),
            _ => Err(EphemerisError::UnknownBodyName {
                name: name.to_string(),
            }),
        }
    }
}

/// A celestial body used as the center of motion of orbital states.
///
/// The sphere of influence is recomputed every time the orbit of this body is set. A body without
/// an orbit (e.g. the Sun in a heliocentric context) has an infinite sphere of influence.
#[derive(Clone, Debug)]
pub struct CelestialBody {
    pub naif_id: i32,
    pub name: String,
    /// Gravitational parameter, in m^3/s^2
    pub gm_m3_s2: f64,
    /// Mass derived from the gravitational parameter, in kg
    pub mass_kg: f64,
    pub equatorial_radius_m: f64,
    pub polar_radius_m: f64,
    pub flattening: f64,
    orbit: Option<OrbitalState>,
    sphere_of_influence_m: f64,
}

impl CelestialBody {
    pub fn new(
        naif_id: i32,
        name: &str,
        gm_m3_s2: f64,
        equatorial_radius_m: f64,
        polar_radius_m: f64,
    ) -> Self {
        let mut flattening = (equatorial_radius_m - polar_radius_m) / equatorial_radius_m;
        if flattening.is_nan() {
            flattening = f64::INFINITY;
        }
        Self {
            naif_id,
            name: name.to_string(),
            gm_m3_s2,
            mass_kg: gm_m3_s2 / GRAVITATIONAL_CONSTANT,
            equatorial_radius_m,
            polar_radius_m,
            flattening,
            orbit: None,
            sphere_of_influence_m: f64::INFINITY,
        }
    }

    pub fn from_constants(constants: &BodyConstants) -> Self {
        Self::new(
            constants.naif_id,
            &constants.name,
            constants.gm_m3_s2,
            constants.equatorial_radius_m,
            constants.polar_radius_m,
        )
    }

    /// Builds this body from the constants of the ephemeris service, without any orbit.
    pub fn from_service(
        service: &dyn EphemerisService,
        naif_id: i32,
    ) -> Result<Self, EphemerisError> {
        Ok(Self::from_constants(&service.body_constants(naif_id)?))
    }

    /// Loads this body and, recursively, all of its primaries. Each body's orbit about its primary
    /// is the osculating state at the provided epoch, so all spheres of influence are set.
    pub fn load(
        service: &dyn EphemerisService,
        naif_id: i32,
        epoch: Epoch,
    ) -> Result<Arc<Self>, AstroError> {
        let constants = service
            .body_constants(naif_id)
            .context(AstroEphemerisSnafu {
                action: "loading body constants",
            })?;
        let body = Self::from_constants(&constants);
        match constants.primary_id {
            Some(primary_id) => {
                let primary = Self::load(service, primary_id, epoch)?;
                Ok(Arc::new(body.with_orbit_from_service(
                    service, &primary, epoch,
                )?))
            }
            None => Ok(Arc::new(body)),
        }
    }

    /// Returns a copy of this body orbiting the provided primary, its orbit queried from the service.
    pub fn with_orbit_from_service(
        self,
        service: &dyn EphemerisService,
        primary: &Arc<Self>,
        epoch: Epoch,
    ) -> Result<Self, AstroError> {
        let orbit = self.ephemeris(service, epoch, primary, Frame::ICRF, Aberration::None)?;
        Ok(self.with_orbit(orbit))
    }

    /// Returns a copy of this body with the provided orbit, and the sphere of influence updated.
    pub fn with_orbit(mut self, orbit: OrbitalState) -> Self {
        self.set_orbit(orbit);
        self
    }

    /// Sets (or replaces) the orbit of this body and recomputes its sphere of influence.
    pub fn set_orbit(&mut self, orbit: OrbitalState) {
        let primary_mass_kg = orbit.center().mass_kg;
        self.sphere_of_influence_m = if orbit.ecc() < 1.0 {
            orbit.sma_m() * (self.mass_kg / primary_mass_kg).powf(2.0 / 5.0)
        } else {
            // Never captured by the primary
            warn!("{self} is on an escape orbit (ecc = {}) about {}", orbit.ecc(), orbit.center());
            f64::INFINITY
        };
        debug!(
            "{self} sphere of influence set to {:.3} km about {}",
            self.sphere_of_influence_m * 1e-3,
            orbit.center()
        );
        self.orbit = Some(orbit);
    }

    pub fn orbit(&self) -> Option<&OrbitalState> {
        self.orbit.as_ref()
    }

    /// Sphere of influence radius, in meters
    pub fn sphere_of_influence_m(&self) -> f64 {
        self.sphere_of_influence_m
    }

    /// Body fixed frame of this body
    pub fn frame(&self) -> Frame {
        Frame::BodyFixed(self.naif_id)
    }

    /// Radius of the reference ellipsoid at the provided planetocentric latitude, in meters.
    pub fn radius_from_planetocentric_latitude(&self, latitude_rad: f64) -> f64 {
        let r2 = self.equatorial_radius_m.powi(2);
        let s2 = latitude_rad.sin().powi(2);
        let f2 = (1.0 - self.flattening).powi(2);
        (r2 / (1.0 + (1.0 / f2 - 1.0) * s2)).sqrt()
    }

    /// State of this body as seen from the observer, in the requested frame.
    pub fn ephemeris(
        &self,
        service: &dyn EphemerisService,
        epoch: Epoch,
        observer: &Arc<Self>,
        frame: Frame,
        aberration: Aberration,
    ) -> Result<OrbitalState, AstroError> {
        let state = service
            .state_of(self.naif_id, epoch, observer.naif_id, frame, aberration)
            .context(AstroEphemerisSnafu {
                action: "querying body ephemeris",
            })?;
        OrbitalState::cartesian(
            state.fixed_rows::<3>(0).into_owned(),
            state.fixed_rows::<3>(3).into_owned(),
            observer.clone(),
            epoch,
            frame,
        )
    }
}

impl PartialEq for CelestialBody {
    /// Orbits are not compared: two bodies are the same if their constants match.
    fn eq(&self, other: &Self) -> bool {
        self.naif_id == other.naif_id
            && self.name == other.name
            && self.gm_m3_s2 == other.gm_m3_s2
            && self.equatorial_radius_m == other.equatorial_radius_m
            && self.polar_radius_m == other.polar_radius_m
    }
}

impl fmt::Display for CelestialBody {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.naif_id)
    }
}

#[cfg(test)]
mod ut_bodies {
    use super::*;
    use crate::cosmic::AnalyticEphemeris;
    use crate::linalg::Vector3;
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    #[test]
    fn flattening() {
        let earth = CelestialBody::new(399, "Earth", 3.986_004_418e14, 6_378_136.6, 6_356_751.9);
        assert_relative_eq!(earth.flattening, 0.003_352_813_178, max_relative = 1e-9);
        assert_eq!(earth.sphere_of_influence_m(), f64::INFINITY);
        assert!(earth.orbit().is_none());
        assert_relative_eq!(earth.mass_kg, 5.972_2e24, max_relative = 1e-3);

        let point = CelestialBody::new(-1, "point", 1.0, 0.0, 0.0);
        assert_eq!(point.flattening, f64::INFINITY);
    }

    #[test]
    fn radius_from_latitude() {
        let earth = CelestialBody::new(399, "Earth", 3.986_004_418e14, 6_378_136.6, 6_356_751.9);
        assert_abs_diff_eq!(
            earth.radius_from_planetocentric_latitude(0.0),
            6_378_136.6,
            epsilon = 1e-6
        );
        assert_abs_diff_eq!(
            earth.radius_from_planetocentric_latitude(std::f64::consts::FRAC_PI_2),
            6_356_751.9,
            epsilon = 1e-6
        );
    }

    #[test]
    fn sphere_of_influence() {
        let service = AnalyticEphemeris::default();
        let epoch = Epoch::from_gregorian_utc_at_midnight(2021, 1, 1);
        let moon = CelestialBody::load(&service, 301, epoch).unwrap();
        let earth = moon.orbit().unwrap().center().clone();
        // Earth SOI is about 925 000 km and the Moon's about 66 000 km
        assert_relative_eq!(earth.sphere_of_influence_m(), 9.25e8, max_relative = 0.01);
        assert_relative_eq!(moon.sphere_of_influence_m(), 6.6e7, max_relative = 0.05);
        let sun = earth.orbit().unwrap().center();
        assert_eq!(sun.naif_id, 10);
        assert_eq!(sun.sphere_of_influence_m(), f64::INFINITY);

        // Replacing the orbit recomputes the SOI
        let mut earth2 = (*earth).clone();
        let orbit = OrbitalState::keplerian(
            2.0 * crate::cosmic::AU,
            0.0,
            0.0,
            0.0,
            0.0,
            0.0,
            sun.clone(),
            epoch,
            Frame::EclipJ2000,
        )
        .unwrap();
        earth2.set_orbit(orbit);
        assert_relative_eq!(
            earth2.sphere_of_influence_m(),
            2.0 * crate::cosmic::AU * (earth.mass_kg / sun.mass_kg).powf(0.4),
            max_relative = 1e-12
        );
        assert_eq!(earth2, *earth);

        // Escaping the primary
        let escape = OrbitalState::cartesian(
            Vector3::new(crate::cosmic::AU, 0.0, 0.0),
            Vector3::new(0.0, 60e3, 0.0),
            sun.clone(),
            epoch,
            Frame::EclipJ2000,
        )
        .unwrap();
        assert!(escape.ecc() > 1.0);
        earth2.set_orbit(escape);
        assert_eq!(earth2.sphere_of_influence_m(), f64::INFINITY);
    }
}
