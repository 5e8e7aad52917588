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
    Aberration, AstroEphemerisSnafu, AstroError, CelestialBody, EphemerisService, Frame,
    OrbitalState,
};
use crate::io::ConfigRepr;
use crate::linalg::Vector3;
use crate::time::Epoch;
use crate::utils::between_0_tau;
use serde_derive::{Deserialize, Serialize};
use snafu::ResultExt;
use std::f64::consts::{FRAC_PI_2, TAU};
use std::fmt;
use std::sync::Arc;

const GEODETIC_TOLERANCE: f64 = 1e-12;
const GEODETIC_MAX_ITERATIONS: usize = 20;

/// Square of the eccentricity of the reference ellipsoid of the body
fn ellipsoid_ecc2(body: &CelestialBody) -> f64 {
    2.0 * body.flattening - body.flattening.powi(2)
}

fn check_latitude(latitude_rad: f64) -> Result<(), AstroError> {
    if (-FRAC_PI_2..=FRAC_PI_2).contains(&latitude_rad) {
        Ok(())
    } else {
        Err(AstroError::InvalidCoordinates {
            reason: format!("latitude of {latitude_rad} rad is not within [-π/2, π/2]"),
        })
    }
}

fn check_finite(param: &str, value: f64) -> Result<(), AstroError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(AstroError::InvalidCoordinates {
            reason: format!("{param} must be finite"),
        })
    }
}

/// Geodetic coordinates, with respect to the reference ellipsoid of the body.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Geodetic {
    pub longitude_rad: f64,
    pub latitude_rad: f64,
    /// Height above the ellipsoid, in meters
    pub height_m: f64,
}

impl Geodetic {
    pub fn try_new(longitude_rad: f64, latitude_rad: f64, height_m: f64) -> Result<Self, AstroError> {
        check_finite("longitude", longitude_rad)?;
        check_finite("height", height_m)?;
        check_latitude(latitude_rad)?;
        Ok(Self {
            longitude_rad,
            latitude_rad,
            height_m,
        })
    }

    pub fn from_degrees(longitude_deg: f64, latitude_deg: f64, height_m: f64) -> Result<Self, AstroError> {
        Self::try_new(longitude_deg.to_radians(), latitude_deg.to_radians(), height_m)
    }

    /// Position in the body fixed frame, in meters
    pub fn to_body_fixed(&self, body: &CelestialBody) -> Vector3<f64> {
        let e2 = ellipsoid_ecc2(body);
        let (sin_lat, cos_lat) = self.latitude_rad.sin_cos();
        let (sin_lon, cos_lon) = self.longitude_rad.sin_cos();
        let n = body.equatorial_radius_m / (1.0 - e2 * sin_lat.powi(2)).sqrt();
        Vector3::new(
            (n + self.height_m) * cos_lat * cos_lon,
            (n + self.height_m) * cos_lat * sin_lon,
            (n * (1.0 - e2) + self.height_m) * sin_lat,
        )
    }

    /// Geodetic coordinates of a body fixed position, iterating on the latitude.
    pub fn from_body_fixed(position_m: &Vector3<f64>, body: &CelestialBody) -> Self {
        let e2 = ellipsoid_ecc2(body);
        let p = position_m.x.hypot(position_m.y);
        let longitude_rad = position_m.y.atan2(position_m.x);
        if p < f64::EPSILON * body.equatorial_radius_m {
            // On the polar axis
            return Self {
                longitude_rad,
                latitude_rad: FRAC_PI_2.copysign(position_m.z),
                height_m: position_m.z.abs() - body.polar_radius_m,
            };
        }
        let mut latitude_rad = position_m.z.atan2(p * (1.0 - e2));
        let mut height_m = 0.0;
        for _ in 0..GEODETIC_MAX_ITERATIONS {
            let n = body.equatorial_radius_m / (1.0 - e2 * latitude_rad.sin().powi(2)).sqrt();
            height_m = p / latitude_rad.cos() - n;
            let next = position_m.z.atan2(p * (1.0 - e2 * n / (n + height_m)));
            let converged = (next - latitude_rad).abs() < GEODETIC_TOLERANCE;
            latitude_rad = next;
            if converged {
                break;
            }
        }
        Self {
            longitude_rad,
            latitude_rad,
            height_m,
        }
    }

    pub fn to_planetocentric(&self, body: &CelestialBody) -> Planetocentric {
        Planetocentric::from_body_fixed(&self.to_body_fixed(body))
    }
}

impl fmt::Display for Geodetic {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "lon = {:.6} deg\tlat = {:.6} deg\theight = {:.3} m",
            self.longitude_rad.to_degrees(),
            self.latitude_rad.to_degrees(),
            self.height_m
        )
    }
}

/// Planetocentric coordinates: spherical coordinates about the center of the body.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Planetocentric {
    pub longitude_rad: f64,
    pub latitude_rad: f64,
    pub radius_m: f64,
}

impl Planetocentric {
    pub fn try_new(longitude_rad: f64, latitude_rad: f64, radius_m: f64) -> Result<Self, AstroError> {
        check_finite("longitude", longitude_rad)?;
        check_latitude(latitude_rad)?;
        if !(radius_m >= 0.0 && radius_m.is_finite()) {
            return Err(AstroError::InvalidCoordinates {
                reason: format!("radius of {radius_m} m must be positive"),
            });
        }
        Ok(Self {
            longitude_rad,
            latitude_rad,
            radius_m,
        })
    }

    pub fn from_body_fixed(position_m: &Vector3<f64>) -> Self {
        Self {
            longitude_rad: position_m.y.atan2(position_m.x),
            latitude_rad: position_m.z.atan2(position_m.x.hypot(position_m.y)),
            radius_m: position_m.norm(),
        }
    }

    pub fn to_body_fixed(&self) -> Vector3<f64> {
        let (sin_lat, cos_lat) = self.latitude_rad.sin_cos();
        let (sin_lon, cos_lon) = self.longitude_rad.sin_cos();
        self.radius_m * Vector3::new(cos_lat * cos_lon, cos_lat * sin_lon, sin_lat)
    }

    pub fn to_geodetic(&self, body: &CelestialBody) -> Geodetic {
        Geodetic::from_body_fixed(&self.to_body_fixed(), body)
    }
}

/// Azimuth (from north, clockwise), elevation and range of a target as seen from a site.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct HorizontalCoordinates {
    pub azimuth_rad: f64,
    pub elevation_rad: f64,
    pub range_m: f64,
}

/// A site on the surface of a celestial body. Configured with geodetic coordinates in degrees.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Site {
    pub name: String,
    /// NAIF ID of the body the site is on
    #[serde(default = "default_body_id")]
    pub body_id: i32,
    pub longitude_deg: f64,
    pub latitude_deg: f64,
    #[serde(default)]
    pub height_m: f64,
}

fn default_body_id() -> i32 {
    399
}

impl ConfigRepr for Site {}

impl Site {
    pub fn try_new(
        name: &str,
        body_id: i32,
        longitude_deg: f64,
        latitude_deg: f64,
        height_m: f64,
    ) -> Result<Self, AstroError> {
        let site = Self {
            name: name.to_string(),
            body_id,
            longitude_deg,
            latitude_deg,
            height_m,
        };
        site.geodetic()?;
        Ok(site)
    }

    /// Builds a site on Earth
    pub fn on_earth(name: &str, longitude_deg: f64, latitude_deg: f64, height_m: f64) -> Result<Self, AstroError> {
        Self::try_new(name, default_body_id(), longitude_deg, latitude_deg, height_m)
    }

    pub fn geodetic(&self) -> Result<Geodetic, AstroError> {
        Geodetic::from_degrees(self.longitude_deg, self.latitude_deg, self.height_m)
    }

    pub fn body(&self, service: &dyn EphemerisService) -> Result<CelestialBody, AstroError> {
        CelestialBody::from_service(service, self.body_id).context(AstroEphemerisSnafu {
            action: "loading the body of a site",
        })
    }

    /// Position of the site in the body fixed frame, in meters
    pub fn body_fixed_position(&self, body: &CelestialBody) -> Result<Vector3<f64>, AstroError> {
        Ok(self.geodetic()?.to_body_fixed(body))
    }

    /// Unit vectors of the local East, North and Up directions, in the body fixed frame.
    pub fn enu_basis(&self) -> Result<(Vector3<f64>, Vector3<f64>, Vector3<f64>), AstroError> {
        let geodetic = self.geodetic()?;
        let (sin_lat, cos_lat) = geodetic.latitude_rad.sin_cos();
        let (sin_lon, cos_lon) = geodetic.longitude_rad.sin_cos();
        Ok((
            Vector3::new(-sin_lon, cos_lon, 0.0),
            Vector3::new(-sin_lat * cos_lon, -sin_lat * sin_lon, cos_lat),
            Vector3::new(cos_lat * cos_lon, cos_lat * sin_lon, sin_lat),
        ))
    }

    /// Inertial (ICRF) state of the site at the provided epoch, centered on its body.
    pub fn state_at(
        &self,
        epoch: Epoch,
        service: &dyn EphemerisService,
    ) -> Result<OrbitalState, AstroError> {
        let body = Arc::new(self.body(service)?);
        let fixed = self.body_fixed_position(&body)?;
        let transform = service
            .frame_transform(body.frame(), Frame::ICRF, epoch)
            .context(AstroEphemerisSnafu {
                action: "rotating a site to ICRF",
            })?;
        let (radius_m, velocity_m_s) = transform.apply(&fixed, &Vector3::zeros());
        OrbitalState::cartesian(radius_m, velocity_m_s, body, epoch, Frame::ICRF)
    }

    /// Azimuth, elevation and range of the target body as seen from this site.
    pub fn horizontal_coordinates(
        &self,
        target_id: i32,
        epoch: Epoch,
        service: &dyn EphemerisService,
    ) -> Result<HorizontalCoordinates, AstroError> {
        let body = self.body(service)?;
        let target = service
            .state_of(
                target_id,
                epoch,
                self.body_id,
                body.frame(),
                Aberration::None,
            )
            .context(AstroEphemerisSnafu {
                action: "computing the horizontal coordinates of a target",
            })?;
        let relative = target.fixed_rows::<3>(0).into_owned() - self.body_fixed_position(&body)?;
        let range_m = relative.norm();
        let (east, north, up) = self.enu_basis()?;
        Ok(HorizontalCoordinates {
            azimuth_rad: between_0_tau(relative.dot(&east).atan2(relative.dot(&north))),
            elevation_rad: (relative.dot(&up) / range_m).clamp(-1.0, 1.0).asin(),
            range_m,
        })
    }
}

impl fmt::Display for Site {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{} (lon = {:.6} deg, lat = {:.6} deg, height = {:.3} m on {})",
            self.name, self.longitude_deg, self.latitude_deg, self.height_m, self.body_id
        )
    }
}

/// Returns true if the azimuth lies in the range going clockwise from `start` to `end`, wrapping through north.
pub(crate) fn azimuth_within(azimuth_rad: f64, start_rad: f64, end_rad: f64) -> bool {
    let span = end_rad - start_rad;
    if span >= TAU {
        return true;
    }
    between_0_tau(azimuth_rad - start_rad) <= between_0_tau(span)
}
