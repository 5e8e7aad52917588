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

use crate::errors::ErrorKind;
use crate::time::Epoch;
use snafu::Snafu;

/// A trait allowing for something to have an epoch
pub trait TimeTagged {
    /// Retrieve the Epoch
    fn epoch(&self) -> Epoch;
}

#[derive(Debug, PartialEq, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum AstroError {
    #[snafu(display("invalid {param} = {value}: must be {expected}"))]
    InvalidElement {
        param: &'static str,
        value: f64,
        expected: &'static str,
    },
    #[snafu(display("invalid state vector: {reason}"))]
    InvalidStateVector { reason: String },
    #[snafu(display("invalid coordinates: {reason}"))]
    InvalidCoordinates { reason: String },
    #[snafu(display("invalid TLE line {line}: {reason}"))]
    TleParsing { line: u8, reason: String },
    #[snafu(display("SGP4 propagation failed at {epoch}: {reason}"))]
    Sgp4Propagation { epoch: Epoch, reason: String },
    #[snafu(display("{action} requires an elliptical orbit but eccentricity is {ecc}"))]
    NotElliptical { action: &'static str, ecc: f64 },
    #[snafu(display("ephemeris error during {action}: {source}"))]
    AstroEphemeris {
        action: &'static str,
        source: EphemerisError,
    },
}

impl AstroError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Sgp4Propagation { .. } => ErrorKind::GeometricInfeasible,
            Self::AstroEphemeris { source, .. } => source.kind(),
            _ => ErrorKind::InvalidArgument,
        }
    }
}

mod window;
pub use self::window::*;

mod frames;
pub use self::frames::*;

mod rotations;
pub use self::rotations::*;

mod bodies;
pub use self::bodies::*;

mod ephemeris;
pub use self::ephemeris::*;

mod analytic;
pub use self::analytic::*;

mod orbit;
pub use self::orbit::*;

mod kepler;
pub use self::kepler::*;

mod statevector;
pub use self::statevector::*;

mod equinoctial;
pub use self::equinoctial::*;

mod equatorial;
pub use self::equatorial::*;

mod tle;
pub use self::tle::*;

mod geodetic;
pub use self::geodetic::*;
pub(crate) use self::geodetic::azimuth_within;

mod orientation;
pub use self::orientation::*;

mod spacecraft;
pub use self::spacecraft::*;

/// Speed of light in meters per second
pub const SPEED_OF_LIGHT: f64 = 299_792_458.0;

/// Astronomical unit, in meters, according to the [IAU](https://www.iau.org/public/themes/measuring/).
pub const AU: f64 = 149_597_870_700.0;

/// From NIST special publication 330, 2008 edition, in meters per second squared
pub const STD_GRAVITY: f64 = 9.80665;

/// Newtonian constant of gravitation, CODATA 2018, in m^3 kg^-1 s^-2
pub const GRAVITATIONAL_CONSTANT: f64 = 6.674_30e-11;

/// Obliquity of the ecliptic at J2000 (84381.448 arcseconds), in radians
pub const OBLIQUITY_J2000_RAD: f64 = 84_381.448 / 3600.0 * std::f64::consts::PI / 180.0;

/// Sun elevation below the horizon defining civil twilight, in radians (-6 degrees)
pub const CIVIL_TWILIGHT_RAD: f64 = -6.0 * std::f64::consts::PI / 180.0;

/// Sun elevation below the horizon defining nautical twilight, in radians (-12 degrees)
pub const NAUTICAL_TWILIGHT_RAD: f64 = -12.0 * std::f64::consts::PI / 180.0;

/// Sun elevation below the horizon defining astronomical twilight, in radians (-18 degrees)
pub const ASTRONOMICAL_TWILIGHT_RAD: f64 = -18.0 * std::f64::consts::PI / 180.0;
