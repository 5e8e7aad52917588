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

use super::{Frame, FrameTransform};
use crate::errors::ErrorKind;
use crate::io::ConfigRepr;
use crate::linalg::Vector6;
use crate::time::Epoch;
use enum_iterator::{all, Sequence};
use serde_derive::{Deserialize, Serialize};
use snafu::Snafu;
use std::fmt;
use std::str::FromStr;

#[derive(Clone, Debug, PartialEq, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum EphemerisError {
    #[snafu(display("no body with NAIF ID {naif_id} is loaded"))]
    UnknownBody { naif_id: i32 },
    #[snafu(display("no body named `{name}` is loaded"))]
    UnknownBodyName { name: String },
    #[snafu(display("unknown frame `{name}`"))]
    UnknownFrame { name: String },
    #[snafu(display("no orientation model for the body fixed frame of {naif_id}"))]
    NoOrientation { naif_id: i32 },
    #[snafu(display("no ephemeris for {naif_id}: {reason}"))]
    NoEphemeris { naif_id: i32, reason: String },
    #[snafu(display("unknown aberration correction `{name}`"))]
    UnknownAberration { name: String },
}

impl EphemerisError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::UnknownFrame { .. } | Self::UnknownAberration { .. } => {
                ErrorKind::InvalidArgument
            }
            _ => ErrorKind::External,
        }
    }
}

/// Aberration corrections, using the SPICE naming.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Sequence)]
pub enum Aberration {
    /// Geometric state
    #[default]
    None,
    /// Light time
    LT,
    /// Light time and stellar aberration
    LTS,
    /// Converged Newtonian light time
    CN,
    /// Converged Newtonian light time and stellar aberration
    CNS,
    /// Transmission case, light time
    XLT,
    /// Transmission case, light time and stellar aberration
    XLTS,
    /// Transmission case, converged Newtonian light time
    XCN,
    /// Transmission case, converged Newtonian light time and stellar aberration
    XCNS,
}

impl fmt::Display for Aberration {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            Self::None => "NONE",
            Self::LT => "LT",
            Self::LTS => "LT+S",
            Self::CN => "CN",
            Self::CNS => "CN+S",
            Self::XLT => "XLT",
            Self::XLTS => "XLT+S",
            Self::XCN => "XCN",
            Self::XCNS => "XCN+S",
        };
        write!(f, "{name}")
    }
}

impl FromStr for Aberration {
    type Err = EphemerisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_uppercase();
        all::<Self>()
            .find(|ab| format!("{ab}") == name)
            .ok_or(EphemerisError::UnknownAberration {
                name: s.to_string(),
            })
    }
}

/// Physical constants of a body, as provided by the ephemeris service.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BodyConstants {
    pub naif_id: i32,
    pub name: String,
    /// Gravitational parameter, in m^3/s^2
    pub gm_m3_s2: f64,
    pub equatorial_radius_m: f64,
    pub polar_radius_m: f64,
    /// NAIF ID of the body this one orbits, `None` for the root of the system (the Sun)
    #[serde(default)]
    pub primary_id: Option<i32>,
}

impl ConfigRepr for BodyConstants {}

/// Reference frame and ephemeris provider, injected into every conversion and search needing it.
pub trait EphemerisService: Send + Sync {
    /// Returns the physical constants of the requested body.
    fn body_constants(&self, naif_id: i32) -> Result<BodyConstants, EphemerisError>;

    /// Returns the position (m) and velocity (m/s) of `target` as seen from `observer` at `epoch`,
    /// expressed in `frame`.
    fn state_of(
        &self,
        target: i32,
        epoch: Epoch,
        observer: i32,
        frame: Frame,
        aberration: Aberration,
    ) -> Result<Vector6<f64>, EphemerisError>;

    /// Returns the rotation and angular velocity from one frame to another at the provided epoch.
    fn frame_transform(
        &self,
        from: Frame,
        to: Frame,
        epoch: Epoch,
    ) -> Result<FrameTransform, EphemerisError>;
}
