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

use crate::cosmic::{AstroError, EphemerisError, PropulsionError, Window};
use crate::time::Epoch;
use crate::errors::ErrorKind;
use snafu::prelude::*;

mod maneuver;
pub use maneuver::*;

mod launch;
pub use launch::*;

#[derive(Debug, PartialEq, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum ManeuverError {
    #[snafu(display("{maneuver} cannot be executed within {window}"))]
    NoFeasibleEpoch { maneuver: String, window: Window },
    #[snafu(display("maneuver is geometrically infeasible: {reason}"))]
    Infeasible { reason: String },
    #[snafu(display("no engine can provide the {required_kg:.3} kg of fuel needed for {delta_v_m_s:.3} m/s"))]
    NoEngine { required_kg: f64, delta_v_m_s: f64 },
    #[snafu(display("engine {serial_number} is not on the spacecraft"))]
    UnknownEngine { serial_number: String },
    #[snafu(display("instrument {naif_id} is not on the spacecraft"))]
    UnknownInstrument { naif_id: i32 },
    #[snafu(display("no maneuver left in the chain"))]
    ChainExhausted,
    #[snafu(display("maneuver is {status} but must be {expected}"))]
    UnexpectedStatus {
        status: ManeuverStatus,
        expected: ManeuverStatus,
    },
    #[snafu(display("invalid maneuver: {reason}"))]
    InvalidManeuver { reason: String },
    #[snafu(display("propulsion error during {action}: {source}"))]
    ManeuverPropulsion {
        action: &'static str,
        source: PropulsionError,
    },
    #[snafu(display("astrodynamics error during {action}: {source}"))]
    ManeuverAstro {
        action: &'static str,
        source: AstroError,
    },
}

impl ManeuverError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NoFeasibleEpoch { .. } | Self::Infeasible { .. } => {
                ErrorKind::GeometricInfeasible
            }
            Self::NoEngine { .. } => ErrorKind::InsufficientResource,
            Self::UnknownEngine { .. }
            | Self::UnknownInstrument { .. }
            | Self::ChainExhausted
            | Self::UnexpectedStatus { .. } => ErrorKind::PreconditionFailed,
            Self::InvalidManeuver { .. } => ErrorKind::InvalidArgument,
            Self::ManeuverPropulsion { source, .. } => source.kind(),
            Self::ManeuverAstro { source, .. } => source.kind(),
        }
    }
}

#[derive(Debug, PartialEq, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum LaunchError {
    #[snafu(display("invalid launch: {reason}"))]
    InvalidLaunch { reason: String },
    #[snafu(display("no plane crossing between {start} and {end}"))]
    CrossingNotFound { start: Epoch, end: Epoch },
    #[snafu(display("astrodynamics error during {action}: {source}"))]
    LaunchAstro {
        action: &'static str,
        source: AstroError,
    },
    #[snafu(display("ephemeris error during {action}: {source}"))]
    LaunchEphemeris {
        action: &'static str,
        source: EphemerisError,
    },
}

impl LaunchError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidLaunch { .. } => ErrorKind::InvalidArgument,
            Self::CrossingNotFound { .. } => ErrorKind::GeometricInfeasible,
            Self::LaunchAstro { source, .. } => source.kind(),
            Self::LaunchEphemeris { source, .. } => source.kind(),
        }
    }
}
