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

use crate::cosmic::{AstroError, EphemerisError, PropulsionError};
use crate::io::ConfigError;
use crate::md::{LaunchError, ManeuverError};
use snafu::prelude::*;

/// Classification of every error of this crate.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed input, always detected at construction.
    InvalidArgument,
    /// The operation is not allowed in the current state, e.g. an engine drawing from an unregistered fuel tank.
    PreconditionFailed,
    /// Not enough of a consumable, e.g. fuel.
    InsufficientResource,
    /// The geometry does not allow a solution, e.g. no maneuver epoch within the hold duration.
    GeometricInfeasible,
    /// Failure of an external collaborator (ephemeris service, file system).
    External,
}

/// Top level error, any error of the crate converts into it.
#[derive(Debug, PartialEq, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum MissionError {
    #[snafu(display("{source}"))]
    Astro { source: AstroError },
    #[snafu(display("{source}"))]
    Ephemeris { source: EphemerisError },
    #[snafu(display("{source}"))]
    Propulsion { source: PropulsionError },
    #[snafu(display("{source}"))]
    Maneuvering { source: ManeuverError },
    #[snafu(display("{source}"))]
    Launching { source: LaunchError },
    #[snafu(display("{source}"))]
    Configuration { source: ConfigError },
}

impl MissionError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Astro { source } => source.kind(),
            Self::Ephemeris { source } => source.kind(),
            Self::Propulsion { source } => source.kind(),
            Self::Maneuvering { source } => source.kind(),
            Self::Launching { source } => source.kind(),
            Self::Configuration { source } => source.kind(),
        }
    }
}

impl From<AstroError> for MissionError {
    fn from(source: AstroError) -> Self {
        Self::Astro { source }
    }
}

impl From<EphemerisError> for MissionError {
    fn from(source: EphemerisError) -> Self {
        Self::Ephemeris { source }
    }
}

impl From<PropulsionError> for MissionError {
    fn from(source: PropulsionError) -> Self {
        Self::Propulsion { source }
    }
}

impl From<ManeuverError> for MissionError {
    fn from(source: ManeuverError) -> Self {
        Self::Maneuvering { source }
    }
}

impl From<LaunchError> for MissionError {
    fn from(source: LaunchError) -> Self {
        Self::Launching { source }
    }
}

impl From<ConfigError> for MissionError {
    fn from(source: ConfigError) -> Self {
        Self::Configuration { source }
    }
}
