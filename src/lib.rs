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

/*! # nyx-mission

Mission design core: orbital states in several equivalent representations, two-body and SGP4
propagation, spacecraft maneuver chains, and launch window search from a surface site.

All computations which need body constants or frame orientations take an explicit
[`EphemerisService`](cosmic::EphemerisService). The crate ships an analytic implementation,
[`AnalyticEphemeris`](cosmic::AnalyticEphemeris), which needs no kernel files.
*/

/// Provides the orbital state representations, celestial bodies, frames, and the ephemeris service.
pub mod cosmic;

/// Utility functions shared by different modules, and which may be useful to engineers.
pub mod utils;

mod errors;
/// Functions which may fail return an error which can be classified with [`ErrorKind`].
pub use self::errors::{ErrorKind, MissionError};

/// Configuration loading and the fixed capacity buffers used to cross process boundaries.
pub mod io;

/// All of the mission design tools: maneuver chain and launch window search.
pub mod md;

#[macro_use]
extern crate log;
extern crate hifitime;
extern crate nalgebra as na;

/// Re-export of hifitime
pub mod time {
    pub use hifitime::*;
}

/// Re-export nalgebra
pub mod linalg {
    pub use na::base::*;
    pub use na::{Rotation3, UnitQuaternion};
}

/// Re-export some useful things
pub use self::cosmic::{
    CelestialBody, Frame, OrbitalElements, OrbitalState, Spacecraft, TimeTagged, Window,
};
pub use self::md::{Launch, LaunchWindow, Maneuver, ManeuverKind};
