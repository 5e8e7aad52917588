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

use super::{epoch_from_str, epoch_to_str};
use crate::cosmic::{
    AstroEphemerisSnafu, AstroError, CelestialBody, EphemerisService, Frame, OrbitalElements,
    OrbitalState, TimeTagged, Window,
};
use crate::linalg::Vector3;
use crate::md::LaunchWindow;
use crate::time::Epoch;
use serde_derive::{Deserialize, Serialize};
use snafu::ResultExt;
use std::fmt::Display;
use std::str::FromStr;
use std::sync::Arc;

/// Maximum number of windows in a single buffer
pub const MAX_WINDOWS: usize = 1000;

/// Fills a bounded buffer, returning the overflow message if some items were dropped.
fn bounded<T, I: IntoIterator<Item = T>>(items: I, what: &str) -> (Vec<T>, String) {
    let mut buffer = Vec::new();
    let mut dropped = 0_usize;
    for item in items {
        if buffer.len() < MAX_WINDOWS {
            buffer.push(item);
        } else {
            dropped += 1;
        }
    }
    if dropped > 0 {
        warn!("{dropped} {what} dropped beyond the capacity of {MAX_WINDOWS}");
        (
            buffer,
            format!("{} {what} exceed the capacity of {MAX_WINDOWS}", MAX_WINDOWS + dropped),
        )
    } else {
        (buffer, String::new())
    }
}

/// Time windows, at most [MAX_WINDOWS] of them.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct WindowsDto {
    pub windows: Vec<Window>,
    #[serde(default)]
    pub error: String,
}

impl WindowsDto {
    /// Keeps the first [MAX_WINDOWS] windows, and reports the overflow in the error.
    pub fn new<I: IntoIterator<Item = Window>>(windows: I) -> Self {
        let (windows, error) = bounded(windows, "windows");
        Self { windows, error }
    }

    pub fn from_error<E: Display>(error: E) -> Self {
        Self {
            windows: Vec::new(),
            error: error.to_string(),
        }
    }

    pub fn has_error(&self) -> bool {
        !self.error.is_empty()
    }
}

impl<E: Display> From<Result<Vec<Window>, E>> for WindowsDto {
    fn from(result: Result<Vec<Window>, E>) -> Self {
        match result {
            Ok(windows) => Self::new(windows),
            Err(e) => Self::from_error(e),
        }
    }
}

/// Launch windows, at most [MAX_WINDOWS] of them.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LaunchWindowsDto {
    pub windows: Vec<LaunchWindow>,
    #[serde(default)]
    pub error: String,
}

impl LaunchWindowsDto {
    pub fn new<I: IntoIterator<Item = LaunchWindow>>(windows: I) -> Self {
        let (windows, error) = bounded(windows, "launch windows");
        Self { windows, error }
    }

    pub fn from_error<E: Display>(error: E) -> Self {
        Self {
            windows: Vec::new(),
            error: error.to_string(),
        }
    }

    pub fn has_error(&self) -> bool {
        !self.error.is_empty()
    }
}

impl<E: Display> From<Result<Vec<LaunchWindow>, E>> for LaunchWindowsDto {
    fn from(result: Result<Vec<LaunchWindow>, E>) -> Self {
        match result {
            Ok(windows) => Self::new(windows),
            Err(e) => Self::from_error(e),
        }
    }
}

/// Cartesian state of a body or spacecraft, with the frame by name.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StateVectorDto {
    #[serde(serialize_with = "epoch_to_str", deserialize_with = "epoch_from_str")]
    pub epoch: Epoch,
    pub center_id: i32,
    pub frame: String,
    pub position_m: [f64; 3],
    pub velocity_m_s: [f64; 3],
    #[serde(default)]
    pub error: String,
}

impl StateVectorDto {
    pub fn from_error<E: Display>(epoch: Epoch, error: E) -> Self {
        Self {
            epoch,
            center_id: 0,
            frame: String::new(),
            position_m: [0.0; 3],
            velocity_m_s: [0.0; 3],
            error: error.to_string(),
        }
    }

    pub fn has_error(&self) -> bool {
        !self.error.is_empty()
    }

    /// Rebuilds the orbital state, loading its center from the service.
    pub fn to_orbital_state(
        &self,
        service: &dyn EphemerisService,
    ) -> Result<OrbitalState, AstroError> {
        if self.has_error() {
            return Err(AstroError::InvalidStateVector {
                reason: format!("state vector carries an error: {}", self.error),
            });
        }
        let frame = Frame::from_str(&self.frame).context(AstroEphemerisSnafu {
            action: "parsing the frame of a state vector",
        })?;
        let center = CelestialBody::from_service(service, self.center_id).context(
            AstroEphemerisSnafu {
                action: "loading the center of a state vector",
            },
        )?;
        OrbitalState::cartesian(
            Vector3::from(self.position_m),
            Vector3::from(self.velocity_m_s),
            Arc::new(center),
            self.epoch,
            frame,
        )
    }
}

impl From<&OrbitalState> for StateVectorDto {
    fn from(state: &OrbitalState) -> Self {
        let sv = state.to_state_vector();
        Self {
            epoch: state.epoch(),
            center_id: state.center().naif_id,
            frame: state.frame().to_string(),
            position_m: sv.radius_m().into(),
            velocity_m_s: sv.velocity_m_s().into(),
            error: String::new(),
        }
    }
}

/// Rotation between two frames as a quaternion (w, x, y, z), with the angular velocity.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FrameTransformationDto {
    #[serde(serialize_with = "epoch_to_str", deserialize_with = "epoch_from_str")]
    pub epoch: Epoch,
    pub from: String,
    pub to: String,
    pub rotation: [f64; 4],
    pub angular_velocity_rad_s: [f64; 3],
    #[serde(default)]
    pub error: String,
}

impl FrameTransformationDto {
    /// Queries the transformation from the service, filling the error field on failure.
    pub fn from_service(
        service: &dyn EphemerisService,
        from: Frame,
        to: Frame,
        epoch: Epoch,
    ) -> Self {
        let mut dto = Self {
            epoch,
            from: from.to_string(),
            to: to.to_string(),
            rotation: [1.0, 0.0, 0.0, 0.0],
            angular_velocity_rad_s: [0.0; 3],
            error: String::new(),
        };
        match service.frame_transform(from, to, epoch) {
            Ok(transform) => {
                let q = transform.quaternion();
                dto.rotation = [q.w, q.i, q.j, q.k];
                dto.angular_velocity_rad_s = transform.angular_velocity.into();
            }
            Err(e) => dto.error = e.to_string(),
        }
        dto
    }

    pub fn has_error(&self) -> bool {
        !self.error.is_empty()
    }
}

#[cfg(test)]
mod ut_dto {
    use super::*;
    use crate::cosmic::AnalyticEphemeris;
    use crate::time::Unit;
    use approx::assert_abs_diff_eq;

    fn day(d: u8) -> Epoch {
        Epoch::from_gregorian_utc_at_midnight(2021, 1, d)
    }

    #[test]
    fn windows_overflow() {
        let windows: Vec<Window> = (0..1200)
            .map(|i| Window::from_length(day(1) + Unit::Hour * f64::from(i), Unit::Minute * 1.0))
            .collect();
        let dto = WindowsDto::new(windows.clone());
        assert_eq!(dto.windows.len(), MAX_WINDOWS);
        assert!(dto.has_error());
        assert_eq!(dto.windows[..], windows[..MAX_WINDOWS]);

        let dto = WindowsDto::new(windows[..10].to_vec());
        assert_eq!(dto.windows.len(), 10);
        assert!(!dto.has_error());

        let dto: WindowsDto = Err::<Vec<Window>, _>("no ephemeris").into();
        assert!(dto.windows.is_empty());
        assert_eq!(dto.error, "no ephemeris");
    }

    #[test]
    fn state_vector() {
        let service = AnalyticEphemeris::default();
        let earth = Arc::new(CelestialBody::from_service(&service, 399).unwrap());
        let state = OrbitalState::keplerian(
            7_000e3, 0.01, 0.5, 0.3, 0.2, 1.0, earth, day(2), Frame::ICRF,
        )
        .unwrap();
        let dto = StateVectorDto::from(&state);
        assert_eq!(dto.frame, "ICRF");
        assert_eq!(dto.center_id, 399);
        assert!(!dto.has_error());

        let yaml = serde_yaml::to_string(&dto).unwrap();
        let back: StateVectorDto = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(back, dto);

        let rebuilt = back.to_orbital_state(&service).unwrap();
        assert_abs_diff_eq!(rebuilt.radius_m(), state.radius_m(), epsilon = 1e-6);
        assert_abs_diff_eq!(rebuilt.velocity_m_s(), state.velocity_m_s(), epsilon = 1e-9);

        let failed = StateVectorDto::from_error(day(2), "lookup failed");
        assert!(failed.to_orbital_state(&service).is_err());
    }

    #[test]
    fn frame_transformation() {
        let service = AnalyticEphemeris::default();
        let dto = FrameTransformationDto::from_service(&service, Frame::ICRF, Frame::ICRF, day(2));
        assert!(!dto.has_error());
        assert_eq!(dto.rotation, [1.0, 0.0, 0.0, 0.0]);

        let dto = FrameTransformationDto::from_service(
            &service,
            Frame::BodyFixed(399),
            Frame::ICRF,
            day(2),
        );
        assert!(!dto.has_error());
        assert_eq!(dto.from, "IAU_EARTH");
        let norm: f64 = dto.rotation.iter().map(|x| x * x).sum::<f64>().sqrt();
        assert_abs_diff_eq!(norm, 1.0, epsilon = 1e-12);

        let dto = FrameTransformationDto::from_service(
            &service,
            Frame::BodyFixed(-42),
            Frame::ICRF,
            day(2),
        );
        assert!(dto.has_error());
    }
}
