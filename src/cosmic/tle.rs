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
    mean_to_true_anomaly, AstroError, CelestialBody, Frame, OrbitalElements, StateVector,
    TimeTagged,
};
use crate::linalg::Vector3;
use crate::time::{Epoch, Unit};
use satkit::sgp4::sgp4;
use std::f64::consts::TAU;
use std::fmt;
use std::ops::Range;
use std::sync::Arc;

/// Minutes per day, used to convert the TLE rates
const MIN_PER_DAY: f64 = 1440.0;

/// Mean elements of a TLE, angles in radians
#[derive(Copy, Clone, Debug, PartialEq)]
struct MeanElements {
    /// Mean motion, revolutions per day
    no_rev_day: f64,
    ecc: f64,
    inc_rad: f64,
    raan_rad: f64,
    aop_rad: f64,
    ma_rad: f64,
}

/// A two-line element set, propagated with SGP4 (WGS72).
///
/// The state at the TLE epoch is computed when parsing, and the SGP4 output is used as-is in [Frame::ICRF].
#[derive(Clone)]
pub struct Tle {
    pub(crate) name: String,
    pub(crate) line1: String,
    pub(crate) line2: String,
    satellite_number: u32,
    /// First derivative of the mean motion divided by two, in rad/min^2
    ballistic_coefficient: f64,
    /// B*, per earth radii
    drag_term: f64,
    /// Second derivative of the mean motion divided by six, in rad/min^3
    second_derivative_mean_motion: f64,
    elements: MeanElements,
    sgp4_tle: satkit::TLE,
    state: StateVector,
}

impl fmt::Debug for Tle {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Tle")
            .field("name", &self.name)
            .field("satellite_number", &self.satellite_number)
            .field("elements", &self.elements)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

/// SGP4 position and velocity (m, m/s) at the provided seconds past the epoch of the TLE.
fn sgp4_state(tle: &satkit::TLE, seconds: f64) -> Result<(Vector3<f64>, Vector3<f64>), String> {
    let mut tle = tle.clone();
    let instant = tle.epoch + satkit::Duration::from_seconds(seconds);
    match sgp4(&mut tle, &[instant]) {
        Ok(result) => {
            let pos = result.pos.column(0);
            let vel = result.vel.column(0);
            let radius_m = Vector3::new(pos[0], pos[1], pos[2]);
            let velocity_m_s = Vector3::new(vel[0], vel[1], vel[2]);
            if radius_m.iter().chain(velocity_m_s.iter()).all(|x| x.is_finite()) {
                Ok((radius_m, velocity_m_s))
            } else {
                Err("SGP4 diverged".to_string())
            }
        }
        Err(e) => Err(format!("{e:?}")),
    }
}

fn tle_error(line: u8, reason: impl Into<String>) -> AstroError {
    AstroError::TleParsing {
        line,
        reason: reason.into(),
    }
}

fn field<'a>(line: &'a str, line_no: u8, range: Range<usize>, name: &str) -> Result<&'a str, AstroError> {
    line.get(range)
        .map(str::trim)
        .ok_or_else(|| tle_error(line_no, format!("missing {name}")))
}

fn float_field(line: &str, line_no: u8, range: Range<usize>, name: &str) -> Result<f64, AstroError> {
    let value = field(line, line_no, range, name)?;
    value
        .parse::<f64>()
        .map_err(|e| tle_error(line_no, format!("{name} `{value}`: {e}")))
}

/// Parses the TLE notation with an implied leading decimal point and exponent, e.g. ` 10270-3` is `0.10270e-3`.
fn exp_field(line: &str, line_no: u8, range: Range<usize>, name: &str) -> Result<f64, AstroError> {
    let value = field(line, line_no, range, name)?;
    if value.is_empty() {
        return Ok(0.0);
    }
    let (sign, rest) = match value.strip_prefix('-') {
        Some(rest) => (-1.0, rest),
        None => (1.0, value.strip_prefix('+').unwrap_or(value)),
    };
    let (mantissa, exponent) = match rest.rfind(['+', '-']) {
        Some(pos) if pos > 0 => rest.split_at(pos),
        _ => (rest, "0"),
    };
    let mantissa = format!("0.{}", mantissa.trim())
        .parse::<f64>()
        .map_err(|e| tle_error(line_no, format!("{name} `{value}`: {e}")))?;
    let exponent = exponent
        .parse::<i32>()
        .map_err(|e| tle_error(line_no, format!("{name} `{value}`: {e}")))?;
    Ok(sign * mantissa * 10_f64.powi(exponent))
}

/// Modulo 10 sum of the digits, minus signs counting as one.
fn checksum(line: &str) -> u32 {
    line.bytes()
        .take(68)
        .map(|b| match b {
            b'0'..=b'9' => u32::from(b - b'0'),
            b'-' => 1,
            _ => 0,
        })
        .sum::<u32>()
        % 10
}

fn check_line(line: &str, line_no: u8) -> Result<(), AstroError> {
    if line.trim().is_empty() {
        return Err(tle_error(line_no, "line is empty"));
    }
    if !line.is_ascii() || line.len() < 69 {
        return Err(tle_error(
            line_no,
            format!("expected 69 ASCII characters, got {}", line.len()),
        ));
    }
    if !line.starts_with(&format!("{line_no} ")) {
        return Err(tle_error(line_no, format!("line must start with `{line_no} `")));
    }
    let expected = field(line, line_no, 68..69, "checksum")?
        .parse::<u32>()
        .map_err(|e| tle_error(line_no, format!("checksum: {e}")))?;
    let computed = checksum(line);
    if expected != computed {
        return Err(tle_error(
            line_no,
            format!("checksum is {expected} but computed {computed}"),
        ));
    }
    Ok(())
}

impl Tle {
    /// Parses the TLE and computes the state at its epoch.
    pub fn parse(
        name: &str,
        line1: &str,
        line2: &str,
        center: Arc<CelestialBody>,
    ) -> Result<Self, AstroError> {
        if name.trim().is_empty() {
            return Err(tle_error(0, "name is empty"));
        }
        let line1 = line1.trim_end();
        let line2 = line2.trim_end();
        check_line(line1, 1)?;
        check_line(line2, 2)?;

        let sat1 = field(line1, 1, 2..7, "satellite number")?;
        let sat2 = field(line2, 2, 2..7, "satellite number")?;
        if sat1 != sat2 {
            return Err(tle_error(
                2,
                format!("satellite number {sat2} does not match {sat1} of line 1"),
            ));
        }
        let satellite_number = sat1
            .parse::<u32>()
            .map_err(|e| tle_error(1, format!("satellite number `{sat1}`: {e}")))?;

        // Epoch: two digit year and fractional day of year, UTC
        let year2 = float_field(line1, 1, 18..20, "epoch year")? as i32;
        let year = if year2 < 57 { 2000 + year2 } else { 1900 + year2 };
        let day_of_year = float_field(line1, 1, 20..32, "epoch day")?;
        if !(1.0..367.0).contains(&day_of_year) {
            return Err(tle_error(1, format!("invalid epoch day {day_of_year}")));
        }
        let epoch = Epoch::from_gregorian_utc_at_midnight(year, 1, 1) + (day_of_year - 1.0) * Unit::Day;

        let ndot_2 = float_field(line1, 1, 33..43, "first derivative of mean motion")?;
        let nddot_6 = exp_field(line1, 1, 44..52, "second derivative of mean motion")?;
        let bstar = exp_field(line1, 1, 53..61, "drag term")?;

        let inc_deg = float_field(line2, 2, 8..16, "inclination")?;
        let raan_deg = float_field(line2, 2, 17..25, "right ascension of the ascending node")?;
        let ecc_digits = field(line2, 2, 26..33, "eccentricity")?;
        let ecc = format!("0.{ecc_digits}")
            .parse::<f64>()
            .map_err(|e| tle_error(2, format!("eccentricity `{ecc_digits}`: {e}")))?;
        let aop_deg = float_field(line2, 2, 34..42, "argument of perigee")?;
        let ma_deg = float_field(line2, 2, 43..51, "mean anomaly")?;
        let no_rev_day = float_field(line2, 2, 52..63, "mean motion")?;

        if no_rev_day <= 0.0 {
            return Err(tle_error(2, format!("mean motion must be positive, got {no_rev_day}")));
        }
        let elements = MeanElements {
            no_rev_day,
            ecc,
            inc_rad: inc_deg.to_radians(),
            raan_rad: raan_deg.to_radians(),
            aop_rad: aop_deg.to_radians(),
            ma_rad: ma_deg.to_radians(),
        };

        let sgp4_tle = satkit::TLE::load_2line(line1, line2)
            .map_err(|e| tle_error(1, format!("{e}")))?;
        let (radius_m, velocity_m_s) = sgp4_state(&sgp4_tle, 0.0)
            .map_err(|reason| AstroError::Sgp4Propagation { epoch, reason })?;
        let state = StateVector::try_new(radius_m, velocity_m_s, center, epoch, Frame::ICRF)?;

        debug!("parsed TLE of {name} ({satellite_number}) at {epoch}");

        Ok(Self {
            name: name.trim().to_string(),
            line1: line1.to_string(),
            line2: line2.to_string(),
            satellite_number,
            ballistic_coefficient: ndot_2 * TAU / MIN_PER_DAY.powi(2),
            drag_term: bstar,
            second_derivative_mean_motion: nddot_6 * TAU / MIN_PER_DAY.powi(3),
            elements,
            sgp4_tle,
            state,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn lines(&self) -> (&str, &str) {
        (&self.line1, &self.line2)
    }

    pub fn satellite_number(&self) -> u32 {
        self.satellite_number
    }

    /// First derivative of the mean motion divided by two, in rad/min^2
    pub fn ballistic_coefficient(&self) -> f64 {
        self.ballistic_coefficient
    }

    /// B* drag term
    pub fn drag_term(&self) -> f64 {
        self.drag_term
    }

    /// Second derivative of the mean motion divided by six, in rad/min^3
    pub fn second_derivative_mean_motion(&self) -> f64 {
        self.second_derivative_mean_motion
    }

    /// Mean motion of the TLE, in revolutions per day
    pub fn mean_motion_rev_day(&self) -> f64 {
        self.elements.no_rev_day
    }

    /// State vector at the TLE epoch
    pub fn state(&self) -> &StateVector {
        &self.state
    }

    /// Propagates the TLE with SGP4 to the provided epoch.
    pub fn propagate(&self, epoch: Epoch) -> Result<StateVector, AstroError> {
        let seconds = (epoch - self.state.epoch).to_seconds();
        let (radius_m, velocity_m_s) = sgp4_state(&self.sgp4_tle, seconds)
            .map_err(|reason| AstroError::Sgp4Propagation { epoch, reason })?;
        StateVector::try_new(
            radius_m,
            velocity_m_s,
            self.state.center.clone(),
            epoch,
            self.state.frame,
        )
    }
}

impl TimeTagged for Tle {
    fn epoch(&self) -> Epoch {
        self.state.epoch
    }
}

impl OrbitalElements for Tle {
    fn center(&self) -> &Arc<CelestialBody> {
        &self.state.center
    }

    fn frame(&self) -> Frame {
        self.state.frame
    }

    fn ecc(&self) -> f64 {
        self.elements.ecc
    }

    fn inc_rad(&self) -> f64 {
        self.elements.inc_rad
    }

    /// Osculating semi-major axis of the state at the TLE epoch
    fn sma_m(&self) -> f64 {
        self.state.sma_m()
    }

    fn raan_rad(&self) -> f64 {
        self.elements.raan_rad
    }

    fn aop_rad(&self) -> f64 {
        self.elements.aop_rad
    }

    fn ta_rad(&self) -> f64 {
        mean_to_true_anomaly(self.elements.ma_rad, self.elements.ecc)
    }

    fn ma_rad(&self) -> f64 {
        self.elements.ma_rad
    }
}
