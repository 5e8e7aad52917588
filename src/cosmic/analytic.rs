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
    mean_to_true_anomaly, perifocal_to_inertial, Aberration, BodyConstants, EphemerisError,
    EphemerisService, Frame, FrameTransform, IauPole, Orientation, ParentRotation, AU,
    OBLIQUITY_J2000_RAD,
};
use crate::io::{ConfigError, ConfigRepr};
use crate::linalg::{Vector3, Vector6};
use crate::time::Epoch;
use crate::utils::r1;
use serde_derive::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Longest chain of primaries walked before giving up (catches cyclic definitions).
const MAX_CHAIN_DEPTH: usize = 16;

const J2000_JDE: f64 = 2_451_545.0;

fn j2000_jde() -> f64 {
    J2000_JDE
}

/// Linear rates of the mean elements, per Julian century.
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MeanElementRates {
    pub sma_m: f64,
    pub ecc: f64,
    pub inc_deg: f64,
    pub mean_longitude_deg: f64,
    pub long_peri_deg: f64,
    pub long_node_deg: f64,
}

/// Mean orbital elements about the primary, in the mean ecliptic and equinox of J2000, with linear
/// rates (e.g. the approximate planetary positions of Standish).
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MeanElements {
    pub sma_m: f64,
    pub ecc: f64,
    pub inc_deg: f64,
    pub mean_longitude_deg: f64,
    /// Longitude of periapsis
    pub long_peri_deg: f64,
    /// Longitude of the ascending node
    pub long_node_deg: f64,
    #[serde(default)]
    pub rates: MeanElementRates,
    /// Reference epoch of the elements, as a TDB Julian date
    #[serde(default = "j2000_jde")]
    pub epoch_jde: f64,
}

impl MeanElements {
    /// Position and velocity about the primary in the J2000 ecliptic, `gm` is the sum of the
    /// gravitational parameters of the body and its primary.
    pub fn state_at(&self, epoch: Epoch, gm: f64) -> (Vector3<f64>, Vector3<f64>) {
        let t = (epoch.to_jde_tdb_days() - self.epoch_jde) / 36_525.0;
        let sma_m = self.sma_m + self.rates.sma_m * t;
        let ecc = self.ecc + self.rates.ecc * t;
        let inc = (self.inc_deg + self.rates.inc_deg * t).to_radians();
        let mean_longitude = (self.mean_longitude_deg + self.rates.mean_longitude_deg * t).to_radians();
        let long_peri = (self.long_peri_deg + self.rates.long_peri_deg * t).to_radians();
        let long_node = (self.long_node_deg + self.rates.long_node_deg * t).to_radians();

        let ta = mean_to_true_anomaly(mean_longitude - long_peri, ecc);
        perifocal_to_inertial(gm, sma_m, ecc, inc, long_node, long_peri - long_node, ta)
    }
}

/// Definition of a body of the analytic ephemeris.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnalyticBody {
    #[serde(flatten)]
    pub constants: BodyConstants,
    /// Orbit about the primary, required for every body which has a primary
    #[serde(default)]
    pub mean_elements: Option<MeanElements>,
    /// Orientation of the body fixed frame
    #[serde(default)]
    pub orientation: Option<Orientation>,
}

impl ConfigRepr for AnalyticBody {}

/// Ephemeris service built from analytic models, usable without any kernel file.
///
/// Bodies move on mean elements about their primary (two-body velocities with the sum of both
/// gravitational parameters), the Sun being the root. Body fixed frames follow the IAU pole and
/// prime meridian models (IAU_EARTH for the Earth). Aberration corrections are ignored: all states
/// are geometric.
#[derive(Clone, Debug)]
pub struct AnalyticEphemeris {
    bodies: BTreeMap<i32, AnalyticBody>,
}

impl AnalyticEphemeris {
    /// An ephemeris without any body.
    pub fn empty() -> Self {
        Self {
            bodies: BTreeMap::new(),
        }
    }

    pub fn from_bodies(bodies: Vec<AnalyticBody>) -> Self {
        let mut me = Self::empty();
        for body in bodies {
            me.insert(body);
        }
        me
    }

    /// Loads the body definitions from a YAML sequence.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        Ok(Self::from_bodies(AnalyticBody::load_many(path)?))
    }

    /// Adds or replaces a body, returning the replaced definition.
    pub fn insert(&mut self, body: AnalyticBody) -> Option<AnalyticBody> {
        debug!(
            "analytic ephemeris: defining {} ({})",
            body.constants.name, body.constants.naif_id
        );
        self.bodies.insert(body.constants.naif_id, body)
    }

    pub fn body(&self, naif_id: i32) -> Result<&AnalyticBody, EphemerisError> {
        self.bodies
            .get(&naif_id)
            .ok_or(EphemerisError::UnknownBody { naif_id })
    }

    /// NAIF IDs of all the defined bodies
    pub fn naif_ids(&self) -> Vec<i32> {
        self.bodies.keys().copied().collect()
    }

    /// State of the body about its primary, in ICRF.
    fn state_about_primary(
        &self,
        body: &AnalyticBody,
        primary_id: i32,
        epoch: Epoch,
    ) -> Result<Vector6<f64>, EphemerisError> {
        let primary = self.body(primary_id)?;
        let elements = body
            .mean_elements
            .as_ref()
            .ok_or_else(|| EphemerisError::NoEphemeris {
                naif_id: body.constants.naif_id,
                reason: format!("no mean elements about {primary_id}"),
            })?;
        let gm = primary.constants.gm_m3_s2 + body.constants.gm_m3_s2;
        let (r_ecl, v_ecl) = elements.state_at(epoch, gm);
        let to_icrf = r1(-OBLIQUITY_J2000_RAD);
        let (r, v) = (to_icrf * r_ecl, to_icrf * v_ecl);
        Ok(Vector6::new(r.x, r.y, r.z, v.x, v.y, v.z))
    }

    /// Returns the sequence of (ancestor, state of the body about that ancestor), starting with the
    /// body itself.
    fn ancestry(&self, naif_id: i32, epoch: Epoch) -> Result<Vec<(i32, Vector6<f64>)>, EphemerisError> {
        let mut chain = vec![(naif_id, Vector6::zeros())];
        let mut current = self.body(naif_id)?;
        let mut state = Vector6::zeros();
        while let Some(primary_id) = current.constants.primary_id {
            if chain.len() > MAX_CHAIN_DEPTH {
                return Err(EphemerisError::NoEphemeris {
                    naif_id,
                    reason: format!("chain of primaries deeper than {MAX_CHAIN_DEPTH}"),
                });
            }
            state += self.state_about_primary(current, primary_id, epoch)?;
            chain.push((primary_id, state));
            current = self.body(primary_id)?;
        }
        Ok(chain)
    }

    /// Transformation from ICRF to the provided frame.
    fn from_icrf(&self, frame: Frame, epoch: Epoch) -> Result<FrameTransform, EphemerisError> {
        match frame {
            Frame::ICRF => Ok(FrameTransform::identity()),
            Frame::EclipJ2000 => Ok(FrameTransform::fixed(r1(OBLIQUITY_J2000_RAD))),
            Frame::BodyFixed(naif_id) => {
                let orientation = self
                    .body(naif_id)?
                    .orientation
                    .as_ref()
                    .ok_or(EphemerisError::NoOrientation { naif_id })?;
                Ok(orientation.from_parent(epoch))
            }
        }
    }
}

impl EphemerisService for AnalyticEphemeris {
    fn body_constants(&self, naif_id: i32) -> Result<BodyConstants, EphemerisError> {
        Ok(self.body(naif_id)?.constants.clone())
    }

    fn state_of(
        &self,
        target: i32,
        epoch: Epoch,
        observer: i32,
        frame: Frame,
        aberration: Aberration,
    ) -> Result<Vector6<f64>, EphemerisError> {
        if aberration != Aberration::None {
            debug!("analytic ephemeris ignores the {aberration} aberration correction");
        }
        let target_chain = self.ancestry(target, epoch)?;
        let observer_chain = self.ancestry(observer, epoch)?;

        // First common ancestor
        let (target_state, observer_state) = target_chain
            .iter()
            .find_map(|(ancestor, target_state)| {
                observer_chain
                    .iter()
                    .find(|(id, _)| id == ancestor)
                    .map(|(_, observer_state)| (target_state, observer_state))
            })
            .ok_or_else(|| EphemerisError::NoEphemeris {
                naif_id: target,
                reason: format!("no common primary with {observer}"),
            })?;

        let state = target_state - observer_state;
        if frame == Frame::ICRF {
            return Ok(state);
        }

        let tf = self.from_icrf(frame, epoch)?;
        let (r, v) = tf.apply(
            &state.fixed_rows::<3>(0).into_owned(),
            &state.fixed_rows::<3>(3).into_owned(),
        );
        Ok(Vector6::new(r.x, r.y, r.z, v.x, v.y, v.z))
    }

    fn frame_transform(
        &self,
        from: Frame,
        to: Frame,
        epoch: Epoch,
    ) -> Result<FrameTransform, EphemerisError> {
        if from == to {
            return Ok(FrameTransform::identity());
        }
        Ok(self
            .from_icrf(from, epoch)?
            .inverse()
            .then(&self.from_icrf(to, epoch)?))
    }
}

fn iau(pole_ra_deg: f64, pole_dec_deg: f64, w0_deg: f64, w_dot_deg_day: f64) -> Option<Orientation> {
    Some(Orientation::Iau(IauPole::fixed(
        pole_ra_deg,
        pole_dec_deg,
        w0_deg,
        w_dot_deg_day,
    )))
}

#[allow(clippy::too_many_arguments)]
fn planet(
    naif_id: i32,
    name: &str,
    gm_m3_s2: f64,
    equatorial_radius_m: f64,
    polar_radius_m: f64,
    elements: [f64; 6],
    rates: [f64; 6],
    orientation: Option<Orientation>,
) -> AnalyticBody {
    AnalyticBody {
        constants: BodyConstants {
            naif_id,
            name: name.to_string(),
            gm_m3_s2,
            equatorial_radius_m,
            polar_radius_m,
            primary_id: Some(10),
        },
        mean_elements: Some(MeanElements {
            sma_m: elements[0] * AU,
            ecc: elements[1],
            inc_deg: elements[2],
            mean_longitude_deg: elements[3],
            long_peri_deg: elements[4],
            long_node_deg: elements[5],
            rates: MeanElementRates {
                sma_m: rates[0] * AU,
                ecc: rates[1],
                inc_deg: rates[2],
                mean_longitude_deg: rates[3],
                long_peri_deg: rates[4],
                long_node_deg: rates[5],
            },
            epoch_jde: J2000_JDE,
        }),
        orientation,
    }
}

impl Default for AnalyticEphemeris {
    /// Sun, Mercury, Venus, Earth, Moon, Mars and Jupiter.
    ///
    /// Planets use the mean elements valid from 1800 to 2050 of Standish (JPL), and the Earth moves
    /// on the elements of the Earth-Moon barycenter. The Moon uses mean geocentric elements.
    fn default() -> Self {
        let sun = AnalyticBody {
            constants: BodyConstants {
                naif_id: 10,
                name: "Sun".to_string(),
                gm_m3_s2: 1.327_124_400_412_794_2e20,
                equatorial_radius_m: 695_700_000.0,
                polar_radius_m: 695_700_000.0,
                primary_id: None,
            },
            mean_elements: None,
            orientation: iau(286.13, 63.87, 84.176, 14.184_4),
        };

        let moon = AnalyticBody {
            constants: BodyConstants {
                naif_id: 301,
                name: "Moon".to_string(),
                gm_m3_s2: 4.902_800_118e12,
                equatorial_radius_m: 1_737_400.0,
                polar_radius_m: 1_737_400.0,
                primary_id: Some(399),
            },
            mean_elements: Some(MeanElements {
                sma_m: 384_400e3,
                ecc: 0.0549,
                inc_deg: 5.1454,
                mean_longitude_deg: 198.5516,
                long_peri_deg: 83.1862,
                long_node_deg: 125.1228,
                rates: MeanElementRates {
                    mean_longitude_deg: 481_267.880_8,
                    long_peri_deg: 4_069.013_4,
                    long_node_deg: -1_934.137_9,
                    ..Default::default()
                },
                epoch_jde: 2_451_543.5,
            }),
            orientation: iau(269.9949, 66.5392, 38.3213, 13.176_358_15),
        };

        Self::from_bodies(vec![
            sun,
            planet(
                199,
                "Mercury",
                2.203_186_855_1e13,
                2_440_530.0,
                2_438_260.0,
                [0.387_099_27, 0.205_635_93, 7.004_979_02, 252.250_323_5, 77.457_796_28, 48.330_765_93],
                [0.000_000_37, 0.000_019_06, -0.005_947_49, 149_472.674_111_75, 0.160_476_89, -0.125_340_81],
                iau(281.0103, 61.4155, 329.5988, 6.138_510_8),
            ),
            planet(
                299,
                "Venus",
                3.248_585_92e14,
                6_051_800.0,
                6_051_800.0,
                [0.723_335_66, 0.006_776_72, 3.394_676_05, 181.979_099_5, 131.602_467_18, 76.679_842_55],
                [0.000_003_9, -0.000_041_07, -0.000_788_9, 58_517.815_387_29, 0.002_683_29, -0.277_694_18],
                iau(272.76, 67.16, 160.20, -1.481_368_8),
            ),
            planet(
                399,
                "Earth",
                3.986_004_354_360_959e14,
                6_378_136.6,
                6_356_751.9,
                [1.000_002_61, 0.016_711_23, -0.000_015_31, 100.464_571_66, 102.937_681_93, 0.0],
                [0.000_005_62, -0.000_043_92, -0.012_946_68, 35_999.372_449_81, 0.323_273_64, 0.0],
                Some(Orientation::Iau(IauPole::EARTH)),
            ),
            moon,
            planet(
                499,
                "Mars",
                4.282_837_362_069_909e13,
                3_396_190.0,
                3_376_200.0,
                [1.523_710_34, 0.093_394_1, 1.849_691_42, -4.553_432_05, -23.943_629_59, 49.559_538_91],
                [0.000_018_47, 0.000_078_82, -0.008_131_31, 19_140.302_684_99, 0.444_410_88, -0.292_573_43],
                iau(317.269_202, 54.432_516, 176.049_863, 350.891_982_443_297),
            ),
            planet(
                599,
                "Jupiter",
                1.267_127_641e17,
                71_492_000.0,
                66_854_000.0,
                [5.202_887, 0.048_386_24, 1.304_396_95, 34.396_440_51, 14.728_479_83, 100.473_909_09],
                [-0.000_116_07, -0.000_132_53, -0.001_837_14, 3_034.746_127_75, 0.212_526_68, 0.204_691_06],
                iau(268.056_595, 64.495_303, 284.95, 870.536),
            ),
        ])
    }
}

#[cfg(test)]
mod ut_analytic {
    use super::*;
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    #[test]
    fn earth_at_perihelion() {
        let eph = AnalyticEphemeris::default();
        let epoch = Epoch::from_gregorian_utc_at_midnight(2021, 1, 2);
        let state = eph
            .state_of(399, epoch, 10, Frame::EclipJ2000, Aberration::None)
            .unwrap();
        let r = state.fixed_rows::<3>(0).norm();
        let v = state.fixed_rows::<3>(3).norm();
        assert_relative_eq!(r / AU, 0.983_307_18, max_relative = 1e-6);
        assert_relative_eq!(v, 30_286.203, max_relative = 1e-5);
        // Nearly in the ecliptic plane
        assert!(state[2].abs() / r < 1e-5);

        // Reversing the observer flips the state
        let rev = eph
            .state_of(10, epoch, 399, Frame::EclipJ2000, Aberration::LTS)
            .unwrap();
        assert_abs_diff_eq!(rev, -state, epsilon = 1e-3);
    }

    #[test]
    fn moon_about_earth() {
        let eph = AnalyticEphemeris::default();
        let epoch = Epoch::from_gregorian_utc_at_midnight(2021, 1, 2);
        let state = eph
            .state_of(301, epoch, 399, Frame::ICRF, Aberration::None)
            .unwrap();
        assert_relative_eq!(state.fixed_rows::<3>(0).norm(), 380_750e3, max_relative = 1e-3);
        // Moon about the Sun goes through the Earth
        let helio = eph.state_of(301, epoch, 10, Frame::ICRF, Aberration::None).unwrap();
        let earth = eph.state_of(399, epoch, 10, Frame::ICRF, Aberration::None).unwrap();
        assert_abs_diff_eq!(helio - earth, state, epsilon = 1e-3);
        // And the Moon about Mars too
        let mars = eph.state_of(499, epoch, 10, Frame::ICRF, Aberration::None).unwrap();
        let moon_mars = eph.state_of(301, epoch, 499, Frame::ICRF, Aberration::None).unwrap();
        assert_abs_diff_eq!(helio - mars, moon_mars, epsilon = 1e-2);
    }

    #[test]
    fn body_fixed_frames() {
        let eph = AnalyticEphemeris::default();
        let epoch = Epoch::from_gregorian_utc_at_midnight(2021, 6, 2);
        let tf = eph
            .frame_transform(Frame::ICRF, Frame::BodyFixed(399), epoch)
            .unwrap();
        let back = eph
            .frame_transform(Frame::BodyFixed(399), Frame::ICRF, epoch)
            .unwrap();
        let chained = tf.then(&back);
        assert_abs_diff_eq!(chained.rotation, crate::linalg::Matrix3::identity(), epsilon = 1e-12);
        assert_abs_diff_eq!(chained.angular_velocity, Vector3::zeros(), epsilon = 1e-15);

        // A point fixed on the Earth surface has no velocity in the Earth fixed frame
        let r_fixed = Vector3::new(6378e3, 0.0, 0.0);
        let (r_icrf, v_icrf) = back.apply(&r_fixed, &Vector3::zeros());
        let (r_again, v_again) = tf.apply(&r_icrf, &v_icrf);
        assert_abs_diff_eq!(r_again, r_fixed, epsilon = 1e-6);
        assert_abs_diff_eq!(v_again, Vector3::zeros(), epsilon = 1e-9);
        assert_relative_eq!(v_icrf.norm(), 6378e3 * 7.292_115e-5, max_relative = 1e-6);

        assert_eq!(
            eph.frame_transform(Frame::ICRF, Frame::BodyFixed(-10), epoch),
            Err(EphemerisError::UnknownBody { naif_id: -10 })
        );
    }

    #[test]
    fn unknown_and_incomplete_bodies() {
        let mut eph = AnalyticEphemeris::empty();
        let epoch = Epoch::from_gregorian_utc_at_midnight(2021, 6, 2);
        assert!(eph.state_of(399, epoch, 10, Frame::ICRF, Aberration::None).is_err());

        let mut sun = AnalyticEphemeris::default().body(10).unwrap().clone();
        sun.orientation = None;
        eph.insert(sun);
        eph.insert(AnalyticBody {
            constants: BodyConstants {
                naif_id: -1,
                name: "orphan".to_string(),
                gm_m3_s2: 1.0,
                equatorial_radius_m: 1.0,
                polar_radius_m: 1.0,
                primary_id: Some(10),
            },
            mean_elements: None,
            orientation: None,
        });
        assert_eq!(eph.naif_ids(), vec![-1, 10]);
        assert!(matches!(
            eph.state_of(-1, epoch, 10, Frame::ICRF, Aberration::None),
            Err(EphemerisError::NoEphemeris { naif_id: -1, .. })
        ));
        assert_eq!(
            eph.frame_transform(Frame::BodyFixed(10), Frame::ICRF, epoch),
            Err(EphemerisError::NoOrientation { naif_id: 10 })
        );
    }
}
