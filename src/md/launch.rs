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
    CrossingNotFoundSnafu, InvalidLaunchSnafu, LaunchAstroSnafu, LaunchEphemerisSnafu,
    LaunchError,
};
use crate::cosmic::{
    azimuth_within, Aberration, Bodies, CelestialBody, EphemerisService, Frame, OrbitalState,
    Site, Window, CIVIL_TWILIGHT_RAD, EARTH_ANGULAR_VELOCITY_RAD_S,
};
use crate::errors::ErrorKind;
use crate::io::ConfigRepr;
use crate::linalg::Vector3;
use crate::time::{Duration, Epoch, TimeSeries, Unit};
use crate::utils::between_0_tau;
use rayon::prelude::*;
use serde_derive::{Deserialize, Serialize};
use snafu::prelude::*;
use std::f64::consts::PI;
use std::fmt;
use std::sync::mpsc::channel;
use std::sync::Arc;
use typed_builder::TypedBuilder;

/// NAIF ID of the Sun, used for the day/night constraint
const SUN_ID: i32 = 10;

/// Inclusive range of launch azimuths, clockwise from `start_rad` to `end_rad`, in radians from north.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AzimuthRange {
    pub start_rad: f64,
    pub end_rad: f64,
}

impl AzimuthRange {
    pub fn new(start_rad: f64, end_rad: f64) -> Self {
        Self { start_rad, end_rad }
    }

    pub fn contains(&self, azimuth_rad: f64) -> bool {
        azimuth_within(azimuth_rad, self.start_rad, self.end_rad)
    }
}

/// A site from which launches may happen in the provided azimuth ranges.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LaunchSite {
    #[serde(flatten)]
    pub site: Site,
    pub azimuth_ranges: Vec<AzimuthRange>,
}

impl ConfigRepr for LaunchSite {}

impl LaunchSite {
    pub fn try_new(site: Site, azimuth_ranges: Vec<AzimuthRange>) -> Result<Self, LaunchError> {
        let launch_site = Self {
            site,
            azimuth_ranges,
        };
        launch_site.validate()?;
        Ok(launch_site)
    }

    fn validate(&self) -> Result<(), LaunchError> {
        ensure!(
            !self.azimuth_ranges.is_empty(),
            InvalidLaunchSnafu {
                reason: format!("{} has no azimuth range", self.site.name),
            }
        );
        ensure!(
            self.azimuth_ranges
                .iter()
                .all(|range| range.start_rad.is_finite() && range.end_rad.is_finite()),
            InvalidLaunchSnafu {
                reason: format!("{} has a non finite azimuth range", self.site.name),
            }
        );
        Ok(())
    }

    /// Returns true if any of the azimuth ranges of this site contains the azimuth.
    pub fn allows(&self, azimuth_rad: f64) -> bool {
        self.azimuth_ranges
            .iter()
            .any(|range| range.contains(azimuth_rad))
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum LaunchTarget {
    /// Rendezvous with a body, by NAIF ID
    Body(i32),
    Orbit(OrbitalState),
}

/// Direction of travel of the launch vehicle when crossing the target plane.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum LaunchDirection {
    /// Northbound, towards the ascending node
    Ascending,
    /// Southbound
    Descending,
    Both,
}

impl LaunchDirection {
    fn allows(&self, northbound: bool) -> bool {
        match self {
            Self::Ascending => northbound,
            Self::Descending => !northbound,
            Self::Both => true,
        }
    }
}

/// A launch opportunity, at the epoch of the window.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LaunchWindow {
    /// Degenerate window, start and end are the launch epoch
    pub window: Window,
    pub inertial_azimuth_rad: f64,
    /// Azimuth relative to the rotating surface of the body
    pub non_inertial_azimuth_rad: f64,
    pub inertial_insertion_velocity_m_s: f64,
    pub non_inertial_insertion_velocity_m_s: f64,
}

impl LaunchWindow {
    pub fn epoch(&self) -> Epoch {
        self.window.start()
    }
}

impl fmt::Display for LaunchWindow {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "launch at {}\tazimuth = {:.6} deg (inertial), {:.6} deg (relative)\tinsertion velocity = {:.3} m/s (inertial), {:.3} m/s (relative)",
            self.epoch(),
            self.inertial_azimuth_rad.to_degrees(),
            self.non_inertial_azimuth_rad.to_degrees(),
            self.inertial_insertion_velocity_m_s,
            self.non_inertial_insertion_velocity_m_s
        )
    }
}

/// Options of the plane crossing search.
#[derive(Copy, Clone, Debug, TypedBuilder)]
#[builder(doc)]
pub struct SearchConfig {
    /// Duration of the chunks searched in parallel
    #[builder(default_code = "1.0 * Unit::Day")]
    pub chunk: Duration,
    /// Sampling step used to bracket the crossings
    #[builder(default_code = "60.0 * Unit::Second")]
    pub step: Duration,
    /// Precision on the epoch of each crossing
    #[builder(default_code = "1.0 * Unit::Millisecond")]
    pub epoch_precision: Duration,
    #[builder(default = 50)]
    pub max_iterations: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// A launch from the launch site into the plane of the target.
#[derive(Clone, Debug, TypedBuilder)]
#[builder(doc)]
pub struct Launch {
    pub launch_site: LaunchSite,
    pub recovery_site: Site,
    pub target: LaunchTarget,
    /// Sun elevation separating day from night
    #[builder(default = CIVIL_TWILIGHT_RAD)]
    pub twilight_rad: f64,
    /// Launch by day if true, by night if false, either if unset
    #[builder(default, setter(strip_option))]
    pub launch_by_day: Option<bool>,
    #[builder(default = LaunchDirection::Both)]
    pub direction: LaunchDirection,
    #[builder(default)]
    pub search: SearchConfig,
}

/// Geometry of the launch site and of the target plane, fixed for a search
struct PlaneGeometry {
    body_frame: Frame,
    /// Site position in the body fixed frame
    site_fixed_m: Vector3<f64>,
    north_fixed: Vector3<f64>,
    latitude_rad: f64,
    /// Distance of the site from the spin axis of its body
    spin_radius_m: f64,
    spin_rate_rad_s: f64,
    /// Unit normal of the target plane, in ICRF
    normal: Vector3<f64>,
    inclination_rad: f64,
    insertion_velocity_m_s: f64,
}

impl Launch {
    /// Finds all of the launch windows within the search window, sorted chronologically.
    ///
    /// # Algorithm
    /// The search window is split in chunks (one day by default) searched in parallel. In each chunk, the
    /// function `r_site · h` is sampled to bracket the crossings of the target plane by the site, and each
    /// crossing is refined with a Brent solver.
    ///
    /// At each crossing, the inertial azimuth follows from the spherical triangle formed by the site latitude
    /// and the target inclination: `sin(az) = cos(i) / cos(φ)` when heading north, and `π - az` when heading
    /// south. Crossings where the site latitude exceeds the inclination are skipped.
    pub fn find_launch_windows(
        &self,
        search: Window,
        service: &dyn EphemerisService,
    ) -> Result<Vec<LaunchWindow>, LaunchError> {
        self.launch_site.validate()?;
        ensure!(
            self.search.step > Duration::ZERO && self.search.chunk > Duration::ZERO,
            InvalidLaunchSnafu {
                reason: "search step and chunk must be strictly positive",
            }
        );
        let geometry = self.geometry(search.start(), service)?;
        info!(
            "Searching for launch windows from {} into a plane of inclination {:.6} deg within {search}",
            self.launch_site.site,
            geometry.inclination_rad.to_degrees()
        );

        let (sender, receiver) = channel();
        let chunks = search.split(self.search.chunk);
        chunks.into_par_iter().for_each_with(sender, |s, chunk| {
            // The receiver outlives the search
            let _ = s.send(self.windows_within(chunk, &geometry, service));
        });

        let mut windows = Vec::new();
        for chunk_windows in receiver.iter() {
            windows.extend(chunk_windows?);
        }

        // Remove duplicates at chunk boundaries and reorder
        windows.sort_by(|w1, w2| {
            w1.epoch()
                .partial_cmp(&w2.epoch())
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        windows.dedup_by(|w1, w2| (w1.epoch() - w2.epoch()).abs() <= self.search.epoch_precision);

        match windows.len() {
            0 => info!("No launch window found within {search}"),
            1 => info!("Launch window found once on {}", windows[0].epoch()),
            n => info!(
                "Launch windows found {n} times from {} until {}",
                windows[0].epoch(),
                windows[n - 1].epoch()
            ),
        };

        Ok(windows)
    }

    fn geometry(
        &self,
        start: Epoch,
        service: &dyn EphemerisService,
    ) -> Result<PlaneGeometry, LaunchError> {
        let site = &self.launch_site.site;
        let body = site.body(service).context(LaunchAstroSnafu {
            action: "loading the body of the launch site",
        })?;

        let target = match &self.target {
            LaunchTarget::Orbit(orbit) => orbit.to_frame(Frame::ICRF, service).context(
                LaunchAstroSnafu {
                    action: "rotating the target orbit to ICRF",
                },
            )?,
            LaunchTarget::Body(naif_id) => self.body_orbit(*naif_id, &body, start, service)?,
        };

        let angular_momentum = target.specific_angular_momentum();
        ensure!(
            angular_momentum.norm() > 0.0,
            InvalidLaunchSnafu {
                reason: "target orbit is degenerate",
            }
        );
        let normal = angular_momentum.normalize();

        let site_fixed_m = site.body_fixed_position(&body).context(LaunchAstroSnafu {
            action: "locating the launch site",
        })?;
        let (_, north_fixed, _) = site.enu_basis().context(LaunchAstroSnafu {
            action: "computing the local frame of the launch site",
        })?;
        let latitude_rad = site
            .geodetic()
            .context(LaunchAstroSnafu {
                action: "locating the launch site",
            })?
            .latitude_rad;

        let spin_rate_rad_s = if body.naif_id == Bodies::Earth.naif_id() {
            EARTH_ANGULAR_VELOCITY_RAD_S
        } else {
            service
                .frame_transform(body.frame(), Frame::ICRF, start)
                .context(LaunchEphemerisSnafu {
                    action: "computing the rotation rate of the launch site body",
                })?
                .angular_velocity
                .norm()
        };

        Ok(PlaneGeometry {
            body_frame: body.frame(),
            site_fixed_m,
            north_fixed,
            latitude_rad,
            spin_radius_m: site_fixed_m.x.hypot(site_fixed_m.y),
            spin_rate_rad_s,
            normal,
            inclination_rad: normal.z.clamp(-1.0, 1.0).acos(),
            insertion_velocity_m_s: target.perigee_velocity_m_s(),
        })
    }

    /// Orbit of the target body about the body of the launch site at the start of the search.
    fn body_orbit(
        &self,
        naif_id: i32,
        body: &CelestialBody,
        epoch: Epoch,
        service: &dyn EphemerisService,
    ) -> Result<OrbitalState, LaunchError> {
        let state = service
            .state_of(naif_id, epoch, body.naif_id, Frame::ICRF, Aberration::None)
            .context(LaunchEphemerisSnafu {
                action: "computing the state of the target body",
            })?;
        OrbitalState::cartesian(
            state.fixed_rows::<3>(0).into_owned(),
            state.fixed_rows::<3>(3).into_owned(),
            Arc::new(body.clone()),
            epoch,
            Frame::ICRF,
        )
        .context(LaunchAstroSnafu {
            action: "building the orbit of the target body",
        })
    }

    /// Searches one chunk of the search window.
    fn windows_within(
        &self,
        chunk: Window,
        geometry: &PlaneGeometry,
        service: &dyn EphemerisService,
    ) -> Result<Vec<LaunchWindow>, LaunchError> {
        let plane_distance = |epoch: Epoch| -> Result<f64, LaunchError> {
            let site = service
                .frame_transform(geometry.body_frame, Frame::ICRF, epoch)
                .context(LaunchEphemerisSnafu {
                    action: "rotating the launch site to ICRF",
                })?
                .apply_position(&geometry.site_fixed_m);
            Ok(site.normalize().dot(&geometry.normal))
        };

        let mut epochs: Vec<Epoch> =
            TimeSeries::inclusive(chunk.start(), chunk.end(), self.search.step).collect();
        if epochs.last() != Some(&chunk.end()) {
            epochs.push(chunk.end());
        }

        let mut windows = Vec::new();
        let mut prev_epoch = chunk.start();
        let mut prev = plane_distance(prev_epoch)?;
        for epoch in epochs.into_iter().skip(1) {
            let cur = plane_distance(epoch)?;
            if prev * cur < 0.0 || cur == 0.0 {
                match self.find_bracketed(prev_epoch, epoch, &plane_distance) {
                    Ok(crossing) => {
                        if let Some(window) = self.window_at(crossing, geometry, service)? {
                            windows.push(window);
                        }
                    }
                    Err(e) if e.kind() == ErrorKind::GeometricInfeasible => {
                        warn!("{e}: crossing skipped");
                    }
                    Err(e) => return Err(e),
                }
            }
            prev = cur;
            prev_epoch = epoch;
        }
        Ok(windows)
    }

    /// Finds the epoch where the function changes sign between the bounds with a Brent solver.
    fn find_bracketed<F>(&self, start: Epoch, end: Epoch, func: &F) -> Result<Epoch, LaunchError>
    where
        F: Fn(Epoch) -> Result<f64, LaunchError>,
    {
        let precision_s = self.search.epoch_precision.to_seconds();
        let has_converged = |xa: f64, xb: f64| (xa - xb).abs() <= precision_s;
        let arrange = |a: f64, ya: f64, b: f64, yb: f64| {
            if ya.abs() > yb.abs() {
                (a, ya, b, yb)
            } else {
                (b, yb, a, ya)
            }
        };

        let ya = func(start)?;
        let yb = func(end)?;
        if ya == 0.0 {
            return Ok(start);
        } else if yb == 0.0 {
            return Ok(end);
        }
        ensure!(ya * yb < 0.0, CrossingNotFoundSnafu { start, end });

        // Search in seconds from the start
        let (mut xa, mut ya, mut xb, mut yb) = arrange(0.0, ya, (end - start).to_seconds(), yb);
        let (mut xc, mut yc, mut xd) = (xa, ya, xa);
        let mut flag = true;

        for _ in 0..self.search.max_iterations {
            if yb == 0.0 || has_converged(xa, xb) {
                let epoch = start + xb * Unit::Second;
                debug!("plane crossing found with |{yb}| @ {epoch}");
                return Ok(epoch);
            }
            let mut s = if (ya - yc).abs() > f64::EPSILON && (yb - yc).abs() > f64::EPSILON {
                xa * yb * yc / ((ya - yb) * (ya - yc))
                    + xb * ya * yc / ((yb - ya) * (yb - yc))
                    + xc * ya * yb / ((yc - ya) * (yc - yb))
            } else {
                xb - yb * (xb - xa) / (yb - ya)
            };
            let cond1 = (s - xb) * (s - (3.0 * xa + xb) / 4.0) > 0.0;
            let cond2 = flag && (s - xb).abs() >= (xb - xc).abs() / 2.0;
            let cond3 = !flag && (s - xb).abs() >= (xc - xd).abs() / 2.0;
            let cond4 = flag && has_converged(xb, xc);
            let cond5 = !flag && has_converged(xc, xd);
            if cond1 || cond2 || cond3 || cond4 || cond5 {
                s = (xa + xb) / 2.0;
                flag = true;
            } else {
                flag = false;
            }
            let ys = func(start + s * Unit::Second)?;
            xd = xc;
            xc = xb;
            yc = yb;
            if ya * ys < 0.0 {
                (xa, ya, xb, yb) = arrange(xa, ya, s, ys);
            } else {
                (xa, ya, xb, yb) = arrange(s, ys, xb, yb);
            }
        }
        error!(
            "Brent solver failed after {} iterations",
            self.search.max_iterations
        );
        Err(LaunchError::CrossingNotFound { start, end })
    }

    /// Builds the launch window at the crossing, or none if the crossing does not satisfy the constraints.
    fn window_at(
        &self,
        epoch: Epoch,
        geometry: &PlaneGeometry,
        service: &dyn EphemerisService,
    ) -> Result<Option<LaunchWindow>, LaunchError> {
        let transform = service
            .frame_transform(geometry.body_frame, Frame::ICRF, epoch)
            .context(LaunchEphemerisSnafu {
                action: "rotating the launch site to ICRF",
            })?;
        let site_dir = transform
            .apply_position(&geometry.site_fixed_m)
            .normalize();
        let north = transform.apply_position(&geometry.north_fixed);
        // Direction of travel along the plane, eastward for prograde targets
        let northbound = geometry.normal.cross(&site_dir).dot(&north) > 0.0;

        if !self.direction.allows(northbound) {
            debug!("{epoch}: skipped {} crossing", if northbound { "northbound" } else { "southbound" });
            return Ok(None);
        }

        let ratio = geometry.inclination_rad.cos() / geometry.latitude_rad.cos();
        if ratio.abs() > 1.0 {
            debug!(
                "{epoch}: latitude of {:.6} deg exceeds the target inclination",
                geometry.latitude_rad.to_degrees()
            );
            return Ok(None);
        }
        let northbound_azimuth = ratio.asin();
        let inertial_azimuth_rad = between_0_tau(if northbound {
            northbound_azimuth
        } else {
            PI - northbound_azimuth
        });

        if !self.launch_site.allows(inertial_azimuth_rad) {
            debug!(
                "{epoch}: azimuth of {:.6} deg outside of the allowed ranges",
                inertial_azimuth_rad.to_degrees()
            );
            return Ok(None);
        }

        if let Some(by_day) = self.launch_by_day {
            let sun = self
                .launch_site
                .site
                .horizontal_coordinates(SUN_ID, epoch, service)
                .context(LaunchAstroSnafu {
                    action: "computing the Sun elevation",
                })?;
            let is_day = sun.elevation_rad > self.twilight_rad;
            if is_day != by_day {
                debug!(
                    "{epoch}: skipped, Sun elevation of {:.3} deg",
                    sun.elevation_rad.to_degrees()
                );
                return Ok(None);
            }
        }

        // Remove the velocity of the surface, which is eastward
        let speed = geometry.insertion_velocity_m_s;
        let east_m_s =
            speed * inertial_azimuth_rad.sin() - geometry.spin_rate_rad_s * geometry.spin_radius_m;
        let north_m_s = speed * inertial_azimuth_rad.cos();

        let window = LaunchWindow {
            window: Window::instant(epoch),
            inertial_azimuth_rad,
            non_inertial_azimuth_rad: between_0_tau(east_m_s.atan2(north_m_s)),
            inertial_insertion_velocity_m_s: speed,
            non_inertial_insertion_velocity_m_s: east_m_s.hypot(north_m_s),
        };
        debug!("{window}");
        Ok(Some(window))
    }
}
