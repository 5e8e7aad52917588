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
    ChainExhaustedSnafu, InfeasibleSnafu, InvalidManeuverSnafu, ManeuverAstroSnafu,
    ManeuverError, ManeuverPropulsionSnafu,
};
use crate::cosmic::{
    perifocal_to_inertial, true_to_mean_anomaly, Aberration, AstroEphemerisSnafu, BodyAxis,
    EphemerisService, Frame, OrbitalElements, OrbitalState, Spacecraft, StateOrientation,
    TimeTagged, UnknownTankSnafu, Window,
};
use crate::linalg::Vector3;
use crate::time::{Duration, Epoch, Unit};
use crate::utils::{between_0_tau, between_pm_pi};
use snafu::prelude::*;
use std::collections::BTreeMap;
use std::f64::consts::TAU;
use std::fmt;

/// Below this difference in longitude of periapsis (radians), two apsidal lines are coincident
const APSIDAL_EPSILON: f64 = 1e-9;

/// Lifecycle of a maneuver in the chain: Pending → Planned → Executed → Done.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ManeuverStatus {
    Pending,
    /// Execution epoch, engine and fuel selected
    Planned,
    /// Fuel burned from the selected tank
    Executed,
    /// Resulting state folded into the spacecraft
    Done,
}

impl fmt::Display for ManeuverStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Direction the spacecraft Front axis (or an instrument boresight) is pointed to.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum AttitudeTarget {
    Nadir,
    Zenith,
    Prograde,
    Retrograde,
    /// Points the boresight of the instrument to the target body
    InstrumentPointing { instrument_id: i32, target_id: i32 },
}

#[derive(Clone, Debug, PartialEq)]
pub enum PhasingTarget {
    /// True longitude of the target at the execution epoch, in radians
    TrueLongitude(f64),
    /// Orbit of the target, propagated to the execution epoch
    Orbit(Box<OrbitalState>),
}

#[derive(Clone, Debug, PartialEq)]
pub enum ManeuverKind {
    /// Rotates the apsidal line onto that of the coplanar target orbit, burning at an intersection of both orbits
    ApsidalAlignment { target: Box<OrbitalState> },
    /// Changes the perigee radius with a tangential burn at apogee
    PerigeeHeight { target_perigee_radius_m: f64 },
    /// Changes the apogee radius with a tangential burn at perigee
    ApogeeHeight { target_apogee_radius_m: f64 },
    /// Catches up with the target after the provided number of revolutions on a phasing orbit
    Phasing {
        target: PhasingTarget,
        revolutions: u32,
    },
    Attitude(AttitudeTarget),
}

impl ManeuverKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::ApsidalAlignment { .. } => "apsidal alignment",
            Self::PerigeeHeight { .. } => "perigee height change",
            Self::ApogeeHeight { .. } => "apogee height change",
            Self::Phasing { .. } => "phasing",
            Self::Attitude(AttitudeTarget::Nadir) => "nadir attitude",
            Self::Attitude(AttitudeTarget::Zenith) => "zenith attitude",
            Self::Attitude(AttitudeTarget::Prograde) => "prograde attitude",
            Self::Attitude(AttitudeTarget::Retrograde) => "retrograde attitude",
            Self::Attitude(AttitudeTarget::InstrumentPointing { .. }) => "instrument pointing",
        }
    }

    pub fn is_attitude(&self) -> bool {
        matches!(self, Self::Attitude(_))
    }
}

/// Result of the planning of a maneuver.
#[derive(Clone, Debug, PartialEq)]
pub struct ManeuverPlan {
    /// Epoch of the impulsive burn
    pub epoch: Epoch,
    /// Thrust window, centered on the burn epoch
    pub thrust_window: Window,
    /// Impulsive delta-v of the (first) burn, in the frame of the orbit, in m/s
    pub delta_v_m_s: Vector3<f64>,
    /// Selected engine, none for attitude maneuvers
    pub engine_serial: Option<String>,
    pub fuel_burned_kg: f64,
    /// State of the spacecraft once the maneuver is complete
    pub target_state: OrbitalState,
    pub attitude: StateOrientation,
}

impl fmt::Display for ManeuverPlan {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "burn at {} (thrust over {})\tΔv = {:.6} m/s with {} ({:.3} kg)",
            self.epoch,
            self.thrust_window,
            self.delta_v_m_s.norm(),
            self.engine_serial.as_deref().unwrap_or("no engine"),
            self.fuel_burned_kg
        )
    }
}

/// A maneuver of the chain of a spacecraft.
#[derive(Clone, Debug, PartialEq)]
pub struct Maneuver {
    /// Earliest epoch of execution
    pub minimum_epoch: Epoch,
    /// How long after the minimum epoch the maneuver may still be executed
    pub hold_duration: Duration,
    /// Serial numbers of the candidate engines, tried in order
    pub engines: Vec<String>,
    pub kind: ManeuverKind,
    status: ManeuverStatus,
    plan: Option<ManeuverPlan>,
}

/// Geometry of a maneuver before engine selection
struct Burn {
    epoch: Epoch,
    delta_v_m_s: Vector3<f64>,
    /// Total delta-v the fuel must cover, in m/s
    budget_m_s: f64,
    target_state: OrbitalState,
    attitude: Option<StateOrientation>,
}

impl Maneuver {
    pub fn new(
        minimum_epoch: Epoch,
        hold_duration: Duration,
        engines: Vec<String>,
        kind: ManeuverKind,
    ) -> Result<Self, ManeuverError> {
        ensure!(
            hold_duration >= Duration::ZERO,
            InvalidManeuverSnafu {
                reason: format!("negative hold duration {hold_duration}"),
            }
        );
        ensure!(
            kind.is_attitude() || !engines.is_empty(),
            InvalidManeuverSnafu {
                reason: format!("{} requires at least one engine", kind.name()),
            }
        );
        match &kind {
            ManeuverKind::PerigeeHeight {
                target_perigee_radius_m: radius_m,
            }
            | ManeuverKind::ApogeeHeight {
                target_apogee_radius_m: radius_m,
            } => ensure!(
                *radius_m > 0.0 && radius_m.is_finite(),
                InvalidManeuverSnafu {
                    reason: format!("target radius of {radius_m} m must be strictly positive"),
                }
            ),
            ManeuverKind::Phasing {
                target,
                revolutions,
            } => {
                ensure!(
                    *revolutions > 0,
                    InvalidManeuverSnafu {
                        reason: "phasing requires at least one revolution",
                    }
                );
                if let PhasingTarget::TrueLongitude(lon) = target {
                    ensure!(
                        lon.is_finite(),
                        InvalidManeuverSnafu {
                            reason: "target true longitude must be finite",
                        }
                    );
                }
            }
            _ => {}
        }
        Ok(Self {
            minimum_epoch,
            hold_duration,
            engines,
            kind,
            status: ManeuverStatus::Pending,
            plan: None,
        })
    }

    pub fn status(&self) -> ManeuverStatus {
        self.status
    }

    pub fn plan(&self) -> Option<&ManeuverPlan> {
        self.plan.as_ref()
    }

    /// Window within which the maneuver may be executed
    pub fn window(&self) -> Window {
        Window::from_length(self.minimum_epoch, self.hold_duration)
    }

    /// Computes the plan of this maneuver for the spacecraft in its current state.
    pub fn compute_plan(
        &self,
        sc: &Spacecraft,
        service: &dyn EphemerisService,
    ) -> Result<ManeuverPlan, ManeuverError> {
        let window = self.window();
        // The chain only moves forward: never search before the current state of the spacecraft
        let start = if sc.orbit().epoch() > self.minimum_epoch {
            sc.orbit().epoch()
        } else {
            self.minimum_epoch
        };
        ensure!(
            start <= window.end(),
            super::NoFeasibleEpochSnafu {
                maneuver: self.kind.name(),
                window,
            }
        );
        let orbit = propagate(sc.orbit(), start)?;
        let burn = match &self.kind {
            ManeuverKind::ApsidalAlignment { target } => apsidal_alignment(&orbit, target)?,
            ManeuverKind::PerigeeHeight {
                target_perigee_radius_m,
            } => apsis_change(&orbit, 0.5 * TAU, *target_perigee_radius_m)?,
            ManeuverKind::ApogeeHeight {
                target_apogee_radius_m,
            } => apsis_change(&orbit, 0.0, *target_apogee_radius_m)?,
            ManeuverKind::Phasing {
                target,
                revolutions,
            } => phasing(&orbit, target, *revolutions)?,
            ManeuverKind::Attitude(target) => attitude(&orbit, sc, target, service)?,
        };

        ensure!(
            window.contains(burn.epoch),
            super::NoFeasibleEpochSnafu {
                maneuver: self.kind.name(),
                window,
            }
        );

        let attitude = match burn.attitude {
            Some(attitude) => attitude,
            None => {
                let direction = if burn.delta_v_m_s.norm() > 0.0 {
                    burn.delta_v_m_s
                } else {
                    burn.target_state.velocity_m_s()
                };
                StateOrientation::aligning(
                    &BodyAxis::Front.unit_vector(),
                    &direction,
                    burn.epoch,
                    orbit.frame(),
                )
                .context(ManeuverAstroSnafu {
                    action: "orienting the spacecraft along the burn",
                })?
            }
        };

        if self.kind.is_attitude() {
            return Ok(ManeuverPlan {
                epoch: burn.epoch,
                thrust_window: Window::instant(burn.epoch),
                delta_v_m_s: Vector3::zeros(),
                engine_serial: None,
                fuel_burned_kg: 0.0,
                target_state: burn.target_state,
                attitude,
            });
        }

        let (engine_serial, fuel_burned_kg, fuel_flow_kg_s) =
            self.select_engine(sc, burn.budget_m_s)?;
        let thrust_duration = (fuel_burned_kg / fuel_flow_kg_s) * Unit::Second;

        Ok(ManeuverPlan {
            epoch: burn.epoch,
            thrust_window: Window::new(
                burn.epoch - thrust_duration * 0.5,
                burn.epoch + thrust_duration * 0.5,
            ),
            delta_v_m_s: burn.delta_v_m_s,
            engine_serial: Some(engine_serial),
            fuel_burned_kg,
            target_state: burn.target_state,
            attitude,
        })
    }

    /// Returns the first engine, in the order of the candidates, whose tank holds enough fuel for the delta-v.
    fn select_engine(
        &self,
        sc: &Spacecraft,
        delta_v_m_s: f64,
    ) -> Result<(String, f64, f64), ManeuverError> {
        let mass_kg = sc.total_mass_kg();
        let mut required_kg = f64::INFINITY;
        for serial_number in &self.engines {
            let engine = sc
                .engine(serial_number)
                .context(super::UnknownEngineSnafu {
                    serial_number: serial_number.clone(),
                })?;
            let fuel_kg = engine.fuel_for_delta_v_kg(mass_kg, delta_v_m_s);
            let available_kg = sc
                .fuel_tank(&engine.fuel_tank_serial)
                .map_or(0.0, |tank| tank.quantity_kg());
            if available_kg >= fuel_kg {
                debug!("{serial_number} selected to burn {fuel_kg:.3} kg for {delta_v_m_s:.3} m/s");
                return Ok((serial_number.clone(), fuel_kg, engine.fuel_flow_kg_s));
            }
            debug!(
                "{serial_number} needs {fuel_kg:.3} kg but its tank {} holds {available_kg:.3} kg",
                engine.fuel_tank_serial
            );
            required_kg = required_kg.min(fuel_kg);
        }
        Err(ManeuverError::NoEngine {
            required_kg,
            delta_v_m_s,
        })
    }
}

impl fmt::Display for Maneuver {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} [{}] within {}", self.kind.name(), self.status, self.window())?;
        if let Some(plan) = &self.plan {
            write!(f, "\t{plan}")?;
        }
        Ok(())
    }
}

fn propagate(orbit: &OrbitalState, epoch: Epoch) -> Result<OrbitalState, ManeuverError> {
    orbit.at_epoch(epoch).context(ManeuverAstroSnafu {
        action: "propagating the spacecraft orbit",
    })
}

/// First epoch, from the epoch of the orbit, where the orbit reaches the true anomaly.
fn epoch_at_true_anomaly(orbit: &OrbitalState, ta_rad: f64) -> Epoch {
    let target_ma = true_to_mean_anomaly(between_0_tau(ta_rad), orbit.ecc());
    let mut delta = between_0_tau(target_ma - orbit.ma_rad());
    if delta > TAU - 1e-12 {
        delta = 0.0;
    }
    orbit.epoch() + (delta / orbit.mean_motion_rad_s()) * Unit::Second
}

/// Tangential delta-v at the current position to reach the other apsis, the burn point becoming an apsis.
fn tangential_delta_v(orbit: &OrbitalState, other_apsis_m: f64) -> Vector3<f64> {
    let sv = orbit.to_state_vector();
    let radius_m = sv.radius_m().norm();
    let velocity = sv.velocity_m_s();
    let sma_m = (radius_m + other_apsis_m) / 2.0;
    let new_speed = (orbit.gm() * (2.0 / radius_m - 1.0 / sma_m)).sqrt();
    velocity.normalize() * (new_speed - velocity.norm())
}

fn apply_delta_v(orbit: &OrbitalState, delta_v_m_s: Vector3<f64>) -> Result<OrbitalState, ManeuverError> {
    orbit.with_delta_v(delta_v_m_s).context(ManeuverAstroSnafu {
        action: "applying the delta-v",
    })
}

/// Burns tangentially at the provided apsis (true anomaly) to move the opposite apsis to the target radius.
fn apsis_change(
    orbit: &OrbitalState,
    burn_ta_rad: f64,
    target_radius_m: f64,
) -> Result<Burn, ManeuverError> {
    let epoch = if orbit.is_circular() {
        orbit.epoch()
    } else {
        epoch_at_true_anomaly(orbit, burn_ta_rad)
    };
    let at_burn = propagate(orbit, epoch)?;
    let delta_v_m_s = tangential_delta_v(&at_burn, target_radius_m);
    Ok(Burn {
        epoch,
        delta_v_m_s,
        budget_m_s: delta_v_m_s.norm(),
        target_state: apply_delta_v(&at_burn, delta_v_m_s)?,
        attitude: None,
    })
}

fn same_center(orbit: &OrbitalState, target: &OrbitalState) -> Result<(), ManeuverError> {
    ensure!(
        orbit.center().naif_id == target.center().naif_id,
        InvalidManeuverSnafu {
            reason: format!(
                "target orbits {} but the spacecraft orbits {}",
                target.center(),
                orbit.center()
            ),
        }
    );
    Ok(())
}

fn apsidal_alignment(orbit: &OrbitalState, target: &OrbitalState) -> Result<Burn, ManeuverError> {
    same_center(orbit, target)?;
    let gm = orbit.gm();
    let eta = between_pm_pi(
        (target.raan_rad() + target.aop_rad()) - (orbit.raan_rad() + orbit.aop_rad()),
    );
    if eta.abs() < APSIDAL_EPSILON {
        debug!("apsidal lines already aligned");
        return Ok(Burn {
            epoch: orbit.epoch(),
            delta_v_m_s: Vector3::zeros(),
            budget_m_s: 0.0,
            target_state: orbit.clone(),
            attitude: None,
        });
    }

    let (e1, e2) = (orbit.ecc(), target.ecc());
    let h1_sq = gm * orbit.semi_parameter_m();
    let h2_sq = gm * target.semi_parameter_m();
    // A cos θ + B sin θ = C, θ the true anomaly on the current orbit
    let a = e1 * h2_sq - e2 * h1_sq * eta.cos();
    let b = -e2 * h1_sq * eta.sin();
    let c = h1_sq - h2_sq;
    let norm = a.hypot(b);
    ensure!(
        norm > 0.0 && c.abs() <= norm,
        InfeasibleSnafu {
            reason: "the current and target orbits do not intersect",
        }
    );
    let phi = b.atan2(a);
    let alpha = (c / norm).acos();

    let (epoch, ta_rad) = [phi + alpha, phi - alpha]
        .into_iter()
        .map(|ta| (epoch_at_true_anomaly(orbit, ta), ta))
        .min_by(|(first, _), (second, _)| {
            first
                .partial_cmp(second)
                .unwrap_or(std::cmp::Ordering::Equal)
        })
        .ok_or_else(|| ManeuverError::Infeasible {
            reason: "no intersection".to_string(),
        })?;

    let at_burn = propagate(orbit, epoch)?;
    let (_, target_velocity) = perifocal_to_inertial(
        gm,
        target.sma_m(),
        e2,
        target.inc_rad(),
        target.raan_rad(),
        target.aop_rad(),
        ta_rad - eta,
    );
    let delta_v_m_s = target_velocity - at_burn.velocity_m_s();
    Ok(Burn {
        epoch,
        delta_v_m_s,
        budget_m_s: delta_v_m_s.norm(),
        target_state: apply_delta_v(&at_burn, delta_v_m_s)?,
        attitude: None,
    })
}

fn phasing(
    orbit: &OrbitalState,
    target: &PhasingTarget,
    revolutions: u32,
) -> Result<Burn, ManeuverError> {
    let epoch = if orbit.is_circular() {
        orbit.epoch()
    } else {
        epoch_at_true_anomaly(orbit, 0.0)
    };
    let at_burn = propagate(orbit, epoch)?;

    let target_longitude = match target {
        PhasingTarget::TrueLongitude(lon) => *lon,
        PhasingTarget::Orbit(target) => {
            same_center(orbit, target)?;
            propagate(target, epoch)?.true_longitude_rad()
        }
    };

    let ecc = at_burn.ecc();
    let target_ta = between_0_tau(target_longitude - at_burn.raan_rad() - at_burn.aop_rad());
    let phase = between_0_tau(true_to_mean_anomaly(target_ta, ecc) - at_burn.ma_rad());

    let period = at_burn.period().context(ManeuverAstroSnafu {
        action: "computing the period",
    })?;
    let phasing_period_s = period.to_seconds() * (1.0 - phase / (TAU * f64::from(revolutions)));
    let phasing_sma_m = (at_burn.gm() * (phasing_period_s / TAU).powi(2)).cbrt();

    let burn_radius_m = at_burn.radius_m().norm();
    let other_apsis_m = 2.0 * phasing_sma_m - burn_radius_m;
    let min_radius_m = at_burn.center().equatorial_radius_m;
    ensure!(
        other_apsis_m.min(burn_radius_m) >= min_radius_m,
        InfeasibleSnafu {
            reason: format!(
                "phasing orbit periapsis of {:.3} km is below the surface ({:.3} km)",
                other_apsis_m.min(burn_radius_m) * 1e-3,
                min_radius_m * 1e-3
            ),
        }
    );

    let delta_v_m_s = tangential_delta_v(&at_burn, other_apsis_m);
    let completion = epoch + f64::from(revolutions) * phasing_period_s * Unit::Second;
    info!(
        "phasing over {revolutions} revolution(s) of {:.3} s to recover a lead of {:.6} deg",
        phasing_period_s,
        phase.to_degrees()
    );
    Ok(Burn {
        epoch,
        delta_v_m_s,
        // Entry and exit burns are symmetric
        budget_m_s: 2.0 * delta_v_m_s.norm(),
        target_state: back_at_burn_point(&at_burn, completion)?,
        attitude: None,
    })
}

/// State on the orbit of the burn, at the burn point, at the provided epoch.
fn back_at_burn_point(at_burn: &OrbitalState, epoch: Epoch) -> Result<OrbitalState, ManeuverError> {
    OrbitalState::keplerian(
        at_burn.sma_m(),
        at_burn.ecc(),
        at_burn.inc_rad(),
        at_burn.raan_rad(),
        at_burn.aop_rad(),
        at_burn.ma_rad(),
        at_burn.center().clone(),
        epoch,
        at_burn.frame(),
    )
    .context(ManeuverAstroSnafu {
        action: "completing the phasing",
    })
}

fn attitude(
    orbit: &OrbitalState,
    sc: &Spacecraft,
    target: &AttitudeTarget,
    service: &dyn EphemerisService,
) -> Result<Burn, ManeuverError> {
    let epoch = orbit.epoch();
    let front = BodyAxis::Front.unit_vector();
    let (body_vector, direction, frame) = match target {
        AttitudeTarget::Nadir => (front, -orbit.radius_m(), orbit.frame()),
        AttitudeTarget::Zenith => (front, orbit.radius_m(), orbit.frame()),
        AttitudeTarget::Prograde => (front, orbit.velocity_m_s(), orbit.frame()),
        AttitudeTarget::Retrograde => (front, -orbit.velocity_m_s(), orbit.frame()),
        AttitudeTarget::InstrumentPointing {
            instrument_id,
            target_id,
        } => {
            let instrument = sc
                .instrument(*instrument_id)
                .context(super::UnknownInstrumentSnafu {
                    naif_id: *instrument_id,
                })?;
            let position = orbit
                .to_frame(Frame::ICRF, service)
                .context(ManeuverAstroSnafu {
                    action: "rotating the spacecraft orbit to ICRF",
                })?
                .radius_m();
            let target_state = service
                .state_of(
                    *target_id,
                    epoch,
                    orbit.center().naif_id,
                    Frame::ICRF,
                    Aberration::None,
                )
                .context(AstroEphemerisSnafu {
                    action: "locating the pointing target",
                })
                .context(ManeuverAstroSnafu {
                    action: "pointing an instrument",
                })?;
            (
                instrument.boresight_in_body(),
                target_state.fixed_rows::<3>(0).into_owned() - position,
                Frame::ICRF,
            )
        }
    };
    let attitude = StateOrientation::aligning(&body_vector, &direction, epoch, frame).context(
        ManeuverAstroSnafu {
            action: "computing the attitude",
        },
    )?;
    Ok(Burn {
        epoch,
        delta_v_m_s: Vector3::zeros(),
        budget_m_s: 0.0,
        target_state: orbit.clone(),
        attitude: Some(attitude),
    })
}

impl Spacecraft {
    /// Appends the maneuver to the chain and returns its order in the chain.
    pub fn add_maneuver(&mut self, maneuver: Maneuver) -> usize {
        self.maneuvers.push(maneuver);
        self.maneuvers.len() - 1
    }

    /// All maneuvers of the chain, by order of execution
    pub fn maneuvers(&self) -> BTreeMap<usize, &Maneuver> {
        self.maneuvers.iter().enumerate().collect()
    }

    /// The next maneuver to plan or execute, if any
    pub fn standby_maneuver(&self) -> Option<&Maneuver> {
        self.maneuvers.get(self.cursor)
    }

    /// Plans the standby maneuver from the current state of the spacecraft.
    pub fn plan_next(
        &mut self,
        service: &dyn EphemerisService,
    ) -> Result<ManeuverPlan, ManeuverError> {
        let maneuver = self.standby_maneuver().context(ChainExhaustedSnafu)?;
        if maneuver.status != ManeuverStatus::Pending && maneuver.status != ManeuverStatus::Planned {
            return Err(ManeuverError::UnexpectedStatus {
                status: maneuver.status,
                expected: ManeuverStatus::Pending,
            });
        }
        let plan = maneuver.compute_plan(self, service)?;
        debug!("planned {}: {plan}", maneuver.kind.name());

        let maneuver = &mut self.maneuvers[self.cursor];
        maneuver.plan = Some(plan.clone());
        maneuver.status = ManeuverStatus::Planned;
        Ok(plan)
    }

    /// Executes the planned standby maneuver: burns the fuel, folds the resulting state and attitude
    /// into the spacecraft and moves the cursor to the next maneuver.
    pub fn execute_next(&mut self) -> Result<ManeuverPlan, ManeuverError> {
        let maneuver = self.standby_maneuver().context(ChainExhaustedSnafu)?;
        let plan = match (&maneuver.plan, maneuver.status) {
            (Some(plan), ManeuverStatus::Planned) => plan.clone(),
            _ => {
                return Err(ManeuverError::UnexpectedStatus {
                    status: maneuver.status,
                    expected: ManeuverStatus::Planned,
                })
            }
        };

        if let Some(serial_number) = &plan.engine_serial {
            let tank_serial = self
                .engine(serial_number)
                .map(|engine| engine.fuel_tank_serial.clone())
                .context(super::UnknownEngineSnafu {
                    serial_number: serial_number.clone(),
                })?;
            let tank = self
                .fuel_tank_mut(&tank_serial)
                .context(UnknownTankSnafu {
                    engine: serial_number.clone(),
                    tank: tank_serial.clone(),
                })
                .context(ManeuverPropulsionSnafu {
                    action: "executing a maneuver",
                })?;
            tank.burn(plan.fuel_burned_kg)
                .context(ManeuverPropulsionSnafu {
                    action: "executing a maneuver",
                })?;
        }
        let cursor = self.cursor;
        self.maneuvers[cursor].status = ManeuverStatus::Executed;

        self.orbit = plan.target_state.clone();
        self.attitude = Some(plan.attitude);
        self.maneuvers[cursor].status = ManeuverStatus::Done;
        self.cursor += 1;
        info!(
            "{} executed: {plan}",
            self.maneuvers[cursor].kind.name()
        );
        Ok(plan)
    }

    /// Plans and executes every remaining maneuver of the chain, in order.
    pub fn execute_chain(
        &mut self,
        service: &dyn EphemerisService,
    ) -> Result<Vec<ManeuverPlan>, ManeuverError> {
        let mut plans = Vec::with_capacity(self.maneuvers.len().saturating_sub(self.cursor));
        while self.standby_maneuver().is_some() {
            self.plan_next(service)?;
            plans.push(self.execute_next()?);
        }
        Ok(plans)
    }
}
