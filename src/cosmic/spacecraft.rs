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

use super::{OrbitalState, StateOrientation, STD_GRAVITY};
use crate::errors::ErrorKind;
use crate::io::ConfigRepr;
use crate::linalg::{UnitQuaternion, Vector3};
use crate::md::Maneuver;
use serde_derive::{Deserialize, Serialize};
use snafu::prelude::*;
use std::fmt;

#[derive(Debug, PartialEq, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum PropulsionError {
    #[snafu(display("tank {tank} holds {available_kg} kg but {requested_kg} kg were requested"))]
    InsufficientFuel {
        tank: String,
        requested_kg: f64,
        available_kg: f64,
    },
    #[snafu(display("cannot burn a negative quantity ({quantity_kg} kg) from tank {tank}"))]
    NegativeQuantity { tank: String, quantity_kg: f64 },
    #[snafu(display("engine {engine} draws from tank {tank} which is not on the spacecraft"))]
    UnknownTank { engine: String, tank: String },
    #[snafu(display("no engine with serial number {serial_number}"))]
    UnknownEngine { serial_number: String },
    #[snafu(display("{component} {id} is already on the spacecraft"))]
    Duplicate { component: &'static str, id: String },
    #[snafu(display("invalid spacecraft: {reason}"))]
    InvalidSpacecraft { reason: String },
    #[snafu(display("invalid {component}: {reason}"))]
    InvalidComponent {
        component: &'static str,
        reason: String,
    },
}

impl PropulsionError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InsufficientFuel { .. } => ErrorKind::InsufficientResource,
            Self::UnknownTank { .. } | Self::UnknownEngine { .. } | Self::Duplicate { .. } => {
                ErrorKind::PreconditionFailed
            }
            _ => ErrorKind::InvalidArgument,
        }
    }
}

/// A fuel tank, its quantity only decreases through [FuelTank::burn].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FuelTank {
    pub name: String,
    pub model: String,
    pub serial_number: String,
    pub capacity_kg: f64,
    quantity_kg: f64,
}

impl ConfigRepr for FuelTank {}

impl FuelTank {
    pub fn try_new(
        name: &str,
        model: &str,
        serial_number: &str,
        capacity_kg: f64,
        quantity_kg: f64,
    ) -> Result<Self, PropulsionError> {
        let tank = Self {
            name: name.to_string(),
            model: model.to_string(),
            serial_number: serial_number.to_string(),
            capacity_kg,
            quantity_kg,
        };
        tank.validate()?;
        Ok(tank)
    }

    pub(crate) fn validate(&self) -> Result<(), PropulsionError> {
        ensure!(
            !self.serial_number.is_empty(),
            InvalidComponentSnafu {
                component: "fuel tank",
                reason: "empty serial number",
            }
        );
        ensure!(
            self.capacity_kg >= 0.0 && (0.0..=self.capacity_kg).contains(&self.quantity_kg),
            InvalidComponentSnafu {
                component: "fuel tank",
                reason: format!(
                    "quantity of {} kg must be within [0, {}] kg",
                    self.quantity_kg, self.capacity_kg
                ),
            }
        );
        Ok(())
    }

    /// Remaining fuel, in kg
    pub fn quantity_kg(&self) -> f64 {
        self.quantity_kg
    }

    pub fn is_empty(&self) -> bool {
        self.quantity_kg <= 0.0
    }

    /// Removes the quantity from the tank. On failure, the tank is left unchanged.
    pub fn burn(&mut self, quantity_kg: f64) -> Result<(), PropulsionError> {
        ensure!(
            quantity_kg >= 0.0,
            NegativeQuantitySnafu {
                tank: self.serial_number.clone(),
                quantity_kg,
            }
        );
        ensure!(
            quantity_kg <= self.quantity_kg,
            InsufficientFuelSnafu {
                tank: self.serial_number.clone(),
                requested_kg: quantity_kg,
                available_kg: self.quantity_kg,
            }
        );
        self.quantity_kg -= quantity_kg;
        Ok(())
    }
}

/// A chemical engine, drawing from one fuel tank.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Engine {
    pub name: String,
    pub model: String,
    pub serial_number: String,
    /// Specific impulse, in seconds
    pub isp_s: f64,
    /// Mass flow rate, in kg/s
    pub fuel_flow_kg_s: f64,
    /// Serial number of the tank this engine draws from
    pub fuel_tank_serial: String,
}

impl ConfigRepr for Engine {}

impl Engine {
    pub fn try_new(
        name: &str,
        model: &str,
        serial_number: &str,
        isp_s: f64,
        fuel_flow_kg_s: f64,
        fuel_tank_serial: &str,
    ) -> Result<Self, PropulsionError> {
        let engine = Self {
            name: name.to_string(),
            model: model.to_string(),
            serial_number: serial_number.to_string(),
            isp_s,
            fuel_flow_kg_s,
            fuel_tank_serial: fuel_tank_serial.to_string(),
        };
        engine.validate()?;
        Ok(engine)
    }

    pub(crate) fn validate(&self) -> Result<(), PropulsionError> {
        ensure!(
            !self.serial_number.is_empty(),
            InvalidComponentSnafu {
                component: "engine",
                reason: "empty serial number",
            }
        );
        ensure!(
            self.isp_s > 0.0 && self.fuel_flow_kg_s > 0.0,
            InvalidComponentSnafu {
                component: "engine",
                reason: format!(
                    "Isp ({} s) and fuel flow ({} kg/s) must be strictly positive",
                    self.isp_s, self.fuel_flow_kg_s
                ),
            }
        );
        Ok(())
    }

    /// Effective exhaust velocity, in m/s
    pub fn exhaust_velocity_m_s(&self) -> f64 {
        self.isp_s * STD_GRAVITY
    }

    /// Thrust, in Newtons
    pub fn thrust_n(&self) -> f64 {
        self.exhaust_velocity_m_s() * self.fuel_flow_kg_s
    }

    /// Fuel mass needed to impart the delta-v on a vehicle of the provided initial mass (rocket equation).
    pub fn fuel_for_delta_v_kg(&self, initial_mass_kg: f64, delta_v_m_s: f64) -> f64 {
        initial_mass_kg * (1.0 - (-delta_v_m_s.abs() / self.exhaust_velocity_m_s()).exp())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Payload {
    pub name: String,
    pub serial_number: String,
    pub mass_kg: f64,
}

impl ConfigRepr for Payload {}

/// An instrument, its boresight is expressed in the instrument frame and rotated into the spacecraft body frame by the orientation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Instrument {
    pub naif_id: i32,
    pub name: String,
    pub model: String,
    pub field_of_view_rad: f64,
    pub boresight: Vector3<f64>,
    #[serde(default = "UnitQuaternion::identity")]
    pub orientation: UnitQuaternion<f64>,
}

impl ConfigRepr for Instrument {}

impl Instrument {
    /// Boresight in the spacecraft body frame
    pub fn boresight_in_body(&self) -> Vector3<f64> {
        self.orientation * self.boresight
    }
}

/// Definition of a spacecraft, without its orbit.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpacecraftConfig {
    pub naif_id: i32,
    pub name: String,
    pub dry_mass_kg: f64,
    pub max_operating_mass_kg: f64,
    #[serde(default)]
    pub fuel_tanks: Vec<FuelTank>,
    #[serde(default)]
    pub engines: Vec<Engine>,
    #[serde(default)]
    pub payloads: Vec<Payload>,
    #[serde(default)]
    pub instruments: Vec<Instrument>,
}

impl ConfigRepr for SpacecraftConfig {}

impl SpacecraftConfig {
    /// Builds the spacecraft, registering every component in order (tanks before engines).
    pub fn into_spacecraft(self, orbit: OrbitalState) -> Result<Spacecraft, PropulsionError> {
        let mut sc = Spacecraft::try_new(
            self.naif_id,
            &self.name,
            self.dry_mass_kg,
            self.max_operating_mass_kg,
            orbit,
        )?;
        for tank in self.fuel_tanks {
            sc.add_fuel_tank(tank)?;
        }
        for engine in self.engines {
            sc.add_engine(engine)?;
        }
        for payload in self.payloads {
            sc.add_payload(payload)?;
        }
        for instrument in self.instruments {
            sc.add_instrument(instrument)?;
        }
        Ok(sc)
    }
}

/// A spacecraft, its components and its maneuver chain.
///
/// Body axes: Front is +Y, Right is +X and Up is +Z.
#[derive(Clone, Debug)]
pub struct Spacecraft {
    pub(crate) naif_id: i32,
    pub(crate) name: String,
    pub(crate) dry_mass_kg: f64,
    pub(crate) max_operating_mass_kg: f64,
    pub(crate) orbit: OrbitalState,
    pub(crate) attitude: Option<StateOrientation>,
    pub(crate) fuel_tanks: Vec<FuelTank>,
    pub(crate) engines: Vec<Engine>,
    pub(crate) payloads: Vec<Payload>,
    pub(crate) instruments: Vec<Instrument>,
    pub(crate) maneuvers: Vec<Maneuver>,
    /// Index of the standby maneuver, i.e. the next one to be planned or executed
    pub(crate) cursor: usize,
}

impl Spacecraft {
    pub fn try_new(
        naif_id: i32,
        name: &str,
        dry_mass_kg: f64,
        max_operating_mass_kg: f64,
        orbit: OrbitalState,
    ) -> Result<Self, PropulsionError> {
        ensure!(
            naif_id < 0,
            InvalidSpacecraftSnafu {
                reason: format!("NAIF ID must be negative, got {naif_id}"),
            }
        );
        ensure!(
            !name.trim().is_empty(),
            InvalidSpacecraftSnafu {
                reason: "name is empty",
            }
        );
        ensure!(
            dry_mass_kg > 0.0,
            InvalidSpacecraftSnafu {
                reason: format!("dry mass must be strictly positive, got {dry_mass_kg} kg"),
            }
        );
        ensure!(
            max_operating_mass_kg >= dry_mass_kg,
            InvalidSpacecraftSnafu {
                reason: format!(
                    "maximum operating mass ({max_operating_mass_kg} kg) is below the dry mass ({dry_mass_kg} kg)"
                ),
            }
        );
        Ok(Self {
            naif_id,
            name: name.to_string(),
            dry_mass_kg,
            max_operating_mass_kg,
            orbit,
            attitude: None,
            fuel_tanks: Vec::new(),
            engines: Vec::new(),
            payloads: Vec::new(),
            instruments: Vec::new(),
            maneuvers: Vec::new(),
            cursor: 0,
        })
    }

    pub fn naif_id(&self) -> i32 {
        self.naif_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dry_mass_kg(&self) -> f64 {
        self.dry_mass_kg
    }

    pub fn max_operating_mass_kg(&self) -> f64 {
        self.max_operating_mass_kg
    }

    /// Current orbit, updated as maneuvers complete
    pub fn orbit(&self) -> &OrbitalState {
        &self.orbit
    }

    /// Attitude set by the last attitude maneuver, if any
    pub fn attitude(&self) -> Option<&StateOrientation> {
        self.attitude.as_ref()
    }

    pub fn fuel_tanks(&self) -> &[FuelTank] {
        &self.fuel_tanks
    }

    pub fn engines(&self) -> &[Engine] {
        &self.engines
    }

    pub fn payloads(&self) -> &[Payload] {
        &self.payloads
    }

    pub fn instruments(&self) -> &[Instrument] {
        &self.instruments
    }

    pub fn add_fuel_tank(&mut self, tank: FuelTank) -> Result<(), PropulsionError> {
        tank.validate()?;
        ensure!(
            self.fuel_tank(&tank.serial_number).is_none(),
            DuplicateSnafu {
                component: "fuel tank",
                id: tank.serial_number.clone(),
            }
        );
        self.fuel_tanks.push(tank);
        Ok(())
    }

    /// Adds an engine, its fuel tank must already be on the spacecraft.
    pub fn add_engine(&mut self, engine: Engine) -> Result<(), PropulsionError> {
        engine.validate()?;
        ensure!(
            self.fuel_tank(&engine.fuel_tank_serial).is_some(),
            UnknownTankSnafu {
                engine: engine.serial_number.clone(),
                tank: engine.fuel_tank_serial.clone(),
            }
        );
        ensure!(
            self.engine(&engine.serial_number).is_none(),
            DuplicateSnafu {
                component: "engine",
                id: engine.serial_number.clone(),
            }
        );
        self.engines.push(engine);
        Ok(())
    }

    pub fn add_payload(&mut self, payload: Payload) -> Result<(), PropulsionError> {
        ensure!(
            payload.mass_kg >= 0.0,
            InvalidComponentSnafu {
                component: "payload",
                reason: format!("negative mass of {} kg", payload.mass_kg),
            }
        );
        ensure!(
            !self
                .payloads
                .iter()
                .any(|p| p.serial_number == payload.serial_number),
            DuplicateSnafu {
                component: "payload",
                id: payload.serial_number.clone(),
            }
        );
        self.payloads.push(payload);
        Ok(())
    }

    pub fn add_instrument(&mut self, instrument: Instrument) -> Result<(), PropulsionError> {
        ensure!(
            instrument.boresight.norm() > 0.0,
            InvalidComponentSnafu {
                component: "instrument",
                reason: format!("{} has a zero boresight", instrument.name),
            }
        );
        ensure!(
            self.instrument(instrument.naif_id).is_none(),
            DuplicateSnafu {
                component: "instrument",
                id: instrument.naif_id.to_string(),
            }
        );
        self.instruments.push(instrument);
        Ok(())
    }

    pub fn fuel_tank(&self, serial_number: &str) -> Option<&FuelTank> {
        self.fuel_tanks
            .iter()
            .find(|tank| tank.serial_number == serial_number)
    }

    pub(crate) fn fuel_tank_mut(&mut self, serial_number: &str) -> Option<&mut FuelTank> {
        self.fuel_tanks
            .iter_mut()
            .find(|tank| tank.serial_number == serial_number)
    }

    pub fn engine(&self, serial_number: &str) -> Option<&Engine> {
        self.engines
            .iter()
            .find(|engine| engine.serial_number == serial_number)
    }

    pub fn instrument(&self, naif_id: i32) -> Option<&Instrument> {
        self.instruments.iter().find(|i| i.naif_id == naif_id)
    }

    /// Engines whose tank still holds fuel
    fn active_engines(&self) -> impl Iterator<Item = &Engine> {
        self.engines.iter().filter(|engine| {
            self.fuel_tank(&engine.fuel_tank_serial)
                .map_or(false, |tank| !tank.is_empty())
        })
    }

    /// Dry mass, fuel and payloads, in kg
    pub fn total_mass_kg(&self) -> f64 {
        self.dry_mass_kg + self.total_fuel_kg() + self.payloads.iter().map(|p| p.mass_kg).sum::<f64>()
    }

    pub fn total_fuel_kg(&self) -> f64 {
        self.fuel_tanks.iter().map(|tank| tank.quantity_kg).sum()
    }

    /// Fuel flow of the engines which can still fire, in kg/s
    pub fn total_fuel_flow_kg_s(&self) -> f64 {
        self.active_engines().map(|e| e.fuel_flow_kg_s).sum()
    }

    /// Combined specific impulse of the engines which can still fire, zero if none can.
    pub fn total_isp_s(&self) -> f64 {
        let flow = self.total_fuel_flow_kg_s();
        if flow > 0.0 {
            self.active_engines().map(|e| e.thrust_n()).sum::<f64>() / STD_GRAVITY / flow
        } else {
            0.0
        }
    }
}

impl fmt::Display for Spacecraft {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{} ({})\ttotal mass = {:.3} kg (fuel = {:.3} kg)\t{}",
            self.name,
            self.naif_id,
            self.total_mass_kg(),
            self.total_fuel_kg(),
            self.orbit
        )
    }
}

#[cfg(test)]
mod ut_spacecraft {
    use super::*;
    use crate::cosmic::{CelestialBody, Frame};
    use crate::time::Epoch;
    use approx::assert_relative_eq;
    use std::sync::Arc;

    fn orbit() -> OrbitalState {
        let earth = Arc::new(CelestialBody::new(399, "Earth", 3.986e14, 6378e3, 6357e3));
        OrbitalState::keplerian(
            7000e3,
            0.0,
            0.5,
            0.0,
            0.0,
            0.0,
            earth,
            Epoch::from_gregorian_utc_at_midnight(2021, 1, 1),
            Frame::ICRF,
        )
        .unwrap()
    }

    #[test]
    fn tank_burns() {
        let mut tank = FuelTank::try_new("tank", "model", "ft1", 1000.0, 900.0).unwrap();
        tank.burn(100.0).unwrap();
        assert_eq!(tank.quantity_kg(), 800.0);
        let err = tank.burn(801.0).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InsufficientResource);
        assert_eq!(tank.quantity_kg(), 800.0);
        assert_eq!(tank.burn(-1.0).unwrap_err().kind(), ErrorKind::InvalidArgument);
        tank.burn(800.0).unwrap();
        assert!(tank.is_empty());

        assert!(FuelTank::try_new("tank", "model", "ft1", 1000.0, 1001.0).is_err());
        assert!(FuelTank::try_new("tank", "model", "ft1", 1000.0, -1.0).is_err());
    }

    #[test]
    fn engine_performance() {
        let engine = Engine::try_new("engine", "model", "e1", 450.0, 50.0, "ft1").unwrap();
        assert_relative_eq!(engine.thrust_n(), 450.0 * 9.80665 * 50.0);
        assert_relative_eq!(
            engine.fuel_for_delta_v_kg(1000.0, 100.0),
            1000.0 * (1.0 - (-100.0 / (450.0 * 9.80665_f64)).exp())
        );
        assert!(Engine::try_new("engine", "model", "e1", 0.0, 50.0, "ft1").is_err());
    }

    #[test]
    fn invalid_spacecraft() {
        assert!(Spacecraft::try_new(1, "sc", 1000.0, 3000.0, orbit()).is_err());
        assert!(Spacecraft::try_new(-1, " ", 1000.0, 3000.0, orbit()).is_err());
        assert!(Spacecraft::try_new(-1, "sc", 0.0, 3000.0, orbit()).is_err());
        let err = Spacecraft::try_new(-1, "sc", 1000.0, 900.0, orbit()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn registry() {
        let mut sc = Spacecraft::try_new(-1001, "sc", 1000.0, 3000.0, orbit()).unwrap();
        let engine = Engine::try_new("engine", "model", "e1", 450.0, 50.0, "ft1").unwrap();
        let err = sc.add_engine(engine.clone()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PreconditionFailed);

        sc.add_fuel_tank(FuelTank::try_new("tank", "model", "ft1", 1000.0, 900.0).unwrap())
            .unwrap();
        let err = sc
            .add_fuel_tank(FuelTank::try_new("tank", "model", "ft1", 1000.0, 900.0).unwrap())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PreconditionFailed);

        sc.add_engine(engine.clone()).unwrap();
        assert_eq!(sc.add_engine(engine).unwrap_err().kind(), ErrorKind::PreconditionFailed);

        sc.add_payload(Payload {
            name: "payload".to_string(),
            serial_number: "p1".to_string(),
            mass_kg: 50.0,
        })
        .unwrap();

        assert_eq!(sc.total_mass_kg(), 1950.0);
        assert_eq!(sc.total_fuel_kg(), 900.0);
        assert_eq!(sc.total_fuel_flow_kg_s(), 50.0);
        assert_relative_eq!(sc.total_isp_s(), 450.0, max_relative = 1e-12);

        sc.fuel_tank_mut("ft1").unwrap().burn(900.0).unwrap();
        assert_eq!(sc.total_fuel_flow_kg_s(), 0.0);
        assert_eq!(sc.total_isp_s(), 0.0);
    }
}
