use crate::{test_config, test_earth};
use approx::assert_relative_eq;
use nyx::cosmic::{
    Engine, FuelTank, OrbitalState, Payload, PropulsionError, Spacecraft, SpacecraftConfig,
};
use nyx::io::ConfigRepr;
use nyx::time::Epoch;
use nyx::{ErrorKind, Frame};
use rstest::*;

fn orbit() -> OrbitalState {
    OrbitalState::keplerian(
        7_000e3,
        0.001,
        0.5,
        0.3,
        0.2,
        1.0,
        test_earth(),
        Epoch::from_gregorian_utc_at_midnight(2021, 3, 1),
        Frame::ICRF,
    )
    .unwrap()
}

#[fixture]
fn config() -> SpacecraftConfig {
    let _ = pel::try_init();
    SpacecraftConfig::load(test_config("spacecraft.yaml")).unwrap()
}

#[rstest]
fn mass_and_performance(config: SpacecraftConfig) {
    let mut sc = config.into_spacecraft(orbit()).unwrap();
    assert_eq!(sc.naif_id(), -1001);
    assert_eq!(sc.engines().len(), 2);
    assert_eq!(sc.payloads().len(), 1);
    assert_eq!(sc.instrument(-1001600).unwrap().name, "camera");

    assert_relative_eq!(sc.total_fuel_kg(), 820.0);
    assert_relative_eq!(sc.total_mass_kg(), 1870.0);
    assert_relative_eq!(sc.total_fuel_flow_kg_s(), 55.0);
    assert_relative_eq!(sc.total_isp_s(), 24_000.0 / 55.0, max_relative = 1e-12);

    let mut heavier = sc.clone();
    heavier
        .add_payload(Payload {
            name: "ballast".to_string(),
            serial_number: "pl2".to_string(),
            mass_kg: 10.0,
        })
        .unwrap();
    assert_relative_eq!(heavier.total_mass_kg(), 1880.0);

    let tank = sc.fuel_tanks().iter().position(|t| t.serial_number == "ft2");
    assert_eq!(tank, Some(1));
    let err = sc
        .add_fuel_tank(FuelTank::try_new("dup", "FT", "ft2", 10.0, 1.0).unwrap())
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::PreconditionFailed);
    // Engines on an empty tank do not count
    sc.add_fuel_tank(FuelTank::try_new("empty", "FT", "ft3", 10.0, 0.0).unwrap())
        .unwrap();
    sc.add_engine(Engine::try_new("dry engine", "E", "eng3", 200.0, 1.0, "ft3").unwrap())
        .unwrap();
    assert_relative_eq!(sc.total_fuel_flow_kg_s(), 55.0);
    assert_relative_eq!(sc.total_isp_s(), 24_000.0 / 55.0, max_relative = 1e-12);
}

#[rstest]
fn registry_rules(config: SpacecraftConfig) {
    let mut sc = config.clone().into_spacecraft(orbit()).unwrap();

    let err = sc
        .add_engine(Engine::try_new("orphan", "E", "eng9", 300.0, 1.0, "ft9").unwrap())
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::PreconditionFailed);
    assert!(matches!(err, PropulsionError::UnknownTank { .. }));

    let err = sc
        .add_engine(Engine::try_new("again", "E", "eng1", 300.0, 1.0, "ft1").unwrap())
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::PreconditionFailed);

    let err = sc
        .add_payload(Payload {
            name: "again".to_string(),
            serial_number: "pl1".to_string(),
            mass_kg: 1.0,
        })
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::PreconditionFailed);
    assert_eq!(sc.engines().len(), 2);
    assert_eq!(sc.payloads().len(), 1);

    // Engines need their tank
    let mut tankless = config;
    tankless.fuel_tanks.clear();
    assert_eq!(
        tankless.into_spacecraft(orbit()).unwrap_err().kind(),
        ErrorKind::PreconditionFailed
    );

    let err = Spacecraft::try_new(1001, "chaser", 1000.0, 3000.0, orbit()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    let err = Spacecraft::try_new(-1001, "chaser", 1000.0, 900.0, orbit()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
}

#[test]
fn failed_burns_leave_the_tank_unchanged() {
    let mut tank = FuelTank::try_new("main", "FT-800", "ft1", 1000.0, 800.0).unwrap();
    let err = tank.burn(800.5).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InsufficientResource);
    assert_eq!(tank.quantity_kg(), 800.0);
    let err = tank.burn(-0.5).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    assert_eq!(tank.quantity_kg(), 800.0);
    tank.burn(799.5).unwrap();
    assert_relative_eq!(tank.quantity_kg(), 0.5);
    assert!(!tank.is_empty());
}
