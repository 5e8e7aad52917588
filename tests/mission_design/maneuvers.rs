use crate::{test_config, test_earth, test_ephemeris};
use approx::{assert_abs_diff_eq, assert_relative_eq};
use nyx::cosmic::{BodyAxis, Frame, OrbitalElements, OrbitalState, Spacecraft, SpacecraftConfig};
use nyx::io::ConfigRepr;
use nyx::md::{AttitudeTarget, ManeuverStatus};
use nyx::time::{Duration, Epoch, Unit};
use nyx::{ErrorKind, Maneuver, ManeuverKind};
use rstest::*;

fn epoch() -> Epoch {
    Epoch::from_gregorian_utc_at_midnight(2021, 3, 1)
}

#[fixture]
fn chaser() -> Spacecraft {
    let _ = pel::try_init();
    let orbit = OrbitalState::keplerian(
        7_000e3,
        0.0,
        0.5,
        0.3,
        0.0,
        1.0,
        test_earth(),
        epoch(),
        Frame::ICRF,
    )
    .unwrap();
    SpacecraftConfig::load(test_config("spacecraft.yaml"))
        .unwrap()
        .into_spacecraft(orbit)
        .unwrap()
}

fn both_engines() -> Vec<String> {
    vec!["eng2".to_string(), "eng1".to_string()]
}

#[rstest]
fn engine_selection_in_order(mut chaser: Spacecraft) {
    assert_relative_eq!(chaser.total_mass_kg(), 1870.0);

    // A small burn fits in the backup tank
    chaser.add_maneuver(
        Maneuver::new(
            epoch(),
            Unit::Hour * 1.0,
            both_engines(),
            ManeuverKind::ApogeeHeight {
                target_apogee_radius_m: 7_020e3,
            },
        )
        .unwrap(),
    );
    // A large one does not
    chaser.add_maneuver(
        Maneuver::new(
            epoch(),
            Unit::Day * 1.0,
            both_engines(),
            ManeuverKind::ApogeeHeight {
                target_apogee_radius_m: 9_000e3,
            },
        )
        .unwrap(),
    );

    let service = test_ephemeris();
    let small = chaser.plan_next(&service).unwrap();
    assert_eq!(small.engine_serial.as_deref(), Some("eng2"));
    // Thrust window from the flow of the backup engine
    assert_abs_diff_eq!(
        small.thrust_window.length().to_seconds(),
        small.fuel_burned_kg / 5.0,
        epsilon = 1e-6
    );
    chaser.execute_next().unwrap();
    assert_relative_eq!(
        chaser.fuel_tank("ft2").unwrap().quantity_kg(),
        20.0 - small.fuel_burned_kg,
        max_relative = 1e-12
    );
    assert_eq!(chaser.fuel_tank("ft1").unwrap().quantity_kg(), 800.0);

    let large = chaser.plan_next(&service).unwrap();
    assert_eq!(large.engine_serial.as_deref(), Some("eng1"));
    chaser.execute_next().unwrap();
    assert_relative_eq!(chaser.orbit().apoapsis_m(), 9_000e3, max_relative = 1e-6);
    assert_relative_eq!(
        chaser.total_fuel_kg(),
        820.0 - small.fuel_burned_kg - large.fuel_burned_kg,
        max_relative = 1e-12
    );
    for maneuver in chaser.maneuvers().values() {
        assert_eq!(maneuver.status(), ManeuverStatus::Done);
    }
}

#[rstest]
fn transfer_then_point_the_camera(mut chaser: Spacecraft) {
    chaser.add_maneuver(
        Maneuver::new(
            epoch(),
            Unit::Hour * 1.0,
            both_engines(),
            ManeuverKind::ApogeeHeight {
                target_apogee_radius_m: 10_000e3,
            },
        )
        .unwrap(),
    );
    chaser.add_maneuver(
        Maneuver::new(
            epoch(),
            Unit::Day * 1.0,
            both_engines(),
            ManeuverKind::PerigeeHeight {
                target_perigee_radius_m: 10_000e3,
            },
        )
        .unwrap(),
    );
    chaser.add_maneuver(
        Maneuver::new(
            epoch(),
            Unit::Day * 2.0,
            Vec::new(),
            ManeuverKind::Attitude(AttitudeTarget::Nadir),
        )
        .unwrap(),
    );
    chaser.add_maneuver(
        Maneuver::new(
            epoch(),
            Unit::Day * 2.0,
            Vec::new(),
            ManeuverKind::Attitude(AttitudeTarget::InstrumentPointing {
                instrument_id: -1001600,
                target_id: 10,
            }),
        )
        .unwrap(),
    );

    let plans = chaser.execute_chain(&test_ephemeris()).unwrap();
    assert_eq!(plans.len(), 4);
    for pair in plans.windows(2) {
        assert!(pair[0].epoch <= pair[1].epoch);
    }
    assert_relative_eq!(chaser.orbit().sma_m(), 10_000e3, max_relative = 1e-6);
    assert!(chaser.orbit().ecc() < 1e-6);

    // Both attitude maneuvers are instantaneous and burn nothing
    for plan in &plans[2..] {
        assert!(plan.thrust_window.is_instant());
        assert_eq!(plan.fuel_burned_kg, 0.0);
    }
    let nadir = plans[2].attitude.axis_in_frame(BodyAxis::Front);
    assert_abs_diff_eq!(
        nadir,
        -chaser.orbit().radius_m().normalize(),
        epsilon = 1e-9
    );
    assert!(chaser.attitude().is_some());
    assert!(chaser.standby_maneuver().is_none());
}

#[rstest]
fn not_enough_fuel_in_any_tank(mut chaser: Spacecraft) {
    chaser.add_maneuver(
        Maneuver::new(
            epoch(),
            Unit::Hour * 1.0,
            both_engines(),
            ManeuverKind::ApogeeHeight {
                target_apogee_radius_m: 400_000e3,
            },
        )
        .unwrap(),
    );
    let err = chaser.execute_chain(&test_ephemeris()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InsufficientResource);
    assert_eq!(chaser.total_fuel_kg(), 820.0);
    assert_eq!(
        chaser.standby_maneuver().unwrap().status(),
        ManeuverStatus::Pending
    );

    // Cannot execute a maneuver which failed to plan
    assert_eq!(
        chaser.execute_next().unwrap_err().kind(),
        ErrorKind::PreconditionFailed
    );

    // Unknown engines cannot be selected
    let mut fresh = SpacecraftConfig::load(test_config("spacecraft.yaml"))
        .unwrap()
        .into_spacecraft(chaser.orbit().clone())
        .unwrap();
    fresh.add_maneuver(
        Maneuver::new(
            epoch(),
            Duration::ZERO,
            vec!["eng9".to_string()],
            ManeuverKind::ApogeeHeight {
                target_apogee_radius_m: 7_100e3,
            },
        )
        .unwrap(),
    );
    let err = fresh.plan_next(&test_ephemeris()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::PreconditionFailed);
}
