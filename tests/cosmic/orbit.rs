use crate::{test_earth, test_ephemeris};
use approx::{assert_abs_diff_eq, assert_relative_eq};
use nyx::cosmic::{Frame, OrbitalElements, OrbitalState, TimeTagged};
use nyx::linalg::Vector3;
use nyx::time::{Epoch, Unit};
use nyx::ErrorKind;
use rstest::*;
use std::f64::consts::PI;

fn epoch() -> Epoch {
    Epoch::from_gregorian_utc_at_midnight(2021, 6, 2)
}

#[rstest]
#[case(7_000e3, 0.001, 0.5, 0.3, 0.2, 1.0)]
#[case(6_803_376.217, 4.93e-5, 0.901_328, 6.161_556, 5.600_333, 0.684_797)]
#[case(24_396e3, 0.73, 0.12, 4.1, 3.3, 2.5)]
#[case(42_164e3, 0.0002, 0.001, 1.2, 0.7, 5.9)]
#[case(10_000e3, 0.5, 2.5, 0.8, 1.8, 3.0)]
fn keplerian_state_vector_round_trip(
    #[case] sma_m: f64,
    #[case] ecc: f64,
    #[case] inc_rad: f64,
    #[case] raan_rad: f64,
    #[case] aop_rad: f64,
    #[case] ma_rad: f64,
) {
    let _ = pel::try_init();
    let kep = OrbitalState::keplerian(
        sma_m,
        ecc,
        inc_rad,
        raan_rad,
        aop_rad,
        ma_rad,
        test_earth(),
        epoch(),
        Frame::ICRF,
    )
    .unwrap();
    let sv = OrbitalState::StateVector(kep.to_state_vector());
    let back = sv.to_keplerian().unwrap();

    assert_relative_eq!(back.sma_m(), sma_m, max_relative = 1e-6);
    assert_relative_eq!(back.ecc(), ecc, max_relative = 1e-6);
    assert_relative_eq!(back.inc_rad(), inc_rad, max_relative = 1e-6);
    assert_relative_eq!(back.raan_rad(), raan_rad, max_relative = 1e-6);
    assert_relative_eq!(back.aop_rad(), aop_rad, max_relative = 1e-6);
    assert_relative_eq!(back.ma_rad(), ma_rad, max_relative = 1e-6);
    assert_eq!(back.epoch(), epoch());
    assert_eq!(back.frame(), Frame::ICRF);

    // Equinoctial elements describe the same state
    let equinoctial = OrbitalState::Equinoctial(kep.to_equinoctial().unwrap());
    assert_abs_diff_eq!(equinoctial.radius_m(), kep.radius_m(), epsilon = 1e-4);
    assert_abs_diff_eq!(equinoctial.velocity_m_s(), kep.velocity_m_s(), epsilon = 1e-7);
}

#[test]
fn circular_orbit_apsides() {
    let circ = OrbitalState::keplerian(
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
    assert!(circ.is_circular());
    assert_relative_eq!(circ.perigee_vector().norm(), 7_000e3, max_relative = 1e-12);
    assert_relative_eq!(circ.apogee_vector().norm(), 7_000e3, max_relative = 1e-12);
    assert_relative_eq!(
        circ.perigee_velocity_m_s(),
        circ.apogee_velocity_m_s(),
        max_relative = 1e-12
    );
}

#[test]
fn propagation_over_one_period() {
    let _ = pel::try_init();
    let orbit = OrbitalState::cartesian(
        Vector3::new(-2_436.45e3, -2_436.45e3, 6_891.037e3),
        Vector3::new(5_088.611, -5_088.611, 0.0),
        test_earth(),
        epoch(),
        Frame::ICRF,
    )
    .unwrap();
    let period = orbit.period().unwrap();
    let later = orbit.at_epoch(epoch() + period).unwrap();
    assert_eq!(later.representation(), "Keplerian");
    assert_abs_diff_eq!(later.radius_m(), orbit.radius_m(), epsilon = 5e-2);
    assert_abs_diff_eq!(later.velocity_m_s(), orbit.velocity_m_s(), epsilon = 1e-4);

    // Half a period later, the satellite is on the other side of the orbit
    let half = orbit.at_epoch(epoch() + period * 0.5).unwrap();
    let delta_ma = nyx::utils::between_0_tau(half.ma_rad() - orbit.ma_rad());
    assert_abs_diff_eq!(delta_ma, PI, epsilon = 1e-9);

    // Propagating backwards
    let before = orbit.at_epoch(epoch() - Unit::Hour * 1.0).unwrap();
    let back = before.at_epoch(epoch()).unwrap();
    assert_abs_diff_eq!(back.radius_m(), orbit.radius_m(), epsilon = 1e-3);
}

#[test]
fn state_equality() {
    let make = |ma: f64| {
        OrbitalState::keplerian(
            7_000e3,
            0.01,
            0.5,
            0.3,
            0.2,
            ma,
            test_earth(),
            epoch(),
            Frame::ICRF,
        )
        .unwrap()
    };
    assert_eq!(make(1.0), make(1.0));
    assert_ne!(make(1.0), make(1.1));
    let other_frame = OrbitalState::keplerian(
        7_000e3,
        0.01,
        0.5,
        0.3,
        0.2,
        1.0,
        test_earth(),
        epoch(),
        Frame::EclipJ2000,
    )
    .unwrap();
    assert_ne!(make(1.0), other_frame);
}

#[test]
fn frame_transformation_round_trip() {
    let service = test_ephemeris();
    let orbit = OrbitalState::keplerian(
        7_000e3,
        0.01,
        0.5,
        0.3,
        0.2,
        1.0,
        test_earth(),
        epoch(),
        Frame::ICRF,
    )
    .unwrap();
    let fixed = orbit.to_frame(Frame::BodyFixed(399), &service).unwrap();
    assert_eq!(fixed.frame(), Frame::BodyFixed(399));
    // Rotations keep the norm of the position
    assert_relative_eq!(
        fixed.radius_m().norm(),
        orbit.radius_m().norm(),
        max_relative = 1e-12
    );
    let back = fixed.to_frame(Frame::ICRF, &service).unwrap();
    assert_abs_diff_eq!(back.radius_m(), orbit.radius_m(), epsilon = 1e-6);
    assert_abs_diff_eq!(back.velocity_m_s(), orbit.velocity_m_s(), epsilon = 1e-9);

    // Same frame is a no-op
    assert_eq!(orbit.to_frame(Frame::ICRF, &service).unwrap(), orbit);
}

#[test]
fn invalid_states() {
    let err = OrbitalState::keplerian(
        -7_000e3,
        0.01,
        0.5,
        0.3,
        0.2,
        1.0,
        test_earth(),
        epoch(),
        Frame::ICRF,
    )
    .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);

    let err = OrbitalState::cartesian(
        Vector3::zeros(),
        Vector3::new(1.0, 0.0, 0.0),
        test_earth(),
        epoch(),
        Frame::ICRF,
    )
    .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
}

#[test]
fn body_ephemeris() {
    let service = test_ephemeris();
    let earth = test_earth();
    let moon = nyx::cosmic::CelestialBody::from_service(&service, 301).unwrap();
    let state = moon
        .ephemeris(
            &service,
            epoch(),
            &earth,
            Frame::ICRF,
            nyx::cosmic::Aberration::None,
        )
        .unwrap();
    // The Moon stays between its perigee and apogee distances
    let distance = state.radius_m().norm();
    assert!(distance > 356_000e3 && distance < 407_000e3, "{distance}");
    assert_relative_eq!(state.sma_m(), 384_400e3, max_relative = 0.05);
}
