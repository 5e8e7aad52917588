use crate::test_earth;
use approx::{assert_abs_diff_eq, assert_relative_eq};
use nyx::cosmic::{Frame, OrbitalElements, OrbitalState, TimeTagged};
use nyx::time::Unit;
use nyx::ErrorKind;

const ISS_L1: &str = "1 25544U 98067A   21020.53488036  .00016717  00000-0  10270-3 0  9054";
const ISS_L2: &str = "2 25544  51.6423 353.0312 0000493 320.8755  39.2360 15.49309423 25703";

#[test]
fn iss_tle() {
    let _ = pel::try_init();
    let iss = OrbitalState::from_tle("ISS (ZARYA)", ISS_L1, ISS_L2, test_earth()).unwrap();
    assert_eq!(iss.representation(), "TLE");
    assert_eq!(iss.frame(), Frame::ICRF);
    assert_relative_eq!(iss.sma_m(), 6_803_376.217, max_relative = 1e-6);
    assert_abs_diff_eq!(iss.ecc(), 4.93e-5, epsilon = 1e-12);
    assert_abs_diff_eq!(iss.inc_rad(), 0.901_328, epsilon = 1e-6);

    // The SGP4 state at the TLE epoch is at the altitude of the station
    let altitude_m = iss.to_state_vector().radius_m().norm() - 6_378_136.6;
    assert!(altitude_m > 380e3 && altitude_m < 460e3, "{altitude_m}");

    let later = iss.at_epoch(iss.epoch() + Unit::Day * 1.0).unwrap();
    assert_eq!(later.representation(), "Keplerian");
    assert_eq!(later.epoch(), iss.epoch() + Unit::Day * 1.0);
    assert_relative_eq!(later.sma_m(), 6_790e3, max_relative = 0.01);
    assert_abs_diff_eq!(later.inc_rad(), iss.inc_rad(), epsilon = 1e-2);
}

#[test]
fn invalid_tle() {
    for (name, l1, l2) in [
        ("", ISS_L1, ISS_L2),
        ("ISS", "", ISS_L2),
        ("ISS", ISS_L1, ""),
        ("ISS", ISS_L2, ISS_L1),
    ] {
        let err = OrbitalState::from_tle(name, l1, l2, test_earth()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }
}
