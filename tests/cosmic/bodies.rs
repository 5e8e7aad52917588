use crate::{test_config, test_ephemeris};
use approx::assert_relative_eq;
use nyx::cosmic::{
    AnalyticEphemeris, Bodies, CelestialBody, EphemerisService, Frame, OrbitalElements,
};
use nyx::time::Epoch;
use nyx::ErrorKind;

#[test]
fn spheres_of_influence_from_yaml() {
    let _ = pel::try_init();
    let service = AnalyticEphemeris::load(test_config("bodies.yaml")).unwrap();
    assert_eq!(service.naif_ids(), vec![10, 399, 2000004]);

    let epoch = Epoch::from_gregorian_utc_at_midnight(2022, 3, 1);
    let vesta = CelestialBody::load(&service, 2000004, epoch).unwrap();
    assert_eq!(vesta.name, "Vesta");
    assert_relative_eq!(vesta.sphere_of_influence_m(), 39_268_110.66, max_relative = 1e-4);
    let orbit = vesta.orbit().unwrap();
    assert_eq!(orbit.center().naif_id, 10);
    assert_eq!(orbit.frame(), Frame::ICRF);
    // The Sun has no primary
    assert_eq!(orbit.center().sphere_of_influence_m(), f64::INFINITY);
    assert!(orbit.center().orbit().is_none());

    let earth = CelestialBody::load(&service, 399, epoch).unwrap();
    assert_relative_eq!(earth.sphere_of_influence_m(), 924_649_202.46, max_relative = 1e-4);

    // No orientation was configured for the Earth
    let err = service
        .frame_transform(Frame::BodyFixed(399), Frame::ICRF, epoch)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::External);
}

#[test]
fn default_bodies() {
    let service = test_ephemeris();
    for body in [Bodies::Sun, Bodies::Earth, Bodies::Moon, Bodies::Mars] {
        let constants = service.body_constants(body.naif_id()).unwrap();
        assert_eq!(constants.naif_id, body.naif_id());
    }
    let epoch = Epoch::from_gregorian_utc_at_midnight(2022, 3, 1);
    let moon = CelestialBody::load(&service, 301, epoch).unwrap();
    assert_eq!(moon.orbit().unwrap().center().naif_id, 399);
    // The Moon's sphere of influence is about 66 thousand kilometers
    assert_relative_eq!(moon.sphere_of_influence_m(), 66_000e3, max_relative = 0.1);

    let err = CelestialBody::from_service(&service, 2000004).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::External);
}
