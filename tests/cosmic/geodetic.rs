use crate::{test_config, test_earth, test_ephemeris};
use approx::{assert_abs_diff_eq, assert_relative_eq};
use nyx::cosmic::{Frame, Geodetic, OrbitalElements, Site, AU};
use nyx::io::ConfigRepr;
use nyx::time::Epoch;
use rstest::*;

#[fixture]
fn sites() -> Vec<Site> {
    let _ = pel::try_init();
    Site::load_many(test_config("sites.yaml")).unwrap()
}

#[rstest]
fn deep_space_network(sites: Vec<Site>) {
    assert_eq!(sites.len(), 3);
    assert!(sites.iter().all(|site| site.body_id == 399));
    assert_eq!(sites[0].name, "DSS-65 Madrid");
    assert_relative_eq!(sites[2].height_m, 1071.149);

    let earth = test_earth();
    for site in &sites {
        let fixed = site.body_fixed_position(&earth).unwrap();
        // Every site is close to the surface
        assert!((fixed.norm() - 6_370e3).abs() < 15e3, "{site}: {}", fixed.norm());
        let geodetic = Geodetic::from_body_fixed(&fixed, &earth);
        assert_abs_diff_eq!(
            geodetic.latitude_rad.to_degrees(),
            site.latitude_deg,
            epsilon = 1e-9
        );
        assert_abs_diff_eq!(geodetic.height_m, site.height_m, epsilon = 1e-5);
    }
}

#[rstest]
fn sun_from_madrid(sites: Vec<Site>) {
    let service = test_ephemeris();
    let madrid = &sites[0];

    // Local noon, close to the summer solstice
    let noon = Epoch::from_gregorian_utc_hms(2021, 6, 21, 12, 17, 0);
    let sun = madrid.horizontal_coordinates(10, noon, &service).unwrap();
    assert!(sun.elevation_rad.to_degrees() > 65.0, "{sun:?}");
    assert_relative_eq!(sun.range_m, AU, max_relative = 0.02);
    // The Sun is due South
    assert_abs_diff_eq!(sun.azimuth_rad.to_degrees(), 180.0, epsilon = 15.0);

    let midnight = Epoch::from_gregorian_utc_hms(2021, 6, 21, 0, 17, 0);
    let sun = madrid
        .horizontal_coordinates(10, midnight, &service)
        .unwrap();
    assert!(sun.elevation_rad.to_degrees() < -20.0, "{sun:?}");
}

#[rstest]
fn inertial_site_state(sites: Vec<Site>) {
    let service = test_ephemeris();
    let epoch = Epoch::from_gregorian_utc_at_midnight(2021, 6, 21);
    let canberra = sites[1].state_at(epoch, &service).unwrap();
    assert_eq!(canberra.frame(), Frame::ICRF);
    assert_eq!(canberra.center().naif_id, 399);
    assert_relative_eq!(
        canberra.radius_m().norm(),
        sites[1].body_fixed_position(&test_earth()).unwrap().norm(),
        max_relative = 1e-12
    );
    // The site turns with the Earth
    let speed = canberra.velocity_m_s().norm();
    let expected = 7.292_115e-5 * 6_378e3 * sites[1].latitude_deg.to_radians().cos();
    assert_relative_eq!(speed, expected, max_relative = 0.01);
}
