use crate::{test_config, test_earth, test_ephemeris};
use approx::assert_abs_diff_eq;
use nyx::cosmic::{Frame, OrbitalState, Site, Window};
use nyx::io::dto::LaunchWindowsDto;
use nyx::io::ConfigRepr;
use nyx::linalg::Vector3;
use nyx::md::{LaunchDirection, LaunchSite, LaunchTarget};
use nyx::time::{Epoch, Unit};
use nyx::Launch;
use rstest::*;
use std::collections::BTreeMap;

#[fixture]
fn launch_sites() -> BTreeMap<String, LaunchSite> {
    let _ = pel::try_init();
    LaunchSite::load_named(test_config("launch_sites.yaml")).unwrap()
}

fn iss() -> OrbitalState {
    OrbitalState::cartesian(
        Vector3::new(
            -1.144_243_683_349_977e6,
            4.905_086_030_671_815e6,
            4.553_416_875_193_589e6,
        ),
        Vector3::new(
            -5.588_288_926_819_989e3,
            -4.213_222_250_603_758e3,
            3.126_518_392_859_475e3,
        ),
        test_earth(),
        Epoch::from_gregorian_utc_at_midnight(2021, 6, 2),
        Frame::ICRF,
    )
    .unwrap()
}

fn one_day() -> Window {
    Window::from_length(
        Epoch::from_gregorian_utc_at_midnight(2021, 6, 2),
        Unit::Day * 1.0,
    )
}

fn launch_from(site: &LaunchSite) -> Launch {
    Launch::builder()
        .launch_site(site.clone())
        .recovery_site(site.site.clone())
        .target(LaunchTarget::Orbit(iss()))
        .build()
}

#[rstest]
fn launch_sites_from_yaml(launch_sites: BTreeMap<String, LaunchSite>) {
    assert_eq!(launch_sites.len(), 3);
    let cape = &launch_sites["cape"];
    assert_eq!(cape.site.name, "Cape Canaveral");
    assert_eq!(cape.site.body_id, 399);
    assert_eq!(cape.azimuth_ranges.len(), 1);
    let kourou = &launch_sites["kourou"];
    // The first range wraps around North
    assert!(kourou.allows(0.0));
    assert!(kourou.allows(6.2));
    assert!(kourou.allows(3.0));
    assert!(!kourou.allows(2.0));
    assert!(!kourou.allows(4.0));
}

#[rstest]
fn iss_from_cape_canaveral(launch_sites: BTreeMap<String, LaunchSite>) {
    let service = test_ephemeris();
    let windows = launch_from(&launch_sites["cape"])
        .find_launch_windows(one_day(), &service)
        .unwrap();
    assert_eq!(windows.len(), 2);
    let southbound = Epoch::from_gregorian_utc(2021, 6, 2, 2, 51, 27, 846_000_000);
    assert!((windows[0].epoch() - southbound).abs() < Unit::Millisecond * 500);
    assert_abs_diff_eq!(
        windows[0].inertial_azimuth_rad.to_degrees(),
        135.195_039,
        epsilon = 1e-4
    );
    let northbound = Epoch::from_gregorian_utc(2021, 6, 2, 18, 11, 8, 617_000_000);
    assert!((windows[1].epoch() - northbound).abs() < Unit::Second * 1);

    let dto = LaunchWindowsDto::new(windows.clone());
    assert!(!dto.has_error());
    assert_eq!(dto.windows, windows);
    let yaml = serde_yaml::to_string(&dto).unwrap();
    let back: LaunchWindowsDto = serde_yaml::from_str(&yaml).unwrap();
    assert_eq!(back.windows.len(), 2);
    assert_abs_diff_eq!(
        back.windows[1].non_inertial_azimuth_rad,
        windows[1].non_inertial_azimuth_rad,
        epsilon = 1e-12
    );
}

#[rstest]
fn iss_from_the_southern_pad(launch_sites: BTreeMap<String, LaunchSite>) {
    let service = test_ephemeris();
    let windows = launch_from(&launch_sites["south"])
        .find_launch_windows(one_day(), &service)
        .unwrap();
    assert_eq!(windows.len(), 2);
    let first = &windows[0];
    let expected = Epoch::from_gregorian_utc(2021, 6, 2, 8, 56, 2, 65_000_000);
    assert!((first.epoch() - expected).abs() < Unit::Second * 1);
    assert_abs_diff_eq!(first.inertial_azimuth_rad.to_degrees(), 124.857_236, epsilon = 1e-4);
    assert_abs_diff_eq!(first.non_inertial_azimuth_rad.to_degrees(), 126.416_927, epsilon = 1e-4);
    assert_abs_diff_eq!(first.non_inertial_insertion_velocity_m_s, 7381.309_245, epsilon = 1e-3);
    assert_abs_diff_eq!(windows[1].inertial_azimuth_rad.to_degrees(), 55.142_764, epsilon = 1e-4);
}

#[rstest]
fn kourou_azimuth_ranges(launch_sites: BTreeMap<String, LaunchSite>) {
    let service = test_ephemeris();
    let launch = launch_from(&launch_sites["kourou"]);
    // Southbound launches head to the open sea, outside of the allowed ranges
    let windows = launch.find_launch_windows(one_day(), &service).unwrap();
    assert_eq!(windows.len(), 1);
    assert_abs_diff_eq!(
        windows[0].inertial_azimuth_rad.to_degrees(),
        38.454_547,
        epsilon = 1e-3
    );

    let descending = Launch::builder()
        .launch_site(launch_sites["kourou"].clone())
        .recovery_site(Site::on_earth("Atlantic", -40.0, 10.0, 0.0).unwrap())
        .target(LaunchTarget::Orbit(iss()))
        .direction(LaunchDirection::Descending)
        .build();
    assert!(descending
        .find_launch_windows(one_day(), &service)
        .unwrap()
        .is_empty());
}

#[rstest]
fn failed_search_fills_the_error(launch_sites: BTreeMap<String, LaunchSite>) {
    let service = test_ephemeris();
    let launch = Launch::builder()
        .launch_site(launch_sites["cape"].clone())
        .recovery_site(launch_sites["cape"].site.clone())
        .target(LaunchTarget::Body(-42))
        .build();
    let dto: LaunchWindowsDto = launch.find_launch_windows(one_day(), &service).into();
    assert!(dto.has_error());
    assert!(dto.windows.is_empty());
}
