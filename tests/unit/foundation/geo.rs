use super::*;

#[test]
fn haversine_one_degree_of_latitude() {
    let d = haversine_distance_m(0.0, 0.0, 1.0, 0.0);
    assert!((d - 111_194.9).abs() < 1.0, "got {d}");
    assert_eq!(haversine_distance_m(10.0, 20.0, 10.0, 20.0), 0.0);
}

#[test]
fn bearing_cardinal_directions() {
    assert!((initial_bearing_deg(0.0, 0.0, 1.0, 0.0) - 0.0).abs() < 1e-9);
    assert!((initial_bearing_deg(0.0, 0.0, 0.0, 1.0) - 90.0).abs() < 1e-9);
    assert!((initial_bearing_deg(0.0, 0.0, -1.0, 0.0) - 180.0).abs() < 1e-9);
    assert!((initial_bearing_deg(0.0, 0.0, 0.0, -1.0) - 270.0).abs() < 1e-9);
}

#[test]
fn lerp_endpoints_are_exact() {
    assert_eq!(lerp(1.25, 7.5, 0.0), 1.25);
    assert_eq!(lerp(2.0, 4.0, 0.5), 3.0);
}
