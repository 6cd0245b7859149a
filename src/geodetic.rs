use nalgebra::Vector3;

use crate::error::IngestError;

/// WGS84 semi-major axis, meters.
pub const SEMI_MAJOR_AXIS: f64 = 6.378137e6;
/// WGS84 first eccentricity.
pub const ECCENTRICITY: f64 = 0.0818191908425;

/// Convert a batch of ECEF points to geodetic `(lat deg, lon deg, alt m)`.
///
/// Output is index-aligned with the input. Any point falling inside the
/// degenerate region aborts the whole batch with
/// [`IngestError::NumericRange`]; no partial result is returned.
pub fn lla_from_ecef(points: &[Vector3<f64>]) -> Result<Vec<(f64, f64, f64)>, IngestError> {
    let mut out = Vec::with_capacity(points.len());
    for (index, p) in points.iter().enumerate() {
        match lla_from_ecef_point(p.x, p.y, p.z) {
            Some(lla) => out.push(lla),
            None => return Err(IngestError::NumericRange { index }),
        }
    }
    Ok(out)
}

/// Closed-form solution of the depressed quartic tying the geodetic
/// latitude to an ECEF point, with one Newton polish of the selected root.
///
/// Returns `None` when the discriminant-like term `H` drops below `Hmin`,
/// i.e. the point sits too close to the singular geometry near the Earth's
/// center for this form to hold.
fn lla_from_ecef_point(x: f64, y: f64, z: f64) -> Option<(f64, f64, f64)> {
    let a = SEMI_MAJOR_AXIS;
    let e = ECCENTRICITY;
    let l = e * e / 2.0;
    let h_min = e.powi(12) / 4.0;

    let w2 = x * x + y * y;
    let m = w2 / (a * a);
    let n = z * z * (1.0 - e * e) / (a * a);
    let p = (m + n - 4.0 * l * l) / 6.0;
    let g = m * n * l * l;
    let h = 2.0 * p * p * p + g;
    if h < h_min {
        return None;
    }

    let c = (h + g + 2.0 * (h * g).sqrt()).powf(1.0 / 3.0) / 2f64.powf(1.0 / 3.0);
    let i = -(2.0 * l * l + m + n) / 2.0;
    let p2 = p * p;
    let beta = i / 3.0 - c - p2 / c;
    let k = l * l * (l * l - m - n);

    // Sign-selected combination of nested square roots, keyed on m - n.
    let t = ((beta * beta - k).sqrt() - (beta + i) / 2.0).sqrt()
        - ((beta - i) / 2.0).abs().sqrt().copysign(m - n);

    // Single Newton correction of the quartic root.
    let f = t * t * t * t + 2.0 * i * t * t + 2.0 * l * (m - n) * t + k;
    let df = 4.0 * t * t * t + 4.0 * i * t + 2.0 * l * (m - n);
    let dt = -f / df;

    let u = t + dt + l;
    let v = t + dt - l;
    let w = w2.sqrt();
    let lat_rad = (z * u).atan2(w * v);

    let dw = w * (1.0 - 1.0 / u);
    // z is large while the parenthesized factor sits next to 1; keep this
    // expression exactly in this form, rearranging changes the rounding.
    let dz = z - z * ((1.0 - e * e) / v);

    let alt = (dw * dw + dz * dz).sqrt().copysign(u - 1.0);
    let lon_rad = y.atan2(x);

    Some((lat_rad.to_degrees(), lon_rad.to_degrees(), alt))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use nav_types::{ECEF, WGS84};

    #[test]
    fn test_round_trip_against_reference() {
        let cases = [
            (45.0, 9.0, 250.0),
            (-21.1, 55.5, 100.0),
            (0.0, 0.0, 0.0),
            (70.3, -150.0, 30.0),
            (-33.9, 18.4, 5000.0),
        ];
        for (lat, lon, alt) in cases {
            let ecef = ECEF::from(WGS84::from_degrees_and_meters(lat, lon, alt));
            let (got_lat, got_lon, got_alt) =
                lla_from_ecef_point(ecef.x(), ecef.y(), ecef.z()).unwrap();
            assert_abs_diff_eq!(got_lat, lat, epsilon = 1e-6);
            assert_abs_diff_eq!(got_lon, lon, epsilon = 1e-6);
            assert_abs_diff_eq!(got_alt, alt, epsilon = 1e-2);
        }
    }

    #[test]
    fn test_pole_is_regular() {
        let ecef = ECEF::from(WGS84::from_degrees_and_meters(90.0, 0.0, 10.0));
        let (lat, _lon, alt) = lla_from_ecef_point(ecef.x(), ecef.y(), ecef.z()).unwrap();
        assert_abs_diff_eq!(lat, 90.0, epsilon = 1e-6);
        assert_abs_diff_eq!(alt, 10.0, epsilon = 1e-2);
    }

    #[test]
    fn test_equator_surface_point() {
        let (lat, lon, alt) = lla_from_ecef_point(SEMI_MAJOR_AXIS, 0.0, 0.0).unwrap();
        assert_abs_diff_eq!(lat, 0.0, epsilon = 1e-9);
        assert_abs_diff_eq!(lon, 0.0, epsilon = 1e-9);
        assert_abs_diff_eq!(alt, 0.0, epsilon = 1e-3);
    }

    #[test]
    fn test_degenerate_inputs_rejected() {
        assert!(lla_from_ecef_point(0.0, 0.0, 0.0).is_none());
        assert!(lla_from_ecef_point(100.0, 100.0, 100.0).is_none());
    }

    #[test]
    fn test_batch_aborts_on_degenerate_point() {
        let points = vec![
            Vector3::new(SEMI_MAJOR_AXIS, 0.0, 0.0),
            Vector3::new(0.0, 0.0, 0.0),
        ];
        match lla_from_ecef(&points) {
            Err(IngestError::NumericRange { index }) => assert_eq!(index, 1),
            other => panic!("expected NumericRange, got {other:?}"),
        }
    }

    #[test]
    fn test_batch_is_index_aligned() {
        let a = ECEF::from(WGS84::from_degrees_and_meters(10.0, 20.0, 0.0));
        let b = ECEF::from(WGS84::from_degrees_and_meters(-40.0, 170.0, 1200.0));
        let points = vec![
            Vector3::new(a.x(), a.y(), a.z()),
            Vector3::new(b.x(), b.y(), b.z()),
        ];
        let lla = lla_from_ecef(&points).unwrap();
        assert_eq!(lla.len(), 2);
        assert_abs_diff_eq!(lla[0].0, 10.0, epsilon = 1e-6);
        assert_abs_diff_eq!(lla[1].0, -40.0, epsilon = 1e-6);
        assert_abs_diff_eq!(lla[1].2, 1200.0, epsilon = 1e-2);
    }
}
