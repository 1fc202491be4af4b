/// Face area from the area-weighted normal.
pub fn face_area(normal: &[f64]) -> f64 {
    normal.iter().map(|n| n * n).sum::<f64>().sqrt()
}

/// Writes the unit normal and returns the face area.
pub fn unit_normal(normal: &[f64], unit: &mut [f64]) -> f64 {
    let area = face_area(normal);
    for (u, n) in unit.iter_mut().zip(normal) {
        *u = n / area;
    }
    area
}

/// Completes a unit normal to an orthonormal frame (n, l, m).
///
/// In 2D only `l` is meaningful and `m` is left at zero.
pub fn create_basis(unit_normal: &[f64], l: &mut [f64; 3], m: &mut [f64; 3]) {
    *l = [0.0; 3];
    *m = [0.0; 3];
    if unit_normal.len() == 2 {
        l[0] = -unit_normal[1];
        l[1] = unit_normal[0];
        return;
    }
    let n = [unit_normal[0], unit_normal[1], unit_normal[2]];
    // any vector orthogonal to n, avoiding the degenerate choice
    *l = [0.0, -n[2], n[1]];
    if l[1] == 0.0 && l[2] == 0.0 {
        *l = [-n[2], 0.0, n[0]];
    }
    let l_norm = (l[0] * l[0] + l[1] * l[1] + l[2] * l[2]).sqrt();
    for c in l.iter_mut() {
        *c /= l_norm;
    }
    // m = n x l
    *m = [
        n[1] * l[2] - n[2] * l[1],
        n[2] * l[0] - n[0] * l[2],
        n[0] * l[1] - n[1] * l[0],
    ];
    let m_norm = (m[0] * m[0] + m[1] * m[1] + m[2] * m[2]).sqrt();
    for c in m.iter_mut() {
        *c /= m_norm;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn dot(a: &[f64], b: &[f64]) -> f64 {
        a.iter().zip(b).map(|(x, y)| x * y).sum()
    }

    #[test]
    fn unit_normal_and_area() {
        let mut unit = [0.0; 2];
        let area = unit_normal(&[3.0, 4.0], &mut unit);
        assert_relative_eq!(area, 5.0);
        assert_relative_eq!(unit[0], 0.6);
        assert_relative_eq!(unit[1], 0.8);
    }

    #[test]
    fn basis_is_orthonormal_in_3d() {
        for normal in [[0.0, 0.0, 1.0], [1.0, 0.0, 0.0], [0.48, -0.6, 0.64]] {
            let (mut l, mut m) = ([0.0; 3], [0.0; 3]);
            create_basis(&normal, &mut l, &mut m);
            assert_relative_eq!(dot(&l, &l), 1.0, epsilon = 1e-14);
            assert_relative_eq!(dot(&m, &m), 1.0, epsilon = 1e-14);
            assert_relative_eq!(dot(&l, &normal), 0.0, epsilon = 1e-14);
            assert_relative_eq!(dot(&m, &normal), 0.0, epsilon = 1e-14);
            assert_relative_eq!(dot(&l, &m), 0.0, epsilon = 1e-14);
        }
    }

    #[test]
    fn basis_in_2d_is_rotated_normal() {
        let (mut l, mut m) = ([0.0; 3], [0.0; 3]);
        create_basis(&[0.6, 0.8], &mut l, &mut m);
        assert_relative_eq!(l[0], -0.8);
        assert_relative_eq!(l[1], 0.6);
        assert_eq!(m, [0.0; 3]);
    }
}
