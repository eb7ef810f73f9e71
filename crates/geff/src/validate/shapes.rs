//! Sphere and ellipsoid property checks. Missing rows are skipped.

use crate::codec::PropArrays;
use crate::error::ValidationError;

const RTOL: f64 = 1e-5;
const ATOL: f64 = 1e-8;

/// Radii must be non-negative.
pub fn validate_sphere(node_ids: &[i64], radius: &PropArrays) -> Result<(), ValidationError> {
    let values = radius.values.to_f64_vec().ok_or(ValidationError::NotNumeric {
        role: "Sphere",
        dtype: radius.values.dtype(),
    })?;
    for (i, (&node, &r)) in node_ids.iter().zip(&values).enumerate() {
        if !radius.is_missing(i) && r < 0.0 {
            return Err(ValidationError::NegativeRadius { node, radius: r });
        }
    }
    Ok(())
}

/// Covariances must be `(n, d, d)`, symmetric and positive-definite.
pub fn validate_ellipsoid(node_ids: &[i64], covariance: &PropArrays) -> Result<(), ValidationError> {
    let shape = covariance.values.shape();
    let shape_error = || ValidationError::CovarianceShape {
        shape: shape.to_vec(),
    };
    if shape.len() != 3 || shape[1] != shape[2] {
        return Err(shape_error());
    }
    let d = shape[1];
    let values = covariance.values.to_f64_vec().ok_or(ValidationError::NotNumeric {
        role: "Ellipsoid",
        dtype: covariance.values.dtype(),
    })?;

    for (i, (&node, matrix)) in node_ids.iter().zip(values.chunks((d * d).max(1))).enumerate() {
        if covariance.is_missing(i) {
            continue;
        }
        if !is_symmetric(matrix, d) {
            return Err(ValidationError::CovarianceNotSymmetric { node });
        }
        if !is_positive_definite(matrix, d) {
            return Err(ValidationError::CovarianceNotPositiveDefinite { node });
        }
    }
    Ok(())
}

fn is_symmetric(m: &[f64], d: usize) -> bool {
    (0..d).all(|r| (0..d).all(|c| (m[r * d + c] - m[c * d + r]).abs() <= ATOL + RTOL * m[c * d + r].abs()))
}

/// Cholesky factorization succeeds only for symmetric positive-definite input.
fn is_positive_definite(m: &[f64], d: usize) -> bool {
    let mut l = vec![0.0f64; d * d];
    for r in 0..d {
        for c in 0..=r {
            let sum: f64 = (0..c).map(|k| l[r * d + k] * l[c * d + k]).sum();
            if r == c {
                let diag = m[r * d + r] - sum;
                if diag <= 0.0 || diag.is_nan() {
                    return false;
                }
                l[r * d + c] = diag.sqrt();
            } else {
                l[r * d + c] = (m[r * d + c] - sum) / l[c * d + c];
            }
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::NdArray;

    fn covariances(values: Vec<f64>, n: usize) -> PropArrays {
        PropArrays::new(NdArray::from_vec(vec![n, 2, 2], values).unwrap())
    }

    #[test]
    fn test_sphere() {
        let radius = PropArrays::new(NdArray::from_vec_1d(vec![1.0f32, 0.0, 2.5]));
        assert!(validate_sphere(&[0, 1, 2], &radius).is_ok());

        let radius = PropArrays::new(NdArray::from_vec_1d(vec![1.0f64, -0.5]));
        assert_eq!(
            validate_sphere(&[4, 9], &radius),
            Err(ValidationError::NegativeRadius { node: 9, radius: -0.5 })
        );

        let radius = PropArrays::with_missing(NdArray::from_vec_1d(vec![1i32, -1]), vec![false, true]);
        assert!(validate_sphere(&[0, 1], &radius).is_ok());
    }

    #[test]
    fn test_ellipsoid_valid() {
        let cov = covariances(vec![2.0, 0.5, 0.5, 1.0, 1.0, 0.0, 0.0, 1.0], 2);
        assert!(validate_ellipsoid(&[0, 1], &cov).is_ok());
    }

    #[test]
    fn test_ellipsoid_shape() {
        let cov = PropArrays::new(NdArray::from_vec(vec![1, 2, 3], vec![0.0f64; 6]).unwrap());
        assert_eq!(
            validate_ellipsoid(&[0], &cov),
            Err(ValidationError::CovarianceShape { shape: vec![1, 2, 3] })
        );
        let cov = PropArrays::new(NdArray::from_vec_1d(vec![1.0f64]));
        assert!(matches!(
            validate_ellipsoid(&[0], &cov),
            Err(ValidationError::CovarianceShape { .. })
        ));
    }

    #[test]
    fn test_ellipsoid_not_symmetric() {
        let cov = covariances(vec![1.0, 0.0, 0.0, 1.0, 1.0, 0.3, 0.2, 1.0], 2);
        assert_eq!(
            validate_ellipsoid(&[3, 8], &cov),
            Err(ValidationError::CovarianceNotSymmetric { node: 8 })
        );
    }

    #[test]
    fn test_ellipsoid_not_positive_definite() {
        let cov = covariances(vec![1.0, 2.0, 2.0, 1.0], 1);
        assert_eq!(
            validate_ellipsoid(&[5], &cov),
            Err(ValidationError::CovarianceNotPositiveDefinite { node: 5 })
        );
        let cov = covariances(vec![0.0; 4], 1);
        assert!(validate_ellipsoid(&[5], &cov).is_err());
    }

    #[test]
    fn test_ellipsoid_missing_rows_skipped() {
        let cov = PropArrays::with_missing(
            NdArray::from_vec(vec![2, 2, 2], vec![1.0f64, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0]).unwrap(),
            vec![false, true],
        );
        assert!(validate_ellipsoid(&[0, 1], &cov).is_ok());
    }
}
