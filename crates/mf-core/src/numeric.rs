use crate::MfError;

/// Floating point type used throughout system
pub type Real = f64;

/// Value stored at inactive dense nodes.
pub const SENTINEL: Real = Real::NAN;

pub fn is_sentinel(v: Real) -> bool {
    v.is_nan()
}

pub fn ensure_finite(v: Real, what: &str) -> Result<Real, MfError> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(MfError::InvalidArg {
            what: format!("non-finite {what}: {v}"),
        })
    }
}

/// Convert a float headed for an integer buffer, rejecting fractional values.
pub fn ensure_integral(v: Real, what: &str) -> Result<i32, MfError> {
    if v.fract() == 0.0 && v >= i32::MIN as Real && v <= i32::MAX as Real {
        Ok(v as i32)
    } else {
        Err(MfError::TypeMismatch {
            what: format!("{what} = {v}"),
            expected: "integer",
            actual: "double",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinel_is_nan() {
        assert!(is_sentinel(SENTINEL));
        assert!(!is_sentinel(0.0));
    }

    #[test]
    fn ensure_finite_detects_nan() {
        let err = ensure_finite(Real::NAN, "dt").unwrap_err();
        assert!(format!("{err}").contains("non-finite dt"));
    }

    #[test]
    fn integral_values_convert() {
        assert_eq!(ensure_integral(3.0, "k").unwrap(), 3);
        assert_eq!(ensure_integral(-1.0, "k").unwrap(), -1);
        assert!(matches!(
            ensure_integral(2.5, "k"),
            Err(MfError::TypeMismatch { .. })
        ));
        assert!(ensure_integral(Real::NAN, "k").is_err());
    }
}
