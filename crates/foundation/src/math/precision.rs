//! Deterministic float ordering for values that come from upstream data and
//! may carry `-0.0` or NaN.

use core::cmp::Ordering;

/// `-0.0` folds into `0.0` and every NaN into one canonical NaN.
pub fn canonical_f64(v: f64) -> f64 {
    if v == 0.0 {
        0.0
    } else if v.is_nan() {
        f64::NAN
    } else {
        v
    }
}

/// Total order after canonicalization; NaN sorts above every number.
pub fn stable_total_cmp_f64(a: f64, b: f64) -> Ordering {
    canonical_f64(a).total_cmp(&canonical_f64(b))
}
