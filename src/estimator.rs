//! Closed-form Lincoln-Petersen estimator with Chapman's bias correction.

use anyhow::{Result, bail};

/// Compute the Chapman estimate `((M+1)(C+1))/(R+1) - 1`.
///
/// The +1 terms keep the estimate finite even with zero recaptures, so no
/// further division-by-zero guard is needed (or wanted).
pub fn chapman_estimate(marked: usize, caught: usize, recaptured: usize) -> f64 {
    // Multiply in f64: the product of two user-entered counts can exceed
    // integer range.
    (marked as f64 + 1.0) * (caught as f64 + 1.0) / (recaptured as f64 + 1.0) - 1.0
}

/// Compute a standalone Chapman point estimate from user-entered counts.
///
/// # Errors
/// Rejects inputs where the recapture count exceeds either the first-catch
/// mark count or the second-catch total.
pub fn point_estimate(marked: usize, caught: usize, recaptured: usize) -> Result<f64> {
    if recaptured > marked {
        bail!(
            "recaptured-marked count ({recaptured}) cannot exceed \
             the number marked in the first catch ({marked})"
        );
    }
    if recaptured > caught {
        bail!(
            "recaptured-marked count ({recaptured}) cannot exceed \
             the second-catch total ({caught})"
        );
    }
    Ok(chapman_estimate(marked, caught, recaptured))
}
