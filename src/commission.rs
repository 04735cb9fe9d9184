use serde::Serialize;
use utoipa::ToSchema;

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum CommissionError {
    #[error("commission rate must be between 0 and 100, got {0}")]
    InvalidRate(f64),
    #[error("order total must be a non-negative amount, got {0}")]
    InvalidTotal(f64),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, ToSchema)]
pub struct CommissionBreakdown {
    /// Percentage actually applied
    pub rate: f64,
    pub commission: f64,
    pub vendor_earning: f64,
}

pub fn validate_rate(rate: f64) -> Result<f64, CommissionError> {
    if rate.is_finite() && (0.0..=100.0).contains(&rate) {
        Ok(rate)
    } else {
        Err(CommissionError::InvalidRate(rate))
    }
}

/// Splits an order total between the platform and the vendor.
///
/// A vendor-specific rate wins over the global one. Rates are percentages.
pub fn calculate_commission(
    total: f64,
    global_rate: f64,
    vendor_rate: Option<f64>,
) -> Result<CommissionBreakdown, CommissionError> {
    if !total.is_finite() || total < 0.0 {
        return Err(CommissionError::InvalidTotal(total));
    }
    let rate = validate_rate(vendor_rate.unwrap_or(global_rate))?;
    let commission = total * rate / 100.0;

    Ok(CommissionBreakdown {
        rate,
        commission,
        vendor_earning: total - commission,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn global_rate_applies_without_vendor_rate() {
        let b = calculate_commission(200.0, 10.0, None).unwrap();
        assert_eq!(b.rate, 10.0);
        assert_eq!(b.commission, 20.0);
        assert_eq!(b.vendor_earning, 180.0);
    }

    #[test]
    fn vendor_rate_wins() {
        let b = calculate_commission(200.0, 10.0, Some(15.0)).unwrap();
        assert_eq!(b.commission, 30.0);
        assert_eq!(b.vendor_earning, 170.0);

        let b = calculate_commission(50.0, 10.0, Some(0.0)).unwrap();
        assert_eq!(b.commission, 0.0);
        assert_eq!(b.vendor_earning, 50.0);
    }

    #[test]
    fn out_of_range_inputs_are_rejected() {
        assert_eq!(calculate_commission(100.0, 120.0, None), Err(CommissionError::InvalidRate(120.0)));
        assert_eq!(calculate_commission(100.0, 10.0, Some(-1.0)), Err(CommissionError::InvalidRate(-1.0)));
        assert_eq!(calculate_commission(-5.0, 10.0, None), Err(CommissionError::InvalidTotal(-5.0)));
        assert!(calculate_commission(f64::NAN, 10.0, None).is_err());
    }
}
