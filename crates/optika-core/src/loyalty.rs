//! # Loyalty Points
//!
//! Computes the points a sale earns, per payment method, plus the referral
//! award for the patient who sent the buyer in.
//!
//! Points accrue per PAYMENT, not per sale total: a sale paid half cash and
//! half card earns at each method's rate on its own slice. Payments made
//! WITH points never earn points.
//!
//! One point per whole unit of currency at the configured rate, floored:
//! `points = floor(amount_cents * rate_bps / 1_000_000)`. A $150 payment at
//! 1% earns 1 point, never 1.5.

use crate::types::{LoyaltyAward, LoyaltySettings, PaymentDraft, PaymentMethod};

/// Computes the award for one sale's payments.
///
/// Returns zeros when the program is disabled. `has_referrer` gates the
/// referral award, which accrues per earning payment at the referral rate,
/// floored per payment just like the buyer's points.
pub fn award_points(
    payments: &[PaymentDraft],
    has_referrer: bool,
    settings: &LoyaltySettings,
) -> LoyaltyAward {
    if !settings.enabled {
        return LoyaltyAward::default();
    }

    let mut points: i64 = 0;
    let mut referrer_points: i64 = 0;

    for payment in payments {
        let amount = payment.amount();
        if !amount.is_positive() || payment.method == PaymentMethod::Points {
            continue;
        }
        points += amount.points_at(settings.rate_for(payment.method));
        if has_referrer {
            referrer_points += amount.points_at(settings.referral_rate());
        }
    }

    LoyaltyAward {
        points,
        referrer_points,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
