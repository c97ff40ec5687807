//! Remaining-session risk classification

use crate::constants::LOW_REMAINING_THRESHOLD;

/// How close a patient is to running out of authorized sessions
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RiskTier {
    Normal,
    Low,
    Exhausted,
}

impl RiskTier {
    pub fn classify(authorized: u32, consumed: u32) -> RiskTier {
        let left = remaining(authorized, consumed);
        if left <= 0 {
            RiskTier::Exhausted
        } else if left <= LOW_REMAINING_THRESHOLD {
            RiskTier::Low
        } else {
            RiskTier::Normal
        }
    }

    /// Warning shown on the registration screen, if any
    pub fn warning(&self, remaining: i64) -> Option<String> {
        match self {
            RiskTier::Exhausted => Some(
                "This patient has used all authorized sessions. Check before continuing."
                    .to_string(),
            ),
            RiskTier::Low => Some(format!(
                "Only {} authorized session{} left.",
                remaining,
                if remaining == 1 { "" } else { "s" }
            )),
            RiskTier::Normal => None,
        }
    }
}

/// Authorized minus consumed; negative when over the limit
pub fn remaining(authorized: u32, consumed: u32) -> i64 {
    authorized as i64 - consumed as i64
}

/// Consumed share of the authorized sessions, capped at 100
pub fn progress_percent(consumed: u32, authorized: u32) -> f64 {
    if authorized == 0 {
        return 0.0;
    }
    (consumed as f64 / authorized as f64 * 100.0).min(100.0)
}

/// Short badge text for lists and cards
pub fn badge_text(remaining: i64) -> String {
    if remaining > 0 {
        format!("{} sessions left", remaining)
    } else {
        "No sessions left".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tiers() {
        assert_eq!(RiskTier::classify(5, 5), RiskTier::Exhausted);
        assert_eq!(RiskTier::classify(5, 4), RiskTier::Low);
        assert_eq!(RiskTier::classify(5, 3), RiskTier::Low);
        assert_eq!(RiskTier::classify(5, 2), RiskTier::Normal);
        assert_eq!(RiskTier::classify(0, 0), RiskTier::Exhausted);
        assert_eq!(RiskTier::classify(5, 7), RiskTier::Exhausted);
    }

    #[test]
    fn test_progress_is_capped() {
        assert_eq!(progress_percent(6, 5), 100.0);
        assert_eq!(progress_percent(2, 4), 50.0);
        assert_eq!(progress_percent(3, 0), 0.0);
    }

    #[test]
    fn test_warnings() {
        assert!(RiskTier::Normal.warning(5).is_none());
        assert_eq!(
            RiskTier::Low.warning(1).as_deref(),
            Some("Only 1 authorized session left.")
        );
        assert!(RiskTier::Exhausted.warning(-1).is_some());
        assert_eq!(badge_text(-2), "No sessions left");
        assert_eq!(badge_text(3), "3 sessions left");
    }
}
