//! Charge replay
//!
//! Pure accounting for abilities with one or more recharging uses. A simple
//! cooldown ability is the one-charge case of the same walk.

/// Charges free at `at`, given the sorted times of prior uses.
///
/// Replays uses in order against a pool that starts full. The recharge
/// clock starts when the pool drops below full and completes one charge per
/// `cooldown_secs`; the pool never exceeds `total`, and a regenerated
/// charge is never handed back retroactively to a use that predates its
/// completion. Uses at or after `at` are ignored.
pub fn available_charges(use_times: &[f32], total: u8, cooldown_secs: f32, at: f32) -> u8 {
    if cooldown_secs <= 0.0 {
        return total;
    }

    let mut charges = total;
    // Completed recharges advance the anchor one cooldown at a time.
    let mut recharge_start = 0.0_f32;

    for &use_time in use_times {
        if use_time >= at {
            break;
        }
        while charges < total && use_time - recharge_start >= cooldown_secs {
            recharge_start += cooldown_secs;
            charges += 1;
        }
        if charges == total {
            recharge_start = use_time;
        }
        charges = charges.saturating_sub(1);
    }

    while charges < total && at - recharge_start >= cooldown_secs {
        recharge_start += cooldown_secs;
        charges += 1;
    }

    charges
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_two_charges_back_to_back() {
        let uses = [0.0, 10.0];
        // Both spent; nothing back until the first recharge completes at 60
        assert_eq!(available_charges(&uses, 2, 60.0, 15.0), 0);
        assert_eq!(available_charges(&uses, 2, 60.0, 59.9), 0);
        assert_eq!(available_charges(&uses, 2, 60.0, 60.0), 1);
        assert_eq!(available_charges(&uses, 2, 60.0, 70.0), 1);
        assert_eq!(available_charges(&uses, 2, 60.0, 120.0), 2);
    }

    #[test]
    fn test_single_charge_is_a_simple_cooldown() {
        let uses = [100.0];
        assert_eq!(available_charges(&uses, 1, 30.0, 120.0), 0);
        assert_eq!(available_charges(&uses, 1, 30.0, 130.0), 1);
        assert_eq!(available_charges(&uses, 1, 30.0, 200.0), 1);
    }

    #[test]
    fn test_recharge_consumed_again_mid_walk() {
        // Third use spends the charge that came back at t=60
        let uses = [0.0, 10.0, 70.0];
        assert_eq!(available_charges(&uses, 2, 60.0, 80.0), 0);
        // Second recharge completes at 120, third at 180
        assert_eq!(available_charges(&uses, 2, 60.0, 119.0), 0);
        assert_eq!(available_charges(&uses, 2, 60.0, 120.0), 1);
        assert_eq!(available_charges(&uses, 2, 60.0, 180.0), 2);
    }

    #[test]
    fn test_pool_never_exceeds_total() {
        let uses = [0.0];
        assert_eq!(available_charges(&uses, 2, 60.0, 1000.0), 2);
        assert_eq!(available_charges(&[], 3, 60.0, 500.0), 3);
    }

    #[test]
    fn test_overdrawn_uses_clamp_at_zero() {
        // More uses than charges in the window; impossible live, but the
        // walk must stay well-defined over whatever the plan contains
        let uses = [0.0, 1.0, 2.0];
        assert_eq!(available_charges(&uses, 2, 60.0, 5.0), 0);
        assert_eq!(available_charges(&uses, 2, 60.0, 60.0), 1);
    }

    #[test]
    fn test_uses_at_or_after_query_time_ignored() {
        let uses = [50.0];
        assert_eq!(available_charges(&uses, 1, 30.0, 50.0), 1);
        assert_eq!(available_charges(&uses, 1, 30.0, 20.0), 1);
    }

    #[test]
    fn test_no_cooldown_is_always_available() {
        let uses = [0.0, 1.0, 2.0];
        assert_eq!(available_charges(&uses, 1, 0.0, 3.0), 1);
    }
}
