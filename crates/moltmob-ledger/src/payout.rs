//! Deterministic payout arithmetic
//!
//! Winner shares use largest-remainder rounding: everyone gets the floor
//! share and the leftover units go to the earliest winners in the caller's
//! (already deterministic) ordering. Shares always sum exactly to the net
//! amount being split.

/// Split `net` into `n` shares that sum exactly to `net`
///
/// Returns an empty vector when `n` is zero. Equal weights; the first
/// `net % n` shares carry one extra unit.
pub fn split_pot(net: u64, n: usize) -> Vec<u64> {
    if n == 0 {
        return Vec::new();
    }
    let n64 = n as u64;
    let base = net / n64;
    let remainder = (net % n64) as usize;
    (0..n)
        .map(|i| if i < remainder { base + 1 } else { base })
        .collect()
}

/// Rake in basis points, rounded down
pub fn rake_amount(pot: u64, rake_bps: u16) -> u64 {
    pot * u64::from(rake_bps) / 10_000
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn exact_division() {
        assert_eq!(split_pot(600, 3), vec![200, 200, 200]);
    }

    #[test]
    fn remainder_goes_to_earliest_winners() {
        assert_eq!(split_pot(100, 3), vec![34, 33, 33]);
        assert_eq!(split_pot(7, 4), vec![2, 2, 2, 1]);
    }

    #[test]
    fn zero_winners_yields_nothing() {
        assert!(split_pot(500, 0).is_empty());
    }

    #[test]
    fn rake_rounds_down() {
        assert_eq!(rake_amount(600, 500), 30);
        assert_eq!(rake_amount(999, 500), 49);
        assert_eq!(rake_amount(100, 0), 0);
    }

    proptest! {
        #[test]
        fn shares_sum_exactly_to_net(net in 0u64..1_000_000, n in 1usize..64) {
            let shares = split_pot(net, n);
            prop_assert_eq!(shares.len(), n);
            prop_assert_eq!(shares.iter().sum::<u64>(), net);
        }

        #[test]
        fn shares_differ_by_at_most_one(net in 0u64..1_000_000, n in 1usize..64) {
            let shares = split_pot(net, n);
            let max = *shares.iter().max().unwrap();
            let min = *shares.iter().min().unwrap();
            prop_assert!(max - min <= 1);
        }
    }
}
