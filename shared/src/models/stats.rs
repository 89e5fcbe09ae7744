//! Orchard statistics

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{Apple, AppleColor, AppleStatus};
use crate::validation::PERCENT_SCALE;

/// Snapshot of the orchard, partitioned by status
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AppleStats {
    pub total: usize,
    pub on_tree_count: usize,
    pub on_ground_count: usize,
    pub rotten_count: usize,
    pub on_tree: Vec<Apple>,
    pub on_ground: Vec<Apple>,
    pub rotten: Vec<Apple>,
    pub by_color: BTreeMap<AppleColor, usize>,
    /// Mean eaten percent over apples that have been bitten at least once
    pub avg_eaten_percent: Option<Decimal>,
}

impl AppleStats {
    pub fn from_apples(apples: &[Apple]) -> Self {
        let mut stats = AppleStats {
            total: apples.len(),
            ..Default::default()
        };

        let mut eaten_sum = Decimal::ZERO;
        let mut eaten_count = 0u32;

        for apple in apples {
            match apple.status {
                AppleStatus::OnTree => stats.on_tree.push(apple.clone()),
                AppleStatus::OnGround => stats.on_ground.push(apple.clone()),
                AppleStatus::Rotten => stats.rotten.push(apple.clone()),
            }
            *stats.by_color.entry(apple.color).or_insert(0) += 1;

            if apple.eaten_percent > Decimal::ZERO {
                eaten_sum += apple.eaten_percent;
                eaten_count += 1;
            }
        }

        stats.on_tree_count = stats.on_tree.len();
        stats.on_ground_count = stats.on_ground.len();
        stats.rotten_count = stats.rotten.len();
        stats.avg_eaten_percent = (eaten_count > 0)
            .then(|| (eaten_sum / Decimal::from(eaten_count)).round_dp(PERCENT_SCALE));

        stats
    }

    pub fn count_for(&self, status: AppleStatus) -> usize {
        match status {
            AppleStatus::OnTree => self.on_tree_count,
            AppleStatus::OnGround => self.on_ground_count,
            AppleStatus::Rotten => self.rotten_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn apple(color: AppleColor) -> Apple {
        let t = Utc.timestamp_opt(0, 0).unwrap();
        Apple::new(color, t, t)
    }

    #[test]
    fn test_empty_orchard() {
        let stats = AppleStats::from_apples(&[]);
        assert_eq!(stats.total, 0);
        assert!(stats.by_color.is_empty());
        assert_eq!(stats.avg_eaten_percent, None);
    }

    #[test]
    fn test_partition_and_average() {
        let t = |s| Utc.timestamp_opt(s, 0).unwrap();

        let on_tree = apple(AppleColor::Red);

        let mut bitten = apple(AppleColor::Red);
        bitten.fall(t(10)).unwrap();
        bitten.eat(dec("30"), t(20)).unwrap();

        let mut untouched = apple(AppleColor::Green);
        untouched.fall(t(10)).unwrap();

        let mut rotten = apple(AppleColor::Blue);
        rotten.fall(t(10)).unwrap();
        rotten.eat(dec("45"), t(20)).unwrap();
        rotten.update_rotten_status(t(50_000));

        let stats = AppleStats::from_apples(&[on_tree, bitten, untouched, rotten]);

        assert_eq!(stats.total, 4);
        assert_eq!(stats.count_for(AppleStatus::OnTree), 1);
        assert_eq!(stats.count_for(AppleStatus::OnGround), 2);
        assert_eq!(stats.count_for(AppleStatus::Rotten), 1);
        assert_eq!(stats.on_ground.len(), 2);
        assert_eq!(stats.by_color.get(&AppleColor::Red), Some(&2));
        assert_eq!(stats.by_color.get(&AppleColor::Green), Some(&1));
        assert_eq!(stats.by_color.get(&AppleColor::Blue), Some(&1));
        assert_eq!(stats.avg_eaten_percent, Some(dec("37.5")));
    }
}
