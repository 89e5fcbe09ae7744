//! The apple lifecycle model
//!
//! An apple grows on the tree, falls, and is then either eaten bit by bit or
//! left to rot. Every time-dependent method takes `now` explicitly so callers
//! decide where time comes from (see [`crate::clock::Clock`]).

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{AppleColor, AppleStatus};
use crate::error::{AppleError, AppleResult};
use crate::validation;

/// Seconds an apple can lie on the ground before it rots (5 hours)
pub const ROTTEN_TIME_SECS: i64 = 18_000;

/// Random appearance dates lie between 1 hour and 30 days in the past
pub const MIN_APPEARANCE_AGE_SECS: i64 = 3_600;
pub const MAX_APPEARANCE_AGE_SECS: i64 = 2_592_000;

pub fn rotten_time() -> Duration {
    Duration::seconds(ROTTEN_TIME_SECS)
}

/// A single apple in the orchard
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Apple {
    pub id: Uuid,
    pub color: AppleColor,
    pub appearance_date: DateTime<Utc>,
    pub fall_date: Option<DateTime<Utc>>,
    pub status: AppleStatus,
    /// Cumulative consumed portion, 0-100
    pub eaten_percent: Decimal,
    pub rotten_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Result of a successful bite.
#[derive(Debug, Clone, PartialEq)]
pub enum EatOutcome {
    /// Part of the apple is left; the record must be updated.
    Bitten { size: Decimal, eaten_percent: Decimal },
    /// Nothing is left; the record must be deleted rather than updated.
    Consumed,
}

impl Apple {
    /// A fresh apple hanging on the tree
    pub fn new(color: AppleColor, appearance_date: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            color,
            appearance_date,
            fall_date: None,
            status: AppleStatus::OnTree,
            eaten_percent: Decimal::ZERO,
            rotten_date: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// An apple of random color that appeared at a random moment in the past
    pub fn new_random<R: Rng + ?Sized>(rng: &mut R, now: DateTime<Utc>) -> Self {
        let color = AppleColor::random(rng);
        let appearance_date = Self::random_appearance_date(rng, now);
        Self::new(color, appearance_date, now)
    }

    pub fn random_appearance_date<R: Rng + ?Sized>(rng: &mut R, now: DateTime<Utc>) -> DateTime<Utc> {
        let age = rng.gen_range(MIN_APPEARANCE_AGE_SECS..=MAX_APPEARANCE_AGE_SECS);
        now - Duration::seconds(age)
    }

    /// Remaining portion of the apple, in percent
    pub fn size(&self) -> Decimal {
        Decimal::ONE_HUNDRED - self.eaten_percent
    }

    /// True once rotten, or once an apple has lain on the ground for
    /// [`ROTTEN_TIME_SECS`] even if the status column has not caught up yet.
    pub fn is_rotten(&self, now: DateTime<Utc>) -> bool {
        match (self.status, self.fall_date) {
            (AppleStatus::Rotten, _) => true,
            (AppleStatus::OnGround, Some(fall_date)) => now - fall_date >= rotten_time(),
            _ => false,
        }
    }

    pub fn can_fall(&self) -> bool {
        self.status == AppleStatus::OnTree
    }

    pub fn can_eat(&self, now: DateTime<Utc>) -> bool {
        !self.is_rotten(now) && self.status == AppleStatus::OnGround && self.size() > Decimal::ZERO
    }

    /// Only fully eaten or rotten apples may be removed
    pub fn can_delete(&self, now: DateTime<Utc>) -> bool {
        self.size() == Decimal::ZERO || self.is_rotten(now)
    }

    /// Drop the apple from the tree
    pub fn fall(&mut self, now: DateTime<Utc>) -> AppleResult<()> {
        if !self.can_fall() {
            return Err(AppleError::InvalidTransition(
                "The apple has already fallen or rotted".to_string(),
            ));
        }

        self.status = AppleStatus::OnGround;
        self.fall_date = Some(now);
        self.updated_at = now;
        Ok(())
    }

    /// Take a bite of `percent` of the whole apple.
    ///
    /// The bite is checked as given: it must lie in (0, 100] and carry at most
    /// two decimal places. On error nothing is mutated. When the bite finishes the apple the outcome is
    /// [`EatOutcome::Consumed`] and the caller is expected to delete the
    /// record instead of saving it.
    pub fn eat(&mut self, percent: Decimal, now: DateTime<Utc>) -> AppleResult<EatOutcome> {
        validation::validate_bite_percent(percent)
            .and_then(|()| validation::validate_percent_precision(percent))
            .map_err(|msg| AppleError::OutOfRange(msg.to_string()))?;

        if !self.can_eat(now) {
            let reason = match self.status {
                AppleStatus::OnTree => "The apple is still on the tree",
                _ if self.is_rotten(now) => "The apple is rotten",
                _ => "The apple cannot be eaten",
            };
            return Err(AppleError::InvalidTransition(reason.to_string()));
        }

        let eaten_percent = self.eaten_percent + percent;
        if eaten_percent > Decimal::ONE_HUNDRED {
            return Err(AppleError::OutOfRange(format!(
                "Cannot eat more than 100%: only {}% is left",
                self.size()
            )));
        }

        self.eaten_percent = eaten_percent;
        self.updated_at = now;

        if self.eaten_percent == Decimal::ONE_HUNDRED {
            Ok(EatOutcome::Consumed)
        } else {
            Ok(EatOutcome::Bitten {
                size: self.size(),
                eaten_percent: self.eaten_percent,
            })
        }
    }

    /// Flip an on-ground apple to `Rotten` once the threshold has passed.
    ///
    /// Returns whether the status changed. Calling it again is a no-op.
    pub fn update_rotten_status(&mut self, now: DateTime<Utc>) -> bool {
        if self.status == AppleStatus::OnGround && self.is_rotten(now) {
            self.status = AppleStatus::Rotten;
            self.rotten_date = Some(now);
            self.updated_at = now;
            return true;
        }
        false
    }

    /// Time left before an on-ground apple rots, clamped at zero
    pub fn time_to_rot(&self, now: DateTime<Utc>) -> Option<Duration> {
        match (self.status, self.fall_date) {
            (AppleStatus::OnGround, Some(fall_date)) => {
                let remaining = rotten_time() - (now - fall_date);
                Some(remaining.max(Duration::zero()))
            }
            _ => None,
        }
    }

    /// Record-level rules checked before every insert or update
    pub fn validate(&self) -> AppleResult<()> {
        validation::validate_eaten_percent(self.eaten_percent)
            .map_err(|msg| AppleError::validation("eaten_percent", msg))?;
        validation::validate_fall_date(self.appearance_date, self.fall_date)
            .map_err(|msg| AppleError::validation("fall_date", msg))?;
        validation::validate_rotten_date(self.fall_date, self.rotten_date)
            .map_err(|msg| AppleError::validation("rotten_date", msg))?;
        validation::validate_status_dates(self.status, self.fall_date, self.rotten_date)
            .map_err(|msg| AppleError::validation("status", msg))?;
        Ok(())
    }
}

/// Render a countdown as `HH:MM:SS`, or `Rotten` once it has run out
pub fn format_countdown(remaining: Duration) -> String {
    if remaining <= Duration::zero() {
        return "Rotten".to_string();
    }
    // Round partial seconds up so a live countdown never reads 00:00:00
    let mut secs = remaining.num_seconds();
    if remaining > Duration::seconds(secs) {
        secs += 1;
    }
    format!("{:02}:{:02}:{:02}", secs / 3600, (secs % 3600) / 60, secs % 60)
}
