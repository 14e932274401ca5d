//! Pace tiers and booked-time classification.
//!
//! An itinerary's booked time is the sum of its experience durations plus the
//! shell's transport time. It is compared against a budget of nine wakeful
//! hours per trip day. Each [`Pace`] tier admits itineraries by a fixed
//! threshold on the resulting percentage.
//!
//! The tiers are not monotonic: relaxed tiers bound the percentage from above
//! and packed tiers bound it from below, so an itinerary at 30% suits every
//! tier while one at 80% suits only the packed ones.

use thiserror::Error;

use crate::{Itinerary, MatchError};

/// Minutes of each trip day that may be scheduled.
pub const WAKEFUL_MINUTES_PER_DAY: u64 = 9 * 60;

/// Desired ratio of scheduled to free time, from `1` (very relaxed) to `5`
/// (very packed).
///
/// # Examples
/// ```
/// use tripmatch_core::Pace;
///
/// let pace = Pace::try_from(3_u8)?;
/// assert_eq!(pace, Pace::Moderate);
/// assert_eq!(pace.tier(), 3);
/// # Ok::<(), tripmatch_core::InvalidPaceError>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "u8", into = "u8"))]
pub enum Pace {
    /// Booked time below 40%.
    VeryRelaxed = 1,
    /// Booked time below 55%.
    Relaxed = 2,
    /// Booked time below 75%.
    Moderate = 3,
    /// Booked time above 20%.
    Packed = 4,
    /// Booked time above 25%.
    VeryPacked = 5,
}

/// Error returned for pace tiers outside `1..=5`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("pace must be between 1 and 5, found {0}")]
pub struct InvalidPaceError(pub u8);

/// Booked and available minutes for one itinerary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BookedTime {
    /// Experience durations plus transport time.
    pub booked_minutes: u64,
    /// Wakeful minutes across the whole trip.
    pub budget_minutes: u64,
}

impl BookedTime {
    /// Measure the booked time of an itinerary.
    ///
    /// An itinerary without experiences books only its transport time.
    ///
    /// # Errors
    /// Returns [`MatchError::InvalidItinerary`] when the shell length is zero,
    /// since the budget would be empty.
    ///
    /// # Examples
    /// ```
    /// use tripmatch_core::{BookedTime, City, Experience, Itinerary, Shell};
    ///
    /// let itinerary = Itinerary::new(1, Shell::round_trip(City::new("Bergen", "Norway"), 10, 50))
    ///     .with_experience(Experience::new(100));
    /// let booked = BookedTime::of(&itinerary)?;
    /// assert_eq!(booked.booked_minutes, 150);
    /// assert_eq!(booked.budget_minutes, 5400);
    /// # Ok::<(), tripmatch_core::MatchError>(())
    /// ```
    pub fn of(itinerary: &Itinerary) -> Result<Self, MatchError> {
        let length_days = itinerary.shell.length_days;
        if length_days == 0 {
            return Err(MatchError::InvalidItinerary {
                id: itinerary.id,
                reason: String::from("shell length is zero days"),
            });
        }
        Ok(Self {
            booked_minutes: itinerary.total_experience_minutes()
                + u64::from(itinerary.shell.transport_duration_minutes),
            budget_minutes: WAKEFUL_MINUTES_PER_DAY * u64::from(length_days),
        })
    }

    /// Return booked time as a percentage of the budget.
    ///
    /// Intended for reporting; tier decisions use exact integer comparison.
    #[expect(
        clippy::float_arithmetic,
        reason = "percentage is a ratio of two minute counts"
    )]
    #[expect(
        clippy::cast_precision_loss,
        reason = "minute counts are far below 2^52"
    )]
    #[must_use]
    pub fn percentage(self) -> f64 {
        100.0 * self.booked_minutes as f64 / self.budget_minutes as f64
    }
}

impl Pace {
    /// Every tier, most relaxed first.
    pub const ALL: [Self; 5] = [
        Self::VeryRelaxed,
        Self::Relaxed,
        Self::Moderate,
        Self::Packed,
        Self::VeryPacked,
    ];

    /// Return the tier number in `1..=5`.
    #[must_use]
    pub const fn tier(self) -> u8 {
        self as u8
    }

    /// Report whether this tier admits the booked time.
    ///
    /// Thresholds are strict, so exactly 40% is rejected by
    /// [`Pace::VeryRelaxed`] and exactly 20% by [`Pace::Packed`].
    ///
    /// # Examples
    /// ```
    /// use tripmatch_core::{BookedTime, Pace};
    ///
    /// let forty_percent = BookedTime { booked_minutes: 216, budget_minutes: 540 };
    /// assert!(!Pace::VeryRelaxed.admits(forty_percent));
    /// assert!(Pace::Moderate.admits(forty_percent));
    /// ```
    #[must_use]
    pub fn admits(self, booked: BookedTime) -> bool {
        let scaled = u128::from(booked.booked_minutes) * 100;
        let budget = u128::from(booked.budget_minutes);
        match self {
            Self::VeryRelaxed => scaled < 40 * budget,
            Self::Relaxed => scaled < 55 * budget,
            Self::Moderate => scaled < 75 * budget,
            Self::Packed => scaled > 20 * budget,
            Self::VeryPacked => scaled > 25 * budget,
        }
    }
}

impl TryFrom<u8> for Pace {
    type Error = InvalidPaceError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::VeryRelaxed),
            2 => Ok(Self::Relaxed),
            3 => Ok(Self::Moderate),
            4 => Ok(Self::Packed),
            5 => Ok(Self::VeryPacked),
            other => Err(InvalidPaceError(other)),
        }
    }
}

impl From<Pace> for u8 {
    fn from(pace: Pace) -> Self {
        pace.tier()
    }
}

impl std::fmt::Display for Pace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.tier())
    }
}
