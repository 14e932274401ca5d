//! Calendar months used for experience availability.

use thiserror::Error;

/// A calendar month, numbered `1..=12`.
///
/// Serialises as its number so persisted availability lists stay compact.
///
/// # Examples
/// ```
/// use tripmatch_core::Month;
///
/// let month = Month::try_from(3_u8)?;
/// assert_eq!(month, Month::March);
/// assert_eq!(month.number(), 3);
/// assert!(Month::try_from(13_u8).is_err());
/// # Ok::<(), tripmatch_core::InvalidMonthError>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "u8", into = "u8"))]
pub enum Month {
    /// January.
    January = 1,
    /// February.
    February = 2,
    /// March.
    March = 3,
    /// April.
    April = 4,
    /// May.
    May = 5,
    /// June.
    June = 6,
    /// July.
    July = 7,
    /// August.
    August = 8,
    /// September.
    September = 9,
    /// October.
    October = 10,
    /// November.
    November = 11,
    /// December.
    December = 12,
}

/// Error returned for month numbers outside `1..=12`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("month must be between 1 and 12, found {0}")]
pub struct InvalidMonthError(pub u8);

impl Month {
    /// Return the month number in `1..=12`.
    #[must_use]
    pub const fn number(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for Month {
    type Error = InvalidMonthError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        let month = match value {
            1 => Self::January,
            2 => Self::February,
            3 => Self::March,
            4 => Self::April,
            5 => Self::May,
            6 => Self::June,
            7 => Self::July,
            8 => Self::August,
            9 => Self::September,
            10 => Self::October,
            11 => Self::November,
            12 => Self::December,
            other => return Err(InvalidMonthError(other)),
        };
        Ok(month)
    }
}

impl From<Month> for u8 {
    fn from(month: Month) -> Self {
        month.number()
    }
}

impl std::fmt::Display for Month {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.number())
    }
}
