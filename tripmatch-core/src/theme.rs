//! Themes a traveller rates and experiences set minimums against.
//!
//! The enum offers compile-time safety for rating lookups. Each theme has a
//! snake_case key, used in serialised rating profiles, and a human label as it
//! appears on the intake form.
//!
//! # Examples
//! ```
//! use tripmatch_core::Theme;
//!
//! assert_eq!(Theme::MuseumsArt.as_str(), "museums_art");
//! assert_eq!(Theme::Rr.label(), "R&R");
//! assert_eq!("Museums & Art".parse::<Theme>(), Ok(Theme::MuseumsArt));
//! ```

use thiserror::Error;

/// Broad categories of travel interest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Theme {
    /// Doing outdoor activities.
    Outdoor,
    /// Relaxing in nature.
    Nature,
    /// Wandering around pretty villages.
    Villages,
    /// Seeing popular sites and landmarks.
    Sites,
    /// Going to places of historical significance.
    History,
    /// Visiting museums and art galleries.
    MuseumsArt,
    /// Enjoying local performances.
    Shows,
    /// Getting some rest and relaxation.
    Rr,
    /// Seeing wildlife in nature.
    Wildlife,
    /// Eating good local food.
    Food,
}

/// Error returned when a string names no known theme.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown theme '{0}'")]
pub struct UnknownThemeError(pub String);

impl Theme {
    /// Every theme, in rating-form order.
    pub const ALL: [Self; 10] = [
        Self::Outdoor,
        Self::Nature,
        Self::Villages,
        Self::Sites,
        Self::History,
        Self::MuseumsArt,
        Self::Shows,
        Self::Rr,
        Self::Wildlife,
        Self::Food,
    ];

    /// Return the snake_case key used in rating profiles.
    ///
    /// # Examples
    /// ```
    /// use tripmatch_core::Theme;
    ///
    /// assert_eq!(Theme::Wildlife.as_str(), "wildlife");
    /// ```
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Outdoor => "outdoor",
            Self::Nature => "nature",
            Self::Villages => "villages",
            Self::Sites => "sites",
            Self::History => "history",
            Self::MuseumsArt => "museums_art",
            Self::Shows => "shows",
            Self::Rr => "rr",
            Self::Wildlife => "wildlife",
            Self::Food => "food",
        }
    }

    /// Return the label shown to travellers.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Outdoor => "Outdoor",
            Self::Nature => "Nature",
            Self::Villages => "Villages",
            Self::Sites => "Sites",
            Self::History => "History",
            Self::MuseumsArt => "Museums & Art",
            Self::Shows => "Shows",
            Self::Rr => "R&R",
            Self::Wildlife => "Wildlife",
            Self::Food => "Food",
        }
    }
}

impl std::fmt::Display for Theme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Theme {
    type Err = UnknownThemeError;

    /// Parse either the key or the label, ignoring case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|theme| {
                theme.as_str().eq_ignore_ascii_case(wanted)
                    || theme.label().eq_ignore_ascii_case(wanted)
            })
            .ok_or_else(|| UnknownThemeError(s.to_owned()))
    }
}
