//! Candidate itineraries: a logistics shell plus bookable experiences.
//!
//! These records are read-only for the duration of a matchmaking run. The
//! chaining constructors mirror how candidate sources assemble them.

use std::collections::BTreeSet;

use crate::{Month, Theme};

/// Opaque itinerary identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct ItineraryId(pub u64);

impl std::fmt::Display for ItineraryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A country, identified by name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Country {
    /// Country name as stored, e.g. `"US"` or `"France"`.
    pub name: String,
}

/// A city within a country.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct City {
    /// City name.
    pub name: String,
    /// Country the city belongs to.
    pub country: Country,
}

impl City {
    /// Construct a city from its name and its country's name.
    ///
    /// # Examples
    /// ```
    /// use tripmatch_core::City;
    ///
    /// let city = City::new("Lisbon", "Portugal");
    /// assert_eq!(city.country.name, "Portugal");
    /// ```
    #[must_use]
    pub fn new(name: impl Into<String>, country: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            country: Country {
                name: country.into(),
            },
        }
    }
}

/// A named destination anchored on a primary city.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Destination {
    /// Marketing name of the destination.
    pub name: String,
    /// City the destination is centred on.
    pub primary_city: City,
}

/// Logistics skeleton of an itinerary.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Shell {
    /// Where the trip takes place.
    pub destination: Destination,
    /// City the traveller flies into.
    pub flying_to_city: City,
    /// City the traveller flies home from.
    pub flying_back_from_city: City,
    /// Trip length in days. Zero is a data fault.
    pub length_days: u32,
    /// Total scheduled transport time in minutes.
    pub transport_duration_minutes: u32,
}

impl Shell {
    /// Construct a shell that flies into and out of the destination's city.
    ///
    /// # Examples
    /// ```
    /// use tripmatch_core::{City, Shell};
    ///
    /// let shell = Shell::round_trip(City::new("Kyoto", "Japan"), 7, 120);
    /// assert_eq!(shell.flying_to_city, shell.flying_back_from_city);
    /// assert_eq!(shell.destination.name, "Kyoto");
    /// ```
    #[must_use]
    pub fn round_trip(city: City, length_days: u32, transport_duration_minutes: u32) -> Self {
        Self {
            destination: Destination {
                name: city.name.clone(),
                primary_city: city.clone(),
            },
            flying_to_city: city.clone(),
            flying_back_from_city: city,
            length_days,
            transport_duration_minutes,
        }
    }

    /// Replace the arrival city.
    #[must_use]
    pub fn flying_to(mut self, city: City) -> Self {
        self.flying_to_city = city;
        self
    }

    /// Replace the departure city.
    #[must_use]
    pub fn flying_back_from(mut self, city: City) -> Self {
        self.flying_back_from_city = city;
        self
    }

    /// Return the six location names a traveller may exclude: destination
    /// city, its country, arrival city, its country, departure city, its
    /// country.
    #[must_use]
    pub fn location_names(&self) -> [&str; 6] {
        [
            self.destination.primary_city.name.as_str(),
            self.destination.primary_city.country.name.as_str(),
            self.flying_to_city.name.as_str(),
            self.flying_to_city.country.name.as_str(),
            self.flying_back_from_city.name.as_str(),
            self.flying_back_from_city.country.name.as_str(),
        ]
    }
}

/// Category of an experience, such as `"Dining experience"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ExperienceType {
    /// Type name matched by the dining and food stages.
    pub name: String,
    /// Optional form-exclusion category, e.g. `"Hiking"`.
    #[cfg_attr(feature = "serde", serde(default))]
    pub kind: Option<String>,
    /// Whether pricing depends on a group being private.
    #[cfg_attr(feature = "serde", serde(default))]
    pub affected_by_group_private: bool,
}

impl ExperienceType {
    /// Construct a type with only a name.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: None,
            affected_by_group_private: false,
        }
    }
}

/// Minimum normalised rating a traveller must give a theme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ThemeMinimumRating {
    /// Theme the minimum applies to.
    pub theme: Theme,
    /// Required rating in `1..=5`.
    pub rating: u8,
}

/// A bookable activity within an itinerary.
///
/// # Examples
/// ```
/// use tripmatch_core::{Experience, Month, Theme};
///
/// let experience = Experience::new(90)
///     .with_months([Month::June, Month::July])
///     .with_fear("heights")
///     .with_theme_minimum(Theme::Outdoor, 3);
/// assert!(experience.months.contains(&Month::June));
/// assert_eq!(experience.theme_minimum_ratings.len(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Experience {
    /// Months in which the experience runs.
    pub months: BTreeSet<Month>,
    /// Conditions that make the experience unsuitable.
    pub fears_phobias_medical: BTreeSet<String>,
    /// Dietary requirements the experience cannot cater for.
    pub unsuitable_for_dietary_requirement: BTreeSet<String>,
    /// Time the experience takes, in minutes.
    pub duration_minutes: u32,
    /// Categories the experience belongs to.
    pub experience_types: Vec<ExperienceType>,
    /// Per-theme minimum traveller ratings.
    pub theme_minimum_ratings: Vec<ThemeMinimumRating>,
}

impl Experience {
    /// Construct an experience lasting `duration_minutes` with no other
    /// attributes.
    #[must_use]
    pub fn new(duration_minutes: u32) -> Self {
        Self {
            duration_minutes,
            ..Self::default()
        }
    }

    /// Add months of availability.
    #[must_use]
    pub fn with_months(mut self, months: impl IntoIterator<Item = Month>) -> Self {
        self.months.extend(months);
        self
    }

    /// Add a fear, phobia, or medical condition tag.
    #[must_use]
    pub fn with_fear(mut self, tag: impl Into<String>) -> Self {
        self.fears_phobias_medical.insert(tag.into());
        self
    }

    /// Add a dietary requirement the experience cannot cater for.
    #[must_use]
    pub fn with_unsuitable_diet(mut self, tag: impl Into<String>) -> Self {
        self.unsuitable_for_dietary_requirement.insert(tag.into());
        self
    }

    /// Add an experience type.
    #[must_use]
    pub fn with_type(mut self, experience_type: ExperienceType) -> Self {
        self.experience_types.push(experience_type);
        self
    }

    /// Add a minimum rating for a theme.
    #[must_use]
    pub fn with_theme_minimum(mut self, theme: Theme, rating: u8) -> Self {
        self.theme_minimum_ratings
            .push(ThemeMinimumRating { theme, rating });
        self
    }

    /// Report whether any type of this experience is named `name`.
    #[must_use]
    pub fn has_type_named(&self, name: &str) -> bool {
        self.experience_types.iter().any(|kind| kind.name == name)
    }
}

/// A candidate trip: a shell and its experiences.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Itinerary {
    /// Identifier, unique within a candidate source.
    pub id: ItineraryId,
    /// Logistics skeleton.
    pub shell: Shell,
    /// Experiences in no particular order.
    #[cfg_attr(feature = "serde", serde(default))]
    pub experiences: Vec<Experience>,
}

impl Itinerary {
    /// Construct an itinerary without experiences.
    ///
    /// # Examples
    /// ```
    /// use tripmatch_core::{City, Experience, Itinerary, Shell};
    ///
    /// let itinerary = Itinerary::new(7, Shell::round_trip(City::new("Oslo", "Norway"), 5, 60))
    ///     .with_experience(Experience::new(120))
    ///     .with_experience(Experience::new(45));
    /// assert_eq!(itinerary.total_experience_minutes(), 165);
    /// ```
    #[must_use]
    pub const fn new(id: u64, shell: Shell) -> Self {
        Self {
            id: ItineraryId(id),
            shell,
            experiences: Vec::new(),
        }
    }

    /// Add an experience.
    #[must_use]
    pub fn with_experience(mut self, experience: Experience) -> Self {
        self.experiences.push(experience);
        self
    }

    /// Sum of experience durations in minutes; zero when there are none.
    #[must_use]
    pub fn total_experience_minutes(&self) -> u64 {
        self.experiences
            .iter()
            .map(|experience| u64::from(experience.duration_minutes))
            .sum()
    }
}
