#![expect(
    clippy::expect_used,
    reason = "tests should fail fast when setup breaks"
)]

//! Property-based tests for rating normalisation and the filter pipeline.
//!
//! # Invariants tested
//!
//! - **Normalised maximum:** the highest normalised rating is exactly five and
//!   relative order is preserved.
//! - **Uniform ratings:** equal raw ratings all round to five.
//! - **Month idempotence:** filtering by month twice equals filtering once.
//! - **Monotone narrowing:** every stage returns a subset of its input.
//! - **Location matching:** exclusions match regardless of case.

use std::collections::BTreeSet;

use proptest::prelude::*;
use tripmatch_core::{
    City, Experience, ExperienceType, FilterContext, FilterPipeline, Itinerary, MemoryCandidateSource,
    Month, Pace, RatingProfile, SEVERE_DIETARY_TAG, Shell, Stage, Theme, TripParameters,
};

const FEARS: [&str; 3] = ["heights", "water", "crowds"];
const DIETS: [&str; 3] = ["vegan", "gluten_free", SEVERE_DIETARY_TAG];
const TYPES: [&str; 3] = ["Dining experience", "Food tour & tastings", "Hiking"];
const CITIES: [(&str, &str); 4] = [
    ("New York", "US"),
    ("Lisbon", "Portugal"),
    ("Kyoto", "Japan"),
    ("Porto", "Portugal"),
];

fn month_strategy() -> impl Strategy<Value = Month> {
    (1_u8..=12).prop_map(|number| Month::try_from(number).expect("month in range"))
}

fn theme_strategy() -> impl Strategy<Value = Theme> {
    prop::sample::select(Theme::ALL.to_vec())
}

fn tags(pool: &'static [&'static str]) -> impl Strategy<Value = BTreeSet<String>> {
    prop::sample::subsequence(pool.to_vec(), 0..=pool.len())
        .prop_map(|picked| picked.into_iter().map(String::from).collect())
}

fn city_strategy() -> impl Strategy<Value = City> {
    prop::sample::select(CITIES.to_vec()).prop_map(|(name, country)| City::new(name, country))
}

fn experience_strategy() -> impl Strategy<Value = Experience> {
    (
        prop::collection::btree_set(month_strategy(), 0..4),
        tags(&FEARS),
        tags(&DIETS),
        0_u32..600,
        prop::sample::subsequence(TYPES.to_vec(), 0..=2),
        prop::collection::vec((theme_strategy(), 1_u8..=5), 0..3),
    )
        .prop_map(|(months, fears, diets, duration, types, minimums)| {
            let mut experience = Experience::new(duration).with_months(months);
            experience.fears_phobias_medical = fears;
            experience.unsuitable_for_dietary_requirement = diets;
            experience.experience_types = types.into_iter().map(ExperienceType::named).collect();
            minimums
                .into_iter()
                .fold(experience, |acc, (theme, rating)| {
                    acc.with_theme_minimum(theme, rating)
                })
        })
}

fn itineraries_strategy() -> impl Strategy<Value = Vec<Itinerary>> {
    prop::collection::vec(
        (
            city_strategy(),
            city_strategy(),
            1_u32..14,
            0_u32..600,
            prop::collection::vec(experience_strategy(), 0..4),
        ),
        0..12,
    )
    .prop_map(|rows| {
        rows.into_iter()
            .zip(1_u64..)
            .map(|((home, outbound, length, transport, experiences), id)| {
                let shell = Shell::round_trip(home, length, transport).flying_to(outbound);
                experiences
                    .into_iter()
                    .fold(Itinerary::new(id, shell), Itinerary::with_experience)
            })
            .collect()
    })
}

fn full_profile_strategy() -> impl Strategy<Value = RatingProfile> {
    prop::collection::vec(0.5_f64..5.0, Theme::ALL.len())
        .prop_map(|values| Theme::ALL.into_iter().zip(values).collect())
}

fn params_strategy() -> impl Strategy<Value = TripParameters> {
    (
        month_strategy(),
        full_profile_strategy(),
        1_u8..=5,
        1_u8..4,
        tags(&FEARS),
        tags(&DIETS),
        prop::sample::subsequence(vec!["us", "LISBON", "japan", "Porto"], 0..=2),
    )
        .prop_map(|(month, ratings, pace, travellers, fears, diets, exclusions)| {
            let mut params = TripParameters::new(month, ratings)
                .with_pace(Pace::try_from(pace).expect("pace in range"))
                .with_travellers(travellers);
            params.fears_phobias_medical = fears;
            params.dietary = diets;
            params.location_exclusions = exclusions.into_iter().map(String::from).collect();
            params
        })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Property: the highest normalised rating is exactly five and raw order
    /// is preserved.
    #[test]
    fn normalising_pins_maximum_and_keeps_order(
        values in prop::collection::vec(0.01_f64..100.0, 1..=10),
    ) {
        let raw: RatingProfile = Theme::ALL.into_iter().zip(values).collect();
        let normalised = raw.normalised().expect("positive ratings normalise");
        prop_assert_eq!(normalised.max_rating(), Some(5.0));
        for (left_theme, left) in raw.iter() {
            for (right_theme, right) in raw.iter() {
                let scaled_left = normalised.rating(left_theme).expect("theme kept");
                let scaled_right = normalised.rating(right_theme).expect("theme kept");
                if left < right {
                    prop_assert!(scaled_left <= scaled_right);
                }
            }
        }
    }

    /// Property: equal raw ratings all round to five.
    #[test]
    fn uniform_ratings_round_to_five(value in 0.01_f64..100.0) {
        let rounded = RatingProfile::uniform(value)
            .normalised_rounded()
            .expect("positive ratings normalise");
        prop_assert!(rounded.iter().all(|(_, rating)| (rating - 5.0).abs() < f64::EPSILON));
    }

    /// Property: filtering by month twice yields the same set as once.
    #[test]
    fn month_filter_is_idempotent(
        itineraries in itineraries_strategy(),
        params in params_strategy(),
    ) {
        let context = FilterContext::new(&params);
        let once = Stage::MonthAvailability
            .apply(itineraries, &context)
            .expect("month stage is infallible");
        let twice = Stage::MonthAvailability
            .apply(once.clone(), &context)
            .expect("month stage is infallible");
        prop_assert_eq!(once, twice);
    }

    /// Property: every stage narrows and never introduces an itinerary.
    #[test]
    fn every_stage_returns_a_subset(
        itineraries in itineraries_strategy(),
        params in params_strategy(),
    ) {
        let context = FilterContext::new(&params);
        let mut current = itineraries;
        for stage in Stage::ALL {
            let before: BTreeSet<_> = current.iter().map(|itinerary| itinerary.id).collect();
            let after = stage
                .apply(current.clone(), &context)
                .expect("generated itineraries are valid");
            prop_assert!(after.len() <= current.len());
            prop_assert!(after.iter().all(|itinerary| before.contains(&itinerary.id)));
            current = after;
        }
    }

    /// Property: the pipeline trace is non-increasing and ends at the
    /// survivor count.
    #[test]
    fn pipeline_trace_is_non_increasing(
        itineraries in itineraries_strategy(),
        params in params_strategy(),
    ) {
        let initial = itineraries.len();
        let source = MemoryCandidateSource::new(itineraries);
        let outcome = FilterPipeline::canonical()
            .run(&source, &params)
            .expect("generated inputs are valid");
        let mut expected_before = initial;
        for report in &outcome.trace {
            prop_assert_eq!(report.before, expected_before);
            prop_assert!(report.after <= report.before);
            expected_before = report.after;
        }
        prop_assert_eq!(outcome.survivors.len(), expected_before);
    }

    /// Property: excluding a country in any letter case drops every itinerary
    /// that touches it.
    #[test]
    fn location_exclusion_ignores_case(
        itineraries in itineraries_strategy(),
        upper in any::<bool>(),
    ) {
        let excluded = if upper { "PORTUGAL" } else { "portugal" };
        let params = TripParameters::new(Month::January, RatingProfile::uniform(3.0))
            .with_location_exclusion(excluded);
        let context = FilterContext::new(&params);
        let survivors = Stage::LocationExclusions
            .apply(itineraries, &context)
            .expect("location stage is infallible");
        let none_touch_excluded = survivors.iter().all(|itinerary| {
            !itinerary.shell.location_names().contains(&"Portugal")
        });
        prop_assert!(none_touch_excluded);
    }
}
