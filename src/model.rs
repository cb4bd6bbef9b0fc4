use std::fmt;

use chrono::NaiveDate;

use crate::error::ValidationError;

/// Events ending within this many days (or already overdue) are due now.
pub const IMMEDIATE_MAX_DAYS: i64 = 1;

/// Events ending within this many days, but not immediately, are due this week.
pub const NEAR_MAX_DAYS: i64 = 7;

/// Number of urgency tiers, and therefore of rendered columns.
pub const TIER_COUNT: usize = 3;

/// A todo with a deadline.
///
/// Core fields are fixed at construction; the only mutation is `mark_done`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    name: String,
    description: String,
    starting_date: NaiveDate,
    ending_date: NaiveDate,
    done: bool,
}

impl Event {
    /// Build a validated event. Names and descriptions must be non empty and
    /// free of the store delimiter, and the event must not end before it starts.
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        starting_date: NaiveDate,
        ending_date: NaiveDate,
    ) -> Result<Event, ValidationError> {
        let name = name.into();
        let description = description.into();

        if name.is_empty() {
            return Err(ValidationError::EmptyName);
        }
        if description.is_empty() {
            return Err(ValidationError::EmptyDescription);
        }
        check_storable("name", &name)?;
        check_storable("description", &description)?;
        if starting_date > ending_date {
            return Err(ValidationError::DatesOutOfOrder {
                start: starting_date,
                end: ending_date,
            });
        }

        Ok(Event {
            name,
            description,
            starting_date,
            ending_date,
            done: false,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn starting_date(&self) -> NaiveDate {
        self.starting_date
    }

    pub fn ending_date(&self) -> NaiveDate {
        self.ending_date
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Flag the event as completed. There is no way back.
    pub fn mark_done(&mut self) {
        self.done = true;
    }

    /// Calendar days left until the event ends. Negative when overdue.
    pub fn remaining_days(&self, today: NaiveDate) -> i64 {
        (self.ending_date - today).num_days()
    }

    pub fn tier(&self, today: NaiveDate) -> Tier {
        Tier::from_remaining_days(self.remaining_days(today))
    }
}

fn check_storable(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.contains(|c: char| c == ',' || c == '\n' || c == '\r') {
        return Err(ValidationError::ForbiddenCharacter {
            field,
            value: value.to_string(),
        });
    }
    Ok(())
}

/// Urgency buckets, ordered from most to least urgent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Tier {
    Immediate,
    Near,
    Far,
}

impl Tier {
    pub const ALL: [Tier; TIER_COUNT] = [Tier::Immediate, Tier::Near, Tier::Far];

    pub fn from_remaining_days(days: i64) -> Tier {
        if days <= IMMEDIATE_MAX_DAYS {
            Tier::Immediate
        } else if days <= NEAR_MAX_DAYS {
            Tier::Near
        } else {
            Tier::Far
        }
    }

    /// Column index of the tier.
    pub fn index(self) -> usize {
        match self {
            Tier::Immediate => 0,
            Tier::Near => 1,
            Tier::Far => 2,
        }
    }

    /// Header shown above the tier's column when the config does not say otherwise.
    pub fn default_label(self) -> &'static str {
        match self {
            Tier::Immediate => "TODAY",
            Tier::Near => "THIS WEEK",
            Tier::Far => "NOT SO SOON",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Tier::Immediate => "immediate",
            Tier::Near => "near",
            Tier::Far => "far",
        };
        f.write_str(name)
    }
}

/// Events grouped by tier, each bucket keeping the input order.
#[derive(Debug, Clone, Default)]
pub struct Tiers<'a> {
    buckets: [Vec<&'a Event>; TIER_COUNT],
}

impl<'a> Tiers<'a> {
    pub fn get(&self, tier: Tier) -> &[&'a Event] {
        &self.buckets[tier.index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = (Tier, &[&'a Event])> + '_ {
        Tier::ALL
            .into_iter()
            .map(move |tier| (tier, self.buckets[tier.index()].as_slice()))
    }

    /// Number of buckets, always `TIER_COUNT`.
    pub fn tier_count(&self) -> usize {
        self.buckets.len()
    }

    /// Total number of events across every bucket.
    pub fn len(&self) -> usize {
        self.buckets.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Sort events into urgency tiers relative to `today`.
pub fn categorize(events: &[Event], today: NaiveDate) -> Tiers<'_> {
    let mut tiers = Tiers::default();
    for event in events {
        tiers.buckets[event.tier(today).index()].push(event);
    }
    tiers
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn ending(name: &str, end: NaiveDate) -> Event {
        Event::new(name, "something", date("2020-01-01"), end).unwrap()
    }

    #[test]
    fn rejects_empty_fields() {
        let d = date("2024-03-01");
        assert_eq!(Event::new("", "x", d, d), Err(ValidationError::EmptyName));
        assert_eq!(
            Event::new("x", "", d, d),
            Err(ValidationError::EmptyDescription)
        );
    }

    #[test]
    fn rejects_start_after_end() {
        let err = Event::new("x", "y", date("2024-03-02"), date("2024-03-01")).unwrap_err();
        assert!(matches!(err, ValidationError::DatesOutOfOrder { .. }));
    }

    #[test]
    fn rejects_delimiters() {
        let d = date("2024-03-01");
        assert!(matches!(
            Event::new("a,b", "y", d, d),
            Err(ValidationError::ForbiddenCharacter { field: "name", .. })
        ));
        assert!(matches!(
            Event::new("a", "line\nbreak", d, d),
            Err(ValidationError::ForbiddenCharacter {
                field: "description",
                ..
            })
        ));
    }

    #[test]
    fn mark_done_sticks() {
        let mut event = ending("x", date("2024-03-01"));
        assert!(!event.is_done());
        event.mark_done();
        event.mark_done();
        assert!(event.is_done());
    }

    #[test]
    fn tier_boundaries() {
        let today = date("2024-03-10");
        let tier_at = |offset: i64| {
            ending("x", today + chrono::Duration::days(offset)).tier(today)
        };

        assert_eq!(tier_at(-5), Tier::Immediate);
        assert_eq!(tier_at(0), Tier::Immediate);
        assert_eq!(tier_at(1), Tier::Immediate);
        for offset in 2..=7 {
            assert_eq!(tier_at(offset), Tier::Near, "offset {}", offset);
        }
        assert_eq!(tier_at(8), Tier::Far);
        assert_eq!(tier_at(400), Tier::Far);
    }

    #[test]
    fn categorize_is_a_stable_partition() {
        let today = date("2024-03-10");
        let ends = [9, 30, 3, 10, 1, 12, 5, 11];
        let events: Vec<Event> = ends
            .iter()
            .enumerate()
            .map(|(i, day)| ending(&format!("e{}", i), date(&format!("2024-03-{:02}", day))))
            .collect();

        let tiers = categorize(&events, today);
        assert_eq!(tiers.len(), events.len());

        let names = |tier: Tier| {
            tiers
                .get(tier)
                .iter()
                .map(|e| e.name())
                .collect::<Vec<&str>>()
        };
        assert_eq!(names(Tier::Immediate), vec!["e0", "e2", "e3", "e4", "e6", "e7"]);
        assert_eq!(names(Tier::Near), vec!["e5"]);
        assert_eq!(names(Tier::Far), vec!["e1"]);
    }

    #[test]
    fn categorize_empty() {
        let tiers = categorize(&[], date("2024-03-10"));
        assert!(tiers.is_empty());
        assert_eq!(tiers.tier_count(), TIER_COUNT);
        assert!(tiers.iter().all(|(_, events)| events.is_empty()));
    }

    #[test]
    fn default_labels_follow_tier_order() {
        let labels: Vec<&str> = Tier::ALL.iter().map(|t| t.default_label()).collect();
        assert_eq!(labels, vec!["TODAY", "THIS WEEK", "NOT SO SOON"]);
    }
}
