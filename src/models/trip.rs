use chrono::NaiveDate;
use serde::Serialize;
use std::fmt;

use super::destination::Destination;

/// Date format used on the wire and in the store.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// A trip to a destination over an inclusive range of days.
///
/// Trips reference their destination by id (resolved at display time),
/// and the reference may dangle: nothing in the store enforces it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trip {
    pub id: i64,
    pub title: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub destination_id: Option<i64>,
}

/// Rough trip length, bucketed on the number of nights.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TripLength {
    Short,
    Medium,
    Long,
}

impl fmt::Display for TripLength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TripLength::Short => write!(f, "short"),
            TripLength::Medium => write!(f, "medium"),
            TripLength::Long => write!(f, "long"),
        }
    }
}

impl Trip {
    pub fn new(
        id: i64,
        title: impl Into<String>,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Self {
        Self {
            id,
            title: title.into(),
            start_date,
            end_date,
            destination_id: None,
        }
    }

    pub fn with_destination(mut self, destination_id: i64) -> Self {
        self.destination_id = Some(destination_id);
        self
    }

    /// Inclusive day count: a trip starting and ending on the same day lasts 1 day.
    pub fn duration_days(&self) -> i64 {
        (self.end_date - self.start_date).num_days() + 1
    }

    pub fn length(&self) -> TripLength {
        match (self.end_date - self.start_date).num_days() {
            i64::MIN..=2 => TripLength::Short,
            3..=6 => TripLength::Medium,
            _ => TripLength::Long,
        }
    }

    /// Finds this trip's destination among `destinations`.
    pub fn resolve_destination<'a>(
        &self,
        destinations: &'a [Destination],
    ) -> Option<&'a Destination> {
        let id = self.destination_id?;
        destinations.iter().find(|d| d.id == id)
    }

    /// Case-insensitive match on the title. An empty query matches everything.
    pub fn matches_search(&self, query: &str) -> bool {
        let query = query.trim();
        query.is_empty() || self.title.to_lowercase().contains(&query.to_lowercase())
    }

    /// Checks the fields a user must fill in when adding or editing.
    pub fn validate(&self) -> Result<(), String> {
        if self.title.trim().is_empty() || self.destination_id.is_none() {
            return Err("Title and destination are required".to_string());
        }
        if self.start_date > self.end_date {
            return Err(format!(
                "Start date {} is after end date {}",
                self.start_date, self.end_date
            ));
        }
        Ok(())
    }
}

/// Parses a `YYYY-MM-DD` date, with a message fit for the command line.
pub fn parse_date(value: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT)
        .map_err(|_| format!("Invalid date format '{}'. Use YYYY-MM-DD.", value))
}

impl fmt::Display for Trip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.title)?;
        writeln!(f, "{}", "=".repeat(self.title.chars().count()))?;
        writeln!(f, "ID: {}", self.id)?;
        writeln!(f, "Dates: {} → {}", self.start_date, self.end_date)?;
        writeln!(f, "Duration: {} days", self.duration_days())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_duration_is_inclusive() {
        let trip = Trip::new(1, "Weekend", date(2024, 1, 1), date(2024, 1, 3));
        assert_eq!(trip.duration_days(), 3);

        let day_trip = Trip::new(2, "Day trip", date(2024, 5, 10), date(2024, 5, 10));
        assert_eq!(day_trip.duration_days(), 1);
    }

    #[test]
    fn test_duration_across_month_boundary() {
        let trip = Trip::new(1, "Leap", date(2024, 2, 27), date(2024, 3, 1));
        assert_eq!(trip.duration_days(), 4);
    }

    #[test]
    fn test_length_buckets() {
        let start = date(2024, 6, 1);
        assert_eq!(Trip::new(1, "a", start, date(2024, 6, 3)).length(), TripLength::Short);
        assert_eq!(Trip::new(1, "b", start, date(2024, 6, 4)).length(), TripLength::Medium);
        assert_eq!(Trip::new(1, "c", start, date(2024, 6, 7)).length(), TripLength::Medium);
        assert_eq!(Trip::new(1, "d", start, date(2024, 6, 8)).length(), TripLength::Long);
    }

    #[test]
    fn test_resolve_destination() {
        let destinations = vec![
            Destination::new(1, "Paris", "France"),
            Destination::new(2, "Rome", "Italy"),
        ];
        let trip = Trip::new(10, "Pasta", date(2024, 1, 1), date(2024, 1, 5)).with_destination(2);
        assert_eq!(trip.resolve_destination(&destinations).unwrap().city, "Rome");

        let dangling =
            Trip::new(11, "Nowhere", date(2024, 1, 1), date(2024, 1, 2)).with_destination(99);
        assert!(dangling.resolve_destination(&destinations).is_none());

        let unlinked = Trip::new(12, "Unlinked", date(2024, 1, 1), date(2024, 1, 2));
        assert!(unlinked.resolve_destination(&destinations).is_none());
    }

    #[test]
    fn test_validate() {
        let ok = Trip::new(1, "Trip", date(2024, 1, 1), date(2024, 1, 2)).with_destination(1);
        assert!(ok.validate().is_ok());

        let no_destination = Trip::new(1, "Trip", date(2024, 1, 1), date(2024, 1, 2));
        assert!(no_destination.validate().is_err());

        let reversed =
            Trip::new(1, "Trip", date(2024, 1, 5), date(2024, 1, 2)).with_destination(1);
        let err = reversed.validate().unwrap_err();
        assert!(err.contains("after end date"));

        let untitled = Trip::new(1, " ", date(2024, 1, 1), date(2024, 1, 2)).with_destination(1);
        assert!(untitled.validate().is_err());
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(parse_date("2024-03-09").unwrap(), date(2024, 3, 9));
        assert!(parse_date("09/03/2024").is_err());
        assert!(parse_date("2024-02-30").is_err());
    }

    #[test]
    fn test_matches_search() {
        let trip = Trip::new(1, "Summer in Spain", date(2024, 7, 1), date(2024, 7, 9));
        assert!(trip.matches_search("spain"));
        assert!(trip.matches_search(""));
        assert!(!trip.matches_search("winter"));
    }

    #[test]
    fn test_display() {
        let trip = Trip::new(5, "Road trip", date(2024, 1, 1), date(2024, 1, 3));
        let output = format!("{}", trip);
        assert!(output.contains("Road trip"));
        assert!(output.contains("2024-01-01 → 2024-01-03"));
        assert!(output.contains("Duration: 3 days"));
    }
}
