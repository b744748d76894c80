//! Record shapes returned by the remote API.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::{Destination, Trip};

/// One element of `GET {base}/destination`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiDestination {
    pub id: i64,
    pub city: String,
    pub country: String,
    #[serde(rename = "pictureURL")]
    pub picture_url: String,
}

/// One element of `GET {base}/trips`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiTrip {
    pub id: i64,
    pub title: String,
    #[serde(rename = "destinationID")]
    pub destination_id: i64,
    #[serde(rename = "startDate")]
    pub start_date: NaiveDate,
    #[serde(rename = "endDate")]
    pub end_date: NaiveDate,
}

impl ApiDestination {
    /// The local record this remote record maps to, without a picture.
    pub fn to_destination(&self) -> Destination {
        Destination::new(self.id, &self.city, &self.country)
    }
}

impl ApiTrip {
    pub fn to_trip(&self) -> Trip {
        Trip::new(self.id, &self.title, self.start_date, self.end_date)
            .with_destination(self.destination_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_destination_payload() {
        let json = r#"[
            {"id": 1, "city": "Tokyo", "country": "Japan", "pictureURL": "https://img.example/tokyo.jpg"},
            {"id": 2, "city": "Nairobi", "country": "Kenya", "pictureURL": ""}
        ]"#;

        let records: Vec<ApiDestination> = serde_json::from_str(json).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].picture_url, "https://img.example/tokyo.jpg");

        let local = records[1].to_destination();
        assert_eq!(local.id, 2);
        assert_eq!(local.city, "Nairobi");
        assert!(local.picture.is_none());
    }

    #[test]
    fn test_decode_trip_payload() {
        let json = r#"[{"id": 4, "title": "Cherry blossoms", "destinationID": 1,
                        "startDate": "2024-01-01", "endDate": "2024-01-03"}]"#;

        let records: Vec<ApiTrip> = serde_json::from_str(json).unwrap();
        let trip = records[0].to_trip();
        assert_eq!(trip.destination_id, Some(1));
        assert_eq!(trip.duration_days(), 3);
    }

    #[test]
    fn test_decode_rejects_malformed_date() {
        let json = r#"[{"id": 4, "title": "x", "destinationID": 1,
                        "startDate": "01/01/2024", "endDate": "2024-01-03"}]"#;
        assert!(serde_json::from_str::<Vec<ApiTrip>>(json).is_err());
    }

    #[test]
    fn test_decode_rejects_missing_field() {
        let json = r#"[{"id": 1, "city": "Tokyo", "country": "Japan"}]"#;
        assert!(serde_json::from_str::<Vec<ApiDestination>>(json).is_err());
    }
}
