//! Insurance document records and the form data they are issued from

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::pricing::{PricingResult, Zone};

/// Lifecycle status of an issued document
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum DocumentStatus {
    #[default]
    Active,
    Expired,
}

impl DocumentStatus {
    /// Arabic label shown on rendered documents
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            DocumentStatus::Active => "نشط",
            DocumentStatus::Expired => "منتهي",
        }
    }
}

/// Traveler step of the issuance form
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct TravelerDetails {
    pub name: String,
    pub birth_date: String,
    pub gender: String,
    pub passport_number: String,
}

impl TravelerDetails {
    /// Names of the fields left blank
    #[must_use]
    pub fn missing_fields(&self) -> Vec<&'static str> {
        [
            ("name", &self.name),
            ("birthDate", &self.birth_date),
            ("gender", &self.gender),
            ("passportNumber", &self.passport_number),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(field, _)| field)
        .collect()
    }
}

/// Trip step of the issuance form
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct TripDetails {
    pub destination: String,
    pub start_date: String,
    pub end_date: String,
}

impl TripDetails {
    /// Names of the fields left blank
    #[must_use]
    pub fn missing_fields(&self) -> Vec<&'static str> {
        [
            ("destination", &self.destination),
            ("startDate", &self.start_date),
            ("endDate", &self.end_date),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(field, _)| field)
        .collect()
    }
}

/// Caller-supplied document content; stamped into an `InsuranceDocument` on creation
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DocumentDraft {
    pub traveler_name: String,
    pub traveler_birth_date: String,
    pub traveler_gender: String,
    pub passport_number: String,
    pub destination: String,
    pub start_date: String,
    pub end_date: String,
    pub duration: u32,
    pub price: u32,
    pub zone: Zone,
}

impl DocumentDraft {
    /// Combine both form steps with the quote computed for the trip
    #[must_use]
    pub fn new(traveler: TravelerDetails, trip: TripDetails, pricing: &PricingResult) -> Self {
        Self {
            traveler_name: traveler.name,
            traveler_birth_date: traveler.birth_date,
            traveler_gender: traveler.gender,
            passport_number: traveler.passport_number,
            destination: trip.destination,
            start_date: trip.start_date,
            end_date: trip.end_date,
            duration: pricing.duration,
            price: pricing.price,
            zone: pricing.zone,
        }
    }
}

/// Issued travel insurance document
///
/// Stored as a flat camelCase JSON object in the `documents` collection.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct InsuranceDocument {
    pub id: String,
    pub user_id: String,
    #[serde(flatten)]
    pub details: DocumentDraft,
    pub status: DocumentStatus,
    pub created_at: DateTime<Utc>,
    pub document_number: String,
}

impl InsuranceDocument {
    #[must_use]
    pub fn is_owned_by(&self, user_id: &str) -> bool {
        self.user_id == user_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pricing::calculate_price;

    #[test]
    fn test_missing_fields_reports_blank_entries() {
        let traveler = TravelerDetails {
            name: "Omar".to_string(),
            birth_date: "1990-05-01".to_string(),
            gender: " ".to_string(),
            passport_number: String::new(),
        };
        assert_eq!(traveler.missing_fields(), vec!["gender", "passportNumber"]);

        let trip = TripDetails {
            destination: "مصر".to_string(),
            ..Default::default()
        };
        assert_eq!(trip.missing_fields(), vec!["startDate", "endDate"]);
    }

    #[test]
    fn test_document_serializes_flat_camel_case() {
        let pricing = calculate_price("مصر", "2024-06-10", "2024-06-20").unwrap();
        let trip = TripDetails {
            destination: "مصر".to_string(),
            start_date: "2024-06-10".to_string(),
            end_date: "2024-06-20".to_string(),
        };
        let document = InsuranceDocument {
            id: "DOC-1-abc".to_string(),
            user_id: "u1".to_string(),
            details: DocumentDraft::new(TravelerDetails::default(), trip, &pricing),
            status: DocumentStatus::Active,
            created_at: Utc::now(),
            document_number: "INS-1".to_string(),
        };

        let json = serde_json::to_value(&document).unwrap();
        assert_eq!(json["userId"], "u1");
        assert_eq!(json["zone"], "regional");
        assert_eq!(json["price"], 110);
        assert_eq!(json["duration"], 11);
        assert_eq!(json["status"], "active");
        assert_eq!(json["documentNumber"], "INS-1");
    }
}
