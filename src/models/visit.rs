use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::visit_status::VisitStatus;

/// A recorded sales-prospect visit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Visit {
    pub id: i64,
    pub business_name: String,
    pub contact_name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub zip_code: String,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub visit_status: VisitStatus,
    pub notes: Option<String>,
    pub source: String,
    pub ghl_contact_id: Option<String>,
    pub ghl_location_id: Option<String>,
    pub synced_to_ghl: bool,
    pub last_sync_error: Option<String>,
    pub visit_date: DateTime<Utc>,
}

impl Visit {
    /// A visit is linked once the CRM has assigned it a contact id.
    pub fn is_linked(&self) -> bool {
        self.ghl_contact_id.is_some()
    }

    pub fn has_coordinates(&self) -> bool {
        self.lat.is_some() && self.lng.is_some()
    }
}

impl fmt::Display for Visit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.business_name)?;
        writeln!(f, "{}", "=".repeat(self.business_name.chars().count().max(1)))?;
        writeln!(f, "ID:      {}", self.id)?;
        writeln!(f, "Date:    {}", self.visit_date.format("%Y-%m-%d %H:%M"))?;
        writeln!(f, "Status:  {}", self.visit_status)?;
        writeln!(f, "Zip:     {}", self.zip_code)?;

        if let Some(contact) = non_empty(&self.contact_name) {
            writeln!(f, "Contact: {}", contact)?;
        }
        if let Some(phone) = non_empty(&self.phone) {
            writeln!(f, "Phone:   {}", phone)?;
        }
        if let Some(email) = non_empty(&self.email) {
            writeln!(f, "Email:   {}", email)?;
        }
        if let Some(address) = non_empty(&self.address) {
            match non_empty(&self.city) {
                Some(city) => writeln!(f, "Address: {}, {}", address, city)?,
                None => writeln!(f, "Address: {}", address)?,
            }
        }
        if let (Some(lat), Some(lng)) = (self.lat, self.lng) {
            writeln!(f, "Coords:  {}, {}", lat, lng)?;
        }
        writeln!(f, "Source:  {}", self.source)?;

        let sync_state = match (&self.ghl_contact_id, self.synced_to_ghl) {
            (Some(id), true) => format!("synced ({})", id),
            (Some(id), false) => format!("linked, not synced ({})", id),
            (None, _) => "not synced".to_string(),
        };
        writeln!(f, "CRM:     {}", sync_state)?;
        if let Some(err) = &self.last_sync_error {
            writeln!(f, "Error:   {}", err)?;
        }

        if let Some(notes) = non_empty(&self.notes) {
            writeln!(f, "\nNotes:\n{}", notes)?;
        }

        Ok(())
    }
}

/// Fields supplied when recording a visit.
///
/// Only `business_name` and `zip_code` are required; everything else takes
/// the store's defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewVisit {
    pub business_name: String,
    pub zip_code: String,
    pub contact_name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub notes: Option<String>,
    pub visit_status: VisitStatus,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub source: String,
    pub ghl_location_id: Option<String>,
}

impl NewVisit {
    pub fn new(business_name: impl Into<String>, zip_code: impl Into<String>) -> Self {
        Self {
            business_name: business_name.into(),
            zip_code: zip_code.into(),
            source: "api".to_string(),
            ..Default::default()
        }
    }

    pub fn with_contact_name(mut self, contact_name: impl Into<String>) -> Self {
        self.contact_name = Some(contact_name.into());
        self
    }

    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }

    pub fn with_city(mut self, city: impl Into<String>) -> Self {
        self.city = Some(city.into());
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    pub fn with_status(mut self, status: VisitStatus) -> Self {
        self.visit_status = status;
        self
    }

    pub fn with_coordinates(mut self, lat: f64, lng: f64) -> Self {
        self.lat = Some(lat);
        self.lng = Some(lng);
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    pub fn with_location_id(mut self, location_id: impl Into<String>) -> Self {
        self.ghl_location_id = Some(location_id.into());
        self
    }
}

/// Returns the value only when it holds something other than whitespace.
pub(crate) fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_visit() -> Visit {
        Visit {
            id: 7,
            business_name: "Joe's Diner".to_string(),
            contact_name: Some("Joe Smith".to_string()),
            phone: Some("253-555-0100".to_string()),
            email: None,
            address: Some("1 Main St".to_string()),
            city: None,
            zip_code: "98404".to_string(),
            lat: None,
            lng: None,
            visit_status: VisitStatus::Interested,
            notes: None,
            source: "api".to_string(),
            ghl_contact_id: None,
            ghl_location_id: None,
            synced_to_ghl: false,
            last_sync_error: None,
            visit_date: Utc::now(),
        }
    }

    #[test]
    fn test_new_visit_defaults() {
        let visit = NewVisit::new("Joe's Diner", "98404");
        assert_eq!(visit.business_name, "Joe's Diner");
        assert_eq!(visit.zip_code, "98404");
        assert_eq!(visit.visit_status, VisitStatus::Interested);
        assert_eq!(visit.source, "api");
        assert!(visit.contact_name.is_none());
        assert!(visit.lat.is_none());
    }

    #[test]
    fn test_new_visit_builder() {
        let visit = NewVisit::new("Shop", "98402")
            .with_contact_name("Ann Lee")
            .with_coordinates(47.25, -122.44)
            .with_status(VisitStatus::Contacted)
            .with_source("whatsapp");

        assert_eq!(visit.contact_name.as_deref(), Some("Ann Lee"));
        assert_eq!(visit.lat, Some(47.25));
        assert_eq!(visit.lng, Some(-122.44));
        assert_eq!(visit.visit_status, VisitStatus::Contacted);
        assert_eq!(visit.source, "whatsapp");
    }

    #[test]
    fn test_linked_and_coordinates() {
        let mut visit = sample_visit();
        assert!(!visit.is_linked());
        assert!(!visit.has_coordinates());

        visit.ghl_contact_id = Some("abc123".to_string());
        visit.lat = Some(47.2);
        assert!(visit.is_linked());
        assert!(!visit.has_coordinates());

        visit.lng = Some(-122.4);
        assert!(visit.has_coordinates());
    }

    #[test]
    fn test_display_shows_sync_state() {
        let mut visit = sample_visit();
        let text = visit.to_string();
        assert!(text.contains("Joe's Diner"));
        assert!(text.contains("Contact: Joe Smith"));
        assert!(text.contains("CRM:     not synced"));

        visit.ghl_contact_id = Some("abc123".to_string());
        visit.synced_to_ghl = true;
        assert!(visit.to_string().contains("synced (abc123)"));
    }

    #[test]
    fn test_non_empty() {
        assert_eq!(non_empty(&Some("x".to_string())), Some("x"));
        assert_eq!(non_empty(&Some("  ".to_string())), None);
        assert_eq!(non_empty(&None), None);
    }
}
