//! Exhibition listings.
//!
//! Exhibitions do not store a status. Whether one is upcoming, current or
//! past is derived from its dates whenever it is read.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use gallery_core::{Address, Admission, ExhibitionId};

use crate::services::uploads::{FormError, FormFields};

/// Currency used when a paid exhibition does not name one.
pub const DEFAULT_CURRENCY: &str = "USD";

/// Where an exhibition stands relative to a point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExhibitionStatus {
    Upcoming,
    Current,
    Past,
}

impl ExhibitionStatus {
    /// Classify the `[start, end]` window against `now`. Both ends are inclusive.
    #[must_use]
    pub fn at(start: DateTime<Utc>, end: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        if now < start {
            Self::Upcoming
        } else if now > end {
            Self::Past
        } else {
            Self::Current
        }
    }
}

/// Venue of an exhibition.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub name: Option<String>,
    pub address: Address,
}

/// Ticket price for paid admission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TicketPrice {
    pub amount: Decimal,
    pub currency: String,
}

/// An exhibition listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Exhibition {
    pub id: ExhibitionId,
    pub title: String,
    pub description: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    /// Derived from the dates when the record was loaded.
    pub status: ExhibitionStatus,
    pub location: Location,
    pub image: Option<String>,
    pub admission: Admission,
    pub price: Option<TicketPrice>,
    pub created_at: DateTime<Utc>,
}

/// Validated exhibition fields from an admin form, minus the image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExhibitionDraft {
    pub title: String,
    pub description: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub location: Location,
    pub admission: Admission,
    pub price: Option<TicketPrice>,
}

impl ExhibitionDraft {
    /// Build a draft from multipart text fields.
    ///
    /// Dates accept RFC 3339 timestamps or plain `YYYY-MM-DD` days; a plain
    /// end day covers the whole day.
    ///
    /// # Errors
    ///
    /// Returns `FormError` naming the first missing or invalid field, or if
    /// the end date precedes the start date.
    pub fn from_form(fields: &FormFields) -> Result<Self, FormError> {
        let start_date = parse_instant(fields.required("startDate")?, NaiveTime::MIN)
            .ok_or_else(|| FormError::invalid("startDate", "expected a date"))?;
        let end_of_day = NaiveTime::from_hms_opt(23, 59, 59).unwrap_or(NaiveTime::MIN);
        let end_date = parse_instant(fields.required("endDate")?, end_of_day)
            .ok_or_else(|| FormError::invalid("endDate", "expected a date"))?;
        if end_date < start_date {
            return Err(FormError::invalid("endDate", "must not be before startDate"));
        }

        // Older admin forms send `admissionType`
        let admission = if fields.optional("admission").is_some() {
            fields.wire_enum("admission")?
        } else if fields.optional("admissionType").is_some() {
            fields.wire_enum("admissionType")?
        } else {
            Admission::default()
        };

        let price = match fields.optional("price") {
            Some(_) => {
                let amount: Decimal = fields.parse("price")?;
                if amount.is_sign_negative() {
                    return Err(FormError::invalid("price", "must not be negative"));
                }
                Some(TicketPrice {
                    amount,
                    currency: fields
                        .optional("currency")
                        .unwrap_or(DEFAULT_CURRENCY)
                        .to_uppercase(),
                })
            }
            None => None,
        };

        let location = Location {
            name: fields.optional("location").map(str::to_owned),
            address: Address {
                street: fields.optional("address").map(str::to_owned),
                city: fields.optional("city").map(str::to_owned),
                state: fields.optional("state").map(str::to_owned),
                zip_code: fields.optional("zipCode").map(str::to_owned),
                country: fields.optional("country").map(str::to_owned),
            },
        };

        Ok(Self {
            title: fields.required("title")?.to_owned(),
            description: fields.required("description")?.to_owned(),
            start_date,
            end_date,
            location,
            admission,
            price,
        })
    }
}

fn parse_instant(value: &str, day_time: NaiveTime) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .ok()
                .map(|day| day.and_time(day_time).and_utc())
        })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::{Duration, TimeZone};

    use super::*;

    fn fields(pairs: &[(&str, &str)]) -> FormFields {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_status_window_is_inclusive() {
        let start = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 5, 31, 0, 0, 0).unwrap();

        assert_eq!(
            ExhibitionStatus::at(start, end, start - Duration::seconds(1)),
            ExhibitionStatus::Upcoming
        );
        assert_eq!(ExhibitionStatus::at(start, end, start), ExhibitionStatus::Current);
        assert_eq!(ExhibitionStatus::at(start, end, end), ExhibitionStatus::Current);
        assert_eq!(
            ExhibitionStatus::at(start, end, end + Duration::seconds(1)),
            ExhibitionStatus::Past
        );
    }

    #[test]
    fn test_from_form_with_plain_days() {
        let draft = ExhibitionDraft::from_form(&fields(&[
            ("title", "Northern Light"),
            ("description", "Landscapes"),
            ("startDate", "2024-05-01"),
            ("endDate", "2024-05-01"),
            ("location", "Main Hall"),
            ("city", "Oslo"),
        ]))
        .unwrap();

        assert_eq!(draft.admission, Admission::Free);
        assert!(draft.price.is_none());
        assert!(draft.end_date > draft.start_date);
        assert_eq!(draft.location.name.as_deref(), Some("Main Hall"));
        assert_eq!(draft.location.address.city.as_deref(), Some("Oslo"));
    }

    #[test]
    fn test_from_form_rejects_end_before_start() {
        let err = ExhibitionDraft::from_form(&fields(&[
            ("title", "Backwards"),
            ("description", "x"),
            ("startDate", "2024-06-01T00:00:00Z"),
            ("endDate", "2024-05-01T00:00:00Z"),
        ]))
        .unwrap_err();
        assert!(matches!(err, FormError::Invalid { field: "endDate", .. }));
    }

    #[test]
    fn test_from_form_paid_defaults_currency() {
        let draft = ExhibitionDraft::from_form(&fields(&[
            ("title", "Masters"),
            ("description", "x"),
            ("startDate", "2024-05-01"),
            ("endDate", "2024-06-01"),
            ("admissionType", "paid"),
            ("price", "12.5"),
        ]))
        .unwrap();

        assert_eq!(draft.admission, Admission::Paid);
        let price = draft.price.unwrap();
        assert_eq!(price.amount, Decimal::new(125, 1));
        assert_eq!(price.currency, "USD");
    }
}
