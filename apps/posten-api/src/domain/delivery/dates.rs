use chrono::{Datelike, NaiveDate};
use serde_json::{Map, Value};

/// Norwegian weekday names, Monday first
const WEEKDAYS: [&str; 7] = [
    "Mandag", "Tirsdag", "Onsdag", "Torsdag", "Fredag", "Lørdag", "Søndag",
];

const MONTHS: [&str; 12] = [
    "Januar", "Februar", "Mars", "April", "Mai", "Juni", "Juli", "August", "September",
    "Oktober", "November", "Desember",
];

/// Relative names for today and the next two days
const NEAR_DAYS: [&str; 3] = ["i dag", "i morgen", "i overmorgen"];

/// Upstream date format for `delivery_dates` entries
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Upstream body that does not carry usable delivery dates
#[derive(Debug, Clone, PartialEq)]
pub struct InvalidPayload {
    pub message: String,
    pub body: Value,
}

impl InvalidPayload {
    fn new(message: &str, body: Value) -> Self {
        Self {
            message: message.to_string(),
            body,
        }
    }
}

/// Delivery dates for one postal code
///
/// Keeps the upstream object untouched for the raw view, alongside the
/// parsed dates used by the text and relative views.
#[derive(Debug, Clone, PartialEq)]
pub struct DeliveryDates {
    payload: Map<String, Value>,
    dates: Vec<NaiveDate>,
}

impl DeliveryDates {
    /// Validates an upstream response body
    ///
    /// # Returns
    /// * `Ok(DeliveryDates)` - If the body is an object with a well-formed `delivery_dates` array
    /// * `Err(InvalidPayload)` - Describing the problem, with the body attached
    pub fn from_payload(payload: Value) -> Result<Self, InvalidPayload> {
        let map = match payload {
            Value::Object(map) => map,
            other => return Err(InvalidPayload::new("missing 'delivery_dates'", other)),
        };

        let parsed = match map.get("delivery_dates") {
            None => {
                return Err(InvalidPayload::new(
                    "missing 'delivery_dates'",
                    Value::Object(map),
                ))
            }
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| {
                    item.as_str()
                        .and_then(|s| NaiveDate::parse_from_str(s, DATE_FORMAT).ok())
                })
                .collect::<Option<Vec<_>>>(),
            Some(_) => None,
        };

        match parsed {
            Some(dates) => Ok(Self { payload: map, dates }),
            None => Err(InvalidPayload::new(
                "invalid 'delivery_dates'",
                Value::Object(map),
            )),
        }
    }

    /// The upstream object as received
    pub fn payload(&self) -> &Map<String, Value> {
        &self.payload
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    /// Dates as Norwegian text, e.g. `Mandag 5. Januar`
    pub fn as_text(&self) -> Vec<String> {
        self.dates.iter().map(|d| format_norwegian(*d)).collect()
    }

    /// Dates relative to `today`, e.g. `i morgen` or `om 4 dager`
    pub fn relative_to(&self, today: NaiveDate) -> Vec<String> {
        self.dates
            .iter()
            .map(|d| format_relative(*d, today))
            .collect()
    }
}

/// Formats a date as `<Weekday> <day>. <Month>`
pub fn format_norwegian(date: NaiveDate) -> String {
    let weekday = WEEKDAYS[date.weekday().num_days_from_monday() as usize];
    let month = MONTHS[date.month0() as usize];
    format!("{} {}. {}", weekday, date.day(), month)
}

/// Formats the distance from `today` to `date`
pub fn format_relative(date: NaiveDate, today: NaiveDate) -> String {
    let delta = (date - today).num_days();
    match usize::try_from(delta).ok().and_then(|i| NEAR_DAYS.get(i)) {
        Some(name) => name.to_string(),
        None => format!("om {} dager", delta),
    }
}
