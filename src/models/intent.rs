use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveTime};
use thiserror::Error;
use uuid::Uuid;

use super::Slot;

const DELIMITER: char = '_';
const DATE_FORMAT: &str = "%Y-%m-%d";
const TIME_FORMAT: &str = "%H:%M";

/// Everything a button press can ask for.
///
/// Encoded as `action_param1_param2` in callback data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    CheckAvailability,
    Date(NaiveDate),
    ToggleTime(Slot),
    ChangePage { date: NaiveDate, page: usize },
    ListBookings,
    CancelBooking(Uuid),
    ConfirmBooking,
    Booked,
    Ignore,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum IntentError {
    #[error("unknown action '{0}'")]
    UnknownAction(String),
    #[error("action '{action}' expects {expected} parameter(s)")]
    Arity { action: String, expected: usize },
    #[error("invalid parameter '{0}'")]
    InvalidParameter(String),
}

fn parse_date(raw: &str) -> Result<NaiveDate, IntentError> {
    NaiveDate::parse_from_str(raw, DATE_FORMAT)
        .map_err(|_| IntentError::InvalidParameter(raw.to_string()))
}

fn parse_time(raw: &str) -> Result<NaiveTime, IntentError> {
    NaiveTime::parse_from_str(raw, TIME_FORMAT)
        .map_err(|_| IntentError::InvalidParameter(raw.to_string()))
}

impl FromStr for Intent {
    type Err = IntentError;

    fn from_str(data: &str) -> Result<Self, Self::Err> {
        let mut parts = data.split(DELIMITER);
        let action = parts.next().unwrap_or_default();
        let params: Vec<&str> = parts.collect();

        let expect = |expected: usize| {
            if params.len() == expected {
                Ok(())
            } else {
                Err(IntentError::Arity { action: action.to_string(), expected })
            }
        };

        match action {
            "check-availability" => expect(0).map(|_| Intent::CheckAvailability),
            "date" => {
                expect(1)?;
                Ok(Intent::Date(parse_date(params[0])?))
            }
            "toggle-time" => {
                expect(2)?;
                let date = parse_date(params[0])?;
                let time = parse_time(params[1])?;
                Ok(Intent::ToggleTime(Slot::new(date, time)))
            }
            "change-page" => {
                expect(2)?;
                let date = parse_date(params[0])?;
                let page = params[1]
                    .parse::<usize>()
                    .map_err(|_| IntentError::InvalidParameter(params[1].to_string()))?;
                Ok(Intent::ChangePage { date, page })
            }
            "list-bookings" => expect(0).map(|_| Intent::ListBookings),
            "cancel-booking" => {
                expect(1)?;
                let id = Uuid::parse_str(params[0])
                    .map_err(|_| IntentError::InvalidParameter(params[0].to_string()))?;
                Ok(Intent::CancelBooking(id))
            }
            "confirm-booking" => expect(0).map(|_| Intent::ConfirmBooking),
            "booked" => Ok(Intent::Booked),
            "ignore" => Ok(Intent::Ignore),
            other => Err(IntentError::UnknownAction(other.to_string())),
        }
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Intent::CheckAvailability => write!(f, "check-availability"),
            Intent::Date(date) => write!(f, "date_{}", date.format(DATE_FORMAT)),
            Intent::ToggleTime(slot) => write!(
                f,
                "toggle-time_{}_{}",
                slot.date().format(DATE_FORMAT),
                slot.time().format(TIME_FORMAT)
            ),
            Intent::ChangePage { date, page } => {
                write!(f, "change-page_{}_{}", date.format(DATE_FORMAT), page)
            }
            Intent::ListBookings => write!(f, "list-bookings"),
            Intent::CancelBooking(id) => write!(f, "cancel-booking_{}", id),
            Intent::ConfirmBooking => write!(f, "confirm-booking"),
            Intent::Booked => write!(f, "booked"),
            Intent::Ignore => write!(f, "ignore"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_toggle_time() {
        let intent: Intent = "toggle-time_2024-06-01_09:30".parse().unwrap();
        assert_eq!(intent, Intent::ToggleTime("2024-06-01 09:30".parse().unwrap()));
    }

    #[test]
    fn decodes_change_page_and_cancel() {
        let page: Intent = "change-page_2024-06-01_3".parse().unwrap();
        assert_eq!(
            page,
            Intent::ChangePage { date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(), page: 3 }
        );

        let id = Uuid::new_v4();
        let cancel: Intent = format!("cancel-booking_{}", id).parse().unwrap();
        assert_eq!(cancel, Intent::CancelBooking(id));
    }

    #[test]
    fn encoded_tokens_match_action_vocabulary() {
        let date = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        assert_eq!(Intent::Date(date).to_string(), "date_2024-06-01");
        assert_eq!(
            Intent::ToggleTime("2024-06-01 07:00".parse().unwrap()).to_string(),
            "toggle-time_2024-06-01_07:00"
        );
        assert_eq!(Intent::ChangePage { date, page: 1 }.to_string(), "change-page_2024-06-01_1");
        assert_eq!(Intent::ConfirmBooking.to_string(), "confirm-booking");
    }

    #[test]
    fn encoded_tokens_fit_callback_data_limit() {
        let id = Uuid::new_v4();
        assert!(Intent::CancelBooking(id).to_string().len() <= 64);
    }

    #[test]
    fn rejects_malformed_tokens() {
        assert_eq!(
            "select_ai_x".parse::<Intent>(),
            Err(IntentError::UnknownAction("select".to_string()))
        );
        assert!(matches!(
            "toggle-time_2024-06-01".parse::<Intent>(),
            Err(IntentError::Arity { expected: 2, .. })
        ));
        assert_eq!(
            "date_tomorrow".parse::<Intent>(),
            Err(IntentError::InvalidParameter("tomorrow".to_string()))
        );
        assert!("change-page_2024-06-01_-1".parse::<Intent>().is_err());
    }
}
