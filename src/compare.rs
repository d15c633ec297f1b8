use crate::station::{Station, StationField};
use std::fmt;

/// Result of checking one copied exchange field against the station.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldCheck {
    Correct { value: String },
    Incorrect { given: String, expected: String },
    /// Numeric field left empty or unparsable.
    Missing { expected: String },
    /// The station has no value for this field.
    NotApplicable,
}

impl FieldCheck {
    pub fn is_correct(&self) -> bool {
        matches!(self, FieldCheck::Correct { .. })
    }
}

impl fmt::Display for FieldCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldCheck::Correct { value } => write!(f, "✓ {value}"),
            FieldCheck::Incorrect { given, expected } => write!(f, "✗ {given} ({expected})"),
            FieldCheck::Missing { expected } => write!(f, "✗ ({expected})"),
            FieldCheck::NotApplicable => write!(f, "N/A"),
        }
    }
}

/// Check `input` against `station`'s `field`.
///
/// Numeric fields compare as integers; text fields compare trimmed and
/// case-insensitively.
pub fn check_field(field: StationField, input: &str, station: &Station) -> FieldCheck {
    let expected = station.field(field);
    let input = input.trim();

    if field.is_numeric() {
        return match input.parse::<i64>() {
            Err(_) => FieldCheck::Missing { expected },
            Ok(given) if expected.parse::<i64>().ok() == Some(given) => FieldCheck::Correct {
                value: given.to_string(),
            },
            Ok(given) => FieldCheck::Incorrect {
                given: given.to_string(),
                expected,
            },
        };
    }

    let expected = expected.trim().to_uppercase();
    if expected.is_empty() {
        return FieldCheck::NotApplicable;
    }

    let given = input.to_uppercase();
    if given == expected {
        FieldCheck::Correct { value: given }
    } else {
        FieldCheck::Incorrect { given, expected }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn station() -> Station {
        let mut stn = Station::new("K5ZD", 28);
        stn.name = "Randy".into();
        stn.state = "MA".into();
        stn.cwops_number = Some(1905);
        stn
    }

    #[test]
    fn test_text_field_case_insensitive() {
        assert_eq!(
            check_field(StationField::Name, " randy ", &station()),
            FieldCheck::Correct {
                value: "RANDY".into()
            }
        );
    }

    #[test]
    fn test_text_field_incorrect() {
        assert_eq!(
            check_field(StationField::State, "ME", &station()),
            FieldCheck::Incorrect {
                given: "ME".into(),
                expected: "MA".into()
            }
        );
    }

    #[test]
    fn test_text_field_not_applicable() {
        let mut stn = station();
        stn.state.clear();
        assert_eq!(check_field(StationField::State, "MA", &stn), FieldCheck::NotApplicable);
    }

    #[test]
    fn test_numeric_field() {
        assert!(check_field(StationField::CwopsNumber, "1905", &station()).is_correct());
        assert!(check_field(StationField::CwopsNumber, " 01905 ", &station()).is_correct());
        assert_eq!(
            check_field(StationField::CwopsNumber, "1950", &station()),
            FieldCheck::Incorrect {
                given: "1950".into(),
                expected: "1905".into()
            }
        );
    }

    #[test]
    fn test_numeric_field_unparsable() {
        assert_eq!(
            check_field(StationField::CwopsNumber, "RANDY", &station()),
            FieldCheck::Missing {
                expected: "1905".into()
            }
        );
        assert_eq!(
            check_field(StationField::SerialNumber, "", &station()),
            FieldCheck::Missing {
                expected: String::new()
            }
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(FieldCheck::NotApplicable.to_string(), "N/A");
        assert_eq!(
            FieldCheck::Incorrect {
                given: "ME".into(),
                expected: "MA".into()
            }
            .to_string(),
            "✗ ME (MA)"
        );
    }
}
