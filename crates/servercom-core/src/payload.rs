//! Submittable data points.
//!
//! Every payload carries a [`DataClass`] tag drawn from a closed set and a
//! value validated at construction. The wire body is a JSON object
//! `{"type": <tag>, "value": <value>}` and depends on nothing but the payload.

use crate::ProtocolError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Longest text value accepted, in bytes.
pub const MAX_TEXT_LEN: usize = 1024;

const ABSOLUTE_ZERO_F: f64 = -459.67;

/// The type tag the server uses to interpret a payload body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataClass {
    #[serde(rename = "temperature")]
    Temperature,
    #[serde(rename = "humidity")]
    Humidity,
    #[serde(rename = "pressure")]
    Pressure,
    #[serde(rename = "light intensity")]
    LightIntensity,
    #[serde(rename = "comment")]
    Comment,
    #[serde(rename = "remaining battery")]
    Battery,
    #[serde(rename = "beacon challenge")]
    Beacon,
}

impl DataClass {
    /// Tag as it appears on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Temperature => "temperature",
            Self::Humidity => "humidity",
            Self::Pressure => "pressure",
            Self::LightIntensity => "light intensity",
            Self::Comment => "comment",
            Self::Battery => "remaining battery",
            Self::Beacon => "beacon challenge",
        }
    }

    /// Unit suffix used when displaying a value of this class.
    pub fn unit(&self) -> &'static str {
        match self {
            Self::Temperature => "\u{b0}F",
            Self::Humidity | Self::Battery => "%",
            Self::Pressure => "inHg",
            Self::LightIntensity => "lux",
            Self::Comment | Self::Beacon => "",
        }
    }
}

impl fmt::Display for DataClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single data point to submit.
///
/// Build one with the constructor for its kind; the inner value cannot be
/// changed afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct Payload(Kind);

#[derive(Debug, Clone, PartialEq)]
enum Kind {
    Temperature(f64),
    Humidity(f64),
    Pressure(f64),
    Intensity(f64),
    Text(String),
    BatteryLevel(u8),
    BeaconChallenge(String),
}

impl Payload {
    /// Temperature in degrees Fahrenheit.
    pub fn temperature(fahrenheit: f64) -> Result<Self, ValueError> {
        check_range(DataClass::Temperature, fahrenheit, ABSOLUTE_ZERO_F, f64::INFINITY)?;
        Ok(Self(Kind::Temperature(fahrenheit)))
    }

    /// Relative humidity in percent.
    pub fn humidity(percent: f64) -> Result<Self, ValueError> {
        check_range(DataClass::Humidity, percent, 0.0, 100.0)?;
        Ok(Self(Kind::Humidity(percent)))
    }

    /// Barometric pressure in inches of mercury.
    pub fn pressure(inches_hg: f64) -> Result<Self, ValueError> {
        check_range(DataClass::Pressure, inches_hg, 0.0, f64::INFINITY)?;
        Ok(Self(Kind::Pressure(inches_hg)))
    }

    /// Light intensity in lux.
    pub fn intensity(lux: f64) -> Result<Self, ValueError> {
        check_range(DataClass::LightIntensity, lux, 0.0, f64::INFINITY)?;
        Ok(Self(Kind::Intensity(lux)))
    }

    /// Free-form text comment.
    pub fn text(text: impl Into<String>) -> Result<Self, ValueError> {
        let text = text.into();
        check_len(DataClass::Comment, &text)?;
        Ok(Self(Kind::Text(text)))
    }

    /// Remaining battery in percent.
    pub fn battery_level(percent: u8) -> Result<Self, ValueError> {
        check_range(DataClass::Battery, f64::from(percent), 0.0, 100.0)?;
        Ok(Self(Kind::BatteryLevel(percent)))
    }

    /// Answer to a message received from the beacon.
    pub fn beacon_challenge(answer: impl Into<String>) -> Result<Self, ValueError> {
        let answer = answer.into();
        if answer.is_empty() {
            return Err(ValueError::Empty {
                field: "beacon challenge",
            });
        }
        check_len(DataClass::Beacon, &answer)?;
        Ok(Self(Kind::BeaconChallenge(answer)))
    }

    pub fn data_class(&self) -> DataClass {
        match &self.0 {
            Kind::Temperature(_) => DataClass::Temperature,
            Kind::Humidity(_) => DataClass::Humidity,
            Kind::Pressure(_) => DataClass::Pressure,
            Kind::Intensity(_) => DataClass::LightIntensity,
            Kind::Text(_) => DataClass::Comment,
            Kind::BatteryLevel(_) => DataClass::Battery,
            Kind::BeaconChallenge(_) => DataClass::Beacon,
        }
    }

    /// The `value` member of the wire body.
    pub fn value(&self) -> Value {
        match &self.0 {
            Kind::Temperature(v) | Kind::Humidity(v) | Kind::Pressure(v) | Kind::Intensity(v) => {
                Value::from(*v)
            }
            Kind::BatteryLevel(v) => Value::from(*v),
            Kind::Text(s) | Kind::BeaconChallenge(s) => Value::from(s.as_str()),
        }
    }

    /// The wire body as a JSON value.
    pub fn to_json(&self) -> Value {
        let mut body = Map::new();
        body.insert("type".into(), Value::from(self.data_class().as_str()));
        body.insert("value".into(), self.value());
        Value::Object(body)
    }

    /// Encode the wire body.
    pub fn serialize(&self) -> Vec<u8> {
        self.to_json().to_string().into_bytes()
    }

    /// Decode a wire body, applying the same checks as the constructors.
    pub fn from_wire(bytes: &[u8]) -> Result<Self, ProtocolError> {
        #[derive(Deserialize)]
        struct Wire {
            #[serde(rename = "type")]
            class: DataClass,
            value: Value,
        }

        let wire: Wire = serde_json::from_slice(bytes)?;
        let unexpected = || ProtocolError::UnexpectedValue {
            field: "value",
            value: wire.value.to_string(),
        };
        let number = || wire.value.as_f64().ok_or_else(unexpected);
        let text = || wire.value.as_str().map(str::to_owned).ok_or_else(unexpected);

        let payload = match wire.class {
            DataClass::Temperature => Self::temperature(number()?)?,
            DataClass::Humidity => Self::humidity(number()?)?,
            DataClass::Pressure => Self::pressure(number()?)?,
            DataClass::LightIntensity => Self::intensity(number()?)?,
            DataClass::Comment => Self::text(text()?)?,
            DataClass::Beacon => Self::beacon_challenge(text()?)?,
            DataClass::Battery => {
                let percent = wire
                    .value
                    .as_u64()
                    .and_then(|v| u8::try_from(v).ok())
                    .ok_or_else(unexpected)?;
                Self::battery_level(percent)?
            }
        };
        Ok(payload)
    }
}

impl fmt::Display for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Kind::Temperature(v) | Kind::Humidity(v) | Kind::Pressure(v) | Kind::Intensity(v) => {
                write!(f, "{v} {}", self.data_class().unit())
            }
            Kind::BatteryLevel(v) => write!(f, "{v} {}", self.data_class().unit()),
            Kind::Text(s) | Kind::BeaconChallenge(s) => f.write_str(s),
        }
    }
}

fn check_range(class: DataClass, value: f64, min: f64, max: f64) -> Result<(), ValueError> {
    if !value.is_finite() {
        return Err(ValueError::NotFinite { class, value });
    }
    if value < min || value > max {
        return Err(ValueError::OutOfRange {
            class,
            value,
            min,
            max,
        });
    }
    Ok(())
}

fn check_len(class: DataClass, text: &str) -> Result<(), ValueError> {
    if text.len() > MAX_TEXT_LEN {
        return Err(ValueError::TooLong {
            class,
            len: text.len(),
            max: MAX_TEXT_LEN,
        });
    }
    Ok(())
}

/// A value rejected at construction.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValueError {
    #[error("{class} value must be finite, got {value}")]
    NotFinite { class: DataClass, value: f64 },
    #[error("{class} value {value} is outside {min}..={max}")]
    OutOfRange {
        class: DataClass,
        value: f64,
        min: f64,
        max: f64,
    },
    #[error("{class} text is {len} bytes, limit is {max}")]
    TooLong {
        class: DataClass,
        len: usize,
        max: usize,
    },
    #[error("{field} cannot be empty")]
    Empty { field: &'static str },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_wire_body() {
        let p = Payload::text("hello").unwrap();
        assert_eq!(p.data_class(), DataClass::Comment);
        assert_eq!(p.serialize(), br#"{"type":"comment","value":"hello"}"#);
    }

    #[test]
    fn numeric_wire_body() {
        let p = Payload::temperature(72.5).unwrap();
        assert_eq!(p.serialize(), br#"{"type":"temperature","value":72.5}"#);

        let p = Payload::intensity(300.0).unwrap();
        assert_eq!(p.serialize(), br#"{"type":"light intensity","value":300.0}"#);

        let p = Payload::battery_level(57).unwrap();
        assert_eq!(p.serialize(), br#"{"type":"remaining battery","value":57}"#);
    }

    #[test]
    fn serialize_is_deterministic() {
        let p = Payload::pressure(29.92).unwrap();
        assert_eq!(p.serialize(), p.clone().serialize());
    }

    #[test]
    fn rejects_out_of_range() {
        assert!(matches!(
            Payload::humidity(100.5),
            Err(ValueError::OutOfRange { class: DataClass::Humidity, .. })
        ));
        assert!(Payload::temperature(-500.0).is_err());
        assert!(Payload::pressure(-1.0).is_err());
        assert!(Payload::battery_level(101).is_err());
        assert!(Payload::battery_level(100).is_ok());
    }

    #[test]
    fn rejects_non_finite() {
        assert!(matches!(
            Payload::intensity(f64::NAN),
            Err(ValueError::NotFinite { .. })
        ));
        assert!(Payload::temperature(f64::INFINITY).is_err());
    }

    #[test]
    fn rejects_long_text() {
        let long = "x".repeat(MAX_TEXT_LEN + 1);
        assert!(matches!(
            Payload::text(long),
            Err(ValueError::TooLong { len, .. }) if len == MAX_TEXT_LEN + 1
        ));
        assert!(Payload::text("x".repeat(MAX_TEXT_LEN)).is_ok());
    }

    #[test]
    fn empty_beacon_answer_rejected() {
        assert_eq!(
            Payload::beacon_challenge(""),
            Err(ValueError::Empty {
                field: "beacon challenge"
            })
        );
        assert!(Payload::text("").is_ok());
    }

    #[test]
    fn decode_matches_constructor() {
        let p = Payload::from_wire(br#"{"type":"humidity","value":40}"#).unwrap();
        assert_eq!(p, Payload::humidity(40.0).unwrap());
    }

    #[test]
    fn decode_rejects_wrong_value_kind() {
        let err = Payload::from_wire(br#"{"type":"comment","value":5}"#).unwrap_err();
        assert!(matches!(err, ProtocolError::UnexpectedValue { field: "value", .. }));

        let err = Payload::from_wire(br#"{"type":"remaining battery","value":2.5}"#).unwrap_err();
        assert!(matches!(err, ProtocolError::UnexpectedValue { .. }));
    }

    #[test]
    fn decode_rejects_unknown_tag() {
        assert!(Payload::from_wire(br#"{"type":"wind","value":3}"#).is_err());
    }

    #[test]
    fn display_with_unit() {
        assert_eq!(Payload::temperature(70.0).unwrap().to_string(), "70 \u{b0}F");
        assert_eq!(Payload::battery_level(80).unwrap().to_string(), "80 %");
        assert_eq!(Payload::text("hi").unwrap().to_string(), "hi");
    }
}
