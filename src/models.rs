use serde::Serialize;
use serde_json::Value;

/// One set of readings delivered by the sensor node.
///
/// Every field is optional: a missing or non-numeric value is kept as `None`
/// so it can be shown as a placeholder instead of a fake zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct SensorSnapshot {
    pub pm25: Option<f64>,
    pub pm10: Option<f64>,
    pub co2: Option<f64>,
    pub nox: Option<f64>,
    pub mq135: Option<f64>,
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
}

impl SensorSnapshot {
    /// Build a snapshot from the JSON value stored at the sensor path.
    ///
    /// Numbers and numeric strings are accepted, anything else reads as
    /// absent. A non-object value yields a snapshot with no readings.
    pub fn from_value(value: &Value) -> Self {
        let field = |key: &str| reading(value.get(key));

        SensorSnapshot {
            pm25: field("pm25"),
            pm10: field("pm10"),
            co2: field("co2"),
            nox: field("nox"),
            mq135: field("mq135"),
            temperature: field("temperature"),
            humidity: field("humidity"),
        }
    }

    pub fn get(&self, field: SensorField) -> Option<f64> {
        match field {
            SensorField::Pm25 => self.pm25,
            SensorField::Pm10 => self.pm10,
            SensorField::Co2 => self.co2,
            SensorField::Nox => self.nox,
            SensorField::Mq135 => self.mq135,
            SensorField::Temperature => self.temperature,
            SensorField::Humidity => self.humidity,
        }
    }
}

fn reading(value: Option<&Value>) -> Option<f64> {
    let number = match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;

    number.is_finite().then_some(number)
}

/// A snapshot plus the display time at which it was received.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimestampedSample {
    pub time: String,
    #[serde(flatten)]
    pub snapshot: SensorSnapshot,
}

/// Message sent from the subscription transport to the dashboard.
#[derive(Debug, Clone, PartialEq)]
pub enum SnapshotEvent {
    /// The path holds data
    Data(SensorSnapshot),
    /// The path exists but holds nothing
    Empty,
    /// The stream is back after a failure and the data has not changed
    Resumed,
    /// The transport reported a failure
    Error(String),
}

/// The measured quantities, in chart order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SensorField {
    Pm25,
    Pm10,
    Co2,
    Nox,
    Mq135,
    Temperature,
    Humidity,
}

impl SensorField {
    pub const ALL: [SensorField; 7] = [
        SensorField::Pm25,
        SensorField::Pm10,
        SensorField::Co2,
        SensorField::Nox,
        SensorField::Mq135,
        SensorField::Temperature,
        SensorField::Humidity,
    ];

    /// Key of the field in the database record
    pub fn key(&self) -> &'static str {
        match self {
            SensorField::Pm25 => "pm25",
            SensorField::Pm10 => "pm10",
            SensorField::Co2 => "co2",
            SensorField::Nox => "nox",
            SensorField::Mq135 => "mq135",
            SensorField::Temperature => "temperature",
            SensorField::Humidity => "humidity",
        }
    }

    /// Card title
    pub fn title(&self) -> &'static str {
        match self {
            SensorField::Pm25 => "PM2.5",
            SensorField::Pm10 => "PM10",
            SensorField::Co2 => "Carbon Dioxide (CO₂)",
            SensorField::Nox => "Nitrogen Oxides (NOx)",
            SensorField::Mq135 => "Air Quality Index",
            SensorField::Temperature => "Temperature",
            SensorField::Humidity => "Humidity",
        }
    }

    pub fn unit(&self) -> &'static str {
        match self {
            SensorField::Pm25 | SensorField::Pm10 => "µg/m³",
            SensorField::Co2 | SensorField::Nox | SensorField::Mq135 => "ppm",
            SensorField::Temperature => "°C",
            SensorField::Humidity => "%",
        }
    }

    /// Legend name of the chart series
    pub fn series_name(&self) -> &'static str {
        match self {
            SensorField::Pm25 => "PM2.5",
            SensorField::Pm10 => "PM10",
            SensorField::Co2 => "CO₂",
            SensorField::Nox => "NOx",
            SensorField::Mq135 => "AQI (MQ135)",
            SensorField::Temperature => "Temp (°C)",
            SensorField::Humidity => "Humidity (%)",
        }
    }

    /// Stroke color of the chart series
    pub fn color(&self) -> &'static str {
        match self {
            SensorField::Pm25 => "#f87171",
            SensorField::Pm10 => "#60a5fa",
            SensorField::Co2 => "#d1d5db",
            SensorField::Nox => "#c084fc",
            SensorField::Mq135 => "#f472b6",
            SensorField::Temperature => "#f59e0b",
            SensorField::Humidity => "#38bdf8",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[test]
    fn test_from_full_record() {
        let value = json!({
            "pm25": 42.5,
            "pm10": 80,
            "co2": 415.2,
            "nox": 0.03,
            "mq135": 120,
            "temperature": 29.4,
            "humidity": 61,
            "node": "esp32-1"
        });

        let snapshot = SensorSnapshot::from_value(&value);
        assert_eq!(snapshot.pm25, Some(42.5));
        assert_eq!(snapshot.pm10, Some(80.0));
        assert_eq!(snapshot.co2, Some(415.2));
        assert_eq!(snapshot.nox, Some(0.03));
        assert_eq!(snapshot.mq135, Some(120.0));
        assert_eq!(snapshot.temperature, Some(29.4));
        assert_eq!(snapshot.humidity, Some(61.0));
    }

    #[rstest]
    #[case(json!({"pm25": null}), None)]
    #[case(json!({}), None)]
    #[case(json!({"pm25": "n/a"}), None)]
    #[case(json!({"pm25": true}), None)]
    #[case(json!({"pm25": [1, 2]}), None)]
    #[case(json!({"pm25": {"value": 3}}), None)]
    #[case(json!({"pm25": " 17.25 "}), Some(17.25))]
    #[case(json!({"pm25": "NaN"}), None)]
    #[case(json!({"pm25": "inf"}), None)]
    #[case(json!({"pm25": 0}), Some(0.0))]
    fn test_lenient_readings(#[case] value: Value, #[case] expected: Option<f64>) {
        assert_eq!(SensorSnapshot::from_value(&value).pm25, expected);
    }

    #[test]
    fn test_non_object_root() {
        assert_eq!(
            SensorSnapshot::from_value(&json!(12.5)),
            SensorSnapshot::default()
        );
        assert_eq!(
            SensorSnapshot::from_value(&json!("offline")),
            SensorSnapshot::default()
        );
    }

    #[test]
    fn test_get_matches_keys() {
        let value = json!({
            "pm25": 1, "pm10": 2, "co2": 3, "nox": 4,
            "mq135": 5, "temperature": 6, "humidity": 7
        });
        let snapshot = SensorSnapshot::from_value(&value);

        for (i, field) in SensorField::ALL.iter().enumerate() {
            assert_eq!(snapshot.get(*field), Some((i + 1) as f64));
            assert_eq!(value[field.key()], json!(i + 1));
        }
    }

    #[test]
    fn test_sample_serializes_flat() {
        let sample = TimestampedSample {
            time: "09:05".into(),
            snapshot: SensorSnapshot {
                pm25: Some(12.0),
                ..Default::default()
            },
        };

        let value = serde_json::to_value(&sample).unwrap();
        assert_eq!(value["time"], "09:05");
        assert_eq!(value["pm25"], 12.0);
        assert_eq!(value["pm10"], Value::Null);
    }
}
