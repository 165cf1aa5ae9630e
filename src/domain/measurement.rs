// Pollutant and weather measurements recorded at each station
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Measurement {
    Pm25,
    Pm10,
    So2,
    No2,
    Co,
    O3,
    Temp,
    Pres,
    Dewp,
    Rain,
    Wspm,
}

impl Measurement {
    pub const ALL: [Measurement; 11] = [
        Measurement::Pm25,
        Measurement::Pm10,
        Measurement::So2,
        Measurement::No2,
        Measurement::Co,
        Measurement::O3,
        Measurement::Temp,
        Measurement::Pres,
        Measurement::Dewp,
        Measurement::Rain,
        Measurement::Wspm,
    ];

    /// Column header used by the source dataset
    pub fn column_name(self) -> &'static str {
        match self {
            Measurement::Pm25 => "PM2.5",
            Measurement::Pm10 => "PM10",
            Measurement::So2 => "SO2",
            Measurement::No2 => "NO2",
            Measurement::Co => "CO",
            Measurement::O3 => "O3",
            Measurement::Temp => "TEMP",
            Measurement::Pres => "PRES",
            Measurement::Dewp => "DEWP",
            Measurement::Rain => "RAIN",
            Measurement::Wspm => "WSPM",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Measurement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column_name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown measurement: {0}")]
pub struct UnknownMeasurement(pub String);

impl FromStr for Measurement {
    type Err = UnknownMeasurement;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Measurement::ALL
            .into_iter()
            .find(|m| m.column_name().eq_ignore_ascii_case(wanted))
            .or_else(|| match wanted.to_ascii_lowercase().as_str() {
                "pm25" | "pm2_5" => Some(Measurement::Pm25),
                _ => None,
            })
            .ok_or_else(|| UnknownMeasurement(wanted.to_string()))
    }
}

impl Serialize for Measurement {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.column_name())
    }
}

/// One value slot per measurement; `None` marks a missing observation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Measurements([Option<f64>; 11]);

impl Measurements {
    pub fn get(&self, measurement: Measurement) -> Option<f64> {
        self.0[measurement.index()]
    }

    pub fn set(&mut self, measurement: Measurement, value: Option<f64>) {
        // NaN is the missing sentinel in the source data
        self.0[measurement.index()] = value.filter(|v| v.is_finite());
    }

    pub fn with(mut self, measurement: Measurement, value: f64) -> Self {
        self.set(measurement, Some(value));
        self
    }
}

impl Serialize for Measurements {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(Measurement::ALL.len()))?;
        for m in Measurement::ALL {
            map.serialize_entry(m.column_name(), &self.get(m))?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_measurement_names() {
        assert_eq!("PM2.5".parse::<Measurement>().unwrap(), Measurement::Pm25);
        assert_eq!("pm2.5".parse::<Measurement>().unwrap(), Measurement::Pm25);
        assert_eq!("pm25".parse::<Measurement>().unwrap(), Measurement::Pm25);
        assert_eq!("wspm".parse::<Measurement>().unwrap(), Measurement::Wspm);
        assert!("humidity".parse::<Measurement>().is_err());
    }

    #[test]
    fn test_nan_is_missing() {
        let mut values = Measurements::default();
        values.set(Measurement::Co, Some(f64::NAN));
        assert_eq!(values.get(Measurement::Co), None);

        values.set(Measurement::Co, Some(300.0));
        assert_eq!(values.get(Measurement::Co), Some(300.0));
    }
}
