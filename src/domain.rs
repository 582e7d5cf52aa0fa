use chrono::{DateTime, Utc};
use serde::Serialize;
use std::str::FromStr;

use crate::error::FormatError;

/// number of comma-separated fields the device sends per sample
pub const FIELD_COUNT: usize = 8;

/// one sample as parsed from the device payload, before validation
///
/// field order on the wire:
///     particle, pm25, hcho, co2, temperature, humidity, voc, sequence_num
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct Sample {
    /// particles > 0.3um per 0.1L
    pub particle: f64,
    /// PM2.5 in ug/m3
    pub pm25: f64,
    /// formaldehyde in ug/m3
    pub hcho: f64,
    /// CO2 in ppm
    pub co2: f64,
    /// temperature in celsius
    pub temperature: f64,
    /// relative humidity (0-100%)
    pub humidity: f64,
    /// VOC in ppb
    pub voc: f64,
    /// device-assigned counter, expected to increase on every sample
    pub sequence_num: i64,
}

impl FromStr for Sample {
    type Err = FormatError;

    fn from_str(payload: &str) -> Result<Self, Self::Err> {
        let fields: Vec<&str> = payload.split(',').collect();
        if fields.len() != FIELD_COUNT {
            return Err(FormatError::FieldCount {
                expected: FIELD_COUNT,
                found: fields.len(),
            });
        }

        let mut values = [0.0_f64; FIELD_COUNT];
        for (i, field) in fields.iter().enumerate() {
            let field = field.trim();
            // NaN and infinities parse as f64 but are not measurements
            values[i] = field
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .ok_or_else(|| FormatError::NotNumeric {
                    index: i + 1,
                    value: field.to_string(),
                })?;
        }

        Ok(Self {
            particle: values[0],
            pm25: values[1],
            hcho: values[2],
            co2: values[3],
            temperature: values[4],
            humidity: values[5],
            voc: values[6],
            // the device sends the counter as a decimal; truncate toward zero
            sequence_num: values[7] as i64,
        })
    }
}

/// a validated sample stamped with its reception time, ready to be stored
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NewReading {
    pub created_at: DateTime<Utc>,
    pub sample: Sample,
    pub is_valid: bool,
}

/// a stored sensor reading
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Reading {
    /// store-assigned identity
    pub id: i64,
    /// when the hub received the sample (not the device clock)
    pub created_at: DateTime<Utc>,
    pub particle: f64,
    pub pm25: f64,
    pub hcho: f64,
    pub co2: f64,
    pub temperature: f64,
    pub humidity: f64,
    pub voc: f64,
    pub sequence_num: i64,
    /// false when the sequence number did not advance (sensor may be faulty)
    pub is_valid: bool,
}

impl Reading {
    pub fn from_new(id: i64, new: NewReading) -> Self {
        let s = new.sample;
        Self {
            id,
            created_at: new.created_at,
            particle: s.particle,
            pm25: s.pm25,
            hcho: s.hcho,
            co2: s.co2,
            temperature: s.temperature,
            humidity: s.humidity,
            voc: s.voc,
            sequence_num: s.sequence_num,
            is_valid: new.is_valid,
        }
    }
}

/// the numeric channels of a reading
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    Particle,
    Pm25,
    Hcho,
    Co2,
    Temperature,
    Humidity,
    Voc,
}

impl Metric {
    pub const ALL: [Metric; 7] = [
        Metric::Particle,
        Metric::Pm25,
        Metric::Hcho,
        Metric::Co2,
        Metric::Temperature,
        Metric::Humidity,
        Metric::Voc,
    ];

    pub fn of(self, reading: &Reading) -> f64 {
        match self {
            Metric::Particle => reading.particle,
            Metric::Pm25 => reading.pm25,
            Metric::Hcho => reading.hcho,
            Metric::Co2 => reading.co2,
            Metric::Temperature => reading.temperature,
            Metric::Humidity => reading.humidity,
            Metric::Voc => reading.voc,
        }
    }

    /// the metric's values across a series, in series order
    pub fn series(self, readings: &[Reading]) -> Vec<f64> {
        readings.iter().map(|r| self.of(r)).collect()
    }
}
