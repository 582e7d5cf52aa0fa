//! hour-of-day aggregation and peak-hour detection

use chrono::{Local, Timelike};
use serde::Serialize;

use super::round_to;
use crate::domain::Reading;

/// averages of every reading received during one hour of the day
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct HourlyBucket {
    pub hour: u32,
    pub pm25: f64,
    pub co2: f64,
    pub hcho: f64,
    pub voc: f64,
    pub temperature: f64,
    pub humidity: f64,
    pub count: usize,
}

#[derive(Clone, Copy, Default)]
struct Sums {
    pm25: f64,
    co2: f64,
    hcho: f64,
    voc: f64,
    temperature: f64,
    humidity: f64,
    count: usize,
}

impl Sums {
    fn add(&mut self, r: &Reading) {
        self.pm25 += r.pm25;
        self.co2 += r.co2;
        self.hcho += r.hcho;
        self.voc += r.voc;
        self.temperature += r.temperature;
        self.humidity += r.humidity;
        self.count += 1;
    }

    fn mean(&self, hour: u32) -> HourlyBucket {
        let n = self.count as f64;
        let avg = |sum: f64| round_to(sum / n, 2);
        HourlyBucket {
            hour,
            pm25: avg(self.pm25),
            co2: avg(self.co2),
            hcho: avg(self.hcho),
            voc: avg(self.voc),
            temperature: avg(self.temperature),
            humidity: avg(self.humidity),
            count: self.count,
        }
    }
}

/// local wall-clock hour the reading was received in
pub fn hour_of(reading: &Reading) -> u32 {
    reading.created_at.with_timezone(&Local).hour()
}

/// bucket readings by hour of day; only hours with data are emitted,
/// in ascending order
pub fn aggregate_by_hour(readings: &[Reading]) -> Vec<HourlyBucket> {
    let mut hours = [Sums::default(); 24];
    for r in readings {
        hours[hour_of(r) as usize].add(r);
    }

    hours
        .iter()
        .zip(0u32..)
        .filter(|(sums, _)| sums.count > 0)
        .map(|(sums, hour)| sums.mean(hour))
        .collect()
}

#[derive(Clone, Copy, Debug, PartialEq, Default, Serialize)]
pub struct PeakHour {
    pub hour: u32,
    pub value: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Default, Serialize)]
pub struct PeakHours {
    pub pm25: PeakHour,
    pub co2: PeakHour,
}

impl PeakHours {
    pub fn from_buckets(buckets: &[HourlyBucket]) -> Self {
        Self {
            pm25: peak_by(buckets, |b| b.pm25),
            co2: peak_by(buckets, |b| b.co2),
        }
    }
}

/// first bucket with the strictly highest average. the running maximum
/// starts at hour 0 / value 0, so an all-zero series reports hour 0.
fn peak_by(buckets: &[HourlyBucket], value: impl Fn(&HourlyBucket) -> f64) -> PeakHour {
    buckets.iter().fold(PeakHour::default(), |peak, b| {
        let v = value(b);
        if v > peak.value {
            PeakHour { hour: b.hour, value: v }
        } else {
            peak
        }
    })
}
