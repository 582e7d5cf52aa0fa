//! ==============================================================================
//! advice.rs - rule-based suggestions and threshold anomalies
//! ==============================================================================
//!
//! purpose:
//!     turns a single reading into human-readable advice for the dashboard.
//!
//!     - suggestions: every matching rule fires; comfort can co-occur with
//!       warnings; a default "all good" entry appears only when nothing fired
//!     - anomalies:   warning and danger tiers are independent, so a reading
//!       past the danger threshold produces both entries
//!
//! all thresholds are fixed constants.
//!
//! ==============================================================================

use serde::ser::{Serialize, SerializeStruct, Serializer};

use crate::domain::{Metric, Reading};

// ==============================================================================
// suggestions
// ==============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Suggestion {
    Cold,
    Hot,
    Dry,
    Humid,
    Ventilate,
    PurifyAir,
    Formaldehyde,
    Voc,
    Comfortable,
    AllGood,
}

impl Suggestion {
    /// category shown by the dashboard
    pub fn kind(self) -> &'static str {
        match self {
            Suggestion::Cold | Suggestion::Hot => "temperature",
            Suggestion::Dry | Suggestion::Humid => "humidity",
            Suggestion::Ventilate => "co2",
            Suggestion::PurifyAir => "pm25",
            Suggestion::Formaldehyde => "hcho",
            Suggestion::Voc => "voc",
            Suggestion::Comfortable => "comfort",
            Suggestion::AllGood => "good",
        }
    }

    pub fn icon(self) -> &'static str {
        match self {
            Suggestion::Cold => "cold",
            Suggestion::Hot => "hot",
            Suggestion::Dry => "dry",
            Suggestion::Humid => "wet",
            Suggestion::Ventilate => "ventilation",
            Suggestion::PurifyAir => "air",
            Suggestion::Formaldehyde | Suggestion::Voc => "warning",
            Suggestion::Comfortable | Suggestion::AllGood => "check",
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            Suggestion::Cold => "室温偏低，建议适当增加保暖",
            Suggestion::Hot => "室温偏高，建议开启空调或通风降温",
            Suggestion::Dry => "空气干燥，建议使用加湿器",
            Suggestion::Humid => "湿度过高，建议通风或使用除湿机",
            Suggestion::Ventilate => "CO2浓度偏高，建议开窗通风",
            Suggestion::PurifyAir => "PM2.5超标，建议使用空气净化器",
            Suggestion::Formaldehyde => "甲醛偏高，建议开窗通风并检查污染源",
            Suggestion::Voc => "VOC偏高，建议通风换气",
            Suggestion::Comfortable => "当前温湿度处于舒适区间",
            Suggestion::AllGood => "室内环境良好，无需调整",
        }
    }
}

impl Serialize for Suggestion {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("Suggestion", 3)?;
        s.serialize_field("type", self.kind())?;
        s.serialize_field("icon", self.icon())?;
        s.serialize_field("message", self.message())?;
        s.end()
    }
}

const COMFORT_TEMPERATURE: (f64, f64) = (20.0, 24.0);
const COMFORT_HUMIDITY: (f64, f64) = (40.0, 60.0);

fn within(value: f64, (low, high): (f64, f64)) -> bool {
    value >= low && value <= high
}

pub fn suggest(r: &Reading) -> Vec<Suggestion> {
    let mut out = Vec::new();

    if r.temperature < 18.0 {
        out.push(Suggestion::Cold);
    } else if r.temperature > 26.0 {
        out.push(Suggestion::Hot);
    }

    if r.humidity < 30.0 {
        out.push(Suggestion::Dry);
    } else if r.humidity > 70.0 {
        out.push(Suggestion::Humid);
    }

    if r.co2 > 1000.0 {
        out.push(Suggestion::Ventilate);
    }
    if r.pm25 > 75.0 {
        out.push(Suggestion::PurifyAir);
    }
    if r.hcho > 80.0 {
        out.push(Suggestion::Formaldehyde);
    }
    if r.voc > 500.0 {
        out.push(Suggestion::Voc);
    }

    if within(r.temperature, COMFORT_TEMPERATURE) && within(r.humidity, COMFORT_HUMIDITY) {
        out.push(Suggestion::Comfortable);
    }

    if out.is_empty() {
        out.push(Suggestion::AllGood);
    }
    out
}

// ==============================================================================
// anomalies
// ==============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Danger,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AnomalyKind {
    Pm25,
    Co2,
    Hcho,
    Voc,
    /// sequence number did not advance
    Sensor,
}

#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize)]
pub struct Anomaly {
    #[serde(rename = "type")]
    pub kind: AnomalyKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub threshold: Option<f64>,
    pub level: Severity,
    pub message: &'static str,
}

struct ThresholdRule {
    kind: AnomalyKind,
    metric: Metric,
    threshold: f64,
    level: Severity,
    message: &'static str,
}

const RULES: &[ThresholdRule] = &[
    ThresholdRule { kind: AnomalyKind::Pm25, metric: Metric::Pm25, threshold: 75.0, level: Severity::Warning, message: "PM2.5 超标" },
    ThresholdRule { kind: AnomalyKind::Pm25, metric: Metric::Pm25, threshold: 150.0, level: Severity::Danger, message: "PM2.5 严重超标" },
    ThresholdRule { kind: AnomalyKind::Co2, metric: Metric::Co2, threshold: 1000.0, level: Severity::Warning, message: "CO2 偏高，建议通风" },
    ThresholdRule { kind: AnomalyKind::Co2, metric: Metric::Co2, threshold: 2000.0, level: Severity::Danger, message: "CO2 严重超标" },
    ThresholdRule { kind: AnomalyKind::Hcho, metric: Metric::Hcho, threshold: 80.0, level: Severity::Warning, message: "甲醛偏高" },
    ThresholdRule { kind: AnomalyKind::Hcho, metric: Metric::Hcho, threshold: 100.0, level: Severity::Danger, message: "甲醛超标" },
    ThresholdRule { kind: AnomalyKind::Voc, metric: Metric::Voc, threshold: 500.0, level: Severity::Warning, message: "VOC 偏高" },
];

/// every threshold the reading exceeds, plus a sensor fault for suspect readings
pub fn detect_anomalies(r: &Reading) -> Vec<Anomaly> {
    let mut out: Vec<Anomaly> = RULES
        .iter()
        .filter_map(|rule| {
            let value = rule.metric.of(r);
            (value > rule.threshold).then_some(Anomaly {
                kind: rule.kind,
                value: Some(value),
                threshold: Some(rule.threshold),
                level: rule.level,
                message: rule.message,
            })
        })
        .collect();

    if !r.is_valid {
        out.push(Anomaly {
            kind: AnomalyKind::Sensor,
            value: None,
            threshold: None,
            level: Severity::Danger,
            message: "传感器可能故障",
        });
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::fixtures;

    #[test]
    fn comfortable_room_gets_only_the_comfort_message() {
        let r = fixtures::reading();
        assert_eq!(suggest(&r), vec![Suggestion::Comfortable]);
    }

    #[test]
    fn nothing_fired_yields_the_default() {
        // outside comfort range but inside every warning limit
        let r = Reading { temperature: 25.0, humidity: 35.0, ..fixtures::reading() };
        assert_eq!(suggest(&r), vec![Suggestion::AllGood]);
    }

    #[test]
    fn every_matching_rule_fires() {
        let r = Reading {
            temperature: 15.0,
            humidity: 80.0,
            co2: 1500.0,
            pm25: 90.0,
            hcho: 95.0,
            voc: 650.0,
            ..fixtures::reading()
        };
        assert_eq!(
            suggest(&r),
            vec![
                Suggestion::Cold,
                Suggestion::Humid,
                Suggestion::Ventilate,
                Suggestion::PurifyAir,
                Suggestion::Formaldehyde,
                Suggestion::Voc,
            ]
        );
    }

    #[test]
    fn comfort_co_occurs_with_air_warnings() {
        let r = Reading { co2: 1200.0, ..fixtures::reading() };
        assert_eq!(suggest(&r), vec![Suggestion::Ventilate, Suggestion::Comfortable]);
    }

    #[test]
    fn hot_and_dry() {
        let r = Reading { temperature: 30.0, humidity: 20.0, ..fixtures::reading() };
        assert_eq!(suggest(&r), vec![Suggestion::Hot, Suggestion::Dry]);
    }

    #[test]
    fn comfort_range_is_inclusive() {
        let r = Reading { temperature: 20.0, humidity: 60.0, ..fixtures::reading() };
        assert_eq!(suggest(&r), vec![Suggestion::Comfortable]);
        let r = Reading { temperature: 24.0, humidity: 40.0, ..fixtures::reading() };
        assert_eq!(suggest(&r), vec![Suggestion::Comfortable]);
    }

    #[test]
    fn suggestion_serializes_as_tagged_record() {
        let json = serde_json::to_value(Suggestion::Humid).unwrap();
        assert_eq!(json["type"], "humidity");
        assert_eq!(json["icon"], "wet");
        assert_eq!(json["message"], "湿度过高，建议通风或使用除湿机");
    }

    #[test]
    fn nominal_reading_has_no_anomalies() {
        assert!(detect_anomalies(&fixtures::reading()).is_empty());
    }

    #[test]
    fn pm25_danger_also_reports_the_warning() {
        let r = Reading { pm25: 160.0, ..fixtures::reading() };
        let anomalies = detect_anomalies(&r);
        assert_eq!(anomalies.len(), 2);
        assert_eq!(anomalies[0].level, Severity::Warning);
        assert_eq!(anomalies[0].threshold, Some(75.0));
        assert_eq!(anomalies[1].level, Severity::Danger);
        assert_eq!(anomalies[1].threshold, Some(150.0));
        assert!(anomalies.iter().all(|a| a.kind == AnomalyKind::Pm25 && a.value == Some(160.0)));
    }

    #[test]
    fn thresholds_are_strict() {
        let r = Reading { pm25: 75.0, co2: 1000.0, hcho: 80.0, voc: 500.0, ..fixtures::reading() };
        assert!(detect_anomalies(&r).is_empty());
    }

    #[test]
    fn all_tiers_and_sensor_fault() {
        let r = Reading {
            pm25: 200.0,
            co2: 2500.0,
            hcho: 120.0,
            voc: 900.0,
            is_valid: false,
            ..fixtures::reading()
        };
        let kinds: Vec<(AnomalyKind, Severity)> =
            detect_anomalies(&r).iter().map(|a| (a.kind, a.level)).collect();
        assert_eq!(
            kinds,
            vec![
                (AnomalyKind::Pm25, Severity::Warning),
                (AnomalyKind::Pm25, Severity::Danger),
                (AnomalyKind::Co2, Severity::Warning),
                (AnomalyKind::Co2, Severity::Danger),
                (AnomalyKind::Hcho, Severity::Warning),
                (AnomalyKind::Hcho, Severity::Danger),
                (AnomalyKind::Voc, Severity::Warning),
                (AnomalyKind::Sensor, Severity::Danger),
            ]
        );
    }

    #[test]
    fn sensor_fault_omits_value_and_threshold() {
        let r = Reading { is_valid: false, ..fixtures::reading() };
        let json = serde_json::to_value(detect_anomalies(&r)).unwrap();
        assert_eq!(json[0]["type"], "sensor");
        assert_eq!(json[0]["level"], "danger");
        assert!(json[0].get("value").is_none());
        assert!(json[0].get("threshold").is_none());
    }
}
