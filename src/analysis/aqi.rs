//! ==============================================================================
//! aqi.rs - air quality index and composite comfort score
//! ==============================================================================
//!
//! purpose:
//!     maps the latest PM2.5 / CO2 / VOC values onto qualitative levels, a
//!     PM2.5 sub-index (simplified chinese HJ 633 breakpoints) and a 0-100
//!     overall score.
//!
//! structure:
//!     every threshold ladder is an ordered breakpoint table (`Ladder`) that
//!     is evaluated by the same lookup. each band can be tested on its own by
//!     probing its edges.
//!
//!     PM2.5 (ug/m3)   AQI segment    level
//!     ------------    -----------    --------
//!       0 -  35         0 -  50      优
//!      35 -  75        50 - 100      良
//!      75 - 115       100 - 150      轻度污染
//!     115 - 150       150 - 200      中度污染
//!     150 - 250       200 - 300      重度污染
//!     > 250           300 + 1/ug     严重污染
//!
//! ==============================================================================

use serde::Serialize;

use super::round_to;

// ==============================================================================
// breakpoint tables
// ==============================================================================

#[derive(Clone, Copy, Debug)]
enum Edge {
    /// step applies while value <= edge (ascending tables)
    AtMost,
    /// step applies while value >= edge (descending tables)
    AtLeast,
}

/// ordered threshold table: the first matching step wins, `otherwise`
/// covers everything past the last edge (and NaN)
#[derive(Debug)]
struct Ladder<T: 'static> {
    edge: Edge,
    steps: &'static [(f64, T)],
    otherwise: T,
}

impl<T> Ladder<T> {
    fn lookup(&self, value: f64) -> &T {
        self.steps
            .iter()
            .find(|(edge, _)| match self.edge {
                Edge::AtMost => value <= *edge,
                Edge::AtLeast => value >= *edge,
            })
            .map(|(_, step)| step)
            .unwrap_or(&self.otherwise)
    }
}

/// one PM2.5 band: concentration range mapped linearly onto an AQI range
#[derive(Debug)]
struct Pm25Band {
    level: Pm25Level,
    conc: (f64, f64),
    aqi: (f64, f64),
}

impl Pm25Band {
    const fn new(level: Pm25Level, conc: (f64, f64), aqi: (f64, f64)) -> Self {
        Self { level, conc, aqi }
    }

    fn index(&self, pm25: f64) -> f64 {
        let (conc_low, conc_high) = self.conc;
        let (aqi_low, aqi_high) = self.aqi;
        aqi_low + (pm25 - conc_low) * (aqi_high - aqi_low) / (conc_high - conc_low)
    }
}

static PM25: Ladder<Pm25Band> = Ladder {
    edge: Edge::AtMost,
    steps: &[
        (35.0, Pm25Band::new(Pm25Level::Excellent, (0.0, 35.0), (0.0, 50.0))),
        (75.0, Pm25Band::new(Pm25Level::Good, (35.0, 75.0), (50.0, 100.0))),
        (115.0, Pm25Band::new(Pm25Level::LightlyPolluted, (75.0, 115.0), (100.0, 150.0))),
        (150.0, Pm25Band::new(Pm25Level::ModeratelyPolluted, (115.0, 150.0), (150.0, 200.0))),
        (250.0, Pm25Band::new(Pm25Level::HeavilyPolluted, (150.0, 250.0), (200.0, 300.0))),
    ],
    // open-ended: one AQI point per ug/m3 past 250
    otherwise: Pm25Band::new(Pm25Level::SeverelyPolluted, (250.0, 350.0), (300.0, 400.0)),
};

static CO2: Ladder<AirLevel> = Ladder {
    edge: Edge::AtMost,
    steps: &[
        (450.0, AirLevel::Excellent),
        (700.0, AirLevel::Good),
        (1000.0, AirLevel::Fair),
        (2000.0, AirLevel::Poor),
    ],
    otherwise: AirLevel::VeryPoor,
};

static VOC: Ladder<AirLevel> = Ladder {
    edge: Edge::AtMost,
    steps: &[
        (200.0, AirLevel::Excellent),
        (400.0, AirLevel::Good),
        (600.0, AirLevel::Fair),
    ],
    otherwise: AirLevel::Poor,
};

static OVERALL: Ladder<AirLevel> = Ladder {
    edge: Edge::AtLeast,
    steps: &[
        (80.0, AirLevel::Excellent),
        (60.0, AirLevel::Good),
        (40.0, AirLevel::Fair),
    ],
    otherwise: AirLevel::Poor,
};

// score penalties: (free allowance, points lost per unit above it)
const PM25_AQI_PENALTY: (f64, f64) = (50.0, 0.5);
const CO2_PENALTY: (f64, f64) = (700.0, 0.02);
const VOC_PENALTY: (f64, f64) = (300.0, 0.05);

// ==============================================================================
// levels
// ==============================================================================

/// PM2.5 pollution level, serialized with the dashboard's labels
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Pm25Level {
    #[serde(rename = "优")]
    Excellent,
    #[serde(rename = "良")]
    Good,
    #[serde(rename = "轻度污染")]
    LightlyPolluted,
    #[serde(rename = "中度污染")]
    ModeratelyPolluted,
    #[serde(rename = "重度污染")]
    HeavilyPolluted,
    #[serde(rename = "严重污染")]
    SeverelyPolluted,
}

/// generic quality level used for CO2, VOC and the overall score
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum AirLevel {
    #[serde(rename = "优秀")]
    Excellent,
    #[serde(rename = "良好")]
    Good,
    #[serde(rename = "一般")]
    Fair,
    #[serde(rename = "较差")]
    Poor,
    #[serde(rename = "很差")]
    VeryPoor,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct AqiResult {
    pub pm25_aqi: i64,
    pub pm25_level: Pm25Level,
    pub co2_level: AirLevel,
    pub voc_level: AirLevel,
    pub overall_score: i64,
    pub overall_level: AirLevel,
}

/// unrounded PM2.5 sub-index and its level
pub fn pm25_index(pm25: f64) -> (f64, Pm25Level) {
    let band = PM25.lookup(pm25);
    (band.index(pm25), band.level)
}

pub fn co2_level(co2: f64) -> AirLevel {
    *CO2.lookup(co2)
}

pub fn voc_level(voc: f64) -> AirLevel {
    *VOC.lookup(voc)
}

pub fn overall_level(score: f64) -> AirLevel {
    *OVERALL.lookup(score)
}

fn penalty(value: f64, (allowance, rate): (f64, f64)) -> f64 {
    if value > allowance {
        (value - allowance) * rate
    } else {
        0.0
    }
}

pub fn score(pm25: f64, co2: f64, voc: f64) -> AqiResult {
    let (aqi, pm25_level) = pm25_index(pm25);

    let score = (100.0
        - penalty(aqi, PM25_AQI_PENALTY)
        - penalty(co2, CO2_PENALTY)
        - penalty(voc, VOC_PENALTY))
        .max(0.0);

    AqiResult {
        pm25_aqi: round_to(aqi, 0) as i64,
        pm25_level,
        co2_level: co2_level(co2),
        voc_level: voc_level(voc),
        overall_score: round_to(score, 0) as i64,
        overall_level: overall_level(score),
    }
}
