//! ==============================================================================
//! service.rs - the hub's operations
//! ==============================================================================
//!
//! purpose:
//!     composes the store, the sequence watermark and the analysis engine into
//!     the five operations the http layer exposes:
//!
//!     - ingest          parse + validate + persist one device payload
//!     - current_status  sensor health from the latest reading
//!     - history         raw readings, newest first
//!     - stats           per-metric statistics + anomalies over a window
//!     - analysis        correlations, hourly trend, aqi, suggestions
//!
//! relationships:
//!     - used by: server.rs (one call per request), main.rs (construction)
//!     - uses: store/ (ReadingStore), validator.rs, analysis/
//!
//! the service is cheap to clone: the store and the watermark are shared.
//!
//! ==============================================================================

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::sync::Arc;

use crate::analysis::{self, AnalysisResult, Summary};
use crate::domain::{NewReading, Reading, Sample};
use crate::error::SensorError;
use crate::store::ReadingStore;
use crate::validator::SequenceWatermark;

const NO_DATA: &str = "暂无数据";

#[derive(Clone)]
pub struct SensorService {
    store: Arc<dyn ReadingStore>,
    watermark: Arc<SequenceWatermark>,
    default_hours: i64,
    show_sensor_data: bool,
}

// ==============================================================================
// operation results
// ==============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum SensorHealth {
    #[serde(rename = "正常")]
    Normal,
    #[serde(rename = "异常")]
    Faulty,
}

#[derive(Debug, Serialize)]
pub struct StatusReport {
    pub sensor_status: SensorHealth,
    pub last_sequence: i64,
    pub last_data: Reading,
}

#[derive(Debug, Serialize)]
pub struct History {
    pub count: usize,
    pub data: Vec<Reading>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum StatsReport {
    Ready {
        hours: i64,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
        #[serde(flatten)]
        summary: Summary,
    },
    Empty {
        message: &'static str,
        hours: i64,
    },
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum AnalysisReport {
    Ready {
        hours: i64,
        #[serde(flatten)]
        result: AnalysisResult,
    },
    Empty {
        message: &'static str,
        hours: i64,
    },
}

// ==============================================================================
// operations
// ==============================================================================

impl SensorService {
    /// build the service, restoring the watermark from what is already stored
    pub async fn open(
        store: Arc<dyn ReadingStore>,
        default_hours: i64,
        show_sensor_data: bool,
    ) -> Result<Self, SensorError> {
        let restored = store.max_valid_sequence().await?.unwrap_or(0);
        tracing::info!("[STORE] Backend: {} | last valid sequence: {}", store.backend(), restored);

        Ok(Self {
            store,
            watermark: Arc::new(SequenceWatermark::new(restored)),
            default_hours: default_hours.max(1),
            show_sensor_data,
        })
    }

    /// parse a raw `a,b,c,d,e,f,g,seq` payload, classify it and store it
    pub async fn ingest(&self, payload: &str) -> Result<Reading, SensorError> {
        let sample: Sample = payload.parse()?;
        let is_valid = self.watermark.compare_and_advance(sample.sequence_num);

        let reading = self
            .store
            .insert(NewReading { created_at: Utc::now(), sample, is_valid })
            .await?;

        if !is_valid {
            tracing::warn!(
                "[INGEST] Sequence {} did not advance past {} - sensor may be faulty",
                reading.sequence_num,
                self.watermark.current()
            );
        }
        if self.show_sensor_data {
            tracing::info!(
                "[INGEST] #{} seq={} PM2.5: {:.1} | CO2: {:.0} | HCHO: {:.1} | VOC: {:.0} | Temp: {:.1}°C | Humidity: {:.1}%",
                reading.id,
                reading.sequence_num,
                reading.pm25,
                reading.co2,
                reading.hcho,
                reading.voc,
                reading.temperature,
                reading.humidity,
            );
        }
        Ok(reading)
    }

    pub async fn current_status(&self) -> Result<StatusReport, SensorError> {
        let latest = self.store.latest().await?.ok_or(SensorError::NotFound)?;
        Ok(StatusReport {
            sensor_status: if latest.is_valid { SensorHealth::Normal } else { SensorHealth::Faulty },
            last_sequence: latest.sequence_num,
            last_data: latest,
        })
    }

    /// non-positive `hours` / `limit` mean "unbounded"
    pub async fn history(
        &self,
        hours: Option<i64>,
        limit: Option<i64>,
    ) -> Result<History, SensorError> {
        let since = hours.filter(|h| *h > 0).map(|h| hours_before(Utc::now(), h));
        let limit = limit.filter(|l| *l > 0).and_then(|l| usize::try_from(l).ok());

        let data = self.store.recent(since, limit).await?;
        Ok(History { count: data.len(), data })
    }

    pub async fn stats(&self, hours: Option<i64>) -> Result<StatsReport, SensorError> {
        let hours = self.window_hours(hours);
        let end_time = Utc::now();
        let start_time = hours_before(end_time, hours);

        let readings = self.store.window(start_time).await?;
        Ok(match analysis::summarize(&readings) {
            Some(summary) => StatsReport::Ready { hours, start_time, end_time, summary },
            None => StatsReport::Empty { message: NO_DATA, hours },
        })
    }

    pub async fn analysis(&self, hours: Option<i64>) -> Result<AnalysisReport, SensorError> {
        let hours = self.window_hours(hours);
        let since = hours_before(Utc::now(), hours);

        let readings = self.store.window(since).await?;
        Ok(match analysis::analyze(&readings) {
            Some(result) => AnalysisReport::Ready { hours, result },
            None => AnalysisReport::Empty { message: NO_DATA, hours },
        })
    }

    fn window_hours(&self, hours: Option<i64>) -> i64 {
        hours.filter(|h| *h > 0).unwrap_or(self.default_hours)
    }
}

/// `now - hours`, saturating at the earliest representable instant
fn hours_before(now: DateTime<Utc>, hours: i64) -> DateTime<Utc> {
    Duration::try_hours(hours)
        .and_then(|d| now.checked_sub_signed(d))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}
