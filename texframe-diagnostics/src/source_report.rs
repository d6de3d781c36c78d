//! Serializable snapshots of a frame source

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use texframe_core::TexFrameError;
use texframe_media::{CaptureState, SourceKind, SourceStats, TextureFrameSource};

/// Point-in-time report on one texture frame source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceReport {
    /// When the snapshot was taken
    pub generated_at: DateTime<Utc>,
    /// Source variant
    pub source: SourceKind,
    /// Whether the source was started
    pub started: bool,
    /// Capture device state name, for camera sources
    pub device_state: Option<String>,
    /// Device fault description when the device is in ERROR
    pub fault: Option<String>,
    /// Whether frames are rotated relative to the display
    pub rotated: bool,
    /// Frame delivery counters
    pub stats: SourceStats,
}

impl SourceReport {
    /// Snapshot a live source
    pub fn capture(source: &dyn TextureFrameSource) -> Self {
        Self::from_parts(
            source.kind(),
            source.is_started(),
            source.device_state().as_ref(),
            source.is_rotated(),
            source.stats(),
        )
    }

    /// Build a report from already collected values
    pub fn from_parts(
        source: SourceKind,
        started: bool,
        state: Option<&CaptureState>,
        rotated: bool,
        stats: SourceStats,
    ) -> Self {
        Self {
            generated_at: Utc::now(),
            source,
            started,
            device_state: state.map(|state| state.name().to_string()),
            fault: state
                .and_then(CaptureState::fault)
                .map(|fault| fault.to_string()),
            rotated,
            stats,
        }
    }

    /// Share of produced frames that never reached the consumer
    pub fn drop_rate(&self) -> f64 {
        let dropped = self.stats.frames_dropped();
        let total = self.stats.frames_delivered + dropped;
        if total == 0 {
            0.0
        } else {
            dropped as f64 / total as f64
        }
    }

    /// Pretty JSON rendering
    pub fn to_json(&self) -> Result<String, TexFrameError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse a report rendered by [`SourceReport::to_json`]
    pub fn from_json(json: &str) -> Result<Self, TexFrameError> {
        Ok(serde_json::from_str(json)?)
    }

    /// One-line human readable summary
    pub fn summary(&self) -> String {
        format!(
            "{} [{}] delivered={} dropped={} ({:.1}%){}",
            self.source,
            self.device_state.as_deref().unwrap_or(if self.started {
                "STARTED"
            } else {
                "STOPPED"
            }),
            self.stats.frames_delivered,
            self.stats.frames_dropped(),
            self.drop_rate() * 100.0,
            self.fault
                .as_deref()
                .map(|fault| format!(" fault: {fault}"))
                .unwrap_or_default(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use texframe_media::DeviceFault;

    fn stats(delivered: u64, unbound: u64) -> SourceStats {
        SourceStats {
            frames_delivered: delivered,
            frames_dropped_unbound: unbound,
            ..SourceStats::default()
        }
    }

    #[test]
    fn test_report_from_previewing_camera() {
        let report = SourceReport::from_parts(
            SourceKind::Camera2,
            true,
            Some(&CaptureState::Previewing),
            true,
            stats(90, 10),
        );
        assert_eq!(report.device_state.as_deref(), Some("PREVIEWING"));
        assert!(report.fault.is_none());
        assert!((report.drop_rate() - 0.1).abs() < f64::EPSILON);
        assert_eq!(
            report.summary(),
            "Camera2 [PREVIEWING] delivered=90 dropped=10 (10.0%)"
        );
    }

    #[test]
    fn test_report_records_fault() {
        let state = CaptureState::Error(DeviceFault::DeviceError { code: 2 });
        let report =
            SourceReport::from_parts(SourceKind::CameraX, true, Some(&state), false, stats(0, 0));
        assert_eq!(report.device_state.as_deref(), Some("ERROR"));
        assert_eq!(report.fault.as_deref(), Some("device error 2"));
        assert_eq!(report.drop_rate(), 0.0);
        assert!(report.summary().ends_with("fault: device error 2"));
    }

    #[test]
    fn test_report_json() {
        let report =
            SourceReport::from_parts(SourceKind::MediaPlayer, false, None, false, stats(3, 1));
        let json = report.to_json().unwrap();
        assert!(json.contains("\"source\": \"MediaPlayer\""));
        assert!(json.contains("\"frames_delivered\": 3"));
        assert_eq!(SourceReport::from_json(&json).unwrap(), report);
        assert!(report.summary().starts_with("MediaPlayer [STOPPED]"));
    }
}
