//! Small timing and data helpers shared by both demos.

use serde::{de::DeserializeOwned, Serialize};
use std::time::Duration;

use crate::error::{LabError, LabResult};

/// Sleep for `duration` on the Tokio clock.
pub async fn delay(duration: Duration) {
    tokio::time::sleep(duration).await;
}

/// Render a duration for log messages.
///
/// Sub-second values in milliseconds with one decimal (`"250.0ms"`),
/// everything else in seconds with two (`"7.50s"`).
#[must_use]
pub fn format_duration(duration: Duration) -> String {
    let ms = duration.as_secs_f64() * 1000.0;
    if ms < 1000.0 {
        format!("{ms:.1}ms")
    } else {
        format!("{:.2}s", ms / 1000.0)
    }
}

/// Deep copy through a JSON round-trip.
///
/// Unlike `Clone`, the copy only carries serialized fields, so
/// `#[serde(skip)]` state is reset to its default.
///
/// # Errors
///
/// Returns `LabError::Serialization` if the value cannot be represented as JSON.
pub fn deep_clone<T: Serialize + DeserializeOwned>(value: &T) -> LabResult<T> {
    let json = serde_json::to_value(value).map_err(|e| LabError::serialization(e.to_string()))?;
    serde_json::from_value(json).map_err(|e| LabError::serialization(e.to_string()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[test]
    fn test_format_duration_millis() {
        assert_eq!(format_duration(Duration::from_millis(250)), "250.0ms");
        assert_eq!(format_duration(Duration::from_micros(1500)), "1.5ms");
        assert_eq!(format_duration(Duration::ZERO), "0.0ms");
    }

    #[test]
    fn test_format_duration_seconds() {
        assert_eq!(format_duration(Duration::from_millis(1000)), "1.00s");
        assert_eq!(format_duration(Duration::from_millis(7500)), "7.50s");
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Sample {
        name: String,
        values: Vec<u32>,
        #[serde(skip)]
        scratch: u32,
    }

    #[test]
    fn test_deep_clone_drops_skipped_fields() {
        let original = Sample {
            name: "bank".to_string(),
            values: vec![1, 2, 3],
            scratch: 9,
        };
        let copy = deep_clone(&original).unwrap();
        assert_eq!(copy.name, original.name);
        assert_eq!(copy.values, original.values);
        assert_eq!(copy.scratch, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_delay() {
        let start = tokio::time::Instant::now();
        delay(Duration::from_millis(40)).await;
        assert_eq!(start.elapsed(), Duration::from_millis(40));
    }
}
