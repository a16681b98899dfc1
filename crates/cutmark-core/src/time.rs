//! Time helpers for millisecond-precision editing.
//!
//! Timestamps are plain `f64` seconds. Boundaries are committed with
//! millisecond precision, frame rates stay rational until a duration is needed.

use crate::error::{CutmarkError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Round a timestamp to millisecond precision.
#[inline]
pub fn round_ms(seconds: f64) -> f64 {
    (seconds * 1000.0).round() / 1000.0
}

/// Format seconds as `HH:MM:SS.mmm`.
///
/// With `full == false` leading zero fields and a zero fraction are omitted,
/// so `5.0` prints as `5` and `65.5` as `01:05.500`.
pub fn format_time(seconds: f64, full: bool) -> String {
    // Split whole milliseconds so a rounded-up fraction carries into the fields.
    let total_ms = (seconds.max(0.0) * 1000.0).round() as u64;
    let hours = total_ms / 3_600_000;
    let minutes = total_ms / 60_000 % 60;
    let secs = total_ms / 1000 % 60;
    let millis = total_ms % 1000;

    let mut out = String::new();
    if full || hours != 0 {
        out.push_str(&format!("{hours:02}:"));
    }
    if full || hours != 0 || minutes != 0 {
        out.push_str(&format!("{minutes:02}:{secs:02}"));
    } else {
        out.push_str(&secs.to_string());
    }
    if full || millis != 0 {
        out.push_str(&format!(".{millis:03}"));
    }
    out
}

/// Parse `S`, `M:S` or `H:M:S` (seconds may carry a fraction).
pub fn parse_time(input: &str) -> Result<f64> {
    let invalid = || CutmarkError::InvalidParameter(format!("Invalid time: {input:?}"));
    let parts: Vec<&str> = input.trim().split(':').collect();

    let whole = |s: &str| s.trim().parse::<u64>().map_err(|_| invalid());
    let secs = |s: &str| {
        s.trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite() && *v >= 0.0)
            .ok_or_else(invalid)
    };

    match parts.as_slice() {
        [s] => secs(s),
        [m, s] => Ok(whole(m)? as f64 * 60.0 + secs(s)?),
        [h, m, s] => Ok(whole(h)? as f64 * 3600.0 + whole(m)? as f64 * 60.0 + secs(s)?),
        _ => Err(invalid()),
    }
}

/// Frame rate as a rational number (e.g., 24000/1001 for 23.976 fps).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FrameRate {
    /// Numerator (e.g., 24000)
    pub numerator: u32,
    /// Denominator (e.g., 1001)
    pub denominator: u32,
}

impl FrameRate {
    /// Create a new frame rate.
    #[inline]
    pub const fn new(numerator: u32, denominator: u32) -> Self {
        Self {
            numerator,
            denominator,
        }
    }

    /// Parse an ffprobe style rate such as `30000/1001` or `25`.
    ///
    /// Returns `None` for `0/0` and other unusable values.
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        let (num, den) = match text.split_once('/') {
            Some((n, d)) => (n.trim().parse().ok()?, d.trim().parse().ok()?),
            None => (text.parse().ok()?, 1),
        };
        if num == 0 || den == 0 {
            return None;
        }
        Some(Self::new(num, den))
    }

    /// Convert to frames per second as f64.
    #[inline]
    pub fn to_fps_f64(self) -> f64 {
        self.numerator as f64 / self.denominator as f64
    }

    /// Duration of a single frame in seconds.
    #[inline]
    pub fn frame_duration(self) -> f64 {
        self.denominator as f64 / self.numerator as f64
    }

    /// Common frame rates
    pub const FPS_23_976: Self = Self::new(24000, 1001);
    pub const FPS_24: Self = Self::new(24, 1);
    pub const FPS_25: Self = Self::new(25, 1);
    pub const FPS_29_97: Self = Self::new(30000, 1001);
    pub const FPS_30: Self = Self::new(30, 1);
    pub const FPS_50: Self = Self::new(50, 1);
    pub const FPS_59_94: Self = Self::new(60000, 1001);
    pub const FPS_60: Self = Self::new(60, 1);
}

impl Default for FrameRate {
    fn default() -> Self {
        Self::FPS_24
    }
}

impl fmt::Display for FrameRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fps = self.to_fps_f64();
        if (fps - fps.round()).abs() < 0.001 {
            write!(f, "{} fps", fps.round() as u32)
        } else {
            write!(f, "{:.3} fps", fps)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_ms() {
        assert_eq!(round_ms(1.23456), 1.235);
        assert_eq!(round_ms(10.0), 10.0);
        assert_eq!(round_ms(0.0004), 0.0);
    }

    #[test]
    fn test_format_time_compact() {
        assert_eq!(format_time(5.0, false), "5");
        assert_eq!(format_time(65.5, false), "01:05.500");
        assert_eq!(format_time(3600.0, false), "01:00:00");
    }

    #[test]
    fn test_format_time_carries_rounded_fraction() {
        assert_eq!(format_time(59.9996, false), "01:00");
        assert_eq!(format_time(59.9996, true), "00:01:00.000");
        assert_eq!(format_time(3599.9999, true), "01:00:00.000");
        assert_eq!(format_time(1.2344, true), "00:00:01.234");
    }

    #[test]
    fn test_format_time_full() {
        assert_eq!(format_time(0.0, true), "00:00:00.000");
        assert_eq!(format_time(3725.25, true), "01:02:05.250");
    }

    #[test]
    fn test_parse_time() {
        assert_eq!(parse_time("12.5").unwrap(), 12.5);
        assert_eq!(parse_time("1:05.5").unwrap(), 65.5);
        assert_eq!(parse_time("01:02:05.250").unwrap(), 3725.25);
        assert!(parse_time("abc").is_err());
        assert!(parse_time("1:2:3:4").is_err());
        assert!(parse_time("-3").is_err());
    }

    #[test]
    fn test_frame_rate_23_976() {
        let rate = FrameRate::FPS_23_976;
        let fps = rate.to_fps_f64();
        assert!((fps - 23.976).abs() < 0.001);
        assert!((rate.frame_duration() - 0.041708).abs() < 1e-6);
    }

    #[test]
    fn test_frame_rate_parse() {
        assert_eq!(FrameRate::parse("30000/1001"), Some(FrameRate::FPS_29_97));
        assert_eq!(FrameRate::parse("25"), Some(FrameRate::new(25, 1)));
        assert_eq!(FrameRate::parse("0/0"), None);
        assert_eq!(FrameRate::parse("N/A"), None);
    }

    #[test]
    fn test_frame_rate_display() {
        assert_eq!(FrameRate::FPS_25.to_string(), "25 fps");
        assert_eq!(FrameRate::FPS_29_97.to_string(), "29.970 fps");
    }
}
