//! Progress throttling.
//!
//! Rate-limits progress snapshots to avoid overwhelming observers with one
//! event per network chunk.

/// Whole-percent progress throttle.
///
/// Emits when the integer part of the progress value changes. A transfer
/// with an unknown total sits at 0 and therefore emits once.
#[derive(Debug, Default)]
pub struct ProgressThrottle {
    last_bucket: Option<u8>,
}

impl ProgressThrottle {
    /// Create a throttle that will emit on the first check.
    pub const fn new() -> Self {
        Self { last_bucket: None }
    }

    /// Check whether `progress` (a percentage) crossed into a new whole percent.
    pub fn should_emit(&mut self, progress: f64) -> bool {
        let bucket = Self::bucket(progress);
        if self.last_bucket == Some(bucket) {
            return false;
        }
        self.last_bucket = Some(bucket);
        true
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn bucket(progress: f64) -> u8 {
        progress.clamp(0.0, 100.0).floor() as u8
    }
}
