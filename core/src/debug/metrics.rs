//! Loop health monitoring and diagnostics

use std::time::Duration;

use tracing::debug;

use crate::runner::TickReport;

/// Counters aggregated across ticks and logged once a second.
#[derive(Debug, Clone)]
pub struct LoopMetrics {
    /// Ticks completed
    pub ticks: u64,
    /// Ticks whose work exceeded the frame budget
    pub overruns: u64,
    /// Ticks where the hardware cursor read failed
    pub cursor_failures: u64,
    /// Fill windows clamped to ring capacity
    pub clamped_fills: u64,
    /// Fills classified high-latency
    pub high_latency_fills: u64,
    /// Audio bytes committed
    pub audio_bytes: u64,
    /// Total time spent in coarse sleeps
    pub slept: Duration,
    /// Total time spent spinning
    pub spun: Duration,
    /// Loop timestamp of the last metrics log
    pub last_log_time: Duration,
}

impl LoopMetrics {
    pub fn new() -> Self {
        Self {
            ticks: 0,
            overruns: 0,
            cursor_failures: 0,
            clamped_fills: 0,
            high_latency_fills: 0,
            audio_bytes: 0,
            slept: Duration::ZERO,
            spun: Duration::ZERO,
            last_log_time: Duration::ZERO,
        }
    }

    /// Fold one completed tick into the counters.
    pub fn record_tick(&mut self, report: &TickReport) {
        self.ticks += 1;
        if report.wait.overran_by.is_some() {
            self.overruns += 1;
        }
        self.slept += report.wait.slept;
        self.spun += report.wait.spun;

        match &report.audio {
            Some(audio) => {
                self.audio_bytes += audio.window.bytes_to_write as u64;
                if audio.clamped {
                    self.clamped_fills += 1;
                }
                if audio.latency == crate::audio::sync::LatencyClass::High {
                    self.high_latency_fills += 1;
                }
            }
            None => self.cursor_failures += 1,
        }
    }

    /// Log metrics if enough time has passed (every 1 second)
    pub fn maybe_log(&mut self, now: Duration) {
        let elapsed = now.saturating_sub(self.last_log_time);
        if elapsed.as_secs() >= 1 {
            let tick_rate = self.ticks as f64 / elapsed.as_secs_f64();
            let audio_kib = self.audio_bytes as f64 / 1024.0;

            debug!(
                "⏱ LOOP METRICS: ticks={} ({:.1}/s), overruns={}, cursor_failures={}, \
                 clamped={}, high_latency={}, audio={:.0}KiB, slept={:.1}ms, spun={:.1}ms",
                self.ticks,
                tick_rate,
                self.overruns,
                self.cursor_failures,
                self.clamped_fills,
                self.high_latency_fills,
                audio_kib,
                self.slept.as_secs_f64() * 1000.0,
                self.spun.as_secs_f64() * 1000.0,
            );

            // Reset counters for next interval (show per-second rates)
            self.ticks = 0;
            self.overruns = 0;
            self.cursor_failures = 0;
            self.clamped_fills = 0;
            self.high_latency_fills = 0;
            self.audio_bytes = 0;
            self.slept = Duration::ZERO;
            self.spun = Duration::ZERO;
            self.last_log_time = now;
        }
    }
}

impl Default for LoopMetrics {
    fn default() -> Self {
        Self::new()
    }
}
