#[cfg(feature = "cli")]
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
#[cfg(feature = "cli")]
use sysinfo::{Pid, RefreshKind, System};

#[derive(Debug, Clone)]
pub struct PhaseStats {
    pub phase: String,
    pub phase_time: Duration,
    pub memory_usage_mb: u64,
    pub peak_memory_mb: u64,
}

/// Times the phases of a recommendation run (catalogue load, graph build,
/// ranking, output) and samples process memory between them.
#[cfg(feature = "cli")]
pub struct PhaseMonitor {
    system: Arc<Mutex<System>>,
    pid: Option<Pid>,
    start_time: Instant,
    phase_start: Mutex<Instant>,
    peak_memory: Arc<Mutex<u64>>,
    enabled: bool,
}

#[cfg(feature = "cli")]
impl PhaseMonitor {
    pub fn new(enabled: bool) -> Self {
        let mut system = System::new_with_specifics(RefreshKind::everything());
        if enabled {
            system.refresh_all();
        }

        let pid = sysinfo::get_current_pid().ok();
        if pid.is_none() && enabled {
            tracing::warn!("Could not resolve current PID, memory figures will be zero");
        }

        let now = Instant::now();
        Self {
            system: Arc::new(Mutex::new(system)),
            pid,
            start_time: now,
            phase_start: Mutex::new(now),
            peak_memory: Arc::new(Mutex::new(0)),
            enabled,
        }
    }

    fn sample_memory_mb(&self) -> Option<u64> {
        let pid = self.pid?;
        let mut system = self.system.lock().ok()?;
        system.refresh_all();
        let process = system.process(pid)?;
        Some(process.memory() / 1024 / 1024)
    }

    /// Closes the current phase and starts the next one.
    pub fn end_phase(&self, phase: &str) -> Option<PhaseStats> {
        if !self.enabled {
            return None;
        }

        let phase_time = {
            let mut start = self.phase_start.lock().ok()?;
            let elapsed = start.elapsed();
            *start = Instant::now();
            elapsed
        };

        let memory_mb = self.sample_memory_mb().unwrap_or(0);
        let mut peak = self.peak_memory.lock().ok()?;
        if memory_mb > *peak {
            *peak = memory_mb;
        }

        let stats = PhaseStats {
            phase: phase.to_string(),
            phase_time,
            memory_usage_mb: memory_mb,
            peak_memory_mb: *peak,
        };
        tracing::info!(
            "📊 {} - Time: {:?}, Memory: {}MB, Peak: {}MB",
            stats.phase,
            stats.phase_time,
            stats.memory_usage_mb,
            stats.peak_memory_mb
        );
        Some(stats)
    }

    pub fn log_final_stats(&self) {
        if !self.enabled {
            return;
        }
        let peak = self.peak_memory.lock().map(|p| *p).unwrap_or(0);
        tracing::info!(
            "📊 Final Stats - Total Time: {:?}, Peak Memory: {}MB",
            self.start_time.elapsed(),
            peak
        );
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }
}

#[cfg(feature = "cli")]
impl Default for PhaseMonitor {
    fn default() -> Self {
        Self::new(false)
    }
}

// Without the cli feature only wall-clock timing is available.
#[cfg(not(feature = "cli"))]
pub struct PhaseMonitor {
    phase_start: std::sync::Mutex<Instant>,
    enabled: bool,
}

#[cfg(not(feature = "cli"))]
impl PhaseMonitor {
    pub fn new(enabled: bool) -> Self {
        Self {
            phase_start: std::sync::Mutex::new(Instant::now()),
            enabled,
        }
    }

    pub fn end_phase(&self, phase: &str) -> Option<PhaseStats> {
        if !self.enabled {
            return None;
        }
        let mut start = self.phase_start.lock().ok()?;
        let phase_time = start.elapsed();
        *start = Instant::now();
        tracing::info!("📊 {} - Time: {:?}", phase, phase_time);
        Some(PhaseStats {
            phase: phase.to_string(),
            phase_time,
            memory_usage_mb: 0,
            peak_memory_mb: 0,
        })
    }

    pub fn log_final_stats(&self) {}

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }
}

#[cfg(not(feature = "cli"))]
impl Default for PhaseMonitor {
    fn default() -> Self {
        Self::new(false)
    }
}
