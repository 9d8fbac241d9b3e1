use crate::error::{Result, SweepError};

/// Returns the number of processors this process may run on.
///
/// Reads the CPU affinity mask where the platform has one, so a harness started
/// under `taskset` sweeps only over the processors it was given.
pub fn usable_worker_contexts() -> u32 {
    let count = affinity_cpu_count()
        .or_else(|| std::thread::available_parallelism().ok().map(|n| n.get()))
        .unwrap_or(1);
    u32::try_from(count).unwrap_or(u32::MAX).max(1)
}

#[cfg(target_os = "linux")]
fn affinity_cpu_count() -> Option<usize> {
    // SAFETY: cpu_set_t is plain data, zeroed is a valid empty set, and the size passed
    // matches the buffer handed to the kernel.
    unsafe {
        let mut set: libc::cpu_set_t = std::mem::zeroed();
        if libc::sched_getaffinity(0, std::mem::size_of::<libc::cpu_set_t>(), &mut set) != 0 {
            return None;
        }
        let count = libc::CPU_COUNT(&set);
        if count > 0 {
            Some(count as usize)
        } else {
            None
        }
    }
}

#[cfg(not(target_os = "linux"))]
fn affinity_cpu_count() -> Option<usize> {
    None
}

/// Inclusive range of thread counts `1..=max` visited by a sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThreadRange {
    max: u32,
}

impl ThreadRange {
    pub fn new(max: u32) -> Result<Self> {
        if max == 0 {
            return Err(SweepError::EmptyRange);
        }
        Ok(ThreadRange { max })
    }

    /// Builds the range from the topology, scaled by `multiplier` (2 models SMT
    /// siblings on top of the detected processors).
    pub fn from_topology(contexts: u32, multiplier: u32) -> Result<Self> {
        Self::new(contexts.saturating_mul(multiplier))
    }

    pub fn max(&self) -> u32 {
        self.max
    }

    pub fn iter(&self) -> impl Iterator<Item = u32> {
        1..=self.max
    }
}
