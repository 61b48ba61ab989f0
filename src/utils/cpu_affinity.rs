//! Logical processor discovery and thread pinning.
//!
//! Calibration pins the thread to each logical processor in turn, and every
//! testee runs pinned to the core it started on so the frequency bound to the
//! clock stays the right one for the whole measurement.
//!
//! Pinning is implemented for Linux via libc. Elsewhere it reports failure
//! and callers fall back to a shared frequency.

#[cfg(target_os = "linux")]
mod platform {
    use std::mem;

    pub type Mask = libc::cpu_set_t;

    pub fn current_cpu() -> Option<usize> {
        // SAFETY: no arguments, returns -1 on failure
        let cpu = unsafe { libc::sched_getcpu() };
        usize::try_from(cpu).ok()
    }

    pub fn current_mask() -> Option<Mask> {
        // SAFETY: cpu_set_t is plain data; the kernel writes at most its size
        unsafe {
            let mut mask: Mask = mem::zeroed();
            (libc::sched_getaffinity(0, mem::size_of::<Mask>(), &mut mask) == 0).then_some(mask)
        }
    }

    pub fn single_core_mask(core: usize) -> Option<Mask> {
        if core >= libc::CPU_SETSIZE as usize {
            return None;
        }
        // SAFETY: `core` was bounds-checked against the set size above
        unsafe {
            let mut mask: Mask = mem::zeroed();
            libc::CPU_ZERO(&mut mask);
            libc::CPU_SET(core, &mut mask);
            Some(mask)
        }
    }

    pub fn apply_mask(mask: &Mask) -> bool {
        // SAFETY: `mask` is a valid, initialized cpu_set_t
        unsafe { libc::sched_setaffinity(0, mem::size_of::<Mask>(), mask) == 0 }
    }

    pub fn allowed_cpus() -> Option<Vec<usize>> {
        let mask = current_mask()?;
        let cpus: Vec<usize> = (0..libc::CPU_SETSIZE as usize)
            // SAFETY: every index is below the set size
            .filter(|&cpu| unsafe { libc::CPU_ISSET(cpu, &mask) })
            .collect();
        (!cpus.is_empty()).then_some(cpus)
    }
}

#[cfg(not(target_os = "linux"))]
mod platform {
    pub type Mask = ();

    pub fn current_cpu() -> Option<usize> {
        None
    }

    pub fn current_mask() -> Option<Mask> {
        None
    }

    pub fn single_core_mask(_core: usize) -> Option<Mask> {
        None
    }

    pub fn apply_mask(_mask: &Mask) -> bool {
        false
    }

    pub fn allowed_cpus() -> Option<Vec<usize>> {
        None
    }
}

/// Number of online logical processors.
#[cfg(unix)]
pub fn logical_cpu_count() -> usize {
    // SAFETY: sysconf has no memory side effects
    let online = unsafe { libc::sysconf(libc::_SC_NPROCESSORS_ONLN) };
    usize::try_from(online).ok().filter(|&n| n > 0).unwrap_or(1)
}

#[cfg(not(unix))]
pub fn logical_cpu_count() -> usize {
    std::thread::available_parallelism().map_or(1, |n| n.get())
}

/// Ids of the logical processors the calling thread may run on, ascending.
///
/// Ids need not be dense: offline CPUs and restricted cpusets leave gaps.
/// Where the affinity mask cannot be read this is `0..logical_cpu_count()`.
pub fn allowed_cpus() -> Vec<usize> {
    platform::allowed_cpus().unwrap_or_else(|| (0..logical_cpu_count()).collect())
}

/// Logical processor the calling thread is executing on, if the platform
/// can tell.
pub fn get_current_cpu() -> Option<usize> {
    platform::current_cpu()
}

/// Keeps the calling thread on one logical processor while alive.
///
/// The affinity mask in effect at creation is restored on drop, so guards
/// nest and a panicking testee does not leave the thread pinned.
///
/// ```ignore
/// {
///     let pin = CpuPinGuard::new();
///     let clock = clock.bind(pin.core_id());
///     // measure
/// }
/// ```
pub struct CpuPinGuard {
    core: Option<usize>,
    previous: Option<platform::Mask>,
}

impl CpuPinGuard {
    /// Pin to the core the thread is currently running on.
    pub fn new() -> Self {
        match platform::current_cpu() {
            Some(core) => Self::with_core(core),
            None => Self::unpinned(),
        }
    }

    /// Pin to `core`.
    pub fn with_core(core: usize) -> Self {
        let (Some(previous), Some(target)) = (platform::current_mask(), platform::single_core_mask(core))
        else {
            return Self::unpinned();
        };
        if !platform::apply_mask(&target) {
            return Self::unpinned();
        }
        Self {
            core: Some(core),
            previous: Some(previous),
        }
    }

    fn unpinned() -> Self {
        Self {
            core: None,
            previous: None,
        }
    }

    /// Core the thread is held on, `None` when pinning failed.
    pub fn core_id(&self) -> Option<usize> {
        self.core
    }

    pub fn is_pinned(&self) -> bool {
        self.core.is_some()
    }
}

impl Drop for CpuPinGuard {
    fn drop(&mut self) {
        if let Some(previous) = self.previous.take() {
            if !platform::apply_mask(&previous) {
                log::debug!("could not restore the thread's CPU affinity");
            }
        }
    }
}

impl Default for CpuPinGuard {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logical_cpu_count() {
        assert!(logical_cpu_count() >= 1);
    }

    #[test]
    fn test_allowed_cpus_include_current() {
        let cpus = allowed_cpus();
        assert!(!cpus.is_empty());
        assert!(cpus.windows(2).all(|pair| pair[0] < pair[1]));
        if let Some(cpu) = get_current_cpu() {
            assert!(cpus.contains(&cpu), "running on {cpu}, allowed {cpus:?}");
        }
    }

    #[test]
    fn test_every_allowed_cpu_can_be_pinned() {
        for cpu in allowed_cpus() {
            let pin = CpuPinGuard::with_core(cpu);
            if pin.is_pinned() {
                assert_eq!(pin.core_id(), Some(cpu));
            }
        }
    }

    #[test]
    fn test_pin_to_current_core() {
        let pin = CpuPinGuard::new();
        if pin.is_pinned() {
            assert_eq!(pin.core_id(), get_current_cpu());
        }
    }

    #[test]
    fn test_pin_to_core_zero() {
        let pin = CpuPinGuard::with_core(0);
        if pin.is_pinned() {
            assert_eq!(get_current_cpu(), Some(0));
        }
    }

    #[test]
    fn test_nested_guards_restore_outer_pin() {
        let outer = CpuPinGuard::with_core(0);
        if !outer.is_pinned() || logical_cpu_count() < 2 {
            return;
        }
        {
            let inner = CpuPinGuard::with_core(1);
            if inner.is_pinned() {
                assert_eq!(get_current_cpu(), Some(1));
            }
        }
        // Back on the outer guard's core once the scheduler moves us
        std::thread::yield_now();
        assert_eq!(get_current_cpu(), Some(0));
    }

    #[test]
    fn test_out_of_range_core_is_not_pinned() {
        let pin = CpuPinGuard::with_core(usize::MAX);
        assert!(!pin.is_pinned());
        assert_eq!(pin.core_id(), None);
    }
}
