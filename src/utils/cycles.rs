//! Hardware tick counters.
//!
//! x86 and x86_64 read the time stamp counter, aarch64 the generic timer's
//! virtual count. Where the architecture also reports the counter rate, that
//! register is exposed too so calibration can skip correlating against the
//! steady clock.
//!
//! Other architectures, and builds with the `use_time` feature, report the
//! counter as unavailable; the clock then uses the steady wall clock.

/// Whether this build can read a hardware cycle counter at all.
pub const fn counter_available() -> bool {
    cfg!(all(
        feature = "cpu_cycles",
        not(feature = "use_time"),
        any(target_arch = "x86_64", target_arch = "x86", target_arch = "aarch64")
    ))
}

/// Raw counter value; always 0 where [`counter_available`] is false.
///
/// On x86 the read is fenced on both sides so neither earlier nor later
/// instructions are reordered across it. On aarch64 an `isb` orders it after
/// preceding instructions. The generic timer ticks at a fixed rate shared by
/// all cores, unlike a TSC without the invariant flag.
#[inline(always)]
pub fn read_cycles() -> u64 {
    #[cfg(any(target_arch = "x86_64", target_arch = "x86"))]
    {
        #[cfg(target_arch = "x86")]
        use core::arch::x86::{_mm_lfence, _rdtsc};
        #[cfg(target_arch = "x86_64")]
        use core::arch::x86_64::{_mm_lfence, _rdtsc};

        // SAFETY: lfence and rdtsc are baseline on every supported x86 target
        unsafe {
            _mm_lfence();
            let ticks = _rdtsc();
            _mm_lfence();
            ticks
        }
    }

    #[cfg(target_arch = "aarch64")]
    {
        let ticks: u64;
        // SAFETY: CNTVCT_EL0 is readable from EL0 on every OS we target
        unsafe {
            core::arch::asm!("isb", "mrs {}, cntvct_el0", out(reg) ticks, options(nostack, nomem));
        }
        ticks
    }

    #[cfg(not(any(target_arch = "x86_64", target_arch = "x86", target_arch = "aarch64")))]
    {
        0
    }
}

/// Counter frequency in Hz as reported by hardware, if the platform exposes it.
///
/// On aarch64 this is CNTFRQ_EL0. On x86 it is derived from CPUID leaf 0x15
/// (TSC / core crystal clock ratio), which many CPUs leave unpopulated.
pub fn counter_frequency() -> Option<u64> {
    if !counter_available() {
        return None;
    }

    #[cfg(any(target_arch = "x86_64", target_arch = "x86"))]
    {
        x86::tsc_frequency()
    }

    #[cfg(target_arch = "aarch64")]
    {
        let freq: u64;
        unsafe {
            core::arch::asm!("mrs {}, cntfrq_el0", out(reg) freq, options(nostack, nomem));
        }
        (freq != 0).then_some(freq)
    }

    #[cfg(not(any(target_arch = "x86_64", target_arch = "x86", target_arch = "aarch64")))]
    {
        None
    }
}

/// Whether every logical processor's counter ticks at the same rate and in step.
///
/// The aarch64 generic timer is system-wide. On x86 this holds when the CPU
/// advertises an invariant TSC; without it each core is calibrated on its own.
pub fn counters_synchronized() -> bool {
    #[cfg(any(target_arch = "x86_64", target_arch = "x86"))]
    {
        x86::invariant_tsc()
    }

    #[cfg(not(any(target_arch = "x86_64", target_arch = "x86")))]
    {
        true
    }
}

#[cfg(any(target_arch = "x86_64", target_arch = "x86"))]
#[allow(unused_unsafe)]
mod x86 {
    #[cfg(target_arch = "x86")]
    use core::arch::x86::{__cpuid, __get_cpuid_max};
    #[cfg(target_arch = "x86_64")]
    use core::arch::x86_64::{__cpuid, __get_cpuid_max};

    const TSC_LEAF: u32 = 0x15;
    const POWER_LEAF: u32 = 0x8000_0007;
    const INVARIANT_TSC_BIT: u32 = 1 << 8;

    pub fn tsc_frequency() -> Option<u64> {
        let (max_leaf, _) = unsafe { __get_cpuid_max(0) };
        if max_leaf < TSC_LEAF {
            return None;
        }
        let leaf = unsafe { __cpuid(TSC_LEAF) };
        // eax: denominator, ebx: numerator, ecx: crystal clock in Hz
        if leaf.eax == 0 || leaf.ebx == 0 || leaf.ecx == 0 {
            return None;
        }
        Some(u64::from(leaf.ecx) * u64::from(leaf.ebx) / u64::from(leaf.eax))
    }

    pub fn invariant_tsc() -> bool {
        let (max_extended, _) = unsafe { __get_cpuid_max(0x8000_0000) };
        if max_extended < POWER_LEAF {
            return false;
        }
        let leaf = unsafe { __cpuid(POWER_LEAF) };
        leaf.edx & INVARIANT_TSC_BIT != 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counter_does_not_run_backwards() {
        if !counter_available() {
            return;
        }
        let mut last = read_cycles();
        for _ in 0..1000 {
            let now = read_cycles();
            // Tolerate a small skew if the thread migrates between reads
            assert!(now >= last || last - now < 1000, "counter went from {last} to {now}");
            last = now;
        }
    }

    #[test]
    fn test_counter_frequency_plausible() {
        // Any register-reported frequency must be within 1 MHz..100 GHz
        if let Some(hz) = counter_frequency() {
            assert!((1_000_000..100_000_000_000).contains(&hz), "implausible {hz} Hz");
        }
    }

    #[test]
    fn test_unavailable_counter_reports_no_frequency() {
        if !counter_available() {
            assert_eq!(counter_frequency(), None);
        }
    }
}
