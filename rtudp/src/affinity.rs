//! Best-effort CPU pinning for worker threads.
//!
//! The construction option is a plain core index (§6); there is no portable
//! `std` API for this; we wire it up on Linux via `sched_setaffinity` and
//! treat every other target as a documented no-op, rather than pull in a
//! full affinity crate for one call.

/// Pins the calling thread to `cpu`. `cpu < 0` disables pinning entirely and
/// is a no-op on every target.
pub fn pin_current_thread(cpu: i32) {
    if cpu < 0 {
        return;
    }

    #[cfg(target_os = "linux")]
    {
        linux::pin_current_thread(cpu as usize);
    }

    #[cfg(not(target_os = "linux"))]
    {
        tracing::debug!(cpu, "CPU affinity requested but not supported on this platform");
    }
}

#[cfg(target_os = "linux")]
mod linux {
    pub fn pin_current_thread(cpu: usize) {
        // SAFETY: `set` only writes into the on-stack `cpu_set_t`. Passing
        // `0` as the pid operates on the calling thread, per `man 2
        // sched_setaffinity`.
        unsafe {
            let mut set: libc::cpu_set_t = std::mem::zeroed();
            libc::CPU_ZERO(&mut set);
            libc::CPU_SET(cpu, &mut set);

            let rc = libc::sched_setaffinity(0, std::mem::size_of::<libc::cpu_set_t>(), &set);
            if rc != 0 {
                tracing::warn!(cpu, "Failed to set CPU affinity: {}", std::io::Error::last_os_error());
            }
        }
    }
}
