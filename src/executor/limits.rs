//! Kernel resource limits applied to the child before `exec`.

use super::SandboxSettings;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct ResourceLimits {
    pub cpu_secs: Option<u64>,
    pub address_space_bytes: Option<u64>,
    pub open_files: Option<u64>,
}

impl ResourceLimits {
    pub(crate) fn from_settings(settings: &SandboxSettings) -> Self {
        Self {
            cpu_secs: settings.cpu_limit_secs,
            address_space_bytes: settings
                .memory_limit_mb
                .map(|mb| mb.saturating_mul(1024 * 1024)),
            open_files: settings.max_open_files,
        }
    }
}

#[cfg(unix)]
pub(crate) fn install(cmd: &mut tokio::process::Command, limits: ResourceLimits) {
    // SAFETY: the hook runs in the forked child before exec and only calls
    // setrlimit, which is async-signal-safe and touches no shared state.
    unsafe {
        cmd.pre_exec(move || apply(&limits));
    }
}

#[cfg(not(unix))]
pub(crate) fn install(_cmd: &mut tokio::process::Command, limits: ResourceLimits) {
    tracing::debug!(?limits, "Resource limits are not enforced on this platform");
}

#[cfg(unix)]
fn set(resource: LimitResource, value: u64) -> std::io::Result<()> {
    #[allow(clippy::useless_conversion, trivial_numeric_casts)]
    let v = value as libc::rlim_t;
    let limit = libc::rlimit {
        rlim_cur: v,
        rlim_max: v,
    };
    // SAFETY: `limit` is a valid, initialized rlimit that outlives the call.
    if unsafe { libc::setrlimit(resource, &limit) } != 0 {
        return Err(std::io::Error::last_os_error());
    }
    Ok(())
}

#[cfg(all(unix, target_os = "linux", target_env = "gnu"))]
type LimitResource = libc::__rlimit_resource_t;

#[cfg(all(unix, not(all(target_os = "linux", target_env = "gnu"))))]
type LimitResource = libc::c_int;

#[cfg(unix)]
fn apply(limits: &ResourceLimits) -> std::io::Result<()> {
    if let Some(secs) = limits.cpu_secs {
        set(libc::RLIMIT_CPU, secs)?;
    }

    #[cfg(any(target_os = "linux", target_os = "android"))]
    if let Some(bytes) = limits.address_space_bytes {
        set(libc::RLIMIT_AS, bytes)?;
    }

    if let Some(fds) = limits.open_files {
        set(libc::RLIMIT_NOFILE, fds)?;
    }

    set(libc::RLIMIT_CORE, 0)
}
