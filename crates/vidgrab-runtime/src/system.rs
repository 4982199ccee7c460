//! System probe implementation.

use vidgrab_core::ports::SystemProbePort;

/// Default implementation of `SystemProbePort`.
///
/// Constructed once in the CLI bootstrap and shared with the services that
/// need host facts.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultSystemProbe;

impl DefaultSystemProbe {
    /// Create a new default system probe.
    pub const fn new() -> Self {
        Self
    }
}

impl SystemProbePort for DefaultSystemProbe {
    fn cpu_count(&self) -> u32 {
        u32::try_from(num_cpus::get()).unwrap_or(u32::MAX).max(1)
    }

    fn platform(&self) -> &'static str {
        std::env::consts::OS
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cpu_count_positive() {
        assert!(DefaultSystemProbe::new().cpu_count() >= 1);
    }

    #[test]
    fn test_platform_label() {
        assert!(!DefaultSystemProbe::new().platform().is_empty());
    }
}
