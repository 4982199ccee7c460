//! System probe port.
//!
//! Core owns the trait, runtime owns the implementation, the CLI injects it.

/// Port for querying host facts the advisor depends on.
pub trait SystemProbePort: Send + Sync {
    /// Logical CPU count, at least 1.
    fn cpu_count(&self) -> u32;

    /// Short platform label (`windows`, `linux`, `macos`, ...).
    fn platform(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Mock implementation for testing.
    struct FixedProbe(u32);

    impl SystemProbePort for FixedProbe {
        fn cpu_count(&self) -> u32 {
            self.0
        }

        fn platform(&self) -> &'static str {
            "test"
        }
    }

    #[test]
    fn test_probe_is_object_safe() {
        let probe: Box<dyn SystemProbePort> = Box::new(FixedProbe(12));
        assert_eq!(probe.cpu_count(), 12);
        assert_eq!(probe.platform(), "test");
    }
}
