/// Compile-time build metadata produced by `build.rs`.
#[derive(Debug, Clone, Copy)]
pub struct BuildMetadata {
    pub version: &'static str,
    pub commit: &'static str,
    pub built_at: &'static str,
    pub profile: &'static str,
}

impl BuildMetadata {
    pub fn summary(&self) -> String {
        format!(
            "stall_ledger {} ({} {}, built {})",
            self.version, self.commit, self.profile, self.built_at
        )
    }
}

/// Returns the statically-embedded build metadata.
pub fn current() -> BuildMetadata {
    BuildMetadata {
        version: env!("CARGO_PKG_VERSION"),
        commit: option_env!("STALL_LEDGER_BUILD_COMMIT").unwrap_or("unknown"),
        built_at: option_env!("STALL_LEDGER_BUILD_TIMESTAMP").unwrap_or("unknown"),
        profile: option_env!("STALL_LEDGER_BUILD_PROFILE").unwrap_or("unknown"),
    }
}
