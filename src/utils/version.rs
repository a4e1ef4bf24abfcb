//! Crate version information

/// Version of this crate, as set in `Cargo.toml`
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get the crate version
pub fn get_version() -> &'static str {
    VERSION
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_matches_package() {
        assert_eq!(get_version(), env!("CARGO_PKG_VERSION"));
        assert!(!VERSION.is_empty());
    }
}
