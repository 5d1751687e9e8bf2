//! Configuration for rechunking behavior.
//!
//! - [`ChunkConfig`] - Target chunk size and upstream read size
//!
//! # Example
//!
//! ```
//! use rechunk::ChunkConfig;
//!
//! // 4 KiB chunks
//! let config = ChunkConfig::new(4096)?;
//!
//! // Chunks holding 1024 base64 groups, read upstream 64 KiB at a time
//! let config = ChunkConfig::aligned(3, 1024)?.with_read_size(64 * 1024);
//! config.validate()?;
//!
//! # Ok::<(), rechunk::ChunkError>(())
//! ```

use crate::error::ChunkError;

/// Default target chunk size (3 KiB, a multiple of the base64 group size).
pub const DEFAULT_TARGET_CHUNK_SIZE: usize = 3 * 1024;

/// Default number of bytes requested from a reader per fragment (8 KiB).
pub const DEFAULT_READ_SIZE: usize = 8 * 1024;

/// Configuration for fixed-size rechunking.
///
/// - `target_size` - Length of every emitted chunk except possibly the last
/// - `read_size` - Upper bound on the fragment size requested from readers
///   ([`std::io::Read`] and `AsyncRead` sources only; iterator and stream
///   sources choose their own fragment sizes)
///
/// Both values must be non-zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChunkConfig {
    target_size: usize,
    read_size: usize,
}

impl ChunkConfig {
    /// Creates a new configuration with the given target chunk size.
    ///
    /// # Errors
    ///
    /// Returns [`ChunkError::InvalidConfig`] if `target_size` is zero.
    ///
    /// # Example
    ///
    /// ```
    /// use rechunk::ChunkConfig;
    ///
    /// let config = ChunkConfig::new(3072)?;
    /// assert_eq!(config.target_size(), 3072);
    /// assert!(ChunkConfig::new(0).is_err());
    /// # Ok::<(), rechunk::ChunkError>(())
    /// ```
    pub fn new(target_size: usize) -> Result<Self, ChunkError> {
        let config = Self {
            target_size,
            read_size: DEFAULT_READ_SIZE,
        };
        config.validate()?;
        Ok(config)
    }

    /// Creates a configuration whose target size is `units` groups of
    /// `unit` bytes, so chunk boundaries never split an encoder group.
    ///
    /// # Errors
    ///
    /// Returns [`ChunkError::InvalidConfig`] if either argument is zero or
    /// the product overflows.
    pub fn aligned(unit: usize, units: usize) -> Result<Self, ChunkError> {
        let target_size = unit
            .checked_mul(units)
            .ok_or(ChunkError::InvalidConfig {
                message: "aligned target_size overflows usize",
            })?;
        Self::new(target_size)
    }

    /// Sets the target chunk size.
    ///
    /// Note: This does not validate the configuration. Use [`ChunkConfig::validate`]
    /// to check if the configuration is valid.
    pub fn with_target_size(mut self, size: usize) -> Self {
        self.target_size = size;
        self
    }

    /// Sets the read size used by reader-backed sources.
    ///
    /// Note: This does not validate the configuration. Use [`ChunkConfig::validate`]
    /// to check if the configuration is valid.
    ///
    /// # Example
    ///
    /// ```
    /// use rechunk::ChunkConfig;
    ///
    /// let config = ChunkConfig::default().with_read_size(1024);
    /// assert_eq!(config.read_size(), 1024);
    /// ```
    pub fn with_read_size(mut self, size: usize) -> Self {
        self.read_size = size;
        self
    }

    /// Returns the target chunk size.
    pub fn target_size(&self) -> usize {
        self.target_size
    }

    /// Returns the read size.
    pub fn read_size(&self) -> usize {
        self.read_size
    }

    /// Returns true if the target size is a whole number of `unit`-byte groups.
    pub fn is_aligned_to(&self, unit: usize) -> bool {
        unit != 0 && self.target_size % unit == 0
    }

    /// Validates the current configuration.
    ///
    /// # Example
    ///
    /// ```
    /// use rechunk::ChunkConfig;
    ///
    /// let config = ChunkConfig::default().with_read_size(0);
    /// assert!(config.validate().is_err());
    /// ```
    pub fn validate(&self) -> Result<(), ChunkError> {
        if self.target_size == 0 {
            return Err(ChunkError::InvalidConfig {
                message: "target_size must be non-zero",
            });
        }

        if self.read_size == 0 {
            return Err(ChunkError::InvalidConfig {
                message: "read_size must be non-zero",
            });
        }

        Ok(())
    }
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            target_size: DEFAULT_TARGET_CHUNK_SIZE,
            read_size: DEFAULT_READ_SIZE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ChunkConfig::default();
        assert_eq!(config.target_size(), DEFAULT_TARGET_CHUNK_SIZE);
        assert_eq!(config.read_size(), DEFAULT_READ_SIZE);
        assert!(config.validate().is_ok());
        assert!(config.is_aligned_to(3));
    }

    #[test]
    fn test_builder_pattern() {
        let config = ChunkConfig::default()
            .with_target_size(300)
            .with_read_size(17);

        assert_eq!(config.target_size(), 300);
        assert_eq!(config.read_size(), 17);
    }

    #[test]
    fn test_invalid_config_zero_target() {
        let result = ChunkConfig::new(0);
        assert!(matches!(result, Err(ChunkError::InvalidConfig { .. })));
    }

    #[test]
    fn test_invalid_config_zero_read_size() {
        let config = ChunkConfig::default().with_read_size(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_aligned() {
        let config = ChunkConfig::aligned(3, 4).unwrap();
        assert_eq!(config.target_size(), 12);
        assert!(config.is_aligned_to(3));
        assert!(!config.is_aligned_to(5));
        assert!(!config.is_aligned_to(0));

        assert!(ChunkConfig::aligned(0, 4).is_err());
        assert!(ChunkConfig::aligned(usize::MAX, 2).is_err());
    }
}
