//! Configuration options for the level index.

/// Tuning knobs consumed by [`Version`](crate::Version) construction and the
/// compaction signals it derives.
#[derive(Debug, Clone)]
pub struct Options {
    /// Number of levels.
    /// Default: 7 (Level 0 through Level 6)
    pub num_levels: usize,

    /// Number of Level 0 files at which a compaction becomes necessary.
    /// Default: 4
    pub level0_compaction_trigger: usize,

    /// Target size of Level 1 in bytes.
    /// Default: 10MB
    pub base_level_size: u64,

    /// Size multiplier between levels.
    /// Default: 10 (Level N+1 is 10x larger than Level N)
    pub level_size_multiplier: u64,

    /// Target size of a single table file in bytes.
    /// Default: 2MB
    pub target_file_size: u64,

    /// Deepest level a freshly flushed table may be placed in.
    /// Default: 2
    pub max_mem_compact_level: usize,

    /// Bytes of table data that cost as much to compact as one extra seek.
    /// Default: 16KB
    pub seek_cost_bytes: u64,

    /// Lower bound for a file's seek allowance.
    /// Default: 100
    pub min_allowed_seeks: u64,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            num_levels: 7,
            level0_compaction_trigger: 4,
            base_level_size: 10 * 1024 * 1024, // 10MB
            level_size_multiplier: 10,
            target_file_size: 2 * 1024 * 1024, // 2MB
            max_mem_compact_level: 2,
            seek_cost_bytes: 16 * 1024, // 16KB
            min_allowed_seeks: 100,
        }
    }
}

impl Options {
    /// Creates a new Options with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the number of levels.
    pub fn num_levels(mut self, value: usize) -> Self {
        self.num_levels = value;
        self
    }

    /// Sets the Level 0 file count that triggers compaction.
    pub fn level0_compaction_trigger(mut self, value: usize) -> Self {
        self.level0_compaction_trigger = value;
        self
    }

    /// Sets the target size of Level 1.
    pub fn base_level_size(mut self, size: u64) -> Self {
        self.base_level_size = size;
        self
    }

    /// Sets the target table file size.
    pub fn target_file_size(mut self, size: u64) -> Self {
        self.target_file_size = size;
        self
    }

    /// Sets the deepest level a flushed table may be placed in.
    pub fn max_mem_compact_level(mut self, level: usize) -> Self {
        self.max_mem_compact_level = level;
        self
    }

    /// Sets the seek allowance parameters.
    pub fn seek_allowance(mut self, seek_cost_bytes: u64, min_allowed_seeks: u64) -> Self {
        self.seek_cost_bytes = seek_cost_bytes;
        self.min_allowed_seeks = min_allowed_seeks;
        self
    }

    /// Maximum total bytes for a level before it needs compaction.
    ///
    /// Level 0 is governed by file count, so it reports `u64::MAX`.
    pub fn max_bytes_for_level(&self, level: usize) -> u64 {
        if level == 0 {
            return u64::MAX;
        }
        let mut bytes = self.base_level_size;
        for _ in 1..level {
            bytes = bytes.saturating_mul(self.level_size_multiplier);
        }
        bytes
    }

    /// Maximum bytes a flushed table may overlap in its grandparent level.
    pub fn max_grandparent_overlap_bytes(&self) -> u64 {
        self.target_file_size.saturating_mul(10)
    }

    /// Initial seek allowance for a file of `file_size` bytes.
    pub fn allowed_seeks_for(&self, file_size: u64) -> u64 {
        (file_size / self.seek_cost_bytes).max(self.min_allowed_seeks)
    }

    /// Validates the options and returns an error if any are invalid.
    pub fn validate(&self) -> crate::Result<()> {
        if self.num_levels < 2 {
            return Err(crate::Error::invalid_argument("num_levels must be >= 2"));
        }
        if self.level0_compaction_trigger == 0 {
            return Err(crate::Error::invalid_argument("level0_compaction_trigger must be > 0"));
        }
        if self.level_size_multiplier < 2 {
            return Err(crate::Error::invalid_argument("level_size_multiplier must be >= 2"));
        }
        if self.seek_cost_bytes == 0 {
            return Err(crate::Error::invalid_argument("seek_cost_bytes must be > 0"));
        }
        if self.max_mem_compact_level >= self.num_levels {
            return Err(crate::Error::invalid_argument(
                "max_mem_compact_level must be below num_levels",
            ));
        }
        Ok(())
    }
}
