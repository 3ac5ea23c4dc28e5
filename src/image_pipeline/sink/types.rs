//! TIFF sink configuration types

use std::path::PathBuf;

/// TIFF compression methods
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TiffCompression {
    /// No compression (fastest, largest file)
    None,
    /// LZW compression (slow, good compression)
    Lzw,
    /// Deflate compression - fast level (good speed/size balance)
    DeflateFast,
    /// Deflate compression - best compression (slower)
    DeflateBest,
    /// Deflate compression - balanced (default)
    DeflateBalanced,
}

/// Configuration for writing rendered frames as TIFF files
#[derive(Debug, Clone)]
pub struct TiffSinkConfig {
    /// Directory the frames are written to; must exist
    pub directory: PathBuf,
    /// File name prefix, followed by `_<sequence>.tiff`
    pub prefix: String,
    /// Compression method to use
    pub compression: TiffCompression,
    /// Predictor value for compression (2 for horizontal differencing)
    pub predictor: Option<u16>,
    /// Write every n-th frame by sequence number; 0 is treated as 1
    pub every_nth: u64,
    /// Place the color bar to the right of the frame when one is attached
    pub compose_color_bar: bool,
}

impl Default for TiffSinkConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("."),
            prefix: "frame".to_string(),
            compression: TiffCompression::None,
            predictor: None,
            every_nth: 1,
            compose_color_bar: false,
        }
    }
}

impl TiffSinkConfig {
    pub fn builder() -> TiffSinkConfigBuilder {
        TiffSinkConfigBuilder::default()
    }
}

/// Builder for TiffSinkConfig
#[derive(Default)]
pub struct TiffSinkConfigBuilder {
    directory: Option<PathBuf>,
    prefix: Option<String>,
    compression: Option<TiffCompression>,
    predictor: Option<Option<u16>>,
    every_nth: Option<u64>,
    compose_color_bar: Option<bool>,
}

impl TiffSinkConfigBuilder {
    pub fn directory(mut self, directory: impl Into<PathBuf>) -> Self {
        self.directory = Some(directory.into());
        self
    }

    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    pub fn compression(mut self, compression: TiffCompression) -> Self {
        self.compression = Some(compression);
        self
    }

    pub fn predictor(mut self, predictor: Option<u16>) -> Self {
        self.predictor = Some(predictor);
        self
    }

    pub fn every_nth(mut self, n: u64) -> Self {
        self.every_nth = Some(n);
        self
    }

    pub fn compose_color_bar(mut self, enable: bool) -> Self {
        self.compose_color_bar = Some(enable);
        self
    }

    pub fn build(self) -> TiffSinkConfig {
        let default = TiffSinkConfig::default();
        TiffSinkConfig {
            directory: self.directory.unwrap_or(default.directory),
            prefix: self.prefix.unwrap_or(default.prefix),
            compression: self.compression.unwrap_or(default.compression),
            predictor: self.predictor.unwrap_or(default.predictor),
            every_nth: self.every_nth.unwrap_or(default.every_nth).max(1),
            compose_color_bar: self.compose_color_bar.unwrap_or(default.compose_color_bar),
        }
    }
}
