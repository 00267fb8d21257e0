//! Configuration types for fetching tiles and compiling them into a PDF.
//!
//! The two phases are configured independently: [`FetchConfig`] describes
//! where tiles live and how politely to ask for them, [`CompileConfig`]
//! describes how hard to squeeze each page. Both are built via builders that
//! clamp or validate every knob and return
//! [`Tile2PdfError::InvalidConfig`] on nonsense.

use crate::error::Tile2PdfError;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Library of Congress map collection the tool was first pointed at.
pub const DEFAULT_BASE_URL: &str =
    "https://tile.loc.gov/storage-services/service/gmd/gmd382m/g3823m/g3823cm/gct00034/";

/// Remote file naming scheme for [`DEFAULT_BASE_URL`].
pub const DEFAULT_PATTERN: &str = "ca{number:06}.jp2";

/// Identity header sent with every request.
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

// ── URL pattern ──────────────────────────────────────────────────────────

/// A remote file-name pattern with a single `{number}` placeholder.
///
/// The placeholder may carry a zero-padding width: `{number:06}` (or the
/// printf-flavoured `{number:06d}`) renders index 7 as `000007`.
///
/// ```rust
/// use tile2pdf::UrlPattern;
///
/// let p: UrlPattern = "ca{number:06}.jp2".parse().unwrap();
/// assert_eq!(p.render(12), "ca000012.jp2");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UrlPattern {
    prefix: String,
    width: usize,
    suffix: String,
}

impl UrlPattern {
    const PLACEHOLDER: &'static str = "{number";

    /// Parse a pattern string.
    pub fn parse(pattern: &str) -> Result<Self, Tile2PdfError> {
        let invalid = |why: &str| {
            Tile2PdfError::InvalidConfig(format!("URL pattern '{pattern}': {why}"))
        };

        let start = pattern
            .find(Self::PLACEHOLDER)
            .ok_or_else(|| invalid("missing {number} placeholder"))?;
        let rest = &pattern[start + Self::PLACEHOLDER.len()..];
        let close = rest.find('}').ok_or_else(|| invalid("unclosed placeholder"))?;

        let width = match &rest[..close] {
            "" => 0,
            format => {
                let digits = format
                    .strip_prefix(':')
                    .ok_or_else(|| invalid("expected ':' before the width"))?;
                let digits = digits.strip_suffix('d').unwrap_or(digits);
                digits
                    .parse::<usize>()
                    .map_err(|_| invalid("width must be a number, e.g. {number:06}"))?
            }
        };

        let suffix = &rest[close + 1..];
        if suffix.contains(Self::PLACEHOLDER) {
            return Err(invalid("only one {number} placeholder is allowed"));
        }

        Ok(Self {
            prefix: pattern[..start].to_string(),
            width,
            suffix: suffix.to_string(),
        })
    }

    /// Substitute `index` into the pattern.
    pub fn render(&self, index: u64) -> String {
        format!(
            "{}{:0width$}{}",
            self.prefix,
            index,
            self.suffix,
            width = self.width
        )
    }
}

impl Default for UrlPattern {
    fn default() -> Self {
        Self {
            prefix: "ca".into(),
            width: 6,
            suffix: ".jp2".into(),
        }
    }
}

impl FromStr for UrlPattern {
    type Err = Tile2PdfError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for UrlPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.width == 0 {
            write!(f, "{}{{number}}{}", self.prefix, self.suffix)
        } else {
            write!(f, "{}{{number:0{}}}{}", self.prefix, self.width, self.suffix)
        }
    }
}

// ── Fetch configuration ──────────────────────────────────────────────────

/// Configuration for the download phase.
///
/// Built via [`FetchConfig::builder()`] or using [`FetchConfig::default()`].
///
/// # Example
/// ```rust
/// use tile2pdf::FetchConfig;
///
/// let config = FetchConfig::builder()
///     .base_url("https://example.org/tiles/")
///     .pattern("page{number:04}.png")
///     .extension("png")
///     .delay_ms(0)
///     .build()
///     .unwrap();
/// assert_eq!(config.url_for(3), "https://example.org/tiles/page0003.png");
/// ```
#[derive(Clone)]
pub struct FetchConfig {
    /// Prefix every tile URL starts with.
    pub base_url: String,

    /// Remote file-name pattern appended to `base_url`.
    pub pattern: UrlPattern,

    /// Directory downloaded tiles are written to. Default: `downloaded_images`.
    pub output_dir: PathBuf,

    /// Local file-name prefix. Default: `image_`.
    pub file_prefix: String,

    /// Zero-padded width of the index in local file names. Default: 6.
    ///
    /// Fixed width is what makes a lexicographic directory listing come back
    /// in index order.
    pub index_width: usize,

    /// Local file extension, without the dot. Default: `jp2`.
    pub extension: String,

    /// Per-request timeout in seconds. Default: 30.
    pub timeout_secs: u64,

    /// Fixed pause between two requests in milliseconds. Default: 500.
    pub delay_ms: u64,

    /// `User-Agent` header sent with every request.
    pub user_agent: String,

    /// Optional per-tile progress events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            pattern: UrlPattern::default(),
            output_dir: PathBuf::from("downloaded_images"),
            file_prefix: "image_".to_string(),
            index_width: 6,
            extension: "jp2".to_string(),
            timeout_secs: 30,
            delay_ms: 500,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            progress_callback: None,
        }
    }
}

impl fmt::Debug for FetchConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FetchConfig")
            .field("base_url", &self.base_url)
            .field("pattern", &self.pattern.to_string())
            .field("output_dir", &self.output_dir)
            .field("file_prefix", &self.file_prefix)
            .field("index_width", &self.index_width)
            .field("extension", &self.extension)
            .field("timeout_secs", &self.timeout_secs)
            .field("delay_ms", &self.delay_ms)
            .field("user_agent", &self.user_agent)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn ProgressCallback>"),
            )
            .finish()
    }
}

impl FetchConfig {
    /// Create a new builder for `FetchConfig`.
    pub fn builder() -> FetchConfigBuilder {
        FetchConfigBuilder {
            config: Self::default(),
            pattern: None,
        }
    }

    /// Remote URL for tile `index`.
    pub fn url_for(&self, index: u64) -> String {
        format!("{}{}", self.base_url, self.pattern.render(index))
    }

    /// Local path tile `index` is saved to.
    pub fn local_path_for(&self, index: u64) -> PathBuf {
        self.output_dir.join(format!(
            "{}{:0width$}.{}",
            self.file_prefix,
            index,
            self.extension,
            width = self.index_width
        ))
    }
}

/// Builder for [`FetchConfig`].
#[derive(Debug)]
pub struct FetchConfigBuilder {
    config: FetchConfig,
    pattern: Option<String>,
}

impl FetchConfigBuilder {
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = url.into();
        self
    }

    /// Pattern is parsed in [`build`](Self::build).
    pub fn pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = Some(pattern.into());
        self
    }

    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.output_dir = dir.into();
        self
    }

    pub fn file_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.file_prefix = prefix.into();
        self
    }

    pub fn index_width(mut self, width: usize) -> Self {
        self.config.index_width = width.clamp(1, 20);
        self
    }

    pub fn extension(mut self, ext: impl Into<String>) -> Self {
        let ext: String = ext.into();
        self.config.extension = ext.trim_start_matches('.').to_string();
        self
    }

    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.config.timeout_secs = secs.max(1);
        self
    }

    pub fn delay_ms(mut self, ms: u64) -> Self {
        self.config.delay_ms = ms;
        self
    }

    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.config.user_agent = ua.into();
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(mut self) -> Result<FetchConfig, Tile2PdfError> {
        if let Some(ref src) = self.pattern {
            self.config.pattern = UrlPattern::parse(src)?;
        }
        let c = &self.config;
        if c.base_url.is_empty() {
            return Err(Tile2PdfError::InvalidConfig("Base URL must not be empty".into()));
        }
        if c.extension.is_empty() {
            return Err(Tile2PdfError::InvalidConfig(
                "File extension must not be empty".into(),
            ));
        }
        Ok(self.config)
    }
}

// ── Compile configuration ────────────────────────────────────────────────

/// Configuration for the PDF compilation phase.
///
/// # Example
/// ```rust
/// use tile2pdf::CompileConfig;
///
/// let config = CompileConfig::builder()
///     .max_dimension(1600)
///     .quality(70)
///     .build()
///     .unwrap();
/// assert_eq!(config.quality, 70);
/// ```
#[derive(Clone)]
pub struct CompileConfig {
    /// Longest allowed edge in pixels. Larger images are downscaled,
    /// smaller ones are never upscaled. Default: 2000.
    pub max_dimension: u32,

    /// JPEG quality, 1–100. Default: 85.
    pub quality: u8,

    /// Nominal resolution written into the page geometry, in DPI. Default: 100.
    ///
    /// A page of `w` pixels becomes `w * 72 / resolution` points wide.
    pub resolution: f32,

    /// Optional per-page progress events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for CompileConfig {
    fn default() -> Self {
        Self {
            max_dimension: 2000,
            quality: 85,
            resolution: 100.0,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for CompileConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompileConfig")
            .field("max_dimension", &self.max_dimension)
            .field("quality", &self.quality)
            .field("resolution", &self.resolution)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn ProgressCallback>"),
            )
            .finish()
    }
}

impl CompileConfig {
    /// Create a new builder for `CompileConfig`.
    pub fn builder() -> CompileConfigBuilder {
        CompileConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`CompileConfig`].
#[derive(Debug)]
pub struct CompileConfigBuilder {
    config: CompileConfig,
}

impl CompileConfigBuilder {
    pub fn max_dimension(mut self, px: u32) -> Self {
        self.config.max_dimension = px;
        self
    }

    /// Clamped to 1–100, so any value builds.
    pub fn quality(mut self, q: u8) -> Self {
        self.config.quality = q.clamp(1, 100);
        self
    }

    pub fn resolution(mut self, dpi: f32) -> Self {
        self.config.resolution = dpi;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<CompileConfig, Tile2PdfError> {
        let c = &self.config;
        if c.max_dimension == 0 {
            return Err(Tile2PdfError::InvalidConfig(
                "Max dimension must be ≥ 1".into(),
            ));
        }
        if !(c.resolution.is_finite() && c.resolution > 0.0) {
            return Err(Tile2PdfError::InvalidConfig(format!(
                "Resolution must be a positive DPI, got {}",
                c.resolution
            )));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pattern_with_padding() {
        let p = UrlPattern::parse("ca{number:06}.jp2").unwrap();
        assert_eq!(p.render(1), "ca000001.jp2");
        assert_eq!(p.render(162), "ca000162.jp2");
        assert_eq!(p.render(1_234_567), "ca1234567.jp2");
    }

    #[test]
    fn pattern_printf_style_and_bare() {
        assert_eq!(UrlPattern::parse("p{number:03d}.png").unwrap().render(9), "p009.png");
        assert_eq!(UrlPattern::parse("{number}.jpg").unwrap().render(42), "42.jpg");
    }

    #[test]
    fn pattern_rejects_garbage() {
        assert!(UrlPattern::parse("no-placeholder.jp2").is_err());
        assert!(UrlPattern::parse("a{number:06.jp2").is_err());
        assert!(UrlPattern::parse("a{number:xx}.jp2").is_err());
        assert!(UrlPattern::parse("{number}/{number}.jp2").is_err());
    }

    #[test]
    fn pattern_display_round_trips() {
        for src in ["ca{number:06}.jp2", "{number}.png"] {
            let p = UrlPattern::parse(src).unwrap();
            assert_eq!(UrlPattern::parse(&p.to_string()).unwrap(), p);
        }
    }

    #[test]
    fn default_fetch_config_matches_archive_layout() {
        let c = FetchConfig::default();
        assert_eq!(
            c.url_for(1),
            format!("{DEFAULT_BASE_URL}ca000001.jp2")
        );
        assert_eq!(
            c.local_path_for(17),
            PathBuf::from("downloaded_images").join("image_000017.jp2")
        );
    }

    #[test]
    fn fetch_builder_parses_pattern_late() {
        let err = FetchConfig::builder().pattern("oops").build().unwrap_err();
        assert!(matches!(err, Tile2PdfError::InvalidConfig(_)));

        let c = FetchConfig::builder()
            .extension(".png")
            .index_width(4)
            .output_dir("tiles")
            .build()
            .unwrap();
        assert_eq!(c.local_path_for(5), PathBuf::from("tiles").join("image_0005.png"));
    }

    #[test]
    fn compile_builder_clamps_quality() {
        assert_eq!(CompileConfig::builder().quality(0).build().unwrap().quality, 1);
        assert_eq!(CompileConfig::builder().quality(200).build().unwrap().quality, 100);
        for q in 0..=u8::MAX {
            let built = CompileConfig::builder().quality(q).build().unwrap().quality;
            assert!((1..=100).contains(&built), "q={q} built {built}");
        }
    }

    #[test]
    fn compile_builder_rejects_zero_dimension() {
        assert!(CompileConfig::builder().max_dimension(0).build().is_err());
        assert!(CompileConfig::builder().resolution(0.0).build().is_err());
    }
}
