//! The sequential download loop.
//!
//! One request per index, strictly in order, each awaited before the next is
//! sent. The loop has no upper bound on the index: the only way out is
//! `threshold` consecutive 404s. Other statuses and transport failures are
//! logged and skipped without touching the counter, so a server that answers
//! 500 forever keeps the loop running forever.

use crate::config::FetchConfig;
use crate::error::{Tile2PdfError, TransportError};
use crate::pipeline::source::{HttpTileSource, TileSource};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};

/// One planned request: where to fetch from and where to save to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadTarget {
    pub index: u64,
    pub url: String,
    pub local_path: PathBuf,
}

impl DownloadTarget {
    pub fn new(index: u64, config: &FetchConfig) -> Self {
        Self {
            index,
            url: config.url_for(index),
            local_path: config.local_path_for(index),
        }
    }
}

/// How a single request ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FetchOutcome {
    /// 200: body written to this path.
    Saved(PathBuf),
    /// 404: counts towards the stop rule.
    NotFound,
    /// Any other status.
    OtherHttpError(u16),
    /// No status at all.
    TransportError(TransportError),
}

impl FetchOutcome {
    pub fn is_saved(&self) -> bool {
        matches!(self, FetchOutcome::Saved(_))
    }
}

/// Loop state: the miss counter, the saved paths and the index cursor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunState {
    consecutive_not_found: u32,
    saved_paths: Vec<PathBuf>,
    current_index: u64,
}

impl RunState {
    pub fn new(start_index: u64) -> Self {
        Self {
            consecutive_not_found: 0,
            saved_paths: Vec::new(),
            current_index: start_index,
        }
    }

    /// Fold one outcome into the state and move the cursor forward.
    pub fn record(&mut self, outcome: &FetchOutcome) {
        match outcome {
            FetchOutcome::Saved(path) => {
                self.saved_paths.push(path.clone());
                self.consecutive_not_found = 0;
            }
            FetchOutcome::NotFound => self.consecutive_not_found += 1,
            FetchOutcome::OtherHttpError(_) | FetchOutcome::TransportError(_) => {}
        }
        self.current_index += 1;
    }

    /// True once `threshold` misses have been seen in a row.
    pub fn should_stop(&self, threshold: u32) -> bool {
        self.consecutive_not_found >= threshold
    }

    pub fn consecutive_not_found(&self) -> u32 {
        self.consecutive_not_found
    }

    pub fn current_index(&self) -> u64 {
        self.current_index
    }

    pub fn saved_paths(&self) -> &[PathBuf] {
        &self.saved_paths
    }

    pub fn into_saved_paths(self) -> Vec<PathBuf> {
        self.saved_paths
    }
}

/// Downloads numbered tiles until the consecutive-404 stop rule fires.
pub struct Fetcher<S = HttpTileSource> {
    source: S,
    config: FetchConfig,
}

impl Fetcher<HttpTileSource> {
    /// Fetcher talking HTTP with a client built from `config`.
    pub fn http(config: FetchConfig) -> Result<Self, Tile2PdfError> {
        let source = HttpTileSource::new(&config)?;
        Ok(Self::new(source, config))
    }
}

impl<S: TileSource> Fetcher<S> {
    pub fn new(source: S, config: FetchConfig) -> Self {
        Self { source, config }
    }

    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    /// Download tiles from `start_index` upwards and return the saved paths
    /// in index order.
    ///
    /// Only setup and disk failures are returned as errors; every network
    /// outcome is classified and absorbed.
    pub async fn fetch(
        &self,
        start_index: u64,
        stop_after_not_found: u32,
    ) -> Result<Vec<PathBuf>, Tile2PdfError> {
        if stop_after_not_found == 0 {
            return Err(Tile2PdfError::InvalidConfig(
                "Consecutive-404 threshold must be ≥ 1".into(),
            ));
        }

        let dir = &self.config.output_dir;
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|e| Tile2PdfError::OutputDirFailed {
                path: dir.clone(),
                source: e,
            })?;

        info!(
            "Starting download from tile {} into {}; stopping after {} consecutive 404s",
            start_index,
            dir.display(),
            stop_after_not_found
        );
        if let Some(ref cb) = self.config.progress_callback {
            cb.on_fetch_start(start_index, stop_after_not_found);
        }

        let delay = Duration::from_millis(self.config.delay_ms);
        let mut state = RunState::new(start_index);

        loop {
            let target = DownloadTarget::new(state.current_index(), &self.config);
            if let Some(ref cb) = self.config.progress_callback {
                cb.on_tile_start(target.index);
            }

            let outcome = self.fetch_one(&target).await?;
            state.record(&outcome);

            if let Some(ref cb) = self.config.progress_callback {
                cb.on_tile_outcome(
                    target.index,
                    &outcome,
                    state.consecutive_not_found(),
                    stop_after_not_found,
                );
            }

            if state.should_stop(stop_after_not_found) {
                break;
            }
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
        }

        let saved = state.into_saved_paths();
        info!("Download complete: {} tiles saved", saved.len());
        if let Some(ref cb) = self.config.progress_callback {
            cb.on_fetch_complete(saved.len());
        }
        Ok(saved)
    }

    /// Request one tile and classify the answer.
    async fn fetch_one(&self, target: &DownloadTarget) -> Result<FetchOutcome, Tile2PdfError> {
        debug!("Requesting tile {} from {}", target.index, target.url);

        let response = match self.source.get(&target.url).await {
            Ok(r) => r,
            Err(e) => {
                warn!("Tile {}: {}", target.index, e);
                return Ok(FetchOutcome::TransportError(e));
            }
        };

        match response.status {
            200 => {
                tokio::fs::write(&target.local_path, &response.body)
                    .await
                    .map_err(|e| Tile2PdfError::TileWriteFailed {
                        index: target.index,
                        path: target.local_path.clone(),
                        source: e,
                    })?;
                debug!(
                    "Tile {} saved to {} ({} bytes)",
                    target.index,
                    target.local_path.display(),
                    response.body.len()
                );
                Ok(FetchOutcome::Saved(target.local_path.clone()))
            }
            404 => {
                debug!("Tile {}: not found", target.index);
                Ok(FetchOutcome::NotFound)
            }
            status => {
                warn!("Tile {}: HTTP {}", target.index, status);
                Ok(FetchOutcome::OtherHttpError(status))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn saved(i: u64) -> FetchOutcome {
        FetchOutcome::Saved(PathBuf::from(format!("image_{i:06}.jp2")))
    }

    /// Feed outcomes until the rule fires; return how many were consumed.
    fn run(outcomes: &[FetchOutcome], threshold: u32) -> Option<usize> {
        let mut state = RunState::new(1);
        for (n, o) in outcomes.iter().enumerate() {
            state.record(o);
            if state.should_stop(threshold) {
                return Some(n + 1);
            }
        }
        None
    }

    #[test]
    fn success_resets_the_counter() {
        use FetchOutcome::NotFound as N;
        let seq = vec![N, N, saved(3), N, N, N, N, N];
        assert_eq!(run(&seq, 5), Some(8));
        assert_eq!(run(&seq[..7], 5), None);
    }

    #[test]
    fn errors_alone_never_stop() {
        let mut seq = Vec::new();
        for _ in 0..50 {
            seq.push(FetchOutcome::OtherHttpError(500));
            seq.push(FetchOutcome::TransportError(TransportError::Timeout { secs: 30 }));
        }
        assert_eq!(run(&seq, 1), None);
    }

    #[test]
    fn misses_accumulate_across_interleaved_errors() {
        let mut seq = Vec::new();
        for _ in 0..50 {
            seq.push(FetchOutcome::OtherHttpError(500));
            seq.push(FetchOutcome::NotFound);
        }
        // Fifth 404 arrives on the tenth request.
        assert_eq!(run(&seq, 5), Some(10));
    }

    #[test]
    fn other_errors_do_not_reset_either() {
        use FetchOutcome::NotFound as N;
        let seq = vec![
            N,
            FetchOutcome::OtherHttpError(503),
            N,
            FetchOutcome::TransportError(TransportError::Timeout { secs: 30 }),
            N,
        ];
        assert_eq!(run(&seq, 3), Some(5));
        assert_eq!(run(&seq, 4), None);
    }

    #[test]
    fn cursor_advances_on_every_outcome() {
        let mut state = RunState::new(10);
        state.record(&FetchOutcome::NotFound);
        state.record(&FetchOutcome::OtherHttpError(418));
        state.record(&saved(12));
        assert_eq!(state.current_index(), 13);
        assert_eq!(state.saved_paths().len(), 1);
    }

    #[test]
    fn target_derives_url_and_path() {
        let config = FetchConfig::builder()
            .base_url("https://example.org/t/")
            .pattern("ca{number:06}.jp2")
            .output_dir("out")
            .build()
            .unwrap();
        let t = DownloadTarget::new(7, &config);
        assert_eq!(t.url, "https://example.org/t/ca000007.jp2");
        assert_eq!(t.local_path, PathBuf::from("out").join("image_000007.jp2"));
    }
}
