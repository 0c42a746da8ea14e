//! Per-zoom progress bars.

use std::collections::BTreeMap;
use std::sync::Arc;

use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};
use tracing::debug;

const TEMPLATE: &str = "zoom {prefix:>2} [{bar:40.cyan/blue}] {pos}/{len} {elapsed}";

/// One bar per zoom level, sized to the tiles enumerated at that zoom.
///
/// Cheap to clone; every worker holds a copy and ticks the bar of the zoom
/// it just finished a tile for.
#[derive(Clone)]
pub struct TileProgress {
    multi: MultiProgress,
    bars: Arc<BTreeMap<u8, ProgressBar>>,
}

impl TileProgress {
    /// `plan` holds `(zoom, tile count)` pairs. Hidden bars still count.
    pub fn new(plan: &[(u8, u64)], visible: bool) -> Self {
        let target = if visible {
            ProgressDrawTarget::stderr()
        } else {
            ProgressDrawTarget::hidden()
        };
        let multi = MultiProgress::with_draw_target(target);

        let style = ProgressStyle::default_bar()
            .template(TEMPLATE)
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("##-");

        let bars = plan
            .iter()
            .map(|&(zoom, count)| {
                let bar = multi.add(ProgressBar::new(count));
                bar.set_style(style.clone());
                bar.set_prefix(zoom.to_string());
                (zoom, bar)
            })
            .collect();

        Self {
            multi,
            bars: Arc::new(bars),
        }
    }

    /// A tile at `zoom` was handled, written or not.
    pub fn inc(&self, zoom: u8) {
        if let Some(bar) = self.bars.get(&zoom) {
            bar.inc(1);
        }
    }

    pub fn position(&self, zoom: u8) -> Option<u64> {
        self.bars.get(&zoom).map(|bar| bar.position())
    }

    /// Stop drawing. Bars that did not complete are left where they stopped.
    pub fn finish(&self) {
        for bar in self.bars.values() {
            if bar.length() == Some(bar.position()) {
                bar.finish();
            } else {
                bar.abandon();
            }
        }
        if let Err(e) = self.multi.clear() {
            debug!(error = %e, "Failed to clear progress bars");
        }
    }
}
