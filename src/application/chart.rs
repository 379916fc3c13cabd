// Chart lifecycle - at most one live chart model process-wide
use std::sync::{Arc, Mutex};

use crate::domain::series::ChartModel;

/// Holder for the single live chart.
///
/// Every refresh builds a fresh model; the previous one is released before
/// the new one is stored, so stale chart state can never accumulate behind
/// the surface.
#[derive(Debug, Default)]
pub struct ChartLifecycle {
    slot: Mutex<ChartSlot>,
}

#[derive(Debug, Default)]
struct ChartSlot {
    current: Option<Arc<ChartModel>>,
    generation: u64,
}

impl ChartLifecycle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Release the held chart (if any) and install a fresh one. Returns the
    /// handle now live.
    pub fn install(&self, model: ChartModel) -> Arc<ChartModel> {
        let mut slot = self.slot.lock().unwrap();
        slot.current.take();
        let fresh = Arc::new(model);
        slot.current = Some(fresh.clone());
        slot.generation += 1;
        fresh
    }

    pub fn current(&self) -> Option<Arc<ChartModel>> {
        self.slot.lock().unwrap().current.clone()
    }

    /// How many charts have been installed since startup.
    pub fn generation(&self) -> u64 {
        self.slot.lock().unwrap().generation
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::series::ChartDataset;

    fn model(n: usize) -> ChartModel {
        ChartModel::new(
            (0..n).map(|i| format!("t{i}")).collect(),
            vec![ChartDataset {
                key: "v".into(),
                color: (1, 2, 3),
                points: vec![Some(1.0); n],
            }],
        )
    }

    #[test]
    fn install_replaces_and_releases_previous() {
        let lifecycle = ChartLifecycle::new();
        assert!(lifecycle.current().is_none());
        assert_eq!(lifecycle.generation(), 0);

        let first = lifecycle.install(model(1));
        let gone = Arc::downgrade(&first);
        drop(first);

        lifecycle.install(model(2));
        assert!(gone.upgrade().is_none(), "previous chart must be released");
        assert_eq!(lifecycle.generation(), 2);
        assert_eq!(lifecycle.current().unwrap().labels.len(), 2);
    }

    #[test]
    fn repeated_installs_keep_exactly_one_live() {
        let lifecycle = ChartLifecycle::new();
        let mut stale = Vec::new();
        for i in 0..5 {
            let live = lifecycle.install(model(i));
            stale.push(Arc::downgrade(&live));
        }
        assert_eq!(lifecycle.generation(), 5);
        // All but the newest are gone.
        for weak in &stale[..4] {
            assert!(weak.upgrade().is_none());
        }
        assert!(stale[4].upgrade().is_some());
    }

    #[test]
    fn zero_datasets_is_a_valid_chart() {
        let lifecycle = ChartLifecycle::new();
        lifecycle.install(ChartModel::default());
        let current = lifecycle.current().unwrap();
        assert!(current.datasets.is_empty());
        assert!(current.labels.is_empty());
    }
}
