use crate::config::{Config, MeterConfig};
use crate::error::Result;
use crate::meter::{Decision, ReconciledReading};
use crate::snapshot::{read_current_reading, snapshot_path};
use crate::totals::TotalsClient;
use std::path::PathBuf;
use tracing::{debug, warn};

/// Minimum headroom (Wh) between a meter's passo and the previous total for a
/// lower reading to count as a blackout reset.
pub const BLACKOUT_MARGIN_WH: i64 = 1000;

/// Pick between the recorded total and the fresh reading.
pub fn apply_recovery_rule(previous: i64, current: i64, passo: i64) -> (i64, Decision) {
    if current < previous && passo.saturating_sub(previous) > BLACKOUT_MARGIN_WH {
        (previous, Decision::KeptPrevious)
    } else {
        (current, Decision::Current)
    }
}

pub struct Reconciler {
    totals: TotalsClient,
    snapshot_dir: PathBuf,
}

impl Reconciler {
    pub fn new(totals: TotalsClient, snapshot_dir: impl Into<PathBuf>) -> Self {
        Self {
            totals,
            snapshot_dir: snapshot_dir.into(),
        }
    }

    pub fn from_config(cfg: &Config) -> Result<Self> {
        let totals = TotalsClient::new(cfg.totals_url.clone(), cfg.http_timeout())?;
        Ok(Self::new(totals, cfg.snapshot_dir.clone()))
    }

    /// Fetch the previous total, read the snapshot, and apply the recovery rule.
    pub async fn reconcile(&self, meter: &MeterConfig) -> Result<ReconciledReading> {
        let id = &meter.id;
        let name = meter.name.as_deref().unwrap_or("-");

        let previous = self.totals.previous_total(id).await?;
        let path = snapshot_path(&self.snapshot_dir, id);
        let current = read_current_reading(&path, id)?;

        let (wh, decision) = apply_recovery_rule(previous, current, meter.passo);
        match decision {
            Decision::KeptPrevious => warn!(
                meter = %id,
                meter_name = name,
                previous,
                current,
                passo = meter.passo,
                "reading below last total; keeping previous total"
            ),
            Decision::Current => {
                debug!(meter = %id, meter_name = name, previous, current, "reading accepted")
            }
        }

        Ok(ReconciledReading {
            meter: id.clone(),
            wh,
            decision,
        })
    }
}
