//! Epoch distribution arithmetic.
//!
//! All shares floor. The sum of every share handed out for a pool is at
//! most the pool, whatever the magnitudes involved.

use arenastake_protocol::{AccountId, Amount, FactionId, Timestamp};
use serde::{Deserialize, Serialize};

/// One completed distribution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpochRecord {
    /// Number of the epoch that closed (from 1).
    pub number: u64,
    pub started_at: Timestamp,
    pub distributed_at: Timestamp,

    /// `reward_rate × (distributed_at − started_at)`.
    pub pool: Amount,

    /// What was actually credited. `pool - credited` stays undistributed.
    pub credited: Amount,
}

/// `floor(amount × part / whole)`, overflow-safe.
///
/// `part` is capped at `whole`, so the result never exceeds `amount`.
/// When the exact product does not fit in a `u128` the fraction is
/// shrunk from below, so the result may fall short of the exact value
/// but never exceeds it.
///
/// ```
/// use arenastake_absorber::proportional;
///
/// assert_eq!(proportional(100, 1, 3), 33);
/// assert_eq!(proportional(u128::MAX, 1, 2), u128::MAX / 2);
/// assert_eq!(proportional(10, 5, 0), 0);
/// ```
pub fn proportional(amount: Amount, part: Amount, whole: Amount) -> Amount {
    if whole == 0 || part == 0 {
        return 0;
    }
    let part = part.min(whole);
    // amount = q·whole + r, so amount·part/whole = q·part + r·part/whole.
    // q·part ≤ amount since part ≤ whole.
    let q = amount / whole;
    let r = amount % whole;
    q * part + scaled_remainder(r, part, whole)
}

/// `floor(r × p / w)` for `r < w`, `p ≤ w`.
fn scaled_remainder(r: Amount, mut p: Amount, mut w: Amount) -> Amount {
    loop {
        if let Some(product) = r.checked_mul(p) {
            return product / w;
        }
        // p/2 over (w/2 + 1) is strictly below p/w.
        p >>= 1;
        w = (w >> 1) + 1;
    }
}

/// Stake-time weights of one player at distribution time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Contribution {
    pub account: AccountId,
    pub faction: FactionId,
    /// `∫ staked_tokens dt` over the epoch.
    pub weight: Amount,
    /// `∫ staked_artifacts dt` over the epoch.
    pub artifact_weight: Amount,
}

/// How one pool is split between players.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub(crate) struct Allocation {
    pub token_pool: Amount,
    pub artifact_pool: Amount,
    /// Nonzero credits, in contribution order.
    pub credits: Vec<(AccountId, Amount)>,
}

impl Allocation {
    pub fn credited(&self) -> Amount {
        self.credits.iter().map(|(_, a)| *a).sum()
    }
}

/// Splits `pool` between `contributions`.
///
/// `faction_artifacts[f.index()]` is the staked artifact total of
/// faction `f`. When any artifacts are staked, `artifact_share_bps` of
/// the pool goes to artifact contributors: each faction gets a slice in
/// proportion to its artifacts, split among its members by artifact
/// weight. The rest is split by token weight across every player.
pub(crate) fn allocate(
    pool: Amount,
    artifact_share_bps: u16,
    faction_artifacts: &[Amount; FactionId::COUNT],
    contributions: &[Contribution],
) -> Allocation {
    let total_artifacts: Amount = faction_artifacts.iter().sum();
    let artifact_pool = if total_artifacts > 0 {
        proportional(pool, Amount::from(artifact_share_bps), 10_000)
    } else {
        0
    };
    let token_pool = pool - artifact_pool;

    let mut total_weight: Amount = 0;
    let mut faction_weight = [0 as Amount; FactionId::COUNT];
    for c in contributions {
        total_weight = total_weight.saturating_add(c.weight);
        let fw = &mut faction_weight[c.faction.index()];
        *fw = fw.saturating_add(c.artifact_weight);
    }
    let mut slices = [0 as Amount; FactionId::COUNT];
    for (slice, agg) in slices.iter_mut().zip(faction_artifacts) {
        *slice = proportional(artifact_pool, *agg, total_artifacts);
    }

    let credits = contributions
        .iter()
        .map(|c| {
            let f = c.faction.index();
            let amount = proportional(token_pool, c.weight, total_weight)
                + proportional(slices[f], c.artifact_weight, faction_weight[f]);
            (c.account, amount)
        })
        .filter(|(_, amount)| *amount > 0)
        .collect();

    Allocation {
        token_pool,
        artifact_pool,
        credits,
    }
}
