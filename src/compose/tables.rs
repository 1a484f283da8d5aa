//! Strategy tables used during composition.

use bean_merge::{MatchRule, Strategy, StrategyTable};

use super::plugin::IDENTITY_FIELD;

/// Rules for merging the user's toolchain overrides into the mode tree.
pub fn override_table() -> StrategyTable {
    StrategyTable::new()
        .with("module.rules", Strategy::Append)
        .with(
            "plugins",
            Strategy::MatchReplace(
                MatchRule::on(IDENTITY_FIELD).field("options", Strategy::Replace),
            ),
        )
        .with("optimization.minimize", Strategy::Replace)
        .with("optimization.minimizer", Strategy::Replace)
        .with("optimization.splitChunks.cacheGroups.*", Strategy::Merge)
        .with("resolve.alias", Strategy::Merge)
}

/// Rules for merging the mode tree over the base tree.
pub fn composition_table() -> StrategyTable {
    StrategyTable::new()
        .with(
            "module.rules",
            Strategy::MatchReplace(
                MatchRule::on("test")
                    .field("use", Strategy::Replace)
                    .field("include", Strategy::Replace)
                    .field("exclude", Strategy::Replace),
            ),
        )
        .with("plugins", Strategy::Append)
        .with("resolve.alias", Strategy::Merge)
        .with("optimization.minimizer", Strategy::Replace)
        .with("optimization.splitChunks", Strategy::Replace)
}
