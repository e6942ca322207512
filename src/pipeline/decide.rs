// src/pipeline/decide.rs
use super::state::{PipelineState, Stage};
use crate::config::PipelineConfig;
use crate::sources::types::Category;

/// Why collection stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    NoNewItems,
    MaxPasses,
    QuotaMet,
    MaxLookback,
}

pub fn stop_reason(cfg: &PipelineConfig, state: &PipelineState) -> Option<StopReason> {
    if state.last_round_added == 0 {
        return Some(StopReason::NoNewItems);
    }
    if state.round >= cfg.max_collection_passes {
        return Some(StopReason::MaxPasses);
    }
    let satisfied = Category::ALL.iter().all(|&c| {
        state.is_exhausted(c) || state.screened_in(c) >= cfg.collection_limit_per_category
    });
    if satisfied {
        return Some(StopReason::QuotaMet);
    }
    if state.lookback_days >= cfg.max_lookback_days {
        return Some(StopReason::MaxLookback);
    }
    None
}

/// Stop and score, or widen the lookback window and collect again.
pub(crate) fn decide(cfg: &PipelineConfig, mut state: PipelineState) -> PipelineState {
    match stop_reason(cfg, &state) {
        Some(reason) => {
            tracing::info!(
                target: "decide",
                round = state.round,
                reason = ?reason,
                screened = state.screened.len(),
                "collection finished"
            );
            state.stage = Stage::Scoring;
        }
        None => {
            let next = state
                .lookback_days
                .saturating_add(cfg.lookback_step_days)
                .min(cfg.max_lookback_days);
            tracing::info!(
                target: "decide",
                round = state.round,
                from = state.lookback_days,
                to = next,
                "expanding lookback"
            );
            state.lookback_days = next;
            state.stage = Stage::Collecting;
        }
    }
    state
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::types::SourceItem;
    use chrono::Utc;

    fn state_with(round: u32, added: usize) -> PipelineState {
        let mut s = PipelineState::new(3, Utc::now());
        s.round = round;
        s.last_round_added = added;
        s
    }

    #[test]
    fn zero_additions_stop_immediately() {
        let cfg = PipelineConfig::default();
        assert_eq!(
            stop_reason(&cfg, &state_with(1, 0)),
            Some(StopReason::NoNewItems)
        );
    }

    #[test]
    fn pass_limit_stops() {
        let cfg = PipelineConfig::default();
        assert_eq!(
            stop_reason(&cfg, &state_with(3, 5)),
            Some(StopReason::MaxPasses)
        );
    }

    #[test]
    fn quota_counts_exhausted_categories_as_satisfied() {
        let cfg = PipelineConfig {
            collection_limit_per_category: 1,
            ..PipelineConfig::default()
        };
        let mut s = state_with(1, 1);
        s.screened
            .push(SourceItem::new("a", "u", "S").in_category(Category::Product));
        s.exhausted.insert(Category::Research);
        assert_eq!(stop_reason(&cfg, &s), None);
        s.exhausted.insert(Category::Infra);
        assert_eq!(stop_reason(&cfg, &s), Some(StopReason::QuotaMet));
    }

    #[test]
    fn expansion_is_capped_at_max() {
        let cfg = PipelineConfig {
            default_lookback_days: 3,
            lookback_step_days: 10,
            max_lookback_days: 8,
            ..PipelineConfig::default()
        };
        let s = decide(&cfg, state_with(1, 4));
        assert_eq!(s.stage, Stage::Collecting);
        assert_eq!(s.lookback_days, 8);
        let s = decide(&cfg, PipelineState { round: 2, ..s });
        assert_eq!(s.stage, Stage::Scoring);
    }
}
