// src/pipeline/screening.rs
use metrics::counter;

use super::state::{PipelineState, Stage};
use super::Pipeline;
use crate::pool::{fan_out, with_timeout};

/// Screen this round's pending items; failures keep the item.
pub(crate) async fn screen(p: &Pipeline, mut state: PipelineState) -> PipelineState {
    let pending = std::mem::take(&mut state.pending);
    let total = pending.len();
    let limit = p.config.request_timeout;
    let min_confidence = p.config.min_screen_confidence;

    let verdicts = fan_out(pending, p.config.max_workers, |item| {
        let screener = p.screener.clone();
        async move {
            let verdict = with_timeout(limit, "screen", screener.screen(&item)).await;
            (item, verdict)
        }
    })
    .await;

    let mut kept = 0usize;
    let mut dropped = 0usize;
    for (mut item, verdict) in verdicts {
        match verdict {
            Ok(d) if d.passes(min_confidence) => {
                if let Some(cat) = d.category {
                    item.category = Some(cat);
                }
                kept += 1;
                state.screened.push(item);
            }
            Ok(d) => {
                tracing::debug!(
                    target: "screen",
                    title = %item.title,
                    keep = d.keep,
                    confidence = d.confidence,
                    rationale = %d.rationale,
                    "discarded"
                );
                dropped += 1;
            }
            Err(e) => {
                tracing::warn!(target: "screen", url = %item.url, error = %e, "screening failed; keeping item");
                state.record_error(&format!("screen {}", item.url), format!("{e:#}"));
                kept += 1;
                state.screened.push(item);
            }
        }
    }
    state.discarded += dropped;
    counter!("trends_items_discarded_total").increment(dropped as u64);

    let PipelineState {
        dedup, screened, ..
    } = &mut state;
    dedup.prune_references(screened.iter());

    tracing::info!(
        target: "screen",
        provider = p.screener.provider_name(),
        round = state.round,
        total,
        kept,
        dropped,
        "screening finished"
    );

    state.stage = Stage::Deciding;
    state
}
