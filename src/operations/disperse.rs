//! Sibling dispersal.
//!
//! Cards generated from one note tend to come due together. For every
//! note with at least two review cards, each sibling gets a window around
//! its memory-derived due day (starting no earlier than tomorrow; cards
//! already due stay pinned), the latest sibling review joins as an anchor,
//! and the gap maximizer spreads them.

use std::collections::BTreeMap;

use super::{review_cards, Collection, OperationReport, UpdateBatch};
use crate::error::Result;
use crate::models::{Card, DayLoad, DayRange, GroupMember, NoteId};
use crate::scheduler::Engine;
use crate::worker::BatchControl;

/// Spreads sibling cards of every note apart.
#[tracing::instrument(skip_all, fields(today = engine.today()))]
pub fn disperse_siblings<C: Collection + ?Sized>(
    engine: &Engine,
    collection: &mut C,
    control: &mut BatchControl,
) -> Result<OperationReport> {
    let today = engine.today();
    let cards = review_cards(collection)?;
    let mut load = DayLoad::from_dues(cards.iter().map(|c| (c.preset_id, c.due)));

    let mut notes: BTreeMap<NoteId, Vec<&Card>> = BTreeMap::new();
    for card in &cards {
        notes.entry(card.note_id).or_default().push(card);
    }
    let groups: Vec<Vec<&Card>> = notes
        .into_values()
        .filter(|siblings| siblings.len() > 1)
        .collect();

    let mut batch = UpdateBatch::begin(collection, "disperse siblings", engine.config().batch_cadence)?;
    let total = groups.len();
    for (done, siblings) in groups.iter().enumerate() {
        batch.report.processed += siblings.len();
        let movable: Vec<&Card> = siblings.iter().copied().filter(|c| c.has_usable_memory()).collect();
        batch.report.skipped += siblings.len() - movable.len();

        if movable.len() > 1 {
            let anchor = siblings
                .iter()
                .map(|c| c.last_review_day())
                .max()
                .unwrap_or(today);
            let mut members = vec![GroupMember::Anchor(anchor)];
            for card in &movable {
                let Some(item) = card.to_item() else { continue };
                let range = if card.due <= today {
                    DayRange::point(card.due)
                } else {
                    let target = engine.target_interval(item.stability, item.preset_id);
                    let window = engine.due_window(target, item.last_review_day, item.preset_id);
                    DayRange::new(window.low().max(today + 1), window.high().max(today + 1))?
                };
                members.push(GroupMember::Card(item.with_range(range)));
            }

            let allocation = engine.allocate_group(&members, &load)?;
            for card in &movable {
                if let Some(day) = allocation.assignment.get(card.id) {
                    load.relocate(card.preset_id, card.due, day);
                    batch.update(card, day, day - card.last_review_day())?;
                }
            }
            tracing::debug!(
                note = siblings[0].note_id.0,
                min_gap = allocation.min_gap,
                "siblings dispersed"
            );
        }

        if !control.checkpoint(done + 1, total) {
            break;
        }
    }

    let report = batch.finish(control.was_cancelled())?;
    tracing::info!(
        notes = total,
        changed = report.changed,
        skipped = report.skipped,
        "sibling dispersal finished"
    );
    Ok(report)
}
