use crate::*;

mod amount_and_date_inputs;
mod color_preview;
mod date_range_toggle;
mod page_utilities;
mod timers_and_events;

pub(crate) fn page(html: &str) -> Page {
    Page::from_html(html).unwrap()
}

pub(crate) fn enhanced(html: &str) -> (Page, Enhancer) {
    let mut page = page(html);
    let enhancer = Enhancer::install(&mut page).unwrap();
    (page, enhancer)
}

/// Unix milliseconds for 2026-08-30T00:00:00Z.
pub(crate) const AUG_30_2026_MS: i64 = 20_695 * 86_400_000;
