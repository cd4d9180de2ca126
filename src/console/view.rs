//! Console entry list with filtering, selection, and scrolling
//!
//! Pure data structure, no I/O. The scroll position doubles as the
//! selection: it indexes the filtered list.

use super::{ConsoleEntry, DetailTab};
use crate::constants::AUTO_SCROLL_THRESHOLD;
use crate::logging::{ConsoleFilter, LogEntry, LogLevel};
use std::collections::VecDeque;

/// Bounded entry list backing the Logs tab
///
/// - **Rotation**: oldest entries drop out at capacity
/// - **Filtering**: level toggles and source substring, with a cached count
/// - **Scrolling**: auto-follows new entries until the user scrolls away
/// - **Pause**: freezes the selection while entries keep arriving
pub struct ConsoleView {
    entries: VecDeque<ConsoleEntry>,
    max_entries: usize,
    scroll: usize,
    auto_scroll: bool,
    filter: ConsoleFilter,
    /// Cached count of filtered entries
    filtered_cache: usize,
    paused: bool,
}

impl ConsoleView {
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(max_entries),
            max_entries: max_entries.max(1),
            scroll: 0,
            auto_scroll: true,
            filter: ConsoleFilter::default(),
            filtered_cache: 0,
            paused: false,
        }
    }

    // === Entry addition ===

    /// Add an entry, rotating out the oldest one at capacity
    pub fn add(&mut self, entry: LogEntry) {
        let entry_matches_filter = self.filter.matches(&entry);

        if self.entries.len() >= self.max_entries {
            if let Some(removed) = self.entries.pop_front() {
                if self.filter.matches(&removed.entry) {
                    self.filtered_cache = self.filtered_cache.saturating_sub(1);
                    // Keep the frozen selection on the same entry
                    if !self.auto_scroll && self.scroll > 0 {
                        self.scroll -= 1;
                    }
                }
            }
        }
        self.entries.push_back(ConsoleEntry::new(entry));

        if entry_matches_filter {
            self.filtered_cache += 1;
        }

        if self.auto_scroll && entry_matches_filter && !self.paused {
            self.scroll = self.filtered_cache.saturating_sub(1);
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.scroll = 0;
        self.filtered_cache = 0;
    }

    // === Scroll ===

    pub fn scroll_up(&mut self) {
        self.auto_scroll = false;
        self.scroll = self.scroll.saturating_sub(1);
    }

    pub fn scroll_down(&mut self) {
        let filtered_count = self.filtered_count();
        if self.scroll < filtered_count.saturating_sub(1) {
            self.scroll += 1;
        }
        if !self.paused && self.scroll >= filtered_count.saturating_sub(AUTO_SCROLL_THRESHOLD) {
            self.auto_scroll = true;
        }
    }

    pub fn scroll_to_top(&mut self) {
        self.auto_scroll = false;
        self.scroll = 0;
    }

    pub fn scroll_to_bottom(&mut self) {
        self.auto_scroll = !self.paused;
        self.scroll = self.filtered_count().saturating_sub(1);
    }

    pub fn scroll_position(&self) -> usize {
        self.scroll
    }

    // === Pause ===

    /// Toggle pause state, returns new paused state
    pub fn toggle_pause(&mut self) -> bool {
        self.paused = !self.paused;
        if self.paused {
            self.auto_scroll = false;
        } else {
            self.scroll_to_bottom();
        }
        self.paused
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    // === Filtering ===

    /// Flip one level's visibility, returns whether it is now shown
    pub fn toggle_level(&mut self, level: LogLevel) -> bool {
        let shown = self.filter.toggle_level(level);
        self.refilter();
        shown
    }

    pub fn push_source_char(&mut self, c: char) {
        self.filter.source.push(c);
        self.refilter();
    }

    pub fn pop_source_char(&mut self) {
        self.filter.source.pop();
        self.refilter();
    }

    pub fn filter(&self) -> &ConsoleFilter {
        &self.filter
    }

    fn refilter(&mut self) {
        self.filtered_cache = self
            .entries
            .iter()
            .filter(|e| self.filter.matches(&e.entry))
            .count();
        self.scroll = self.filtered_cache.saturating_sub(1);
        self.auto_scroll = !self.paused;
    }

    // === Selection ===

    pub fn selected(&self) -> Option<&ConsoleEntry> {
        self.visible().nth(self.scroll)
    }

    fn selected_mut(&mut self) -> Option<&mut ConsoleEntry> {
        let filter = &self.filter;
        self.entries
            .iter_mut()
            .filter(|e| filter.matches(&e.entry))
            .nth(self.scroll)
    }

    /// Expand or collapse the selected entry, returns the new state
    pub fn toggle_expanded(&mut self) -> Option<bool> {
        self.selected_mut().map(|e| {
            e.expanded = !e.expanded;
            e.expanded
        })
    }

    /// Step the selected entry's detail tab; `forward` picks the direction
    pub fn cycle_detail_tab(&mut self, forward: bool) -> Option<DetailTab> {
        self.selected_mut().map(|e| {
            let tabs = DetailTab::available(&e.entry);
            let pos = tabs.iter().position(|t| *t == e.tab).unwrap_or(0);
            let next = if forward {
                (pos + 1) % tabs.len()
            } else {
                (pos + tabs.len() - 1) % tabs.len()
            };
            e.tab = tabs[next];
            e.tab
        })
    }

    // === Data access ===

    pub fn entries(&self) -> &VecDeque<ConsoleEntry> {
        &self.entries
    }

    /// Entries passing the current filter, oldest first
    pub fn visible(&self) -> impl Iterator<Item = &ConsoleEntry> {
        self.entries.iter().filter(|e| self.filter.matches(&e.entry))
    }

    pub fn filtered_count(&self) -> usize {
        self.filtered_cache
    }

    /// ERROR and FATAL entries held, regardless of filter
    pub fn error_count(&self) -> usize {
        self.entries.iter().filter(|e| e.entry.level.is_severe()).count()
    }
}
