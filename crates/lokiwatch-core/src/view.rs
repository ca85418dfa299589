// ── View state ──
//
// Per-view pagination, filter and sort state. The store is the single
// source of truth for what each list view should be showing; fetches read
// a snapshot of it and never write back.

use dashmap::DashMap;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

use crate::config::PageSizes;

/// The paginated list views.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumIter, EnumString,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum ViewKind {
    Alerts,
    Signatures,
    Devices,
}

/// What is currently on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Screen {
    Dashboard,
    Alerts,
    Signatures,
    Devices,
}

impl Screen {
    /// The list view shown on this screen, if any.
    pub fn view(self) -> Option<ViewKind> {
        match self {
            Self::Dashboard => None,
            Self::Alerts => Some(ViewKind::Alerts),
            Self::Signatures => Some(ViewKind::Signatures),
            Self::Devices => Some(ViewKind::Devices),
        }
    }
}

impl From<ViewKind> for Screen {
    fn from(view: ViewKind) -> Self {
        match view {
            ViewKind::Alerts => Self::Alerts,
            ViewKind::Signatures => Self::Signatures,
            ViewKind::Devices => Self::Devices,
        }
    }
}

// ── ViewState ────────────────────────────────────────────────────────

/// Pagination and filter context for one view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewState {
    /// 1-based page number.
    pub page: u32,
    pub page_size: u32,
    /// Filter key → value, in the order they were first set.
    pub filters: IndexMap<String, String>,
    pub sort: Option<String>,
}

impl ViewState {
    pub fn new(page_size: u32) -> Self {
        Self {
            page: 1,
            page_size: page_size.max(1),
            filters: IndexMap::new(),
            sort: None,
        }
    }

    pub fn filter(&self, key: &str) -> Option<&str> {
        self.filters.get(key).map(String::as_str)
    }

    /// Query parameters for a list request.
    ///
    /// `page` and `page_size` first, then `sort` if set, then every
    /// non-empty filter in insertion order.
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = vec![
            ("page".to_owned(), self.page.to_string()),
            ("page_size".to_owned(), self.page_size.to_string()),
        ];
        if let Some(sort) = self.sort.as_ref().filter(|s| !s.is_empty()) {
            pairs.push(("sort".to_owned(), sort.clone()));
        }
        pairs.extend(
            self.filters
                .iter()
                .filter(|(_, v)| !v.is_empty())
                .map(|(k, v)| (k.clone(), v.clone())),
        );
        pairs
    }
}

// ── ViewStateStore ───────────────────────────────────────────────────

/// Concurrent per-view state.
///
/// Every mutator returns the resulting state so callers can fetch with
/// exactly the snapshot they produced.
#[derive(Debug)]
pub struct ViewStateStore {
    states: DashMap<ViewKind, ViewState>,
    defaults: PageSizes,
}

impl ViewStateStore {
    pub fn new(defaults: PageSizes) -> Self {
        Self {
            states: DashMap::new(),
            defaults,
        }
    }

    /// Current state of `view` (defaults if never touched).
    pub fn state(&self, view: ViewKind) -> ViewState {
        self.states
            .get(&view)
            .map_or_else(|| ViewState::new(self.defaults.for_view(view)), |s| s.clone())
    }

    fn update(&self, view: ViewKind, f: impl FnOnce(&mut ViewState)) -> ViewState {
        let mut entry = self
            .states
            .entry(view)
            .or_insert_with(|| ViewState::new(self.defaults.for_view(view)));
        f(&mut entry);
        entry.clone()
    }

    /// Move to `page` (clamped to at least 1). Filters are untouched.
    pub fn set_page(&self, view: ViewKind, page: u32) -> ViewState {
        self.update(view, |s| s.page = page.max(1))
    }

    /// Set one filter and go back to page 1. An empty value clears the key.
    pub fn set_filter(&self, view: ViewKind, key: &str, value: &str) -> ViewState {
        self.update(view, |s| {
            let value = value.trim();
            if value.is_empty() {
                s.filters.shift_remove(key);
            } else {
                s.filters.insert(key.to_owned(), value.to_owned());
            }
            s.page = 1;
        })
    }

    pub fn clear_filters(&self, view: ViewKind) -> ViewState {
        self.update(view, |s| {
            s.filters.clear();
            s.page = 1;
        })
    }

    /// Change the page size (clamped to at least 1) and go back to page 1.
    pub fn set_page_size(&self, view: ViewKind, page_size: u32) -> ViewState {
        self.update(view, |s| {
            s.page_size = page_size.max(1);
            s.page = 1;
        })
    }

    pub fn set_sort(&self, view: ViewKind, sort: Option<&str>) -> ViewState {
        self.update(view, |s| {
            s.sort = sort.filter(|k| !k.is_empty()).map(str::to_owned);
            s.page = 1;
        })
    }
}

impl Default for ViewStateStore {
    fn default() -> Self {
        Self::new(PageSizes::default())
    }
}
