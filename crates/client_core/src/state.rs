//! Single-owner UI state.
//!
//! All mutations go through named operations and are total: a failed refresh
//! never clears the prior collections. The active view tracks the most recent
//! data-producing mutation, so whichever call runs last in a command cycle
//! decides what the UI shows.

use shared::domain::{ActiveView, Language, SearchResult, ShoppingItem};

pub const READY_STATUS: &str = "Press the mic and speak your command...";

#[derive(Debug, Clone, PartialEq)]
pub struct UiSnapshot {
    pub status: String,
    pub active_view: ActiveView,
    pub language: Language,
    pub listening: bool,
    pub shopping_list: Vec<ShoppingItem>,
    pub suggestions: Vec<String>,
    pub search_results: Vec<SearchResult>,
}

pub struct StateStore {
    ui: UiSnapshot,
}

impl StateStore {
    pub fn new(language: Language) -> Self {
        Self {
            ui: UiSnapshot {
                status: READY_STATUS.to_string(),
                active_view: ActiveView::List,
                language,
                listening: false,
                shopping_list: Vec::new(),
                suggestions: Vec::new(),
                search_results: Vec::new(),
            },
        }
    }

    pub fn snapshot(&self) -> UiSnapshot {
        self.ui.clone()
    }

    pub fn language(&self) -> Language {
        self.ui.language
    }

    pub fn active_view(&self) -> ActiveView {
        self.ui.active_view
    }

    pub fn set_status(&mut self, status: impl Into<String>) {
        self.ui.status = status.into();
    }

    pub fn set_listening(&mut self, listening: bool) {
        self.ui.listening = listening;
    }

    pub fn set_language(&mut self, language: Language) {
        self.ui.language = language;
    }

    pub fn focus_view(&mut self, view: ActiveView) {
        self.ui.active_view = view;
    }

    /// Wholesale replacement of the list cache; shows the list view.
    pub fn replace_list(&mut self, items: Vec<ShoppingItem>) {
        self.ui.shopping_list = items;
        self.ui.active_view = ActiveView::List;
    }

    /// Wholesale replacement of the suggestion set, never a merge. The view
    /// is left alone; callers promoting substitutes focus it explicitly.
    pub fn replace_suggestions(&mut self, labels: Vec<String>) {
        self.ui.suggestions = labels;
    }

    /// Wholesale replacement of search results; shows the search view.
    pub fn replace_search_results(&mut self, results: Vec<SearchResult>) {
        self.ui.search_results = results;
        self.ui.active_view = ActiveView::Search;
    }

    /// Empty result set: clears the table but keeps the current view.
    pub fn clear_search_results(&mut self) {
        self.ui.search_results.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::domain::ProductId;

    fn result(id: i64, name: &str) -> SearchResult {
        SearchResult {
            id: ProductId(id),
            name: name.to_string(),
            brand: "Acme".to_string(),
            price: 1.5,
        }
    }

    #[test]
    fn replace_list_focuses_list_view() {
        let mut store = StateStore::new(Language::En);
        store.replace_search_results(vec![result(1, "soap")]);
        assert_eq!(store.active_view(), ActiveView::Search);

        store.replace_list(Vec::new());
        assert_eq!(store.active_view(), ActiveView::List);
    }

    #[test]
    fn clearing_search_results_keeps_current_view() {
        let mut store = StateStore::new(Language::En);
        store.replace_search_results(vec![result(1, "soap")]);
        store.clear_search_results();
        assert_eq!(store.active_view(), ActiveView::Search);
        assert!(store.snapshot().search_results.is_empty());
    }

    #[test]
    fn suggestions_are_replaced_not_merged() {
        let mut store = StateStore::new(Language::Es);
        store.replace_suggestions(vec!["milk".into(), "eggs".into()]);
        store.replace_suggestions(vec!["bread".into()]);
        assert_eq!(store.snapshot().suggestions, vec!["bread".to_string()]);
        assert_eq!(store.active_view(), ActiveView::List);
    }
}
