//! Read-through cache of taxonomy options and the filtered item list.
//!
//! Both halves are replaced wholesale on every refresh, never patched.
//! A failed fetch degrades to an empty value and is reported, so the
//! caller can keep rendering. Only an unreachable store is reported as a
//! network failure.

use std::sync::Arc;

use tracing::{debug, warn};

use super::workflow::WorkflowError;
use crate::adapters::ItemService;
use crate::auth::Identity;
use crate::domain::{ContentItem, ExportFilter, ItemFilter, TaxonomyOptions};

/// What happened during a refresh
#[derive(Debug, Default)]
pub struct RefreshReport {
    /// Set when the options fetch failed and options were emptied
    pub options_error: Option<WorkflowError>,
    /// Set when the list fetch failed and items were emptied
    pub items_error: Option<WorkflowError>,
}

impl RefreshReport {
    pub fn is_clean(&self) -> bool {
        self.options_error.is_none() && self.items_error.is_none()
    }
}

/// Headline numbers for the dashboard
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoardStats {
    pub submissions: usize,
    pub verticals: usize,
}

/// Options and items as last fetched
pub struct Board {
    service: Arc<dyn ItemService>,
    identity: Identity,
    filter: ItemFilter,
    options: TaxonomyOptions,
    items: Vec<ContentItem>,
}

impl Board {
    pub fn new(service: Arc<dyn ItemService>, identity: Identity) -> Self {
        Self {
            service,
            identity,
            filter: ItemFilter::default(),
            options: TaxonomyOptions::default(),
            items: Vec::new(),
        }
    }

    /// Start from `filter` instead of the unfiltered view
    pub fn with_filter(mut self, filter: ItemFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn options(&self) -> &TaxonomyOptions {
        &self.options
    }

    pub fn items(&self) -> &[ContentItem] {
        &self.items
    }

    pub fn filter(&self) -> &ItemFilter {
        &self.filter
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn export_filter(&self) -> ExportFilter {
        self.filter.export_filter()
    }

    pub fn stats(&self) -> BoardStats {
        BoardStats {
            submissions: self.items.len(),
            verticals: self.options.verticals.len(),
        }
    }

    /// Refetch options and items concurrently
    pub async fn refresh(&mut self) -> RefreshReport {
        let (options, items) = tokio::join!(
            self.service.fetch_options(&self.identity),
            self.service.list_items(&self.identity, &self.filter),
        );

        let mut report = RefreshReport::default();

        match options {
            Ok(options) => self.options = options,
            Err(e) => {
                warn!(error = %e, "failed to load options");
                self.options = TaxonomyOptions::default();
                report.options_error = Some(WorkflowError::from_fetch(e));
            }
        }

        match items {
            Ok(items) => self.items = items,
            Err(e) => {
                warn!(error = %e, "failed to load items");
                self.items.clear();
                report.items_error = Some(WorkflowError::from_fetch(e));
            }
        }

        debug!(
            items = self.items.len(),
            verticals = self.options.verticals.len(),
            "board refreshed"
        );
        report
    }

    /// Refetch only the item list (after a filter change)
    pub async fn reload_items(&mut self) -> Option<WorkflowError> {
        match self.service.list_items(&self.identity, &self.filter).await {
            Ok(items) => {
                self.items = items;
                None
            }
            Err(e) => {
                warn!(error = %e, "failed to load items");
                self.items.clear();
                Some(WorkflowError::from_fetch(e))
            }
        }
    }

    /// Replace the filter and refetch the list
    pub async fn set_filter(&mut self, filter: ItemFilter) -> Option<WorkflowError> {
        self.filter = filter;
        self.reload_items().await
    }
}
