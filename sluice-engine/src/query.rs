//! Paginated list queries
//!
//! A query runs in two steps: [`ListQueryEngine::begin`] builds the request
//! and hands out a ticket, [`ListQueryEngine::complete`] applies the response
//! for that ticket. Every query from offset zero starts a new generation;
//! responses carrying an older generation are discarded, so a slow response
//! to an earlier search can never overwrite the list of a later one.

use sluice_core::domain::pipeline::PipelineInfo;
use sluice_core::domain::status::PipelineState;
use sluice_core::dto::pipeline::{ListPipelines, PipelinePage, SortColumn, SortOrder};
use tracing::{debug, warn};

use crate::error::TransportError;

/// Filter, sort and pagination state of the list
#[derive(Debug, Clone, PartialEq)]
pub struct ListQueryState {
    pub search_term: String,
    pub selected_label: Option<String>,
    pub sort_column: SortColumn,
    pub sort_reverse: bool,
    /// Offset the next page will be requested from
    pub offset: usize,
    pub page_size: usize,
    /// Number of pipelines matching the current filter, as last reported
    pub total_count: usize,
}

impl ListQueryState {
    pub fn new(page_size: usize) -> Self {
        Self {
            search_term: String::new(),
            selected_label: None,
            sort_column: SortColumn::LastModified,
            sort_reverse: true,
            offset: 0,
            page_size,
            total_count: 0,
        }
    }
}

/// Handle for one in-flight list request
#[derive(Debug, Clone, PartialEq)]
pub struct QueryTicket {
    generation: u64,
    offset: usize,
    request: ListPipelines,
}

impl QueryTicket {
    pub fn request(&self) -> &ListPipelines {
        &self.request
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn offset(&self) -> usize {
        self.offset
    }
}

/// How a list response was applied
#[derive(Debug, Clone, PartialEq)]
pub enum QueryApplied {
    /// First page: the buffer was replaced; statuses must replace the map
    Replaced { statuses: Vec<PipelineState> },
    /// Later page: the buffer was extended; statuses must be merged
    Appended { statuses: Vec<PipelineState> },
    /// Superseded by a newer query; nothing changed
    Stale,
    /// The request failed; the buffer is unchanged
    Failed { message: String },
}

/// Owns the loaded pipelines and the query that produced them
#[derive(Debug, Clone)]
pub struct ListQueryEngine {
    state: ListQueryState,
    items: Vec<PipelineInfo>,
    generation: u64,
    /// A first-page query of the current generation has not completed
    pending_reset: bool,
    fetching: bool,
    show_load_more: bool,
}

impl ListQueryEngine {
    pub fn new(page_size: usize) -> Self {
        Self {
            state: ListQueryState::new(page_size),
            items: Vec::new(),
            generation: 0,
            pending_reset: false,
            fetching: false,
            show_load_more: false,
        }
    }

    pub fn state(&self) -> &ListQueryState {
        &self.state
    }

    /// The loaded pipelines, in server order
    pub fn items(&self) -> &[PipelineInfo] {
        &self.items
    }

    pub fn visible_names(&self) -> Vec<&str> {
        self.items.iter().map(|p| p.name.as_str()).collect()
    }

    pub fn find(&self, name: &str) -> Option<&PipelineInfo> {
        self.items.iter().find(|p| p.name == name)
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_fetching(&self) -> bool {
        self.fetching
    }

    pub fn show_load_more(&self) -> bool {
        self.show_load_more
    }

    pub fn set_search_term(&mut self, term: &str) {
        self.state.search_term = term.trim().to_string();
    }

    pub fn set_label(&mut self, label: Option<String>) {
        self.state.selected_label = label;
    }

    pub fn set_sort(&mut self, column: SortColumn, reverse: bool) {
        self.state.sort_column = column;
        self.state.sort_reverse = reverse;
    }

    /// Applies a click on a column header
    ///
    /// Every click flips the direction, whichever column it lands on.
    pub fn click_sort_header(&mut self, column: SortColumn) {
        self.state.sort_column = column;
        self.state.sort_reverse = !self.state.sort_reverse;
    }

    /// Starts a query at `offset`
    ///
    /// Offset zero opens a new generation and invalidates every ticket
    /// handed out before. Until that first page lands, later pages of the
    /// same generation are refused.
    pub fn begin(&mut self, offset: usize) -> QueryTicket {
        if offset == 0 {
            self.generation += 1;
            self.pending_reset = true;
            self.state.offset = 0;
        }
        self.fetching = true;
        self.show_load_more = false;

        let request = ListPipelines {
            filter_text: self.state.search_term.clone(),
            label: self.state.selected_label.clone(),
            offset,
            len: self.state.page_size,
            order_by: self.state.sort_column,
            order: SortOrder::from_reverse(self.state.sort_reverse),
            include_status: true,
        };

        debug!(
            generation = self.generation,
            offset,
            search = %request.filter_text,
            "List query started"
        );

        QueryTicket {
            generation: self.generation,
            offset,
            request,
        }
    }

    /// Applies the response for `ticket`
    pub fn complete(
        &mut self,
        ticket: QueryTicket,
        result: Result<PipelinePage, TransportError>,
    ) -> QueryApplied {
        if ticket.generation != self.generation {
            debug!(
                ticket = ticket.generation,
                current = self.generation,
                "Discarding stale list response"
            );
            return QueryApplied::Stale;
        }

        if ticket.offset > 0 && self.pending_reset {
            debug!(
                offset = ticket.offset,
                "Discarding page requested before the first page landed"
            );
            return QueryApplied::Stale;
        }

        if ticket.offset > 0 && ticket.offset != self.items.len() {
            debug!(
                offset = ticket.offset,
                loaded = self.items.len(),
                "Discarding out-of-sequence page"
            );
            return QueryApplied::Stale;
        }

        self.fetching = false;
        if ticket.offset == 0 {
            self.pending_reset = false;
        }

        let page = match result {
            Ok(page) => page,
            Err(e) => {
                self.show_load_more = false;
                return QueryApplied::Failed {
                    message: e.to_string(),
                };
            }
        };

        let PipelinePage {
            items,
            statuses,
            total_count,
        } = page;

        let fetched = items.len();
        let reached = ticket.offset + fetched;
        if reached > total_count {
            warn!(
                reported = total_count,
                loaded = reached,
                "Server reported fewer pipelines than it returned"
            );
        }

        let replaced = ticket.offset == 0;
        if replaced {
            self.items = items;
        } else {
            self.items.extend(items);
        }

        self.state.offset = reached;
        self.state.total_count = total_count.max(reached);
        self.show_load_more = self.items.len() < self.state.total_count;

        if !replaced && fetched == 0 && self.show_load_more {
            warn!(
                loaded = self.items.len(),
                total = self.state.total_count,
                "Empty page before the reported total, no more pages"
            );
            self.show_load_more = false;
        }

        debug!(
            generation = self.generation,
            fetched,
            loaded = self.items.len(),
            total = self.state.total_count,
            "List query applied"
        );

        if replaced {
            QueryApplied::Replaced { statuses }
        } else {
            QueryApplied::Appended { statuses }
        }
    }

    /// Adds `labels` to the loaded copies of `names`
    pub fn merge_labels(&mut self, names: &[String], labels: &[String]) {
        for pipeline in self.items.iter_mut().filter(|p| names.contains(&p.name)) {
            pipeline.merge_labels(labels);
        }
    }
}
