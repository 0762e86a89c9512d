use serde::{Deserialize, Serialize};

use loandesk_loans::{LoanStatus, LoanView};

use crate::search_matches;

/// Tabs on the loans page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusTab {
    #[default]
    All,
    Active,
    Returned,
    Overdue,
}

impl StatusTab {
    pub fn admits(&self, status: LoanStatus) -> bool {
        match self {
            StatusTab::All => true,
            StatusTab::Active => status == LoanStatus::Active,
            StatusTab::Returned => status == LoanStatus::Returned,
            StatusTab::Overdue => status == LoanStatus::Overdue,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanFilter {
    #[serde(default)]
    pub status_tab: StatusTab,
    #[serde(default)]
    pub search: String,
}

impl LoanFilter {
    pub fn tab(status_tab: StatusTab) -> Self {
        Self {
            status_tab,
            search: String::new(),
        }
    }

    pub fn search(mut self, query: impl Into<String>) -> Self {
        self.search = query.into();
        self
    }

    /// Search covers item name and barcode, requester name and national id,
    /// and the loan id.
    pub fn matches(&self, view: &LoanView) -> bool {
        if !self.status_tab.admits(view.status) {
            return false;
        }
        let requester = view.loan.requester();
        let loan_id = view.loan.id_typed().to_string();
        search_matches(
            &self.search,
            [
                view.item_name.as_str(),
                view.item_barcode.as_str(),
                requester.full_name.as_str(),
                requester.national_id.as_str(),
                loan_id.as_str(),
            ],
        )
    }
}

pub fn filter_loans(views: &[LoanView], filter: &LoanFilter) -> Vec<LoanView> {
    views.iter().filter(|view| filter.matches(view)).cloned().collect()
}

/// Sort options on the loans page. Name sorts go by item name.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoanSort {
    #[default]
    NewestFirst,
    OldestFirst,
    NameAsc,
    NameDesc,
}

/// Stable: ties keep their incoming order.
pub fn sort_loans(views: &mut [LoanView], sort: LoanSort) {
    match sort {
        LoanSort::NewestFirst => views.sort_by(|a, b| b.loan.requested_at().cmp(&a.loan.requested_at())),
        LoanSort::OldestFirst => views.sort_by_key(|view| view.loan.requested_at()),
        LoanSort::NameAsc => views.sort_by_cached_key(|view| view.item_name.to_lowercase()),
        LoanSort::NameDesc => {
            views.sort_by(|a, b| b.item_name.to_lowercase().cmp(&a.item_name.to_lowercase()))
        }
    }
}
