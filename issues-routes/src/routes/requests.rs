use serde::Deserialize;
use utoipa::ToSchema;

use issues_core::list_filter::IssueFilter;
use issues_core::model::{Category, IssueStatus};

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateStatusRequest {
    pub status: IssueStatus,
}

/// Optional narrowing for the admin listing. Unknown params are ignored;
/// unparseable values reject the request before it reaches the service.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct IssueListQuery {
    pub status: Option<IssueStatus>,
    pub category: Option<Category>,
    pub search: Option<String>,
}

impl IssueListQuery {
    pub fn into_filters(self) -> Vec<IssueFilter> {
        let mut filters = Vec::new();

        if let Some(status) = self.status {
            filters.push(IssueFilter::Status(status));
        }

        if let Some(category) = self.category {
            filters.push(IssueFilter::Category(category));
        }

        if let Some(search) = self.search.filter(|s| !s.trim().is_empty()) {
            filters.push(IssueFilter::Search(search));
        }

        filters
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_query_builds_no_filters() {
        assert!(IssueListQuery::default().into_filters().is_empty());
    }

    #[test]
    fn filters_keep_status_category_search_order() {
        let filters = IssueListQuery {
            status: Some(IssueStatus::Resolved),
            category: Some(Category::Water),
            search: Some("leak".into()),
        }
        .into_filters();

        assert_eq!(
            vec![
                IssueFilter::Status(IssueStatus::Resolved),
                IssueFilter::Category(Category::Water),
                IssueFilter::Search("leak".into()),
            ],
            filters
        );
    }

    #[test]
    fn blank_search_is_dropped() {
        let filters = IssueListQuery {
            status: None,
            category: None,
            search: Some("   ".into()),
        }
        .into_filters();

        assert!(filters.is_empty());
    }
}
