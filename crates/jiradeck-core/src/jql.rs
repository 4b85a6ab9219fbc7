use crate::interface::FilterState;
use std::borrow::Cow;

/// Every list query is scoped to the one project this deck is bound to.
const PROJECT_SCOPE: &str = "project=test-project";

/// Maps the current filters onto a JQL string: the fixed project scope plus
/// one `AND`-joined equality predicate per active filter. Fields left at
/// "All"/false contribute nothing.
pub fn build_list_query(filter: &FilterState) -> String {
    let mut jql = String::from(PROJECT_SCOPE);

    if let Some(status) = filter.status.jql_value() {
        jql.push_str(" AND status=\"");
        jql.push_str(&escape_term(status));
        jql.push('"');
    }

    if let Some(issue_type) = filter.issue_type.jql_value() {
        jql.push_str(" AND issuetype=\"");
        jql.push_str(&escape_term(issue_type));
        jql.push('"');
    }

    if filter.assigned_to_me {
        jql.push_str(" AND assignee=currentUser()");
    }

    jql
}

/// Builds the search-as-you-type query: a contains match against summary or
/// description. Empty or whitespace-only text yields no query at all; the
/// session must not issue a request for it.
pub fn build_suggestion_query(text: &str) -> Option<String> {
    let term = text.trim();
    if term.is_empty() {
        return None;
    }

    let term = escape_term(term);
    Some(format!(
        "summary ~ \"{term}\" OR description ~ \"{term}\""
    ))
}

/// Backslash-escapes quote and backslash characters so user-entered text
/// cannot break out of its quoted JQL term.
fn escape_term(value: &str) -> Cow<'_, str> {
    if !value.contains(&['"', '\\'][..]) {
        return Cow::Borrowed(value);
    }

    let mut escaped = String::with_capacity(value.len() + 2);
    for character in value.chars() {
        if matches!(character, '"' | '\\') {
            escaped.push('\\');
        }
        escaped.push(character);
    }
    Cow::Owned(escaped)
}

#[cfg(test)]
mod tests {
    use super::{build_list_query, build_suggestion_query};
    use crate::interface::{FilterState, IssueTypeFilter, StatusFilter};

    #[test]
    fn default_filters_produce_bare_project_scope() {
        assert_eq!(
            build_list_query(&FilterState::default()),
            "project=test-project"
        );
    }

    #[test]
    fn every_active_filter_appends_exactly_one_predicate() {
        let filter = FilterState {
            status: StatusFilter::Backlog,
            issue_type: IssueTypeFilter::Bug,
            assigned_to_me: true,
            search_text: String::new(),
        };
        assert_eq!(
            build_list_query(&filter),
            "project=test-project AND status=\"Backlog\" AND issuetype=\"Bug\" AND assignee=currentUser()"
        );
    }

    #[test]
    fn single_filters_compose_independently() {
        let status_only = FilterState {
            status: StatusFilter::InProgress,
            ..FilterState::default()
        };
        assert_eq!(
            build_list_query(&status_only),
            "project=test-project AND status=\"In-Progress\""
        );

        let type_only = FilterState {
            issue_type: IssueTypeFilter::Task,
            ..FilterState::default()
        };
        assert_eq!(
            build_list_query(&type_only),
            "project=test-project AND issuetype=\"Task\""
        );

        let assigned_only = FilterState {
            assigned_to_me: true,
            ..FilterState::default()
        };
        assert_eq!(
            build_list_query(&assigned_only),
            "project=test-project AND assignee=currentUser()"
        );
    }

    #[test]
    fn suggestion_query_matches_summary_or_description() {
        assert_eq!(
            build_suggestion_query("login bug").as_deref(),
            Some("summary ~ \"login bug\" OR description ~ \"login bug\"")
        );
    }

    #[test]
    fn blank_search_text_yields_no_query() {
        assert_eq!(build_suggestion_query(""), None);
        assert_eq!(build_suggestion_query("   \t"), None);
    }

    #[test]
    fn quotes_in_search_text_are_escaped() {
        assert_eq!(
            build_suggestion_query("say \"hi\"").as_deref(),
            Some("summary ~ \"say \\\"hi\\\"\" OR description ~ \"say \\\"hi\\\"\"")
        );
        assert_eq!(
            build_suggestion_query("back\\slash").as_deref(),
            Some("summary ~ \"back\\\\slash\" OR description ~ \"back\\\\slash\"")
        );
    }
}
