pub mod http;
pub mod interface;
pub mod jql;
pub mod session;

pub use http::HttpIssueTransport;
pub use interface::{
    Credentials, FilterState, IssueAssignee, IssueDetail, IssueSummary, IssueTransport,
    IssueTypeFilter, QueryError, StatusFilter,
};
pub use jql::{build_list_query, build_suggestion_query};
pub use session::{IssueSession, SessionSnapshot};
