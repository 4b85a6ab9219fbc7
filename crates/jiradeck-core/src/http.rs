use crate::interface::{Credentials, IssueAssignee, IssueDetail, IssueSummary, IssueTransport, QueryError};
use async_trait::async_trait;
use reqwest::{header, Client, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tracing::warn;

const SEARCH_PATH: &str = "rest/api/3/search";
const DETAIL_PATH: &str = "rest/api/2/issue";
const LIST_FIELDS: &str = "id,key,name,summary,status,issuetype";
const REQUEST_TIMEOUT_SECS: u64 = 20;
const ERROR_BODY_SNIPPET_LEN: usize = 200;

/// Reqwest-backed `IssueTransport` speaking the Jira Cloud REST API. One
/// GET per operation, HTTP Basic auth, no retries.
#[derive(Clone)]
pub struct HttpIssueTransport {
    client: Client,
}

impl HttpIssueTransport {
    pub fn new() -> Result<Self, QueryError> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("application/json"),
        );
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );

        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .default_headers(headers)
            .build()
            .map_err(|error| QueryError::Network(format!("failed to build HTTP client: {error}")))?;

        Ok(Self { client })
    }

    /// Derives the site base URL from the project name. Incomplete
    /// credentials or a project name that is not a valid host label
    /// short-circuit before any network activity.
    fn base_url(credentials: &Credentials) -> Result<Url, QueryError> {
        if !credentials.is_complete() {
            return Err(QueryError::InvalidConfiguration);
        }

        let raw = format!("https://{}.atlassian.net/", credentials.project_name.trim());
        Url::parse(&raw).map_err(|_| QueryError::InvalidConfiguration)
    }

    fn endpoint(credentials: &Credentials, path: &str) -> Result<Url, QueryError> {
        Self::base_url(credentials)?
            .join(path)
            .map_err(|_| QueryError::InvalidConfiguration)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        credentials: &Credentials,
        url: Url,
        query: &[(&str, &str)],
    ) -> Result<T, QueryError> {
        let mut request = self
            .client
            .get(url)
            .basic_auth(&credentials.user_name, Some(&credentials.api_key));
        if !query.is_empty() {
            request = request.query(query);
        }

        let response = request
            .send()
            .await
            .map_err(|error| QueryError::Network(format!("request failed: {error}")))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            warn!(%status, "jira rejected request credentials");
            return Err(QueryError::Auth);
        }

        let body = response
            .text()
            .await
            .map_err(|error| QueryError::Network(format!("response read failed: {error}")))?;

        if !status.is_success() {
            return Err(QueryError::Network(format!(
                "status {status}: {}",
                body_snippet(&body)
            )));
        }

        serde_json::from_str(&body).map_err(|error| QueryError::Decode(error.to_string()))
    }
}

#[async_trait]
impl IssueTransport for HttpIssueTransport {
    async fn fetch_issue_list(
        &self,
        credentials: &Credentials,
        jql: &str,
    ) -> Result<Vec<IssueSummary>, QueryError> {
        let url = Self::endpoint(credentials, SEARCH_PATH)?;
        let response: WireSearchResponse = self
            .get_json(credentials, url, &[("fields", LIST_FIELDS), ("jql", jql)])
            .await?;
        Ok(response.issues.into_iter().map(IssueSummary::from).collect())
    }

    async fn fetch_suggestions(
        &self,
        credentials: &Credentials,
        jql: &str,
    ) -> Result<Vec<IssueSummary>, QueryError> {
        let url = Self::endpoint(credentials, SEARCH_PATH)?;
        let response: WireSearchResponse =
            self.get_json(credentials, url, &[("jql", jql)]).await?;
        Ok(response.issues.into_iter().map(IssueSummary::from).collect())
    }

    async fn fetch_issue_detail(
        &self,
        credentials: &Credentials,
        key: &str,
    ) -> Result<IssueDetail, QueryError> {
        let url = Self::endpoint(credentials, &format!("{DETAIL_PATH}/{key}"))?;
        let response: WireDetailResponse = self.get_json(credentials, url, &[]).await?;
        Ok(detail_from_wire(key, response.fields))
    }
}

fn body_snippet(body: &str) -> &str {
    if body.len() <= ERROR_BODY_SNIPPET_LEN {
        return body;
    }
    let mut end = ERROR_BODY_SNIPPET_LEN;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    &body[..end]
}

#[derive(Debug, Deserialize)]
struct WireSearchResponse {
    #[serde(default)]
    issues: Vec<WireIssue>,
}

#[derive(Debug, Deserialize)]
struct WireIssue {
    id: String,
    key: String,
    fields: WireListFields,
}

#[derive(Debug, Deserialize)]
struct WireListFields {
    summary: String,
    status: WireNamed,
    issuetype: WireNamed,
}

#[derive(Debug, Deserialize)]
struct WireNamed {
    name: String,
}

#[derive(Debug, Deserialize)]
struct WireDetailResponse {
    fields: WireDetailFields,
}

#[derive(Debug, Deserialize)]
struct WireDetailFields {
    issuetype: WireNamed,
    summary: String,
    description: Option<String>,
    creator: WireCreator,
    duedate: Option<String>,
    status: WireNamed,
    priority: WireNamed,
    assignee: Option<WireAssignee>,
}

#[derive(Debug, Deserialize)]
struct WireCreator {
    #[serde(rename = "displayName")]
    display_name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireAssignee {
    display_name: String,
    email_address: String,
}

impl From<WireIssue> for IssueSummary {
    fn from(wire: WireIssue) -> Self {
        Self {
            id: wire.id,
            key: wire.key,
            summary: wire.fields.summary,
            status: wire.fields.status.name,
            issue_type: wire.fields.issuetype.name,
        }
    }
}

/// The detail endpoint is queried per key and only `fields` is decoded, so
/// both id and key carry the requested key.
fn detail_from_wire(key: &str, fields: WireDetailFields) -> IssueDetail {
    IssueDetail {
        id: key.to_owned(),
        key: key.to_owned(),
        issue_type: fields.issuetype.name,
        summary: fields.summary,
        description: fields.description,
        creator: fields.creator.display_name,
        due_date: fields.duedate,
        status: fields.status.name,
        priority: fields.priority.name,
        assignee: fields.assignee.map(|assignee| IssueAssignee {
            display_name: assignee.display_name,
            email: assignee.email_address,
        }),
    }
}
