//! [`GitHubApi`] over the GitHub REST API.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use tokio::sync::OnceCell;

use super::{next_cursor, GitHubApi, GitHubError};
use crate::models::{
    norm_login, IssueComment, MembersPage, PullRequestStatus, ReviewState, TeamRef, User,
};

const PER_PAGE: u32 = 100;
const API_VERSION: &str = "2022-11-28";
const USER_AGENT: &str = concat!("teams-sync/", env!("CARGO_PKG_VERSION"));

/// GitHub REST client. Mutating calls are only logged in dry-run mode.
pub struct GitHubClient {
    http: reqwest::Client,
    api_url: String,
    token: Option<String>,
    dry_run: bool,
    bot_name: OnceCell<String>,
}

#[derive(Debug, Deserialize)]
struct Membership {
    state: String,
}

#[derive(Debug, Deserialize)]
struct PullRequestHead {
    sha: String,
}

#[derive(Debug, Deserialize)]
struct PullRequestResource {
    state: String,
    head: PullRequestHead,
}

#[derive(Debug, Deserialize)]
struct ReviewResource {
    #[serde(default)]
    user: Option<User>,
    state: String,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

impl GitHubClient {
    pub fn new(
        api_url: &str,
        token: Option<String>,
        timeout: Duration,
        dry_run: bool,
    ) -> Result<Self, GitHubError> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|source| GitHubError::Transport {
                path: api_url.to_string(),
                source,
            })?;

        Ok(Self {
            http,
            api_url: api_url.trim_end_matches('/').to_string(),
            token,
            dry_run,
            bot_name: OnceCell::new(),
        })
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self
            .http
            .request(method, format!("{}{}", self.api_url, path))
            .header(header::ACCEPT, "application/vnd.github+json")
            .header("X-GitHub-Api-Version", API_VERSION);

        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Send a request and turn non-2xx responses into [`GitHubError::Status`].
    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<serde_json::Value>,
    ) -> Result<Response, GitHubError> {
        let mut builder = self.request(method.clone(), path);
        if let Some(body) = body {
            builder = builder.json(&body);
        }

        let response = builder
            .send()
            .await
            .map_err(|source| GitHubError::Transport {
                path: path.to_string(),
                source,
            })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let text = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&text)
            .map(|b| b.message)
            .unwrap_or(text);

        Err(GitHubError::Status {
            method: method.to_string(),
            path: path.to_string(),
            status: status.as_u16(),
            message,
        })
    }

    async fn decode<T: DeserializeOwned>(path: &str, response: Response) -> Result<T, GitHubError> {
        response.json().await.map_err(|e| GitHubError::Decode {
            path: path.to_string(),
            message: e.to_string(),
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, GitHubError> {
        let response = self.send(Method::GET, path, None).await?;
        Self::decode(path, response).await
    }

    /// GET that maps 404 to `None`.
    async fn get_optional<T: DeserializeOwned>(&self, path: &str) -> Result<Option<T>, GitHubError> {
        match self.send(Method::GET, path, None).await {
            Ok(response) => Self::decode(path, response).await.map(Some),
            Err(GitHubError::Status { status, .. }) if status == StatusCode::NOT_FOUND.as_u16() => {
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Fetch one page of a list endpoint and the number of the next page.
    async fn get_page<T: DeserializeOwned>(
        &self,
        path: &str,
        page: u32,
    ) -> Result<(Vec<T>, Option<u32>), GitHubError> {
        let separator = if path.contains('?') { '&' } else { '?' };
        let paged = format!("{}{}per_page={}&page={}", path, separator, PER_PAGE, page);

        let response = self.send(Method::GET, &paged, None).await?;
        let next = response
            .headers()
            .get(header::LINK)
            .and_then(|v| v.to_str().ok())
            .and_then(next_page);
        let items = Self::decode(&paged, response).await?;
        Ok((items, next))
    }

    /// Follow `Link` headers until the last page.
    async fn get_all<T: DeserializeOwned>(&self, path: &str) -> Result<Vec<T>, GitHubError> {
        let mut all = Vec::new();
        let mut page = Some(1);
        while let Some(current) = page {
            let (items, next) = self.get_page(path, current).await?;
            all.extend(items);
            page = next_cursor(path, current, next)?;
        }
        Ok(all)
    }
}

#[async_trait]
impl GitHubApi for GitHubClient {
    async fn bot_name(&self) -> Result<String, GitHubError> {
        self.bot_name
            .get_or_try_init(|| async {
                let user: User = self.get_json("/user").await?;
                tracing::info!("Acting as GitHub user {}", user.login);
                Ok::<_, GitHubError>(user.login)
            })
            .await
            .cloned()
    }

    async fn team_by_slug(&self, org: &str, slug: &str) -> Result<Option<TeamRef>, GitHubError> {
        self.get_optional(&format!("/orgs/{}/teams/{}", org, slug))
            .await
    }

    async fn team_members_page(
        &self,
        team: &TeamRef,
        page: u32,
    ) -> Result<MembersPage, GitHubError> {
        let (users, next): (Vec<User>, _) = self
            .get_page(&format!("/teams/{}/members", team.id), page)
            .await?;
        Ok(MembersPage {
            logins: users.into_iter().map(|u| u.login).collect(),
            next,
        })
    }

    async fn is_team_member(
        &self,
        org: &str,
        team: &TeamRef,
        login: &str,
    ) -> Result<bool, GitHubError> {
        let membership: Option<Membership> = self
            .get_optional(&format!(
                "/orgs/{}/teams/{}/memberships/{}",
                org, team.slug, login
            ))
            .await?;
        Ok(membership.is_some_and(|m| m.state == "active" || m.state == "pending"))
    }

    async fn upsert_team_membership(
        &self,
        team: &TeamRef,
        login: &str,
        maintainer: bool,
    ) -> Result<(), GitHubError> {
        let role = if maintainer { "maintainer" } else { "member" };
        if self.dry_run {
            tracing::info!("dry run: would add {} to team {} as {}", login, team.slug, role);
            return Ok(());
        }

        self.send(
            Method::PUT,
            &format!("/teams/{}/memberships/{}", team.id, login),
            Some(json!({ "role": role })),
        )
        .await?;
        Ok(())
    }

    async fn create_comment(
        &self,
        org: &str,
        repo: &str,
        number: u64,
        body: &str,
    ) -> Result<(), GitHubError> {
        if self.dry_run {
            tracing::info!("dry run: would comment on {}/{}#{}: {}", org, repo, number, body);
            return Ok(());
        }

        self.send(
            Method::POST,
            &format!("/repos/{}/{}/issues/{}/comments", org, repo, number),
            Some(json!({ "body": body })),
        )
        .await?;
        Ok(())
    }

    async fn list_comments(
        &self,
        org: &str,
        repo: &str,
        number: u64,
    ) -> Result<Vec<IssueComment>, GitHubError> {
        self.get_all(&format!("/repos/{}/{}/issues/{}/comments", org, repo, number))
            .await
    }

    async fn delete_comment(&self, org: &str, repo: &str, id: u64) -> Result<(), GitHubError> {
        if self.dry_run {
            tracing::info!("dry run: would delete comment {} on {}/{}", id, org, repo);
            return Ok(());
        }

        self.send(
            Method::DELETE,
            &format!("/repos/{}/{}/issues/comments/{}", org, repo, id),
            None,
        )
        .await?;
        Ok(())
    }

    async fn pull_request(
        &self,
        org: &str,
        repo: &str,
        number: u64,
    ) -> Result<PullRequestStatus, GitHubError> {
        let path = format!("/repos/{}/{}/pulls/{}", org, repo, number);
        let pr: PullRequestResource = self.get_json(&path).await?;

        let approval = if pr.state == "closed" {
            ReviewState::Dismissed
        } else {
            let reviews: Vec<ReviewResource> = self.get_all(&format!("{}/reviews", path)).await?;
            aggregate_approval(reviews.iter().filter_map(|r| {
                let login = r.user.as_ref()?.login.as_str();
                let state = r.state.parse::<ReviewState>().ok()?;
                Some((login, state))
            }))
        };

        Ok(PullRequestStatus {
            head_sha: pr.head.sha,
            approval,
        })
    }
}

/// Combine reviews (oldest first) into one approval state.
///
/// Each reviewer's latest APPROVED, CHANGES_REQUESTED or DISMISSED review counts;
/// comments and pending drafts never replace it.
fn aggregate_approval<'a>(reviews: impl IntoIterator<Item = (&'a str, ReviewState)>) -> ReviewState {
    let mut latest: HashMap<String, ReviewState> = HashMap::new();
    for (login, state) in reviews {
        match state {
            ReviewState::Approved | ReviewState::ChangesRequested | ReviewState::Dismissed => {
                latest.insert(norm_login(login), state);
            }
            ReviewState::Commented | ReviewState::Pending => {}
        }
    }

    if latest.values().any(|s| *s == ReviewState::ChangesRequested) {
        ReviewState::ChangesRequested
    } else if latest.values().any(|s| s.is_approved()) {
        ReviewState::Approved
    } else {
        ReviewState::Pending
    }
}

/// Extract the `page` query parameter of the `rel="next"` link.
fn next_page(link: &str) -> Option<u32> {
    link.split(',').find_map(|part| {
        let (url, params) = part.split_once(';')?;
        if !params.split(';').any(|p| p.trim() == r#"rel="next""#) {
            return None;
        }
        let url = url.trim().trim_start_matches('<').trim_end_matches('>');
        let (_, query) = url.split_once('?')?;
        query
            .split('&')
            .filter_map(|kv| kv.split_once('='))
            .find(|(k, _)| *k == "page")
            .and_then(|(_, v)| v.parse().ok())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_page_from_link_header() {
        let link = r#"<https://api.github.com/teams/1/members?per_page=100&page=3>; rel="next", <https://api.github.com/teams/1/members?per_page=100&page=5>; rel="last""#;
        assert_eq!(next_page(link), Some(3));
    }

    #[test]
    fn test_no_next_on_last_page() {
        let link = r#"<https://api.github.com/teams/1/members?per_page=100&page=1>; rel="first", <https://api.github.com/teams/1/members?per_page=100&page=4>; rel="prev""#;
        assert_eq!(next_page(link), None);
        assert_eq!(next_page(""), None);
    }

    #[test]
    fn test_single_approval_approves() {
        let state = aggregate_approval([
            ("amy", ReviewState::Commented),
            ("bo", ReviewState::Approved),
        ]);
        assert_eq!(state, ReviewState::Approved);
    }

    #[test]
    fn test_changes_requested_blocks_approval() {
        let state = aggregate_approval([
            ("amy", ReviewState::Approved),
            ("bo", ReviewState::ChangesRequested),
        ]);
        assert_eq!(state, ReviewState::ChangesRequested);
    }

    #[test]
    fn test_latest_decisive_review_wins() {
        let state = aggregate_approval([
            ("bo", ReviewState::ChangesRequested),
            ("Bo", ReviewState::Approved),
            ("bo", ReviewState::Commented),
        ]);
        assert_eq!(state, ReviewState::Approved);

        let state = aggregate_approval([("amy", ReviewState::Approved), ("amy", ReviewState::Dismissed)]);
        assert_eq!(state, ReviewState::Pending);
    }

    #[test]
    fn test_no_reviews_is_pending() {
        assert_eq!(
            aggregate_approval(Vec::<(&str, ReviewState)>::new()),
            ReviewState::Pending
        );
    }
}
