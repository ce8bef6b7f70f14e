//! Pull request processing: analysis comments, AI review and description
//! normalization.
//!
//! A delivery is handled by one background task holding one [`GitHubClient`].
//! The review and description steps share that client and its token.

pub mod analysis;
pub mod description;
pub mod payload;

use metrics::counter;
use tracing::{error, info, warn};

use crate::ai::{FileDiff, ReviewGenerator, ReviewRequest};
use crate::api::metrics::PR_TASKS_TOTAL;
use crate::error::GitHubResult;
use crate::github::{CommitState, CommitStatus, GitHubClient, PullRequestFile};
use crate::AppState;

pub use analysis::{analyze_files, create_pr_comment, Analysis, ReviewOutcome};
pub use description::{format_pr_description, needs_description_formatting};
pub use payload::PullRequestEvent;

/// Commit status context used for everything this app reports.
pub const STATUS_CONTEXT: &str = "pr-processor";

/// Run every enabled step for one `pull_request` delivery on a single client.
///
/// The review runs first. The description step still runs when the review
/// fails, unless the failure left the client without a token. The first
/// error is returned.
pub async fn process_delivery(state: &AppState, event: &PullRequestEvent) -> GitHubResult<()> {
    let review = state.config.auto_pr_review && event.should_process();
    let describe = state.config.edit_pr_desc && event.should_update_description();
    if !review && !describe {
        tracing::debug!(action = %event.action, "Nothing to do for pull_request action");
        return Ok(());
    }

    let mut client = state.github_client(event.installation_id());

    let review_result = if review {
        process_pull_request(&mut client, state.reviewer.as_deref(), event).await
    } else {
        Ok(())
    };

    if !describe {
        return review_result;
    }
    if review_result.is_err() && !client.has_token() {
        warn!("Skipping description update for PR #{}: no token", event.number());
        return review_result;
    }

    match process_pr_desc(&mut client, event).await {
        Ok(_) => review_result,
        Err(e) if review_result.is_err() => {
            error!("Description update for PR #{} failed: {}", event.number(), e);
            review_result
        }
        Err(e) => Err(e),
    }
}

/// Analyze a pull request, comment with the results and set a commit status.
///
/// On failure an `error` status is posted when the client already holds a
/// token; if authentication itself failed nothing else is attempted.
pub async fn process_pull_request(
    client: &mut GitHubClient,
    reviewer: Option<&dyn ReviewGenerator>,
    event: &PullRequestEvent,
) -> GitHubResult<()> {
    info!(
        pr_number = event.number(),
        "Processing PR #{} from {}/{}",
        event.number(),
        event.owner(),
        event.repo()
    );

    match review_pull_request(client, reviewer, event).await {
        Ok(()) => {
            counter!(PR_TASKS_TOTAL, "task" => "review", "outcome" => "success").increment(1);
            info!("Successfully processed PR #{}", event.number());
            Ok(())
        }
        Err(e) => {
            counter!(PR_TASKS_TOTAL, "task" => "review", "outcome" => "error").increment(1);
            if client.has_token() {
                let status =
                    CommitStatus::new(CommitState::Error, "Error processing PR", STATUS_CONTEXT);
                if let Err(status_err) = client
                    .create_commit_status(
                        event.owner(),
                        event.repo(),
                        &event.pull_request.head.sha,
                        &status,
                    )
                    .await
                {
                    error!("Failed to set error status: {}", status_err);
                }
            }
            Err(e)
        }
    }
}

async fn review_pull_request(
    client: &mut GitHubClient,
    reviewer: Option<&dyn ReviewGenerator>,
    event: &PullRequestEvent,
) -> GitHubResult<()> {
    let (owner, repo, number) = (event.owner(), event.repo(), event.number());

    let files = client.list_pull_request_files(owner, repo, number).await?;
    let analysis = analyze_files(&files);

    let review = match reviewer {
        Some(reviewer) => Some(request_review(reviewer, event, &files).await),
        None => None,
    };

    let comment = create_pr_comment(&analysis, review.as_ref());
    client.post_issue_comment(owner, repo, number, &comment).await?;

    let status = CommitStatus::new(CommitState::Success, "PR analysis complete", STATUS_CONTEXT);
    client
        .create_commit_status(owner, repo, &event.pull_request.head.sha, &status)
        .await
}

/// AI failures end up in the comment, they don't fail the delivery.
async fn request_review(
    reviewer: &dyn ReviewGenerator,
    event: &PullRequestEvent,
    files: &[PullRequestFile],
) -> ReviewOutcome {
    let pr = &event.pull_request;
    let request = ReviewRequest {
        title: pr.title.clone(),
        author: pr.user.login.clone(),
        base_branch: pr.base.git_ref.clone(),
        head_branch: pr.head.git_ref.clone(),
        files: files
            .iter()
            .map(|f| FileDiff {
                filename: f.filename.clone(),
                status: f.status.clone(),
                additions: f.additions,
                deletions: f.deletions,
                patch: f.patch.clone(),
            })
            .collect(),
    };

    match reviewer.review(&request).await {
        Ok(text) => ReviewOutcome::Review(text),
        Err(e) => {
            warn!(pr_number = pr.number, "AI review failed: {}", e);
            ReviewOutcome::Failed(e.to_string())
        }
    }
}

/// Rewrite the PR description to contain the required sections.
///
/// Returns whether the description was changed.
pub async fn process_pr_desc(
    client: &mut GitHubClient,
    event: &PullRequestEvent,
) -> GitHubResult<bool> {
    let number = event.number();
    let body = event.pull_request.body_or_empty();

    if !needs_description_formatting(body) {
        info!("No description update needed for PR #{}", number);
        counter!(PR_TASKS_TOTAL, "task" => "description", "outcome" => "unchanged").increment(1);
        return Ok(false);
    }

    info!(
        pr_number = number,
        "Processing PR description #{} from {}/{}",
        number,
        event.owner(),
        event.repo()
    );

    let new_body = format_pr_description(body);

    match client
        .update_pull_request_body(event.owner(), event.repo(), number, &new_body)
        .await
    {
        Ok(()) => {
            counter!(PR_TASKS_TOTAL, "task" => "description", "outcome" => "updated").increment(1);
            info!("Updated description for PR #{}", number);
            Ok(true)
        }
        Err(e) => {
            counter!(PR_TASKS_TOTAL, "task" => "description", "outcome" => "error").increment(1);
            Err(e)
        }
    }
}
