//! End-to-end runs of the completion loop against scripted `gh` and `git`.

use anokye::classify::Classifier;
use anokye::completion::{
    Completion, CompletionOptions, Outcome, PullRequestThreads, StdinOperator, TimerOperator,
};
use anokye::git::Git;
use anokye::github::graphql::GhTransport;
use anokye::github::{GraphqlClient, RetryPolicy, ThreadsApi};
use anokye::testing::ScriptedRunner;
use std::rc::Rc;
use std::time::Duration;

fn threads_page(nodes: &[(&str, &str)]) -> String {
    let nodes: Vec<String> = nodes
        .iter()
        .map(|(id, body)| {
            serde_json::json!({
                "id": id,
                "isResolved": false,
                "isOutdated": false,
                "path": "src/lib.rs",
                "line": 10,
                "comments": {"nodes": [{
                    "id": format!("c-{id}"),
                    "body": body,
                    "url": "",
                    "author": {"login": "reviewer"}
                }]}
            })
            .to_string()
        })
        .collect();
    format!(
        r#"{{"data":{{"repository":{{"pullRequest":{{"reviewThreads":{{"pageInfo":{{"hasNextPage":false,"endCursor":null}},"nodes":[{}]}}}}}}}}}}"#,
        nodes.join(",")
    )
}

const REPLY_OK: &str =
    r#"{"data":{"addPullRequestReviewThreadReply":{"comment":{"id":"C1","url":"https://x/c1"}}}}"#;

fn resolve_ok(id: &str) -> String {
    format!(r#"{{"data":{{"resolveReviewThread":{{"thread":{{"id":"{id}","isResolved":true}}}}}}}}"#)
}

fn client(gh: &Rc<ScriptedRunner>) -> GraphqlClient {
    GraphqlClient::new(Box::new(GhTransport::new(gh.clone())), RetryPolicy::default())
        .with_sleeper(|_| {})
}

fn options(max_iterations: u32) -> CompletionOptions {
    CompletionOptions {
        max_iterations,
        wait: Duration::from_secs(30),
        reply_template: "Addressed in {short_sha}.".to_string(),
        ..Default::default()
    }
}

#[test]
fn test_full_cycle_until_clean() {
    let gh = Rc::new(ScriptedRunner::new());
    gh.push_ok(threads_page(&[
        ("T1", "This breaks on empty input"),
        ("T2", "Nice work here"),
    ]))
    .push_ok(REPLY_OK)
    .push_ok(resolve_ok("T1"))
    .push_ok(threads_page(&[]));

    let git = ScriptedRunner::new();
    git.push_ok(" M src/lib.rs\n")
        .push_ok("")
        .push_ok("[feature 1a2b3c4] Address review feedback\n")
        .push_ok("1a2b3c4d5e6f\n")
        .push_ok("feature\n")
        .push_ok("");

    let client = client(&gh);
    let source = PullRequestThreads::new(ThreadsApi::new(&client, "acme", "widgets"), 42);
    let workspace = Git::new(&git);
    let mut operator = TimerOperator::new(Duration::from_secs(60)).with_sleeper(|_| {});
    let classifier = Classifier::default();
    let waits = std::cell::Cell::new(0);

    let report = Completion::new(&classifier, options(5))
        .with_sleeper(|_| waits.set(waits.get() + 1))
        .run(&source, &workspace, &mut operator)
        .unwrap();

    // The praise thread stays open after the first round, so a second
    // fetch happens; the reviewer has resolved it by then.
    assert_eq!(report.outcome, Outcome::Completed);
    assert_eq!(report.iterations, 2);
    assert_eq!(report.commits, 1);
    assert_eq!(report.replied, 1);
    assert_eq!(report.resolved, 1);
    assert_eq!(waits.get(), 1);

    let gh_calls = gh.calls();
    assert_eq!(gh_calls.len(), 4);
    assert!(gh_calls[1]
        .args
        .contains(&"body=Addressed in 1a2b3c4.".to_string()));
    assert!(gh_calls[2].args.contains(&"threadId=T1".to_string()));

    let git_lines: Vec<String> = git.calls().iter().map(|c| c.command_line()).collect();
    assert_eq!(
        git_lines,
        vec![
            "git status --porcelain",
            "git add --all",
            "git commit -m Address review feedback",
            "git rev-parse HEAD",
            "git rev-parse --abbrev-ref HEAD",
            "git push origin feature",
        ]
    );
}

#[test]
fn test_iteration_limit_with_remaining_threads() {
    let gh = Rc::new(ScriptedRunner::new());
    gh.push_ok(threads_page(&[("T1", "Why not a constant?")]))
        .push_ok(threads_page(&[("T1", "Why not a constant?")]));

    let git = ScriptedRunner::new();
    git.push_ok("").push_ok("");

    let client = client(&gh);
    let source = PullRequestThreads::new(ThreadsApi::new(&client, "acme", "widgets"), 42);
    let workspace = Git::new(&git);
    let mut operator = TimerOperator::new(Duration::ZERO).with_sleeper(|_| {});
    let classifier = Classifier::default();

    let report = Completion::new(&classifier, options(2))
        .with_sleeper(|_| {})
        .run(&source, &workspace, &mut operator)
        .unwrap();

    assert_eq!(report.outcome, Outcome::IterationLimit);
    assert_eq!(report.iterations, 2);
    assert_eq!(report.remaining, 1);
    assert_eq!(report.commits, 0);
    assert_eq!(gh.remaining(), 0);
}

#[test]
fn test_interactive_abort() {
    let gh = Rc::new(ScriptedRunner::new());
    gh.push_ok(threads_page(&[("T1", "must validate input")]));
    let git = ScriptedRunner::new();

    let client = client(&gh);
    let source = PullRequestThreads::new(ThreadsApi::new(&client, "acme", "widgets"), 42);
    let workspace = Git::new(&git);
    let mut out = Vec::new();
    let mut operator = StdinOperator::new("q\n".as_bytes(), &mut out);
    let classifier = Classifier::default();

    let report = Completion::new(&classifier, options(3))
        .run(&source, &workspace, &mut operator)
        .unwrap();

    assert_eq!(report.outcome, Outcome::Aborted);
    assert_eq!(git.call_count(), 0);
    let prompt = String::from_utf8(out).unwrap();
    assert!(prompt.contains("1 unresolved thread(s), 1 actionable"));
}

#[test]
fn test_transient_gh_failure_is_retried() {
    let gh = Rc::new(ScriptedRunner::new());
    gh.push_failure(1, "HTTP 502: Bad Gateway")
        .push_ok(threads_page(&[]));
    let git = ScriptedRunner::new();

    let client = client(&gh);
    let source = PullRequestThreads::new(ThreadsApi::new(&client, "acme", "widgets"), 42);
    let workspace = Git::new(&git);
    let mut operator = TimerOperator::new(Duration::ZERO).with_sleeper(|_| {});
    let classifier = Classifier::default();

    let report = Completion::new(&classifier, options(3))
        .run(&source, &workspace, &mut operator)
        .unwrap();

    assert_eq!(report.outcome, Outcome::Completed);
    assert_eq!(gh.call_count(), 2);
}
