/// Tag selector operations that talk to the directory or submission service
///
/// The selector lives in a `RefCell` shared with the UI. Borrows are taken
/// between awaits only, never held across one.
use std::cell::RefCell;

use futures::channel::oneshot;
use futures::future::join_all;
use log::{error, info, warn};
use url::Url;

use crate::config::FormConfig;
use crate::error::ShareError;
use crate::selector::{RefreshOutcome, RefreshTicket, SelectionPlan, TagSelector};
use crate::service::{Submission, SubmissionService, TagDirectory};
use crate::tag::Tag;

#[derive(Debug, Clone, PartialEq)]
pub enum SelectOutcome {
    /// Already selected, or nothing to commit
    Unchanged,
    Added(Tag),
    /// Created in the directory, then selected
    Created(Tag),
}

/// Selections still waiting on the directory.
///
/// Every `select` registers itself for as long as it runs, so `submit` can
/// wait for a commit started by blur before it reads the selection.
#[derive(Debug, Default)]
pub struct PendingSelections {
    waiters: RefCell<Vec<oneshot::Receiver<()>>>,
}

impl PendingSelections {
    /// The selection counts as pending until the returned sender is dropped
    fn track(&self) -> oneshot::Sender<()> {
        let (done, waiter) = oneshot::channel();
        self.waiters.borrow_mut().push(waiter);
        done
    }

    /// Wait for every selection started so far
    pub async fn settle(&self) {
        let waiters = std::mem::take(&mut *self.waiters.borrow_mut());
        join_all(waiters).await;
    }
}

/// Fetch the directory and apply it if `ticket` is still the latest read.
///
/// A failure on the latest read keeps the old snapshot and is returned; a
/// failure on a stale read is dropped.
pub async fn refresh<D: TagDirectory>(
    selector: &RefCell<TagSelector>,
    directory: &D,
    ticket: RefreshTicket,
) -> Result<RefreshOutcome, ShareError> {
    let result = directory.list_tags().await;
    let mut selector = selector.borrow_mut();

    match result {
        Ok(names) => {
            let outcome = selector.apply_snapshot(ticket, names);
            if outcome == RefreshOutcome::Stale {
                warn!("Discarding stale tag listing {:?}", ticket);
            }
            Ok(outcome)
        }
        Err(_) if !selector.is_current(ticket) => Ok(RefreshOutcome::Stale),
        Err(e) => {
            error!("Error fetching tags: {}", e);
            Err(e)
        }
    }
}

pub async fn set_filter<D: TagDirectory>(
    selector: &RefCell<TagSelector>,
    directory: &D,
    query: &str,
) -> Result<RefreshOutcome, ShareError> {
    let ticket = selector.borrow_mut().set_filter(query);
    refresh(selector, directory, ticket).await
}

/// Focus the input and reload the directory so the full list can be offered
pub async fn focus<D: TagDirectory>(
    selector: &RefCell<TagSelector>,
    directory: &D,
) -> Result<RefreshOutcome, ShareError> {
    let ticket = {
        let mut selector = selector.borrow_mut();
        selector.focus();
        selector.begin_refresh()
    };
    refresh(selector, directory, ticket).await
}

/// Select a tag, creating it in the directory first when the snapshot lacks it.
///
/// A failed create drops the typed text, the same as a failed commit. A
/// create that finishes after the selector was reset does not select.
pub async fn select<D: TagDirectory>(
    selector: &RefCell<TagSelector>,
    directory: &D,
    pending: &PendingSelections,
    tag: Tag,
) -> Result<SelectOutcome, ShareError> {
    let _done = pending.track();
    let (plan, epoch) = {
        let selector = selector.borrow();
        (selector.plan_selection(tag), selector.selection_epoch())
    };

    let (tag, created) = match plan {
        SelectionPlan::AlreadySelected => return Ok(SelectOutcome::Unchanged),
        SelectionPlan::Known(tag) => (tag, false),
        SelectionPlan::Missing(tag) => match directory.create_tag(&tag).await {
            Ok(message) => {
                info!("Created tag \"{}\": {}", tag, message);
                (tag, true)
            }
            Err(e) => {
                error!("Error adding tag: {}", e);
                selector.borrow_mut().abandon_selection(&tag);
                return Err(e);
            }
        },
    };

    if !selector.borrow_mut().complete_selection_in(epoch, tag.clone()) {
        return Ok(SelectOutcome::Unchanged);
    }

    Ok(if created {
        SelectOutcome::Created(tag)
    } else {
        SelectOutcome::Added(tag)
    })
}

/// Turn whatever is typed in the input into a selected tag.
///
/// Enter, Tab, comma and blur all end up here.
pub async fn commit_pending_input<D: TagDirectory>(
    selector: &RefCell<TagSelector>,
    directory: &D,
    pending: &PendingSelections,
) -> Result<SelectOutcome, ShareError> {
    let typed = selector.borrow_mut().take_pending_input();
    match typed {
        Some(tag) => select(selector, directory, pending, tag).await,
        None => Ok(SelectOutcome::Unchanged),
    }
}

/// Validate the primary value and pair it with the selected tags
pub fn build_submission(
    config: &FormConfig,
    selector: &TagSelector,
    raw_value: &str,
) -> Result<Submission, ShareError> {
    let value = raw_value.trim();
    if value.is_empty() {
        return Err(ShareError::MissingValue(config.primary_label.clone()));
    }
    if config.require_url && Url::parse(value).is_err() {
        return Err(ShareError::InvalidUrl);
    }

    Ok(Submission {
        field: config.primary_field.clone(),
        value: value.to_string(),
        tags: selector.selection().to_names(),
    })
}

/// Submit the form once pending selections have landed. The selector is
/// reset only when the service accepts it.
pub async fn submit<S: SubmissionService>(
    selector: &RefCell<TagSelector>,
    service: &S,
    pending: &PendingSelections,
    config: &FormConfig,
    raw_value: &str,
) -> Result<Submission, ShareError> {
    pending.settle().await;

    let submission = build_submission(config, &selector.borrow(), raw_value)
        .inspect_err(|e| warn!("Rejected submission: {}", e))?;

    service
        .submit(&submission)
        .await
        .inspect_err(|e| error!("Submission failed: {}", e))?;

    info!(
        "Submitted {} with {} tag(s)",
        submission.value,
        submission.tags.len()
    );
    selector.borrow_mut().reset();
    Ok(submission)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selector::Dropdown;
    use crate::service::testing::{RecordingDirectory, RecordingSubmission};
    use futures::channel::oneshot;
    use futures::executor::block_on;

    fn tag(name: &str) -> Tag {
        Tag::new(name).unwrap()
    }

    fn loaded(directory: &RecordingDirectory) -> RefCell<TagSelector> {
        let selector = RefCell::new(TagSelector::new());
        block_on(focus(&selector, directory)).unwrap();
        selector
    }

    fn labels(selector: &RefCell<TagSelector>) -> Vec<String> {
        selector.borrow().suggestions().map(|s| s.label()).collect()
    }

    #[test]
    fn test_select_already_selected_is_noop() {
        let directory = RecordingDirectory::with_tags(&["news"]);
        let selector = loaded(&directory);
        let pending = PendingSelections::default();
        block_on(select(&selector, &directory, &pending, tag("news"))).unwrap();

        let before = selector.borrow().clone();
        let lists = directory.lists.get();
        let outcome = block_on(select(&selector, &directory, &pending, tag("NEWS"))).unwrap();

        assert_eq!(outcome, SelectOutcome::Unchanged);
        assert_eq!(*selector.borrow(), before);
        assert_eq!(directory.lists.get(), lists);
        assert!(directory.creates.borrow().is_empty());
    }

    #[test]
    fn test_select_unknown_creates_once() {
        let directory = RecordingDirectory::with_tags(&["news"]);
        let selector = loaded(&directory);
        let pending = PendingSelections::default();

        let outcome = block_on(select(&selector, &directory, &pending, tag("xyz"))).unwrap();

        assert_eq!(outcome, SelectOutcome::Created(tag("xyz")));
        assert_eq!(*directory.creates.borrow(), vec!["xyz".to_string()]);
        assert!(selector.borrow().selection().contains(&tag("xyz")));
    }

    #[test]
    fn test_select_create_failure_leaves_selection() {
        let directory = RecordingDirectory {
            fail_create: true,
            ..RecordingDirectory::with_tags(&["news"])
        };
        let selector = loaded(&directory);
        let pending = PendingSelections::default();

        let result = block_on(select(&selector, &directory, &pending, tag("xyz")));

        assert!(matches!(result, Err(ShareError::TagCreate { .. })));
        assert_eq!(directory.creates.borrow().len(), 1);
        assert!(selector.borrow().selection().is_empty());
    }

    #[test]
    fn test_deselect_then_select_known_tag_never_creates() {
        let directory = RecordingDirectory::with_tags(&["news", "music"]);
        let selector = loaded(&directory);
        let pending = PendingSelections::default();

        block_on(select(&selector, &directory, &pending, tag("music"))).unwrap();
        selector.borrow_mut().deselect(&tag("music"));
        let outcome = block_on(select(&selector, &directory, &pending, tag("music"))).unwrap();

        assert_eq!(outcome, SelectOutcome::Added(tag("music")));
        assert!(directory.creates.borrow().is_empty());
    }

    #[test]
    fn test_known_tag_keeps_directory_spelling() {
        let directory = RecordingDirectory::with_tags(&["News"]);
        let selector = loaded(&directory);
        let pending = PendingSelections::default();

        block_on(select(&selector, &directory, &pending, tag("news"))).unwrap();

        assert_eq!(selector.borrow().selection().to_names(), vec!["News".to_string()]);
    }

    #[test]
    fn test_type_then_create_scenario() {
        let directory = RecordingDirectory::with_tags(&["news", "music"]);
        let selector = loaded(&directory);
        let pending = PendingSelections::default();

        block_on(set_filter(&selector, &directory, "ne")).unwrap();
        assert_eq!(labels(&selector), vec!["news"]);

        block_on(set_filter(&selector, &directory, "xyz")).unwrap();
        assert_eq!(labels(&selector), vec!["Add \"xyz\""]);

        let create = selector.borrow().suggestions().next().unwrap();
        block_on(select(&selector, &directory, &pending, create.tag().clone())).unwrap();

        let selector = selector.borrow();
        assert!(selector.selection().contains(&tag("xyz")));
        assert_eq!(selector.filter(), "");
        assert_eq!(selector.dropdown(), Dropdown::Closed);
        assert_eq!(*directory.creates.borrow(), vec!["xyz".to_string()]);
    }

    #[test]
    fn test_commit_pending_input() {
        let directory = RecordingDirectory::with_tags(&["rust"]);
        let selector = loaded(&directory);
        let pending = PendingSelections::default();

        block_on(set_filter(&selector, &directory, "  Rust  ")).unwrap();
        let outcome = block_on(commit_pending_input(&selector, &directory, &pending)).unwrap();

        assert_eq!(outcome, SelectOutcome::Added(tag("rust")));
        assert_eq!(selector.borrow().filter(), "");
        assert!(directory.creates.borrow().is_empty());

        block_on(set_filter(&selector, &directory, "   ")).unwrap();
        let outcome = block_on(commit_pending_input(&selector, &directory, &pending)).unwrap();
        assert_eq!(outcome, SelectOutcome::Unchanged);
    }

    #[test]
    fn test_fetch_failure_keeps_snapshot() {
        let directory = RecordingDirectory::with_tags(&["news"]);
        let selector = loaded(&directory);
        let pending = PendingSelections::default();
        block_on(select(&selector, &directory, &pending, tag("news"))).unwrap();

        let failing = RecordingDirectory {
            fail_list: true,
            ..Default::default()
        };
        let result = block_on(set_filter(&selector, &failing, "n"));

        assert!(matches!(result, Err(ShareError::DirectoryFetch(_))));
        assert_eq!(selector.borrow().snapshot(), &[tag("news")]);
        assert!(selector.borrow().selection().contains(&tag("news")));
    }

    #[test]
    fn test_stale_failure_is_dropped() {
        let failing = RecordingDirectory {
            fail_list: true,
            ..Default::default()
        };
        let selector = RefCell::new(TagSelector::new());
        let first = selector.borrow_mut().set_filter("a");
        selector.borrow_mut().set_filter("ab");

        let outcome = block_on(refresh(&selector, &failing, first));
        assert_eq!(outcome, Ok(RefreshOutcome::Stale));
    }

    /// Directory whose listings and creates resolve when the test says so
    #[derive(Default)]
    struct GatedDirectory {
        gates: RefCell<Vec<oneshot::Receiver<Vec<String>>>>,
        create_gates: RefCell<Vec<oneshot::Receiver<()>>>,
    }

    impl TagDirectory for GatedDirectory {
        async fn list_tags(&self) -> Result<Vec<String>, ShareError> {
            let gate = self.gates.borrow_mut().remove(0);
            gate.await
                .map_err(|_| ShareError::DirectoryFetch("cancelled".to_string()))
        }

        async fn create_tag(&self, tag: &Tag) -> Result<String, ShareError> {
            let gate = self.create_gates.borrow_mut().pop();
            if let Some(gate) = gate {
                gate.await.map_err(|_| ShareError::TagCreate {
                    tag: tag.to_string(),
                    reason: "cancelled".to_string(),
                })?;
            }
            Ok(format!("created {}", tag))
        }
    }

    #[test]
    fn test_last_query_wins_when_responses_arrive_out_of_order() {
        let (first_tx, first_rx) = oneshot::channel();
        let (second_tx, second_rx) = oneshot::channel();
        let directory = GatedDirectory {
            gates: RefCell::new(vec![first_rx, second_rx]),
            ..Default::default()
        };
        let selector = RefCell::new(TagSelector::new());

        let outcomes = block_on(async {
            let first = set_filter(&selector, &directory, "m");
            let second = set_filter(&selector, &directory, "mu");
            let respond = async {
                second_tx.send(vec!["music".to_string()]).unwrap();
                first_tx
                    .send(vec!["music".to_string(), "maps".to_string(), "memes".to_string()])
                    .unwrap();
            };
            futures::join!(first, second, respond)
        });

        assert_eq!(outcomes.0, Ok(RefreshOutcome::Stale));
        assert_eq!(outcomes.1, Ok(RefreshOutcome::Applied));
        assert_eq!(selector.borrow().filter(), "mu");
        assert_eq!(selector.borrow().snapshot(), &[tag("music")]);
    }

    #[test]
    fn test_submit_waits_for_commit_in_flight() {
        let (create_tx, create_rx) = oneshot::channel();
        let directory = GatedDirectory {
            create_gates: RefCell::new(vec![create_rx]),
            ..Default::default()
        };
        let selector = RefCell::new(TagSelector::new());
        let pending = PendingSelections::default();
        let service = RecordingSubmission::default();
        let config = FormConfig::default();
        selector.borrow_mut().set_filter("xyz");

        // Blur commits the typed text, then the submit button is clicked
        // while the create is still outstanding
        let (committed, sent, _) = block_on(async {
            let commit = commit_pending_input(&selector, &directory, &pending);
            let send = submit(&selector, &service, &pending, &config, "https://example.com");
            let respond = async {
                create_tx.send(()).unwrap();
            };
            futures::join!(commit, send, respond)
        });

        assert_eq!(committed, Ok(SelectOutcome::Created(tag("xyz"))));
        assert_eq!(sent.unwrap().tags, vec!["xyz".to_string()]);
        assert_eq!(service.sent.borrow().len(), 1);
        assert!(selector.borrow().selection().is_empty());
        assert_eq!(selector.borrow().filter(), "");
    }

    #[test]
    fn test_create_finishing_after_reset_is_not_selected() {
        let (create_tx, create_rx) = oneshot::channel();
        let directory = GatedDirectory {
            create_gates: RefCell::new(vec![create_rx]),
            ..Default::default()
        };
        let selector = RefCell::new(TagSelector::new());
        let pending = PendingSelections::default();

        let (outcome, _) = block_on(async {
            let pick = select(&selector, &directory, &pending, tag("xyz"));
            let clear = async {
                selector.borrow_mut().reset();
                create_tx.send(()).unwrap();
            };
            futures::join!(pick, clear)
        });

        assert_eq!(outcome, Ok(SelectOutcome::Unchanged));
        assert!(selector.borrow().selection().is_empty());
        assert_eq!(selector.borrow().snapshot(), &[tag("xyz")]);
    }

    #[test]
    fn test_failed_create_clears_filter_from_either_path() {
        let directory = RecordingDirectory {
            fail_create: true,
            ..RecordingDirectory::with_tags(&["news"])
        };
        let pending = PendingSelections::default();

        // Clicking the create entry
        let clicked = loaded(&directory);
        block_on(set_filter(&clicked, &directory, "xyz")).unwrap();
        let create = clicked.borrow().suggestions().next().unwrap();
        let result = block_on(select(&clicked, &directory, &pending, create.tag().clone()));
        assert!(matches!(result, Err(ShareError::TagCreate { .. })));

        // Pressing Enter on the typed text
        let typed = loaded(&directory);
        block_on(set_filter(&typed, &directory, "xyz")).unwrap();
        let result = block_on(commit_pending_input(&typed, &directory, &pending));
        assert!(matches!(result, Err(ShareError::TagCreate { .. })));

        for selector in [&clicked, &typed] {
            let selector = selector.borrow();
            assert_eq!(selector.filter(), "");
            assert_eq!(selector.dropdown(), Dropdown::Closed);
            assert!(selector.selection().is_empty());
        }
    }

    #[test]
    fn test_submit_resets_selection() {
        let directory = RecordingDirectory::with_tags(&["news"]);
        let selector = loaded(&directory);
        let pending = PendingSelections::default();
        block_on(select(&selector, &directory, &pending, tag("news"))).unwrap();
        let service = RecordingSubmission::default();

        let sent = block_on(submit(
            &selector,
            &service,
            &pending,
            &FormConfig::default(),
            " https://example.com/a ",
        ))
        .unwrap();

        assert_eq!(sent.value, "https://example.com/a");
        assert_eq!(sent.tags, vec!["news".to_string()]);
        assert_eq!(service.sent.borrow().len(), 1);
        assert!(selector.borrow().selection().is_empty());
    }

    #[test]
    fn test_submit_without_tags() {
        let selector = RefCell::new(TagSelector::new());
        let pending = PendingSelections::default();
        let service = RecordingSubmission::default();

        let sent =
            block_on(submit(&selector, &service, &pending, &FormConfig::default(), "https://example.com"))
                .unwrap();

        assert!(sent.tags.is_empty());
        assert_eq!(
            serde_json::to_value(&service.sent.borrow()[0]).unwrap(),
            serde_json::json!({"url": "https://example.com", "tags": []})
        );
    }

    #[test]
    fn test_submit_failure_preserves_state() {
        let directory = RecordingDirectory::with_tags(&["news"]);
        let selector = loaded(&directory);
        let pending = PendingSelections::default();
        block_on(select(&selector, &directory, &pending, tag("news"))).unwrap();
        let service = RecordingSubmission {
            reject_with: Some("Invalid webhook".to_string()),
            ..Default::default()
        };

        let result = block_on(submit(
            &selector,
            &service,
            &pending,
            &FormConfig::webhook("http://localhost:5000"),
            "hook-1",
        ));

        assert_eq!(result, Err(ShareError::Submission("Invalid webhook".to_string())));
        assert!(selector.borrow().selection().contains(&tag("news")));
    }

    #[test]
    fn test_validation_happens_before_network() {
        let selector = RefCell::new(TagSelector::new());
        let pending = PendingSelections::default();
        let service = RecordingSubmission::default();
        let config = FormConfig::default();

        assert_eq!(
            block_on(submit(&selector, &service, &pending, &config, "   ")),
            Err(ShareError::MissingValue("link".to_string()))
        );
        assert_eq!(
            block_on(submit(&selector, &service, &pending, &config, "example.com")),
            Err(ShareError::InvalidUrl)
        );
        assert!(service.sent.borrow().is_empty());
    }
}
