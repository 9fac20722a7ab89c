use super::*;
use crate::error::TransportError;
use crate::types::{ItemId, Locator};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex as StdMutex;
use std::time::Duration;
use tokio::sync::{Notify, Semaphore};

type PageResult = Result<Vec<Item>, TransportError>;

fn item(id: u64) -> Item {
    Item {
        id: ItemId(id),
        title: format!("photo {id}"),
        locator: Locator::parse(&format!("https://img.example.com/{id}.png")).unwrap(),
    }
}

fn page(ids: std::ops::RangeInclusive<u64>) -> PageResult {
    Ok(ids.map(item).collect())
}

fn failure(reason: &str) -> PageResult {
    Err(TransportError::Other(reason.to_string()))
}

/// Page fetcher that replays scripted responses in call order.
///
/// Optionally every call waits for a semaphore permit (to hold fetches in
/// flight), and the first call can be parked on a `Notify` to simulate a slow
/// superseded request.
#[derive(Default)]
struct ScriptedPages {
    responses: StdMutex<VecDeque<PageResult>>,
    requested: StdMutex<Vec<(u32, usize)>>,
    gate: Option<Arc<Semaphore>>,
    park_first: StdMutex<Option<Arc<Notify>>>,
}

impl ScriptedPages {
    fn new(responses: Vec<PageResult>) -> Self {
        Self {
            responses: StdMutex::new(responses.into()),
            ..Default::default()
        }
    }

    fn gated(responses: Vec<PageResult>, gate: Arc<Semaphore>) -> Self {
        Self {
            gate: Some(gate),
            ..Self::new(responses)
        }
    }

    fn requested_pages(&self) -> Vec<u32> {
        self.requested.lock().unwrap().iter().map(|(p, _)| *p).collect()
    }
}

#[async_trait]
impl PageFetcher for ScriptedPages {
    async fn fetch_page(&self, page: u32, limit: usize) -> PageResult {
        let response = self
            .responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(Vec::new()));
        let parked = self.park_first.lock().unwrap().take();
        // Recorded last so a caller that sees the request also sees the park taken
        self.requested.lock().unwrap().push((page, limit));

        if let Some(notify) = parked {
            notify.notified().await;
        }
        if let Some(gate) = &self.gate {
            gate.acquire().await.unwrap().forget();
        }
        response
    }
}

fn controller(fetcher: &Arc<ScriptedPages>, page_size: usize) -> FeedController {
    FeedController::new(Arc::clone(fetcher) as Arc<dyn PageFetcher>, page_size)
}

fn ids(items: &[Item]) -> Vec<u64> {
    items.iter().map(|i| i.id.get()).collect()
}

// ---------------------------------------------------------------
// load_initial
// ---------------------------------------------------------------

#[tokio::test]
async fn fresh_controller_has_not_started() {
    let fetcher = Arc::new(ScriptedPages::default());
    let feed = controller(&fetcher, 10);

    assert_eq!(feed.feed_state(), FeedState::NotStarted);
    assert_eq!(feed.pagination_state(), PaginationState::Ready);
    assert!(feed.items().is_empty());
    assert_eq!(feed.current_page(), 1);
    assert!(fetcher.requested_pages().is_empty());
}

#[tokio::test]
async fn initial_load_populates_items_and_readies_pagination() {
    let fetcher = Arc::new(ScriptedPages::new(vec![page(1..=10)]));
    let feed = controller(&fetcher, 10);

    feed.load_initial().await;

    assert_eq!(ids(&feed.items()), (1..=10).collect::<Vec<_>>());
    assert_eq!(feed.feed_state().items().map(<[Item]>::len), Some(10));
    assert_eq!(feed.pagination_state(), PaginationState::Ready);
    assert_eq!(*fetcher.requested.lock().unwrap(), vec![(1, 10)]);
}

#[tokio::test]
async fn empty_first_page_exhausts_immediately() {
    let fetcher = Arc::new(ScriptedPages::new(vec![Ok(Vec::new())]));
    let feed = controller(&fetcher, 10);

    feed.load_initial().await;
    assert!(matches!(feed.feed_state(), FeedState::Loaded(ref items) if items.is_empty()));
    assert_eq!(feed.pagination_state(), PaginationState::Exhausted);

    feed.load_next_page().await;
    assert_eq!(fetcher.requested_pages(), vec![1], "no second page exists");
}

#[tokio::test]
async fn failed_initial_load_reports_failure_and_retry_starts_over() {
    let fetcher = Arc::new(ScriptedPages::new(vec![
        failure("HTTP 503"),
        page(1..=3),
    ]));
    let feed = controller(&fetcher, 3);

    feed.load_initial().await;
    assert_eq!(feed.feed_state().error(), Some("HTTP 503"));
    assert!(feed.items().is_empty());

    // Nothing to paginate from while the first page is missing
    feed.load_next_page().await;
    assert_eq!(fetcher.requested_pages(), vec![1]);

    feed.load_initial().await;
    assert_eq!(ids(&feed.items()), vec![1, 2, 3]);
    assert_eq!(fetcher.requested_pages(), vec![1, 1]);
}

#[tokio::test]
async fn load_initial_discards_previously_accumulated_pages() {
    let fetcher = Arc::new(ScriptedPages::new(vec![
        page(1..=2),
        page(3..=4),
        page(100..=101),
    ]));
    let feed = controller(&fetcher, 2);

    feed.load_initial().await;
    feed.load_next_page().await;
    assert_eq!(feed.items().len(), 4);
    assert_eq!(feed.current_page(), 2);

    feed.load_initial().await;
    assert_eq!(ids(&feed.items()), vec![100, 101]);
    assert_eq!(feed.current_page(), 1);
    assert_eq!(fetcher.requested_pages(), vec![1, 2, 1]);
}

// ---------------------------------------------------------------
// load_next_page
// ---------------------------------------------------------------

#[tokio::test]
async fn pages_accumulate_until_exhausted() {
    let fetcher = Arc::new(ScriptedPages::new(vec![
        page(1..=10),
        page(11..=20),
        Ok(Vec::new()),
    ]));
    let feed = controller(&fetcher, 10);

    feed.load_initial().await;
    feed.load_next_page().await;
    feed.load_next_page().await;

    assert_eq!(ids(&feed.items()), (1..=20).collect::<Vec<_>>());
    assert_eq!(feed.pagination_state(), PaginationState::Exhausted);
    assert_eq!(feed.current_page(), 2, "empty page does not advance the counter");
    assert_eq!(*fetcher.requested.lock().unwrap(), vec![(1, 10), (2, 10), (3, 10)]);
}

#[tokio::test]
async fn exhausted_feed_never_fetches_again() {
    let fetcher = Arc::new(ScriptedPages::new(vec![page(1..=5), Ok(Vec::new())]));
    let feed = controller(&fetcher, 5);

    feed.load_initial().await;
    feed.load_next_page().await;
    assert_eq!(feed.pagination_state(), PaginationState::Exhausted);

    for _ in 0..5 {
        feed.load_next_page().await;
        feed.retry_next_page().await;
    }
    assert_eq!(fetcher.requested_pages(), vec![1, 2]);
}

#[tokio::test]
async fn failed_next_page_keeps_loaded_items() {
    let fetcher = Arc::new(ScriptedPages::new(vec![page(1..=10), failure("connection reset")]));
    let feed = controller(&fetcher, 10);

    feed.load_initial().await;
    let before = feed.feed_state();

    feed.load_next_page().await;

    assert_eq!(
        feed.pagination_state(),
        PaginationState::Failed("connection reset".into())
    );
    assert_eq!(feed.feed_state(), before, "feed stays Loaded with the same items");
    assert_eq!(ids(&feed.items()), (1..=10).collect::<Vec<_>>());
    assert_eq!(feed.current_page(), 1);
}

#[tokio::test]
async fn bare_call_after_failure_is_a_no_op_but_retry_recovers() {
    let fetcher = Arc::new(ScriptedPages::new(vec![
        page(1..=2),
        failure("timeout"),
        page(3..=4),
    ]));
    let feed = controller(&fetcher, 2);

    feed.load_initial().await;
    feed.load_next_page().await;
    assert!(feed.pagination_state().error().is_some());

    feed.load_next_page().await;
    assert_eq!(fetcher.requested_pages(), vec![1, 2], "Failed is not Ready");

    feed.retry_next_page().await;
    assert_eq!(fetcher.requested_pages(), vec![1, 2, 2], "retry re-requests the same page");
    assert_eq!(ids(&feed.items()), vec![1, 2, 3, 4]);
    assert_eq!(feed.pagination_state(), PaginationState::Ready);
    assert_eq!(feed.current_page(), 2);
}

#[tokio::test]
async fn retry_is_ignored_unless_failed() {
    let fetcher = Arc::new(ScriptedPages::new(vec![page(1..=2)]));
    let feed = controller(&fetcher, 2);

    feed.load_initial().await;
    feed.retry_next_page().await;

    assert_eq!(fetcher.requested_pages(), vec![1]);
    assert_eq!(feed.pagination_state(), PaginationState::Ready);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_next_page_calls_issue_one_fetch() {
    let gate = Arc::new(Semaphore::new(1)); // one permit for the first page
    let fetcher = Arc::new(ScriptedPages::gated(
        vec![page(1..=10), page(11..=20)],
        Arc::clone(&gate),
    ));
    let feed = Arc::new(controller(&fetcher, 10));
    feed.load_initial().await;

    let calls: Vec<_> = (0..16)
        .map(|_| {
            let feed = Arc::clone(&feed);
            tokio::spawn(async move { feed.load_next_page().await })
        })
        .collect();

    // Wait until one caller is parked inside the fetch
    for _ in 0..200 {
        if fetcher.requested_pages().len() == 2 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(feed.pagination_state(), PaginationState::Loading);
    assert_eq!(fetcher.requested_pages(), vec![1, 2]);

    gate.add_permits(1);
    for call in calls {
        call.await.unwrap();
    }

    assert_eq!(fetcher.requested_pages(), vec![1, 2], "exactly one next-page fetch");
    assert_eq!(feed.items().len(), 20);
    assert_eq!(feed.pagination_state(), PaginationState::Ready);
}

// ---------------------------------------------------------------
// Supersession
// ---------------------------------------------------------------

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn stale_initial_load_cannot_overwrite_newer_one() {
    let slow = Arc::new(Notify::new());
    let fetcher = Arc::new(ScriptedPages {
        park_first: StdMutex::new(Some(Arc::clone(&slow))),
        ..ScriptedPages::new(vec![page(1..=3), page(50..=52)])
    });
    let feed = Arc::new(controller(&fetcher, 3));

    let first = {
        let feed = Arc::clone(&feed);
        tokio::spawn(async move { feed.load_initial().await })
    };
    for _ in 0..200 {
        if !fetcher.requested_pages().is_empty() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    feed.load_initial().await;
    assert_eq!(ids(&feed.items()), vec![50, 51, 52]);

    slow.notify_one();
    first.await.unwrap();

    assert_eq!(
        ids(&feed.items()),
        vec![50, 51, 52],
        "late response from the superseded call is discarded"
    );
    assert_eq!(feed.pagination_state(), PaginationState::Ready);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn next_page_from_before_a_reload_is_discarded() {
    let fetcher = Arc::new(ScriptedPages::new(vec![
        page(1..=2),
        page(3..=4),
        page(100..=101),
    ]));
    let feed = Arc::new(controller(&fetcher, 2));
    feed.load_initial().await;

    // Hold page 2 in flight
    let slow = Arc::new(Notify::new());
    *fetcher.park_first.lock().unwrap() = Some(Arc::clone(&slow));
    let next = {
        let feed = Arc::clone(&feed);
        tokio::spawn(async move { feed.load_next_page().await })
    };
    for _ in 0..200 {
        if fetcher.requested_pages().len() == 2 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    assert_eq!(feed.pagination_state(), PaginationState::Loading);

    feed.load_initial().await;
    slow.notify_one();
    next.await.unwrap();

    assert_eq!(fetcher.requested_pages(), vec![1, 2, 1]);
    assert_eq!(ids(&feed.items()), vec![100, 101]);
    assert_eq!(feed.current_page(), 1);
    assert_eq!(feed.pagination_state(), PaginationState::Ready);
    assert!(matches!(feed.feed_state(), FeedState::Loaded(ref items) if items.len() == 2));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn retry_owns_the_fetch_even_when_racing_next_page_calls() {
    let fetcher = Arc::new(ScriptedPages::new(vec![
        page(1..=2),
        failure("timeout"),
        page(3..=4),
    ]));
    let feed = Arc::new(controller(&fetcher, 2));
    feed.load_initial().await;
    feed.load_next_page().await;
    assert!(feed.pagination_state().error().is_some());

    let racers: Vec<_> = (0..8)
        .map(|_| {
            let feed = Arc::clone(&feed);
            tokio::spawn(async move { feed.load_next_page().await })
        })
        .collect();
    feed.retry_next_page().await;

    // The retried page is applied by the time retry returns
    assert_eq!(ids(&feed.items()), vec![1, 2, 3, 4]);
    assert_eq!(feed.current_page(), 2);

    for racer in racers {
        racer.await.unwrap();
    }
    assert_eq!(
        fetcher.requested_pages().iter().filter(|p| **p == 2).count(),
        2,
        "one failed attempt and one retry"
    );
}

#[tokio::test]
async fn retry_before_the_feed_has_loaded_only_rearms_pagination() {
    let fetcher = Arc::new(ScriptedPages::new(vec![
        page(1..=2),
        failure("offline"),
        failure("still offline"),
    ]));
    let feed = controller(&fetcher, 2);
    feed.load_initial().await;
    feed.load_next_page().await;
    feed.load_initial().await;
    assert!(matches!(feed.feed_state(), FeedState::Failed(_)));

    feed.retry_next_page().await;

    assert_eq!(fetcher.requested_pages(), vec![1, 2, 1]);
    assert_eq!(feed.pagination_state(), PaginationState::Ready);
}

// ---------------------------------------------------------------
// Observation
// ---------------------------------------------------------------

#[tokio::test]
async fn trigger_fires_only_for_last_item_while_ready() {
    let fetcher = Arc::new(ScriptedPages::new(vec![page(1..=3), failure("offline")]));
    let feed = controller(&fetcher, 3);

    assert!(!feed.should_trigger_next_load(&item(3)));

    feed.load_initial().await;
    assert!(feed.should_trigger_next_load(&item(3)));
    assert!(!feed.should_trigger_next_load(&item(2)));
    assert!(!feed.should_trigger_next_load(&item(99)));

    feed.load_next_page().await;
    assert!(
        !feed.should_trigger_next_load(&item(3)),
        "failed pagination must not auto-trigger"
    );
}

#[tokio::test]
async fn subscribers_observe_transitions() {
    let fetcher = Arc::new(ScriptedPages::new(vec![page(1..=2)]));
    let feed = controller(&fetcher, 2);
    let mut rx = feed.subscribe();

    assert_eq!(rx.borrow_and_update().feed, FeedState::NotStarted);

    feed.load_initial().await;
    assert!(rx.has_changed().unwrap());
    let snapshot = rx.borrow_and_update().clone();
    assert!(matches!(snapshot.feed, FeedState::Loaded(_)));
    assert_eq!(snapshot.items.len(), 2);
    assert_eq!(snapshot, feed.snapshot());
}

#[tokio::test]
async fn zero_page_size_is_clamped() {
    let fetcher = Arc::new(ScriptedPages::new(vec![page(1..=1)]));
    let feed = controller(&fetcher, 0);
    assert_eq!(feed.page_size(), 1);

    feed.load_initial().await;
    assert_eq!(*fetcher.requested.lock().unwrap(), vec![(1, 1)]);
}

#[tokio::test]
async fn from_config_uses_configured_page_size() {
    let fetcher = Arc::new(ScriptedPages::default());
    let feed = FeedController::from_config(
        Arc::clone(&fetcher) as Arc<dyn PageFetcher>,
        &FeedConfig { page_size: 25 },
    );
    assert_eq!(feed.page_size(), 25);
}
