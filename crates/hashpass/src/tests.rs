use crate::{CorrelationId, Error, FetchOutcome, HashService, LatencySnapshot, ServiceConfig};
use core::time::Duration;
use std::collections::HashSet;
use tokio::time::{sleep, timeout};

const ANGRY_MONKEY_DIGEST: &str =
    "ZEHhWB65gUlzdVwtDQArEyx+KVLzp/aTaRaPlBzYRIFj6vjFdqEb0Q5B8zVKCZ0vKbZPZklJz0Fd7su2A+gf7Q==";

fn service_with_delay(delay: Duration) -> HashService {
    HashService::new(ServiceConfig {
        hash_delay: delay,
        drain_timeout: None,
    })
}

/// Polls until the slot leaves `Accepted`, failing the test after `limit`.
async fn fetch_when_ready(
    service: &HashService,
    id: &CorrelationId,
    limit: Duration,
) -> FetchOutcome {
    timeout(limit, async {
        loop {
            match service.fetch(id) {
                FetchOutcome::Accepted => sleep(Duration::from_millis(5)).await,
                other => return other,
            }
        }
    })
    .await
    .expect("result never became ready")
}

#[tokio::test]
async fn angry_monkey_round_trip() {
    let service = service_with_delay(Duration::from_millis(50));

    let id = service.submit("angryMonkey").unwrap();
    assert_eq!(id.as_str(), "1");
    assert_eq!(service.fetch(&id), FetchOutcome::Accepted);

    let outcome = fetch_when_ready(&service, &id, Duration::from_secs(2)).await;
    assert_eq!(outcome, FetchOutcome::Value(ANGRY_MONKEY_DIGEST.to_string()));
    assert_eq!(service.fetch(&id), FetchOutcome::NotFound);
}

#[tokio::test]
async fn empty_secret_is_rejected_without_side_effects() {
    let service = HashService::default();

    assert_eq!(service.submit(""), Err(Error::EmptySecret));
    assert_eq!(service.stats().total, 0);
    assert_eq!(service.outstanding(), 0);

    // No id was burned by the rejected call.
    let id = service.submit("x").unwrap();
    assert_eq!(id.as_str(), "1");
}

#[tokio::test]
async fn unknown_ids_are_not_found() {
    let service = HashService::default();
    assert_eq!(service.fetch(&CorrelationId::from("1")), FetchOutcome::NotFound);
    assert_eq!(service.fetch(&CorrelationId::from("bogus")), FetchOutcome::NotFound);
}

#[tokio::test]
async fn stats_count_only_accepted_submissions() {
    let service = HashService::default();
    assert_eq!(
        service.stats(),
        LatencySnapshot {
            total: 0,
            average: 0
        }
    );

    for secret in ["a", "b", "c"] {
        service.submit(secret).unwrap();
    }
    assert_eq!(service.submit(""), Err(Error::EmptySecret));

    let stats = service.stats();
    assert_eq!(stats.total, 3);
    // The 5 second background delay must not leak into the handling time.
    assert!(stats.average < 1_000_000, "average was {}us", stats.average);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn concurrent_submissions_resolve_independently() {
    let service = service_with_delay(Duration::from_millis(20));

    let a = tokio::spawn({
        let service = service.clone();
        async move { service.submit("angryMonkey").unwrap() }
    });
    let b = tokio::spawn({
        let service = service.clone();
        async move { service.submit("hunter2").unwrap() }
    });
    let (a, b) = (a.await.unwrap(), b.await.unwrap());

    let ids: HashSet<_> = [a.as_str(), b.as_str()].into_iter().collect();
    assert_eq!(ids, HashSet::from(["1", "2"]));

    let limit = Duration::from_secs(2);
    assert_eq!(
        fetch_when_ready(&service, &a, limit).await,
        FetchOutcome::Value(ANGRY_MONKEY_DIGEST.to_string())
    );
    assert_eq!(
        fetch_when_ready(&service, &b, limit).await,
        FetchOutcome::Value(
            "a5ftaNFOs/GqlZzl1Jx9xhLh6x2v1zsecFhHSD/WpsgJ8s606N9v+ZhMYpj/AoXKzmYUv42qnwBwEBtsiYmeIg=="
                .to_string()
        )
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn many_concurrent_submissions_get_unique_ids() {
    const TASKS: usize = 64;
    const PER_TASK: usize = 16;

    let service = service_with_delay(Duration::ZERO);
    let mut handles = Vec::with_capacity(TASKS);
    for _ in 0..TASKS {
        let service = service.clone();
        handles.push(tokio::spawn(async move {
            (0..PER_TASK)
                .map(|_| service.submit("secret").unwrap())
                .collect::<Vec<_>>()
        }));
    }

    let mut seen = HashSet::with_capacity(TASKS * PER_TASK);
    for handle in handles {
        for id in handle.await.unwrap() {
            assert!(seen.insert(id), "duplicate id issued");
        }
    }
    assert_eq!(seen.len(), TASKS * PER_TASK);
    assert_eq!(service.stats().total, (TASKS * PER_TASK) as u64);
}

#[tokio::test]
async fn shutdown_rejects_new_work_and_drains_existing() {
    let service = service_with_delay(Duration::from_millis(100));
    let ids: Vec<_> = (0..4).map(|_| service.submit("angryMonkey").unwrap()).collect();

    service.initiate_shutdown();
    assert!(!service.is_accepting());
    assert_eq!(service.submit("late"), Err(Error::ServiceShutdown));
    assert!(!service.is_stopped());

    timeout(Duration::from_secs(2), service.stopped())
        .await
        .expect("drain should finish");

    // Every worker admitted before shutdown published before the stop fired.
    assert_eq!(service.outstanding(), 0);
    for id in &ids {
        assert_eq!(
            service.fetch(id),
            FetchOutcome::Value(ANGRY_MONKEY_DIGEST.to_string())
        );
    }
    assert_eq!(service.stats().total, 4);
}

#[tokio::test]
async fn shutdown_with_no_outstanding_work_stops_promptly() {
    let service = HashService::default();
    service.initiate_shutdown();
    service.initiate_shutdown();

    timeout(Duration::from_secs(1), service.stopped())
        .await
        .expect("idle service should stop immediately");
    assert!(service.is_stopped());
}

#[tokio::test]
async fn bounded_drain_stops_even_with_work_outstanding() {
    let service = HashService::new(ServiceConfig {
        hash_delay: Duration::from_secs(60),
        drain_timeout: Some(Duration::from_millis(20)),
    });
    service.submit("slow").unwrap();

    service.initiate_shutdown();
    timeout(Duration::from_secs(2), service.stopped())
        .await
        .expect("deadline should force the stop signal");
    assert_eq!(service.outstanding(), 1);
}
