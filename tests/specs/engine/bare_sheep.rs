//! Bare sheep behavior: configuration failures, silent worker death and
//! per-sheep delivery order, driven against a router-side test worker.

use crate::prelude::*;
use shepherd_core::{JobId, JobState, ModelRef};

#[tokio::test]
async fn unknown_model_fails_the_job_and_leaves_the_sheep_stopped() {
    let worker = TestWorker::spawn(WorkerReply::Done).await;
    let flock = bare_flock(worker.port, "sleep 30", &[("double", "v1")]);
    flock.seed_payload("bad-model", br#"{"key": [1]}"#).await;
    flock.seed_payload("good-model", br#"{"key": [2]}"#).await;

    flock
        .shepherd
        .enqueue_job(JobId::new("bad-model"), ModelRef::new("no-such-model", "v1"), None)
        .unwrap();
    let status = flock.wait_done("bad-model").await;
    assert_eq!(status.state, JobState::Failed);
    let details = status.error_details.expect("configuration failure carries details");
    assert!(details.message.contains("failed to start sheep"), "got: {}", details.message);

    // the sheep did not transition to running
    let snapshot = flock.shepherd.get_status().await;
    assert!(!snapshot[0].1.running);

    // a known model still works afterwards
    flock
        .shepherd
        .enqueue_job(JobId::new("good-model"), ModelRef::new("double", "v1"), None)
        .unwrap();
    let status = flock.wait_done("good-model").await;
    assert_eq!(status.state, JobState::Done);
    assert_eq!(worker.seen(), vec!["good-model"]);

    flock.shepherd.close().await;
}

#[tokio::test]
async fn silent_worker_death_fails_in_flight_jobs() {
    let worker = TestWorker::spawn(WorkerReply::Silent).await;
    // the runner process exits shortly after launch, without a reply
    let flock = bare_flock(worker.port, "sleep 0.2", &[("double", "v1")]);
    flock.seed_payload("doomed", br#"{"key": [1]}"#).await;

    flock.shepherd.enqueue_job(JobId::new("doomed"), ModelRef::new("double", "v1"), None).unwrap();
    let status = flock.wait_done("doomed").await;

    assert_eq!(status.state, JobState::Failed);
    let details = status.error_details.expect("watchdog failure carries details");
    assert!(details.message.contains("without notice"), "got: {}", details.message);

    // the scratch directory was cleaned up with the failure
    assert!(!flock.temp.path().join("data/sheep_a/doomed").exists());

    flock.shepherd.close().await;
}

#[tokio::test]
async fn jobs_reach_the_worker_in_enqueue_order() {
    let worker = TestWorker::spawn(WorkerReply::Done).await;
    let flock = bare_flock(worker.port, "sleep 30", &[("double", "v1")]);

    let ids = ["order-a", "order-b", "order-c", "order-d"];
    for id in ids {
        flock.seed_payload(id, br#"{"key": [1]}"#).await;
    }
    for id in ids {
        flock.shepherd.enqueue_job(JobId::new(id), ModelRef::new("double", "v1"), None).unwrap();
    }
    for id in ids {
        let status = flock.wait_done(id).await;
        assert_eq!(status.state, JobState::Done, "job {id}");
    }

    assert_eq!(worker.seen(), ids.map(String::from).to_vec());

    flock.shepherd.close().await;
}
