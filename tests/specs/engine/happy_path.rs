//! End-to-end happy path: inputs in, doubled outputs back, status `done`.

use crate::prelude::*;
use shepherd_core::{JobId, JobState, ModelRef};
use shepherd_storage::Storage;

#[tokio::test]
async fn doubling_job_runs_to_done() {
    let flock = dummy_flock();
    flock.seed_payload("j-one", br#"{"key": [1000]}"#).await;

    flock
        .shepherd
        .enqueue_job(JobId::new("j-one"), ModelRef::new("double", "v1"), None)
        .unwrap()
        .written()
        .await
        .unwrap();

    let status = flock.wait_done("j-one").await;
    assert_eq!(status.state, JobState::Done);
    assert!(status.error_details.is_none());
    assert!(status.processing_started_at.unwrap() >= status.enqueued_at);
    assert!(status.finished_at.unwrap() >= status.processing_started_at.unwrap());

    let output = flock
        .storage
        .get_file(&JobId::new("j-one"), "outputs/output")
        .await
        .unwrap()
        .expect("output file must exist");
    let value: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(value, serde_json::json!({"key": [1000], "output": [2000]}));

    // scratch space is gone once the reply was processed
    assert!(!flock.temp.path().join("data/sheep_a/j-one").exists());

    flock.shepherd.close().await;
}

#[tokio::test]
async fn jobs_auto_assign_to_the_first_configured_sheep() {
    let flock = dummy_flock();
    flock.seed_payload("auto", br#"{"key": [7]}"#).await;

    // no sheep id given: the single configured sheep takes it
    flock.shepherd.enqueue_job(JobId::new("auto"), ModelRef::new("double", "v1"), None).unwrap();
    let status = flock.wait_done("auto").await;
    assert_eq!(status.state, JobState::Done);

    let snapshot = flock.shepherd.get_status().await;
    assert_eq!(snapshot.len(), 1);
    assert_eq!(snapshot[0].0.as_str(), "sheep_a");
    assert!(snapshot[0].1.running);

    flock.shepherd.close().await;
}

#[tokio::test]
async fn wait_ready_reports_done_immediately_for_settled_jobs() {
    let flock = dummy_flock();
    flock.seed_payload("j", br#"{"key": [2]}"#).await;
    flock.shepherd.enqueue_job(JobId::new("j"), ModelRef::new("double", "v1"), None).unwrap();
    flock.wait_done("j").await;

    // a second wait must return without any further broadcast
    tokio::time::timeout(std::time::Duration::from_secs(1), async {
        flock.shepherd.wait_job_done(&JobId::new("j")).await.unwrap();
    })
    .await
    .unwrap();
    assert!(flock.shepherd.is_job_done(&JobId::new("j")).await.unwrap());

    flock.shepherd.close().await;
}
