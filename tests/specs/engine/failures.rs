//! Failure behavior: bad inputs, unknown jobs, unknown sheep.

use crate::prelude::*;
use shepherd_core::{JobId, JobState, ModelRef, SheepId};
use shepherd_engine::ShepherdError;
use shepherd_storage::Storage;

#[tokio::test]
async fn bad_input_fails_with_a_diagnostic_and_the_sheep_survives() {
    let flock = dummy_flock();
    // the payload is not where the worker expects it
    flock.storage.init_job(&JobId::new("bad")).await.unwrap();
    flock.storage.put_file(&JobId::new("bad"), "inputs/other.json", b"{}").await.unwrap();

    flock.shepherd.enqueue_job(JobId::new("bad"), ModelRef::new("double", "v1"), None).unwrap();
    let status = flock.wait_done("bad").await;

    assert_eq!(status.state, JobState::Failed);
    let details = status.error_details.expect("failed status carries details");
    assert!(!details.message.is_empty());

    let snapshot = flock.shepherd.get_status().await;
    assert!(snapshot[0].1.running, "the worker survives a bad job");

    flock.shepherd.close().await;
}

#[tokio::test]
async fn unknown_job_is_rejected() {
    let flock = dummy_flock();
    let err = flock.shepherd.is_job_done(&JobId::new("never-enqueued")).await.unwrap_err();
    assert!(matches!(err, ShepherdError::UnknownJob(id) if id == "never-enqueued"));
    flock.shepherd.close().await;
}

#[tokio::test]
async fn unknown_sheep_is_rejected_before_any_state_change() {
    let flock = dummy_flock();
    let err = flock
        .shepherd
        .enqueue_job(
            JobId::new("j"),
            ModelRef::new("double", "v1"),
            Some(&SheepId::new("no-such-sheep")),
        )
        .unwrap_err();
    assert!(matches!(err, ShepherdError::UnknownSheep(_)));
    // no status was written for the rejected job
    assert_eq!(flock.storage.get_job_status(&JobId::new("j")).await.unwrap(), None);
    flock.shepherd.close().await;
}

#[tokio::test]
async fn failed_jobs_count_as_done_for_readiness() {
    let flock = dummy_flock();
    flock.storage.init_job(&JobId::new("bad")).await.unwrap();

    flock.shepherd.enqueue_job(JobId::new("bad"), ModelRef::new("double", "v1"), None).unwrap();
    let status = flock.wait_done("bad").await;
    assert_eq!(status.state, JobState::Failed);
    assert!(flock.shepherd.is_job_done(&JobId::new("bad")).await.unwrap());

    flock.shepherd.close().await;
}
