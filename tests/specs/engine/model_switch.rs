//! Model switching: the sheep restarts between jobs that need different
//! models, and only after the earlier job's reply was processed.

use crate::prelude::*;
use shepherd_core::{JobId, JobState, ModelRef};
use shepherd_storage::Storage;

#[tokio::test]
async fn jobs_with_different_models_both_succeed() {
    let flock = dummy_flock();
    flock.seed_payload("job-x", br#"{"key": [10]}"#).await;
    flock.seed_payload("job-y", br#"{"key": [20]}"#).await;

    flock.shepherd.enqueue_job(JobId::new("job-x"), ModelRef::new("x", "v1"), None).unwrap();
    flock.shepherd.enqueue_job(JobId::new("job-y"), ModelRef::new("y", "v2"), None).unwrap();

    let status_x = flock.wait_done("job-x").await;
    let status_y = flock.wait_done("job-y").await;
    assert_eq!(status_x.state, JobState::Done);
    assert_eq!(status_y.state, JobState::Done);

    // the restart happened only after job-x settled: its outputs made it to
    // storage instead of dying with the first worker
    let out_x = flock.storage.get_file(&JobId::new("job-x"), "outputs/output").await.unwrap();
    assert!(out_x.is_some());

    // the sheep ends up on the second job's model
    let snapshot = flock.shepherd.get_status().await;
    assert_eq!(snapshot[0].1.model, Some(ModelRef::new("y", "v2")));
    assert!(snapshot[0].1.running);

    flock.shepherd.close().await;
}

#[tokio::test]
async fn same_model_jobs_reuse_the_running_worker() {
    let flock = dummy_flock();
    for n in 0..3 {
        flock.seed_payload(&format!("job-{n}"), format!(r#"{{"key": [{n}]}}"#).as_bytes()).await;
    }
    for n in 0..3 {
        flock
            .shepherd
            .enqueue_job(JobId::new(format!("job-{n}")), ModelRef::new("double", "v1"), None)
            .unwrap();
    }
    for n in 0..3 {
        let status = flock.wait_done(&format!("job-{n}")).await;
        assert_eq!(status.state, JobState::Done);
    }
    flock.shepherd.close().await;
}
