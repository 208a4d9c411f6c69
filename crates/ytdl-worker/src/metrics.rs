//! Job metrics.

use metrics::{counter, gauge, histogram};
use ytdl_models::JobStage;

/// Metric names as constants for consistency.
pub mod names {
    pub const JOBS_STARTED_TOTAL: &str = "ytdl_jobs_started_total";
    pub const JOBS_COMPLETED_TOTAL: &str = "ytdl_jobs_completed_total";
    pub const JOBS_FAILED_TOTAL: &str = "ytdl_jobs_failed_total";
    pub const JOBS_REJECTED_TOTAL: &str = "ytdl_jobs_rejected_total";
    pub const STAGE_DURATION_SECONDS: &str = "ytdl_stage_duration_seconds";
    pub const EXECUTOR_IN_FLIGHT: &str = "ytdl_executor_in_flight_jobs";
}

pub fn record_job_started() {
    counter!(names::JOBS_STARTED_TOTAL).increment(1);
}

pub fn record_job_completed() {
    counter!(names::JOBS_COMPLETED_TOTAL).increment(1);
}

/// Record a failed job, labelled with the stage it failed in.
pub fn record_job_failed(stage: JobStage) {
    let labels = [("stage", stage.as_str().to_string())];
    counter!(names::JOBS_FAILED_TOTAL, &labels).increment(1);
}

pub fn record_job_rejected() {
    counter!(names::JOBS_REJECTED_TOTAL).increment(1);
}

pub fn record_stage_duration(stage: JobStage, duration_secs: f64) {
    let labels = [("stage", stage.as_str().to_string())];
    histogram!(names::STAGE_DURATION_SECONDS, &labels).record(duration_secs);
}

pub fn set_in_flight(count: usize) {
    gauge!(names::EXECUTOR_IN_FLIGHT).set(count as f64);
}
