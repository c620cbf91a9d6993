use log::debug;

use crate::error::{BuildMineError, Result};

use super::types::{Build, JobRecord, MiningProgress, DEFAULT_LANGUAGE};

/// Flattens enriched builds into one record per matrix job.
///
/// Reproduces the relational view downstream steps expect:
///
/// ```sql
/// SELECT j.job_id, j.job_number, j.config, j.result, j.finished_at,
///        b.build_id, b.number, b.commit, b.branch, b.event_type, b.message,
///        c.committed_at, c.compare_at, c.committer_name
/// FROM jobs j
/// LEFT JOIN builds b ON b.build_id = j.build_id
/// LEFT JOIN commits c ON b.commit = c.sha
/// ```
///
/// Records keep build order, then matrix order. Every build must carry
/// `build_info`; one without it can only come from a damaged checkpoint.
pub fn flatten_jobs(builds: &[Build]) -> Result<Vec<JobRecord>> {
    let mut jobs = Vec::new();

    for build in builds {
        let info = build.build_info.as_ref().ok_or_else(|| {
            BuildMineError::Cache(format!("Build {} has no build info", build.id))
        })?;

        for job in &info.matrix {
            let language = match job.language() {
                Some(language) => language.to_string(),
                None => {
                    debug!(
                        "Language not found in config, defaulting to {DEFAULT_LANGUAGE} for job ID {}.",
                        job.id
                    );
                    DEFAULT_LANGUAGE.to_string()
                }
            };

            jobs.push(JobRecord {
                job_id: job.id,
                job_number: job.number.clone(),
                config: job.config.clone(),
                result: job.result,
                build_id: build.id,
                number: build.number.clone(),
                finished_at: job.finished_at.clone(),
                commit: build.commit.clone(),
                message: build.message.clone(),
                branch: build.branch.clone(),
                event_type: info.event_type.clone(),
                committed_at: info.committed_at.clone(),
                compare_at: info.compare_url.clone(),
                committer_name: info.committer_name.clone(),
                language,
            });
        }
    }

    Ok(jobs)
}

impl MiningProgress {
    /// Computes the progress counters for a set of enriched builds.
    ///
    /// A build failed unless its result is exactly 0. A job failed when its
    /// result is missing or non-zero; Travis reports a null result for jobs
    /// that errored. Pull request builds and jobs are counted separately.
    pub fn from_builds(builds: &[Build], job_count: usize) -> Self {
        let (failed_builds, failed_pr_builds) = count_failed_builds(builds);
        let (failed_jobs, failed_pr_jobs) = count_failed_jobs(builds);

        Self {
            builds: builds.len(),
            jobs: job_count,
            failed_builds,
            failed_jobs,
            failed_pr_builds,
            failed_pr_jobs,
        }
    }
}

fn count_failed_builds(builds: &[Build]) -> (usize, usize) {
    let mut failed = 0;
    let mut failed_pr = 0;

    for build in builds {
        let result = build.build_info.as_ref().and_then(|info| info.result);
        if result == Some(0) {
            continue;
        }
        if build.is_pull_request() {
            failed_pr += 1;
        } else {
            failed += 1;
        }
    }

    (failed, failed_pr)
}

fn count_failed_jobs(builds: &[Build]) -> (usize, usize) {
    let mut failed = 0;
    let mut failed_pr = 0;

    for build in builds {
        let Some(info) = &build.build_info else {
            continue;
        };
        let failed_in_build = info.matrix.iter().filter(|job| job.is_failed()).count();
        if build.is_pull_request() {
            failed_pr += failed_in_build;
        } else {
            failed += failed_in_build;
        }
    }

    (failed, failed_pr)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::travis::types::{BuildDetail, MatrixJob};
    use serde_json::json;

    fn create_job(id: u64, result: Option<i64>, config: serde_json::Value) -> MatrixJob {
        MatrixJob {
            id,
            number: format!("1.{id}"),
            config,
            result,
            finished_at: Some("2019-01-01T00:00:00Z".to_string()),
        }
    }

    fn create_build(id: u64, event_type: &str, result: Option<i64>, matrix: Vec<MatrixJob>) -> Build {
        Build {
            id,
            number: id.to_string(),
            commit: format!("sha{id}"),
            branch: "master".to_string(),
            event_type: event_type.to_string(),
            message: format!("message {id}"),
            build_info: Some(BuildDetail {
                result,
                event_type: event_type.to_string(),
                committed_at: Some("2019-01-01T00:00:00Z".to_string()),
                compare_url: Some(format!("https://github.com/o/r/compare/{id}")),
                committer_name: Some("Committer".to_string()),
                matrix,
            }),
        }
    }

    mod flatten_jobs {
        use super::*;

        #[test]
        fn produces_one_record_per_matrix_entry() {
            let builds: Vec<Build> = (1..=3)
                .map(|b| {
                    let matrix = (0..4)
                        .map(|j| create_job(b * 10 + j, Some(0), json!({"language": "java"})))
                        .collect();
                    create_build(b, "push", Some(0), matrix)
                })
                .collect();

            let jobs = flatten_jobs(&builds).unwrap();
            assert_eq!(jobs.len(), 12, "3 builds x 4 jobs should give 12 records");
        }

        #[test]
        fn joins_build_commit_and_job_fields() {
            let builds = vec![create_build(
                7,
                "pull_request",
                Some(1),
                vec![create_job(70, Some(1), json!({"language": "python"}))],
            )];

            let jobs = flatten_jobs(&builds).unwrap();
            let job = &jobs[0];

            assert_eq!(job.job_id, 70);
            assert_eq!(job.job_number, "1.70");
            assert_eq!(job.result, Some(1));
            assert_eq!(job.build_id, 7);
            assert_eq!(job.number, "7");
            assert_eq!(job.commit, "sha7");
            assert_eq!(job.message, "message 7");
            assert_eq!(job.branch, "master");
            assert_eq!(job.event_type, "pull_request");
            assert_eq!(job.compare_at.as_deref(), Some("https://github.com/o/r/compare/7"));
            assert_eq!(job.committer_name.as_deref(), Some("Committer"));
            assert_eq!(job.language, "python");
        }

        #[test]
        fn keeps_build_then_matrix_order() {
            let builds = vec![
                create_build(2, "push", Some(0), vec![create_job(21, Some(0), json!({})), create_job(22, Some(0), json!({}))]),
                create_build(1, "push", Some(0), vec![create_job(11, Some(0), json!({}))]),
            ];

            let ids: Vec<u64> = flatten_jobs(&builds).unwrap().iter().map(|j| j.job_id).collect();
            assert_eq!(ids, vec![21, 22, 11]);
        }

        #[test]
        fn defaults_missing_language_to_ruby() {
            let builds = vec![create_build(
                1,
                "push",
                Some(0),
                vec![
                    create_job(1, Some(0), json!({"os": "linux"})),
                    create_job(2, Some(0), json!({"language": 3})),
                ],
            )];

            let jobs = flatten_jobs(&builds).unwrap();
            assert!(jobs.iter().all(|j| j.language == "ruby"));
        }

        #[test]
        fn fails_on_build_without_info() {
            let mut build = create_build(5, "push", Some(0), vec![]);
            build.build_info = None;

            let err = flatten_jobs(&[build]).unwrap_err();
            assert!(err.to_string().contains("Build 5 has no build info"));
        }
    }

    mod mining_progress {
        use super::*;

        #[test]
        fn successful_build_is_never_failed() {
            let builds = vec![create_build(1, "push", Some(0), vec![create_job(1, Some(0), json!({}))])];

            let progress = MiningProgress::from_builds(&builds, 1);
            assert_eq!(progress.failed_builds, 0);
            assert_eq!(progress.failed_pr_builds, 0);
            assert_eq!(progress.failed_jobs, 0);
        }

        #[test]
        fn splits_failures_by_event_type() {
            let builds = vec![
                create_build(1, "push", Some(1), vec![create_job(1, Some(1), json!({})), create_job(2, Some(0), json!({}))]),
                create_build(2, "pull_request", Some(1), vec![create_job(3, None, json!({})), create_job(4, Some(2), json!({}))]),
                create_build(3, "pull_request", Some(0), vec![create_job(5, Some(0), json!({}))]),
                create_build(4, "cron", None, vec![create_job(6, None, json!({}))]),
            ];

            let progress = MiningProgress::from_builds(&builds, 6);
            assert_eq!(
                progress,
                MiningProgress {
                    builds: 4,
                    jobs: 6,
                    failed_builds: 2,
                    failed_jobs: 2,
                    failed_pr_builds: 1,
                    failed_pr_jobs: 2,
                }
            );
        }

        #[test]
        fn missing_job_result_counts_as_failure() {
            let builds = vec![create_build(1, "push", Some(0), vec![create_job(1, None, json!({}))])];

            let progress = MiningProgress::from_builds(&builds, 1);
            assert_eq!(progress.failed_builds, 0);
            assert_eq!(progress.failed_jobs, 1);
        }

        #[test]
        fn empty_builds_give_zero_counters() {
            assert_eq!(MiningProgress::from_builds(&[], 0), MiningProgress::default());
        }
    }
}
