use reqwest::Response;

use crate::error::{ReportError, Result};

use super::types::{JobId, JobResponse, PipelineResponse, PipelineStatus};

/// Reads the pipeline status out of a `pipelines/latest` response.
///
/// # Errors
///
/// Returns [`ReportError::Parse`] if the body is not an object carrying
/// `status`, `id` and `ref`.
pub async fn pipeline_status(response: Response) -> Result<PipelineStatus> {
    let body = read_body(response, "pipeline parameters").await?;
    decode_pipeline_status(&body)
}

/// Reads the id of the first job out of a `pipelines/:id/jobs` response.
///
/// # Errors
///
/// Returns [`ReportError::Parse`] if the body is not a non-empty array whose
/// first element has an `id`.
pub async fn latest_job_id(response: Response) -> Result<JobId> {
    let body = read_body(response, "job parameters").await?;
    decode_latest_job_id(&body)
}

/// Returns the job log body untouched.
///
/// # Errors
///
/// Returns [`ReportError::Parse`] if the body cannot be read as text.
pub async fn job_log(response: Response) -> Result<String> {
    read_body(response, "logs").await
}

async fn read_body(response: Response, context: &'static str) -> Result<String> {
    response
        .text()
        .await
        .map_err(|e| ReportError::parse(context, e))
}

pub(super) fn decode_pipeline_status(body: &str) -> Result<PipelineStatus> {
    serde_json::from_str::<PipelineResponse>(body)
        .map(PipelineStatus::from)
        .map_err(|e| ReportError::parse("pipeline parameters", e))
}

pub(super) fn decode_latest_job_id(body: &str) -> Result<JobId> {
    // Only the first job is decoded; later elements may have any shape.
    let jobs: Vec<serde_json::Value> =
        serde_json::from_str(body).map_err(|e| ReportError::parse("job parameters", e))?;

    let first = jobs
        .into_iter()
        .next()
        .ok_or_else(|| ReportError::parse("job parameters", "pipeline has no jobs"))?;

    serde_json::from_value::<JobResponse>(first)
        .map(|job| job.id)
        .map_err(|e| ReportError::parse("job parameters", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    mod decode_pipeline_status {
        use super::*;

        #[test]
        fn success_status_is_ready() {
            let status =
                decode_pipeline_status(r#"{"id": 123, "ref": "main", "status": "success"}"#)
                    .unwrap();
            assert_eq!(
                status,
                PipelineStatus {
                    is_success: true,
                    pipeline_id: 123,
                    source_ref: "main".to_string(),
                }
            );
        }

        #[test]
        fn failed_status_is_not_ready() {
            let status =
                decode_pipeline_status(r#"{"status": "failed", "id": 7, "ref": "dev"}"#).unwrap();
            assert!(!status.is_success);
            assert_eq!(status.pipeline_id, 7);
            assert_eq!(status.source_ref, "dev");
        }

        #[test]
        fn any_other_status_is_not_ready() {
            for value in ["running", "pending", "canceled", "skipped", "Success", "brand_new"] {
                let body = format!(r#"{{"status": "{value}", "id": 1, "ref": "main"}}"#);
                assert!(!decode_pipeline_status(&body).unwrap().is_success, "{value}");
            }
        }

        #[test]
        fn extra_fields_are_ignored() {
            let body = r#"{"status": "success", "id": 9, "ref": "main", "sha": "abc", "web_url": "x"}"#;
            assert!(decode_pipeline_status(body).unwrap().is_success);
        }

        #[test]
        fn missing_fields_are_parse_errors() {
            for body in [
                r#"{"id": 1, "ref": "main"}"#,
                r#"{"status": "success", "ref": "main"}"#,
                r#"{"status": "success", "id": 1}"#,
            ] {
                let err = decode_pipeline_status(body).unwrap_err();
                assert!(matches!(err, ReportError::Parse { .. }), "{body}");
            }
        }

        #[test]
        fn non_object_body_is_a_parse_error() {
            let err = decode_pipeline_status(r#""any text""#).unwrap_err();
            assert!(err.to_string().starts_with("Error parsing pipeline parameters"));
        }
    }

    mod decode_latest_job_id {
        use super::*;

        #[test]
        fn returns_first_job_id() {
            let body = r#"[
                {"id": 123, "status": "success", "stage": "deploy", "name": "deploy-positive", "ref": "main"},
                {"id": 122, "status": "success", "stage": "build", "name": "build", "ref": "main"}
            ]"#;
            assert_eq!(decode_latest_job_id(body).unwrap(), 123);
        }

        #[test]
        fn empty_array_is_a_parse_error() {
            let err = decode_latest_job_id("[]").unwrap_err();
            assert!(matches!(err, ReportError::Parse { context: "job parameters", .. }));
        }

        #[test]
        fn missing_id_is_a_parse_error() {
            let err = decode_latest_job_id(r#"[{"name": "deploy"}]"#).unwrap_err();
            assert!(matches!(err, ReportError::Parse { .. }));
        }

        #[test]
        fn later_jobs_are_not_inspected() {
            let body = r#"[{"id": 5, "name": "deploy"}, {"name": "no id"}, "junk"]"#;
            assert_eq!(decode_latest_job_id(body).unwrap(), 5);
        }

        #[test]
        fn non_integer_id_is_a_parse_error() {
            for body in [r#"[{"id": "5"}]"#, r#"[{"id": -1}]"#, r#"[{"id": 1.5}]"#, "[42]"] {
                let err = decode_latest_job_id(body).unwrap_err();
                assert!(
                    matches!(err, ReportError::Parse { context: "job parameters", .. }),
                    "{body}"
                );
            }
        }

        #[test]
        fn non_array_body_is_a_parse_error() {
            assert!(decode_latest_job_id(r#""any text""#).is_err());
            assert!(decode_latest_job_id(r#"{"id": 1}"#).is_err());
        }
    }
}
