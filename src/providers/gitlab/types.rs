use serde::Deserialize;

/// Numeric id of a GitLab CI job.
pub type JobId = u64;

/// Outcome of the most recent pipeline on the project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineStatus {
    /// `true` only when GitLab reports the pipeline as `success`
    pub is_success: bool,
    pub pipeline_id: u64,
    /// Branch or tag the pipeline ran for
    pub source_ref: String,
}

/// `GET /projects/:id/pipelines/latest` response body, reduced to the fields
/// the report needs.
#[derive(Debug, Deserialize)]
pub(super) struct PipelineResponse {
    pub status: String,
    pub id: u64,
    #[serde(rename = "ref")]
    pub ref_: String,
}

impl From<PipelineResponse> for PipelineStatus {
    fn from(pipeline: PipelineResponse) -> Self {
        Self {
            is_success: pipeline.status == "success",
            pipeline_id: pipeline.id,
            source_ref: pipeline.ref_,
        }
    }
}

/// One element of the `GET /projects/:id/pipelines/:id/jobs` array.
#[derive(Debug, Deserialize)]
pub(super) struct JobResponse {
    pub id: JobId,
}
