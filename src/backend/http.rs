//! HTTP implementation of [`ResumeBackend`] over reqwest.
//!
//! Response-body error messages are normalized in exactly one place
//! ([`extract_error_message`]); the rest of the crate only ever sees
//! the canonical [`TaskError`] taxonomy.

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::backend::types::*;
use crate::backend::ResumeBackend;
use crate::config::WizardConfig;
use crate::error::TaskError;
use crate::task::{TaskId, TaskStatus};

/// Production backend client.
#[derive(Clone)]
pub struct HttpBackend {
    client: Client,
    /// Separate client for document generation, which runs longer than
    /// a plain RPC.
    generate_client: Client,
    base_url: String,
}

impl HttpBackend {
    pub fn new(config: &WizardConfig) -> Self {
        Self {
            client: Client::builder()
                .timeout(config.request_timeout)
                .build()
                .expect("Failed to build HTTP client"),
            generate_client: Client::builder()
                .timeout(config.generate_timeout)
                .build()
                .expect("Failed to build HTTP client"),
            base_url: config.base_url.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait]
impl ResumeBackend for HttpBackend {
    async fn upload_resume(&self, file: &ResumeFile) -> Result<TaskId, TaskError> {
        debug!(file_name = %file.file_name, size = file.bytes.len(), "Uploading resume");

        let part = Part::bytes(file.bytes.clone()).file_name(file.file_name.clone());
        let form = Form::new().part("resume", part);

        let response = self
            .client
            .post(self.url("/upload_file/"))
            .multipart(form)
            .send()
            .await
            .map_err(|e| TaskError::Submission {
                reason: transport_reason(&e),
            })?;

        if !response.status().is_success() {
            let (status, detail) = rejection_detail(response).await;
            warn!(status, "Resume upload rejected: {detail}");
            return Err(TaskError::Submission {
                reason: format!("{status} - {detail}"),
            });
        }

        #[derive(Deserialize)]
        struct UploadAck {
            #[serde(default)]
            task_id: Option<String>,
        }

        let ack: UploadAck = response.json().await.map_err(|_| TaskError::MalformedResponse {
            what: "upload acknowledgment".to_string(),
        })?;
        let id = TaskId::new(ack.task_id.unwrap_or_default()).map_err(|_| {
            TaskError::MalformedResponse {
                what: "missing task_id".to_string(),
            }
        })?;

        debug!(task_id = %id, "Resume upload accepted");
        Ok(id)
    }

    async fn check_status(&self, id: &TaskId) -> Result<TaskStatus, TaskError> {
        let response = self
            .client
            .get(self.url("/check-status"))
            .query(&[("task_id", id.as_str())])
            .send()
            .await
            .map_err(|e| TaskError::StatusQuery {
                reason: transport_reason(&e),
            })?;

        if !response.status().is_success() {
            let (status, detail) = rejection_detail(response).await;
            return Err(TaskError::StatusQuery {
                reason: format!("{status} - {detail}"),
            });
        }

        // The endpoint returns the bare status string, JSON-quoted or not.
        let text = response.text().await.map_err(|e| TaskError::StatusQuery {
            reason: transport_reason(&e),
        })?;
        let raw = serde_json::from_str::<String>(&text).unwrap_or(text);
        if raw.trim().is_empty() {
            return Err(TaskError::MalformedResponse {
                what: "missing status data".to_string(),
            });
        }

        let status = TaskStatus::parse(&raw)?;
        debug!(task_id = %id, %status, "Task status sampled");
        Ok(status)
    }

    async fn fetch_result(&self, id: &TaskId) -> Result<serde_json::Value, TaskError> {
        let response = self
            .client
            .get(self.url("/get_result"))
            .query(&[("task_id", id.as_str())])
            .send()
            .await
            .map_err(|e| TaskError::ResultFetch {
                reason: transport_reason(&e),
            })?;

        let status = response.status();
        if status.is_client_error() {
            // The job finished but the backend cannot produce a document
            // from this input. Actionable by the user, never retried.
            let (status, detail) = rejection_detail(response).await;
            warn!(task_id = %id, status, "Result rejected as a data problem: {detail}");
            return Err(TaskError::ClientData { status, detail });
        }
        if !status.is_success() {
            let (status, detail) = rejection_detail(response).await;
            return Err(TaskError::ResultFetch {
                reason: format!("{status} - {detail}"),
            });
        }

        let value: serde_json::Value =
            response.json().await.map_err(|_| TaskError::MalformedResponse {
                what: "result body".to_string(),
            })?;
        if value.is_null() {
            return Err(TaskError::ResultFetch {
                reason: "missing result data".to_string(),
            });
        }

        debug!(task_id = %id, "Task result fetched");
        Ok(value)
    }

    async fn submit_job_description(
        &self,
        request: &JobDescriptionRequest,
    ) -> Result<JobDescriptionResponse, TaskError> {
        debug!(
            has_task_id = request.task_id.is_some(),
            has_email = request.email.is_some(),
            job_description_len = request.job_description.len(),
            "Submitting job description"
        );

        let response = self
            .client
            .post(self.url("/job_desc"))
            .json(request)
            .send()
            .await
            .map_err(|e| TaskError::Submission {
                reason: transport_reason(&e),
            })?;

        if !response.status().is_success() {
            let (status, detail) = rejection_detail(response).await;
            return Err(TaskError::Submission {
                reason: format!("{status} - {detail}"),
            });
        }

        #[derive(Deserialize)]
        struct JobDescAck {
            #[serde(default)]
            match_score_task_id: Option<String>,
            #[serde(default)]
            task_id: Option<String>,
        }

        let ack: JobDescAck = response.json().await.map_err(|_| TaskError::MalformedResponse {
            what: "job description acknowledgment".to_string(),
        })?;
        let match_score_task_id = TaskId::new(ack.match_score_task_id.unwrap_or_default())
            .map_err(|_| TaskError::MalformedResponse {
                what: "missing match_score_task_id".to_string(),
            })?;

        debug!(match_score_task_id = %match_score_task_id, "Match scoring started");
        Ok(JobDescriptionResponse {
            match_score_task_id,
            task_id: ack.task_id.and_then(|raw| TaskId::new(raw).ok()),
        })
    }

    async fn submit_final_build(&self, request: &FinalBuildRequest) -> Result<TaskId, TaskError> {
        debug!(
            keywords = request.missing_keywords.len(),
            has_task_id = request.task_id.is_some(),
            has_email = request.email.is_some(),
            "Submitting final build"
        );

        let response = self
            .client
            .post(self.url("/final_builder"))
            .json(request)
            .send()
            .await
            .map_err(|e| TaskError::Submission {
                reason: transport_reason(&e),
            })?;

        if !response.status().is_success() {
            let (status, detail) = rejection_detail(response).await;
            return Err(TaskError::Submission {
                reason: format!("{status} - {detail}"),
            });
        }

        #[derive(Deserialize)]
        struct BuildAck {
            #[serde(default)]
            task_id: Option<String>,
        }

        let ack: BuildAck = response.json().await.map_err(|_| TaskError::MalformedResponse {
            what: "final build acknowledgment".to_string(),
        })?;
        let id = TaskId::new(ack.task_id.unwrap_or_default()).map_err(|_| {
            TaskError::MalformedResponse {
                what: "missing task_id".to_string(),
            }
        })?;

        debug!(task_id = %id, "Final build started");
        Ok(id)
    }

    async fn generate_document(
        &self,
        request: &GenerateDocumentRequest,
    ) -> Result<GeneratedDocument, TaskError> {
        debug!(name = %request.basic_details.name, "Generating document");

        let response = self
            .generate_client
            .post(self.url("/generate-resume"))
            .json(request)
            .send()
            .await
            .map_err(|e| TaskError::Submission {
                reason: transport_reason(&e),
            })?;

        let status = response.status();
        if status.is_client_error() {
            let (status, detail) = rejection_detail(response).await;
            warn!(status, "Document generation rejected as a data problem: {detail}");
            return Err(TaskError::ClientData { status, detail });
        }
        if !status.is_success() {
            let (status, detail) = rejection_detail(response).await;
            return Err(TaskError::Submission {
                reason: format!("{status} - {detail}"),
            });
        }

        #[derive(Deserialize)]
        struct PdfRef {
            #[serde(default)]
            download_url: Option<String>,
        }
        #[derive(Deserialize)]
        struct GenerateAck {
            #[serde(default)]
            pdf: Option<PdfRef>,
        }

        let ack: GenerateAck = response.json().await.map_err(|_| TaskError::MalformedResponse {
            what: "generate acknowledgment".to_string(),
        })?;
        let download_url = ack
            .pdf
            .and_then(|p| p.download_url)
            .filter(|u| !u.is_empty())
            .ok_or_else(|| TaskError::MalformedResponse {
                what: "missing download URL".to_string(),
            })?;

        debug!(%download_url, "Document generated");
        Ok(GeneratedDocument { download_url })
    }

    async fn basic_details(&self, email: &str) -> Result<UserDetails, TaskError> {
        let response = self
            .client
            .get(self.url("/userDetails/details"))
            .query(&[("email", email)])
            .send()
            .await
            .map_err(|e| TaskError::ResultFetch {
                reason: transport_reason(&e),
            })?;

        if !response.status().is_success() {
            let (status, detail) = rejection_detail(response).await;
            return Err(TaskError::ResultFetch {
                reason: format!("{status} - {detail}"),
            });
        }

        let details: UserDetails =
            response.json().await.map_err(|_| TaskError::MalformedResponse {
                what: "missing user details".to_string(),
            })?;
        if details.email.is_empty() {
            return Err(TaskError::MalformedResponse {
                what: "missing user details".to_string(),
            });
        }
        Ok(details)
    }

    async fn fetch_master_data(
        &self,
        email: &str,
    ) -> Result<Option<serde_json::Value>, TaskError> {
        let response = self
            .client
            .get(self.url("/userDetails/Master-data"))
            .query(&[("email", email)])
            .send()
            .await
            .map_err(|e| TaskError::ResultFetch {
                reason: transport_reason(&e),
            })?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            let (status, detail) = rejection_detail(response).await;
            return Err(TaskError::ResultFetch {
                reason: format!("{status} - {detail}"),
            });
        }

        let value: serde_json::Value =
            response.json().await.map_err(|_| TaskError::MalformedResponse {
                what: "master data body".to_string(),
            })?;
        Ok(Some(value))
    }

    async fn update_master_education(
        &self,
        email: &str,
        data: &EducationUpload,
    ) -> Result<(), TaskError> {
        let response = self
            .client
            .put(self.url("/userDetails/Master-Edu"))
            .query(&[("email", email)])
            .json(data)
            .send()
            .await
            .map_err(|e| TaskError::Submission {
                reason: transport_reason(&e),
            })?;

        if !response.status().is_success() {
            let (status, detail) = rejection_detail(response).await;
            return Err(TaskError::Submission {
                reason: format!("{status} - {detail}"),
            });
        }
        Ok(())
    }

    async fn update_master_data(
        &self,
        email: &str,
        data: &serde_json::Value,
    ) -> Result<(), TaskError> {
        let response = self
            .client
            .put(self.url("/userDetails/Master-data"))
            .query(&[("email", email)])
            .json(data)
            .send()
            .await
            .map_err(|e| TaskError::Submission {
                reason: transport_reason(&e),
            })?;

        if !response.status().is_success() {
            let (status, detail) = rejection_detail(response).await;
            return Err(TaskError::Submission {
                reason: format!("{status} - {detail}"),
            });
        }

        #[derive(Deserialize)]
        struct UpdateAck {
            #[serde(default)]
            status: bool,
        }

        let ack: UpdateAck = response.json().await.map_err(|_| TaskError::MalformedResponse {
            what: "missing status flag".to_string(),
        })?;
        if !ack.status {
            return Err(TaskError::Submission {
                reason: "backend reported failure updating profile data".to_string(),
            });
        }
        Ok(())
    }
}

/// Canonical reason string for a transport-level failure.
fn transport_reason(err: &reqwest::Error) -> String {
    if err.is_timeout() {
        "request timed out".to_string()
    } else if err.is_connect() {
        "no response received; check your network connection".to_string()
    } else {
        err.to_string()
    }
}

/// Read a rejected response's status and best-effort error message.
async fn rejection_detail(response: Response) -> (u16, String) {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    let detail = extract_error_message(&body).unwrap_or_else(|| {
        if body.trim().is_empty() {
            format!("HTTP {status}")
        } else {
            body.trim().to_string()
        }
    });
    (status, detail)
}

/// Pull a human-readable message out of an error body.
///
/// Backends spell the field several ways (`error`, `message`, `detail`,
/// or `error.message`); this is the one place that knows all of them.
fn extract_error_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    for key in ["error", "message", "detail"] {
        match value.get(key) {
            Some(serde_json::Value::String(s)) if !s.is_empty() => return Some(s.clone()),
            Some(serde_json::Value::Object(obj)) => {
                if let Some(serde_json::Value::String(s)) = obj.get("message") {
                    if !s.is_empty() {
                        return Some(s.clone());
                    }
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_flat_error_fields() {
        assert_eq!(
            extract_error_message(r#"{"error": "bad file"}"#).as_deref(),
            Some("bad file")
        );
        assert_eq!(
            extract_error_message(r#"{"message": "missing resume"}"#).as_deref(),
            Some("missing resume")
        );
        assert_eq!(
            extract_error_message(r#"{"detail": "unsupported format"}"#).as_deref(),
            Some("unsupported format")
        );
    }

    #[test]
    fn extracts_nested_error_message() {
        let body = r#"{"error": {"code": "BAD_DOC", "message": "cannot read document"}}"#;
        assert_eq!(
            extract_error_message(body).as_deref(),
            Some("cannot read document")
        );
    }

    #[test]
    fn prefers_error_over_later_spellings() {
        let body = r#"{"error": "primary", "message": "secondary"}"#;
        assert_eq!(extract_error_message(body).as_deref(), Some("primary"));
    }

    #[test]
    fn non_json_and_empty_bodies_yield_none() {
        assert_eq!(extract_error_message("<html>oops</html>"), None);
        assert_eq!(extract_error_message(""), None);
        assert_eq!(extract_error_message(r#"{"unrelated": 1}"#), None);
    }

    #[test]
    fn base_url_trailing_slash_is_normalized() {
        let config = WizardConfig {
            base_url: "https://api.example.com/".to_string(),
            ..WizardConfig::default()
        };
        let backend = HttpBackend::new(&config);
        assert_eq!(backend.url("/job_desc"), "https://api.example.com/job_desc");
    }
}
