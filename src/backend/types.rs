//! Wire types for the resume-builder backend RPC surface.

use serde::{Deserialize, Serialize};

use crate::task::TaskId;

/// A resume file staged for upload.
#[derive(Debug, Clone)]
pub struct ResumeFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl ResumeFile {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
        }
    }

    /// Read a resume from disk, keeping only the file name for the
    /// multipart part.
    pub async fn from_path(path: impl AsRef<std::path::Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "resume".to_string());
        Ok(Self { file_name, bytes })
    }
}

/// Which resume a downstream request refers to.
///
/// A freshly uploaded file is identified by its upload task id; a
/// previously stored resume by the authenticated identity reference.
/// The two are mutually exclusive per run — a request never carries
/// both — which this enum makes structural rather than conventional.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResumeSource {
    Upload(TaskId),
    Stored { email: String },
}

impl ResumeSource {
    pub fn task_id(&self) -> Option<&TaskId> {
        match self {
            Self::Upload(id) => Some(id),
            Self::Stored { .. } => None,
        }
    }

    pub fn email(&self) -> Option<&str> {
        match self {
            Self::Upload(_) => None,
            Self::Stored { email } => Some(email),
        }
    }
}

/// `POST /job_desc` — pair a resume source with job-description text to
/// start match scoring.
#[derive(Debug, Clone, Serialize)]
pub struct JobDescriptionRequest {
    pub job_description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_id: Option<TaskId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl JobDescriptionRequest {
    pub fn new(source: &ResumeSource, job_description: impl Into<String>) -> Self {
        Self {
            job_description: job_description.into(),
            task_id: source.task_id().cloned(),
            email: source.email().map(str::to_string),
        }
    }
}

/// Response to a job-description submission. The match-score task id is
/// a new identifier, distinct from the upload task id.
#[derive(Debug, Clone)]
pub struct JobDescriptionResponse {
    pub match_score_task_id: TaskId,
    pub task_id: Option<TaskId>,
}

/// `POST /final_builder` — pair a resume source with the keyword list
/// for the final rebuild.
#[derive(Debug, Clone, Serialize)]
pub struct FinalBuildRequest {
    pub missing_keywords: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_id: Option<TaskId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl FinalBuildRequest {
    pub fn new(source: &ResumeSource, missing_keywords: Vec<String>) -> Self {
        Self {
            missing_keywords,
            task_id: source.task_id().cloned(),
            email: source.email().map(str::to_string),
        }
    }
}

/// Match-score payload produced by the scoring job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchScoreReport {
    /// Current match percentage against the job description.
    pub match_rate: f32,
    /// Achievable percentage once the missing keywords are worked in.
    pub expected_rate: f32,
    /// Keywords present in the job description but absent from the resume.
    #[serde(default)]
    pub missing_keywords: Vec<String>,
}

/// User profile fields as the lookup endpoint spells them.
#[derive(Debug, Clone, Deserialize)]
pub struct UserDetails {
    pub name: String,
    pub email: String,
    pub phone_number: String,
}

/// Profile fields as the document generator expects them. The lookup
/// endpoint says `phone_number`; the generator wants `phone`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BasicDetails {
    pub name: String,
    pub email: String,
    pub phone: String,
}

impl From<UserDetails> for BasicDetails {
    fn from(details: UserDetails) -> Self {
        Self {
            name: details.name,
            email: details.email,
            phone: details.phone_number,
        }
    }
}

/// `POST /generate-resume` — synchronous document assembly; not a task.
#[derive(Debug, Clone, Serialize)]
pub struct GenerateDocumentRequest {
    pub basic_details: BasicDetails,
    pub resume_data: serde_json::Value,
}

/// The downloadable document reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedDocument {
    pub download_url: String,
}

/// One education entry collected by the profile bootstrap form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Education {
    pub institution: String,
    pub location: String,
    pub degree: String,
    #[serde(rename = "startDate")]
    pub start_date: String,
    #[serde(rename = "endDate")]
    pub end_date: String,
}

/// One certification entry. The backend spells these fields with
/// capitalized keys.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Certification {
    #[serde(rename = "Title")]
    pub title: String,
    #[serde(rename = "Desc")]
    pub description: String,
}

/// `PUT /userDetails/Master-Edu` body.
#[derive(Debug, Clone, Serialize)]
pub struct EducationUpload {
    #[serde(rename = "Education")]
    pub education: Vec<Education>,
    #[serde(rename = "Certifications")]
    pub certifications: Vec<Certification>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upload_source() -> ResumeSource {
        ResumeSource::Upload(TaskId::new("T1").unwrap())
    }

    fn stored_source() -> ResumeSource {
        ResumeSource::Stored {
            email: "user@example.com".to_string(),
        }
    }

    #[test]
    fn job_description_request_carries_task_id_xor_email() {
        let req = JobDescriptionRequest::new(&upload_source(), "desc");
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["task_id"], "T1");
        assert!(json.get("email").is_none());

        let req = JobDescriptionRequest::new(&stored_source(), "desc");
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["email"], "user@example.com");
        assert!(json.get("task_id").is_none());
    }

    #[test]
    fn final_build_request_carries_task_id_xor_email() {
        let req = FinalBuildRequest::new(&upload_source(), vec!["Python".to_string()]);
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["task_id"], "T1");
        assert!(json.get("email").is_none());
        assert_eq!(json["missing_keywords"][0], "Python");

        let req = FinalBuildRequest::new(&stored_source(), vec![]);
        let json = serde_json::to_value(&req).unwrap();
        assert!(json.get("task_id").is_none());
        assert_eq!(json["email"], "user@example.com");
    }

    #[test]
    fn user_details_map_phone_field() {
        let details = UserDetails {
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            phone_number: "+1 555 0100".to_string(),
        };
        let basic = BasicDetails::from(details);
        assert_eq!(basic.phone, "+1 555 0100");
        let json = serde_json::to_value(&basic).unwrap();
        assert!(json.get("phone_number").is_none());
        assert_eq!(json["phone"], "+1 555 0100");
    }

    #[test]
    fn match_score_report_decodes_result_payload() {
        let value = serde_json::json!({
            "match_rate": 62,
            "expected_rate": 88,
            "missing_keywords": ["Python", "Docker"]
        });
        let report: MatchScoreReport = serde_json::from_value(value).unwrap();
        assert_eq!(report.match_rate, 62.0);
        assert_eq!(report.expected_rate, 88.0);
        assert_eq!(report.missing_keywords, vec!["Python", "Docker"]);
    }

    #[tokio::test]
    async fn resume_file_from_path_keeps_name_and_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("my-resume.pdf");
        tokio::fs::write(&path, b"%PDF-1.4").await.unwrap();

        let file = ResumeFile::from_path(&path).await.unwrap();
        assert_eq!(file.file_name, "my-resume.pdf");
        assert_eq!(file.bytes, b"%PDF-1.4");
    }

    #[test]
    fn education_upload_uses_backend_spelling() {
        let upload = EducationUpload {
            education: vec![Education {
                institution: "MIT".to_string(),
                location: "Cambridge".to_string(),
                degree: "BSc".to_string(),
                start_date: "09/2018".to_string(),
                end_date: "06/2022".to_string(),
            }],
            certifications: vec![Certification {
                title: "CKA".to_string(),
                description: "Kubernetes admin".to_string(),
            }],
        };
        let json = serde_json::to_value(&upload).unwrap();
        assert_eq!(json["Education"][0]["startDate"], "09/2018");
        assert_eq!(json["Certifications"][0]["Title"], "CKA");
        assert_eq!(json["Certifications"][0]["Desc"], "Kubernetes admin");
    }
}
