//! Multipart uploads and file downloads
//!
//! Attachment endpoints take `multipart/form-data` instead of JSON, so they
//! bypass [`Session::call`] and go through [`Session::post_multipart`].

use chrono::NaiveDate;
use reqwest::multipart;
use serde_json::{Map, Value};
use std::path::Path;

use super::client::Session;
use super::constants::endpoints;
use super::error::{ApiError, ApiResult};

/// File contents to attach to a multipart request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileUpload {
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub mime: Option<String>,
}

impl FileUpload {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
            mime: None,
        }
    }

    pub fn with_mime(mut self, mime: impl Into<String>) -> Self {
        self.mime = Some(mime.into());
        self
    }

    /// Read a file from disk; the file name part is taken from the path
    pub async fn from_path(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());
        Ok(Self::new(file_name, bytes))
    }
}

/// One named field of a multipart form
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Part {
    Text { name: String, value: String },
    File { name: String, file: FileUpload },
}

impl Part {
    pub fn text(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Text {
            name: name.into(),
            value: value.into(),
        }
    }

    pub fn file(name: impl Into<String>, file: FileUpload) -> Self {
        Self::File {
            name: name.into(),
            file,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Text { name, .. } | Self::File { name, .. } => name,
        }
    }
}

fn into_form(parts: Vec<Part>) -> ApiResult<multipart::Form> {
    let mut form = multipart::Form::new();
    for part in parts {
        form = match part {
            Part::Text { name, value } => form.text(name, value),
            Part::File { name, file } => {
                let mut body = multipart::Part::bytes(file.bytes).file_name(file.file_name);
                if let Some(mime) = &file.mime {
                    body = body
                        .mime_str(mime)
                        .map_err(|_| ApiError::Config(format!("invalid MIME type '{}'", mime)))?;
                }
                form.part(name, body)
            }
        };
    }
    Ok(form)
}

/// Scalars go in as-is; strings without their JSON quotes
fn form_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// A document to store in a customer's dossier
#[derive(Debug, Clone)]
pub struct DossierItemUpload {
    pub customer_id: String,
    pub directory_id: String,
    pub name: String,
    pub status: String,
    pub file: FileUpload,
    pub original_filename: Option<String>,
    pub year: Option<i32>,
    pub period: Option<String>,
    pub created_at: Option<NaiveDate>,
}

impl DossierItemUpload {
    fn into_parts(self) -> Vec<Part> {
        let mut parts = vec![
            Part::text("dossier_directory_id", self.directory_id),
            Part::text("customer_id", self.customer_id),
            Part::text("name", self.name),
        ];
        if let Some(original_filename) = self.original_filename {
            parts.push(Part::text("original_filename", original_filename));
        }
        if let Some(year) = self.year {
            parts.push(Part::text("year", year.to_string()));
        }
        if let Some(period) = self.period {
            parts.push(Part::text("period", period));
        }
        if let Some(created_at) = self.created_at {
            parts.push(Part::text("created_at", created_at.format("%Y-%m-%d").to_string()));
        }
        parts.push(Part::text("status", self.status));
        parts.push(Part::file("resource", self.file));
        parts
    }
}

/// A document attached to a message thread
#[derive(Debug, Clone)]
pub struct ThreadAttachment {
    pub name: String,
    pub status: String,
    pub file: FileUpload,
}

fn thread_parts(
    customer_id: &str,
    thread_id: &str,
    message: &str,
    attachments: Vec<ThreadAttachment>,
) -> Vec<Part> {
    let mut parts = vec![
        Part::text("customer_id", customer_id),
        Part::text("thread_id", thread_id),
        Part::text("message", message),
    ];
    for (i, attachment) in attachments.into_iter().enumerate() {
        parts.push(Part::text(format!("dossier_items[{}][name]", i), attachment.name));
        parts.push(Part::file(format!("dossier_items[{}][resource]", i), attachment.file));
        parts.push(Part::text(format!("dossier_items[{}][status]", i), attachment.status));
    }
    parts
}

fn webshop_parts(
    customer: &Map<String, Value>,
    person: &Map<String, Value>,
    item_name: &str,
    file: FileUpload,
) -> Vec<Part> {
    let mut parts: Vec<Part> = customer
        .iter()
        .map(|(key, value)| Part::text(format!("customer[{}]", key), form_value(value)))
        .collect();
    parts.extend(
        person
            .iter()
            .map(|(key, value)| Part::text(format!("person[{}]", key), form_value(value))),
    );
    parts.push(Part::text("dossier_item[name]", item_name));
    parts.push(Part::file("dossier_item[resource]", file));
    parts
}

impl Session {
    /// POST `parts` as a multipart form to `endpoint`
    pub async fn upload_multipart(&self, endpoint: &str, parts: Vec<Part>) -> ApiResult<Value> {
        let form = into_form(parts)?;
        self.post_multipart(endpoint, form).await
    }

    /// Store a document in a customer's dossier
    pub async fn upload_dossier_item(&self, upload: DossierItemUpload) -> ApiResult<Value> {
        self.upload_multipart(endpoints::DOSSIER_ITEMS, upload.into_parts())
            .await
    }

    /// Post a message to a thread with documents attached
    pub async fn upload_dossier_items_for_thread(
        &self,
        customer_id: &str,
        thread_id: &str,
        message: &str,
        attachments: Vec<ThreadAttachment>,
    ) -> ApiResult<Value> {
        let parts = thread_parts(customer_id, thread_id, message, attachments);
        self.upload_multipart(endpoints::TASKS, parts).await
    }

    /// Create a customer, a person and a dossier item in one webshop order
    pub async fn create_entities_for_webshop(
        &self,
        customer: &Map<String, Value>,
        person: &Map<String, Value>,
        item_name: &str,
        file: FileUpload,
    ) -> ApiResult<Value> {
        let parts = webshop_parts(customer, person, item_name, file);
        self.upload_multipart(endpoints::WEBSHOP, parts).await
    }

    /// Download the stored file of a dossier item
    pub async fn download_dossier_item(&self, dossier_item_id: &str) -> ApiResult<Vec<u8>> {
        let endpoint = format!("{}/{}/download", endpoints::DOSSIER_ITEMS, dossier_item_id);
        self.get_bytes(&endpoint).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_string_contains, header, header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn session(server: &MockServer) -> Session {
        Session::open_with_bearer_token(server.uri(), "test-token", Some("tenant-1".to_string()))
            .unwrap()
    }

    fn pdf() -> FileUpload {
        FileUpload::new("invoice.pdf", b"%PDF-1.4".to_vec()).with_mime("application/pdf")
    }

    #[test]
    fn test_dossier_item_parts_skip_missing_fields() {
        let upload = DossierItemUpload {
            customer_id: "c1".to_string(),
            directory_id: "d1".to_string(),
            name: "Invoice".to_string(),
            status: "published".to_string(),
            file: pdf(),
            original_filename: None,
            year: Some(2024),
            period: None,
            created_at: NaiveDate::from_ymd_opt(2024, 3, 1),
        };

        let names: Vec<_> = upload
            .into_parts()
            .iter()
            .map(|part| part.name().to_string())
            .collect();
        assert_eq!(
            names,
            vec![
                "dossier_directory_id",
                "customer_id",
                "name",
                "year",
                "created_at",
                "status",
                "resource"
            ]
        );
    }

    #[test]
    fn test_thread_parts_are_indexed() {
        let parts = thread_parts(
            "c1",
            "t1",
            "See attached",
            vec![
                ThreadAttachment {
                    name: "a".to_string(),
                    status: "new".to_string(),
                    file: pdf(),
                },
                ThreadAttachment {
                    name: "b".to_string(),
                    status: "new".to_string(),
                    file: pdf(),
                },
            ],
        );

        assert_eq!(parts.len(), 9);
        assert_eq!(parts[6], Part::text("dossier_items[1][name]", "b"));
        assert_eq!(parts[7].name(), "dossier_items[1][resource]");
    }

    #[test]
    fn test_webshop_parts_flatten_maps() {
        let customer = json!({"name": "Acme", "kvk": 1234});
        let person = json!({"first_name": "Jan"});
        let parts = webshop_parts(
            customer.as_object().unwrap(),
            person.as_object().unwrap(),
            "Order",
            pdf(),
        );

        assert!(parts.contains(&Part::text("customer[name]", "Acme")));
        assert!(parts.contains(&Part::text("customer[kvk]", "1234")));
        assert!(parts.contains(&Part::text("person[first_name]", "Jan")));
        assert!(parts.contains(&Part::text("dossier_item[name]", "Order")));
    }

    #[test]
    fn test_invalid_mime_is_rejected() {
        let file = FileUpload::new("x.bin", vec![0]).with_mime("not a mime");
        let err = into_form(vec![Part::file("resource", file)]).unwrap_err();
        assert!(matches!(err, ApiError::Config(_)));
    }

    #[tokio::test]
    async fn test_upload_dossier_item() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/dossier_items"))
            .and(header("Authorization", "Bearer test-token"))
            .and(header("X-Tenant", "tenant-1"))
            .and(header("Accept", "application/json"))
            .and(header_exists("Content-Type"))
            .and(body_string_contains("name=\"dossier_directory_id\""))
            .and(body_string_contains("filename=\"invoice.pdf\""))
            .and(body_string_contains("%PDF-1.4"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "data": {"id": "99", "object": "dossier_item"}
            })))
            .mount(&mock_server)
            .await;

        let session = session(&mock_server);
        let response = session
            .upload_dossier_item(DossierItemUpload {
                customer_id: "c1".to_string(),
                directory_id: "d1".to_string(),
                name: "Invoice".to_string(),
                status: "published".to_string(),
                file: pdf(),
                original_filename: Some("invoice.pdf".to_string()),
                year: None,
                period: None,
                created_at: None,
            })
            .await
            .unwrap();

        assert_eq!(response["data"]["id"], json!("99"));
    }

    #[tokio::test]
    async fn test_upload_error_is_reported() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/tasks"))
            .respond_with(
                ResponseTemplate::new(422)
                    .set_body_json(json!({"errors": {"thread_id": ["not found"]}})),
            )
            .mount(&mock_server)
            .await;

        let session = session(&mock_server);
        let err = session
            .upload_dossier_items_for_thread("c1", "missing", "hi", Vec::new())
            .await
            .unwrap_err();

        assert_eq!(err.status(), Some(422));
        assert_eq!(
            session.last_error().as_deref(),
            Some(r#"{"thread_id":["not found"]}"#)
        );
    }

    #[tokio::test]
    async fn test_download_dossier_item() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/dossier_items/99/download"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"%PDF-1.4".to_vec()))
            .mount(&mock_server)
            .await;

        let session = session(&mock_server);
        let bytes = session.download_dossier_item("99").await.unwrap();
        assert_eq!(bytes, b"%PDF-1.4".to_vec());
    }

    #[tokio::test]
    async fn test_file_upload_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let file_path = dir.path().join("contract.pdf");
        std::fs::write(&file_path, b"contract").unwrap();

        let upload = FileUpload::from_path(&file_path).await.unwrap();
        assert_eq!(upload.file_name, "contract.pdf");
        assert_eq!(upload.bytes, b"contract".to_vec());
        assert_eq!(upload.mime, None);
    }
}
