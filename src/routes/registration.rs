//! Reviewer self-registration.
//!
//! The browser submits `multipart/form-data` with a JSON `data` part and one
//! or more `credentialFiles`. The form is inspected for validation only; the
//! upstream receives the original bytes, boundary included.

use axum::{
    body::{self, Body, Bytes},
    extract::{FromRequest, Multipart, Request, State},
    http::{header, Extensions, HeaderValue},
    response::Response,
    routing::post,
    Router,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;

use crate::http::boundary::guard;
use crate::http::error::{GatewayError, GatewayResult};
use crate::http::response::{Envelope, Mode};
use crate::http::server::AppState;
use crate::proxy::{pipeline, Caller, UpstreamRequest};

const MAX_CREDENTIAL_FILES: usize = 10;
const MAX_FILE_SIZE: usize = 10 * 1024 * 1024;

pub fn routes() -> Router<AppState> {
    Router::new().route("/api/auth/register/reviewer", post(register_reviewer))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct ReviewerData {
    email: String,
    password: String,
    full_name: String,
    date_of_birth: String,
    education_level: String,
    organization_name: String,
    organization_email: String,
    domain_ids: Option<Vec<String>>,
    specialization_ids: Option<Vec<String>>,
}

impl ReviewerData {
    fn validate(&self) -> GatewayResult<()> {
        let blank = |v: &str| v.trim().is_empty();
        if [&self.email, &self.password, &self.full_name, &self.date_of_birth]
            .iter()
            .any(|v| blank(v))
        {
            return Err(GatewayError::bad_request("Missing required basic fields"));
        }
        if [
            &self.education_level,
            &self.organization_name,
            &self.organization_email,
        ]
        .iter()
        .any(|v| blank(v))
            || self.domain_ids.is_none()
            || self.specialization_ids.is_none()
        {
            return Err(GatewayError::bad_request("Missing required reviewer fields"));
        }

        let domains = self.domain_ids.as_ref().map_or(0, Vec::len);
        if !(1..=3).contains(&domains) {
            return Err(GatewayError::bad_request("Must select 1 to 3 domains"));
        }
        let specializations = self.specialization_ids.as_ref().map_or(0, Vec::len);
        if !(1..=5).contains(&specializations) {
            return Err(GatewayError::bad_request("Must select 1 to 5 specializations"));
        }
        Ok(())
    }
}

/// What the form contained, as far as validation cares.
#[derive(Debug)]
struct ReviewerForm {
    data: ReviewerData,
    files: usize,
}

/// `extensions` come from the inbound request so its body limit applies.
async fn read_form(
    content_type: HeaderValue,
    body: Bytes,
    extensions: Extensions,
) -> GatewayResult<ReviewerForm> {
    let mut request = Request::new(Body::from(body));
    *request.extensions_mut() = extensions;
    request
        .headers_mut()
        .insert(header::CONTENT_TYPE, content_type);
    let mut multipart = Multipart::from_request(request, &())
        .await
        .map_err(|_| GatewayError::bad_request("Invalid form data"))?;

    let mut data = None;
    let mut files = 0;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| GatewayError::bad_request("Invalid form data"))?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("data") => {
                let raw = field
                    .bytes()
                    .await
                    .map_err(|_| GatewayError::bad_request("Invalid form data"))?;
                let parsed: ReviewerData = serde_json::from_slice(&raw)
                    .map_err(|_| GatewayError::bad_request("Invalid data JSON"))?;
                data = Some(parsed);
            }
            Some("credentialFiles") => {
                let file_name = field.file_name().unwrap_or("file").to_string();
                let raw = field
                    .bytes()
                    .await
                    .map_err(|_| GatewayError::bad_request("Invalid form data"))?;
                if raw.len() > MAX_FILE_SIZE {
                    return Err(GatewayError::bad_request(format!(
                        "File \"{file_name}\" exceeds 10MB limit"
                    )));
                }
                files += 1;
            }
            _ => {}
        }
    }

    let data = data.ok_or_else(|| GatewayError::bad_request("Missing data field"))?;
    Ok(ReviewerForm { data, files })
}

fn validate(form: &ReviewerForm) -> GatewayResult<()> {
    form.data.validate()?;
    if form.files == 0 {
        return Err(GatewayError::bad_request(
            "At least one credential file is required",
        ));
    }
    if form.files > MAX_CREDENTIAL_FILES {
        return Err(GatewayError::bad_request("Maximum 10 credential files allowed"));
    }
    Ok(())
}

async fn register_reviewer(
    State(state): State<AppState>,
    caller: Caller,
    request: Request,
) -> Response {
    guard("api/auth/register/reviewer", state.mode(), async {
        let (parts, body) = request.into_parts();
        let content_type = parts
            .headers
            .get(header::CONTENT_TYPE)
            .filter(|ct| {
                ct.to_str()
                    .is_ok_and(|ct| ct.starts_with("multipart/form-data"))
            })
            .cloned()
            .ok_or_else(|| GatewayError::bad_request("Content-Type must be multipart/form-data"))?;

        let body = body::to_bytes(body, usize::MAX)
            .await
            .map_err(|_| GatewayError::bad_request("Invalid form data"))?;
        let form = read_form(content_type.clone(), body.clone(), parts.extensions).await?;
        validate(&form)?;

        if state.is_mock() {
            return Ok(Envelope::created(
                Mode::Mock,
                json!({
                    "userId": format!("user-{}", Utc::now().timestamp_millis()),
                    "email": form.data.email,
                    "fullName": form.data.full_name,
                    "role": "REVIEWER",
                    "status": "PENDING_EMAIL_VERIFY",
                    "accessToken": null,
                    "tokenType": "Bearer",
                }),
            ));
        }

        let upstream =
            UpstreamRequest::post("/api/auth/register/reviewer").raw(body, Some(content_type));
        pipeline::forward_json(state.upstream.as_ref(), &caller, upstream).await
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    const BOUNDARY: &str = "XyZ";

    fn multipart(data: &str, files: usize) -> (HeaderValue, Bytes) {
        let mut body = format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"data\"\r\n\r\n{data}\r\n"
        );
        for i in 0..files {
            body.push_str(&format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"credentialFiles\"; filename=\"cv{i}.pdf\"\r\nContent-Type: application/pdf\r\n\r\n%PDF\r\n"
            ));
        }
        body.push_str(&format!("--{BOUNDARY}--\r\n"));
        let ct = HeaderValue::from_str(&format!("multipart/form-data; boundary={BOUNDARY}")).unwrap();
        (ct, Bytes::from(body))
    }

    fn valid_data() -> String {
        json!({
            "email": "rev@example.com",
            "password": "secret123",
            "fullName": "Rev Iewer",
            "dateOfBirth": "1990-01-01",
            "educationLevel": "PHD",
            "organizationName": "Uni",
            "organizationEmail": "uni@example.com",
            "domainIds": ["d1"],
            "specializationIds": ["s1", "s2"]
        })
        .to_string()
    }

    #[tokio::test]
    async fn test_valid_form_passes() {
        let (ct, body) = multipart(&valid_data(), 2);
        let form = read_form(ct, body, Extensions::new()).await.unwrap();
        assert_eq!(form.files, 2);
        assert!(validate(&form).is_ok());
    }

    #[tokio::test]
    async fn test_missing_files_rejected() {
        let (ct, body) = multipart(&valid_data(), 0);
        let form = read_form(ct, body, Extensions::new()).await.unwrap();
        assert_eq!(
            validate(&form).unwrap_err().to_string(),
            "At least one credential file is required"
        );
    }

    #[tokio::test]
    async fn test_bad_data_json_rejected() {
        let (ct, body) = multipart("{oops", 1);
        let err = read_form(ct, body, Extensions::new()).await.unwrap_err();
        assert_eq!(err.to_string(), "Invalid data JSON");
    }

    #[test]
    fn test_domain_count_bounds() {
        let mut data: ReviewerData = serde_json::from_str(&valid_data()).unwrap();
        data.domain_ids = Some(vec!["a".into(), "b".into(), "c".into(), "d".into()]);
        assert_eq!(
            data.validate().unwrap_err().to_string(),
            "Must select 1 to 3 domains"
        );
    }
}
