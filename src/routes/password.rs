//! Three-step password recovery.
//!
//! ```text
//! {email}                   → send OTP
//! {email, otp}              → verify OTP, receive reset token
//! {resetToken, newPassword} → set the new password
//! ```
//!
//! The step is inferred from which fields are present; any other combination
//! is rejected before anything is sent upstream.

use axum::{body::Bytes, extract::State, response::Response, routing::post, Router};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::http::boundary::guard;
use crate::http::error::{GatewayError, GatewayResult};
use crate::http::response::{Envelope, Mode};
use crate::http::server::AppState;
use crate::proxy::{pipeline, Caller, UpstreamRequest};
use crate::routes::parse_json;

const OTP_SENT: &str = "If an account exists with this email, an OTP has been sent";
const PASSWORD_RESET: &str =
    "Password reset successfully. You can now login with your new password";
const MOCK_RESET_TOKEN: &str = "mock-reset-token-12345";
const MIN_PASSWORD_LEN: usize = 8;

pub fn routes() -> Router<AppState> {
    Router::new().route("/api/auth/forgot-password", post(forgot_password))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RecoveryRequest {
    email: Option<String>,
    otp: Option<String>,
    reset_token: Option<String>,
    new_password: Option<String>,
}

#[derive(Debug, PartialEq, Eq)]
enum Step<'a> {
    SendOtp { email: &'a str },
    VerifyOtp { email: &'a str, otp: &'a str },
    Reset { reset_token: &'a str, new_password: &'a str },
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

impl RecoveryRequest {
    fn step(&self) -> GatewayResult<Step<'_>> {
        let step = match (
            present(&self.email),
            present(&self.otp),
            present(&self.reset_token),
            present(&self.new_password),
        ) {
            (Some(email), None, None, None) => Step::SendOtp { email },
            (Some(email), Some(otp), None, None) => {
                if otp.len() != 6 || !otp.bytes().all(|b| b.is_ascii_digit()) {
                    return Err(GatewayError::bad_request("OTP must be 6 digits"));
                }
                Step::VerifyOtp { email, otp }
            }
            (None, None, Some(reset_token), Some(new_password)) => {
                if new_password.chars().count() < MIN_PASSWORD_LEN {
                    return Err(GatewayError::bad_request(
                        "Password must be at least 8 characters",
                    ));
                }
                Step::Reset {
                    reset_token,
                    new_password,
                }
            }
            _ => {
                return Err(GatewayError::bad_request(
                    "Invalid request. Please provide the required fields for the step you want to perform.",
                ))
            }
        };
        Ok(step)
    }
}

async fn forgot_password(State(state): State<AppState>, caller: Caller, body: Bytes) -> Response {
    guard("api/auth/forgot-password", state.mode(), async {
        let request: RecoveryRequest = parse_json(&body)?;
        let step = request.step()?;
        let upstream = state.upstream.as_ref();

        match step {
            Step::SendOtp { email } => {
                if state.is_mock() {
                    return Ok(Envelope::ok(Mode::Mock, json!({ "message": OTP_SENT })));
                }
                let call = UpstreamRequest::post("/api/auth/forgot-password/otp")
                    .json(json!({ "email": email }));
                pipeline::forward_message(upstream, &caller, call, OTP_SENT).await
            }
            Step::VerifyOtp { email, otp } => {
                if state.is_mock() {
                    return Ok(Envelope::ok(
                        Mode::Mock,
                        json!({ "valid": true, "resetToken": MOCK_RESET_TOKEN }),
                    ));
                }
                let call = UpstreamRequest::post("/api/auth/verify-otp")
                    .json(json!({ "email": email, "otp": otp }));
                let envelope = pipeline::forward_json(upstream, &caller, call).await?;
                let body = json!({
                    "valid": envelope.body.get("valid").cloned().unwrap_or(Value::Null),
                    "resetToken": envelope.body.get("resetToken").cloned().unwrap_or(Value::Null),
                });
                Ok(Envelope::new(envelope.status, Mode::Real, body))
            }
            Step::Reset {
                reset_token,
                new_password,
            } => {
                if state.is_mock() {
                    return Ok(Envelope::ok(Mode::Mock, json!({ "message": PASSWORD_RESET })));
                }
                let call = UpstreamRequest::post("/api/auth/reset-password").json(json!({
                    "resetToken": reset_token,
                    "newPassword": new_password,
                }));
                pipeline::forward_message(upstream, &caller, call, PASSWORD_RESET).await
            }
        }
    })
    .await
}
