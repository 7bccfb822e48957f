//! Token lifecycle: login, validation, profile, refresh, logout, and the
//! post-logout check that the old token is rejected.

use pcommon::{BoxFuture, EndpointLabel};
use pharness::{
    BearerAuth, HarnessError, RequestDescriptor, Scenario, ScenarioContext, ScenarioOutcome,
    WarningKind,
};
use ptransport::{BEARER_PREVIEW_CHARS, SecretString};

use crate::api::{
    self, LoginRequest, LoginResponse, RefreshRequest, RefreshResponse, SuccessResponse,
    ValidateResponse, decode, encode,
};
use crate::scenarios::{Optional, call_optional, failure_detail, non_empty};
use crate::util::Credentials;

const LOGIN_PREVIEW_CHARS: usize = 10;

#[derive(Debug, Clone)]
pub struct LoginScenario {
    credentials: Credentials,
}

impl LoginScenario {
    pub fn new(credentials: Credentials) -> Self {
        Self { credentials }
    }
}

impl Scenario for LoginScenario {
    fn name(&self) -> &str {
        "login"
    }

    fn run<'a>(&'a self, ctx: &'a mut ScenarioContext) -> BoxFuture<'a, ScenarioOutcome> {
        Box::pin(async move {
            ctx.reporter.section("Login");
            ctx.reporter
                .info(&format!("Using account {}", self.credentials.login));

            let descriptor = RequestDescriptor::post(api::LOGIN)
                .json(encode(&LoginRequest {
                    username: &self.credentials.login,
                    password: self.credentials.password.expose(),
                }))
                .error_message("login failed")
                .defer_success();
            let label = descriptor.label();

            let outcome = ctx.request(descriptor).await;
            if !outcome.matched {
                return ScenarioOutcome::failed(HarnessError::authentication(failure_detail(
                    &outcome,
                )));
            }

            let Some(body) = outcome.body else {
                let error = ctx.protocol_failure(label, "login response has no body");
                return ScenarioOutcome::failed(error);
            };
            let login = match decode::<LoginResponse>(&body) {
                Ok(login) => login,
                Err(message) => {
                    return ScenarioOutcome::failed(ctx.protocol_failure(label, message));
                }
            };

            let access_token = non_empty(login.access_token);
            let refresh_token = non_empty(login.refresh_token);
            let missing = [
                ("accessToken", access_token.is_none()),
                ("refreshToken", refresh_token.is_none()),
                ("user", login.user.is_none()),
            ]
            .into_iter()
            .filter_map(|(field, absent)| absent.then_some(field))
            .collect::<Vec<_>>();
            let (Some(access_token), Some(refresh_token), Some(user)) =
                (access_token, refresh_token, login.user)
            else {
                let error = ctx.protocol_failure(
                    label,
                    format!("login response is missing {}", missing.join(", ")),
                );
                return ScenarioOutcome::failed(error);
            };

            let access_token = SecretString::new(access_token);
            let refresh_token = SecretString::new(refresh_token);
            let access_preview = access_token.preview(LOGIN_PREVIEW_CHARS);
            let refresh_preview = refresh_token.preview(LOGIN_PREVIEW_CHARS);

            ctx.session.establish(access_token, refresh_token);
            ctx.session.user_id = user.id.map(|id| id.to_string());
            ctx.session.username = user.username;
            ctx.session.email = user.email;
            ctx.session.is_new_user = login.is_new_user.unwrap_or(false);

            ctx.pass(label, "login succeeded");
            ctx.reporter.info(&format!(
                "User id: {}",
                ctx.session.user_id.as_deref().unwrap_or("unknown")
            ));
            ctx.reporter.info(&format!(
                "New user: {}",
                if ctx.session.is_new_user { "yes" } else { "no" }
            ));
            ctx.reporter.info(&format!("Access token: {access_preview}"));
            ctx.reporter.info(&format!("Refresh token: {refresh_preview}"));
            ScenarioOutcome::Passed
        })
    }
}

/// Calls the validate endpoint with the current access token.
async fn validate_access_token(
    ctx: &mut ScenarioContext,
    label: Option<&str>,
) -> Result<(), ScenarioOutcome> {
    let mut descriptor = RequestDescriptor::get(api::VALIDATE)
        .authenticated()
        .error_message("token validation failed")
        .defer_success();
    if let Some(label) = label {
        descriptor = descriptor.with_label(label);
    }
    let label = descriptor.label();

    let outcome = ctx.request(descriptor).await;
    if outcome.skipped {
        return Err(ScenarioOutcome::Skipped("not authenticated".to_string()));
    }
    if !outcome.matched {
        return Err(ScenarioOutcome::failed(HarnessError::authentication(
            failure_detail(&outcome),
        )));
    }

    let validate = outcome
        .body
        .as_ref()
        .map(decode::<ValidateResponse>)
        .transpose();
    match validate {
        Ok(Some(ValidateResponse {
            valid: Some(true), ..
        })) => {
            ctx.pass(label, "token is valid");
            Ok(())
        }
        Ok(_) => Err(ScenarioOutcome::failed(
            ctx.protocol_failure(label, "token was not reported as valid"),
        )),
        Err(message) => Err(ScenarioOutcome::failed(ctx.protocol_failure(label, message))),
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ValidateScenario;

impl Scenario for ValidateScenario {
    fn name(&self) -> &str {
        "validate"
    }

    fn run<'a>(&'a self, ctx: &'a mut ScenarioContext) -> BoxFuture<'a, ScenarioOutcome> {
        Box::pin(async move {
            ctx.reporter.section("Token validation");
            match validate_access_token(ctx, None).await {
                Ok(()) => ScenarioOutcome::Passed,
                Err(outcome) => outcome,
            }
        })
    }
}

/// `GET /api/auth/me`; a 404 is recorded as not implemented.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProfileScenario;

impl Scenario for ProfileScenario {
    fn name(&self) -> &str {
        "profile"
    }

    fn run<'a>(&'a self, ctx: &'a mut ScenarioContext) -> BoxFuture<'a, ScenarioOutcome> {
        Box::pin(async move {
            ctx.reporter.section("Current user profile");
            let descriptor = RequestDescriptor::get(api::PROFILE).authenticated();
            match call_optional(ctx, descriptor).await {
                Optional::Available(outcome) => {
                    ctx.reporter.success("profile fetched");
                    if let Some(body) = &outcome.body {
                        ctx.reporter.debug_json("profile", body);
                    }
                    ScenarioOutcome::Passed
                }
                Optional::NotImplemented => ScenarioOutcome::Passed,
                Optional::Unavailable(error) => ScenarioOutcome::failed(error),
            }
        })
    }
}

/// Exchanges the refresh token for a new access token, then validates it.
#[derive(Debug, Default, Clone, Copy)]
pub struct RefreshScenario;

pub const REFRESHED_VALIDATE_LABEL: &str = "GET /api/auth/validate after refresh";

impl Scenario for RefreshScenario {
    fn name(&self) -> &str {
        "refresh"
    }

    fn run<'a>(&'a self, ctx: &'a mut ScenarioContext) -> BoxFuture<'a, ScenarioOutcome> {
        Box::pin(async move {
            ctx.reporter.section("Token refresh");
            let descriptor = RequestDescriptor::post(api::REFRESH).bearer(BearerAuth::Refresh);
            let label = descriptor.label();

            let Some(refresh_token) = ctx.session.refresh_token.clone() else {
                ctx.skip_steps(
                    [label, EndpointLabel::from(REFRESHED_VALIDATE_LABEL)],
                    "no refresh token",
                );
                return ScenarioOutcome::Skipped("no refresh token".to_string());
            };

            let descriptor = descriptor
                .json(encode(&RefreshRequest {
                    refresh_token: refresh_token.expose(),
                }))
                .error_message("token refresh failed")
                .defer_success();
            let outcome = ctx.request(descriptor).await;
            if !outcome.matched {
                ctx.skip_steps(
                    [EndpointLabel::from(REFRESHED_VALIDATE_LABEL)],
                    "token refresh failed",
                );
                return ScenarioOutcome::failed(HarnessError::authentication(failure_detail(
                    &outcome,
                )));
            }

            let refreshed = outcome
                .body
                .as_ref()
                .and_then(|body| decode::<RefreshResponse>(body).ok())
                .and_then(|refresh| non_empty(refresh.access_token));
            let Some(new_token) = refreshed else {
                let error =
                    ctx.protocol_failure(label, "refresh response is missing accessToken");
                ctx.skip_steps([REFRESHED_VALIDATE_LABEL], "token refresh failed");
                return ScenarioOutcome::failed(error);
            };

            let new_token = SecretString::new(new_token);
            let new_preview = new_token.preview(BEARER_PREVIEW_CHARS);
            let previous = ctx.session.replace_access_token(new_token.clone());

            if previous.as_ref() == Some(&new_token) {
                ctx.reporter
                    .warn("refresh returned the same access token as before");
                ctx.tracker.record_success(label.clone());
                ctx.tracker.record_warning(
                    WarningKind::TokenUnchanged,
                    label,
                    "refresh returned the same access token",
                );
            } else {
                ctx.pass(label, "token refreshed");
                if let Some(previous) = previous {
                    ctx.reporter.info(&format!(
                        "Old token: {}",
                        previous.preview(BEARER_PREVIEW_CHARS)
                    ));
                }
                ctx.reporter.info(&format!("New token: {new_preview}"));
            }

            match validate_access_token(ctx, Some(REFRESHED_VALIDATE_LABEL)).await {
                Ok(()) => ScenarioOutcome::Passed,
                Err(outcome) => outcome,
            }
        })
    }
}

/// Logs out and sets the access token aside for [`InvalidationScenario`].
#[derive(Debug, Default, Clone, Copy)]
pub struct LogoutScenario;

impl Scenario for LogoutScenario {
    fn name(&self) -> &str {
        "logout"
    }

    fn run<'a>(&'a self, ctx: &'a mut ScenarioContext) -> BoxFuture<'a, ScenarioOutcome> {
        Box::pin(async move {
            ctx.reporter.section("Logout");
            let descriptor = RequestDescriptor::post(api::LOGOUT)
                .authenticated()
                .error_message("logout failed")
                .defer_success();
            let label = descriptor.label();

            let outcome = ctx.request(descriptor).await;
            if outcome.skipped {
                return ScenarioOutcome::Skipped("not authenticated".to_string());
            }
            if !outcome.matched {
                return ScenarioOutcome::failed(HarnessError::authentication(failure_detail(
                    &outcome,
                )));
            }

            ctx.session.revoke();
            let confirmed = outcome
                .body
                .as_ref()
                .and_then(|body| decode::<SuccessResponse>(body).ok())
                .and_then(|response| response.success)
                .unwrap_or(false);
            if confirmed {
                ctx.pass(label, "logged out");
                ScenarioOutcome::Passed
            } else {
                ScenarioOutcome::failed(
                    ctx.protocol_failure(label, "logout response did not report success"),
                )
            }
        })
    }
}

/// Replays the logged-out token; anything but a rejection is reported.
#[derive(Debug, Default, Clone, Copy)]
pub struct InvalidationScenario;

pub const INVALIDATION_LABEL: &str = "GET /api/auth/validate after logout";

impl Scenario for InvalidationScenario {
    fn name(&self) -> &str {
        "invalidation"
    }

    fn run<'a>(&'a self, ctx: &'a mut ScenarioContext) -> BoxFuture<'a, ScenarioOutcome> {
        Box::pin(async move {
            ctx.reporter.section("Token invalidation after logout");
            if ctx.session.revoked_access_token.is_none() {
                ctx.skip_steps([INVALIDATION_LABEL], "logout did not complete");
                return ScenarioOutcome::Skipped("logout did not complete".to_string());
            }

            let descriptor = RequestDescriptor::get(api::VALIDATE)
                .bearer(BearerAuth::Revoked)
                .expect_status(401)
                .allow_failure()
                .raw_response()
                .with_label(INVALIDATION_LABEL);
            let outcome = ctx.request(descriptor).await;
            ctx.session.clear();

            if outcome.matched {
                ctx.reporter.success("logged-out token is rejected");
                return ScenarioOutcome::Passed;
            }

            match outcome.status() {
                Some(200) => {
                    let message = "logged-out token is still accepted";
                    ctx.reporter.error(message);
                    ctx.tracker
                        .record_warning(WarningKind::TokenStillValid, INVALIDATION_LABEL, message);
                    ScenarioOutcome::failed(HarnessError::authentication(message))
                }
                Some(status) => {
                    ctx.pass(
                        INVALIDATION_LABEL,
                        &format!("logged-out token is rejected with status {status}"),
                    );
                    ScenarioOutcome::Passed
                }
                None => ScenarioOutcome::failed(HarnessError::transport(failure_detail(&outcome))),
            }
        })
    }
}
