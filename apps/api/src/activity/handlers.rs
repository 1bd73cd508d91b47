use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap},
    Json,
};
use base64::{engine::general_purpose::STANDARD, Engine};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::activity::{LogChannel, LogEntry};
use crate::config::Config;
use crate::errors::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct LogsQuery {
    pub date: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LogsResponse {
    pub logs: Vec<LogEntry>,
}

/// Splits an `Authorization: Basic ...` header value into user and password.
fn basic_credentials(value: &str) -> Option<(String, String)> {
    let encoded = value.strip_prefix("Basic ")?.trim();
    let decoded = String::from_utf8(STANDARD.decode(encoded).ok()?).ok()?;
    let (user, password) = decoded.split_once(':')?;
    Some((user.to_string(), password.to_string()))
}

/// Refuses everything when either credential is unconfigured.
fn authorize(headers: &HeaderMap, config: &Config) -> Result<(), AppError> {
    let (Some(expected_user), Some(expected_password)) =
        (config.log_user.as_deref(), config.log_password.as_deref())
    else {
        return Err(AppError::Unauthorized);
    };

    let (user, password) = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(basic_credentials)
        .ok_or(AppError::Unauthorized)?;

    if user == expected_user && password == expected_password {
        Ok(())
    } else {
        Err(AppError::Unauthorized)
    }
}

fn parse_date(date: Option<&str>) -> Result<NaiveDate, AppError> {
    match date {
        None => Ok(Utc::now().date_naive()),
        Some(raw) => NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| {
            AppError::Validation(format!("Invalid date '{raw}'. Expected YYYY-MM-DD"))
        }),
    }
}

/// GET /api/logs/:log_type
///
/// Credentials are checked before the log type.
pub async fn handle_get_logs(
    State(state): State<AppState>,
    Path(log_type): Path<String>,
    Query(params): Query<LogsQuery>,
    headers: HeaderMap,
) -> Result<Json<LogsResponse>, AppError> {
    authorize(&headers, &state.config)?;
    let channel: LogChannel = log_type.parse().map_err(AppError::Validation)?;
    let date = parse_date(params.date.as_deref())?;

    Ok(Json(LogsResponse {
        logs: state.activity.entries(channel, date),
    }))
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    fn config_with_credentials() -> Config {
        Config {
            log_user: Some("admin".to_string()),
            log_password: Some("pa:ss".to_string()),
            ..Config::default()
        }
    }

    fn headers_for(user: &str, password: &str) -> HeaderMap {
        let token = STANDARD.encode(format!("{user}:{password}"));
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_str(&format!("Basic {token}")).unwrap(),
        );
        headers
    }

    #[test]
    fn test_basic_credentials_split_at_first_colon() {
        let token = STANDARD.encode("admin:pa:ss");
        assert_eq!(
            basic_credentials(&format!("Basic {token}")),
            Some(("admin".to_string(), "pa:ss".to_string()))
        );
    }

    #[test]
    fn test_basic_credentials_rejects_malformed_values() {
        assert!(basic_credentials("Bearer abc").is_none());
        assert!(basic_credentials("Basic !!!not-base64").is_none());
        assert!(basic_credentials(&format!("Basic {}", STANDARD.encode("nocolon"))).is_none());
    }

    #[test]
    fn test_authorize_accepts_matching_credentials() {
        let config = config_with_credentials();
        assert!(authorize(&headers_for("admin", "pa:ss"), &config).is_ok());
        assert!(authorize(&headers_for("admin", "wrong"), &config).is_err());
        assert!(authorize(&HeaderMap::new(), &config).is_err());
    }

    #[test]
    fn test_authorize_refuses_when_unconfigured() {
        let config = Config::default();
        assert!(authorize(&headers_for("", ""), &config).is_err());
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(
            parse_date(Some("2024-03-01")).unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
        );
        assert_eq!(parse_date(None).unwrap(), Utc::now().date_naive());
        assert!(parse_date(Some("03/01/2024")).is_err());
    }
}
