//! Permission authority HTTP contract
//!
//! `POST /permissions/request` creates a grant, `GET /permissions/{id}`
//! reports its status.

use reqwest::Method;
use std::time::Duration;

use super::types::GrantRecord;
use crate::transport::RequestExecutor;

/// Grant creation endpoint
pub const GRANT_REQUEST_PATH: &str = "/permissions/request";

/// Status endpoint for one grant
pub fn grant_path(id: &str) -> String {
    format!("/permissions/{}", urlencoding::encode(id.trim()))
}

/// Fetch a grant's current record.
///
/// `None` covers every way the lookup can fail: transport error, non-2xx
/// status, or a body that is not a grant object.
pub(crate) async fn fetch_grant(
    executor: &RequestExecutor,
    id: &str,
    limit: Option<Duration>,
) -> Option<GrantRecord> {
    let path = grant_path(id);
    let exchange = match limit {
        Some(limit) => executor.execute_within(Method::GET, &path, None, limit).await,
        None => executor.execute(Method::GET, &path, None).await,
    };

    if !exchange.is_success() {
        return None;
    }
    exchange.body().and_then(GrantRecord::from_value)
}
