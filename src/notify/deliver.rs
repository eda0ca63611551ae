//! Delivery of dispatch requests to Apprise gateways and webhooks.

use serde_json::json;
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;

use crate::config::{ChannelKind, NotificationChannel};

use super::DispatchRequest;

const DELIVERY_TIMEOUT: Duration = Duration::from_secs(5);

/// Delivery error types. Reported for logging only; deliveries are never
/// retried.
#[derive(Error, Debug)]
pub enum DeliveryError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("{kind} endpoint returned {status}: {body}")]
    Endpoint {
        kind: &'static str,
        status: u16,
        body: String,
    },
}

/// Deliver one dispatch request over the channel's transport.
pub async fn deliver(
    client: &reqwest::Client,
    channel: &NotificationChannel,
    request: &DispatchRequest,
) -> Result<(), DeliveryError> {
    match &channel.kind {
        ChannelKind::Apprise {
            apprise_api_server,
            recipient_url,
        } => notify_with_apprise(client, apprise_api_server, recipient_url, request).await,
        ChannelKind::Webhook {
            url,
            method,
            headers,
        } => {
            notify_with_webhook(
                client,
                url,
                method.as_deref().unwrap_or("POST"),
                headers.as_ref(),
                request,
            )
            .await
        }
    }
}

async fn notify_with_apprise(
    client: &reqwest::Client,
    api_server: &str,
    recipient_url: &str,
    request: &DispatchRequest,
) -> Result<(), DeliveryError> {
    tracing::info!(
        "Delivery: sending Apprise notification {:?} to {} via {}",
        request.title,
        recipient_url,
        api_server
    );

    let resp = client
        .post(api_server)
        .timeout(DELIVERY_TIMEOUT)
        .json(&json!({
            "urls": recipient_url,
            "title": request.title,
            "body": request.body,
            "type": "warning",
            "format": "text",
        }))
        .send()
        .await?;

    check_response("apprise", resp).await
}

async fn notify_with_webhook(
    client: &reqwest::Client,
    url: &str,
    method: &str,
    headers: Option<&HashMap<String, String>>,
    request: &DispatchRequest,
) -> Result<(), DeliveryError> {
    tracing::info!(
        "Delivery: sending webhook notification {:?} to {}",
        request.title,
        url
    );

    let method = reqwest::Method::from_bytes(method.as_bytes()).unwrap_or(reqwest::Method::POST);
    let mut req = client.request(method, url).timeout(DELIVERY_TIMEOUT);
    if let Some(headers) = headers {
        for (key, value) in headers {
            req = req.header(key, value);
        }
    }

    let resp = req
        .json(&json!({
            "title": request.title,
            "body": request.body,
            "timestamp": chrono::Utc::now().timestamp_millis(),
        }))
        .send()
        .await?;

    check_response("webhook", resp).await
}

async fn check_response(
    kind: &'static str,
    resp: reqwest::Response,
) -> Result<(), DeliveryError> {
    let status = resp.status();
    if status.is_success() {
        tracing::info!("Delivery: {} notification sent, code {}", kind, status.as_u16());
        Ok(())
    } else {
        let body = resp.text().await.unwrap_or_default();
        Err(DeliveryError::Endpoint {
            kind,
            status: status.as_u16(),
            body,
        })
    }
}
