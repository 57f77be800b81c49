use std::sync::Arc;

use anyhow::Result;
use otatrack_notify::{
    DESCRIPTION_MAX_LEN, MESSAGE_MAX_LEN, Notification, NotifyError, TelegramConfig,
    TelegramNotifier, TelegraphClient,
};
use serde_json::{Value, json};
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TOKEN: &str = "123:abc";

fn notification(description: String) -> Notification {
    Notification::new(
        "TECNO KM9",
        "KM9-H811-U-OP-240215V321",
        description,
        "1.2 GB",
        "TECNO/KM9-OP/TECNO-KM9:14/UP1A.231005.007/240215V321:user/release-keys",
        "https://android.googleapis.com/packages/ota/abc.zip",
    )
}

fn notifier(server: &MockServer) -> Result<TelegramNotifier> {
    Ok(TelegramNotifier::new(
        TelegramConfig::new(TOKEN, "-100200").with_api_base(server.uri()),
    )?)
}

async fn sent_text(server: &MockServer) -> Result<String> {
    let requests = server.received_requests().await.unwrap_or_default();
    let message = requests
        .iter()
        .rev()
        .find(|request| request.url.path().ends_with("/sendMessage"))
        .ok_or_else(|| anyhow::anyhow!("no sendMessage request"))?;
    let body: Value = message.body_json()?;
    Ok(body
        .get("text")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string())
}

#[tokio::test]
async fn sends_html_message_with_button() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("/bot{TOKEN}/sendMessage")))
        .and(body_partial_json(json!({
            "chat_id": "-100200",
            "parse_mode": "html",
            "disable_web_page_preview": true,
            "reply_markup": { "inline_keyboard": [[{
                "text": "Google OTA Link",
                "url": "https://android.googleapis.com/packages/ota/abc.zip"
            }]]}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": true })))
        .expect(1)
        .mount(&server)
        .await;

    let report = notifier(&server)?
        .send(&notification("<small>Camera</small><br>fixes".to_string()))
        .await?;
    assert!(!report.truncated);
    assert!(sent_text(&server).await?.contains("\n\nCamera\nfixes\n\n<b>Size:</b> 1.2 GB\n"));
    Ok(())
}

#[tokio::test]
async fn oversized_description_goes_to_telegraph() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/createPage"))
        .and(body_partial_json(json!({
            "access_token": "tg-token",
            "title": "Update Details: KM9-H811-U-OP-240215V321",
            "author_name": "TRANSSION Updates Tracker",
            "return_content": false
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ok": true,
            "result": { "url": "https://telegra.ph/Update-Details-02-15" }
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(format!("/bot{TOKEN}/sendMessage")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": true })))
        .mount(&server)
        .await;

    let telegraph =
        TelegraphClient::new("tg-token")?.with_api_url(format!("{}/createPage", server.uri()));
    let notifier = notifier(&server)?.with_paste_service(Arc::new(telegraph));
    let long = "Improved system stability. ".repeat(200);
    let report = notifier.send(&notification(long)).await?;

    assert!(report.truncated);
    assert_eq!(
        report.page_url.as_deref(),
        Some("https://telegra.ph/Update-Details-02-15")
    );
    let text = sent_text(&server).await?;
    assert!(text.chars().count() <= MESSAGE_MAX_LEN);
    assert!(text.contains(
        "... <a href=\"https://telegra.ph/Update-Details-02-15\">Read full changelogs</a>\n\n<b>Size:</b>"
    ));
    Ok(())
}

#[tokio::test]
async fn failed_page_falls_back_to_ellipsis() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/createPage"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ok": false,
            "error": "ACCESS_TOKEN_INVALID"
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(format!("/bot{TOKEN}/sendMessage")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": true })))
        .mount(&server)
        .await;

    let telegraph =
        TelegraphClient::new("bad")?.with_api_url(format!("{}/createPage", server.uri()));
    let notifier = notifier(&server)?.with_paste_service(Arc::new(telegraph));
    let report = notifier.send(&notification("word ".repeat(1000))).await?;

    assert!(report.truncated);
    assert_eq!(report.page_url, None);
    let text = sent_text(&server).await?;
    assert!(text.contains("...\n\n<b>Size:</b>"));
    assert!(!text.contains("Read full changelogs"));
    Ok(())
}

#[tokio::test]
async fn description_within_budget_is_sent_whole() -> Result<()> {
    let server = MockServer::start().await;
    let notifier = notifier(&server)?;
    let description = "x".repeat(DESCRIPTION_MAX_LEN);
    let (text, report) = notifier.prepare(&notification(description.clone())).await;
    assert!(!report.truncated);
    assert!(text.contains(&description));
    Ok(())
}

#[tokio::test]
async fn http_error_is_reported() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(400).set_body_string("Bad Request: chat not found"))
        .mount(&server)
        .await;

    let result = notifier(&server)?.send(&notification("fixes".to_string())).await;
    match result {
        Err(NotifyError::Api { status, body }) => {
            assert_eq!(status, 400);
            assert!(body.contains("chat not found"));
        }
        other => anyhow::bail!("unexpected result: {other:?}"),
    }
    Ok(())
}

#[tokio::test]
async fn ok_false_is_rejected() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ok": false,
            "description": "message is too long"
        })))
        .mount(&server)
        .await;

    let result = notifier(&server)?.send(&notification("fixes".to_string())).await;
    assert!(matches!(result, Err(NotifyError::Rejected(reason)) if reason == "message is too long"));
    Ok(())
}
