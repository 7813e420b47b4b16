use anyhow::Result;
use chrono::{DateTime, Utc};
use tracing::{debug, error, info, warn};

use crate::alert::{self, AlertMessage};
use crate::config::{Config, Secrets};
use crate::filter::{select_targets, TargetSet};
use crate::hotels::auth::SiteAuth;
use crate::hotels::client::{SearchClient, SearchError};
use crate::telegram::TelegramNotifier;

/// How a single check ended.
#[derive(Debug, Clone, PartialEq)]
pub enum CheckOutcome {
    NoMatches,
    AlertSent { rooms: usize },
    AlertFailed { rooms: usize },
    DryRun { rooms: usize },
    AuthExpired { notified: bool },
    FetchFailed,
    FormatFailed,
}

pub struct Monitor {
    config: Config,
    targets: TargetSet,
    search: SearchClient,
    notifier: TelegramNotifier,
}

impl Monitor {
    pub fn new(config: Config, secrets: Secrets) -> Result<Self> {
        let auth = SiteAuth::new(
            config.hotels.origin.clone(),
            config.hotels.site_instance.clone(),
            secrets.xsrf_token,
            secrets.bsession,
        );
        let search = SearchClient::new(auth, config.hotels.base_url.clone(), config.hotels.timeout_secs)?;
        let notifier = TelegramNotifier::new(&config.telegram, secrets.bot_token, secrets.chat_id)?;
        let targets = TargetSet::new(&config.watch.targets);
        Ok(Self {
            config,
            targets,
            search,
            notifier,
        })
    }

    /// Fetch, filter, format and notify once.
    pub async fn run_once(&self, now: DateTime<Utc>, dry_run: bool) -> CheckOutcome {
        info!(at = %now.format("%Y-%m-%d %H:%M:%S"), "Checking availability");
        let query = self.config.watch.query();

        let rooms = match self.search.search(&query).await {
            Ok(rooms) => rooms,
            Err(SearchError::AuthExpired) => {
                error!("Search returned 403, XSRF_TOKEN/BSESSION have expired");
                let notified = !dry_run && self.notifier.send(&alert::auth_expired_text()).await;
                return CheckOutcome::AuthExpired { notified };
            }
            Err(e) => {
                error!(error = %e, "Availability search failed");
                if self.config.alert.notify_on_fetch_error && !dry_run {
                    let text = alert::monitor_error_text(
                        &self.config.alert.property_name,
                        now,
                        &e.to_string(),
                    );
                    self.notifier.send(&text).await;
                }
                return CheckOutcome::FetchFailed;
            }
        };
        info!(total = rooms.len(), "Rooms in search response");

        let matched = select_targets(rooms, &self.targets);
        if matched.is_empty() {
            info!("No target rooms available");
            return CheckOutcome::NoMatches;
        }
        let count = matched.len();

        let message = match AlertMessage::rooms_available(
            &matched,
            &query,
            &self.config.hotels.booking_url,
            &self.config.alert,
            now,
        ) {
            Ok(m) => {
                for block in m.room_blocks() {
                    debug!(room = %block.name, nightly = %block.nightly, total = ?block.total, "Alert room");
                }
                m.render()
            }
            Err(e) => {
                error!(error = %e, rooms = count, "Failed to build room alert");
                return CheckOutcome::FormatFailed;
            }
        };

        if dry_run {
            info!(rooms = count, "DRY RUN, alert not sent:\n{}", message);
            return CheckOutcome::DryRun { rooms: count };
        }

        if self.notifier.send(&message).await {
            info!(rooms = count, "Alert sent");
            CheckOutcome::AlertSent { rooms: count }
        } else {
            warn!(rooms = count, "Failed to send alert");
            CheckOutcome::AlertFailed { rooms: count }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::{json, Value};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn secrets() -> Secrets {
        Secrets {
            bot_token: "123:abc".into(),
            chat_id: "42".into(),
            xsrf_token: "xsrf".into(),
            bsession: "sess".into(),
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 11, 1, 12, 30, 0).unwrap()
    }

    async fn hotels_responding(template: ResponseTemplate) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/rooms/search"))
            .respond_with(template)
            .mount(&server)
            .await;
        server
    }

    async fn telegram_expecting(calls: u64) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/bot123:abc/sendMessage"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
            .expect(calls)
            .mount(&server)
            .await;
        server
    }

    fn monitor(hotels: &MockServer, telegram: &MockServer, tweak: impl FnOnce(&mut Config)) -> Monitor {
        let mut config = Config::default();
        config.hotels.base_url = hotels.uri();
        config.hotels.timeout_secs = 5;
        config.telegram.base_url = telegram.uri();
        config.telegram.timeout_secs = 5;
        tweak(&mut config);
        Monitor::new(config, secrets()).unwrap()
    }

    async fn sent_texts(telegram: &MockServer) -> Vec<String> {
        telegram
            .received_requests()
            .await
            .unwrap()
            .iter()
            .map(|r| {
                let body: Value = r.body_json().unwrap();
                body["text"].as_str().unwrap().to_string()
            })
            .collect()
    }

    fn room(name: &str, sold_out: bool, amount: Value) -> Value {
        json!({
            "soldOut": sold_out,
            "room": {"name": name, "price": {"amount": amount, "currency": "CHF"}}
        })
    }

    #[tokio::test]
    async fn test_two_targets_one_notification_in_order() {
        let hotels = hotels_responding(ResponseTemplate::new(200).set_body_json(json!([
            room("Studio", false, json!("80")),
            room("2 Room Apartment Ground Floor", false, json!("180")),
            room("Cozy 2 Room Apartment", false, json!("150")),
        ])))
        .await;
        let telegram = telegram_expecting(1).await;

        let outcome = monitor(&hotels, &telegram, |_| {}).run_once(now(), false).await;
        assert_eq!(outcome, CheckOutcome::AlertSent { rooms: 2 });

        let texts = sent_texts(&telegram).await;
        assert_eq!(texts.len(), 1);
        let text = &texts[0];
        let first = text.find("✅ 1. 2 Room Apartment Ground Floor").unwrap();
        let second = text.find("✅ 2. Cozy 2 Room Apartment").unwrap();
        assert!(first < second);
        assert!(text.contains("💵 Total: 720 CHF (4 nights)"));
        assert!(text.contains("💵 Total: 600 CHF (4 nights)"));
        assert!(!text.contains("Studio"));
    }

    #[tokio::test]
    async fn test_oddly_typed_details_still_alert() {
        let hotels = hotels_responding(ResponseTemplate::new(200).set_body_json(json!([
            {"soldOut": false, "room": {"name": "Cozy 2 Room Apartment",
                "price": {"amount": "150", "currency": "CHF"}, "roomId": 17, "maxPersons": 3.0}},
            {"soldOut": null, "room": {"name": "Studio", "price": null}},
        ])))
        .await;
        let telegram = telegram_expecting(1).await;

        let outcome = monitor(&hotels, &telegram, |_| {}).run_once(now(), false).await;
        assert_eq!(outcome, CheckOutcome::AlertSent { rooms: 1 });

        let texts = sent_texts(&telegram).await;
        assert!(texts[0].contains("🆔 Room ID: 17"));
        assert!(texts[0].contains("👥 Max guests: 3.0"));
    }

    #[tokio::test]
    async fn test_all_sold_out_sends_nothing() {
        let hotels = hotels_responding(ResponseTemplate::new(200).set_body_json(json!([
            room("2 Room Apartment Ground Floor", true, json!("180")),
            room("Cozy 2 Room Apartment", true, json!("150")),
        ])))
        .await;
        let telegram = telegram_expecting(0).await;

        let outcome = monitor(&hotels, &telegram, |_| {}).run_once(now(), false).await;
        assert_eq!(outcome, CheckOutcome::NoMatches);
    }

    #[tokio::test]
    async fn test_auth_expired_sends_operator_notice() {
        let hotels = hotels_responding(ResponseTemplate::new(403)).await;
        let telegram = telegram_expecting(1).await;

        let outcome = monitor(&hotels, &telegram, |_| {}).run_once(now(), false).await;
        assert_eq!(outcome, CheckOutcome::AuthExpired { notified: true });

        let texts = sent_texts(&telegram).await;
        assert!(texts[0].starts_with("🚨 Authentication Failed!"));
    }

    #[tokio::test]
    async fn test_server_error_is_silent_by_default() {
        let hotels = hotels_responding(ResponseTemplate::new(500).set_body_string("boom")).await;
        let telegram = telegram_expecting(0).await;

        let outcome = monitor(&hotels, &telegram, |_| {}).run_once(now(), false).await;
        assert_eq!(outcome, CheckOutcome::FetchFailed);
    }

    #[tokio::test]
    async fn test_server_error_notifies_when_enabled() {
        let hotels = hotels_responding(ResponseTemplate::new(500).set_body_string("boom")).await;
        let telegram = telegram_expecting(1).await;

        let outcome = monitor(&hotels, &telegram, |c| c.alert.notify_on_fetch_error = true)
            .run_once(now(), false)
            .await;
        assert_eq!(outcome, CheckOutcome::FetchFailed);

        let texts = sent_texts(&telegram).await;
        assert!(texts[0].contains("Monitor Error"));
        assert!(texts[0].contains("Time: 2025-11-01 12:30 UTC"));
        assert!(texts[0].contains("boom"));
    }

    #[tokio::test]
    async fn test_matched_room_without_price_skips_alert() {
        let hotels = hotels_responding(ResponseTemplate::new(200).set_body_json(json!([
            {"soldOut": false, "room": {"name": "Cozy 2 Room Apartment"}}
        ])))
        .await;
        let telegram = telegram_expecting(0).await;

        let outcome = monitor(&hotels, &telegram, |_| {}).run_once(now(), false).await;
        assert_eq!(outcome, CheckOutcome::FormatFailed);
    }

    #[tokio::test]
    async fn test_notify_failure_is_reported_not_fatal() {
        let hotels = hotels_responding(ResponseTemplate::new(200).set_body_json(json!([
            room("Cozy 2 Room Apartment", false, json!("N/A")),
        ])))
        .await;
        let telegram = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": false})))
            .expect(1)
            .mount(&telegram)
            .await;

        let outcome = monitor(&hotels, &telegram, |_| {}).run_once(now(), false).await;
        assert_eq!(outcome, CheckOutcome::AlertFailed { rooms: 1 });
    }

    #[tokio::test]
    async fn test_dry_run_never_notifies() {
        let hotels = hotels_responding(ResponseTemplate::new(200).set_body_json(json!([
            room("Cozy 2 Room Apartment", false, json!(150)),
        ])))
        .await;
        let telegram = telegram_expecting(0).await;

        let outcome = monitor(&hotels, &telegram, |_| {}).run_once(now(), true).await;
        assert_eq!(outcome, CheckOutcome::DryRun { rooms: 1 });
    }
}
