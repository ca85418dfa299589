#![allow(clippy::unwrap_used)]
// Dashboard behaviour against an in-memory backend, on paused time.

mod common;

use std::time::Duration;

use pretty_assertions::assert_eq;
use serde_json::json;

use lokiwatch_api::{PushEvent, PushKind};
use lokiwatch_core::{AlertKind, Dashboard, DisplayBody, Screen, ViewKind};

use common::{FakeGateway, alert, config, device, signature};

fn twenty_five_alerts() -> FakeGateway {
    FakeGateway::with_alerts((1..=25).map(|id| alert(id, AlertKind::Behavior)).collect())
}

async fn wait_for(mut done: impl FnMut() -> bool) {
    while !done() {
        tokio::task::yield_now().await;
    }
}

fn new_alert_event(id: i64) -> PushEvent {
    PushEvent {
        kind: PushKind::NewAlert,
        data: json!({
            "id": id,
            "timestamp": "2025-03-01T10:00:00",
            "type": "SIGNATURE",
            "src_ip": "10.0.0.7",
            "message": "SQL injection attempt",
        }),
    }
}

// ── Pagination ──────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn twenty_five_alerts_paginate_in_tens() {
    let dash = Dashboard::new(config(), twenty_five_alerts());
    dash.show_screen(Screen::Alerts).await.unwrap();

    let model = dash.display(ViewKind::Alerts).borrow().clone().unwrap();
    assert_eq!(model.summary, "Page 1 of 3 (25 total)");
    assert_eq!(model.body.rows().len(), 10);
    assert!(!model.prev_enabled);
    assert!(model.next_enabled);

    assert!(dash.next_page(ViewKind::Alerts).await.unwrap());
    assert!(dash.next_page(ViewKind::Alerts).await.unwrap());
    let model = dash.display(ViewKind::Alerts).borrow().clone().unwrap();
    assert_eq!(model.summary, "Page 3 of 3 (25 total)");
    assert_eq!(model.body.rows().len(), 5);
    assert!(model.prev_enabled);
    assert!(!model.next_enabled);

    // Already on the last page: no request.
    assert!(!dash.next_page(ViewKind::Alerts).await.unwrap());
    assert_eq!(dash.gateway().list_count(ViewKind::Alerts), 3);
}

#[tokio::test(start_paused = true)]
async fn prev_page_stops_at_one() {
    let dash = Dashboard::new(config(), twenty_five_alerts());
    dash.show_screen(Screen::Alerts).await.unwrap();

    assert!(!dash.prev_page(ViewKind::Alerts).await.unwrap());
    assert_eq!(dash.gateway().list_count(ViewKind::Alerts), 1);

    dash.go_to_page(ViewKind::Alerts, 2).await.unwrap();
    assert!(dash.prev_page(ViewKind::Alerts).await.unwrap());
    assert_eq!(dash.views().state(ViewKind::Alerts).page, 1);
}

#[tokio::test(start_paused = true)]
async fn filter_change_keeps_page_size_and_resets_page() {
    let dash = Dashboard::new(config(), twenty_five_alerts());
    dash.go_to_page(ViewKind::Alerts, 3).await.unwrap();

    dash.set_filter(ViewKind::Alerts, "alert_type", "SIGNATURE")
        .await
        .unwrap();

    let sent = dash.gateway().last_state(ViewKind::Alerts).unwrap();
    assert_eq!(sent.page, 1);
    assert_eq!(sent.page_size, 10);
    assert_eq!(sent.filter("alert_type"), Some("SIGNATURE"));

    let model = dash.display(ViewKind::Alerts).borrow().clone().unwrap();
    assert_eq!(
        model.body,
        DisplayBody::Empty {
            placeholder: "No alerts found".into()
        }
    );
    assert_eq!(model.summary, "Page 1 of 0 (0 total)");
}

// ── Response ordering ───────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn stale_response_never_overwrites_newer_one() {
    let mut alerts: Vec<_> = (1..=6).map(|id| alert(id, AlertKind::Behavior)).collect();
    alerts.extend((7..=10).map(|id| alert(id, AlertKind::Signature)));
    let dash = Dashboard::new(config(), FakeGateway::with_alerts(alerts));
    dash.views()
        .set_filter(ViewKind::Alerts, "alert_type", "BEHAVIOR");

    dash.gateway()
        .delay_next(ViewKind::Alerts, Duration::from_millis(500));
    let slow = {
        let dash = dash.clone();
        tokio::spawn(async move { dash.refresh(ViewKind::Alerts).await })
    };
    wait_for(|| dash.gateway().list_count(ViewKind::Alerts) == 1).await;

    // Newer request with a different filter answers first.
    dash.set_filter(ViewKind::Alerts, "alert_type", "SIGNATURE")
        .await
        .unwrap();
    let applied = slow.await.unwrap().unwrap();
    assert!(!applied);

    let model = dash.display(ViewKind::Alerts).borrow().clone().unwrap();
    assert_eq!(model.summary, "Page 1 of 1 (4 total)");
    assert!(model.body.rows().iter().all(|r| r.title == "SIGNATURE"));
}

#[tokio::test(start_paused = true)]
async fn responses_only_touch_their_own_view() {
    let fake = twenty_five_alerts();
    *fake.signatures.lock().unwrap() = vec![signature(1, "sqli", true)];
    let dash = Dashboard::new(config(), fake);

    dash.gateway()
        .delay_next(ViewKind::Alerts, Duration::from_millis(800));
    let slow_alerts = {
        let dash = dash.clone();
        tokio::spawn(async move { dash.refresh(ViewKind::Alerts).await })
    };
    wait_for(|| dash.gateway().list_count(ViewKind::Alerts) == 1).await;

    dash.show_screen(Screen::Signatures).await.unwrap();
    assert!(slow_alerts.await.unwrap().unwrap());

    let sigs = dash.display(ViewKind::Signatures).borrow().clone().unwrap();
    assert_eq!(sigs.view, ViewKind::Signatures);
    assert_eq!(sigs.summary, "Page 1 of 1 (1 total)");

    let alerts = dash.display(ViewKind::Alerts).borrow().clone().unwrap();
    assert_eq!(alerts.view, ViewKind::Alerts);
    assert_eq!(alerts.summary, "Page 1 of 3 (25 total)");
}

// ── Debounce ────────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn keystroke_burst_fetches_once() {
    let dash = Dashboard::new(config(), twenty_five_alerts());
    dash.show_screen(Screen::Alerts).await.unwrap();
    dash.go_to_page(ViewKind::Alerts, 2).await.unwrap();
    assert_eq!(dash.gateway().list_count(ViewKind::Alerts), 2);

    for typed in ["1", "10", "10.", "10.0", "10.0.0.3"] {
        dash.set_filter_debounced(ViewKind::Alerts, "src_ip", typed);
        // Page resets at once, before any fetch.
        assert_eq!(dash.views().state(ViewKind::Alerts).page, 1);
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    assert_eq!(dash.gateway().list_count(ViewKind::Alerts), 2);

    tokio::time::sleep(Duration::from_millis(400)).await;
    assert_eq!(dash.gateway().list_count(ViewKind::Alerts), 3);

    let sent = dash.gateway().last_state(ViewKind::Alerts).unwrap();
    assert_eq!(sent.filter("src_ip"), Some("10.0.0.3"));
    assert_eq!(sent.page, 1);
}

#[tokio::test(start_paused = true)]
async fn debounced_filter_on_hidden_view_waits_for_switch() {
    let dash = Dashboard::new(config(), twenty_five_alerts());
    assert_eq!(dash.screen(), Screen::Dashboard);

    dash.set_filter_debounced(ViewKind::Alerts, "status", "ONGOING");
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(dash.gateway().list_count(ViewKind::Alerts), 0);

    dash.show_screen(Screen::Alerts).await.unwrap();
    assert_eq!(dash.gateway().list_count(ViewKind::Alerts), 1);
    let sent = dash.gateway().last_state(ViewKind::Alerts).unwrap();
    assert_eq!(sent.filter("status"), Some("ONGOING"));
}

// ── Push invalidation ───────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn push_on_hidden_views_is_suppressed_until_switch() {
    let dash = Dashboard::new(config(), twenty_five_alerts());
    dash.show_screen(Screen::Signatures).await.unwrap();
    let summaries_before = dash.gateway().summary_count();

    for id in 100..103 {
        dash.handle_push(&new_alert_event(id)).await;
    }
    assert_eq!(dash.gateway().list_count(ViewKind::Alerts), 0);
    assert_eq!(dash.gateway().summary_count(), summaries_before);

    dash.show_screen(Screen::Alerts).await.unwrap();
    assert_eq!(dash.gateway().list_count(ViewKind::Alerts), 1);
}

#[tokio::test(start_paused = true)]
async fn push_refreshes_visible_view() {
    let dash = Dashboard::new(config(), twenty_five_alerts());
    let mut announced = dash.new_alerts();

    dash.show_screen(Screen::Alerts).await.unwrap();
    dash.handle_push(&new_alert_event(77)).await;
    assert_eq!(dash.gateway().list_count(ViewKind::Alerts), 2);

    let alert = announced.try_recv().unwrap();
    assert_eq!(alert.id, 77);
    assert_eq!(alert.kind, AlertKind::Signature);

    dash.show_screen(Screen::Dashboard).await.unwrap();
    let summaries = dash.gateway().summary_count();
    dash.handle_push(&new_alert_event(78)).await;
    assert_eq!(dash.gateway().summary_count(), summaries + 1);
    assert_eq!(dash.gateway().list_count(ViewKind::Alerts), 2);
}

#[tokio::test(start_paused = true)]
async fn other_push_events_are_ignored() {
    let dash = Dashboard::new(config(), twenty_five_alerts());
    dash.show_screen(Screen::Alerts).await.unwrap();

    let event = PushEvent {
        kind: PushKind::Other("stats_update".into()),
        data: json!({}),
    };
    dash.handle_push(&event).await;
    assert_eq!(dash.gateway().list_count(ViewKind::Alerts), 1);
}

// ── Summary ─────────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn overlapping_summary_refresh_is_suppressed() {
    let dash = Dashboard::new(config(), twenty_five_alerts());
    *dash.gateway().summary_delay.lock().unwrap() = Duration::from_secs(1);

    let first = {
        let dash = dash.clone();
        tokio::spawn(async move { dash.refresh_summary().await })
    };
    wait_for(|| dash.gateway().summary_count() == 1).await;

    assert!(!dash.refresh_summary().await.unwrap());
    assert!(first.await.unwrap().unwrap());
    assert_eq!(dash.gateway().summary_count(), 1);

    assert!(dash.refresh_summary().await.unwrap());
    assert_eq!(dash.gateway().summary_count(), 2);

    let model = dash.summary().borrow().clone().unwrap();
    assert_eq!(model.status_label, "IDS Online");
    assert_eq!(model.top_ips.rows()[0].field("Alerts"), Some("3 alerts"));
}

#[tokio::test(start_paused = true)]
async fn summary_timer_keeps_running_on_other_screens() {
    let dash = Dashboard::new(config(), twenty_five_alerts());
    dash.start().await.unwrap();
    assert_eq!(dash.gateway().summary_count(), 1);

    tokio::time::sleep(Duration::from_secs(61)).await;
    assert_eq!(dash.gateway().summary_count(), 3);

    dash.show_screen(Screen::Alerts).await.unwrap();
    tokio::time::sleep(Duration::from_secs(90)).await;
    assert_eq!(dash.gateway().summary_count(), 6);
    let summary = dash.summary().borrow().clone().unwrap();
    assert_eq!(summary.counters[0].value, "25");

    dash.shutdown().await;
}

// ── Device polling ──────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn device_poll_runs_only_while_devices_show() {
    let fake = FakeGateway::default();
    *fake.devices.lock().unwrap() = vec![device("esp32-1", "motion_sensor")];
    let dash = Dashboard::new(config(), fake);

    dash.show_screen(Screen::Devices).await.unwrap();
    assert_eq!(dash.gateway().list_count(ViewKind::Devices), 1);

    tokio::time::sleep(Duration::from_secs(25)).await;
    assert_eq!(dash.gateway().list_count(ViewKind::Devices), 3);

    dash.show_screen(Screen::Alerts).await.unwrap();
    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(dash.gateway().list_count(ViewKind::Devices), 3);

    let model = dash.display(ViewKind::Devices).borrow().clone().unwrap();
    assert_eq!(model.body.rows()[0].field("Motion Detected"), Some("NO"));

    dash.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn empty_device_list_has_registration_hint() {
    let dash = Dashboard::new(config(), FakeGateway::default());
    dash.show_screen(Screen::Devices).await.unwrap();

    let model = dash.display(ViewKind::Devices).borrow().clone().unwrap();
    assert_eq!(
        model.body,
        DisplayBody::Empty {
            placeholder: "No IoT devices registered. Devices will appear here when connected."
                .into()
        }
    );
    dash.shutdown().await;
}
