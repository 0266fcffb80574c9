// Copyright 2025 coScene
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

mod common;

use common::{as_exporters, MockExporter};
use fleet_export::exporter::{Exporter, MultiExporter};
use fleet_export::{ExportError, LogType, StaticSettings};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

#[tokio::test]
async fn test_all_succeed() {
    let a = MockExporter::new("a");
    let b = MockExporter::new("b");
    let multi = MultiExporter::new(as_exporters(&[a.clone(), b.clone()]));

    multi
        .export(&CancellationToken::new(), LogType::Status, b"[]", "prod", "u1")
        .await
        .unwrap();

    assert_eq!(a.export_count(), 1);
    assert_eq!(b.export_count(), 1);
}

#[tokio::test]
async fn test_one_failure_still_invokes_every_member() {
    let members = vec![
        MockExporter::new("stdout"),
        MockExporter::failing("kafka"),
        MockExporter::new("s3"),
        MockExporter::new("archive"),
    ];
    let multi = MultiExporter::new(as_exporters(&members));

    let err = multi
        .export(&CancellationToken::new(), LogType::Result, b"[]", "prod", "u1")
        .await
        .unwrap_err();

    assert!(matches!(err, ExportError::Aggregate(_)));
    assert_eq!(err.failed_backends(), vec!["kafka"]);
    assert!(err.to_string().starts_with("export errors: ["));
    assert!(err.to_string().contains("kafka unavailable"));
    for member in &members {
        assert_eq!(member.export_count(), 1, "{} not invoked", member.name());
    }
}

#[tokio::test]
async fn test_query_failures_name_every_failing_member() {
    let a = MockExporter::failing("a");
    let b = MockExporter::new("b");
    let c = MockExporter::failing("c");
    let multi = MultiExporter::new(as_exporters(&[a.clone(), b.clone(), c.clone()]));

    let err = multi
        .export_query(&CancellationToken::new(), b"{}", "prod", "u1", "q", 0)
        .await
        .unwrap_err();

    assert_eq!(err.failed_backends(), vec!["a", "c"]);
    assert!(err.to_string().starts_with("export query errors: ["));
    assert_eq!(b.query_count(), 1);
}

#[tokio::test]
async fn test_disabled_member_receives_no_calls() {
    let a = MockExporter::new("a");
    let b = MockExporter::failing("b");
    b.set_enabled(false);
    let multi = MultiExporter::new(as_exporters(&[a.clone(), b.clone()]));

    multi
        .export(&CancellationToken::new(), LogType::Status, b"[]", "prod", "u1")
        .await
        .unwrap();

    assert_eq!(a.export_count(), 1);
    assert_eq!(b.export_count(), 0);
}

#[tokio::test]
async fn test_disabled_multi_is_noop() {
    let a = MockExporter::new("a");
    let multi = MultiExporter::new(as_exporters(&[a.clone()]));
    multi.set_enabled(false);

    multi
        .export(&CancellationToken::new(), LogType::Status, b"[]", "prod", "u1")
        .await
        .unwrap();
    assert_eq!(a.export_count(), 0);
}

#[tokio::test]
async fn test_members_run_concurrently() {
    let delay = Duration::from_millis(200);
    let multi = MultiExporter::new(as_exporters(&[
        MockExporter::slow("a", delay),
        MockExporter::slow("b", delay),
        MockExporter::slow("c", delay),
    ]));

    let started = tokio::time::Instant::now();
    multi
        .export(&CancellationToken::new(), LogType::Status, b"[]", "prod", "u1")
        .await
        .unwrap();

    assert!(started.elapsed() < delay * 3);
}

#[tokio::test]
async fn test_add_exporter_during_in_flight_call() {
    let slow = MockExporter::slow("slow", Duration::from_millis(100));
    let multi = Arc::new(MultiExporter::new(as_exporters(&[slow.clone()])));
    let late = MockExporter::new("late");

    let in_flight = {
        let multi = multi.clone();
        tokio::spawn(async move {
            multi
                .export(&CancellationToken::new(), LogType::Status, b"[]", "prod", "u1")
                .await
        })
    };

    tokio::time::sleep(Duration::from_millis(20)).await;
    multi.add_exporter(late.clone()).await;

    in_flight.await.unwrap().unwrap();
    assert_eq!(slow.export_count(), 1);
    assert_eq!(late.export_count(), 0);
    assert_eq!(multi.exporters().await.len(), 2);

    multi
        .export(&CancellationToken::new(), LogType::Status, b"[]", "prod", "u1")
        .await
        .unwrap();
    assert_eq!(late.export_count(), 1);
}

#[tokio::test]
async fn test_configure_reaches_every_member() {
    let a = MockExporter::new("a");
    let b = MockExporter::failing("b");
    let multi = MultiExporter::new(as_exporters(&[a.clone(), b.clone()]));

    let err = multi.configure(&StaticSettings::new()).await.unwrap_err();

    assert!(err.to_string().starts_with("configuration errors: ["));
    assert_eq!(err.failed_backends(), vec!["b"]);
    assert_eq!(a.configures.load(std::sync::atomic::Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_close_reaches_every_member() {
    let a = MockExporter::new("a");
    let b = MockExporter::new("b");
    b.set_enabled(false);
    let multi = MultiExporter::new(as_exporters(&[a.clone(), b.clone()]));

    multi.close().await.unwrap();

    assert_eq!(a.closes.load(std::sync::atomic::Ordering::SeqCst), 1);
    assert_eq!(b.closes.load(std::sync::atomic::Ordering::SeqCst), 1);
}
