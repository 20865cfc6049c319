//! 이벤트 타입 벤치마크
//!
//! 알림 생성, 직렬화, 채널 전달 비용을 측정합니다.

use criterion::{Criterion, Throughput, black_box, criterion_group, criterion_main};
use serde_json::json;

use watchpost_core::event::{AlertEvent, EventMetadata, MODULE_EVE_PIPELINE, RawEvent};
use watchpost_core::types::Alert;

fn eve_record() -> serde_json::Value {
    json!({
        "timestamp": "2024-01-15T10:30:00.123456+0000",
        "event_type": "alert",
        "src_ip": "192.168.1.100",
        "src_port": 54321,
        "dest_ip": "10.0.0.1",
        "dest_port": 80,
        "proto": "TCP",
        "alert": {
            "action": "allowed",
            "gid": 1,
            "signature_id": 2013028,
            "signature": "ET POLICY curl User-Agent Outbound",
            "severity": 2
        }
    })
}

fn curl_alert() -> Alert {
    Alert {
        timestamp: Some(json!("2024-01-15T10:30:00+00:00")),
        src_ip: Some("192.168.1.100".to_owned()),
        dest_ip: Some("10.0.0.1".to_owned()),
        src_port: Some(54321),
        dest_port: Some(80),
        signature: Some("ET POLICY curl User-Agent Outbound".to_owned()),
        signature_id: Some("signature ID:2013028".to_owned()),
        gid: Some(json!(1)),
        severity: Some(serde_json::Number::from(2)),
        protocol: Some("TCP".to_owned()),
        action: Some("allowed".to_owned()),
        pkt_num: None,
        original: eve_record(),
    }
}

fn bench_creation(c: &mut Criterion) {
    let record = eve_record();
    let alert = curl_alert();

    let mut group = c.benchmark_group("event_creation");
    group.throughput(Throughput::Elements(1));

    group.bench_function("raw_event_new", |b| {
        b.iter(|| RawEvent::new(black_box(record.clone()), black_box(MODULE_EVE_PIPELINE)))
    });
    group.bench_function("alert_event_new", |b| {
        b.iter(|| AlertEvent::new(black_box(alert.clone())))
    });
    group.bench_function("alert_event_with_trace", |b| {
        b.iter(|| AlertEvent::with_trace(black_box(alert.clone()), black_box("trace-id-12345")))
    });
    group.bench_function("metadata_reuse_trace", |b| {
        b.iter(|| EventMetadata::new(black_box("bench-module"), black_box("trace-12345")))
    });
    group.bench_function("metadata_fresh_trace", |b| {
        b.iter(|| EventMetadata::with_new_trace(black_box("bench-module")))
    });

    group.finish();
}

fn bench_serialization(c: &mut Criterion) {
    let alert = curl_alert();

    let mut group = c.benchmark_group("alert_serialization");
    group.throughput(Throughput::Elements(1));

    group.bench_function("alert_to_json", |b| {
        b.iter(|| serde_json::to_string(black_box(&alert)).unwrap())
    });
    group.bench_function("alert_clone", |b| {
        b.iter(|| black_box(&alert).clone())
    });
    group.bench_function("alert_display", |b| {
        b.iter(|| black_box(&alert).to_string())
    });

    group.finish();
}

fn bench_channel(c: &mut Criterion) {
    use tokio::runtime::Runtime;

    let rt = Runtime::new().unwrap();

    let mut group = c.benchmark_group("channel_throughput");
    group.throughput(Throughput::Elements(256));

    // 용량 64 채널에 256건을 흘려 백프레셔 구간까지 포함해 측정
    group.bench_function("pipe_256_alert_events", |b| {
        b.iter(|| {
            rt.block_on(async {
                let (tx, mut rx) = tokio::sync::mpsc::channel::<AlertEvent>(64);

                let producer = tokio::spawn(async move {
                    for _ in 0..256 {
                        tx.send(AlertEvent::new(curl_alert())).await.unwrap();
                    }
                });

                let mut received = 0usize;
                while rx.recv().await.is_some() {
                    received += 1;
                }
                producer.await.unwrap();
                assert_eq!(received, 256);
            })
        })
    });

    group.finish();
}

criterion_group!(benches, bench_creation, bench_serialization, bench_channel);
criterion_main!(benches);
