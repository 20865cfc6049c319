//! 정규화 벤치마크
//!
//! eve.json 이벤트 정규화와 일괄 가져오기의 처리량을 측정합니다.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use serde_json::Value;
use watchpost_eve_pipeline::{import_events, normalize, should_emit};

/// 표준 Suricata alert 이벤트 (기본 키 사용)
const ALERT_STANDARD: &str = r#"{"timestamp":"2024-01-15T12:00:00.123456+0000","flow_id":1234567890,"event_type":"alert","src_ip":"192.168.1.100","src_port":54321,"dest_ip":"10.0.0.5","dest_port":443,"proto":"TCP","alert":{"action":"allowed","gid":1,"signature_id":2001234,"rev":5,"signature":"ET SCAN Suspicious inbound to mySQL port 3306","category":"Potentially Bad Traffic","severity":2},"flow":{"pkts_toserver":10,"pkts_toclient":8,"bytes_toserver":1420,"bytes_toclient":980}}"#;

/// 폴백 체인을 끝까지 타는 이벤트 (대체 키 + src_ap 분해)
const ALERT_FALLBACK_HEAVY: &str = r#"{"time":1700000000,"event_type":"alert","src_addr":"172.16.0.9","dst_host":"203.0.113.44","sport":8080,"dport":9090,"Event":{"ip_source":"10.1.1.1","priority_id":3,"ip_proto":"6","signature_id":555,"generator_id":1,"event_id":42,"packet_action":"was-dropped","event_microsecond":250000},"src_ap":"172.16.0.9:8080","dst_ap":"203.0.113.44:9090"}"#;

/// DNS 이벤트 (경량 변환 경로)
const DNS_EVENT: &str = r#"{"timestamp":"2024-01-15T12:00:01.000000+0000","event_type":"dns","src_ip":"192.168.1.100","src_port":53211,"dest_ip":"8.8.8.8","dest_port":53,"proto":"UDP","dns":{"type":"query","id":31337,"rrname":"telemetry.example.com","rrtype":"A","tx_id":0}}"#;

/// 제외 대상 stats 이벤트
const STATS_EVENT: &str = r#"{"timestamp":"2024-01-15T12:00:02.000000+0000","event_type":"stats","stats":{"uptime":3600,"capture":{"kernel_packets":123456,"kernel_drops":0}}}"#;

fn parse(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap()
}

fn bench_normalize(c: &mut Criterion) {
    let standard = parse(ALERT_STANDARD);
    let fallback_heavy = parse(ALERT_FALLBACK_HEAVY);
    let dns = parse(DNS_EVENT);

    let mut group = c.benchmark_group("normalize");

    // 기본 키만 사용하는 alert
    group.throughput(Throughput::Elements(1));
    group.bench_function("standard_alert", |b| {
        b.iter(|| normalize(black_box(&standard)))
    });

    // 폴백 체인을 끝까지 타는 alert
    group.bench_function("fallback_heavy", |b| {
        b.iter(|| normalize(black_box(&fallback_heavy)))
    });

    // DNS 경량 변환
    group.bench_function("dns_event", |b| b.iter(|| normalize(black_box(&dns))));

    // 1000건 반복 처리량
    group.throughput(Throughput::Elements(1000));
    group.bench_function("throughput_1000", |b| {
        b.iter(|| {
            for _ in 0..1000 {
                normalize(black_box(&standard));
            }
        })
    });

    group.finish();
}

fn bench_should_emit(c: &mut Criterion) {
    let alert = parse(ALERT_STANDARD);
    let stats = parse(STATS_EVENT);

    let mut group = c.benchmark_group("should_emit");
    group.throughput(Throughput::Elements(1));

    group.bench_function("alert", |b| b.iter(|| should_emit(black_box(&alert))));
    group.bench_function("stats", |b| b.iter(|| should_emit(black_box(&stats))));

    group.finish();
}

fn bench_import(c: &mut Criterion) {
    // 100라인 NDJSON 배치와 동일 내용의 JSON 배열
    let mut ndjson = String::new();
    for i in 0..100 {
        if i % 10 == 0 {
            ndjson.push_str(STATS_EVENT);
        } else {
            ndjson.push_str(ALERT_STANDARD);
        }
        ndjson.push('\n');
    }

    let elements: Vec<Value> = ndjson.lines().map(parse).collect();
    let array = serde_json::to_string(&elements).unwrap();

    let mut group = c.benchmark_group("import");
    group.throughput(Throughput::Elements(100));

    group.bench_with_input(BenchmarkId::new("format", "ndjson"), &ndjson, |b, input| {
        b.iter(|| import_events(black_box(input)).unwrap())
    });

    group.bench_with_input(BenchmarkId::new("format", "array"), &array, |b, input| {
        b.iter(|| import_events(black_box(input)).unwrap())
    });

    group.finish();
}

criterion_group!(benches, bench_normalize, bench_should_emit, bench_import);
criterion_main!(benches);
