//! Criterion benchmarks for the compile hot paths
//!
//! Covers: selector resolution on a deep tree, event-log replay through a
//! capture session, parameter extraction and four-framework synthesis.

use chrono::DateTime;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use replay_compiler::capture::{DomEvent, EventLog, ReplayOptions, SelectorResolver, TimedEvent};
use replay_compiler::dom::{Document, NodeId};
use replay_compiler::trace::{Click, Coordinates, Interaction, Navigation, TypeText};
use replay_compiler::{extract_parameters, synthesize, Framework, InteractionTrace};

fn make_trace(steps: usize) -> InteractionTrace {
    let ts = DateTime::UNIX_EPOCH;
    let mut interactions = vec![Interaction::Navigation(Navigation {
        url: "https://bench.test/start?session=abc&page=1".into(),
        timestamp: ts,
        relative_time_ms: 0,
    })];
    for i in 0..steps {
        let at = (i as u64 + 1) * 100;
        if i % 2 == 0 {
            interactions.push(Interaction::Click(Click {
                selector: format!("button:has-text(\"Next {}\")", i),
                element_tag: "button".into(),
                coordinates: Coordinates { x: 10.0, y: 20.0 },
                text_snippet: format!("Next {}", i),
                timestamp: ts,
                relative_time_ms: at,
            }));
        } else {
            interactions.push(Interaction::Type(TypeText::new(
                format!("#field-{}", i),
                "input".into(),
                "some typed value",
                "text",
                ts,
                at,
            )));
        }
    }
    InteractionTrace::new("bench", interactions)
}

/// Nested divs with the target at the bottom and no attribute hooks
fn deep_document(depth: usize) -> (Document, NodeId) {
    let mut doc = Document::new();
    let mut parent = doc.append_element(NodeId::DOCUMENT, "html");
    for _ in 0..depth {
        doc.append_element(parent, "span");
        parent = doc.append_element(parent, "div");
    }
    let leaf = doc.append_element(parent, "em");
    (doc, leaf)
}

// ---------------------------------------------------------------------------
// Capture benchmarks
// ---------------------------------------------------------------------------

fn bench_selector_resolution(c: &mut Criterion) {
    let resolver = SelectorResolver::new();
    let mut group = c.benchmark_group("selector_nth_child");
    for depth in [4, 16, 64] {
        let (doc, leaf) = deep_document(depth);
        group.bench_with_input(BenchmarkId::from_parameter(depth), &depth, |b, _| {
            b.iter(|| resolver.resolve(black_box(&doc), black_box(leaf)))
        });
    }
    group.finish();
}

fn bench_event_log_replay(c: &mut Criterion) {
    let mut doc = Document::new();
    let body = doc.append_element(NodeId::DOCUMENT, "body");
    let input = doc.append_element(body, "input");
    doc.set_attribute(input, "name", "q");
    let button = doc.append_element(body, "button");
    doc.set_text(button, "Search");

    let events = (0..500)
        .map(|i| TimedEvent {
            at_ms: i * 10,
            event: if i % 2 == 0 {
                DomEvent::Input { target: input, value: format!("query {}", i) }
            } else {
                DomEvent::Click { target: button, client_x: 1.0, client_y: 1.0 }
            },
        })
        .collect();
    let log = EventLog { url: "https://bench.test/".into(), started_at: None, document: doc, events };
    let options = ReplayOptions::default();

    c.bench_function("event_log_replay_500", |b| {
        b.iter(|| log.replay(black_box(&options)))
    });
}

// ---------------------------------------------------------------------------
// Synthesis benchmarks
// ---------------------------------------------------------------------------

fn bench_parameter_extraction(c: &mut Criterion) {
    let trace = make_trace(200);
    c.bench_function("extract_parameters_200", |b| {
        b.iter(|| extract_parameters(black_box(&trace)))
    });
}

fn bench_synthesis(c: &mut Criterion) {
    let mut group = c.benchmark_group("synthesize_all_frameworks");
    for steps in [10, 100, 1000] {
        let trace = make_trace(steps);
        group.bench_with_input(BenchmarkId::from_parameter(steps), &trace, |b, trace| {
            b.iter(|| synthesize(black_box(trace), &Framework::ALL))
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_selector_resolution,
    bench_event_log_replay,
    bench_parameter_extraction,
    bench_synthesis
);
criterion_main!(benches);
