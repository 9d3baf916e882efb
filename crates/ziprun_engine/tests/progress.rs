use std::net::TcpListener;

use futures_util::{stream, StreamExt};
use pretty_assertions::assert_eq;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};
use ziprun_engine::{
    open_progress, ClassifiedLine, EngineSettings, LineKind, LogSource, Markers, ProgressStream,
    RawLogStream, SseLogSource, StreamError, StreamFailureKind,
};

fn raw(lines: &[&str]) -> RawLogStream {
    let items: Vec<Result<String, StreamError>> =
        lines.iter().map(|line| Ok(line.to_string())).collect();
    Box::pin(stream::iter(items))
}

/// Address of a local port nothing listens on.
fn refused_base_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    format!("http://127.0.0.1:{port}")
}

fn line(raw: &str, kind: LineKind) -> ClassifiedLine {
    ClassifiedLine {
        raw: raw.to_string(),
        kind,
    }
}

async fn collect(stream: ProgressStream) -> Vec<Result<ClassifiedLine, StreamError>> {
    stream.collect().await
}

#[test]
fn markers_classify_in_priority_order() {
    let markers = Markers::default();
    assert_eq!(markers.classify("-- page 3 of 9"), LineKind::Informational);
    assert_eq!(markers.classify("✔ Processing finished."), LineKind::Completed);
    assert_eq!(markers.classify("‼ Error: bad input"), LineKind::Failed);
    // Completion wins when both markers appear.
    assert_eq!(
        markers.classify("Processing finished with Error count 0"),
        LineKind::Completed
    );
    // Matching is case-sensitive.
    assert_eq!(markers.classify("no error here"), LineKind::Informational);
}

#[test]
fn markers_are_configurable() {
    let markers = Markers {
        completion: "Обработка завершена".to_string(),
        failure: "Ошибка".to_string(),
    };
    assert_eq!(
        markers.classify("-- ✔ Обработка завершена."),
        LineKind::Completed
    );
    assert_eq!(markers.classify("-- ‼ Ошибка: нет файлов"), LineKind::Failed);
    assert_eq!(
        markers.classify("Processing finished"),
        LineKind::Informational
    );
}

#[test]
fn empty_marker_never_matches() {
    let markers = Markers {
        completion: String::new(),
        failure: "Error".to_string(),
    };
    assert_eq!(markers.classify("anything"), LineKind::Informational);
}

#[tokio::test]
async fn stream_stops_after_first_terminal_line() {
    let stream = ProgressStream::new(
        raw(&[
            "-- start",
            "Processing finished",
            "Error: should never be seen",
            "-- trailing",
        ]),
        Markers::default(),
    );

    let items = collect(stream).await;
    assert_eq!(
        items,
        vec![
            Ok(line("-- start", LineKind::Informational)),
            Ok(line("Processing finished", LineKind::Completed)),
        ]
    );
}

#[tokio::test]
async fn failure_line_is_terminal_too() {
    let stream = ProgressStream::new(
        raw(&["Error: invalid archive", "Processing finished"]),
        Markers::default(),
    );
    let items = collect(stream).await;
    assert_eq!(items, vec![Ok(line("Error: invalid archive", LineKind::Failed))]);
}

#[tokio::test]
async fn end_without_terminal_line_is_a_transport_error() {
    let mut stream = ProgressStream::new(raw(&["-- one"]), Markers::default());

    assert_eq!(
        stream.next().await,
        Some(Ok(line("-- one", LineKind::Informational)))
    );
    let err = stream.next().await.unwrap().unwrap_err();
    assert_eq!(err.kind, StreamFailureKind::Closed);
    assert!(stream.is_closed());
    assert_eq!(stream.next().await, None);
}

#[tokio::test]
async fn transport_error_ends_stream() {
    let items: Vec<Result<String, StreamError>> = vec![
        Ok("-- one".to_string()),
        Err(StreamError {
            kind: StreamFailureKind::Disconnected,
            message: "connection reset".to_string(),
        }),
        Ok("Processing finished".to_string()),
    ];
    let stream = ProgressStream::new(Box::pin(stream::iter(items)), Markers::default());

    let collected = collect(stream).await;
    assert_eq!(collected.len(), 2);
    assert_eq!(
        collected[1].as_ref().unwrap_err().kind,
        StreamFailureKind::Disconnected
    );
}

#[tokio::test]
async fn closed_stream_yields_nothing() {
    let mut stream = ProgressStream::new(raw(&["-- one", "-- two"]), Markers::default());
    stream.close();
    assert!(stream.is_closed());
    assert_eq!(stream.next().await, None);
}

#[tokio::test]
async fn sse_source_reads_server_events() {
    let server = MockServer::start().await;
    let body = concat!(
        ": connected\n\n",
        "data: -- Started processing: archive.zip\n\n",
        "data: -- page 1\r\n\r\n",
        "data: -- ✔ Processing finished.\n\n",
        "data: -- leftover\n\n",
    );
    Mock::given(method("GET"))
        .and(path("/logs"))
        .and(header("accept", "text/event-stream"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/event-stream"))
        .mount(&server)
        .await;

    let source = SseLogSource::new(EngineSettings {
        base_url: server.uri(),
        ..EngineSettings::default()
    });
    let stream = open_progress(&source, Markers::default())
        .await
        .expect("stream opens");

    let items = collect(stream).await;
    assert_eq!(
        items,
        vec![
            Ok(line(
                "-- Started processing: archive.zip",
                LineKind::Informational
            )),
            Ok(line("-- page 1", LineKind::Informational)),
            Ok(line("-- ✔ Processing finished.", LineKind::Completed)),
        ]
    );
}

#[tokio::test]
async fn sse_source_reports_http_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/logs"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let source = SseLogSource::new(EngineSettings {
        base_url: server.uri(),
        ..EngineSettings::default()
    });
    let err = match source.open().await {
        Ok(_) => panic!("expected open to fail"),
        Err(err) => err,
    };
    assert_eq!(err.kind, StreamFailureKind::HttpStatus(503));
}

#[tokio::test]
async fn sse_source_reports_unreachable_server() {
    let settings = EngineSettings {
        base_url: refused_base_url(),
        ..EngineSettings::default()
    };

    let err = match SseLogSource::new(settings).open().await {
        Ok(_) => panic!("expected open to fail"),
        Err(err) => err,
    };
    assert_eq!(err.kind, StreamFailureKind::Connect);
}
