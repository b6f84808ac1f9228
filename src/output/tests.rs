use super::OutputWriter;
use crate::config::OutputConfig;
use crate::http::cookie::Cookie;
use crate::http::response::{ErrorResult, RequestError, ResponseResult, RunResult};
use std::collections::BTreeMap;
use std::fs;
use tempfile::tempdir;

fn sample_response() -> RunResult {
    RunResult::Response(ResponseResult {
        url: "http://example.com/home".to_string(),
        code: 200,
        headers: [("content-type".to_string(), "text/html".to_string())]
            .into_iter()
            .collect::<BTreeMap<_, _>>(),
        body: "<html></html>".to_string(),
        cookies: vec![Cookie::new("sid", "abc").host("example.com")],
        duration: 0.125,
    })
}

fn sample_error() -> RunResult {
    RunResult::Error(ErrorResult::new(
        RequestError::http_status(404, "HTTP Error 404: Not Found"),
        0.5,
    ))
}

#[test]
fn render_response_as_compact_json() {
    let writer = OutputWriter::new(OutputConfig::default());
    let rendered = writer.render(&sample_response()).expect("rendered");
    assert!(!rendered.contains('\n'));

    let value: serde_json::Value = serde_json::from_str(&rendered).expect("json");
    assert_eq!(value["code"], 200);
    assert_eq!(value["url"], "http://example.com/home");
    assert_eq!(value["headers"]["content-type"], "text/html");
    assert_eq!(value["cookies"][0]["name"], "sid");
    assert_eq!(value["cookies"][0]["host_only"], true);
    assert!(value.get("error").is_none());
}

#[test]
fn render_pretty_spans_lines() {
    let writer = OutputWriter::new(OutputConfig {
        pretty: true,
        ..OutputConfig::default()
    });
    let rendered = writer.render(&sample_error()).expect("rendered");
    assert!(rendered.contains('\n'));
    assert!(rendered.contains("\"error\": true"));
}

#[test]
fn write_results_to_file_one_line_each() {
    let temp = tempdir().expect("tempdir");
    let file_path = temp.path().join("results.jsonl");
    let writer = OutputWriter::new(OutputConfig {
        file: Some(file_path.clone()),
        ..OutputConfig::default()
    });

    writer
        .write_results(&[sample_response(), sample_error()])
        .expect("written");

    let content = fs::read_to_string(&file_path).expect("read file");
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), 2);
    let second: serde_json::Value = serde_json::from_str(lines[1]).expect("json");
    assert_eq!(second["code"], 404);
}
