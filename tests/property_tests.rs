use nucklee::common::spawn_test_server;
use nucklee::fixture::{FixtureLoader, FixtureParser, LoaderConfig, parse_record};
use nucklee::{MissPolicy, RequestKey, ResponseCache};
use proptest::prelude::*;
use std::collections::HashMap;
use std::fs;
use tempfile::tempdir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

fn method() -> impl Strategy<Value = String> {
    "[A-Z]{3,7}"
}

fn path() -> impl Strategy<Value = String> {
    "(/[a-z0-9_.-]{1,8}){1,4}"
}

fn headers() -> impl Strategy<Value = HashMap<String, String>> {
    prop::collection::hash_map("[A-Z][a-zA-Z-]{0,11}", "[a-zA-Z0-9/;=.]{1,16}", 0..6)
}

/// Body lines never start with whitespace at the edges and never contain the delimiter
fn body() -> impl Strategy<Value = String> {
    prop::collection::vec("[a-zA-Z0-9{}\":,]{1,20}( [a-zA-Z0-9]{1,5})?", 0..5)
        .prop_map(|lines| lines.join("\n"))
}

fn render(method: &str, path: &str, headers: &HashMap<String, String>, body: &str) -> String {
    let mut text = format!("{method} {path} HTTP/1.1\nHTTP/1.1 200 OK\nreserved\n");
    for (name, value) in headers {
        text.push_str(&format!("{name}: {value}\n"));
    }
    text.push('\n');
    text.push_str(body);
    text
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// Property: a rendered fixture parses back to the same key, headers and body
    #[test]
    fn fixture_round_trip(method in method(), path in path(), headers in headers(), body in body()) {
        let text = render(&method, &path, &headers, &body);
        let (key, record) = parse_record(&text).map_err(|e| TestCaseError::fail(e.to_string()))?;

        prop_assert_eq!(key, RequestKey::new(method, path));
        prop_assert_eq!(record.headers, headers);
        prop_assert_eq!(record.body, body);
    }

    /// Property: N delimited records produce exactly N parse results
    #[test]
    fn delimiter_splitting(
        records in prop::collection::vec((method(), path(), body()), 1..8),
        padding in "[ \t\n]{0,3}",
    ) {
        let blocks: Vec<String> = records
            .iter()
            .map(|(m, p, b)| render(m, p, &HashMap::new(), b))
            .collect();
        let text = blocks.join(&format!("{padding}##{padding}"));

        let results: Vec<_> = FixtureParser::default().parse(&text).collect();
        prop_assert_eq!(results.len(), records.len());
        prop_assert!(results.iter().all(Result::is_ok));
    }

    /// Property: loading the same directory twice yields identical caches
    #[test]
    fn load_is_idempotent(files in prop::collection::vec(prop::collection::vec((method(), path(), body()), 1..4), 1..4)) {
        let dir = tempdir().unwrap();
        for (i, records) in files.iter().enumerate() {
            let text = records
                .iter()
                .map(|(m, p, b)| render(m, p, &HashMap::new(), b))
                .collect::<Vec<_>>()
                .join("\n##\n");
            fs::write(dir.path().join(format!("{i}.http")), text).unwrap();
        }

        let loader = FixtureLoader::new(LoaderConfig {
            root: dir.path().to_path_buf(),
            ..Default::default()
        });
        let (first, _) = loader.load().map_err(|e| TestCaseError::fail(e.to_string()))?;
        let (second, _) = loader.load().map_err(|e| TestCaseError::fail(e.to_string()))?;

        prop_assert_eq!(first, second);
    }

    /// Property: a served fixture reaches the client with its body intact
    #[test]
    fn served_body_matches_fixture(path in path(), body in body()) {
        tokio_test::block_on(async {
            let text = render("GET", &path, &HashMap::new(), &body);
            let mut cache = ResponseCache::new();
            for (key, record) in FixtureParser::default().parse(&text).flatten() {
                cache.insert(key, record);
            }

            let (server_handle, addr) = spawn_test_server(cache, MissPolicy::EmptyOk).await
                .map_err(|e| TestCaseError::fail(format!("Server setup failed: {e}")))?;

            let mut stream = TcpStream::connect(addr).await
                .map_err(|e| TestCaseError::fail(format!("Client connection failed: {e}")))?;
            let request = format!("GET {path} HTTP/1.1\r\nConnection: close\r\n\r\n");
            stream.write_all(request.as_bytes()).await
                .map_err(|e| TestCaseError::fail(format!("Write failed: {e}")))?;
            let mut response = Vec::new();
            stream.read_to_end(&mut response).await
                .map_err(|e| TestCaseError::fail(format!("Read failed: {e}")))?;

            server_handle.abort();

            let response = String::from_utf8_lossy(&response);
            let expected_tail = format!("\r\n\r\n{body}");
            prop_assert!(response.ends_with(&expected_tail));
            Ok(())
        })?;
    }
}
