use std::io::Read;
use std::time::Duration;

use tracing::debug;
use ureq::Agent;

use crate::errors::TransportError;

use super::Fetcher;

/// `ureq`-backed fetcher with a global per-request timeout.
pub struct HttpFetcher {
    agent: Agent,
}

impl HttpFetcher {
    /// Build a fetcher whose requests give up after `timeout`, body included.
    pub fn new(timeout: Duration) -> Self {
        let config = Agent::config_builder()
            .timeout_global(Some(timeout))
            .build();
        Self {
            agent: Agent::new_with_config(config),
        }
    }
}

impl Fetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, TransportError> {
        let response = self.agent.get(url).call().map_err(|err| match err {
            ureq::Error::StatusCode(status) => TransportError::Status {
                url: url.to_string(),
                status,
            },
            other => TransportError::Request {
                url: url.to_string(),
                reason: other.to_string(),
            },
        })?;

        // `into_reader` is unbounded, unlike `read_to_vec`; payloads can be large.
        let mut body = Vec::new();
        response
            .into_body()
            .into_reader()
            .read_to_end(&mut body)
            .map_err(|err| TransportError::Body {
                url: url.to_string(),
                reason: err.to_string(),
            })?;
        debug!(url, bytes = body.len(), "[catalog_sync:http] fetched response body");
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::net::TcpListener;
    use std::thread;

    fn spawn_one_shot_http(status_line: &str, payload: Vec<u8>) -> (String, thread::JoinHandle<()>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let status_line = status_line.to_string();
        let handle = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut request_buf = [0u8; 1024];
            let _ = stream.read(&mut request_buf);
            let headers = format!(
                "HTTP/1.1 {status_line}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                payload.len()
            );
            stream.write_all(headers.as_bytes()).unwrap();
            stream.write_all(&payload).unwrap();
            let _ = stream.flush();
        });
        (format!("http://{addr}"), handle)
    }

    #[test]
    fn fetch_returns_full_body_on_success() {
        let payload = b"Facility Name,Score\nGeneral,5\n".to_vec();
        let (base_url, server) = spawn_one_shot_http("200 OK", payload.clone());
        let fetcher = HttpFetcher::new(Duration::from_secs(5));

        let body = fetcher.fetch(&format!("{base_url}/data.csv")).unwrap();
        server.join().unwrap();

        assert_eq!(body, payload);
    }

    #[test]
    fn fetch_maps_non_success_status_to_status_error() {
        let (base_url, server) = spawn_one_shot_http("404 Not Found", Vec::new());
        let fetcher = HttpFetcher::new(Duration::from_secs(5));

        let err = fetcher.fetch(&format!("{base_url}/missing.csv")).unwrap_err();
        server.join().unwrap();

        assert!(matches!(err, TransportError::Status { status: 404, .. }));
    }

    #[test]
    fn fetch_gives_up_after_timeout() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let server = thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            thread::sleep(Duration::from_millis(1500));
            drop(stream);
        });
        let fetcher = HttpFetcher::new(Duration::from_millis(200));

        let err = fetcher.fetch(&format!("http://{addr}/slow.csv")).unwrap_err();
        server.join().unwrap();

        assert!(matches!(err, TransportError::Request { .. }));
    }

    #[test]
    fn fetch_reports_unreachable_host_as_request_error() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let fetcher = HttpFetcher::new(Duration::from_secs(2));

        let err = fetcher.fetch(&format!("http://{addr}/gone.csv")).unwrap_err();
        assert!(matches!(err, TransportError::Request { .. }));
    }
}
