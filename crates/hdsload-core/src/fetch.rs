//! HTTP GET for manifests and live bootstraps.
//!
//! Uses the curl crate (libcurl) with redirects and bounded timeouts.
//! Runs in the current thread; call from `spawn_blocking` if used from async code.

use std::time::Duration;

use crate::error::PollError;
use crate::services::BootstrapFetcher;

/// Blocking HTTP client for small origin documents.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    connect_timeout: Duration,
    timeout: Duration,
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            timeout: Duration::from_secs(20),
        }
    }
}

impl HttpFetcher {
    pub fn new(connect_timeout: Duration, timeout: Duration) -> Self {
        Self {
            connect_timeout,
            timeout,
        }
    }

    /// GET `url` and return the body. Non-2xx is an error.
    pub fn get(&self, url: &str) -> Result<Vec<u8>, PollError> {
        let fetch_err = |e: curl::Error| PollError::Fetch {
            url: url.to_string(),
            reason: e.to_string(),
        };

        let mut body: Vec<u8> = Vec::new();
        let mut easy = curl::easy::Easy::new();
        easy.url(url).map_err(fetch_err)?;
        easy.follow_location(true).map_err(fetch_err)?;
        easy.connect_timeout(self.connect_timeout).map_err(fetch_err)?;
        easy.timeout(self.timeout).map_err(fetch_err)?;

        {
            let mut transfer = easy.transfer();
            transfer
                .write_function(|data| {
                    body.extend_from_slice(data);
                    Ok(data.len())
                })
                .map_err(fetch_err)?;
            transfer.perform().map_err(fetch_err)?;
        }

        let code = easy.response_code().map_err(fetch_err)?;
        if !(200..300).contains(&code) {
            return Err(PollError::HttpStatus {
                url: url.to_string(),
                status: code,
            });
        }
        Ok(body)
    }
}

impl BootstrapFetcher for HttpFetcher {
    fn fetch(&self, bootstrap_url: &str) -> Result<Vec<u8>, PollError> {
        self.get(bootstrap_url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::thread;

    /// Serves one canned HTTP response to the first connection.
    fn serve_once(status_line: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        thread::spawn(move || {
            if let Ok((mut stream, _)) = listener.accept() {
                let mut buf = [0u8; 2048];
                let _ = stream.read(&mut buf);
                let response = format!(
                    "{}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status_line,
                    body.len(),
                    body
                );
                let _ = stream.write_all(response.as_bytes());
            }
        });
        format!("http://127.0.0.1:{}/live1/live1.bootstrap", port)
    }

    #[test]
    fn get_returns_body_on_success() {
        let url = serve_once("HTTP/1.1 200 OK", "abst-bytes");
        let body = HttpFetcher::default().fetch(&url).unwrap();
        assert_eq!(body, b"abst-bytes");
    }

    #[test]
    fn non_2xx_is_http_status_error() {
        let url = serve_once("HTTP/1.1 404 Not Found", "missing");
        match HttpFetcher::default().fetch(&url) {
            Err(PollError::HttpStatus { status, .. }) => assert_eq!(status, 404),
            other => panic!("expected HttpStatus, got {:?}", other),
        }
    }

    #[test]
    fn unreachable_origin_is_fetch_error() {
        // Bind then drop to get a port with nothing listening.
        let port = TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port();
        let fetcher = HttpFetcher::new(Duration::from_secs(2), Duration::from_secs(2));
        let err = fetcher
            .fetch(&format!("http://127.0.0.1:{}/x.bootstrap", port))
            .unwrap_err();
        assert!(matches!(err, PollError::Fetch { .. }));
    }
}
