//! State owned by one stream's poller.

use anyhow::{Context, Result};
use url::Url;

use crate::reconcile::{FragmentDescriptor, ReconcileOutcome, StreamWindow};
use crate::services::StreamEntry;

/// Everything the poller of one stream needs between polls. Never shared
/// with other tasks; other stages only see owned message copies.
#[derive(Debug, Clone)]
pub struct StreamState {
    pub name: String,
    /// `baseURL` advertised by the multi-level manifest.
    pub base_url: String,
    /// Prefix of every fragment URL of this stream.
    pub stream_url: String,
    pub bootstrap_url: String,
    pub window: StreamWindow,
    pub total_fragments_in_current_segment: u32,
    pub last_segment_number: u32,
}

impl StreamState {
    /// Build the state of a newly discovered stream published at
    /// `http://<server_name>/<live_path>/<name>/<name>`.
    pub fn new(entry: &StreamEntry, server_name: &str, live_path: &str) -> Result<Self> {
        let origin = if server_name.contains("://") {
            server_name.to_string()
        } else {
            format!("http://{}", server_name)
        };
        let origin = Url::parse(&format!("{}/", origin.trim_end_matches('/')))
            .with_context(|| format!("invalid server name `{}`", server_name))?;
        let path = format!("{}/{}/{}", live_path.trim_matches('/'), entry.name, entry.name);
        let stream_url = origin
            .join(path.trim_start_matches('/'))
            .with_context(|| format!("invalid stream path `{}`", path))?
            .to_string();
        Ok(Self {
            name: entry.name.clone(),
            base_url: entry.base_url.clone(),
            bootstrap_url: format!("{}.bootstrap", stream_url),
            stream_url,
            window: StreamWindow::seeded(),
            total_fragments_in_current_segment: 0,
            last_segment_number: 0,
        })
    }

    /// `<stream_url>Seg<segment>-Frag<fragment>`.
    pub fn fragment_url(&self, descriptor: &FragmentDescriptor) -> String {
        format!(
            "{}Seg{}-Frag{}",
            self.stream_url, descriptor.segment, descriptor.fragment
        )
    }

    pub(crate) fn record(&mut self, outcome: &ReconcileOutcome) {
        self.total_fragments_in_current_segment = outcome.total_fragments_in_segment;
        self.last_segment_number = outcome.segment;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(name: &str) -> StreamEntry {
        StreamEntry {
            name: name.to_string(),
            base_url: "http://localhost/hds-live/livepkgr/_definst_/liveevent/".to_string(),
            bitrate: Some(500),
        }
    }

    #[test]
    fn urls_follow_live_layout() {
        let s = StreamState::new(
            &entry("livestream1"),
            "localhost",
            "hds-live/streams/livepkgr/streams/_definst_",
        )
        .unwrap();
        assert_eq!(
            s.stream_url,
            "http://localhost/hds-live/streams/livepkgr/streams/_definst_/livestream1/livestream1"
        );
        assert_eq!(
            s.bootstrap_url,
            "http://localhost/hds-live/streams/livepkgr/streams/_definst_/livestream1/livestream1.bootstrap"
        );
        assert!(s.window.is_fresh());
    }

    #[test]
    fn server_with_scheme_and_port() {
        let s = StreamState::new(&entry("cam"), "https://origin.test:8443/", "/live/").unwrap();
        assert_eq!(s.stream_url, "https://origin.test:8443/live/cam/cam");
    }

    #[test]
    fn fragment_url_names_segment_and_fragment() {
        let s = StreamState::new(&entry("live1"), "127.0.0.1:8080", "hds").unwrap();
        let d = FragmentDescriptor {
            segment: 1,
            fragment: 52,
            duration_ms: 4000,
            discontinuity: 0,
            pulled: false,
        };
        assert_eq!(
            s.fragment_url(&d),
            "http://127.0.0.1:8080/hds/live1/live1Seg1-Frag52"
        );
    }
}
