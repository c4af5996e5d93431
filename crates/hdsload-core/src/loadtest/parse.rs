//! Parse the report printed by `ab`.

use super::LoadTestMetrics;

/// First whitespace-separated token of `value` as a number, or the default.
fn leading<T: std::str::FromStr + Default>(value: &str) -> T {
    value
        .split_whitespace()
        .next()
        .and_then(|v| v.parse().ok())
        .unwrap_or_default()
}

/// Extract metrics from `ab` output. Lines that are missing leave their
/// figure at zero.
pub fn parse_ab_output(output: &str) -> LoadTestMetrics {
    let mut metrics = LoadTestMetrics::default();
    let mut latency_seen = false;

    for line in output.lines() {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let value = value.trim();
        match key.trim() {
            "Time taken for tests" => metrics.time_taken_secs = leading(value),
            "Complete requests" => metrics.complete_requests = leading(value),
            "Non-2xx responses" => metrics.non_2xx = leading(value),
            "Requests per second" => metrics.requests_per_second = leading(value),
            // Two such lines; the per-request mean is the one ending in "(mean)".
            "Time per request" if !latency_seen => {
                if value.split_whitespace().nth(2) == Some("(mean)") {
                    metrics.latency_ms = leading(value);
                    latency_seen = true;
                }
            }
            _ => {}
        }
    }
    metrics
}
