//! Metrics collection and exposition.
//!
//! # Metrics
//! - `caching_proxy_cache_hits_total` (counter)
//! - `caching_proxy_cache_misses_total` (counter)
//! - `caching_proxy_dispatch_errors_total` (counter): failed outbound sends
//! - `caching_proxy_body_read_errors_total` (counter): partial bodies cached
//! - `caching_proxy_reply_aborted_total` (counter): responses not fully written
//! - `caching_proxy_dispatch_duration_seconds` (histogram): dispatch + body read
//! - `caching_proxy_cache_entries` (gauge): stored entries, expired included
//!
//! Recording is a no-op until a recorder is installed, so library users and
//! tests pay nothing unless [`init_metrics`] runs.

use std::net::SocketAddr;
use std::time::Duration;

use metrics_exporter_prometheus::PrometheusBuilder;

const CACHE_HITS: &str = "caching_proxy_cache_hits_total";
const CACHE_MISSES: &str = "caching_proxy_cache_misses_total";
const DISPATCH_ERRORS: &str = "caching_proxy_dispatch_errors_total";
const BODY_READ_ERRORS: &str = "caching_proxy_body_read_errors_total";
const REPLY_ABORTED: &str = "caching_proxy_reply_aborted_total";
const DISPATCH_DURATION: &str = "caching_proxy_dispatch_duration_seconds";
const CACHE_ENTRIES: &str = "caching_proxy_cache_entries";

/// Install the Prometheus recorder and its scrape endpoint on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => {
            describe();
            tracing::info!(address = %addr, "Metrics endpoint listening");
        }
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

fn describe() {
    metrics::describe_counter!(CACHE_HITS, "Requests answered from the cache.");
    metrics::describe_counter!(CACHE_MISSES, "Requests that required an origin dispatch.");
    metrics::describe_counter!(DISPATCH_ERRORS, "Outbound requests that failed to send.");
    metrics::describe_counter!(BODY_READ_ERRORS, "Origin bodies cut short while reading.");
    metrics::describe_counter!(REPLY_ABORTED, "Responses dropped before the body was written.");
    metrics::describe_histogram!(DISPATCH_DURATION, "Time to dispatch and read an origin response.");
    metrics::describe_gauge!(CACHE_ENTRIES, "Entries currently held by the cache.");
}

pub fn record_cache_hit() {
    metrics::counter!(CACHE_HITS).increment(1);
}

pub fn record_cache_miss() {
    metrics::counter!(CACHE_MISSES).increment(1);
}

pub fn record_dispatch_error() {
    metrics::counter!(DISPATCH_ERRORS).increment(1);
}

pub fn record_body_read_error() {
    metrics::counter!(BODY_READ_ERRORS).increment(1);
}

pub fn record_reply_aborted() {
    metrics::counter!(REPLY_ABORTED).increment(1);
}

pub fn record_dispatch_duration(elapsed: Duration) {
    metrics::histogram!(DISPATCH_DURATION).record(elapsed.as_secs_f64());
}

pub fn record_cache_size(entries: usize) {
    metrics::gauge!(CACHE_ENTRIES).set(entries as f64);
}
