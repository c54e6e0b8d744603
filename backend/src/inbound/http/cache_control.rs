//! Shared cache-control policies for HTTP handlers.

/// Probe responses must never be served from a cache.
pub const NO_STORE: &str = "no-store";

/// Build the cache-control header tuple for probe responses.
pub const fn no_store_header() -> (&'static str, &'static str) {
    ("Cache-Control", NO_STORE)
}
