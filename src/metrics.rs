use lazy_static::lazy_static;
use prometheus::{Counter, Gauge, register_counter, register_gauge};


lazy_static! {
    pub static ref REQUEST_TOTAL: Counter = register_counter!(
        "api_sim_requests_total",
        "Total number of rate limited requests"
    )
    .unwrap();
    pub static ref REQUEST_ADMITTED: Counter = register_counter!(
        "api_sim_requests_admitted_total",
        "Requests admitted by the rate limiter"
    )
    .unwrap();
    pub static ref REQUEST_REJECTED: Counter =
        register_counter!("api_sim_requests_rejected_total", "Requests rejected with 429").unwrap();
    pub static ref WINDOW_RESETS: Counter = register_counter!(
        "api_sim_window_resets_total",
        "Number of rate limit window resets"
    )
    .unwrap();
    pub static ref TRACKED_CLIENTS: Gauge = register_gauge!(
        "api_sim_tracked_clients",
        "Clients counted in the current window"
    )
    .unwrap();
}
