//! Prometheus metrics for mempool occupancy and drops.
//!
//! Enable with the `metrics` feature. Metrics registration against an
//! external scrape endpoint is out of this core's scope; the counters
//! themselves are cheap ambient instrumentation the rest of this lineage's
//! crates carry regardless.

#[cfg(feature = "metrics")]
use lazy_static::lazy_static;

#[cfg(feature = "metrics")]
use prometheus::{register_counter_vec, register_int_gauge, CounterVec, IntGauge};

#[cfg(feature = "metrics")]
lazy_static! {
    pub static ref MEMPOOL_SIZE: IntGauge =
        register_int_gauge!("pulsevm_mempool_size", "Number of transactions currently in the mempool")
            .expect("failed to register pulsevm_mempool_size");
    pub static ref MEMPOOL_BYTES: IntGauge = register_int_gauge!(
        "pulsevm_mempool_bytes",
        "Total byte size of transactions currently in the mempool"
    )
    .expect("failed to register pulsevm_mempool_bytes");
    pub static ref MEMPOOL_DROPS: CounterVec = register_counter_vec!(
        "pulsevm_mempool_drops_total",
        "Transactions dropped from the mempool, labeled by reason",
        &["reason"]
    )
    .expect("failed to register pulsevm_mempool_drops_total");
}

#[cfg(feature = "metrics")]
pub fn set_occupancy(count: usize, bytes: usize) {
    MEMPOOL_SIZE.set(count as i64);
    MEMPOOL_BYTES.set(bytes as i64);
}

#[cfg(feature = "metrics")]
pub fn record_drop(reason: &str) {
    MEMPOOL_DROPS.with_label_values(&[reason]).inc();
}

#[cfg(not(feature = "metrics"))]
pub fn set_occupancy(_count: usize, _bytes: usize) {}

#[cfg(not(feature = "metrics"))]
pub fn record_drop(_reason: &str) {}
