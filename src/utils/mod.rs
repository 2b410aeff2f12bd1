pub mod build_info;

use std::sync::Once;

static TRACING_INIT: Once = Once::new();

const DEFAULT_DIRECTIVE: &str = "stall_ledger=info";

/// Initializes the global tracing subscriber, honouring `RUST_LOG` when set.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, EnvFilter};

        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE));

        // A host application may already own the global subscriber.
        let _ = fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .try_init();
    });
}

/// Rounds a monetary amount to two decimal places, the precision amounts are entered with.
pub fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Compares two amounts within an absolute tolerance.
pub fn approx_eq(left: f64, right: f64, tolerance: f64) -> bool {
    (left - right).abs() <= tolerance
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_cents_keeps_two_decimals() {
        assert_eq!(round_cents(83.333_333), 83.33);
        assert_eq!(round_cents(12.345_9), 12.35);
        assert_eq!(round_cents(-4.005_1), -4.01);
    }

    #[test]
    fn approx_eq_respects_tolerance() {
        assert!(approx_eq(0.1 + 0.2, 0.3, 1e-9));
        assert!(!approx_eq(10.0, 10.02, 0.01));
    }

    #[test]
    fn init_tracing_is_idempotent() {
        init_tracing();
        init_tracing();
    }
}
