//! System-wide constants for Vaultex.

/// Fee percent used when none is configured.
pub const DEFAULT_FEE_PERCENT: u32 = 10;

/// Upper bound on the exchange fee percent.
pub const MAX_FEE_PERCENT: u32 = 100;

/// Divisor applied to `amount_buy * fee_percent`.
pub const FEE_DENOMINATOR: u128 = 100;

/// Divisor for flash-loan premiums expressed in basis points.
pub const BASIS_POINTS_DENOMINATOR: u128 = 10_000;

/// Upper bound on a basis-point premium (100%).
pub const MAX_PREMIUM_BPS: u32 = 10_000;

/// Token decimals used when none is configured.
pub const DEFAULT_DECIMALS: u32 = 18;

/// Largest decimals value supported by human-unit conversion.
pub const MAX_DECIMALS: u32 = 28;

/// Capacity of the runtime command queue.
pub const DEFAULT_COMMAND_QUEUE: usize = 1024;

/// Capacity of the committed-event broadcast channel.
pub const DEFAULT_EVENT_BROADCAST: usize = 4096;

/// Version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Engine name.
pub const ENGINE_NAME: &str = "Vaultex";
