//! Structured tracing macros for the engine.
//!
//! Every macro forwards to `tracing` under a fixed target so subscribers can
//! filter graph construction, execution-state changes, individual firings and
//! the driver loop independently:
//!
//! | macro       | target               |
//! |-------------|----------------------|
//! | `gf_net!`   | `genoflow::net`      |
//! | `gf_exec!`  | `genoflow::exec`     |
//! | `gf_fire!`  | `genoflow::fire`     |
//! | `gf_sched!` | `genoflow::scheduler`|
//!
//! With the `no-trace` feature enabled all macros compile to nothing.

// ---- With tracing enabled (default) ----

/// Trace graph construction and structural transforms.
#[cfg(not(feature = "no-trace"))]
#[macro_export]
macro_rules! gf_net {
    ($level:ident, $($arg:tt)*) => {
        tracing::$level!(target: "genoflow::net", $($arg)*)
    }
}

/// Trace execution context state changes (start, reset, tokens, disabling).
#[cfg(not(feature = "no-trace"))]
#[macro_export]
macro_rules! gf_exec {
    ($level:ident, $($arg:tt)*) => {
        tracing::$level!(target: "genoflow::exec", $($arg)*)
    }
}

/// Trace individual transition firings with their generation.
#[cfg(not(feature = "no-trace"))]
#[macro_export]
macro_rules! gf_fire {
    ($level:ident, generation = $generation:expr, $($arg:tt)*) => {
        tracing::$level!(target: "genoflow::fire", generation = $generation, $($arg)*)
    };
    ($level:ident, $($arg:tt)*) => {
        tracing::$level!(target: "genoflow::fire", $($arg)*)
    }
}

/// Trace the driver loop (ready queue, dispatch, completion).
#[cfg(not(feature = "no-trace"))]
#[macro_export]
macro_rules! gf_sched {
    ($level:ident, $($arg:tt)*) => {
        tracing::$level!(target: "genoflow::scheduler", $($arg)*)
    }
}

// ---- With tracing disabled ----

#[cfg(feature = "no-trace")]
#[macro_export]
macro_rules! gf_net {
    ($($arg:tt)*) => {};
}

#[cfg(feature = "no-trace")]
#[macro_export]
macro_rules! gf_exec {
    ($($arg:tt)*) => {};
}

#[cfg(feature = "no-trace")]
#[macro_export]
macro_rules! gf_fire {
    ($($arg:tt)*) => {};
}

#[cfg(feature = "no-trace")]
#[macro_export]
macro_rules! gf_sched {
    ($($arg:tt)*) => {};
}
