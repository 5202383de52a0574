pub mod config;

pub mod models;

// Decomposition engine (tree-level API always available; SQL text front-end behind `query_ast`)
pub mod query_ast;

pub use query_ast::{DecompositionError, DecompositionPlan, TablePlan, decompose};
#[cfg(feature = "query_ast")]
pub use query_ast::decompose_sql;

/// Initialise logging for binaries embedding the engine.
pub fn init_logging() {
    dotenv::dotenv().ok();
    let _ = env_logger::Builder::new()
        // Stage-by-stage decisions are logged at debug
        .filter_module("fedsplit", log::LevelFilter::Info)
        .parse_default_env()
        .is_test(false)
        .try_init();
}
