use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Default filter for [`init_tracing`]: our crates at debug, everything else at warn.
pub const DEFAULT_DIRECTIVES: &str =
	"warn,pd_core=debug,pd_mutation=debug,pd_query_cache=debug,pd_transport=debug";

/// Installs the global subscriber. `RUST_LOG` wins over `default_directives`.
///
/// Returns `false` if a subscriber was already installed, which leaves the existing one in place.
pub fn init_tracing(default_directives: &str) -> bool {
	tracing_subscriber::registry()
		.with(
			EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directives)),
		)
		.with(fmt::layer().with_target(true).with_line_number(true))
		.try_init()
		.is_ok()
}
