/// Error returned by consumer-supplied callbacks (watchers, toast handlers).
///
/// A callback that fails is logged at the dispatch site and never aborts the
/// operation that triggered it.
pub type CallbackError = Box<dyn std::error::Error + Send + Sync>;

pub type CallbackResult = Result<(), CallbackError>;
