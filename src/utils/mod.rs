pub mod debouncer;

pub use debouncer::{DebouncedAction, Debouncer, PauseGuard};
