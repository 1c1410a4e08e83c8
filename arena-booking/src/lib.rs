pub mod availability;
pub mod countdown;
pub mod intent;
pub mod registry;
pub mod selection;

pub use availability::AvailabilityQuery;
pub use countdown::{spawn_countdown, Countdown, CountdownTask, CountdownView};
pub use intent::IntentLifecycle;
pub use registry::ActiveIntentRegistry;
pub use selection::{SelectionManager, SelectionMode};
