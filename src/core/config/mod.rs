pub mod defaults;
pub mod service;
pub mod settings;
pub mod validation;

pub use service::{load_dotenv, ConfigService};
pub use settings::Settings;
