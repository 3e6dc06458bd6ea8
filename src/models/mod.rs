pub mod enums;
pub mod medication;
pub mod dose_event;
pub mod family;
pub mod settings;

pub use enums::*;
pub use medication::*;
pub use dose_event::*;
pub use family::*;
pub use settings::*;
