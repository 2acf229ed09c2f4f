// Export all route modules
pub mod campaigns;
pub mod metadata;

pub use campaigns::*;
pub use metadata::*;
