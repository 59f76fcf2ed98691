//! Business logic services for the Bar Stock Manager

pub mod assistant;
pub mod preferences;
pub mod product;
pub mod profile;
pub mod reporting;
pub mod stock;
pub mod team;

pub use assistant::AssistantService;
pub use preferences::PreferencesService;
pub use product::ProductService;
pub use profile::ProfileService;
pub use reporting::ReportingService;
pub use stock::StockService;
pub use team::TeamService;
