pub mod ai;
pub mod catalog;
pub mod dashboard;
pub mod reviews;
pub mod users;

pub use ai::AiRecommendationService;
pub use catalog::ProductCatalogService;
pub use dashboard::DashboardService;
pub use reviews::ReviewService;
pub use users::UserAccountService;
