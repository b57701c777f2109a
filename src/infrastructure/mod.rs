pub mod chromium_page;
pub mod portal_page;

pub use chromium_page::ChromiumPage;
pub use portal_page::PortalPage;
