mod auth;
mod health_check;
mod urls;

pub use auth::{logout, refresh, sign_in, sign_up, REFRESH_COOKIE_NAME, REFRESH_COOKIE_PATH};
pub use health_check::health_check;
pub use urls::{delete_url, list_urls, redirect, save_url};
