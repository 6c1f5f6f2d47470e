mod health;
mod url;

pub use health::{health_handler, ping_handler};
pub use url::{
    create_url_handler, delete_url_handler, list_urls_handler, replace_url_handler,
    resolve_url_handler, stats_handler,
};
