use askama::Template;
use askama_web::WebTemplate;

#[derive(Template, WebTemplate)]
#[template(path = "dashboard.html")]
pub struct DashboardTemplate {
    pub tile_url: String,
    pub observer_lat: f64,
    pub observer_lon: f64,
    pub zoom: u8,
    pub update_interval_ms: u128,
    pub default_limit: usize,
}
