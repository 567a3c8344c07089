use std::sync::Arc;

use crate::application::admin_data::AdminDataService;
use crate::application::blog::BlogService;
use crate::application::charts::ChartStore;

#[derive(Clone)]
pub struct ApiState {
    pub charts: Arc<ChartStore>,
    pub admin: Arc<AdminDataService>,
    pub blogs: Arc<BlogService>,
}
