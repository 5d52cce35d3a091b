use std::sync::Arc;

use crate::services::table_handle::TableHandle;

#[derive(Clone)]
pub struct AppState {
    pub table: Arc<TableHandle>,
    pub max_page_limit: usize,
}
