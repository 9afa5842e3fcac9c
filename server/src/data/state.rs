use crate::repo::database::base::DataBase;

use std::sync::Arc;

pub struct HttpState {
    pub database: Arc<dyn DataBase>,
}
