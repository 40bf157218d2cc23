use crate::models::LeagueBook;
use std::{path::PathBuf, sync::Arc};
use tokio::sync::Mutex;

#[derive(Clone)]
pub struct AppState {
    pub data_path: PathBuf,
    pub book: Arc<Mutex<LeagueBook>>,
}

impl AppState {
    pub fn new(data_path: PathBuf, book: LeagueBook) -> Self {
        Self {
            data_path,
            book: Arc::new(Mutex::new(book)),
        }
    }
}
