use crate::errors::AppError;
use crate::models::LeagueBook;
use std::{env, path::Path, path::PathBuf};
use tokio::fs;
use tracing::error;

pub fn resolve_data_path() -> Result<PathBuf, std::io::Error> {
    if let Ok(path) = env::var("LEAGUE_DATA_PATH") {
        return Ok(PathBuf::from(path));
    }

    Ok(PathBuf::from("data/league.json"))
}

/// Load the league book, falling back to an empty one when the file is
/// missing or unreadable. The grid is server-rendered from this book, so a
/// bad file degrades to an empty site rather than a crash.
pub async fn load_book(path: &Path) -> LeagueBook {
    match fs::read(path).await {
        Ok(bytes) => match serde_json::from_slice(&bytes) {
            Ok(book) => book,
            Err(err) => {
                error!("failed to parse league data file: {err}");
                LeagueBook::default()
            }
        },
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => LeagueBook::default(),
        Err(err) => {
            error!("failed to read league data file: {err}");
            LeagueBook::default()
        }
    }
}

pub async fn persist_book(path: &Path, book: &LeagueBook) -> Result<(), AppError> {
    let payload = serde_json::to_vec_pretty(book).map_err(AppError::internal)?;
    fs::write(path, payload).await.map_err(AppError::internal)?;
    Ok(())
}
