use super::users;
use crate::database::{FilmDb, UserDb};
use crate::error::{Error, Result};
use crate::model::Film;

pub const DEFAULT_POPULAR_COUNT: usize = 10;

pub fn create<D: FilmDb>(db: &D, film: Film) -> Result<Film> {
    db.add_film(&film)
}

pub fn update<D: FilmDb>(db: &D, film: Film) -> Result<Film> {
    db.update_film(&film)?
        .ok_or_else(|| Error::not_found("Film", film.id))
}

pub fn all<D: FilmDb>(db: &D) -> Result<Vec<Film>> {
    db.films()
}

pub fn find<D: FilmDb>(db: &D, id: u64) -> Result<Film> {
    db.get_film(id)?.ok_or_else(|| Error::not_found("Film", id))
}

pub fn delete<D: FilmDb>(db: &D, id: u64) -> Result<()> {
    if db.remove_film(id)? {
        Ok(())
    } else {
        Err(Error::not_found("Film", id))
    }
}

pub fn like<D: FilmDb + UserDb>(db: &D, id: u64, user_id: u64) -> Result<()> {
    find(db, id)?;
    users::find(db, user_id)?;
    db.add_like(id, user_id)?;
    Ok(())
}

pub fn unlike<D: FilmDb + UserDb>(db: &D, id: u64, user_id: u64) -> Result<()> {
    find(db, id)?;
    users::find(db, user_id)?;
    if db.remove_like(id, user_id)? {
        Ok(())
    } else {
        Err(Error::not_found("Like from user", user_id))
    }
}

/// The `count` most liked films. Films with equal likes keep id order.
pub fn popular<D: FilmDb>(db: &D, count: usize) -> Result<Vec<Film>> {
    let mut films = db.films()?;
    films.sort_by(|a, b| b.likes_count.cmp(&a.likes_count));
    films.truncate(count);
    Ok(films)
}
