use crate::database::CatalogDb;
use crate::error::{Error, Result};
use crate::model::{Genre, Mpa};

pub fn genres<D: CatalogDb>(db: &D) -> Result<Vec<Genre>> {
    db.genres()
}

pub fn genre<D: CatalogDb>(db: &D, id: u32) -> Result<Genre> {
    db.get_genre(id)?.ok_or_else(|| Error::not_found("Genre", id))
}

pub fn ratings<D: CatalogDb>(db: &D) -> Result<Vec<Mpa>> {
    db.ratings()
}

pub fn rating<D: CatalogDb>(db: &D, id: u32) -> Result<Mpa> {
    db.get_rating(id)?
        .ok_or_else(|| Error::not_found("MPA rating", id))
}
