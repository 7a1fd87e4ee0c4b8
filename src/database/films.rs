use super::{
    decode, decode_tx, deserialize_id, encode, encode_tx, next_id, pair_key, scan_pair_rights,
    serialize_id, CatalogDb, TxResult, FILMS, FILMS_LIKES, USERS, USERS_LIKES,
};
use crate::error::{abort, Error, Result};
use crate::model::{Film, Genre, Mpa};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sled::transaction::TransactionalTree;
use sled::Transactional;
use std::collections::BTreeMap;

const EMPTY: &[u8] = &[];

#[derive(Serialize, Deserialize, Debug)]
pub(super) struct FilmRecord {
    name: String,
    description: String,
    duration: i32,
    release_date: NaiveDate,
    mpa_id: u32,
    genre_ids: Vec<u32>,
    likes_count: u64,
}

impl FilmRecord {
    fn from_film(film: &Film, likes_count: u64) -> Self {
        FilmRecord {
            name: film.name.clone(),
            description: film.description.clone(),
            duration: film.duration,
            release_date: film.release_date,
            mpa_id: film.mpa.id,
            genre_ids: film.genre_ids(),
            likes_count,
        }
    }
}

/// Lookup names used to fill the `mpa` and `genres` of a stored film.
struct Names {
    genres: BTreeMap<u32, String>,
    ratings: BTreeMap<u32, String>,
}

impl Names {
    fn load(db: &sled::Db) -> Result<Self> {
        Ok(Names {
            genres: db.genres()?.into_iter().map(|g| (g.id, g.name)).collect(),
            ratings: db.ratings()?.into_iter().map(|m| (m.id, m.name)).collect(),
        })
    }

    fn check(&self, film: &Film) -> Result<()> {
        if !self.ratings.contains_key(&film.mpa.id) {
            return Err(Error::not_found("MPA rating", film.mpa.id));
        }
        match film.genre_ids().into_iter().find(|id| !self.genres.contains_key(id)) {
            Some(id) => Err(Error::not_found("Genre", id)),
            None => Ok(()),
        }
    }

    fn film(&self, id: u64, record: FilmRecord) -> Film {
        Film {
            id,
            name: record.name,
            description: record.description,
            duration: record.duration,
            release_date: record.release_date,
            mpa: Mpa {
                id: record.mpa_id,
                name: self.ratings.get(&record.mpa_id).cloned().unwrap_or_default(),
            },
            genres: record
                .genre_ids
                .into_iter()
                .map(|id| Genre {
                    id,
                    name: self.genres.get(&id).cloned().unwrap_or_default(),
                })
                .collect(),
            likes_count: record.likes_count,
        }
    }
}

/// Adds `delta` to the cached like count of a film inside a transaction.
pub(super) fn adjust_likes(films: &TransactionalTree, film_id: u64, delta: i64) -> TxResult<()> {
    if let Some(bytes) = films.get(&serialize_id(film_id))? {
        let mut record: FilmRecord = decode_tx(&bytes)?;
        record.likes_count = if delta < 0 {
            record.likes_count.saturating_sub(delta.unsigned_abs())
        } else {
            record.likes_count + delta as u64
        };
        films.insert(&serialize_id(film_id), encode_tx(&record)?)?;
    }
    Ok(())
}

/// Films with their genres and the likes users gave them.
pub trait FilmDb {
    /// Stores a new film. Unknown MPA or genre ids are rejected.
    fn add_film(&self, film: &Film) -> Result<Film>;
    /// Replaces a film and its genres, keeping its likes.
    fn update_film(&self, film: &Film) -> Result<Option<Film>>;
    fn get_film(&self, id: u64) -> Result<Option<Film>>;
    fn films(&self) -> Result<Vec<Film>>;
    fn remove_film(&self, id: u64) -> Result<bool>;
    /// Records a like. Returns false when the user already liked the film.
    fn add_like(&self, film_id: u64, user_id: u64) -> Result<bool>;
    fn remove_like(&self, film_id: u64, user_id: u64) -> Result<bool>;
}

impl FilmDb for sled::Db {
    fn add_film(&self, film: &Film) -> Result<Film> {
        let films = self.open_tree(FILMS)?;
        let names = Names::load(self)?;
        names.check(film)?;
        let id = next_id(self, FILMS)?;
        let record = FilmRecord::from_film(film, 0);
        films.insert(serialize_id(id), encode(&record)?)?;
        log::debug!("Created film {} ({})", id, record.name);
        Ok(names.film(id, record))
    }

    fn update_film(&self, film: &Film) -> Result<Option<Film>> {
        let films = self.open_tree(FILMS)?;
        let names = Names::load(self)?;
        names.check(film)?;
        let likes_count = films.transaction(|films| -> TxResult<Option<u64>> {
            let old = match films.get(&serialize_id(film.id))? {
                Some(bytes) => decode_tx::<FilmRecord>(&bytes)?,
                None => return Ok(None),
            };
            let record = FilmRecord::from_film(film, old.likes_count);
            films.insert(&serialize_id(film.id), encode_tx(&record)?)?;
            Ok(Some(old.likes_count))
        })?;
        Ok(likes_count.map(|likes_count| {
            log::debug!("Updated film {}", film.id);
            names.film(film.id, FilmRecord::from_film(film, likes_count))
        }))
    }

    fn get_film(&self, id: u64) -> Result<Option<Film>> {
        let films = self.open_tree(FILMS)?;
        match films.get(serialize_id(id))? {
            Some(bytes) => Ok(Some(Names::load(self)?.film(id, decode(&bytes)?))),
            None => Ok(None),
        }
    }

    fn films(&self) -> Result<Vec<Film>> {
        let films = self.open_tree(FILMS)?;
        let names = Names::load(self)?;
        films
            .iter()
            .map(|row| -> Result<Film> {
                let (key, value) = row?;
                Ok(names.film(deserialize_id(key)?, decode(&value)?))
            })
            .collect()
    }

    fn remove_film(&self, id: u64) -> Result<bool> {
        let films = self.open_tree(FILMS)?;
        let films_likes = self.open_tree(FILMS_LIKES)?;
        let users_likes = self.open_tree(USERS_LIKES)?;
        let mut first = true;
        let mut dropped = 0;
        // A like committed between a scan and its transaction outlives that
        // pass. Once the film is gone `add_like` aborts, so the sweep ends.
        loop {
            let likers = scan_pair_rights(&films_likes, id)?;
            if !first && likers.is_empty() {
                break;
            }
            let removed = (&films, &films_likes, &users_likes).transaction(
                |(films, films_likes, users_likes)| -> TxResult<bool> {
                    if first && films.remove(&serialize_id(id))?.is_none() {
                        return Ok(false);
                    }
                    for &user_id in &likers {
                        films_likes.remove(&pair_key(id, user_id))?;
                        users_likes.remove(&pair_key(user_id, id))?;
                    }
                    Ok(true)
                },
            )?;
            if !removed {
                return Ok(false);
            }
            dropped += likers.len();
            first = false;
        }
        log::debug!("Removed film {} with {} likes", id, dropped);
        Ok(true)
    }

    fn add_like(&self, film_id: u64, user_id: u64) -> Result<bool> {
        let users = self.open_tree(USERS)?;
        let films = self.open_tree(FILMS)?;
        let films_likes = self.open_tree(FILMS_LIKES)?;
        let users_likes = self.open_tree(USERS_LIKES)?;
        let added = (&users, &films, &films_likes, &users_likes).transaction(
            |(users, films, films_likes, users_likes)| -> TxResult<bool> {
                if users.get(&serialize_id(user_id))?.is_none() {
                    return Err(abort(Error::not_found("User", user_id)));
                }
                if films.get(&serialize_id(film_id))?.is_none() {
                    return Err(abort(Error::not_found("Film", film_id)));
                }
                if films_likes.get(&pair_key(film_id, user_id))?.is_some() {
                    return Ok(false);
                }
                films_likes.insert(&pair_key(film_id, user_id), EMPTY)?;
                users_likes.insert(&pair_key(user_id, film_id), EMPTY)?;
                adjust_likes(films, film_id, 1)?;
                Ok(true)
            },
        )?;
        if added {
            log::debug!("User {} liked film {}", user_id, film_id);
        }
        Ok(added)
    }

    fn remove_like(&self, film_id: u64, user_id: u64) -> Result<bool> {
        let films = self.open_tree(FILMS)?;
        let films_likes = self.open_tree(FILMS_LIKES)?;
        let users_likes = self.open_tree(USERS_LIKES)?;
        let removed = (&films, &films_likes, &users_likes).transaction(
            |(films, films_likes, users_likes)| -> TxResult<bool> {
                if films_likes.remove(&pair_key(film_id, user_id))?.is_none() {
                    return Ok(false);
                }
                users_likes.remove(&pair_key(user_id, film_id))?;
                adjust_likes(films, film_id, -1)?;
                Ok(true)
            },
        )?;
        if removed {
            log::debug!("User {} unliked film {}", user_id, film_id);
        }
        Ok(removed)
    }
}
