use super::{decode, encode, GENRES, RATINGS};
use crate::error::{Error, Result};
use crate::model::{Genre, Mpa};

const DEFAULT_GENRES: &[(u32, &str)] = &[
    (1, "Comedy"),
    (2, "Drama"),
    (3, "Cartoon"),
    (4, "Thriller"),
    (5, "Documentary"),
    (6, "Action"),
];

const DEFAULT_RATINGS: &[(u32, &str)] = &[(1, "G"), (2, "PG"), (3, "PG-13"), (4, "R"), (5, "NC-17")];

/// Read access to the fixed genre and MPA rating tables.
pub trait CatalogDb {
    fn seed_catalog(&self) -> Result<()>;
    fn genres(&self) -> Result<Vec<Genre>>;
    fn get_genre(&self, id: u32) -> Result<Option<Genre>>;
    fn ratings(&self) -> Result<Vec<Mpa>>;
    fn get_rating(&self, id: u32) -> Result<Option<Mpa>>;
}

fn seed(tree: &sled::Tree, rows: &[(u32, &str)]) -> Result<()> {
    if !tree.is_empty() {
        return Ok(());
    }
    for (id, name) in rows {
        tree.insert(id.to_be_bytes(), encode(&name.to_string())?)?;
    }
    log::debug!("Seeded {} rows", rows.len());
    Ok(())
}

fn all(tree: &sled::Tree) -> Result<Vec<(u32, String)>> {
    tree.iter()
        .map(|row| -> Result<(u32, String)> {
            let (key, value) = row?;
            let id = <[u8; 4]>::try_from(key.as_ref())
                .map(u32::from_be_bytes)
                .map_err(|_| Error::MalformedKey(key.to_vec()))?;
            Ok((id, decode(&value)?))
        })
        .collect()
}

fn get(tree: &sled::Tree, id: u32) -> Result<Option<String>> {
    tree.get(id.to_be_bytes())?
        .map(|value| decode::<String>(&value))
        .transpose()
}

impl CatalogDb for sled::Db {
    fn seed_catalog(&self) -> Result<()> {
        seed(&self.open_tree(GENRES)?, DEFAULT_GENRES)?;
        seed(&self.open_tree(RATINGS)?, DEFAULT_RATINGS)
    }

    fn genres(&self) -> Result<Vec<Genre>> {
        Ok(all(&self.open_tree(GENRES)?)?
            .into_iter()
            .map(|(id, name)| Genre { id, name })
            .collect())
    }

    fn get_genre(&self, id: u32) -> Result<Option<Genre>> {
        Ok(get(&self.open_tree(GENRES)?, id)?.map(|name| Genre { id, name }))
    }

    fn ratings(&self) -> Result<Vec<Mpa>> {
        Ok(all(&self.open_tree(RATINGS)?)?
            .into_iter()
            .map(|(id, name)| Mpa { id, name })
            .collect())
    }

    fn get_rating(&self, id: u32) -> Result<Option<Mpa>> {
        Ok(get(&self.open_tree(RATINGS)?, id)?.map(|name| Mpa { id, name }))
    }
}
