mod catalog;
mod films;
mod users;

pub use catalog::CatalogDb;
pub use films::FilmDb;
pub use users::UserDb;

use crate::config::Config;
use crate::error::{abort, Error, Result};
use serde::{de::DeserializeOwned, Serialize};
use sled::transaction::ConflictableTransactionResult;

type TxResult<T> = ConflictableTransactionResult<T, Error>;

const USERS: &[u8] = b"users";
const FILMS: &[u8] = b"films";
const GENRES: &[u8] = b"genres";
const RATINGS: &[u8] = b"ratings";
const FILMS_LIKES: &[u8] = b"films_likes";
const USERS_LIKES: &[u8] = b"users_likes";
const FRIENDSHIP: &[u8] = b"friendship";
const FRIENDSHIP_TO: &[u8] = b"friendship_to";
const COUNTERS: &[u8] = b"counters";

// Big-endian, so that tree order is id order.
fn serialize_id(id: u64) -> [u8; 8] {
    id.to_be_bytes()
}

fn read_id(bytes: &[u8], at: usize) -> Result<u64> {
    bytes
        .get(at..)
        .and_then(|rest| <[u8; 8]>::try_from(rest).ok())
        .map(u64::from_be_bytes)
        .ok_or_else(|| Error::MalformedKey(bytes.to_vec()))
}

fn deserialize_id<V: AsRef<[u8]>>(id: V) -> Result<u64> {
    read_id(id.as_ref(), 0)
}

/// Key of a two-column relation row, `left ‖ right`.
fn pair_key(left: u64, right: u64) -> [u8; 16] {
    let mut key = [0u8; 16];
    key[..8].copy_from_slice(&serialize_id(left));
    key[8..].copy_from_slice(&serialize_id(right));
    key
}

/// The right-hand id of a `pair_key`.
fn pair_right<V: AsRef<[u8]>>(key: V) -> Result<u64> {
    read_id(key.as_ref(), 8)
}

fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    Ok(bincode::serialize(value)?)
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    Ok(bincode::deserialize(bytes)?)
}

fn encode_tx<T: Serialize>(value: &T) -> TxResult<Vec<u8>> {
    bincode::serialize(value).map_err(abort)
}

fn decode_tx<T: DeserializeOwned>(bytes: &[u8]) -> TxResult<T> {
    bincode::deserialize(bytes).map_err(abort)
}

/// Right-hand ids of every relation row whose left id is `left`.
fn scan_pair_rights(tree: &sled::Tree, left: u64) -> Result<Vec<u64>> {
    tree.scan_prefix(serialize_id(left))
        .keys()
        .map(|key| -> Result<u64> { pair_right(key?) })
        .collect()
}

/// Next id of the rows in `tree`, counting from 1 separately for each tree.
fn next_id(db: &sled::Db, tree: &[u8]) -> Result<u64> {
    let counters = db.open_tree(COUNTERS)?;
    let next = counters.update_and_fetch(tree, |last| {
        let last = last
            .and_then(|bytes| <[u8; 8]>::try_from(bytes).ok())
            .map_or(0, u64::from_be_bytes);
        Some(serialize_id(last + 1).to_vec())
    })?;
    match next {
        Some(bytes) => deserialize_id(bytes),
        None => Err(Error::MalformedKey(tree.to_vec())),
    }
}

/// Opens the database described by `config` and seeds the lookup tables.
pub fn open(config: &Config) -> Result<sled::Db> {
    let db = match &config.db_path {
        Some(path) => {
            log::info!("Opening database at {}", path.display());
            sled::Config::new().path(path).open()?
        }
        None => {
            log::info!("Opening temporary database");
            sled::Config::new().temporary(true).open()?
        }
    };
    db.seed_catalog()?;
    Ok(db)
}

#[cfg(test)]
pub fn temporary() -> sled::Db {
    let db = sled::Config::new().temporary(true).open().unwrap();
    db.seed_catalog().unwrap();
    db
}
