use super::films::adjust_likes;
use super::{
    decode, deserialize_id, encode, next_id, pair_key, scan_pair_rights, serialize_id, TxResult,
    FILMS, FILMS_LIKES, FRIENDSHIP, FRIENDSHIP_TO, USERS, USERS_LIKES,
};
use crate::error::{abort, Error, Result};
use crate::model::User;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sled::Transactional;

const ACCEPTED: &[u8] = &[1];
const PENDING: &[u8] = &[0];
const EMPTY: &[u8] = &[];

#[derive(Serialize, Deserialize, Debug)]
struct UserRecord {
    email: String,
    login: String,
    name: String,
    birthday: NaiveDate,
}

impl UserRecord {
    fn from_user(user: &User) -> Self {
        UserRecord {
            email: user.email.clone(),
            login: user.login.clone(),
            name: user.name.clone().unwrap_or_default(),
            birthday: user.birthday,
        }
    }

    fn into_user(self, id: u64) -> User {
        User {
            id,
            email: self.email,
            login: self.login,
            name: Some(self.name),
            birthday: self.birthday,
        }
    }
}

/// Users and the directed friendship edges between them.
///
/// An edge `a → b` is pending until `b` adds `a` back; from then on both
/// edges exist and are marked accepted.
pub trait UserDb {
    fn add_user(&self, user: &User) -> Result<User>;
    fn update_user(&self, user: &User) -> Result<Option<User>>;
    fn get_user(&self, id: u64) -> Result<Option<User>>;
    fn users(&self) -> Result<Vec<User>>;
    /// Removes the user with its friendship edges and likes.
    fn remove_user(&self, id: u64) -> Result<bool>;
    /// Records `id → friend_id`. Returns false when that edge already exists.
    /// Fails with not found unless both users exist.
    fn add_friend(&self, id: u64, friend_id: u64) -> Result<bool>;
    /// Drops the edge `id → friend_id`, leaving a mutual friendship as a
    /// pending request from `friend_id`. An incoming request is rejected.
    fn remove_friend(&self, id: u64, friend_id: u64) -> Result<bool>;
    fn friends(&self, id: u64) -> Result<Vec<User>>;
    /// `Some(accepted)` when the edge `id → other_id` exists.
    fn friendship(&self, id: u64, other_id: u64) -> Result<Option<bool>>;
}

impl UserDb for sled::Db {
    fn add_user(&self, user: &User) -> Result<User> {
        let users = self.open_tree(USERS)?;
        let id = next_id(self, USERS)?;
        let record = UserRecord::from_user(user);
        users.insert(serialize_id(id), encode(&record)?)?;
        log::debug!("Created user {} ({})", id, record.login);
        Ok(record.into_user(id))
    }

    fn update_user(&self, user: &User) -> Result<Option<User>> {
        let users = self.open_tree(USERS)?;
        let record = UserRecord::from_user(user);
        let value = encode(&record)?;
        let updated = users.transaction(|users| -> TxResult<bool> {
            if users.get(&serialize_id(user.id))?.is_none() {
                return Ok(false);
            }
            users.insert(&serialize_id(user.id), value.clone())?;
            Ok(true)
        })?;
        Ok(if updated {
            log::debug!("Updated user {}", user.id);
            Some(record.into_user(user.id))
        } else {
            None
        })
    }

    fn get_user(&self, id: u64) -> Result<Option<User>> {
        let users = self.open_tree(USERS)?;
        users
            .get(serialize_id(id))?
            .map(|d| -> Result<User> { Ok(decode::<UserRecord>(&d)?.into_user(id)) })
            .transpose()
    }

    fn users(&self) -> Result<Vec<User>> {
        let users = self.open_tree(USERS)?;
        users
            .iter()
            .map(|row| -> Result<User> {
                let (key, value) = row?;
                Ok(decode::<UserRecord>(&value)?.into_user(deserialize_id(key)?))
            })
            .collect()
    }

    fn remove_user(&self, id: u64) -> Result<bool> {
        let users = self.open_tree(USERS)?;
        let films = self.open_tree(FILMS)?;
        let films_likes = self.open_tree(FILMS_LIKES)?;
        let users_likes = self.open_tree(USERS_LIKES)?;
        let friendship = self.open_tree(FRIENDSHIP)?;
        let friendship_to = self.open_tree(FRIENDSHIP_TO)?;

        let mut first = true;
        let (mut likes, mut edges) = (0, 0);
        // Rows committed between a scan and its transaction outlive that pass.
        // Once the user is gone `add_like` and `add_friend` abort, so the
        // sweep ends.
        loop {
            let liked = scan_pair_rights(&users_likes, id)?;
            let outgoing = scan_pair_rights(&friendship, id)?;
            let incoming = scan_pair_rights(&friendship_to, id)?;
            if !first && liked.is_empty() && outgoing.is_empty() && incoming.is_empty() {
                break;
            }

            let removed = (
                &users,
                &films,
                &films_likes,
                &users_likes,
                &friendship,
                &friendship_to,
            )
                .transaction(|trees| -> TxResult<bool> {
                    let (users, films, films_likes, users_likes, friendship, friendship_to) =
                        trees;
                    if first && users.remove(&serialize_id(id))?.is_none() {
                        return Ok(false);
                    }
                    for &film_id in &liked {
                        users_likes.remove(&pair_key(id, film_id))?;
                        if films_likes.remove(&pair_key(film_id, id))?.is_some() {
                            adjust_likes(films, film_id, -1)?;
                        }
                    }
                    for &other in &outgoing {
                        friendship.remove(&pair_key(id, other))?;
                        friendship_to.remove(&pair_key(other, id))?;
                    }
                    for &other in &incoming {
                        friendship.remove(&pair_key(other, id))?;
                        friendship_to.remove(&pair_key(id, other))?;
                    }
                    Ok(true)
                })?;
            if !removed {
                return Ok(false);
            }
            likes += liked.len();
            edges += outgoing.len() + incoming.len();
            first = false;
        }
        log::debug!(
            "Removed user {} with {} likes and {} friendship edges",
            id,
            likes,
            edges
        );
        Ok(true)
    }

    fn add_friend(&self, id: u64, friend_id: u64) -> Result<bool> {
        let users = self.open_tree(USERS)?;
        let friendship = self.open_tree(FRIENDSHIP)?;
        let friendship_to = self.open_tree(FRIENDSHIP_TO)?;
        let added = (&users, &friendship, &friendship_to).transaction(
            |(users, friendship, friendship_to)| -> TxResult<bool> {
                for user_id in [id, friend_id] {
                    if users.get(&serialize_id(user_id))?.is_none() {
                        return Err(abort(Error::not_found("User", user_id)));
                    }
                }
                if friendship.get(&pair_key(id, friend_id))?.is_some() {
                    return Ok(false);
                }
                let mutual = friendship.get(&pair_key(friend_id, id))?.is_some();
                if mutual {
                    friendship.insert(&pair_key(friend_id, id), ACCEPTED)?;
                }
                let state = if mutual { ACCEPTED } else { PENDING };
                friendship.insert(&pair_key(id, friend_id), state)?;
                friendship_to.insert(&pair_key(friend_id, id), EMPTY)?;
                Ok(true)
            },
        )?;
        if added {
            log::debug!("User {} added friend {}", id, friend_id);
        }
        Ok(added)
    }

    fn remove_friend(&self, id: u64, friend_id: u64) -> Result<bool> {
        let friendship = self.open_tree(FRIENDSHIP)?;
        let friendship_to = self.open_tree(FRIENDSHIP_TO)?;
        let removed = (&friendship, &friendship_to).transaction(
            |(friendship, friendship_to)| -> TxResult<bool> {
                let forward = friendship.remove(&pair_key(id, friend_id))?.is_some();
                if forward {
                    friendship_to.remove(&pair_key(friend_id, id))?;
                }
                let reverse = friendship.get(&pair_key(friend_id, id))?.is_some();
                if reverse && forward {
                    friendship.insert(&pair_key(friend_id, id), PENDING)?;
                } else if reverse {
                    friendship.remove(&pair_key(friend_id, id))?;
                    friendship_to.remove(&pair_key(id, friend_id))?;
                }
                Ok(forward || reverse)
            },
        )?;
        if removed {
            log::debug!("User {} removed friend {}", id, friend_id);
        }
        Ok(removed)
    }

    fn friends(&self, id: u64) -> Result<Vec<User>> {
        let friendship = self.open_tree(FRIENDSHIP)?;
        let mut friends = Vec::new();
        for friend_id in scan_pair_rights(&friendship, id)? {
            match self.get_user(friend_id)? {
                Some(friend) => friends.push(friend),
                None => log::warn!("Dangling friendship edge {} -> {}", id, friend_id),
            }
        }
        Ok(friends)
    }

    fn friendship(&self, id: u64, other_id: u64) -> Result<Option<bool>> {
        let friendship = self.open_tree(FRIENDSHIP)?;
        Ok(friendship
            .get(pair_key(id, other_id))?
            .map(|flag| flag.as_ref() == ACCEPTED))
    }
}
