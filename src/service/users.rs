use crate::database::UserDb;
use crate::error::{Error, Result};
use crate::model::User;
use std::collections::HashSet;

pub fn create<D: UserDb>(db: &D, mut user: User) -> Result<User> {
    user.name = Some(user.display_name());
    db.add_user(&user)
}

pub fn update<D: UserDb>(db: &D, mut user: User) -> Result<User> {
    user.name = Some(user.display_name());
    db.update_user(&user)?
        .ok_or_else(|| Error::not_found("User", user.id))
}

pub fn all<D: UserDb>(db: &D) -> Result<Vec<User>> {
    db.users()
}

pub fn find<D: UserDb>(db: &D, id: u64) -> Result<User> {
    db.get_user(id)?.ok_or_else(|| Error::not_found("User", id))
}

pub fn delete<D: UserDb>(db: &D, id: u64) -> Result<()> {
    if db.remove_user(id)? {
        Ok(())
    } else {
        Err(Error::not_found("User", id))
    }
}

pub fn friends<D: UserDb>(db: &D, id: u64) -> Result<Vec<User>> {
    find(db, id)?;
    db.friends(id)
}

/// Friends of `id` that are also friends of `other_id`, in `id`'s order.
pub fn common_friends<D: UserDb>(db: &D, id: u64, other_id: u64) -> Result<Vec<User>> {
    find(db, id)?;
    find(db, other_id)?;
    let others: HashSet<u64> = db.friends(other_id)?.iter().map(|u| u.id).collect();
    Ok(db
        .friends(id)?
        .into_iter()
        .filter(|u| others.contains(&u.id))
        .collect())
}

pub fn add_friend<D: UserDb>(db: &D, id: u64, friend_id: u64) -> Result<()> {
    if id == friend_id {
        return Err(Error::BadRequest("users cannot befriend themselves".to_owned()));
    }
    find(db, id)?;
    find(db, friend_id)?;
    if db.add_friend(id, friend_id)? && db.friendship(friend_id, id)? == Some(true) {
        log::info!("Users {} and {} are now mutual friends", id, friend_id);
    }
    Ok(())
}

pub fn remove_friend<D: UserDb>(db: &D, id: u64, friend_id: u64) -> Result<()> {
    find(db, id)?;
    find(db, friend_id)?;
    if db.remove_friend(id, friend_id)? {
        Ok(())
    } else {
        Err(Error::not_found("Friendship with user", friend_id))
    }
}
