use crate::data::models::NewUser;
use crate::data::models::User;
use crate::schema::users;
use bcrypt::verify;
use bcrypt::hash;
use diesel::prelude::*;

pub struct UserRepository;

impl UserRepository {
    pub fn find_by_email(
        conn: &mut SqliteConnection,
        email: &str,
    ) -> Result<Option<User>, diesel::result::Error> {
        users::table
            .filter(users::email.eq(normalize_email(email)))
            .select(User::as_select())
            .first(conn)
            .optional()
    }

    pub fn verify_password(
        stored_hash: &str,
        input_password: &str,
    ) -> Result<bool, bcrypt::BcryptError> {
        verify(input_password, stored_hash)
    }

    /// Hashes the password before anything touches the database, so a
    /// hashing failure never leaves a half-created account.
    pub fn create_user(
        conn: &mut SqliteConnection,
        email: &str,
        password: &str,
    ) -> Result<User, CreateUserError> {
        let hashed_password = hash(password, hash_cost())?;
        let email = normalize_email(email);

        diesel::insert_into(users::table)
            .values(&NewUser {
                email: &email,
                password: &hashed_password,
            })
            .execute(conn)?;

        Ok(users::table
            .filter(users::email.eq(&email))
            .select(User::as_select())
            .first(conn)?)
    }

    pub fn email_exists(
        conn: &mut SqliteConnection,
        email: &str,
    ) -> Result<bool, diesel::result::Error> {
        use diesel::dsl::exists;
        use diesel::select;

        select(exists(users::table.filter(users::email.eq(normalize_email(email))))).get_result(conn)
    }
}

#[derive(thiserror::Error, Debug)]
pub enum CreateUserError {
    #[error(transparent)]
    Database(#[from] diesel::result::Error),
    #[error(transparent)]
    Hashing(#[from] bcrypt::BcryptError),
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

// bcrypt at full cost makes the repository tests crawl.
#[cfg(not(test))]
fn hash_cost() -> u32 {
    bcrypt::DEFAULT_COST
}

#[cfg(test)]
fn hash_cost() -> u32 {
    4
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::db::test_pool;

    #[test]
    fn created_user_can_log_in_with_any_email_case() {
        let pool = test_pool();
        let mut conn = pool.get().unwrap();

        UserRepository::create_user(&mut conn, " Sara@Example.com", "kelid-e-asrar").unwrap();
        assert!(UserRepository::email_exists(&mut conn, "sara@example.com").unwrap());

        let user = UserRepository::find_by_email(&mut conn, "SARA@example.com")
            .unwrap()
            .unwrap();
        assert_eq!(user.email, "sara@example.com");
        assert!(UserRepository::verify_password(&user.password, "kelid-e-asrar").unwrap());
        assert!(!UserRepository::verify_password(&user.password, "wrong").unwrap());
    }

    #[test]
    fn unknown_email_is_none() {
        let pool = test_pool();
        let mut conn = pool.get().unwrap();
        assert!(UserRepository::find_by_email(&mut conn, "nobody@example.com").unwrap().is_none());
    }
}
