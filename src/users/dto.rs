use serde::Serialize;
use uuid::Uuid;

use super::repo_types::User;
use crate::auth::Identity;

/// Public part of the user returned to the client.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email_address: String,
}

impl From<User> for PublicUser {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            first_name: u.first_name,
            last_name: u.last_name,
            email_address: u.email_address,
        }
    }
}

impl From<Identity> for PublicUser {
    fn from(i: Identity) -> Self {
        Self {
            id: i.id,
            first_name: i.first_name,
            last_name: i.last_name,
            email_address: i.email_address,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub user: PublicUser,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_user_hides_secrets() {
        let user = User {
            id: Uuid::new_v4(),
            first_name: "Joe".into(),
            last_name: "Smith".into(),
            email_address: "joe@smith.com".into(),
            password: "$argon2id$v=19$m=64,t=10,p=1$c2FsdA$aGFzaA".into(),
        };
        let json = serde_json::to_value(UserResponse { user: user.into() }).unwrap();
        let obj = json["user"].as_object().unwrap();
        let mut keys: Vec<_> = obj.keys().cloned().collect();
        keys.sort();
        assert_eq!(keys, vec!["emailAddress", "firstName", "id", "lastName"]);
    }
}
