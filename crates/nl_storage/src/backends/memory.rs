use async_trait::async_trait;
use nl_core::{Error, Result, SavedArticle, User, UserProfile, UserStore};
use tokio::sync::RwLock;

/// Process-local user store. Contents are lost on restart.
#[derive(Debug, Default)]
pub struct InMemoryStorage {
    users: RwLock<Vec<User>>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_users(users: Vec<User>) -> Self {
        Self {
            users: RwLock::new(users),
        }
    }
}

#[async_trait]
impl UserStore for InMemoryStorage {
    fn name(&self) -> &str {
        "memory"
    }

    async fn find_user_by_identity(&self, auth0_id: &str) -> Result<User> {
        let users = self.users.read().await;
        users
            .iter()
            .find(|u| u.matches_identity(auth0_id))
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("user {}", auth0_id)))
    }

    async fn append_saved_article(&self, auth0_id: &str, article: SavedArticle) -> Result<()> {
        let mut users = self.users.write().await;
        let user = users
            .iter_mut()
            .find(|u| u.matches_identity(auth0_id))
            .ok_or_else(|| Error::NotFound(format!("user {}", auth0_id)))?;
        user.saved_articles.push(article);
        Ok(())
    }

    async fn upsert_user(&self, profile: UserProfile) -> Result<User> {
        let mut users = self.users.write().await;
        match users.iter_mut().find(|u| u.matches_identity(&profile.auth0_id)) {
            Some(user) => {
                user.name = profile.name;
                user.email = profile.email;
                user.picture = profile.picture;
                Ok(user.clone())
            }
            None => {
                let user = User::from_profile(profile);
                users.push(user.clone());
                Ok(user)
            }
        }
    }
}
