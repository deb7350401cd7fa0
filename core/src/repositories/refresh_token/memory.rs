//! In-process implementation of RefreshTokenRepository

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::entities::refresh_token::RefreshToken;
use crate::errors::{DomainError, TokenError};

use super::r#trait::RefreshTokenRepository;

/// In-memory refresh token repository keyed by token hash
#[derive(Clone, Default)]
pub struct InMemoryRefreshTokenRepository {
    tokens: Arc<RwLock<HashMap<String, RefreshToken>>>,
}

impl InMemoryRefreshTokenRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total rows, expired ones included
    pub async fn len(&self) -> usize {
        self.tokens.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.tokens.read().await.is_empty()
    }
}

#[async_trait]
impl RefreshTokenRepository for InMemoryRefreshTokenRepository {
    async fn create(&self, token: &RefreshToken) -> Result<(), DomainError> {
        let mut tokens = self.tokens.write().await;
        if tokens.contains_key(&token.token_hash) {
            return Err(DomainError::internal("refresh token collision"));
        }
        tokens.insert(token.token_hash.clone(), token.clone());
        Ok(())
    }

    async fn find_by_token(&self, token_hash: &str) -> Result<Option<RefreshToken>, DomainError> {
        let tokens = self.tokens.read().await;
        Ok(tokens
            .get(token_hash)
            .filter(|token| !token.is_expired())
            .cloned())
    }

    async fn find_any_by_token(
        &self,
        token_hash: &str,
    ) -> Result<Option<RefreshToken>, DomainError> {
        let tokens = self.tokens.read().await;
        Ok(tokens.get(token_hash).cloned())
    }

    async fn find_by_user_id(&self, user_id: Uuid) -> Result<Vec<RefreshToken>, DomainError> {
        let tokens = self.tokens.read().await;
        Ok(tokens
            .values()
            .filter(|token| token.user_id == user_id && !token.is_expired())
            .cloned()
            .collect())
    }

    async fn delete_by_user_id(&self, user_id: Uuid) -> Result<u64, DomainError> {
        let mut tokens = self.tokens.write().await;
        let before = tokens.len();
        tokens.retain(|_, token| token.user_id != user_id);
        Ok((before - tokens.len()) as u64)
    }

    async fn delete(&self, token_hash: &str) -> Result<bool, DomainError> {
        let mut tokens = self.tokens.write().await;
        Ok(tokens.remove(token_hash).is_some())
    }

    async fn delete_expired(&self) -> Result<u64, DomainError> {
        let mut tokens = self.tokens.write().await;
        let before = tokens.len();
        tokens.retain(|_, token| !token.is_expired());
        Ok((before - tokens.len()) as u64)
    }

    async fn rotate(
        &self,
        old_token_hash: &str,
        new_token: &RefreshToken,
    ) -> Result<(), DomainError> {
        let mut tokens = self.tokens.write().await;
        if !tokens.contains_key(old_token_hash) {
            return Err(TokenError::InvalidToken.into());
        }
        if tokens.contains_key(&new_token.token_hash) {
            return Err(DomainError::internal("refresh token collision"));
        }
        tokens.remove(old_token_hash);
        tokens.insert(new_token.token_hash.clone(), new_token.clone());
        Ok(())
    }
}
