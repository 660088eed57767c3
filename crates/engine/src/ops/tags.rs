use crate::{
    EngineError, NewTag, ResultEngine, Tag, TagId, TransactionId, UserId,
    util::normalize_required_name,
};

use super::Engine;

impl Engine {
    pub async fn create_tag(&self, user_id: UserId, name: &str) -> ResultEngine<Tag> {
        let name = normalize_required_name(name, "tag")?;
        self.require_user(user_id).await?;
        let tag = self.store.insert_tag(NewTag { name, user_id }).await?;
        tracing::debug!(tag_id = tag.id, user_id, "created tag");
        Ok(tag)
    }

    pub async fn tag(&self, tag_id: TagId) -> ResultEngine<Tag> {
        self.store
            .find_tag(tag_id)
            .await?
            .ok_or_else(|| EngineError::NotFound(format!("tag {tag_id}")))
    }

    pub async fn tags(&self) -> ResultEngine<Vec<Tag>> {
        self.store.list_tags().await
    }

    pub async fn tags_for_user(&self, user_id: UserId) -> ResultEngine<Vec<Tag>> {
        self.require_user(user_id).await?;
        self.store.list_tags_by_user(user_id).await
    }

    pub async fn tags_for_transaction(
        &self,
        transaction_id: TransactionId,
    ) -> ResultEngine<Vec<Tag>> {
        self.require_transaction(transaction_id).await?;
        self.store.list_tags_by_transaction(transaction_id).await
    }

    /// Rename a tag.
    ///
    /// Transactions carrying the tag see the new name; the owner entry is
    /// evicted since cached transactions embed their tags.
    pub async fn update_tag(&self, tag_id: TagId, name: &str) -> ResultEngine<Tag> {
        let name = normalize_required_name(name, "tag")?;
        let owner = self.tag(tag_id).await?.user_id;
        let _scope = self.scopes.acquire(owner, None).await;
        let mut tag = self.tag(tag_id).await?;
        tag.name = name;
        self.store.save_tag(&tag).await?;
        self.cache.evict_user(tag.user_id);
        tracing::debug!(tag_id, user_id = tag.user_id, "renamed tag");
        Ok(tag)
    }

    /// Delete a tag and unlink it from every transaction.
    ///
    /// Cached transactions embed their tags, so the owner entry is evicted.
    pub async fn delete_tag(&self, tag_id: TagId) -> ResultEngine<()> {
        let tag = self.tag(tag_id).await?;
        let _scope = self.scopes.acquire(tag.user_id, None).await;
        self.store.delete_tag(tag_id).await?;
        self.cache.evict_user(tag.user_id);
        tracing::debug!(tag_id, user_id = tag.user_id, "deleted tag");
        Ok(())
    }

    /// Resolve `tag_ids` to the tags of `user_id`, sorted by id.
    ///
    /// Missing, repeated or foreign ids are rejected.
    pub(super) async fn resolve_tags(
        &self,
        user_id: UserId,
        tag_ids: &[TagId],
    ) -> ResultEngine<Vec<Tag>> {
        if tag_ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut unique = tag_ids.to_vec();
        unique.sort_unstable();
        unique.dedup();
        if unique.len() != tag_ids.len() {
            return Err(EngineError::InvalidInput(
                "tag ids must not repeat".to_string(),
            ));
        }

        let mut tags = self.store.find_tags_by_ids(&unique).await?;
        if tags.len() != unique.len() {
            let missing: Vec<String> = unique
                .iter()
                .filter(|id| !tags.iter().any(|tag| tag.id == **id))
                .map(ToString::to_string)
                .collect();
            return Err(EngineError::InvalidInput(format!(
                "unknown tags: {}",
                missing.join(", ")
            )));
        }
        if let Some(foreign) = tags.iter().find(|tag| tag.user_id != user_id) {
            return Err(EngineError::InvalidInput(format!(
                "tag {} does not belong to user {user_id}",
                foreign.id
            )));
        }
        tags.sort_by_key(|tag| tag.id);
        Ok(tags)
    }
}
