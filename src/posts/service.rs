use std::sync::Arc;
use tracing::{info, instrument};

use super::forms::PostForm;
use super::models::{NewPost, Page, PostModel};
use super::repository::PostRepository;
use crate::shared::AppError;

/// Posts shown per page on the home feed
pub const HOME_PER_PAGE: i64 = 5;
/// Posts shown per page on a single author's feed
pub const USER_PER_PAGE: i64 = 2;

/// Result of a post create/update attempt
pub enum PostOutcome {
    Saved(PostModel),
    Invalid(Vec<String>),
}

/// Service for handling post business logic, including the author-ownership
/// rule for mutations.
pub struct PostService {
    repository: Arc<dyn PostRepository + Send + Sync>,
}

impl PostService {
    pub fn new(repository: Arc<dyn PostRepository + Send + Sync>) -> Self {
        Self { repository }
    }

    #[instrument(skip(self, form))]
    pub async fn create(&self, author_id: i64, form: &PostForm) -> Result<PostOutcome, AppError> {
        let errors = form.validate();
        if !errors.is_empty() {
            return Ok(PostOutcome::Invalid(errors));
        }

        let post = self
            .repository
            .create_post(NewPost {
                title: form.title.trim().to_string(),
                body: form.body.to_string(),
                author_id,
            })
            .await?;

        info!(post_id = post.id, author_id, "Post created");
        Ok(PostOutcome::Saved(post))
    }

    /// Fetches a post or reports it missing.
    #[instrument(skip(self))]
    pub async fn get(&self, id: i64) -> Result<PostModel, AppError> {
        self.repository
            .get_post(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Post".to_string()))
    }

    /// Fetches a post for mutation: 404 when missing, 403 when the acting
    /// user is not its author.
    #[instrument(skip(self))]
    pub async fn get_owned(&self, id: i64, acting_user: i64) -> Result<PostModel, AppError> {
        let post = self.get(id).await?;
        if post.author_id != acting_user {
            return Err(AppError::Forbidden(format!(
                "user {acting_user} does not own post {id}"
            )));
        }
        Ok(post)
    }

    #[instrument(skip(self, form))]
    pub async fn update(
        &self,
        id: i64,
        acting_user: i64,
        form: &PostForm,
    ) -> Result<PostOutcome, AppError> {
        self.get_owned(id, acting_user).await?;

        let errors = form.validate();
        if !errors.is_empty() {
            return Ok(PostOutcome::Invalid(errors));
        }

        let post = self
            .repository
            .update_post(id, form.title.trim(), &form.body)
            .await?;

        info!(post_id = id, "Post updated");
        Ok(PostOutcome::Saved(post))
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: i64, acting_user: i64) -> Result<(), AppError> {
        self.get_owned(id, acting_user).await?;
        self.repository.delete_post(id).await?;

        info!(post_id = id, "Post deleted");
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn home_page(&self, page: i64) -> Result<Page<PostModel>, AppError> {
        self.repository.list_recent(page, HOME_PER_PAGE).await
    }

    #[instrument(skip(self))]
    pub async fn author_page(&self, author_id: i64, page: i64) -> Result<Page<PostModel>, AppError> {
        self.repository
            .list_by_author(author_id, page, USER_PER_PAGE)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::posts::repository::InMemoryPostRepository;

    fn valid_form() -> PostForm {
        PostForm {
            title: "First post".to_string(),
            body: "Hello from the shop floor.".to_string(),
        }
    }

    fn service() -> (PostService, Arc<InMemoryPostRepository>) {
        let repo = Arc::new(InMemoryPostRepository::new());
        (PostService::new(repo.clone()), repo)
    }

    #[tokio::test]
    async fn test_create_valid_post() {
        let (service, repo) = service();

        let outcome = service.create(1, &valid_form()).await.unwrap();
        match outcome {
            PostOutcome::Saved(post) => assert_eq!(post.author_id, 1),
            PostOutcome::Invalid(errors) => panic!("unexpected errors: {errors:?}"),
        }
        assert_eq!(repo.post_count(), 1);
    }

    #[tokio::test]
    async fn test_create_invalid_post_stores_nothing() {
        let (service, repo) = service();

        let form = PostForm {
            title: String::new(),
            body: String::new(),
        };
        let outcome = service.create(1, &form).await.unwrap();

        assert!(matches!(outcome, PostOutcome::Invalid(_)));
        assert_eq!(repo.post_count(), 0);
    }

    #[tokio::test]
    async fn test_update_by_non_author_forbidden() {
        let (service, _repo) = service();

        let PostOutcome::Saved(post) = service.create(1, &valid_form()).await.unwrap() else {
            panic!("create failed");
        };

        let result = service.update(post.id, 2, &valid_form()).await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_delete_by_non_author_forbidden() {
        let (service, repo) = service();

        let PostOutcome::Saved(post) = service.create(1, &valid_form()).await.unwrap() else {
            panic!("create failed");
        };

        let result = service.delete(post.id, 2).await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));
        assert_eq!(repo.post_count(), 1);
    }

    #[tokio::test]
    async fn test_missing_post_is_not_found() {
        let (service, _repo) = service();

        assert!(matches!(service.get(99).await, Err(AppError::NotFound(_))));
        assert!(matches!(
            service.update(99, 1, &valid_form()).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            service.delete(99, 1).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_author_can_update_own_post() {
        let (service, _repo) = service();

        let PostOutcome::Saved(post) = service.create(1, &valid_form()).await.unwrap() else {
            panic!("create failed");
        };

        let form = PostForm {
            title: "Edited".to_string(),
            body: "New body.".to_string(),
        };
        let outcome = service.update(post.id, 1, &form).await.unwrap();
        match outcome {
            PostOutcome::Saved(updated) => assert_eq!(updated.title, "Edited"),
            PostOutcome::Invalid(errors) => panic!("unexpected errors: {errors:?}"),
        }
    }
}
