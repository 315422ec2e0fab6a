//! # Mock Framework
//!
//! Utilities for testing clients in isolation.
//!
//! Use [`create_mock_client`] to get a client and a receiver, then the
//! `expect_*` helpers to take each request the client sends and answer it
//! by hand. Helpers return `None` when the next request is of another kind.

use tokio::sync::{mpsc, oneshot};

use crate::actor_framework::{Entity, ResourceClient, ResourceRequest};

type Reply<R, T> = oneshot::Sender<Result<R, <T as Entity>::Error>>;

/// Creates a client whose requests arrive on the returned receiver instead
/// of at a `ResourceActor`.
pub fn create_mock_client<T: Entity>(buffer_size: usize) -> (ResourceClient<T>, mpsc::Receiver<ResourceRequest<T>>) {
    let (sender, receiver) = mpsc::channel(buffer_size);
    (ResourceClient::new(sender), receiver)
}

pub async fn expect_create<T: Entity>(
    receiver: &mut mpsc::Receiver<ResourceRequest<T>>,
) -> Option<(T::CreateParams, Reply<T::Id, T>)> {
    match receiver.recv().await {
        Some(ResourceRequest::Create { params, respond_to }) => Some((params, respond_to)),
        _ => None,
    }
}

pub async fn expect_get<T: Entity>(
    receiver: &mut mpsc::Receiver<ResourceRequest<T>>,
) -> Option<(T::Id, Reply<Option<T>, T>)> {
    match receiver.recv().await {
        Some(ResourceRequest::Get { id, respond_to }) => Some((id, respond_to)),
        _ => None,
    }
}

/// Answers the next List request by running its filter over `items`.
pub async fn expect_list<T: Entity>(receiver: &mut mpsc::Receiver<ResourceRequest<T>>, items: &[T]) -> bool {
    match receiver.recv().await {
        Some(ResourceRequest::List { filter, respond_to }) => {
            let matching = items.iter().filter(|item| filter(item)).cloned().collect();
            respond_to.send(Ok(matching)).is_ok()
        }
        _ => false,
    }
}

pub async fn expect_action<T: Entity>(
    receiver: &mut mpsc::Receiver<ResourceRequest<T>>,
) -> Option<(T::Id, T::Action, Reply<T::ActionResult, T>)> {
    match receiver.recv().await {
        Some(ResourceRequest::Action { id, action, respond_to }) => Some((id, action, respond_to)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Category, User, UserCreate};
    use crate::user_actor::UserError;

    #[tokio::test]
    async fn test_mock_client() {
        let (client, mut receiver) = create_mock_client::<User>(10);

        let create_task = tokio::spawn(async move { client.create(UserCreate::customer("Test", "test@example.com")).await });

        let (payload, responder) = expect_create(&mut receiver).await.expect("Expected Create request");
        assert_eq!(payload.name, "Test");
        responder.send(Err(UserError::AlreadyExists("test@example.com".into()))).unwrap();

        let result = create_task.await.unwrap();
        assert_eq!(result, Err(UserError::AlreadyExists("test@example.com".into())));
    }

    #[tokio::test]
    async fn test_expect_list_applies_filter() {
        let (client, mut receiver) = create_mock_client::<Category>(10);
        let list_task = tokio::spawn(async move { client.list(|c: &Category| c.slug.starts_with("desk")).await });

        let stored: Vec<Category> = [("Desks", "desks"), ("Lamps", "lamps")]
            .iter()
            .enumerate()
            .map(|(i, (name, slug))| Category {
                id: format!("category_{}", i + 1),
                name: name.to_string(),
                slug: slug.to_string(),
                description: None,
            })
            .collect();
        assert!(expect_list(&mut receiver, &stored).await);

        let listed = list_task.await.unwrap().unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, "category_1");
    }
}
