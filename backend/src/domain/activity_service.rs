//! Read side of the audit trail. Each actor only ever sees their own entries.

use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::ports::{ActivityLog, ActivityQuery};
use crate::domain::service_support::map_repository_error;
use crate::domain::validation::{ValidationCode, ValidationError};
use crate::domain::{ActivityLogEntry, Actor, Error, MAX_ACTIVITY_LIMIT};

#[derive(Clone)]
pub struct ActivityService<A> {
    activity: Arc<A>,
}

impl<A> ActivityService<A> {
    pub fn new(activity: Arc<A>) -> Self {
        Self { activity }
    }
}

#[async_trait]
impl<A> ActivityQuery for ActivityService<A>
where
    A: ActivityLog,
{
    async fn recent(&self, actor: &Actor, limit: u32) -> Result<Vec<ActivityLogEntry>, Error> {
        if !(1..=MAX_ACTIVITY_LIMIT).contains(&limit) {
            return Err(ValidationError::new("limit", ValidationCode::OutOfRange).into());
        }
        self.activity
            .list_for_user(&actor.user_id, limit)
            .await
            .map_err(map_repository_error)
    }
}
