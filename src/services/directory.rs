//! Name resolution for listings that reference users.

use std::collections::{HashMap, HashSet};
use uuid::Uuid;

use crate::domain::PartySummary;
use crate::errors::AppResult;
use crate::infra::UserRepository;

/// Resolve each distinct id once. Unknown ids are simply absent.
pub(crate) async fn party_summaries(
    users: &dyn UserRepository,
    ids: impl Iterator<Item = Uuid>,
) -> AppResult<HashMap<Uuid, PartySummary>> {
    let ids: Vec<Uuid> = ids.collect::<HashSet<_>>().into_iter().collect();
    let found = users.find_many(&ids).await?;
    Ok(found
        .iter()
        .map(|user| (user.id, PartySummary::from(user)))
        .collect())
}

/// Look up `id`, falling back to a placeholder.
pub(crate) fn party(directory: &HashMap<Uuid, PartySummary>, id: Uuid) -> PartySummary {
    directory
        .get(&id)
        .cloned()
        .unwrap_or_else(|| PartySummary::unknown(id))
}
