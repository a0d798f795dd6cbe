use crate::model::{FormattedId, IdError, Reference, WhereClause};
use crate::store::{ServiceError, WorkItemService};

/// Why a formatted ID could not be turned into a reference
#[derive(Debug)]
pub enum Unresolved {
    Id(IdError),
    NotFound(FormattedId),
    Service(ServiceError),
}

#[derive(Debug)]
pub enum Resolution {
    Found(Reference),
    Unresolved(Unresolved),
}

impl Resolution {
    pub fn reference(&self) -> Option<&Reference> {
        match self {
            Resolution::Found(reference) => Some(reference),
            Resolution::Unresolved(_) => None,
        }
    }
}

/// Turns formatted IDs such as `TF12` into service references
pub struct Resolver;

impl Resolver {
    /// Resolve a formatted ID of the given item type. Never fails outward:
    /// every problem is logged and reported as `Resolution::Unresolved`.
    pub async fn resolve<S: WorkItemService + ?Sized>(
        service: &S,
        item_type: &str,
        formatted_id: Option<&str>,
    ) -> Resolution {
        let context = format!("getting reference to {item_type}");

        let id = match FormattedId::parse(formatted_id) {
            Ok(id) => id,
            Err(e) => {
                log::error!("{} ({})", e, context);
                return Resolution::Unresolved(Unresolved::Id(e));
            }
        };

        let clause = WhereClause::eq("FormattedID", id.numeric());
        match service.query(item_type, &clause, &["_ref"]).await {
            Ok(results) => {
                let first = results
                    .first()
                    .and_then(|item| item.get("_ref"))
                    .and_then(|r| r.as_str());
                match first {
                    Some(reference) => {
                        log::debug!("{} is {}", id, reference);
                        Resolution::Found(Reference::new(reference))
                    }
                    None => {
                        log::error!("{} not found ({})", id, context);
                        Resolution::Unresolved(Unresolved::NotFound(id))
                    }
                }
            }
            Err(e) => {
                log::error!("{} ({})", e, context);
                Resolution::Unresolved(Unresolved::Service(e))
            }
        }
    }
}
