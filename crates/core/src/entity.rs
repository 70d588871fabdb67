//! Entity trait: identity + continuity across state changes.

use crate::id::EntityId;

/// Entity marker + minimal interface.
///
/// Backend entities are identified by a server-assigned numeric id, which is
/// absent until the entity has been created on the server.
pub trait Entity {
    /// Returns the entity identifier, if the server has assigned one.
    fn id(&self) -> Option<EntityId>;
}

/// Sort entities by numeric id ascending.
///
/// Entities without an id sort first; the sort is stable, so their relative
/// order is preserved.
pub fn sort_by_id<T: Entity>(items: &mut [T]) {
    items.sort_by_key(|item| item.id());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Row(Option<i64>, &'static str);

    impl Entity for Row {
        fn id(&self) -> Option<EntityId> {
            self.0.map(EntityId::new)
        }
    }

    #[test]
    fn sorts_ascending_with_unsaved_first() {
        let mut rows = vec![Row(Some(3), "c"), Row(None, "x"), Row(Some(1), "a"), Row(Some(2), "b")];
        sort_by_id(&mut rows);
        let order: Vec<_> = rows.iter().map(|r| r.1).collect();
        assert_eq!(order, vec!["x", "a", "b", "c"]);
    }
}
